//! Field-keyed validation errors.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Message for a required field that was omitted.
pub const REQUIRED: &str = "This field is required.";

/// Message for a text field that is empty after trimming.
pub const BLANK: &str = "This field may not be blank.";

/// Maximum length of catalog names.
pub const MAX_NAME_LENGTH: usize = 255;

/// Validation failures keyed by the offending input field.
///
/// Serializes as a flat JSON object, e.g. `{"price": "price must be greater than zero"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("invalid fields: {}", field_list(.0))]
pub struct FieldErrors(BTreeMap<String, String>);

fn field_list(errors: &BTreeMap<String, String>) -> String {
    errors.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

impl FieldErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error set holding a single field error.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record an error for `field`. The first error per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    /// Whether no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the message recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Return `value` if no errors were recorded, otherwise the errors.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field error was recorded.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// Validate a catalog name: trimmed, non-blank, at most 255 characters.
pub fn name(errors: &mut FieldErrors, field: &str, raw: Option<String>) -> Option<String> {
    let value = raw?.trim().to_string();
    if value.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        errors.add(
            field,
            format!("Ensure this field has no more than {MAX_NAME_LENGTH} characters."),
        );
        return None;
    }
    Some(value)
}

/// Record `REQUIRED` if a mandatory value is missing.
pub fn required<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        errors.add(field, REQUIRED);
    }
    value
}

/// Validate a stock level set through the catalog.
pub fn stock(errors: &mut FieldErrors, raw: Option<i32>) -> Option<i32> {
    let value = raw?;
    if value < 0 {
        errors.add("stock", "Ensure this value is greater than or equal to 0.");
        return None;
    }
    Some(value)
}
