//! Catalog domain types: categories and products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use restcrud_core::{CategoryId, Price, ProductId};

use super::validation::{self, FieldErrors};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// A product, always carrying its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub category: Category,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Units on hand. Negative after a checkout that oversold.
    pub stock: i32,
}

/// Filters accepted by the product listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Only products in this category.
    pub category: Option<CategoryId>,
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
}

impl ProductFilter {
    /// The search term, ignoring blank input.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Whether `product` passes this filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if self.category.is_some_and(|id| id != product.category.id) {
            return false;
        }
        self.search_term().is_none_or(|term| {
            let term = term.to_lowercase();
            product.name.to_lowercase().contains(&term)
                || product.description.to_lowercase().contains(&term)
        })
    }
}

// =============================================================================
// Category input
// =============================================================================

/// Category create/update request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A validated new category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

/// A validated partial category update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

impl CategoryPayload {
    /// Validate a full category (create or replace).
    ///
    /// # Errors
    ///
    /// Returns field errors if `name` is missing or invalid.
    pub fn into_new(self) -> Result<NewCategory, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = validation::required(&mut errors, "name", self.name)
            .and_then(|n| validation::name(&mut errors, "name", Some(n)));
        match name {
            Some(name) if errors.is_empty() => Ok(NewCategory {
                name,
                description: normalize_description(self.description),
            }),
            _ => Err(errors),
        }
    }

    /// Validate a partial category update.
    ///
    /// # Errors
    ///
    /// Returns field errors if a supplied field is invalid.
    pub fn into_patch(self) -> Result<CategoryPatch, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = validation::name(&mut errors, "name", self.name);
        let description = self.description.map(|d| normalize_description(Some(d)));
        errors.finish(|| CategoryPatch { name, description })
    }
}

impl From<NewCategory> for CategoryPatch {
    fn from(new: NewCategory) -> Self {
        Self {
            name: Some(new.name),
            description: Some(new.description),
        }
    }
}

/// Blank descriptions are stored as `NULL`.
fn normalize_description(raw: Option<String>) -> Option<String> {
    raw.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

// =============================================================================
// Product input
// =============================================================================

/// Product create/update request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category_id: Option<CategoryId>,
}

/// A validated new product. The category is resolved by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub category_id: CategoryId,
}

/// A validated partial product update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<i32>,
    pub category_id: Option<CategoryId>,
}

impl ProductPayload {
    /// Validate a full product (create or replace).
    ///
    /// # Errors
    ///
    /// Returns field errors for every missing or invalid field.
    pub fn into_new(self) -> Result<NewProduct, FieldErrors> {
        let mut errors = FieldErrors::new();
        for (field, present) in [
            ("name", self.name.is_some()),
            ("price", self.price.is_some()),
            ("stock", self.stock.is_some()),
            ("category_id", self.category_id.is_some()),
        ] {
            if !present {
                errors.add(field, validation::REQUIRED);
            }
        }

        let patch = self.validate_fields(&mut errors);
        match (patch.name, patch.price, patch.stock, patch.category_id) {
            (Some(name), Some(price), Some(stock), Some(category_id)) if errors.is_empty() => {
                Ok(NewProduct {
                    name,
                    description: patch.description.unwrap_or_default(),
                    price,
                    stock,
                    category_id,
                })
            }
            _ => Err(errors),
        }
    }

    /// Validate a partial product update.
    ///
    /// # Errors
    ///
    /// Returns field errors if a supplied field is invalid.
    pub fn into_patch(self) -> Result<ProductPatch, FieldErrors> {
        let mut errors = FieldErrors::new();
        let patch = self.validate_fields(&mut errors);
        errors.finish(|| patch)
    }

    fn validate_fields(self, errors: &mut FieldErrors) -> ProductPatch {
        let price = self.price.and_then(|raw| {
            Price::new(raw)
                .map_err(|e| errors.add("price", e.to_string()))
                .ok()
        });

        ProductPatch {
            name: validation::name(errors, "name", self.name),
            description: self.description.map(|d| d.trim().to_string()),
            price,
            stock: validation::stock(errors, self.stock),
            category_id: self.category_id,
        }
    }
}

impl From<NewProduct> for ProductPatch {
    fn from(new: NewProduct) -> Self {
        Self {
            name: Some(new.name),
            description: Some(new.description),
            price: Some(new.price),
            stock: Some(new.stock),
            category_id: Some(new.category_id),
        }
    }
}
