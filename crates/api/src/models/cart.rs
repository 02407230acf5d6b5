//! Shopping cart domain types.

use serde::Deserialize;

use restcrud_core::{CartItemId, ProductId, Quantity, UserId};

use super::catalog::Product;
use super::validation::{self, FieldErrors};

/// One cart line owned by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product: Product,
    pub quantity: Quantity,
}

/// Add-to-cart / update request body.
///
/// There is deliberately no owner field: the owner is always the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartItemPayload {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i32>,
}

/// A validated new cart line. The product is resolved by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// A validated cart line update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItemPatch {
    pub quantity: Quantity,
}

impl CartItemPayload {
    /// Validate a new cart line. `quantity` defaults to 1.
    ///
    /// # Errors
    ///
    /// Returns field errors if `product_id` is missing or `quantity` is not positive.
    pub fn into_new(self) -> Result<NewCartItem, FieldErrors> {
        let mut errors = FieldErrors::new();
        let product_id = validation::required(&mut errors, "product_id", self.product_id);
        let quantity = quantity(&mut errors, self.quantity.unwrap_or(Quantity::MIN));
        match (product_id, quantity) {
            (Some(product_id), Some(quantity)) => Ok(NewCartItem {
                product_id,
                quantity,
            }),
            _ => Err(errors),
        }
    }

    /// Validate a cart line update.
    ///
    /// # Errors
    ///
    /// Returns field errors if `quantity` is missing or not positive.
    pub fn into_patch(self) -> Result<CartItemPatch, FieldErrors> {
        let mut errors = FieldErrors::new();
        let quantity = validation::required(&mut errors, "quantity", self.quantity)
            .and_then(|q| quantity(&mut errors, q));
        quantity.map(|quantity| CartItemPatch { quantity }).ok_or(errors)
    }
}

fn quantity(errors: &mut FieldErrors, raw: i32) -> Option<Quantity> {
    Quantity::new(raw)
        .map_err(|e| errors.add("quantity", e.to_string()))
        .ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_defaults_to_one() {
        let new = CartItemPayload {
            product_id: Some(ProductId::new(4)),
            quantity: None,
        }
        .into_new()
        .unwrap();
        assert_eq!(new.quantity.get(), 1);
    }

    #[test]
    fn test_missing_product_and_bad_quantity() {
        let errors = CartItemPayload {
            product_id: None,
            quantity: Some(0),
        }
        .into_new()
        .unwrap_err();
        assert_eq!(errors.get("product_id"), Some(validation::REQUIRED));
        assert!(errors.get("quantity").is_some());
    }

    #[test]
    fn test_patch_requires_quantity() {
        let errors = CartItemPayload::default().into_patch().unwrap_err();
        assert_eq!(errors.get("quantity"), Some(validation::REQUIRED));

        let patch = CartItemPayload {
            product_id: None,
            quantity: Some(5),
        }
        .into_patch()
        .unwrap();
        assert_eq!(patch.quantity.get(), 5);
    }
}
