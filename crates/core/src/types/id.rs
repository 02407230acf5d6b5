//! Newtype IDs for type-safe entity references.
//!
//! Every table uses a `SERIAL` primary key, so all IDs wrap an `i32`. The
//! `define_id!` macro keeps a `CategoryId` from ever being passed where a
//! `ProductId` is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`, so path segments
///   and JSON numbers decode directly
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`
/// - `new()`, `as_i32()`, `Display`, `FromStr`
/// - an `ENTITY` label used in log fields and error messages
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use restcrud_core::define_id;
/// define_id!(WidgetId, "widget");
///
/// let id: WidgetId = "7".parse().unwrap();
/// assert_eq!(id.as_i32(), 7);
/// assert_eq!(WidgetId::ENTITY, "widget");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $entity:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Entity name this ID refers to.
            pub const ENTITY: &'static str = $entity;

            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(CategoryId, "category");
define_id!(ProductId, "product");
define_id!(CartItemId, "cart_item");
define_id!(OrderId, "order");
define_id!(OrderItemId, "order_item");
define_id!(UserId, "user");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parses_from_path_segment() {
        let id: ProductId = " 42".parse().unwrap();
        assert_eq!(id, ProductId::new(42));
        assert!("abc".parse::<ProductId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&CategoryId::new(3)).unwrap();
        assert_eq!(json, "3");

        let parsed: CategoryId = serde_json::from_str("3").unwrap();
        assert_eq!(parsed.as_i32(), 3);
    }

    #[test]
    fn test_entity_labels() {
        assert_eq!(CategoryId::ENTITY, "category");
        assert_eq!(CartItemId::ENTITY, "cart_item");
        assert_eq!(OrderItemId::ENTITY, "order_item");
    }

    #[test]
    fn test_ids_order_numerically() {
        let mut ids = vec![OrderId::new(10), OrderId::new(2), OrderId::new(7)];
        ids.sort();
        assert_eq!(ids, vec![OrderId::new(2), OrderId::new(7), OrderId::new(10)]);
    }
}
