//! Seed the database with a small demo catalog.
//!
//! Categories and products are matched by name, so running the command twice
//! creates nothing new.

use rust_decimal::Decimal;
use tracing::info;

use restcrud_api::db::Store;
use restcrud_api::models::{Category, NewCategory, NewProduct, ProductFilter};
use restcrud_core::Price;

use super::connect;

/// Demo catalog: (category, description, [(product, description, price in cents, stock)]).
type SeedCategory = (
    &'static str,
    &'static str,
    &'static [(&'static str, &'static str, i64, i32)],
);

const CATALOG: &[SeedCategory] = &[
    (
        "Books",
        "Printed and bound",
        &[
            ("The Rust Programming Language", "The official book", 3999, 25),
            ("Designing Data-Intensive Applications", "", 4550, 10),
        ],
    ),
    (
        "Stationery",
        "Pens, paper and the like",
        &[
            ("Fountain Pen", "Medium nib, black ink", 2400, 40),
            ("Dot Grid Notebook", "A5, 120 pages", 1250, 100),
        ],
    ),
];

/// Seed the demo catalog.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a write fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let store = connect().await?;
    let mut created = 0_usize;

    for (category_name, category_description, products) in CATALOG {
        let category = ensure_category(&store, category_name, category_description, &mut created)
            .await?;

        let filter = ProductFilter {
            category: Some(category.id),
            search: None,
        };
        let existing = store.list_products(&filter).await?;

        for (name, description, cents, stock) in *products {
            if existing.iter().any(|p| p.name == *name) {
                continue;
            }
            let product = store
                .create_product(NewProduct {
                    name: (*name).to_string(),
                    description: (*description).to_string(),
                    price: Price::new(Decimal::new(*cents, 2))?,
                    stock: *stock,
                    category_id: category.id,
                })
                .await?;
            info!(product_id = %product.id, name = %product.name, "Seeded product");
            created += 1;
        }
    }

    info!(created, "Seeding complete");
    Ok(())
}

async fn ensure_category(
    store: &dyn Store,
    name: &str,
    description: &str,
    created: &mut usize,
) -> Result<Category, Box<dyn std::error::Error>> {
    if let Some(category) = store
        .list_categories()
        .await?
        .into_iter()
        .find(|c| c.name == name)
    {
        return Ok(category);
    }

    let category = store
        .create_category(NewCategory {
            name: name.to_string(),
            description: Some(description.to_string()),
        })
        .await?;
    info!(category_id = %category.id, name = %category.name, "Seeded category");
    *created += 1;
    Ok(category)
}
