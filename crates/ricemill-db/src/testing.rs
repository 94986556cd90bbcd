//! Shared fixtures for unit tests.

use crate::pool::{Database, DbConfig};
use ricemill_core::{Actor, ContainerSpec, Money, NewProduct, Product, Quality, Role, Weight};

pub(crate) const ADMIN_ID: &str = "admin-0001";
pub(crate) const CASHIER_ID: &str = "cashier-0001";

pub(crate) fn admin() -> Actor {
    Actor::new(ADMIN_ID, Role::Admin)
}

pub(crate) fn cashier() -> Actor {
    Actor::new(CASHIER_ID, Role::Cashier)
}

/// Fresh, migrated in-memory database.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

fn bagged(
    code: &str,
    name: &str,
    quality: Quality,
    per_kg_cents: i64,
    bag_kg: i64,
    bag_cents: i64,
    opening_kg: i64,
) -> NewProduct {
    NewProduct {
        code: code.to_string(),
        name: name.to_string(),
        quality,
        price_per_kg: Money::from_cents(per_kg_cents),
        container: Some(ContainerSpec {
            weight: Weight::from_kg(bag_kg),
            price: Money::from_cents(bag_cents),
        }),
        opening_stock: Weight::from_kg(opening_kg),
        min_stock: Weight::from_kg(100),
        description: None,
    }
}

/// RICE001: 65.00/kg, 25 kg bag at 1625.00, 500 kg on hand.
pub(crate) fn basmati() -> NewProduct {
    bagged("RICE001", "Basmati Rice", Quality::Premium, 6500, 25, 162_500, 500)
}

/// RICE002: 45.00/kg, 25 kg bag at 1125.00, 800 kg on hand.
pub(crate) fn sona_masoori() -> NewProduct {
    bagged("RICE002", "Sona Masoori", Quality::Standard, 4500, 25, 112_500, 800)
}

/// RICE003: 38.00/kg, 50 kg bag at 1900.00, 1000 kg on hand.
pub(crate) fn ir64() -> NewProduct {
    bagged("RICE003", "IR64", Quality::Economic, 3800, 50, 190_000, 1000)
}

/// Product sold only by weight.
pub(crate) fn loose(code: &str, price_per_kg: Money, on_hand: Weight) -> NewProduct {
    NewProduct {
        code: code.to_string(),
        name: format!("Loose {}", code),
        quality: Quality::Standard,
        price_per_kg,
        container: None,
        opening_stock: on_hand,
        min_stock: Weight::zero(),
        description: None,
    }
}

/// Inserts `new` as the admin.
pub(crate) async fn seed_product(db: &Database, new: &NewProduct) -> Product {
    db.products()
        .insert(new, ADMIN_ID)
        .await
        .expect("seed product")
}
