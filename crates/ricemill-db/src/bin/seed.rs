//! # Seed Data
//!
//! Creates the default accounts and the starter rice catalog.
//!
//! ## Usage
//! ```bash
//! # Seed ./ricemill.db (or $RICEMILL_DB_PATH)
//! cargo run -p ricemill-db --bin seed
//!
//! # Specify database path
//! cargo run -p ricemill-db --bin seed -- --db ./data/ricemill.db
//! ```
//!
//! ## Seeded Data
//! - `admin` / `admin123` (admin) and `cashier` / `cashier123` (cashier)
//! - RICE001..RICE004 with opening stock, each recorded as a restock movement
//!
//! Change both passwords after the first login.

use std::env;

use ricemill_core::{ContainerSpec, Money, NewProduct, Quality, Role, Weight};
use ricemill_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// (code, name, quality, price/kg cents, bag kg, bag price cents, opening kg, reorder kg, description)
type Variety = (&'static str, &'static str, Quality, i64, i64, i64, i64, i64, &'static str);

const VARIETIES: &[Variety] = &[
    ("RICE001", "Basmati Rice", Quality::Premium, 6500, 25, 162_500, 500, 100, "Premium quality Basmati rice"),
    ("RICE002", "Sona Masoori", Quality::Standard, 4500, 25, 112_500, 750, 150, "Standard quality Sona Masoori"),
    ("RICE003", "IR64", Quality::Economic, 3800, 50, 190_000, 1000, 200, "Economic quality IR64 rice"),
    ("RICE004", "Ponni Rice", Quality::Standard, 4200, 25, 105_000, 625, 125, "Standard quality Ponni rice"),
];

const ACCOUNTS: &[(&str, &str, Role, &str)] = &[
    ("admin", "admin123", Role::Admin, "Administrator"),
    ("cashier", "cashier123", Role::Cashier, "Counter Cashier"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = DbConfig::from_env();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config = DbConfig::new(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Rice Mill POS Seed Data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $RICEMILL_DB_PATH or ./ricemill.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Unknown option: {}", other);
            }
        }
        i += 1;
    }

    println!("🌾 Rice Mill POS Seed Data");
    println!("=========================");
    println!("Database: {}", config.database_path.display());
    println!();

    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Accounts
    let mut admin_id = None;
    for (username, password, role, full_name) in ACCOUNTS {
        let user = match db.users().get_by_username(username).await? {
            Some(existing) => {
                println!("⚠ User '{}' already exists, leaving it unchanged", username);
                existing
            }
            None => {
                let user = db.users().create(username, password, *role, full_name).await?;
                println!("✓ Created {} '{}'", role.as_str(), username);
                user
            }
        };
        if *role == Role::Admin && admin_id.is_none() {
            admin_id = Some(user.id);
        }
    }

    let admin_id = admin_id.ok_or("no admin account available")?;

    // Catalog
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping catalog to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating products...");

    for (code, name, quality, per_kg, bag_kg, bag_price, opening_kg, reorder_kg, description) in VARIETIES {
        let product = NewProduct {
            code: code.to_string(),
            name: name.to_string(),
            quality: *quality,
            price_per_kg: Money::from_cents(*per_kg),
            container: Some(ContainerSpec {
                weight: Weight::from_kg(*bag_kg),
                price: Money::from_cents(*bag_price),
            }),
            opening_stock: Weight::from_kg(*opening_kg),
            min_stock: Weight::from_kg(*reorder_kg),
            description: Some(description.to_string()),
        };

        match db.products().insert(&product, &admin_id).await {
            Ok(p) => println!("  ✓ {} {} ({} on hand)", p.code, p.name, p.on_hand),
            Err(e) => eprintln!("  Failed to insert {}: {}", code, e),
        }
    }

    let status = db.ledger().query_stock_status().await?;
    println!();
    println!("✓ Seed complete! {} products in stock.", status.len());

    db.close().await;
    Ok(())
}
