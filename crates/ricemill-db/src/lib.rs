//! # ricemill-db: Ledger Core and Database Layer for the Rice Mill POS
//!
//! This crate owns the SQLite file. The [`Ledger`] is the only writer of
//! stock levels, stock movements and sales; repositories cover the catalog,
//! user accounts, settings and read-only reporting.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Rice Mill POS Data Flow                            │
//! │                                                                         │
//! │  Checkout form / stock screen / reports screen                         │
//! │       │  Actor { user_id, role }                                        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   ricemill-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Ledger     │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (ledger/)    │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ create_sale   │    │ Product, User │    │ 001_initial  │  │   │
//! │  │   │ adjust_stock  │    │ Sale, Report  │    │   _schema    │  │   │
//! │  │   │ settle_credit │    │ Settings      │    │              │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           └──────────┬─────────┘                               │   │
//! │  │                 Database (pool.rs)   export.rs   backup.rs      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            SQLite database (WAL), default ./ricemill.db         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`ledger`] - Transactional stock and sale operations
//! - [`repository`] - Catalog, users, sales, reports, settings
//! - [`export`] - CSV projections of report results
//! - [`backup`] - Snapshot, list, prune and restore
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ricemill_db::{Database, DbConfig};
//! use ricemill_core::{NewSale, SaleLineRequest, Weight};
//!
//! let db = Database::new(DbConfig::from_env()).await?;
//!
//! let actor = db.users().authenticate("cashier1", "secret1").await?.expect("login");
//! let rice = db.products().get_by_code("RICE001").await?.expect("product");
//!
//! let receipt = db
//!     .ledger()
//!     .create_sale(&actor, &NewSale::cash(vec![SaleLineRequest::by_weight(&rice.id, Weight::from_kg(10))]))
//!     .await?;
//! println!("{} total {}", receipt.sale.sale_number, receipt.sale.total);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backup;
pub mod error;
pub mod export;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use ledger::{Ledger, LedgerError, LedgerResult, StockAdjustment};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::movement::MovementRepository;
pub use repository::product::ProductRepository;
pub use repository::report::{
    DailyTotal, ProductPerformance, ReconciliationRow, ReportRepository, SalesSummary,
};
pub use repository::sale::{SaleRepository, SalesFilter};
pub use repository::settings::{SettingsRepository, StoreSettings};
pub use repository::user::UserRepository;
