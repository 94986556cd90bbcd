//! # ricemill-core: Pure Business Logic for the Rice Mill POS
//!
//! Everything in this crate is deterministic and free of I/O. The database
//! layer (`ricemill-db`) calls into it to price sale lines, total sales and
//! validate input before anything is written.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Rice Mill POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        UI forms / receipt rendering / CSV consumers             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Actor + requests                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │         ricemill-db: Ledger, repositories, reports              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ricemill-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌────────────┐        │   │
//! │  │   │  money  │  │ weight  │  │ pricing │  │ validation │        │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └────────────┘        │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleLine, StockMovement, User)
//! - [`money`] - Money in integer minor units
//! - [`weight`] - Stock quantities in integer grams
//! - [`pricing`] - Line pricing and sale totals
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use ricemill_core::money::Money;
//! use ricemill_core::weight::Weight;
//! use ricemill_core::pricing::price_by_weight;
//!
//! // 10 kg at 40.00 per kg
//! let total = price_by_weight(Weight::from_kg(10), Money::from_major_minor(40, 0)).unwrap();
//! assert_eq!(total.cents(), 40_000);
//! ```

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;
pub mod weight;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
pub use weight::Weight;

/// Largest weight a single sale line may request (100 tonnes).
///
/// Guards against a mistyped quantity (grams entered as kilograms) turning
/// into an absurd stock decrement.
pub const MAX_LINE_WEIGHT: Weight = Weight::from_kg(100_000);

/// Largest container count a single sale line may request.
pub const MAX_LINE_CONTAINERS: i64 = 10_000;

/// Maximum number of lines in one sale.
pub const MAX_SALE_LINES: usize = 100;
