//! # Repository Module
//!
//! Database repositories for the rice mill POS.
//!
//! ## Who Writes What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Table              Written by                 Read by                  │
//! │  ─────────────────  ─────────────────────────  ──────────────────────── │
//! │  products.details   ProductRepository          everyone                 │
//! │  products.on_hand   Ledger (+ opening stock)   reports, ledger          │
//! │  stock_movements    Ledger (+ opening stock)   MovementRepository       │
//! │  sales, sale_lines  Ledger                     SaleRepository, reports  │
//! │  users              UserRepository             UserRepository           │
//! │  settings           SettingsRepository         SettingsRepository       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD and search
//! - [`MovementRepository`](movement::MovementRepository) - Stock audit trail (read-only)
//! - [`SaleRepository`](sale::SaleRepository) - Sale lookups and filtering (read-only)
//! - [`UserRepository`](user::UserRepository) - Accounts and authentication
//! - [`ReportRepository`](report::ReportRepository) - Summaries and reconciliation
//! - [`SettingsRepository`](settings::SettingsRepository) - Store settings

pub mod movement;
pub mod product;
pub mod report;
pub mod sale;
pub mod settings;
pub mod user;

/// `%query%` with LIKE wildcards escaped; use with `ESCAPE '\'`.
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ravi"), "%ravi%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
