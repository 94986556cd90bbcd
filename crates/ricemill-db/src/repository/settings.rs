//! # Settings Repository
//!
//! Key/value store for presentation settings (currency symbol, store name,
//! receipt header). Nothing in the ledger reads these.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use ricemill_core::validation::validate_optional_text;
use ricemill_core::{Money, ValidationError};

pub const CURRENCY_SYMBOL_KEY: &str = "currency_symbol";
pub const STORE_NAME_KEY: &str = "store_name";
pub const RECEIPT_HEADER_KEY: &str = "receipt_header";

/// Repository over the `settings` table.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Inserts or replaces one setting.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        if key.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "key".to_string(),
            }
            .into());
        }
        validate_optional_text(key, Some(value), 1000)?;

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(key = %key, "Setting saved");
        Ok(())
    }

    /// Every stored setting, ordered by key.
    pub async fn all(&self) -> DbResult<Vec<(String, String)>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM settings ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows)
    }
}

/// Typed view of the presentation settings, with defaults for missing keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub currency_symbol: String,
    pub store_name: String,
    pub receipt_header: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            currency_symbol: "₹".to_string(),
            store_name: "Rice Mill".to_string(),
            receipt_header: String::new(),
        }
    }
}

impl StoreSettings {
    pub async fn load(repo: &SettingsRepository) -> DbResult<Self> {
        let defaults = StoreSettings::default();

        Ok(StoreSettings {
            currency_symbol: repo
                .get(CURRENCY_SYMBOL_KEY)
                .await?
                .unwrap_or(defaults.currency_symbol),
            store_name: repo
                .get(STORE_NAME_KEY)
                .await?
                .unwrap_or(defaults.store_name),
            receipt_header: repo
                .get(RECEIPT_HEADER_KEY)
                .await?
                .unwrap_or(defaults.receipt_header),
        })
    }

    pub async fn save(&self, repo: &SettingsRepository) -> DbResult<()> {
        repo.set(CURRENCY_SYMBOL_KEY, &self.currency_symbol).await?;
        repo.set(STORE_NAME_KEY, &self.store_name).await?;
        repo.set(RECEIPT_HEADER_KEY, &self.receipt_header).await
    }

    /// Formats money with the configured symbol, e.g. `₹1625.00`.
    pub fn format_money(&self, amount: Money) -> String {
        amount.format_with(&self.currency_symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_db;

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let db = test_db().await;
        let settings = StoreSettings::load(&db.settings()).await.unwrap();

        assert_eq!(settings, StoreSettings::default());
        assert_eq!(settings.format_money(Money::from_cents(162_500)), "₹1625.00");
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let db = test_db().await;
        let repo = db.settings();

        repo.set(CURRENCY_SYMBOL_KEY, "Rs.").await.unwrap();
        repo.set(CURRENCY_SYMBOL_KEY, "$").await.unwrap();
        repo.set(STORE_NAME_KEY, "Sri Lakshmi Rice Mill").await.unwrap();

        assert_eq!(repo.get(CURRENCY_SYMBOL_KEY).await.unwrap().as_deref(), Some("$"));
        assert_eq!(repo.all().await.unwrap().len(), 2);

        let settings = StoreSettings::load(&repo).await.unwrap();
        assert_eq!(settings.store_name, "Sri Lakshmi Rice Mill");
        assert_eq!(settings.receipt_header, "");
        assert_eq!(settings.format_money(Money::from_cents(4000)), "$40.00");
    }

    #[tokio::test]
    async fn test_save_roundtrip() {
        let db = test_db().await;
        let repo = db.settings();
        let settings = StoreSettings {
            currency_symbol: "₹".to_string(),
            store_name: "Annapurna Mills".to_string(),
            receipt_header: "GSTIN 29ABCDE1234F1Z5".to_string(),
        };

        settings.save(&repo).await.unwrap();
        assert_eq!(StoreSettings::load(&repo).await.unwrap(), settings);
    }
}
