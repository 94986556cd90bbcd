//! # Stock Movement Repository
//!
//! Read access to the append-only stock audit trail.
//!
//! Rows are only ever inserted, by the ledger and by product creation
//! (opening stock). Triggers in the schema reject UPDATE and DELETE.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::DbResult;
use ricemill_core::StockMovement;

const MOVEMENT_COLUMNS: &str =
    "id, product_id, delta_grams, reason, reference_id, note, actor_id, created_at";

/// Appends one movement through any executor (normally an open transaction).
pub(crate) async fn insert_movement<'e, E>(executor: E, movement: &StockMovement) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, delta_grams, reason, reference_id, note, actor_id, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.delta)
    .bind(movement.reason)
    .bind(&movement.reference_id)
    .bind(&movement.note)
    .bind(&movement.actor_id)
    .bind(movement.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Read-only repository over `stock_movements`.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Movement history of one product, oldest first.
    pub async fn for_product(&self, product_id: &str) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {} FROM stock_movements WHERE product_id = ? ORDER BY created_at, rowid",
            MOVEMENT_COLUMNS
        );

        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Movements written by one sale, in line order.
    pub async fn for_sale(&self, sale_id: &str) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {} FROM stock_movements WHERE reference_id = ? ORDER BY rowid",
            MOVEMENT_COLUMNS
        );

        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Total number of movements in the ledger.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
