//! # Report Repository
//!
//! Read-only aggregates over sales, sale lines and stock movements.
//!
//! Every report takes the same [`SalesFilter`] the ledger's `query_sales`
//! takes, so a "today, credit only" filter means the same rows everywhere.
//! Days are UTC days.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::movement::MovementRepository;
use crate::repository::sale::{push_sales_filter, SaleRepository, SalesFilter};
use ricemill_core::{Money, Sale, SaleReceipt, StockMovement, Weight};

/// Totals over a set of sales.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SalesSummary {
    pub transaction_count: i64,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub cash_total: Money,
    pub credit_total: Money,
    /// Credit sales not yet settled.
    pub outstanding_total: Money,
}

/// Sales count and takings for one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub transaction_count: i64,
    pub total: Money,
}

/// What one product sold over a set of sales.
///
/// `revenue` is the sum of line totals, before any sale-level discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProductPerformance {
    pub product_id: String,
    pub code: String,
    pub name: String,
    pub weight_sold: Weight,
    pub containers_sold: i64,
    pub revenue: Money,
    pub sale_count: i64,
}

/// On-hand quantity against the sum of the product's movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRow {
    pub product_id: String,
    pub code: String,
    pub on_hand: Weight,
    pub movement_total: Weight,
    pub consistent: bool,
}

/// Report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    pub async fn sales_summary(&self, filter: &SalesFilter) -> DbResult<SalesSummary> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                COUNT(*) AS transaction_count,
                COALESCE(SUM(s.subtotal_cents), 0) AS subtotal,
                COALESCE(SUM(s.discount_cents), 0) AS discount,
                COALESCE(SUM(s.total_cents), 0) AS total,
                COALESCE(SUM(CASE WHEN s.payment_mode = 'cash' THEN s.total_cents ELSE 0 END), 0) AS cash_total,
                COALESCE(SUM(CASE WHEN s.payment_mode = 'credit' THEN s.total_cents ELSE 0 END), 0) AS credit_total,
                COALESCE(SUM(CASE WHEN s.payment_status = 'outstanding' THEN s.total_cents ELSE 0 END), 0) AS outstanding_total
            FROM sales s
            "#,
        );
        push_sales_filter(&mut qb, filter, "s.");

        let summary = qb
            .build_query_as::<SalesSummary>()
            .fetch_one(&self.pool)
            .await?;

        debug!(count = summary.transaction_count, total = %summary.total, "Sales summary");
        Ok(summary)
    }

    /// Summary of one UTC day.
    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<SalesSummary> {
        self.sales_summary(&SalesFilter::for_day(date)).await
    }

    /// Per-day count and takings, oldest day first. Days without sales are absent.
    pub async fn daily_totals(&self, filter: &SalesFilter) -> DbResult<Vec<DailyTotal>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                substr(s.created_at, 1, 10) AS day,
                COUNT(*) AS transaction_count,
                COALESCE(SUM(s.total_cents), 0) AS total
            FROM sales s
            "#,
        );
        push_sales_filter(&mut qb, filter, "s.");
        qb.push(" GROUP BY day ORDER BY day");

        let days = qb
            .build_query_as::<DailyTotal>()
            .fetch_all(&self.pool)
            .await?;

        Ok(days)
    }

    /// Products sold under `filter`, highest revenue first.
    pub async fn product_performance(&self, filter: &SalesFilter) -> DbResult<Vec<ProductPerformance>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                l.product_id AS product_id,
                p.code AS code,
                p.name AS name,
                COALESCE(SUM(l.quantity_grams), 0) AS weight_sold,
                COALESCE(SUM(l.container_count), 0) AS containers_sold,
                COALESCE(SUM(l.line_total_cents), 0) AS revenue,
                COUNT(DISTINCT l.sale_id) AS sale_count
            FROM sale_lines l
            JOIN sales s ON s.id = l.sale_id
            JOIN products p ON p.id = l.product_id
            "#,
        );
        push_sales_filter(&mut qb, filter, "s.");
        qb.push(" GROUP BY l.product_id, p.code, p.name ORDER BY revenue DESC, p.code");

        let rows = qb
            .build_query_as::<ProductPerformance>()
            .fetch_all(&self.pool)
            .await?;

        debug!(products = rows.len(), "Product performance");
        Ok(rows)
    }

    /// The receipt of one sale.
    pub async fn sale_details(&self, sale_id: &str) -> DbResult<Option<SaleReceipt>> {
        SaleRepository::new(self.pool.clone()).get_receipt(sale_id).await
    }

    /// Movement history of one product, oldest first.
    pub async fn movements_for_product(&self, product_id: &str) -> DbResult<Vec<StockMovement>> {
        MovementRepository::new(self.pool.clone())
            .for_product(product_id)
            .await
    }

    /// The `limit` most recent sales.
    pub async fn recent_sales(&self, limit: u32) -> DbResult<Vec<Sale>> {
        SaleRepository::new(self.pool.clone())
            .query(&SalesFilter::new().limit(limit))
            .await
    }

    /// Compares every product's on-hand with the sum of its movements.
    ///
    /// Opening stock is itself a movement, so the two agree for every
    /// product unless the table was edited outside the ledger.
    pub async fn stock_reconciliation(&self) -> DbResult<Vec<ReconciliationRow>> {
        let rows: Vec<(String, String, Weight, Weight)> = sqlx::query_as(
            r#"
            SELECT p.id, p.code, p.on_hand_grams, COALESCE(SUM(m.delta_grams), 0)
            FROM products p
            LEFT JOIN stock_movements m ON m.product_id = p.id
            GROUP BY p.id, p.code, p.on_hand_grams
            ORDER BY p.code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, code, on_hand, movement_total)| ReconciliationRow {
                product_id,
                code,
                on_hand,
                movement_total,
                consistent: on_hand == movement_total,
            })
            .collect())
    }
}
