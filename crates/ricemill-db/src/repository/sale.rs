//! # Sale Repository
//!
//! Lookups and filtered listing of committed sales.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Ledger::create_sale ──► CASH   ──► status = paid          (final)     │
//! │                      └──► CREDIT ──► status = outstanding               │
//! │                                            │                            │
//! │                     Ledger::settle_credit_sale                          │
//! │                                            ▼                            │
//! │                                      status = paid          (final)     │
//! │                                                                         │
//! │   Lines, totals and sale_number never change after checkout.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The write helpers here are crate-private; only the ledger calls them,
//! always inside its own transaction.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::like_pattern;
use ricemill_core::{PaymentMode, PaymentStatus, Sale, SaleLine, SaleReceipt};

pub(crate) const SALE_COLUMNS: &str = "id, sale_number, actor_id, payment_mode, payment_status, \
     subtotal_cents, discount_cents, discount_reason, total_cents, customer_name, \
     customer_phone, notes, created_at, settled_at, settled_by";

const LINE_COLUMNS: &str = "id, sale_id, product_id, code_snapshot, name_snapshot, unit_kind, \
     container_count, quantity_grams, unit_price_cents, line_total_cents, position";

// =============================================================================
// Filter
// =============================================================================

/// Criteria for listing sales. Every field is optional; empty matches all.
///
/// `from` is inclusive, `to` exclusive.
///
/// ```rust
/// use chrono::NaiveDate;
/// use ricemill_db::SalesFilter;
/// use ricemill_core::PaymentStatus;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let filter = SalesFilter::for_day(day).with_status(PaymentStatus::Outstanding);
/// assert!(filter.from.is_some() && filter.to.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub payment_mode: Option<PaymentMode>,
    pub payment_status: Option<PaymentStatus>,
    pub actor_id: Option<String>,
    /// Substring of the sale number or customer name, case-insensitive.
    pub search: Option<String>,
    pub limit: Option<u32>,
}

impl SalesFilter {
    pub fn new() -> Self {
        SalesFilter::default()
    }

    /// One UTC calendar day.
    pub fn for_day(date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        SalesFilter::between(start, start + Duration::days(1))
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        SalesFilter {
            from: Some(from),
            to: Some(to),
            ..SalesFilter::default()
        }
    }

    pub fn with_mode(mut self, mode: PaymentMode) -> Self {
        self.payment_mode = Some(mode);
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }

    pub fn by_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Matches `text` against sale number and customer name. Blank text is ignored.
    pub fn matching(mut self, text: &str) -> Self {
        let text = text.trim();
        self.search = (!text.is_empty()).then(|| text.to_string());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Appends ` WHERE ...` for `filter` to a query over `sales` aliased by `prefix`
/// (`""` or `"s."`).
pub(crate) fn push_sales_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &SalesFilter, prefix: &str) {
    qb.push(" WHERE 1 = 1");

    if let Some(from) = filter.from {
        qb.push(format!(" AND {}created_at >= ", prefix)).push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(format!(" AND {}created_at < ", prefix)).push_bind(to);
    }
    if let Some(mode) = filter.payment_mode {
        qb.push(format!(" AND {}payment_mode = ", prefix)).push_bind(mode);
    }
    if let Some(status) = filter.payment_status {
        qb.push(format!(" AND {}payment_status = ", prefix)).push_bind(status);
    }
    if let Some(actor_id) = &filter.actor_id {
        qb.push(format!(" AND {}actor_id = ", prefix))
            .push_bind(actor_id.clone());
    }
    if let Some(text) = &filter.search {
        let pattern = like_pattern(text);
        qb.push(format!(" AND ({}sale_number LIKE ", prefix))
            .push_bind(pattern.clone())
            .push(format!(" ESCAPE '\\' OR {}customer_name LIKE ", prefix))
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

// =============================================================================
// Crate-private write helpers (ledger only)
// =============================================================================

/// Next `YYYYMMDD-NNNN` number for the UTC day of `now`.
///
/// Must run inside the transaction that inserts the sale; the UNIQUE index
/// on `sale_number` backs it up.
pub(crate) async fn next_sale_number<'e, E>(executor: E, now: DateTime<Utc>) -> DbResult<String>
where
    E: SqliteExecutor<'e>,
{
    let day = now.format("%Y%m%d").to_string();

    let last: Option<i64> = sqlx::query_scalar(
        "SELECT MAX(CAST(substr(sale_number, 10) AS INTEGER)) FROM sales WHERE sale_number LIKE ?",
    )
    .bind(format!("{}-%", day))
    .fetch_one(executor)
    .await?;

    Ok(format!("{}-{:04}", day, last.unwrap_or(0) + 1))
}

pub(crate) async fn insert_sale<'e, E>(executor: E, sale: &Sale) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %sale.id, sale_number = %sale.sale_number, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, sale_number, actor_id, payment_mode, payment_status,
            subtotal_cents, discount_cents, discount_reason, total_cents,
            customer_name, customer_phone, notes, created_at, settled_at, settled_by
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.sale_number)
    .bind(&sale.actor_id)
    .bind(sale.payment_mode)
    .bind(sale.payment_status)
    .bind(sale.subtotal)
    .bind(sale.discount)
    .bind(&sale.discount_reason)
    .bind(sale.total)
    .bind(&sale.customer_name)
    .bind(&sale.customer_phone)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .bind(sale.settled_at)
    .bind(&sale.settled_by)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn insert_line<'e, E>(executor: E, line: &SaleLine) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO sale_lines (
            id, sale_id, product_id, code_snapshot, name_snapshot, unit_kind,
            container_count, quantity_grams, unit_price_cents, line_total_cents, position
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(&line.product_id)
    .bind(&line.code_snapshot)
    .bind(&line.name_snapshot)
    .bind(line.unit_kind)
    .bind(line.container_count)
    .bind(line.quantity)
    .bind(line.unit_price)
    .bind(line.line_total)
    .bind(line.position)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn fetch_sale<'e, E>(executor: E, id: &str) -> DbResult<Option<Sale>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM sales WHERE id = ?", SALE_COLUMNS);
    let sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(sale)
}

// =============================================================================
// Repository
// =============================================================================

/// Read-only repository over `sales` and `sale_lines`.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        fetch_sale(&self.pool, id).await
    }

    /// Gets a sale by its `YYYYMMDD-NNNN` number.
    pub async fn get_by_number(&self, sale_number: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE sale_number = ?", SALE_COLUMNS);
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Lines of a sale in entry order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let sql = format!(
            "SELECT {} FROM sale_lines WHERE sale_id = ? ORDER BY position",
            LINE_COLUMNS
        );
        let lines = sqlx::query_as::<_, SaleLine>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// A sale with its lines, `None` if the sale doesn't exist.
    pub async fn get_receipt(&self, sale_id: &str) -> DbResult<Option<SaleReceipt>> {
        let Some(sale) = self.get_by_id(sale_id).await? else {
            return Ok(None);
        };
        let lines = self.get_lines(sale_id).await?;

        Ok(Some(SaleReceipt { sale, lines }))
    }

    /// Sales matching `filter`, newest first.
    pub async fn query(&self, filter: &SalesFilter) -> DbResult<Vec<Sale>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM sales", SALE_COLUMNS));
        push_sales_filter(&mut qb, filter, "");
        qb.push(" ORDER BY created_at DESC, sale_number DESC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit as i64);
        }

        let sales = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;

        debug!(count = sales.len(), "Sales query returned rows");
        Ok(sales)
    }

    /// Total number of sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_for_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let filter = SalesFilter::for_day(day);

        assert_eq!(filter.from, Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        assert_eq!(filter.to, Some(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap()));
        assert!(filter.limit.is_none());
    }

    #[test]
    fn test_filter_builders() {
        let filter = SalesFilter::new()
            .with_mode(PaymentMode::Credit)
            .with_status(PaymentStatus::Outstanding)
            .by_actor("u1")
            .limit(10);

        assert_eq!(filter.payment_mode, Some(PaymentMode::Credit));
        assert_eq!(filter.payment_status, Some(PaymentStatus::Outstanding));
        assert_eq!(filter.actor_id.as_deref(), Some("u1"));
        assert_eq!(filter.limit, Some(10));
    }

    #[test]
    fn test_filter_sql_shape() {
        let filter = SalesFilter::new().with_mode(PaymentMode::Cash).by_actor("u1");
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id FROM sales s");
        push_sales_filter(&mut qb, &filter, "s.");

        assert_eq!(
            qb.sql(),
            "SELECT id FROM sales s WHERE 1 = 1 AND s.payment_mode = ? AND s.actor_id = ?"
        );
    }

    #[test]
    fn test_search_sql_shape() {
        let filter = SalesFilter::new().matching("  ravi ");
        assert_eq!(filter.search.as_deref(), Some("ravi"));
        assert!(SalesFilter::new().matching("   ").search.is_none());

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id FROM sales");
        push_sales_filter(&mut qb, &filter, "");
        assert_eq!(
            qb.sql(),
            "SELECT id FROM sales WHERE 1 = 1 AND (sale_number LIKE ? ESCAPE '\\' \
             OR customer_name LIKE ? ESCAPE '\\')"
        );
    }
}
