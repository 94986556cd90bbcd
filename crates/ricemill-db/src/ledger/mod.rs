//! # Ledger
//!
//! The only writer of product stock, stock movements, sales and sale lines.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(actor, NewSale)                                            │
//! │       │                                                                 │
//! │       ├── no lines?                      → EmptySale                    │
//! │       ├── discount < 0 / non-admin?      → InvalidDiscount              │
//! │       │                                                                 │
//! │  BEGIN ──────────────────────────────────────────────────────────────   │
//! │       │  for each line:                                                 │
//! │       │    quantity > 0?                 → InvalidQuantity              │
//! │       │    product active?               → UnknownProduct               │
//! │       │    container defined?            → ContainerNotDefined          │
//! │       │    on_hand - earlier lines ≥ qty? → InsufficientStock           │
//! │       │    price + snapshot                                             │
//! │       │  discount ≤ subtotal?            → InvalidDiscount              │
//! │       │                                                                 │
//! │       │  INSERT sale (final totals, next YYYYMMDD-NNNN)                 │
//! │       │  per line: UPDATE stock (guarded) → INSERT movement → INSERT line│
//! │  COMMIT ─────────────────────────────────────────────────────────────   │
//! │                                                                         │
//! │  Any error drops the transaction: SQLite rolls everything back.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod error;


pub use error::{LedgerError, LedgerResult};

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::repository::movement::insert_movement;
use crate::repository::product::{fetch_product, ProductRepository};
use crate::repository::sale::{
    fetch_sale, insert_line, insert_sale, next_sale_number, SaleRepository, SalesFilter,
};
use ricemill_core::pricing::{check_quantity, compute_totals, price_line};
use ricemill_core::validation::{validate_optional_text, validate_sale_fields};
use ricemill_core::{
    Actor, AdjustmentReason, CoreError, MovementReason, NewSale, PaymentMode, PaymentStatus,
    Product, Sale, SaleLine, SaleReceipt, StockMovement, StockStatus, Weight,
};

/// Result of a committed stock adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub movement: StockMovement,
    /// On-hand quantity after the adjustment.
    pub on_hand: Weight,
}

/// Transactional operations over stock and sales.
///
/// ## Usage
/// ```rust,ignore
/// let actor = db.users().authenticate("cashier1", "secret1").await?.unwrap();
///
/// let receipt = db
///     .ledger()
///     .create_sale(&actor, &NewSale::cash(vec![SaleLineRequest::by_weight(&id, Weight::from_kg(10))]))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    pub fn new(pool: SqlitePool) -> Self {
        Ledger { pool }
    }

    /// Records a sale: decrements stock, logs one movement per line and
    /// writes the sale with its lines, all or nothing.
    pub async fn create_sale(&self, actor: &Actor, request: &NewSale) -> LedgerResult<SaleReceipt> {
        check_sale_request(actor, request)?;

        debug!(
            actor_id = %actor.user_id,
            lines = request.lines.len(),
            mode = request.payment_mode.as_str(),
            "Creating sale"
        );

        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        // Lines of the same product draw from one running balance.
        let mut products: HashMap<String, Product> = HashMap::new();
        let mut reserved: HashMap<String, Weight> = HashMap::new();
        let mut lines: Vec<SaleLine> = Vec::with_capacity(request.lines.len());

        for (position, requested) in request.lines.iter().enumerate() {
            check_quantity(requested.quantity)?;

            let product = match products.get(&requested.product_id) {
                Some(product) => product.clone(),
                None => {
                    let product = fetch_product(&mut *tx, &requested.product_id)
                        .await?
                        .filter(|p| p.is_active)
                        .ok_or_else(|| CoreError::UnknownProduct(requested.product_id.clone()))?;
                    products.insert(product.id.clone(), product.clone());
                    product
                }
            };

            let priced = price_line(&product, requested.quantity)?;

            let already = reserved.get(&product.id).copied().unwrap_or_default();
            let available = product
                .on_hand
                .checked_sub(already)
                .ok_or_else(|| CoreError::invalid_quantity("reserved stock overflow"))?;
            if priced.quantity > available {
                warn!(
                    code = %product.code,
                    available = %available,
                    requested = %priced.quantity,
                    "Sale rejected: insufficient stock"
                );
                return Err(CoreError::InsufficientStock {
                    code: product.code.clone(),
                    available,
                    requested: priced.quantity,
                }
                .into());
            }
            let reserved_now = already
                .checked_add(priced.quantity)
                .ok_or_else(|| CoreError::invalid_quantity("reserved stock overflow"))?;
            reserved.insert(product.id.clone(), reserved_now);

            lines.push(SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: product.id.clone(),
                code_snapshot: product.code.clone(),
                name_snapshot: product.name.clone(),
                unit_kind: priced.unit_kind,
                container_count: priced.container_count,
                quantity: priced.quantity,
                unit_price: priced.unit_price,
                line_total: priced.line_total,
                position: position as i64,
            });
        }

        let totals = compute_totals(lines.iter().map(|l| l.line_total), request.discount)?;

        let sale = Sale {
            id: sale_id,
            sale_number: next_sale_number(&mut *tx, now).await?,
            actor_id: actor.user_id.clone(),
            payment_mode: request.payment_mode,
            payment_status: request.payment_mode.initial_status(),
            subtotal: totals.subtotal,
            discount: totals.discount,
            discount_reason: request.discount_reason.clone(),
            total: totals.total,
            customer_name: request.customer_name.clone(),
            customer_phone: request.customer_phone.clone(),
            notes: request.notes.clone(),
            created_at: now,
            settled_at: None,
            settled_by: None,
        };

        insert_sale(&mut *tx, &sale).await?;

        for line in &lines {
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET on_hand_grams = on_hand_grams - ?, updated_at = ?
                WHERE id = ? AND on_hand_grams >= ?
                "#,
            )
            .bind(line.quantity)
            .bind(now)
            .bind(&line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                let available = fetch_product(&mut *tx, &line.product_id)
                    .await?
                    .map(|p| p.on_hand)
                    .unwrap_or_default();
                return Err(CoreError::InsufficientStock {
                    code: line.code_snapshot.clone(),
                    available,
                    requested: line.quantity,
                }
                .into());
            }

            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                product_id: line.product_id.clone(),
                delta: -line.quantity,
                reason: MovementReason::SaleConsumption,
                reference_id: Some(sale.id.clone()),
                note: None,
                actor_id: actor.user_id.clone(),
                created_at: now,
            };
            insert_movement(&mut *tx, &movement).await?;
            insert_line(&mut *tx, line).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            total = %sale.total,
            mode = sale.payment_mode.as_str(),
            lines = lines.len(),
            "Sale committed"
        );

        Ok(SaleReceipt { sale, lines })
    }

    /// Admin-only manual stock change with an audit movement.
    pub async fn adjust_stock(
        &self,
        actor: &Actor,
        product_id: &str,
        delta: Weight,
        reason: AdjustmentReason,
        note: Option<&str>,
    ) -> LedgerResult<StockAdjustment> {
        actor.require_admin("stock adjustment")?;

        if delta.is_zero() {
            return Err(CoreError::invalid_quantity("adjustment delta must be non-zero").into());
        }
        if reason == AdjustmentReason::Restock && delta.is_negative() {
            return Err(CoreError::invalid_quantity("restock quantity must be positive").into());
        }
        validate_optional_text("note", note, 500)?;

        let mut tx = self.pool.begin().await?;

        // Inactive products stay adjustable so delisted stock can be counted down.
        let product = fetch_product(&mut *tx, product_id)
            .await?
            .ok_or_else(|| CoreError::UnknownProduct(product_id.to_string()))?;

        let negative = || CoreError::NegativeStock {
            code: product.code.clone(),
            on_hand: product.on_hand,
            delta,
        };

        let new_on_hand = product
            .on_hand
            .grams()
            .checked_add(delta.grams())
            .map(Weight::from_grams)
            .ok_or_else(|| CoreError::invalid_quantity("adjustment overflows stock"))?;

        if new_on_hand.is_negative() {
            warn!(
                code = %product.code,
                on_hand = %product.on_hand,
                delta = %delta,
                "Adjustment rejected: negative stock"
            );
            return Err(negative().into());
        }

        let now = Utc::now();
        let updated = sqlx::query(
            r#"
            UPDATE products
            SET on_hand_grams = on_hand_grams + ?, updated_at = ?
            WHERE id = ? AND on_hand_grams + ? >= 0
            "#,
        )
        .bind(delta)
        .bind(now)
        .bind(product_id)
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(negative().into());
        }

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            delta,
            reason: MovementReason::from(reason),
            reference_id: None,
            note: note.map(str::to_string),
            actor_id: actor.user_id.clone(),
            created_at: now,
        };
        insert_movement(&mut *tx, &movement).await?;

        tx.commit().await?;

        info!(
            code = %product.code,
            delta = %delta,
            on_hand = %new_on_hand,
            reason = movement.reason.as_str(),
            "Stock adjusted"
        );

        Ok(StockAdjustment {
            movement,
            on_hand: new_on_hand,
        })
    }

    /// Marks an outstanding credit sale as paid. Succeeds at most once per sale.
    pub async fn settle_credit_sale(&self, actor: &Actor, sale_id: &str) -> LedgerResult<Sale> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE sales
            SET payment_status = ?, settled_at = ?, settled_by = ?
            WHERE id = ? AND payment_mode = ? AND payment_status = ?
            "#,
        )
        .bind(PaymentStatus::Paid)
        .bind(now)
        .bind(&actor.user_id)
        .bind(sale_id)
        .bind(PaymentMode::Credit)
        .bind(PaymentStatus::Outstanding)
        .execute(&mut *tx)
        .await?;

        let settled = updated.rows_affected() > 0;
        let sale = match fetch_sale(&mut *tx, sale_id).await? {
            Some(sale) if settled => sale,
            found => {
                let reason = match found {
                    None => "sale does not exist",
                    Some(s) if s.payment_mode == PaymentMode::Cash => {
                        "cash sales are paid at checkout"
                    }
                    Some(_) => "sale is already settled",
                };
                warn!(sale_id = %sale_id, reason, "Settlement rejected");
                return Err(CoreError::invalid_transition(sale_id, reason).into());
            }
        };

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            total = %sale.total,
            settled_by = %actor.user_id,
            "Credit sale settled"
        );

        Ok(sale)
    }

    /// Sales matching `filter`, newest first.
    pub async fn query_sales(&self, filter: &SalesFilter) -> LedgerResult<Vec<Sale>> {
        Ok(SaleRepository::new(self.pool.clone()).query(filter).await?)
    }

    /// Stock level of every active product, ordered by code.
    pub async fn query_stock_status(&self) -> LedgerResult<Vec<StockStatus>> {
        let products = ProductRepository::new(self.pool.clone()).list(true).await?;
        Ok(products.iter().map(StockStatus::from).collect())
    }
}

/// Checks that need no database: line count, field lengths, discount sign
/// and the role required for a discount.
fn check_sale_request(actor: &Actor, request: &NewSale) -> Result<(), CoreError> {
    if request.lines.is_empty() {
        return Err(CoreError::EmptySale);
    }

    validate_sale_fields(request)?;

    if request.discount.is_negative() {
        return Err(CoreError::invalid_discount(
            request.discount,
            "discount cannot be negative",
        ));
    }

    if !request.discount.is_zero() && !actor.is_admin() {
        warn!(actor_id = %actor.user_id, discount = %request.discount, "Discount rejected: not admin");
        return Err(CoreError::invalid_discount(
            request.discount,
            "only an admin may apply a discount",
        ));
    }

    Ok(())
}
