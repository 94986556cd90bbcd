//! # Domain Types
//!
//! Core domain types used throughout the rice-mill POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  code (RICE001) │   │  sale_number    │   │  unit_kind      │       │
//! │  │  price_per_kg   │   │  payment_mode   │   │  quantity (g)   │       │
//! │  │  container      │   │  payment_status │   │  unit_price     │       │
//! │  │  on_hand (g)    │   │  subtotal/total │   │  line_total     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ StockMovement   │   │     Actor       │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  delta (g)      │   │  user_id        │   │  username       │       │
//! │  │  reason         │   │  role           │   │  role           │       │
//! │  │  append-only    │   │  (capability)   │   │  is_active      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Products, sales and users carry a UUID `id` used for relations plus a
//! human-readable business key (`code`, `sale_number`, `username`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::weight::Weight;

// =============================================================================
// Roles & Actor
// =============================================================================

/// Role of a logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May apply discounts, edit stock and manage the catalog.
    Admin,
    /// May ring up sales and settle credit sales.
    Cashier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
        }
    }
}

/// The authorization capability handed to every ledger write.
///
/// Produced by the authentication collaborator; the ledger trusts `role`
/// and records `user_id` as the immutable actor reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Actor {
            user_id: user_id.into(),
            role,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with [`CoreError::Forbidden`] unless the actor is an admin.
    pub fn require_admin(&self, action: &str) -> CoreResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                action: action.to_string(),
            })
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// Quality grade of a rice variety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Premium,
    Standard,
    Economic,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Premium => "premium",
            Quality::Standard => "standard",
            Quality::Economic => "economic",
        }
    }
}

/// A fixed-weight package ("bag") a product can also be sold in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Weight of one container, > 0.
    pub weight: Weight,
    /// Price of one whole container.
    pub price: Money,
}

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business code, unique (e.g. `RICE001`).
    pub code: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    pub quality: Quality,

    /// Price per kilogram.
    pub price_per_kg: Money,

    /// Container size and price, when the product is also sold by the bag.
    pub container: Option<ContainerSpec>,

    /// Current on-hand quantity. Only the ledger writes this.
    pub on_hand: Weight,

    /// Reorder level used by stock status reports.
    pub min_stock: Weight,

    pub description: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks if `requested` can be taken from current stock.
    #[inline]
    pub fn can_supply(&self, requested: Weight) -> bool {
        requested <= self.on_hand
    }

    /// Classifies current stock against the reorder level.
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::classify(self.on_hand, self.min_stock)
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub quality: Quality,
    pub price_per_kg: Money,
    pub container: Option<ContainerSpec>,
    /// Recorded as an opening restock movement when non-zero.
    pub opening_stock: Weight,
    pub min_stock: Weight,
    pub description: Option<String>,
}

/// Editable product details. On-hand quantity is deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub quality: Quality,
    pub price_per_kg: Money,
    pub container: Option<ContainerSpec>,
    pub min_stock: Weight,
    pub description: Option<String>,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Why stock changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    Restock,
    Adjustment,
    SaleConsumption,
}

impl MovementReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementReason::Restock => "restock",
            MovementReason::Adjustment => "adjustment",
            MovementReason::SaleConsumption => "sale_consumption",
        }
    }
}

/// Reasons an admin may give for a manual stock change.
///
/// A strict subset of [`MovementReason`]: sale consumption is only ever
/// written by checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    /// Goods received; delta must be positive.
    Restock,
    /// Count correction in either direction.
    Adjustment,
}

impl From<AdjustmentReason> for MovementReason {
    fn from(reason: AdjustmentReason) -> Self {
        match reason {
            AdjustmentReason::Restock => MovementReason::Restock,
            AdjustmentReason::Adjustment => MovementReason::Adjustment,
        }
    }
}

/// One entry of the append-only stock audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    /// Signed change in on-hand quantity.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "delta_grams"))]
    pub delta: Weight,
    pub reason: MovementReason,
    /// Sale id for sale consumption.
    pub reference_id: Option<String>,
    pub note: Option<String>,
    pub actor_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Status
// =============================================================================

/// Stock classification for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Available,
    Low,
    OutOfStock,
}

impl StockLevel {
    /// Zero stock is out of stock even when the reorder level is zero.
    pub fn classify(on_hand: Weight, min_stock: Weight) -> StockLevel {
        if on_hand.is_zero() {
            StockLevel::OutOfStock
        } else if on_hand < min_stock {
            StockLevel::Low
        } else {
            StockLevel::Available
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockLevel::Available => "Available",
            StockLevel::Low => "Low Stock",
            StockLevel::OutOfStock => "Out of Stock",
        }
    }
}

/// One row of the stock status report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockStatus {
    pub product_id: String,
    pub code: String,
    pub name: String,
    pub quality: Quality,
    pub price_per_kg: Money,
    pub container_price: Option<Money>,
    pub on_hand: Weight,
    pub min_stock: Weight,
    pub level: StockLevel,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for StockStatus {
    fn from(p: &Product) -> Self {
        StockStatus {
            product_id: p.id.clone(),
            code: p.code.clone(),
            name: p.name.clone(),
            quality: p.quality,
            price_per_kg: p.price_per_kg,
            container_price: p.container.map(|c| c.price),
            on_hand: p.on_hand,
            min_stock: p.min_stock,
            level: p.stock_level(),
            updated_at: p.updated_at,
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    /// Recorded now, paid later via settlement.
    Credit,
}

impl PaymentMode {
    /// Payment status a freshly committed sale starts in.
    pub fn initial_status(&self) -> PaymentStatus {
        match self {
            PaymentMode::Cash => PaymentStatus::Paid,
            PaymentMode::Credit => PaymentStatus::Outstanding,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Credit => "credit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Outstanding,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Outstanding => "outstanding",
        }
    }
}

// =============================================================================
// Sale Requests
// =============================================================================

/// Unit a sale line was entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Loose, priced per kilogram.
    Weight,
    /// Whole bags, priced per bag.
    Container,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Weight => "weight",
            UnitKind::Container => "container",
        }
    }
}

/// Requested quantity of one line. The variant carries the unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "amount", rename_all = "snake_case")]
pub enum LineQuantity {
    Weight(Weight),
    Containers(i64),
}

impl LineQuantity {
    pub fn unit_kind(&self) -> UnitKind {
        match self {
            LineQuantity::Weight(_) => UnitKind::Weight,
            LineQuantity::Containers(_) => UnitKind::Container,
        }
    }
}

/// One requested line at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: LineQuantity,
}

impl SaleLineRequest {
    pub fn by_weight(product_id: impl Into<String>, weight: Weight) -> Self {
        SaleLineRequest {
            product_id: product_id.into(),
            quantity: LineQuantity::Weight(weight),
        }
    }

    pub fn by_container(product_id: impl Into<String>, count: i64) -> Self {
        SaleLineRequest {
            product_id: product_id.into(),
            quantity: LineQuantity::Containers(count),
        }
    }
}

/// Everything checkout needs to commit a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    pub payment_mode: PaymentMode,
    pub lines: Vec<SaleLineRequest>,
    /// Absolute discount; non-zero requires an admin actor.
    pub discount: Money,
    pub discount_reason: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

impl NewSale {
    pub fn new(payment_mode: PaymentMode, lines: Vec<SaleLineRequest>) -> Self {
        NewSale {
            payment_mode,
            lines,
            discount: Money::zero(),
            discount_reason: None,
            customer_name: None,
            customer_phone: None,
            notes: None,
        }
    }

    pub fn cash(lines: Vec<SaleLineRequest>) -> Self {
        NewSale::new(PaymentMode::Cash, lines)
    }

    pub fn credit(lines: Vec<SaleLineRequest>) -> Self {
        NewSale::new(PaymentMode::Credit, lines)
    }

    pub fn with_discount(mut self, discount: Money, reason: Option<String>) -> Self {
        self.discount = discount;
        self.discount_reason = reason;
        self
    }

    pub fn with_customer(mut self, name: impl Into<String>, phone: Option<String>) -> Self {
        self.customer_name = Some(name.into());
        self.customer_phone = phone;
        self
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// `YYYYMMDD-NNNN`, per-day sequence.
    pub sale_number: String,
    pub actor_id: String,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "subtotal_cents"))]
    pub subtotal: Money,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "discount_cents"))]
    pub discount: Money,
    pub discount_reason: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    pub settled_by: Option<String>,
}

impl Sale {
    #[inline]
    pub fn is_outstanding(&self) -> bool {
        self.payment_status == PaymentStatus::Outstanding
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item of a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product code at time of sale (frozen).
    pub code_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    pub unit_kind: UnitKind,
    /// Number of containers for container lines.
    pub container_count: Option<i64>,
    /// Weight-equivalent quantity taken from stock.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "quantity_grams"))]
    pub quantity: Weight,
    /// Per kg for weight lines, per container for container lines (frozen).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "unit_price_cents"))]
    pub unit_price: Money,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "line_total_cents"))]
    pub line_total: Money,
    /// Order the line was entered in.
    pub position: i64,
}

/// A sale with its lines: the receipt read model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

// =============================================================================
// User
// =============================================================================

/// A login account. The credential hash never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub full_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The capability this user acts with.
    pub fn actor(&self) -> Actor {
        Actor::new(self.id.clone(), self.role)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_admin() {
        let admin = Actor::new("u1", Role::Admin);
        let cashier = Actor::new("u2", Role::Cashier);

        assert!(admin.require_admin("discount").is_ok());
        assert!(matches!(
            cashier.require_admin("discount"),
            Err(CoreError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_initial_payment_status() {
        assert_eq!(PaymentMode::Cash.initial_status(), PaymentStatus::Paid);
        assert_eq!(PaymentMode::Credit.initial_status(), PaymentStatus::Outstanding);
    }

    #[test]
    fn test_stock_level_classify() {
        let min = Weight::from_kg(100);
        assert_eq!(StockLevel::classify(Weight::zero(), min), StockLevel::OutOfStock);
        assert_eq!(StockLevel::classify(Weight::from_kg(50), min), StockLevel::Low);
        assert_eq!(StockLevel::classify(Weight::from_kg(100), min), StockLevel::Available);
        assert_eq!(
            StockLevel::classify(Weight::zero(), Weight::zero()),
            StockLevel::OutOfStock
        );
    }

    #[test]
    fn test_adjustment_reason_maps_to_movement_reason() {
        assert_eq!(
            MovementReason::from(AdjustmentReason::Restock),
            MovementReason::Restock
        );
        assert_eq!(
            MovementReason::from(AdjustmentReason::Adjustment),
            MovementReason::Adjustment
        );
    }

    #[test]
    fn test_line_quantity_serde_shape() {
        let line = SaleLineRequest::by_container("p1", 2);
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["quantity"]["unit"], "containers");
        assert_eq!(json["quantity"]["amount"], 2);
        assert_eq!(line.quantity.unit_kind(), UnitKind::Container);
    }
}
