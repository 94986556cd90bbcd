//! # Error Types
//!
//! Domain-specific error types for ricemill-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ricemill-core errors (this file)                                      │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  ricemill-db errors (separate crate)                                   │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - CoreError | StorageUnavailable(DbError)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is permanent for the given input: the caller has to fix
//! the quantity, the discount or the actor before trying again.

use thiserror::Error;

use crate::money::Money;
use crate::weight::Weight;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested weight exceeds what is on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: RICE001 × 10.000 kg
    ///      │
    ///      ▼
    /// on hand = 5.000 kg
    ///      │
    ///      ▼
    /// InsufficientStock { code: "RICE001", available: 5.000 kg, requested: 10.000 kg }
    ///      │
    ///      ▼
    /// Nothing written, stock stays 5.000 kg
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: Weight,
        requested: Weight,
    },

    /// Discount is negative, larger than the subtotal, or requested by a
    /// non-admin actor.
    #[error("Invalid discount {discount}: {reason}")]
    InvalidDiscount { discount: Money, reason: String },

    /// Product id does not exist or the product is deactivated.
    #[error("Unknown or inactive product: {0}")]
    UnknownProduct(String),

    /// Quantity or delta is zero, negative, or out of range.
    #[error("Invalid quantity: {reason}")]
    InvalidQuantity { reason: String },

    /// A stock adjustment would leave on-hand below zero.
    #[error("Adjustment of {delta} on {code} would leave negative stock (on hand {on_hand})")]
    NegativeStock {
        code: String,
        on_hand: Weight,
        delta: Weight,
    },

    /// Actor's role does not permit the operation.
    #[error("Forbidden: {action} requires admin role")]
    Forbidden { action: String },

    /// Sale cannot move to the requested payment state.
    #[error("Sale {sale_id} cannot be settled: {reason}")]
    InvalidStateTransition { sale_id: String, reason: String },

    /// A sale was submitted with no lines.
    #[error("Sale has no lines")]
    EmptySale,

    /// A container ("bag") line was requested for a product sold only by weight.
    #[error("Product {code} has no container size/price defined")]
    ContainerNotDefined { code: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for an [`CoreError::InvalidQuantity`].
    pub fn invalid_quantity(reason: impl Into<String>) -> Self {
        CoreError::InvalidQuantity {
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`CoreError::InvalidDiscount`].
    pub fn invalid_discount(discount: Money, reason: impl Into<String>) -> Self {
        CoreError::InvalidDiscount {
            discount,
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`CoreError::InvalidStateTransition`].
    pub fn invalid_transition(sale_id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidStateTransition {
            sale_id: sale_id.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised by the catalog and user accessors before any row is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            code: "RICE001".to_string(),
            available: Weight::from_kg(5),
            requested: Weight::from_kg(10),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for RICE001: available 5.000 kg, requested 10.000 kg"
        );

        let err = CoreError::Forbidden {
            action: "stock adjustment".to_string(),
        };
        assert_eq!(err.to_string(), "Forbidden: stock adjustment requires admin role");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        };
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
