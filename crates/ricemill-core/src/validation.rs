//! # Validation Module
//!
//! Input validation for catalog and user writes.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Presentation (forms)                                          │
//! │  └── parse text into Weight / Money                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── business rules on codes, names, prices, containers                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  └── NOT NULL, UNIQUE, CHECK(on_hand_grams >= 0), foreign keys          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ricemill_core::validation::{validate_product_code, validate_username};
//!
//! validate_product_code("RICE001").unwrap();
//! validate_username("cashier1").unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{ContainerSpec, NewProduct, NewSale, ProductUpdate};
use crate::weight::Weight;
use crate::MAX_SALE_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum password length for user accounts.
pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use ricemill_core::validation::validate_product_code;
///
/// assert!(validate_product_code("RICE001").is_ok());
/// assert!(validate_product_code("").is_err());
/// assert!(validate_product_code("RICE 001").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product display name (1..=200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a person's display name (1..=100 characters after trimming).
pub fn validate_full_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "full_name".to_string(),
        });
    }

    if name.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "full_name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a login name: 3..=50 characters, letters, digits, `.`, `_`, `-`.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }

    if username.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a new password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Optional free text (notes, customer name). `None` is always fine.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price. Zero is allowed, negative is not.
///
/// ```rust
/// use ricemill_core::{money::Money, validation::validate_price};
///
/// assert!(validate_price("price_per_kg", Money::from_cents(4000)).is_ok());
/// assert!(validate_price("price_per_kg", Money::zero()).is_ok());
/// assert!(validate_price("price_per_kg", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a weight that must not be negative (opening stock, reorder level).
pub fn validate_non_negative_weight(field: &str, weight: Weight) -> ValidationResult<()> {
    if weight.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a container definition: positive weight, non-negative price.
pub fn validate_container(container: &ContainerSpec) -> ValidationResult<()> {
    if !container.weight.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "container_weight".to_string(),
        });
    }

    validate_price("container_price", container.price)
}

/// Validates the number of lines in a sale.
pub fn validate_sale_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "sale lines".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Checks every field of a new catalog entry.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_code(&product.code)?;
    validate_product_name(&product.name)?;
    validate_price("price_per_kg", product.price_per_kg)?;
    if let Some(container) = &product.container {
        validate_container(container)?;
    }
    validate_non_negative_weight("opening_stock", product.opening_stock)?;
    validate_non_negative_weight("min_stock", product.min_stock)?;
    validate_optional_text("description", product.description.as_deref(), 1000)
}

/// Checks every field of a catalog edit.
pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    validate_product_name(&update.name)?;
    validate_price("price_per_kg", update.price_per_kg)?;
    if let Some(container) = &update.container {
        validate_container(container)?;
    }
    validate_non_negative_weight("min_stock", update.min_stock)?;
    validate_optional_text("description", update.description.as_deref(), 1000)
}

/// Field-level checks on a checkout request. Quantities and discounts are
/// ledger rules and checked by the ledger itself.
pub fn validate_sale_fields(sale: &NewSale) -> ValidationResult<()> {
    validate_sale_size(sale.lines.len())?;
    validate_optional_text("customer_name", sale.customer_name.as_deref(), 200)?;
    validate_optional_text("customer_phone", sale.customer_phone.as_deref(), 30)?;
    validate_optional_text("discount_reason", sale.discount_reason.as_deref(), 500)?;
    validate_optional_text("notes", sale.notes.as_deref(), 1000)
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ```rust
/// use ricemill_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
