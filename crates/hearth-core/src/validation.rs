//! # Validation Module
//!
//! Input validation for the engine's operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization                                               │
//! │  └── Types and shapes (serde)                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, positive quantities, discount range              │
//! │  └── Runs before any persisted state is read                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign keys, UNIQUE(sale_id) on bank transactions                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use hearth_core::quantity::Quantity;
//! use hearth_core::types::{AddStockInput, AddStockItem};
//! use hearth_core::validation::validate_add_stock;
//!
//! let input = AddStockInput {
//!     items: vec![AddStockItem { product_id: "croissant".into(), quantity: Quantity::from_units(12) }],
//!     ..Default::default()
//! };
//! assert!(validate_add_stock(&input).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::{Money, BPS_PER_WHOLE};
use crate::quantity::Quantity;
use crate::types::{
    AddStockInput, CreateSaleInput, PackageLineInput, ProductLineInput, UpdateSaleInput,
};
use crate::{MAX_LINE_QUANTITY, MAX_SALE_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Rejects empty or whitespace-only identifiers.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates a line or restock quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(field: &str, qty: Quantity) -> ValidationResult<()> {
    if !qty.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY.milli(),
        });
    }

    Ok(())
}

/// Validates the caller-supplied sale total.
pub fn validate_total(total: Option<Money>) -> ValidationResult<()> {
    match total {
        None => Err(ValidationError::required("total")),
        Some(t) if t.is_negative() => Err(ValidationError::MustNotBeNegative {
            field: "total".to_string(),
        }),
        Some(_) => Ok(()),
    }
}

/// Validates the discount fields.
///
/// ## Rules
/// - Percentage between 0 and 10000 basis points (0% to 100%)
/// - Fixed and computed amounts non-negative
pub fn validate_discount(
    percent_bps: Option<i64>,
    value: Option<Money>,
    computed: Option<Money>,
) -> ValidationResult<()> {
    if let Some(bps) = percent_bps {
        if !(0..=BPS_PER_WHOLE).contains(&bps) {
            return Err(ValidationError::OutOfRange {
                field: "discountPercent".to_string(),
                min: 0,
                max: BPS_PER_WHOLE,
            });
        }
    }

    for (field, amount) in [("discountValue", value), ("discountComputed", computed)] {
        if amount.is_some_and(|m| m.is_negative()) {
            return Err(ValidationError::MustNotBeNegative {
                field: field.to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Line Validators
// =============================================================================

/// Validates the product and package line sets of a sale.
///
/// ## Rules
/// - At least one product or package line
/// - At most [`MAX_SALE_LINES`] lines in total
/// - Every line has an id and a positive quantity
pub fn validate_lines(
    items: &[ProductLineInput],
    packages: &[PackageLineInput],
) -> ValidationResult<()> {
    if items.is_empty() && packages.is_empty() {
        return Err(ValidationError::required("items"));
    }

    if items.len() + packages.len() > MAX_SALE_LINES {
        return Err(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_SALE_LINES,
        });
    }

    for item in items {
        validate_id("productId", &item.product_id)?;
        validate_quantity("quantity", item.quantity)?;
    }
    for package in packages {
        validate_id("packageId", &package.package_id)?;
        validate_quantity("quantity", package.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Operation Validators
// =============================================================================

pub fn validate_create_sale(input: &CreateSaleInput) -> ValidationResult<()> {
    validate_id("paymentMethodId", &input.payment_method_id)?;
    validate_total(input.total)?;
    validate_lines(&input.items, &input.packages)?;
    validate_discount(
        input.discount_percent_bps,
        input.discount_value,
        input.discount_computed,
    )
}

pub fn validate_update_sale(input: &UpdateSaleInput) -> ValidationResult<()> {
    validate_id("paymentMethodId", &input.payment_method_id)?;
    validate_total(input.total)?;
    validate_lines(&input.items, &input.packages)?;
    validate_discount(
        input.discount_percent_bps,
        input.discount_value,
        input.discount_computed,
    )
}

pub fn validate_add_stock(input: &AddStockInput) -> ValidationResult<()> {
    if input.items.is_empty() {
        return Err(ValidationError::required("items"));
    }

    if input.items.len() > MAX_SALE_LINES {
        return Err(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_SALE_LINES,
        });
    }

    for item in &input.items {
        validate_id("productId", &item.product_id)?;
        validate_quantity("quantity", item.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
