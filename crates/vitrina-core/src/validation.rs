//! # Validation Module
//!
//! Input validation utilities shared by the sale engine, shift lifecycle and
//! manual inventory movements.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP (apps/api)                                              │
//! │  └── Type validation (serde deserialization, unknown fields)           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + payment rules                                  │
//! │  └── Business rule validation before any transaction opens            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock_qty >= 0), CHECK (cashback_balance_cents >= 0)       │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Percent;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Default page size for listings.
pub const DEFAULT_LIST_LIMIT: i64 = 200;

/// Largest page size a listing accepts.
pub const MAX_LIST_LIMIT: i64 = 500;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale quantity.
///
/// ## Rules
/// - Must be positive (> 0)
///
/// There is no upper cap; stock and overflow checks bound it downstream.
///
/// ## Example
/// ```rust
/// use vitrina_core::validation::validate_quantity;
///
/// assert!(validate_quantity(2).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-1).is_err());
/// ```
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates that a monetary amount is not negative.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::negative(field));
    }
    Ok(())
}

/// Validates an optional monetary amount, treating `None` as valid.
pub fn validate_optional_non_negative(field: &str, amount: Option<Money>) -> ValidationResult<()> {
    match amount {
        Some(amount) => validate_non_negative(field, amount),
        None => Ok(()),
    }
}

/// Validates a percentage given in basis points (at most 100%).
pub fn validate_percent(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > Percent::FULL.bps() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be at most 100%".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Trims a required text field, rejecting empty values.
///
/// ## Example
/// ```rust
/// use vitrina_core::validation::require_text;
///
/// assert_eq!(require_text("cashierName", "  Aida ").unwrap(), "Aida");
/// assert!(require_text("cashierName", "   ").is_err());
/// ```
pub fn require_text(field: &str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(trimmed.to_string())
}

/// Trims optional text, collapsing blank values to `None`.
pub fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reduces a phone number to its digits.
///
/// ## Example
/// ```rust
/// use vitrina_core::validation::normalize_phone;
///
/// assert_eq!(normalize_phone("+996 (555) 12-34-56"), "996555123456");
/// ```
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Referral codes are stored and matched trimmed and uppercased.
///
/// ## Example
/// ```rust
/// use vitrina_core::validation::normalize_referral_code;
///
/// assert_eq!(normalize_referral_code(" cl-ab12 "), Some("CL-AB12".to_string()));
/// assert_eq!(normalize_referral_code("  "), None);
/// ```
pub fn normalize_referral_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_uppercase())
}

// =============================================================================
// Listing Validators
// =============================================================================

/// Clamps a listing page size into `1..=MAX_LIST_LIMIT`.
///
/// ## Example
/// ```rust
/// use vitrina_core::validation::clamp_limit;
///
/// assert_eq!(clamp_limit(None), 200);
/// assert_eq!(clamp_limit(Some(0)), 1);
/// assert_eq!(clamp_limit(Some(10_000)), 500);
/// ```
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT)
}

/// Clamps a listing offset to ≥ 0.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// =============================================================================
// Unit Tests
// =============================================================================
