//! # Error Types
//!
//! Domain-specific error types for vitrina-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vitrina-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vitrina-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── EngineError      - CoreError | DbError inside the engines         │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - What the client sees (JSON)                    │
//! │                                                                         │
//! │  Every CoreError has an ErrorKind:                                     │
//! │    Validation → 400   NotFound → 404   Conflict → 409                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of a business failure.
///
/// The HTTP layer maps each kind to a status code; the engine never needs to
/// know about status codes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or rule-violating input.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// The request is well-formed but conflicts with current state.
    Conflict,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations detected by the sale
/// engine, the shift lifecycle or manual inventory movements.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Client referenced by explicit id does not exist or is inactive.
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Cash shift cannot be found.
    #[error("Cash shift not found: {0}")]
    ShiftNotFound(String),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// No active client carries the referral code.
    #[error("Referral code not found: {0}")]
    ReferralCodeNotFound(String),

    /// Insufficient stock to complete the sale or movement.
    ///
    /// ## User Workflow
    /// ```text
    /// Sell combo "Gift Box" × 2
    ///      │
    ///      ▼
    /// Component "Mug" needs 2, has 1
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Mug", available: 1, requested: 2 }
    ///      │
    ///      ▼
    /// Nothing is deducted (all-or-nothing)
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Product belongs to another branch than the one the operation targets.
    #[error("Product {product} belongs to branch {product_branch}, not {requested_branch}")]
    BranchMismatch {
        product: String,
        product_branch: String,
        requested_branch: String,
    },

    /// Combo product has no components configured.
    #[error("Combo {0} has no components")]
    EmptyCombo(String),

    /// Combo stock derives from components and cannot be moved directly.
    #[error("Combo {0} has no stock of its own")]
    ComboStockImmutable(String),

    /// Combo component references a product that does not exist.
    #[error("Combo {combo} references missing component {component_id}")]
    ComboComponentMissing { combo: String, component_id: String },

    /// Sale references a shift that is already closed.
    #[error("Cash shift {0} is closed")]
    ShiftClosed(String),

    /// Sale manager differs from the cashier who owns the shift.
    #[error("Cash shift {shift_id} belongs to cashier {cashier_id}, not {manager_id}")]
    ShiftCashierMismatch {
        shift_id: String,
        cashier_id: String,
        manager_id: String,
    },

    /// A manual correction would take the cashback balance below zero.
    #[error("Client {client_id} has {balance_cents} cashback, cannot adjust by {amount_cents}")]
    InsufficientCashback {
        client_id: String,
        balance_cents: i64,
        amount_cents: i64,
    },

    /// Cashier already has an open shift.
    #[error("Cashier {0} already has an open shift")]
    ShiftAlreadyOpen(String),

    /// Installment provider is not in the provider table.
    #[error("Unknown installment provider: {0}")]
    UnknownInstallmentProvider(String),

    /// Installment term is not offered by the provider.
    #[error("Installment provider {provider} does not offer {months} months (allowed: {allowed:?})")]
    InvalidInstallmentTerm {
        provider: String,
        months: u32,
        allowed: Vec<u32>,
    },

    /// Hybrid payment parts do not add up to the sale total.
    #[error("Hybrid payment parts sum to {paid_cents}, sale total is {total_cents}")]
    HybridMismatch { paid_cents: i64, total_cents: i64 },

    /// Delivery booking deposit + buyout do not add up to the sale total.
    #[error("Booking deposit and buyout sum to {paid_cents}, sale total is {total_cents}")]
    BookingMismatch { paid_cents: i64, total_cents: i64 },

    /// Manual payment label is not configured for the tenant.
    #[error("Unknown manual payment type: {0}")]
    UnknownManualPayment(String),

    /// Inventory operation does not match the movement direction.
    #[error("Operation {operation} cannot be recorded as {movement}")]
    OperationDirectionMismatch { operation: String, movement: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies the error for the outer layers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::ClientNotFound(_)
            | CoreError::ShiftNotFound(_)
            | CoreError::SaleNotFound(_)
            | CoreError::ReferralCodeNotFound(_) => ErrorKind::NotFound,

            CoreError::InsufficientStock { .. }
            | CoreError::BranchMismatch { .. }
            | CoreError::EmptyCombo(_)
            | CoreError::ComboStockImmutable(_)
            | CoreError::ShiftClosed(_)
            | CoreError::ShiftCashierMismatch { .. }
            | CoreError::InsufficientCashback { .. }
            | CoreError::ShiftAlreadyOpen(_) => ErrorKind::Conflict,

            CoreError::ComboComponentMissing { .. }
            | CoreError::UnknownInstallmentProvider(_)
            | CoreError::InvalidInstallmentTerm { .. }
            | CoreError::HybridMismatch { .. }
            | CoreError::BookingMismatch { .. }
            | CoreError::UnknownManualPayment(_)
            | CoreError::OperationDirectionMismatch { .. }
            | CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., unparsable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Arithmetic on the value leaves the representable range.
    #[error("{field} is too large")]
    Overflow { field: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::Overflow`].
    pub fn overflow(field: impl Into<String>) -> Self {
        ValidationError::Overflow {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::MustNotBeNegative`].
    pub fn negative(field: impl Into<String>) -> Self {
        ValidationError::MustNotBeNegative {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
