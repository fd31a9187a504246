//! # Engines
//!
//! Multi-statement workflows that must commit or roll back as one unit.
//!
//! ## Sale Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SaleEngine::create_sale                          │
//! │                                                                         │
//! │  (no transaction yet, fail fast)                                       │
//! │    request checks ── PaymentRules::validate_intake ── staff lookup     │
//! │                                   │                                     │
//! │  BEGIN ───────────────────────────┼──────────────────────────────────  │
//! │    shift::check_binding (open, same cashier)                           │
//! │    loyalty::resolve_client ──► quote (discount %, spendable cashback)  │
//! │    inventory::reserve_stock ──► conditional decrements   [stock-reserved]│
//! │    compute_totals + verify_settlement               [totals-finalized] │
//! │    sale::insert + movement rows                            [persisted] │
//! │    loyalty::settle ──► ledger rows, client aggregates [loyalty-settled]│
//! │  COMMIT ───────────────────────────────────────────────────────────────│
//! │                                                                         │
//! │  Any error drops the transaction: stock, sale, movements and ledger    │
//! │  rows all disappear together.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Services
//! - [`SaleEngine`] - sale creation and restricted sale updates
//! - [`InventoryService`] - manual stock movements
//! - [`ShiftService`] - cash shift open / report / close
//! - [`ClientService`] - client profiles, cashback corrections, promotions

use thiserror::Error;

use crate::error::DbError;
use vitrina_core::loyalty::LoyaltyConfig;
use vitrina_core::{CoreError, ErrorKind, PaymentRules, ValidationError, DEFAULT_BRANCH};

pub mod client;
pub mod inventory;
pub mod loyalty;
pub mod sale;
pub mod shift;

pub use client::{CashbackAdjustment, ClientService, ClientUpdate, NewClient, NewPromotion, ReferralMatch};
pub use inventory::{InventoryService, ManualMovementRequest};
pub use sale::{SaleEngine, SaleRequest, SaleStage};
pub use shift::{CloseShiftRequest, OpenShiftRequest, ShiftService};

// =============================================================================
// Configuration
// =============================================================================

/// Rules injected into the engines.
///
/// Manual payment labels stored in settings are merged into
/// `payment_rules` on every sale.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub payment_rules: PaymentRules,
    pub loyalty: LoyaltyConfig,
    /// Branch recorded when neither the sale nor the product names one.
    pub default_branch: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            payment_rules: PaymentRules::default(),
            loyalty: LoyaltyConfig::default(),
            default_branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Failure of an engine operation: a domain rule or the storage layer.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl EngineError {
    /// Caller-facing category; `None` means a fatal storage failure.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            EngineError::Core(err) => Some(err.kind()),
            EngineError::Db(DbError::NotFound { .. }) => Some(ErrorKind::NotFound),
            EngineError::Db(DbError::UniqueViolation { .. }) => Some(ErrorKind::Conflict),
            EngineError::Db(_) => None,
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Db(DbError::from(err))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
