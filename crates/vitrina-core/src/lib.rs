//! # vitrina-core: Pure Business Logic for the Sale Engine
//!
//! This crate is the **heart** of the Vitrina back-office. It contains the
//! rules of the sale transaction engine as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Vitrina Back-Office Architecture                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/api, axum)                    │   │
//! │  │    POST /sales, GET /inventory/movements, /cash-shifts, ...     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          vitrina-db (repositories + SaleEngine transaction)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ pure calls                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vitrina-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐  │   │
//! │  │   │ payment │ │ loyalty │ │ pricing │ │inventory │ │ shift  │  │   │
//! │  │   │  rules  │ │discount │ │ totals  │ │  combo   │ │ cash   │  │   │
//! │  │   │         │ │cashback │ │earnings │ │  plans   │ │ recon  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Client, CashShift, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation helpers
//! - [`payment`] - Payment Validator and the payment tagged union
//! - [`loyalty`] - Loyalty Resolver math and ledger settlement planning
//! - [`pricing`] - Sale total computation
//! - [`inventory`] - Stock allocation planning for simple and combo products
//! - [`shift`] - Cash shift binding and reconciliation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: callers pass `now`; nothing reads the clock here
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: monetary values are minor units (i64), percents are
//!    basis points
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use vitrina_core::money::Money;
//! use vitrina_core::types::Percent;
//!
//! let subtotal = Money::from_cents(100_000); // 1000.00
//! let loyalty = Percent::from_bps(1_500);    // 15%
//!
//! assert_eq!(subtotal.percent_of(loyalty).cents(), 15_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod loyalty;
pub mod money;
pub mod payment;
pub mod pricing;
pub mod shift;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use payment::{PaymentDetails, PaymentRules};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Branch used when neither the sale nor the product names one.
pub const DEFAULT_BRANCH: &str = "Центральный";

/// Manager name snapshotted when neither the request nor staff record has one.
pub const UNKNOWN_MANAGER: &str = "Unknown";

/// Cashback expiry window used when a client has none configured.
pub const DEFAULT_CASHBACK_EXPIRY_DAYS: i64 = 180;
