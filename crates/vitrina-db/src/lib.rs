//! # vitrina-db: Database Layer and Sale Engine
//!
//! SQLite storage for the Vitrina back-office (sqlx, async) and the
//! transactional engines built on top of it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Vitrina Sale Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (POST /sales)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   vitrina-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌───────────────┐  ┌──────────────────┐   │   │
//! │  │   │    Engines    │  │ Repositories  │  │    Migrations    │   │   │
//! │  │   │  (engine/)    │  │ (repository/) │  │    (embedded)    │   │   │
//! │  │   │               │  │               │  │                  │   │   │
//! │  │   │ SaleEngine    │─►│ product, sale │  │ 001_initial      │   │   │
//! │  │   │ ShiftService  │  │ client, shift │  │ 002_sales        │   │   │
//! │  │   │ Inventory...  │  │ movement, ... │  │ 003_indexes      │   │   │
//! │  │   │ ClientService │  │               │  │ 004_search_text  │   │   │
//! │  │   └───────────────┘  └───────┬───────┘  └──────────────────┘   │   │
//! │  │                              │                                  │   │
//! │  │   ┌──────────────────────────▼──────────────────────────────┐  │   │
//! │  │   │              Database (pool.rs, SqlitePool)             │  │   │
//! │  │   └─────────────────────────────────────────────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  SQLite Database (WAL mode)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, sale, shift, ...)
//! - [`engine`] - Sale transaction, manual movements, shift lifecycle, clients
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vitrina_db::{Database, DbConfig, EngineConfig, SaleEngine, SaleRequest};
//!
//! let db = Database::new(DbConfig::new("vitrina.db")).await?;
//! let engine = SaleEngine::new(db.clone(), EngineConfig::default());
//!
//! let sale = engine
//!     .create_sale(SaleRequest {
//!         product_id: "p-1".into(),
//!         quantity: 2,
//!         ..Default::default()
//!     })
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use engine::{
    CashbackAdjustment, ClientService, ClientUpdate, CloseShiftRequest, EngineConfig, EngineError, EngineResult,
    InventoryService, ManualMovementRequest, NewClient, NewPromotion, OpenShiftRequest, ReferralMatch, SaleEngine,
    SaleRequest, SaleStage, ShiftService,
};

// Repository re-exports for convenience
pub use repository::movement::{MovementFilter, MovementRepository};
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleDetailsUpdate, SaleFilter, SaleRepository};
pub use repository::shift::ShiftRepository;
