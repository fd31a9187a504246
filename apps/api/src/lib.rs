//! # Vitrina API
//!
//! HTTP back-office surface over the vitrina-db engines.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Vitrina API Routes                             │
//! │                                                                         │
//! │  GET   /health                          liveness + database check       │
//! │                                                                         │
//! │  POST  /sales                           SaleEngine::create_sale         │
//! │  GET   /sales                           filtered listing                │
//! │  GET   /sales/{id}                                                      │
//! │  PATCH /sales/{id}                      restricted detail update        │
//! │                                                                         │
//! │  GET   /inventory/movements             movement ledger                 │
//! │  POST  /inventory/movements             InventoryService                │
//! │                                                                         │
//! │  POST  /clients                         ClientService::create           │
//! │  PATCH /clients/{id}                    profile update                  │
//! │  GET   /clients/referral/{code}         referral code owner             │
//! │  POST  /clients/{id}/cashback-adjustments   manual_adjust ledger row    │
//! │  GET   /clients/{id}/loyalty-transactions                               │
//! │  GET   /promotions?clientId=                                            │
//! │  POST  /promotions                      ClientService::create_promotion │
//! │                                                                         │
//! │  POST  /cash-shifts                     ShiftService::open              │
//! │  GET   /cash-shifts                                                     │
//! │  GET   /cash-shifts/current?cashierId=                                  │
//! │  GET   /cash-shifts/{id}                                                │
//! │  GET   /cash-shifts/{id}/report                                         │
//! │  POST  /cash-shifts/{id}/close                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers only translate JSON to engine calls and engine errors to
//! [`error::ApiError`]; every business rule lives below this crate.

pub mod config;
pub mod error;
pub mod routes;

use axum::Router;
use vitrina_db::{ClientService, Database, EngineConfig, InventoryService, SaleEngine, ShiftService};

/// Shared handler state. Every member is a cheap pool handle.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sales: SaleEngine,
    pub inventory: InventoryService,
    pub shifts: ShiftService,
    pub clients: ClientService,
}

impl AppState {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        AppState {
            sales: SaleEngine::new(db.clone(), config),
            inventory: InventoryService::new(db.clone()),
            shifts: ShiftService::new(db.clone()),
            clients: ClientService::new(db.clone()),
            db,
        }
    }
}

/// Builds the full router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::sales::routes())
        .merge(routes::inventory::routes())
        .merge(routes::clients::routes())
        .merge(routes::shifts::routes())
        .with_state(state)
}
