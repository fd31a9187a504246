//! # Repository Module
//!
//! Database repository implementations for the Vitrina back-office.
//!
//! ## Two Access Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Access Paths                              │
//! │                                                                         │
//! │  HTTP handler                         SaleEngine / ShiftService         │
//! │       │                                     │                           │
//! │       │ db.sales().list(&filter)            │ pool.begin()              │
//! │       ▼                                     ▼                           │
//! │  SaleRepository (owns a pool clone)   sale::insert(&mut *tx, &sale)     │
//! │       │                               product::decrement_stock(..)      │
//! │       │ borrows one connection        client::write_loyalty_state(..)   │
//! │       ▼                                     │                           │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      SQLite Database                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Repository structs serve single reads and listings. Module-level      │
//! │  functions take `&mut SqliteConnection` so the engines can run many    │
//! │  statements inside one transaction.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - products and combo components
//! - [`ClientRepository`](client::ClientRepository) - loyalty clients (read-mostly)
//! - [`PromotionRepository`](promotion::PromotionRepository) - discount windows
//! - [`LoyaltyTransactionRepository`](loyalty::LoyaltyTransactionRepository) - loyalty ledger
//! - [`SaleRepository`](sale::SaleRepository) - sales, listing and restricted updates
//! - [`MovementRepository`](movement::MovementRepository) - inventory movement ledger
//! - [`ShiftRepository`](shift::ShiftRepository) - cash shifts
//! - [`StaffRepository`](staff::StaffRepository) - staff lookups
//! - [`SettingsRepository`](settings::SettingsRepository) - manual payment labels

pub mod client;
pub mod loyalty;
pub mod movement;
pub mod product;
pub mod promotion;
pub mod sale;
pub mod settings;
pub mod shift;
pub mod staff;

pub use movement::MovementFilter;
pub use sale::{SaleDetailsUpdate, SaleFilter};

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
