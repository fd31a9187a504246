//! HTTP route modules.
//!
//! Each module exposes `routes() -> Router<AppState>`; [`crate::create_router`]
//! merges them and attaches the state once.

pub mod clients;
pub mod health;
pub mod inventory;
pub mod sales;
pub mod shifts;
