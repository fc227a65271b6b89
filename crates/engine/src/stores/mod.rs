//! In-memory state storage modules.
//!
//! Stores manage runtime state that is only authoritative while a player
//! is online:
//! - `PlayerStore` - loaded players and their marriages

pub mod player_store;

pub use player_store::{PlayerStore, SharedPlayer};
