//! Marriage engine library.
//!
//! Keeps per-player marriage state cached while players are online and
//! durable across restarts.
//!
//! ## Structure
//!
//! - `stores/` - The player cache
//! - `use_cases/` - Marry, divorce and listing
//! - `infrastructure/` - Ports, storage adapters, the persistence runner and the listener bus
//! - `app` - Application composition and lifecycle
//! - `config` - Environment configuration

pub mod app;
pub mod config;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;


pub use app::App;
pub use config::{EngineConfig, StorageBackend};
