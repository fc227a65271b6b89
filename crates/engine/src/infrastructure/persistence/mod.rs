//! Persistence adapters for the marriage repository port.
//!
//! - `SqliteMarriageRepo` - production storage
//! - `InMemoryMarriageRepo` - tests and throwaway servers
//! - `SqliteLegacyConverter` - upgrades databases written by older releases

mod connection;
mod legacy_converter;
mod memory_marriage_repo;
mod sqlite_marriage_repo;

pub use connection::{connect, SCHEMA_VERSION};
pub use legacy_converter::{NoopLegacyConverter, SqliteLegacyConverter};
pub use memory_marriage_repo::InMemoryMarriageRepo;
pub use sqlite_marriage_repo::SqliteMarriageRepo;
