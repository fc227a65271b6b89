//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Marriage storage (SQLite or in-memory)
//! - Marry-intent listeners and the legacy data gate
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;

pub use error::RepoError;
pub use external::{LegacyConverter, MarriageListener, Verdict};
pub use repos::MarriageRepo;
pub use testing::ClockPort;

#[cfg(test)]
pub use external::{MockLegacyConverter, MockMarriageListener};
#[cfg(test)]
pub use repos::MockMarriageRepo;
#[cfg(test)]
pub use testing::MockClockPort;
