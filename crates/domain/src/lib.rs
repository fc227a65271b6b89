//! Marriage domain types.
//!
//! Pure data and invariants: no I/O, no async. The engine crate owns
//! caching and persistence.

extern crate self as marriage_domain;

pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod value_objects;

pub use entities::{Marriage, MarriageList, MarriagePlayer};
pub use error::DomainError;
pub use events::MarryIntent;
pub use ids::PlayerId;
pub use value_objects::{Couple, Gender};
