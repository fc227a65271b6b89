//! Use cases - User story orchestration.
//!
//! Use cases orchestrate the player store, the persistence runner and the
//! listener bus to fulfill requests from commands and game events.

pub mod marriage;

pub use marriage::MarriageUseCases;
