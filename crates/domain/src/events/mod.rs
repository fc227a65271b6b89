//! Domain Events
//!
//! Events raised before a state change so listeners can veto it.

mod marriage_events;

pub use marriage_events::MarryIntent;
