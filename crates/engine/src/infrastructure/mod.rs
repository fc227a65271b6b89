//! Infrastructure implementations.
//!
//! Ports for storage, listeners and time, their adapters, and the background
//! runner that applies writes off the caller's path.

pub mod clock;
pub mod event_bus;
pub mod persist_runner;
pub mod persistence;
pub mod ports;
