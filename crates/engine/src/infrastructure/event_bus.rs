//! Synchronous veto bus for marriage intents.

use std::sync::Arc;

use marriage_domain::MarryIntent;

use crate::infrastructure::ports::{MarriageListener, Verdict};

/// Explicit list of listeners consulted before every marriage.
///
/// Listeners are registered at startup and called in registration order.
/// Every listener sees every intent, even after an earlier veto.
#[derive(Default)]
pub struct MarriageEventBus {
    listeners: Vec<Arc<dyn MarriageListener>>,
}

impl MarriageEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Arc<dyn MarriageListener>) {
        self.listeners.push(listener);
    }

    pub fn with_listener(mut self, listener: Arc<dyn MarriageListener>) -> Self {
        self.register(listener);
        self
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if any listener vetoed the intent.
    pub fn publish(&self, intent: &MarryIntent) -> bool {
        let mut cancelled = false;
        for (idx, listener) in self.listeners.iter().enumerate() {
            if listener.on_marry(intent) == Verdict::Veto {
                tracing::debug!(
                    listener = idx,
                    player1 = %intent.player1,
                    player2 = %intent.player2,
                    "Marry intent vetoed"
                );
                cancelled = true;
            }
        }
        cancelled
    }
}
