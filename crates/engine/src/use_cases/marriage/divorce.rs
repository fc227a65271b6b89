//! Divorce use case.

use std::sync::Arc;

use marriage_domain::{Couple, PlayerId};

use crate::infrastructure::persist_runner::{PersistTask, PersistenceRunner};
use crate::stores::PlayerStore;

use super::MarriageError;

/// Divorce use case.
///
/// Schedules the durable delete, then unlinks the marriage from whichever
/// partners are currently cached. Uncached partners pick up the change
/// from storage on their next load.
pub struct Divorce {
    players: Arc<PlayerStore>,
    runner: Arc<PersistenceRunner>,
}

impl Divorce {
    pub fn new(players: Arc<PlayerStore>, runner: Arc<PersistenceRunner>) -> Self {
        Self { players, runner }
    }

    /// Argument order does not matter. Returns whether any cached partner
    /// held the marriage; divorcing an unmarried couple is not an error.
    pub async fn execute(&self, a: PlayerId, b: PlayerId) -> Result<bool, MarriageError> {
        let couple = Couple::new(a, b)?;
        self.runner.run(PersistTask::DeleteMarriage(couple));

        let mut unlinked = false;
        for id in [couple.first(), couple.second()] {
            if let Some(player) = self.players.peek(id) {
                unlinked |= player.write().await.remove_marriage(couple).is_some();
            }
        }

        tracing::info!(player1 = %a, player2 = %b, unlinked, "Players divorced");
        Ok(unlinked)
    }
}
