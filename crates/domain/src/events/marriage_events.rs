use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// Raised before two players are married. Listeners may veto it; nothing
/// has been cached or persisted when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarryIntent {
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub priest: Option<PlayerId>,
}

impl MarryIntent {
    pub fn new(player1: PlayerId, player2: PlayerId, priest: Option<PlayerId>) -> Self {
        Self {
            player1,
            player2,
            priest,
        }
    }
}
