//! A marriage between two players.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Couple, PlayerId};

/// One marriage. Its couple and priest are fixed at creation; a marriage
/// is only ever replaced or deleted, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marriage {
    couple: Couple,
    priest: Option<PlayerId>,
    married_at: DateTime<Utc>,
}

impl Marriage {
    pub fn new(couple: Couple, priest: Option<PlayerId>, married_at: DateTime<Utc>) -> Self {
        Self {
            couple,
            priest,
            married_at,
        }
    }

    pub fn couple(&self) -> Couple {
        self.couple
    }

    pub fn player1(&self) -> PlayerId {
        self.couple.first()
    }

    pub fn player2(&self) -> PlayerId {
        self.couple.second()
    }

    /// The player who officiated, if the couple was married by a priest.
    pub fn priest(&self) -> Option<PlayerId> {
        self.priest
    }

    pub fn married_at(&self) -> DateTime<Utc> {
        self.married_at
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.couple.contains(player)
    }

    pub fn partner_of(&self, player: PlayerId) -> Option<PlayerId> {
        self.couple.other(player)
    }
}
