//! Unordered pair of players.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DomainError, PlayerId};

/// Two distinct players, stored in normalized order.
///
/// `Couple::new(a, b)` and `Couple::new(b, a)` compare, hash and persist
/// identically, so every lookup keyed by a couple is symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Couple {
    first: PlayerId,
    second: PlayerId,
}

impl Couple {
    pub fn new(a: PlayerId, b: PlayerId) -> Result<Self, DomainError> {
        if a == b {
            return Err(DomainError::validation(format!(
                "player {} cannot marry themself",
                a
            )));
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { first, second })
    }

    /// The lower of the two ids.
    pub fn first(&self) -> PlayerId {
        self.first
    }

    /// The higher of the two ids.
    pub fn second(&self) -> PlayerId {
        self.second
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.first == player || self.second == player
    }

    /// The other member of the couple, if `player` belongs to it.
    pub fn other(&self, player: PlayerId) -> Option<PlayerId> {
        if player == self.first {
            Some(self.second)
        } else if player == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

impl fmt::Display for Couple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.first, self.second)
    }
}
