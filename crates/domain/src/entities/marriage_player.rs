//! Per-player marriage state.

use serde::{Deserialize, Serialize};

use crate::{Couple, Gender, Marriage, PlayerId};

/// Everything the server keeps about one player's marriages.
///
/// The `marriages` list is rebuilt from the marriage table on every load,
/// so the player row never stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarriagePlayer {
    id: PlayerId,
    gender: Gender,
    last_name: Option<String>,
    marriages: Vec<Marriage>,
}

impl MarriagePlayer {
    /// A player seen for the first time.
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            gender: Gender::Unspecified,
            last_name: None,
            marriages: Vec::new(),
        }
    }

    // =========================================================================
    // Builder-style methods
    // =========================================================================

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_marriages(mut self, marriages: Vec<Marriage>) -> Self {
        for marriage in marriages {
            self.add_marriage(marriage);
        }
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn marriages(&self) -> &[Marriage] {
        &self.marriages
    }

    pub fn is_married(&self) -> bool {
        !self.marriages.is_empty()
    }

    pub fn is_married_to(&self, other: PlayerId) -> bool {
        self.marriage_with(other).is_some()
    }

    pub fn marriage_with(&self, other: PlayerId) -> Option<&Marriage> {
        self.marriages
            .iter()
            .find(|m| m.partner_of(self.id) == Some(other))
    }

    pub fn partners(&self) -> Vec<PlayerId> {
        self.marriages
            .iter()
            .filter_map(|m| m.partner_of(self.id))
            .collect()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn set_gender(&mut self, gender: Gender) {
        self.gender = gender;
    }

    pub fn set_last_name(&mut self, last_name: Option<String>) {
        self.last_name = last_name;
    }

    /// Link a marriage. A marriage for the same couple replaces the old
    /// one, so the list never holds the pair twice.
    ///
    /// Marriages that don't involve this player are ignored.
    pub fn add_marriage(&mut self, marriage: Marriage) {
        if !marriage.involves(self.id) {
            return;
        }
        match self
            .marriages
            .iter_mut()
            .find(|m| m.couple() == marriage.couple())
        {
            Some(existing) => *existing = marriage,
            None => self.marriages.push(marriage),
        }
    }

    pub fn remove_marriage(&mut self, couple: Couple) -> Option<Marriage> {
        let idx = self.marriages.iter().position(|m| m.couple() == couple)?;
        Some(self.marriages.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn marriage(a: PlayerId, b: PlayerId) -> Marriage {
        Marriage::new(Couple::new(a, b).unwrap(), None, Utc::now())
    }

    #[test]
    fn new_player_is_unmarried() {
        let player = MarriagePlayer::new(PlayerId::new());
        assert!(!player.is_married());
        assert!(player.partners().is_empty());
        assert_eq!(player.gender(), Gender::Unspecified);
        assert_eq!(player.last_name(), None);
    }

    #[test]
    fn adding_same_couple_twice_keeps_one() {
        let (a, b) = (PlayerId::new(), PlayerId::new());
        let mut player = MarriagePlayer::new(a);
        player.add_marriage(marriage(a, b));
        player.add_marriage(marriage(b, a));
        assert_eq!(player.marriages().len(), 1);
        assert!(player.is_married_to(b));
    }

    #[test]
    fn foreign_marriage_is_ignored() {
        let mut player = MarriagePlayer::new(PlayerId::new());
        player.add_marriage(marriage(PlayerId::new(), PlayerId::new()));
        assert!(!player.is_married());
    }

    #[test]
    fn remove_uses_normalized_couple() {
        let (a, b, c) = (PlayerId::new(), PlayerId::new(), PlayerId::new());
        let mut player = MarriagePlayer::new(a).with_marriages(vec![marriage(a, b), marriage(a, c)]);

        let removed = player.remove_marriage(Couple::new(b, a).unwrap());

        assert!(removed.is_some());
        assert_eq!(player.partners(), vec![c]);
        assert!(player.remove_marriage(Couple::new(a, b).unwrap()).is_none());
    }
}
