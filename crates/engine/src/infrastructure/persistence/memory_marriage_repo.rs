//! In-memory marriage storage for tests and throwaway servers.
//!
//! Shares an `Arc` between two `App`s to simulate a restart without a disk.

use std::collections::HashMap;

use async_trait::async_trait;
use marriage_domain::{Couple, Gender, Marriage, MarriageList, MarriagePlayer, PlayerId};
use tokio::sync::RwLock;

use crate::infrastructure::ports::{MarriageRepo, RepoError};

#[derive(Debug, Clone)]
struct StoredProfile {
    gender: Gender,
    last_name: Option<String>,
}

#[derive(Default)]
struct State {
    players: HashMap<PlayerId, StoredProfile>,
    /// Creation order; upserts replace in place.
    marriages: Vec<Marriage>,
}

/// In-memory repository with the same upsert semantics as SQLite.
#[derive(Default)]
pub struct InMemoryMarriageRepo {
    state: RwLock<State>,
}

impl InMemoryMarriageRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored marriages (tests only).
    #[cfg(test)]
    pub async fn marriage_count(&self) -> usize {
        self.state.read().await.marriages.len()
    }

    /// Number of stored player rows (tests only).
    #[cfg(test)]
    pub async fn player_count(&self) -> usize {
        self.state.read().await.players.len()
    }
}

#[async_trait]
impl MarriageRepo for InMemoryMarriageRepo {
    async fn load_player(&self, id: PlayerId) -> Result<MarriagePlayer, RepoError> {
        let state = self.state.read().await;
        let mut player = MarriagePlayer::new(id);
        if let Some(profile) = state.players.get(&id) {
            player.set_gender(profile.gender);
            player.set_last_name(profile.last_name.clone());
        }
        let marriages = state
            .marriages
            .iter()
            .filter(|m| m.involves(id))
            .cloned()
            .collect();
        Ok(player.with_marriages(marriages))
    }

    async fn save_player(&self, player: &MarriagePlayer) -> Result<(), RepoError> {
        let profile = StoredProfile {
            gender: player.gender(),
            last_name: player.last_name().map(str::to_string),
        };
        self.state.write().await.players.insert(player.id(), profile);
        Ok(())
    }

    async fn save_marriage(&self, marriage: &Marriage) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        match state
            .marriages
            .iter_mut()
            .find(|m| m.couple() == marriage.couple())
        {
            Some(existing) => *existing = marriage.clone(),
            None => state.marriages.push(marriage.clone()),
        }
        Ok(())
    }

    async fn delete_marriage(&self, couple: Couple) -> Result<(), RepoError> {
        self.state
            .write()
            .await
            .marriages
            .retain(|m| m.couple() != couple);
        Ok(())
    }

    async fn list_marriages(&self, scale: u32, page: u32) -> Result<MarriageList, RepoError> {
        let state = self.state.read().await;
        let offset = usize::try_from(u64::from(scale) * u64::from(page)).unwrap_or(usize::MAX);
        let marriages = state
            .marriages
            .iter()
            .skip(offset)
            .take(scale as usize)
            .cloned()
            .collect();
        Ok(MarriageList {
            scale,
            page,
            total: state.marriages.len() as u64,
            marriages,
        })
    }
}
