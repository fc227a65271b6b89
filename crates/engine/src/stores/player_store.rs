//! Cache of loaded players.
//!
//! The only place a `MarriagePlayer` lives while its owner is online. Anything
//! that mutates a player's marriages goes through [`PlayerStore::get`] so there
//! is exactly one in-memory copy per player.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use marriage_domain::{MarriagePlayer, PlayerId};
use tokio::sync::RwLock;

use crate::infrastructure::persist_runner::{PersistTask, PersistenceRunner};
use crate::infrastructure::ports::{MarriageRepo, RepoError};

/// Handle to a cached player. Clones point at the same record.
pub type SharedPlayer = Arc<RwLock<MarriagePlayer>>;

pub struct PlayerStore {
    players: DashMap<PlayerId, SharedPlayer>,
    repo: Arc<dyn MarriageRepo>,
    runner: Arc<PersistenceRunner>,
}

impl PlayerStore {
    pub fn new(repo: Arc<dyn MarriageRepo>, runner: Arc<PersistenceRunner>) -> Self {
        Self {
            players: DashMap::new(),
            repo,
            runner,
        }
    }

    /// The cached player, loading and caching it on a miss.
    ///
    /// Two callers missing on the same id at once may both load, but only
    /// the first record to land in the cache is kept and both get it back.
    pub async fn get(&self, id: PlayerId) -> Result<SharedPlayer, RepoError> {
        if let Some(player) = self.players.get(&id) {
            return Ok(player.clone());
        }

        tracing::debug!(player_id = %id, "Player cache miss, loading");
        let loaded = self.repo.load_player(id).await?;

        let player = match self.players.entry(id) {
            Entry::Occupied(existing) => {
                tracing::debug!(player_id = %id, "Player loaded concurrently, keeping cached copy");
                existing.get().clone()
            }
            Entry::Vacant(slot) => slot.insert(Arc::new(RwLock::new(loaded))).clone(),
        };
        Ok(player)
    }

    /// The cached player without touching storage.
    pub fn peek(&self, id: PlayerId) -> Option<SharedPlayer> {
        self.players.get(&id).map(|player| player.clone())
    }

    /// Cache a player built elsewhere, replacing any cached copy.
    pub fn put(&self, player: MarriagePlayer) -> SharedPlayer {
        let id = player.id();
        let shared = Arc::new(RwLock::new(player));
        self.players.insert(id, shared.clone());
        shared
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Warm the cache for players already online when the server starts.
    pub async fn preload(&self, ids: &[PlayerId]) -> Result<usize, RepoError> {
        for id in ids {
            self.get(*id).await?;
        }
        tracing::info!(count = ids.len(), "Preloaded players");
        Ok(ids.len())
    }

    /// Drop the player from the cache and schedule a background save of its
    /// last state. Returns `false` if the player wasn't cached.
    pub async fn unload(&self, id: PlayerId) -> bool {
        let Some((_, player)) = self.players.remove(&id) else {
            return false;
        };
        let snapshot = player.read().await.clone();
        self.runner.run(PersistTask::SavePlayer(snapshot));
        tracing::debug!(player_id = %id, "Player unloaded");
        true
    }

    /// Save every cached player in place and empty the cache.
    ///
    /// Used at shutdown: the saves are awaited here rather than handed to the
    /// runner. Writes already queued on the runner land first, so a stale
    /// save from an earlier `unload` cannot overwrite what is saved here.
    /// A failed save is logged and the rest still go through.
    /// Returns the number of players saved.
    pub async fn unload_all(&self) -> usize {
        self.runner.flush().await;

        let ids: Vec<PlayerId> = self.players.iter().map(|entry| *entry.key()).collect();
        let mut saved = 0;

        for id in ids {
            let Some((_, player)) = self.players.remove(&id) else {
                continue;
            };
            let snapshot = player.read().await.clone();
            match self.repo.save_player(&snapshot).await {
                Ok(()) => saved += 1,
                Err(e) => tracing::error!(player_id = %id, error = %e, "Failed to save player on unload"),
            }
        }

        tracing::info!(saved, "Unloaded all players");
        saved
    }
}
