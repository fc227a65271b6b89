//! Repository port for marriage storage.

use async_trait::async_trait;
use marriage_domain::{Couple, Marriage, MarriageList, MarriagePlayer, PlayerId};

use super::error::RepoError;

/// Durable storage for players and marriages.
///
/// Every write is an idempotent upsert or delete, so replaying a write or
/// applying two writes out of order leaves the store consistent: the last
/// write to reach storage wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarriageRepo: Send + Sync {
    /// Load a player with every marriage that involves them.
    ///
    /// A player with no stored row comes back as a fresh `MarriagePlayer`;
    /// "not found" is never an error.
    async fn load_player(&self, id: PlayerId) -> Result<MarriagePlayer, RepoError>;

    /// Upsert the player's own row. Marriages are written separately.
    async fn save_player(&self, player: &MarriagePlayer) -> Result<(), RepoError>;

    /// Upsert keyed by the couple.
    async fn save_marriage(&self, marriage: &Marriage) -> Result<(), RepoError>;

    /// Delete the couple's marriage. Deleting an absent marriage succeeds.
    async fn delete_marriage(&self, couple: Couple) -> Result<(), RepoError>;

    /// At most `scale` marriages starting at `scale * page`, oldest first.
    async fn list_marriages(&self, scale: u32, page: u32) -> Result<MarriageList, RepoError>;

    /// Release the backing store at shutdown. Calls made afterwards fail.
    async fn close(&self) {}
}
