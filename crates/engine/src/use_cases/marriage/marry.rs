//! Marry use case.
//!
//! Listeners get a veto first; only an approved marriage is persisted and
//! linked into both partners' cached records.

use std::sync::Arc;

use marriage_domain::{Couple, Marriage, MarryIntent, PlayerId};

use crate::infrastructure::event_bus::MarriageEventBus;
use crate::infrastructure::persist_runner::{PersistTask, PersistenceRunner};
use crate::infrastructure::ports::ClockPort;
use crate::stores::SharedPlayer;

use super::MarriageError;

/// Result of a marry request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarryOutcome {
    Married(Marriage),
    /// A listener vetoed the marriage. Nothing was cached or scheduled.
    Declined,
}

impl MarryOutcome {
    pub fn marriage(&self) -> Option<&Marriage> {
        match self {
            Self::Married(marriage) => Some(marriage),
            Self::Declined => None,
        }
    }

    pub fn is_declined(&self) -> bool {
        matches!(self, Self::Declined)
    }
}

/// Marry use case.
///
/// Orchestrates: veto check, marriage creation, background save, linking.
pub struct Marry {
    bus: Arc<MarriageEventBus>,
    runner: Arc<PersistenceRunner>,
    clock: Arc<dyn ClockPort>,
}

impl Marry {
    pub fn new(
        bus: Arc<MarriageEventBus>,
        runner: Arc<PersistenceRunner>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self { bus, runner, clock }
    }

    /// Marry two cached players, optionally in front of a priest.
    ///
    /// Both handles come from `PlayerStore::get`, so both partners are
    /// loaded by construction. Marrying a couple that is already married
    /// replaces their marriage rather than adding a second one.
    ///
    /// # Returns
    /// * `Ok(MarryOutcome::Married)` - Marriage created, save scheduled
    /// * `Ok(MarryOutcome::Declined)` - A listener vetoed it
    /// * `Err(MarriageError::Validation)` - Both handles are the same player
    pub async fn execute(
        &self,
        player1: &SharedPlayer,
        player2: &SharedPlayer,
        priest: Option<PlayerId>,
    ) -> Result<MarryOutcome, MarriageError> {
        let id1 = player1.read().await.id();
        let id2 = player2.read().await.id();
        let couple = Couple::new(id1, id2)?;

        let intent = MarryIntent::new(id1, id2, priest);
        if self.bus.publish(&intent) {
            tracing::info!(player1 = %id1, player2 = %id2, "Marriage declined by listener");
            return Ok(MarryOutcome::Declined);
        }

        let marriage = Marriage::new(couple, priest, self.clock.now());
        self.runner.run(PersistTask::SaveMarriage(marriage.clone()));

        player1.write().await.add_marriage(marriage.clone());
        player2.write().await.add_marriage(marriage.clone());

        tracing::info!(
            player1 = %id1,
            player2 = %id2,
            priest = ?priest,
            "Players married"
        );

        Ok(MarryOutcome::Married(marriage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::persistence::InMemoryMarriageRepo;
    use crate::infrastructure::ports::{
        MarriageListener, MarriageRepo, MockMarriageListener, MockMarriageRepo, Verdict,
    };
    use chrono::{TimeZone, Utc};
    use marriage_domain::{DomainError, MarriagePlayer};
    use tokio::sync::RwLock;

    fn shared(player: MarriagePlayer) -> SharedPlayer {
        Arc::new(RwLock::new(player))
    }

    fn listener(verdict: Verdict) -> Arc<dyn MarriageListener> {
        let mut mock = MockMarriageListener::new();
        mock.expect_on_marry().return_const(verdict);
        Arc::new(mock)
    }

    fn use_case(bus: MarriageEventBus, repo: Arc<dyn MarriageRepo>) -> (Marry, Arc<PersistenceRunner>) {
        let runner = Arc::new(PersistenceRunner::new(repo, 4));
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 2, 14, 18, 0, 0).unwrap()));
        (Marry::new(Arc::new(bus), runner.clone(), clock), runner)
    }

    #[tokio::test]
    async fn when_approved_links_both_and_persists() {
        let repo = Arc::new(InMemoryMarriageRepo::new());
        let (marry, runner) = use_case(MarriageEventBus::new(), repo.clone());
        let (a, b, priest) = (PlayerId::new(), PlayerId::new(), PlayerId::new());
        let (pa, pb) = (shared(MarriagePlayer::new(a)), shared(MarriagePlayer::new(b)));

        let outcome = marry.execute(&pa, &pb, Some(priest)).await.unwrap();

        let marriage = outcome.marriage().cloned().unwrap();
        assert_eq!(marriage.priest(), Some(priest));
        assert_eq!(marriage.married_at(), Utc.with_ymd_and_hms(2024, 2, 14, 18, 0, 0).unwrap());
        assert!(pa.read().await.is_married_to(b));
        assert!(pb.read().await.is_married_to(a));

        runner.flush().await;
        let stored = repo.list_marriages(10, 0).await.unwrap();
        assert_eq!(stored.marriages, vec![marriage]);
    }

    #[tokio::test]
    async fn when_vetoed_nothing_changes() {
        // The mock has no expectations: any storage call would panic the task
        let repo = Arc::new(MockMarriageRepo::new());
        let bus = MarriageEventBus::new().with_listener(listener(Verdict::Veto));
        let (marry, runner) = use_case(bus, repo);
        let (pa, pb) = (
            shared(MarriagePlayer::new(PlayerId::new())),
            shared(MarriagePlayer::new(PlayerId::new())),
        );

        let outcome = marry.execute(&pa, &pb, None).await.unwrap();

        assert!(outcome.is_declined());
        assert!(!pa.read().await.is_married());
        assert!(!pb.read().await.is_married());
        assert_eq!(runner.pending(), 0);
        runner.flush().await;
        assert_eq!(runner.failed_count(), 0);
    }

    #[tokio::test]
    async fn when_same_player_twice_returns_validation_error() {
        let repo = Arc::new(MockMarriageRepo::new());
        let (marry, runner) = use_case(MarriageEventBus::new(), repo);
        let player = shared(MarriagePlayer::new(PlayerId::new()));

        let result = marry.execute(&player, &player, None).await;

        assert!(matches!(
            result,
            Err(MarriageError::Validation(DomainError::Validation(_)))
        ));
        assert_eq!(runner.pending(), 0);
    }

    #[tokio::test]
    async fn when_married_twice_keeps_one_record() {
        let repo = Arc::new(InMemoryMarriageRepo::new());
        let (marry, runner) = use_case(MarriageEventBus::new(), repo.clone());
        let (pa, pb) = (
            shared(MarriagePlayer::new(PlayerId::new())),
            shared(MarriagePlayer::new(PlayerId::new())),
        );

        let (first, second) = tokio::join!(
            marry.execute(&pa, &pb, None),
            marry.execute(&pb, &pa, None)
        );
        assert!(first.is_ok() && second.is_ok());
        runner.flush().await;

        assert_eq!(repo.marriage_count().await, 1);
        assert_eq!(pa.read().await.marriages().len(), 1);
        assert_eq!(pb.read().await.marriages().len(), 1);
    }

    #[tokio::test]
    async fn when_allowed_by_all_listeners_marries() {
        let repo = Arc::new(InMemoryMarriageRepo::new());
        let bus = MarriageEventBus::new()
            .with_listener(listener(Verdict::Allow))
            .with_listener(listener(Verdict::Allow));
        let (marry, _runner) = use_case(bus, repo);
        let (pa, pb) = (
            shared(MarriagePlayer::new(PlayerId::new())),
            shared(MarriagePlayer::new(PlayerId::new())),
        );

        let outcome = marry.execute(&pa, &pb, None).await.unwrap();

        assert!(!outcome.is_declined());
    }
}
