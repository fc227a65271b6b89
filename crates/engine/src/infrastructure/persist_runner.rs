//! Fire-and-forget persistence.
//!
//! Callers hand over a [`PersistTask`] and return immediately; the write
//! happens on a Tokio task. Nothing is reported back: failures are logged
//! and counted here.
//!
//! Tasks sharing an [`OrderingKey`] run one after another in the order they
//! were scheduled (each waits for its predecessor's completion signal).
//! Tasks with different keys run concurrently, bounded by a semaphore.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use marriage_domain::{Couple, Marriage, MarriagePlayer, PlayerId};
use tokio::sync::{oneshot, Mutex, Semaphore};
use tokio_util::task::TaskTracker;

use crate::infrastructure::ports::{MarriageRepo, RepoError};

/// Default number of writes allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT_WRITES: usize = 8;

/// A unit of durable work.
#[derive(Debug, Clone)]
pub enum PersistTask {
    SavePlayer(MarriagePlayer),
    SaveMarriage(Marriage),
    DeleteMarriage(Couple),
}

/// Tasks with equal keys are applied in scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderingKey {
    Player(PlayerId),
    Couple(Couple),
}

impl fmt::Display for OrderingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(id) => write!(f, "player:{}", id),
            Self::Couple(couple) => write!(f, "couple:{}", couple),
        }
    }
}

impl PersistTask {
    pub fn ordering_key(&self) -> OrderingKey {
        match self {
            Self::SavePlayer(player) => OrderingKey::Player(player.id()),
            Self::SaveMarriage(marriage) => OrderingKey::Couple(marriage.couple()),
            Self::DeleteMarriage(couple) => OrderingKey::Couple(*couple),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SavePlayer(_) => "save_player",
            Self::SaveMarriage(_) => "save_marriage",
            Self::DeleteMarriage(_) => "delete_marriage",
        }
    }

    async fn apply(&self, repo: &dyn MarriageRepo) -> Result<(), RepoError> {
        match self {
            Self::SavePlayer(player) => repo.save_player(player).await,
            Self::SaveMarriage(marriage) => repo.save_marriage(marriage).await,
            Self::DeleteMarriage(couple) => repo.delete_marriage(*couple).await,
        }
    }
}

/// Last scheduled task for a key: its sequence number and completion signal.
type Tail = (u64, oneshot::Receiver<()>);

/// Background executor for persistence writes.
pub struct PersistenceRunner {
    repo: Arc<dyn MarriageRepo>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    /// Serializes `flush`; a reopen racing another flush's close would
    /// leave that flush waiting forever.
    flush_lock: Mutex<()>,
    tails: Arc<DashMap<OrderingKey, Tail>>,
    next_seq: AtomicU64,
    failed: Arc<AtomicU64>,
}

impl PersistenceRunner {
    pub fn new(repo: Arc<dyn MarriageRepo>, max_concurrent_writes: usize) -> Self {
        Self {
            repo,
            permits: Arc::new(Semaphore::new(max_concurrent_writes.max(1))),
            tracker: TaskTracker::new(),
            flush_lock: Mutex::new(()),
            tails: Arc::new(DashMap::new()),
            next_seq: AtomicU64::new(0),
            failed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedule `task` and return immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run(&self, task: PersistTask) {
        let key = task.ordering_key();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = oneshot::channel();

        // Swap ourselves in as the tail before spawning so the next task for
        // this key is guaranteed to wait on us.
        let previous = self.tails.insert(key, (seq, done_rx));

        let repo = self.repo.clone();
        let permits = self.permits.clone();
        let tails = self.tails.clone();
        let failed = self.failed.clone();

        self.tracker.spawn(async move {
            if let Some((_, predecessor)) = previous {
                // Err just means the predecessor's task went away; go ahead
                let _ = predecessor.await;
            }

            match permits.acquire_owned().await {
                Ok(_permit) => {
                    tracing::debug!(task = task.name(), key = %key, "Running persistence task");
                    if let Err(e) = task.apply(repo.as_ref()).await {
                        failed.fetch_add(1, Ordering::Relaxed);
                        tracing::error!(
                            task = task.name(),
                            key = %key,
                            error = %e,
                            "Persistence task failed"
                        );
                    }
                }
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(task = task.name(), key = %key, "Semaphore error: {}", e);
                }
            }

            let _ = done_tx.send(());
            tails.remove_if(&key, |_, (tail_seq, _)| *tail_seq == seq);
        });
    }

    /// Wait for every task scheduled so far to finish.
    ///
    /// Safe to call from several places at once; flushes take turns.
    pub async fn flush(&self) {
        let _guard = self.flush_lock.lock().await;
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Tasks scheduled but not yet finished.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Tasks that failed since startup.
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::InMemoryMarriageRepo;
    use crate::infrastructure::ports::MockMarriageRepo;
    use async_trait::async_trait;
    use chrono::Utc;
    use marriage_domain::MarriageList;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Wraps the in-memory repo, holding marriage saves until released.
    struct GatedRepo {
        inner: InMemoryMarriageRepo,
        gate: Notify,
        held: AtomicUsize,
    }

    impl GatedRepo {
        fn new() -> Self {
            Self {
                inner: InMemoryMarriageRepo::new(),
                gate: Notify::new(),
                held: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarriageRepo for GatedRepo {
        async fn load_player(&self, id: PlayerId) -> Result<MarriagePlayer, RepoError> {
            self.inner.load_player(id).await
        }

        async fn save_player(&self, player: &MarriagePlayer) -> Result<(), RepoError> {
            self.inner.save_player(player).await
        }

        async fn save_marriage(&self, marriage: &Marriage) -> Result<(), RepoError> {
            self.held.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.inner.save_marriage(marriage).await
        }

        async fn delete_marriage(&self, couple: Couple) -> Result<(), RepoError> {
            self.inner.delete_marriage(couple).await
        }

        async fn list_marriages(&self, scale: u32, page: u32) -> Result<MarriageList, RepoError> {
            self.inner.list_marriages(scale, page).await
        }
    }

    /// Records the peak number of concurrent saves.
    struct CountingRepo {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MarriageRepo for CountingRepo {
        async fn load_player(&self, id: PlayerId) -> Result<MarriagePlayer, RepoError> {
            Ok(MarriagePlayer::new(id))
        }

        async fn save_player(&self, _player: &MarriagePlayer) -> Result<(), RepoError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        async fn save_marriage(&self, _marriage: &Marriage) -> Result<(), RepoError> {
            Ok(())
        }

        async fn delete_marriage(&self, _couple: Couple) -> Result<(), RepoError> {
            Ok(())
        }

        async fn list_marriages(&self, scale: u32, page: u32) -> Result<MarriageList, RepoError> {
            Ok(MarriageList {
                scale,
                page,
                ..Default::default()
            })
        }
    }

    fn marriage(couple: Couple) -> Marriage {
        Marriage::new(couple, None, Utc::now())
    }

    async fn wait_until_held(repo: &GatedRepo, count: usize) {
        while repo.held.load(Ordering::SeqCst) < count {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn run_returns_before_the_write_lands() {
        let repo = Arc::new(GatedRepo::new());
        let runner = PersistenceRunner::new(repo.clone(), 4);
        let couple = Couple::new(PlayerId::new(), PlayerId::new()).unwrap();

        runner.run(PersistTask::SaveMarriage(marriage(couple)));

        assert_eq!(runner.pending(), 1);
        wait_until_held(&repo, 1).await;
        assert_eq!(repo.inner.marriage_count().await, 0);

        repo.gate.notify_one();
        runner.flush().await;
        assert_eq!(repo.inner.marriage_count().await, 1);
        assert_eq!(runner.pending(), 0);
    }

    #[tokio::test]
    async fn same_couple_applies_in_schedule_order() {
        let repo = Arc::new(GatedRepo::new());
        let runner = PersistenceRunner::new(repo.clone(), 4);
        let couple = Couple::new(PlayerId::new(), PlayerId::new()).unwrap();

        // The save is held at the gate; the delete must not overtake it
        runner.run(PersistTask::SaveMarriage(marriage(couple)));
        runner.run(PersistTask::DeleteMarriage(couple));
        wait_until_held(&repo, 1).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(runner.pending(), 2);

        repo.gate.notify_one();
        runner.flush().await;

        assert_eq!(repo.inner.marriage_count().await, 0);
    }

    #[tokio::test]
    async fn different_keys_do_not_wait_for_each_other() {
        let repo = Arc::new(GatedRepo::new());
        let runner = PersistenceRunner::new(repo.clone(), 4);
        let held = Couple::new(PlayerId::new(), PlayerId::new()).unwrap();
        let other = Couple::new(PlayerId::new(), PlayerId::new()).unwrap();
        repo.inner.save_marriage(&marriage(other)).await.unwrap();

        runner.run(PersistTask::SaveMarriage(marriage(held)));
        runner.run(PersistTask::DeleteMarriage(other));
        wait_until_held(&repo, 1).await;
        while runner.pending() > 1 {
            tokio::task::yield_now().await;
        }

        assert_eq!(repo.inner.marriage_count().await, 0);
        repo.gate.notify_one();
        runner.flush().await;
        assert_eq!(repo.inner.marriage_count().await, 1);
    }

    #[tokio::test]
    async fn failures_are_counted_not_propagated() {
        let mut repo = MockMarriageRepo::new();
        repo.expect_save_player()
            .times(2)
            .returning(|_| Err(RepoError::database("save_player", "disk full")));
        let runner = PersistenceRunner::new(Arc::new(repo), 2);
        let player = MarriagePlayer::new(PlayerId::new());

        runner.run(PersistTask::SavePlayer(player.clone()));
        runner.run(PersistTask::SavePlayer(player));
        runner.flush().await;

        assert_eq!(runner.failed_count(), 2);
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let repo = Arc::new(CountingRepo {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let runner = PersistenceRunner::new(repo.clone(), 2);

        for _ in 0..10 {
            runner.run(PersistTask::SavePlayer(MarriagePlayer::new(PlayerId::new())));
        }
        runner.flush().await;

        let peak = repo.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 2, "peak was {}", peak);
    }

    #[tokio::test]
    async fn tails_are_cleaned_up() {
        let runner = PersistenceRunner::new(Arc::new(InMemoryMarriageRepo::new()), 2);
        let player = MarriagePlayer::new(PlayerId::new());

        runner.run(PersistTask::SavePlayer(player.clone()));
        runner.run(PersistTask::SavePlayer(player));
        runner.flush().await;

        assert!(runner.tails.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_flushes_all_return() {
        let repo = Arc::new(GatedRepo::new());
        let runner = Arc::new(PersistenceRunner::new(repo.clone(), 4));
        let couple = Couple::new(PlayerId::new(), PlayerId::new()).unwrap();
        runner.run(PersistTask::SaveMarriage(marriage(couple)));
        wait_until_held(&repo, 1).await;

        let flushes: Vec<_> = (0..3)
            .map(|_| {
                let runner = runner.clone();
                tokio::spawn(async move { runner.flush().await })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(10)).await;
        repo.gate.notify_one();

        for flush in flushes {
            tokio::time::timeout(Duration::from_secs(5), flush)
                .await
                .unwrap()
                .unwrap();
        }

        // The tracker is open again for later writes
        runner.run(PersistTask::DeleteMarriage(couple));
        tokio::time::timeout(Duration::from_secs(5), runner.flush())
            .await
            .unwrap();
        assert_eq!(repo.inner.marriage_count().await, 0);
    }
}
