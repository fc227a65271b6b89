//! Application state and composition.

use std::sync::Arc;

use crate::config::{EngineConfig, StorageBackend};
use crate::infrastructure::{
    clock::SystemClock,
    event_bus::MarriageEventBus,
    persist_runner::PersistenceRunner,
    persistence::{
        connect, InMemoryMarriageRepo, NoopLegacyConverter, SqliteLegacyConverter,
        SqliteMarriageRepo,
    },
    ports::{ClockPort, LegacyConverter, MarriageRepo, RepoError},
};
use crate::stores::PlayerStore;
use crate::use_cases;

/// Main application state.
///
/// Owns the player cache, the persistence runner and every use case.
/// Build it with [`App::start`] and tear it down with [`App::shutdown`].
pub struct App {
    pub players: Arc<PlayerStore>,
    pub use_cases: UseCases,
    runner: Arc<PersistenceRunner>,
    repo: Arc<dyn MarriageRepo>,
}

/// Container for all use cases.
pub struct UseCases {
    pub marriage: use_cases::MarriageUseCases,
}

impl App {
    /// Wire an app around an already prepared repository.
    ///
    /// Skips the legacy gate and preloading; [`App::start`] does both.
    pub fn new(
        repo: Arc<dyn MarriageRepo>,
        bus: MarriageEventBus,
        clock: Arc<dyn ClockPort>,
        max_concurrent_writes: usize,
    ) -> Self {
        let runner = Arc::new(PersistenceRunner::new(repo.clone(), max_concurrent_writes));
        let players = Arc::new(PlayerStore::new(repo.clone(), runner.clone()));
        let bus = Arc::new(bus);

        let marriage = use_cases::MarriageUseCases::new(
            Arc::new(use_cases::marriage::Marry::new(bus, runner.clone(), clock)),
            Arc::new(use_cases::marriage::Divorce::new(players.clone(), runner.clone())),
            Arc::new(use_cases::marriage::ListMarriages::new(repo.clone())),
        );

        Self {
            players,
            use_cases: UseCases { marriage },
            runner,
            repo,
        }
    }

    /// Open storage, upgrade legacy data, wire everything and preload the
    /// configured players.
    ///
    /// The player store serves nothing until the legacy gate has run.
    pub async fn start(config: &EngineConfig, bus: MarriageEventBus) -> Result<Self, RepoError> {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let listeners = bus.listener_count();

        let repo: Arc<dyn MarriageRepo> = match config.storage {
            StorageBackend::Sqlite => {
                let pool = connect(&config.db_path).await?;
                run_legacy_gate(&SqliteLegacyConverter::new(pool.clone())).await?;
                Arc::new(SqliteMarriageRepo::new(pool, clock.clone()).await?)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage, marriages will not survive a restart");
                run_legacy_gate(&NoopLegacyConverter).await?;
                Arc::new(InMemoryMarriageRepo::new())
            }
        };

        let app = Self::new(repo, bus, clock, config.max_concurrent_writes);
        app.players.preload(&config.preload).await?;

        tracing::info!(
            storage = ?config.storage,
            max_concurrent_writes = config.max_concurrent_writes,
            listeners,
            "Marriage engine started"
        );
        Ok(app)
    }

    pub fn runner(&self) -> &Arc<PersistenceRunner> {
        &self.runner
    }

    /// Make everything durable, empty the cache and close storage.
    ///
    /// Pending marriage writes land first, then every cached player is saved
    /// in place, then anything scheduled meanwhile is drained. Storage is
    /// closed last; the app cannot be used afterwards.
    /// Returns the number of players saved.
    pub async fn shutdown(&self) -> usize {
        tracing::info!(pending = self.runner.pending(), "Shutting down marriage engine");

        let saved = self.players.unload_all().await;
        self.runner.flush().await;
        self.repo.close().await;

        let failed = self.runner.failed_count();
        if failed > 0 {
            tracing::warn!(failed, "Some background writes failed during this run");
        }
        tracing::info!(saved, "Marriage engine stopped");
        saved
    }
}

/// Convert legacy data if needed. Returns whether a conversion ran.
pub async fn run_legacy_gate(converter: &dyn LegacyConverter) -> Result<bool, RepoError> {
    if !converter.is_outdated().await? {
        tracing::debug!("Storage is current, no conversion needed");
        return Ok(false);
    }

    tracing::info!("Legacy storage detected, converting");
    converter.convert().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockLegacyConverter;
    use marriage_domain::{Gender, PlayerId};

    fn memory_config() -> EngineConfig {
        EngineConfig {
            storage: StorageBackend::Memory,
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn legacy_gate_converts_outdated_storage_once() {
        let mut converter = MockLegacyConverter::new();
        converter.expect_is_outdated().times(1).returning(|| Ok(true));
        converter.expect_convert().times(1).returning(|| Ok(()));

        assert!(run_legacy_gate(&converter).await.unwrap());
    }

    #[tokio::test]
    async fn legacy_gate_leaves_current_storage_alone() {
        let mut converter = MockLegacyConverter::new();
        converter.expect_is_outdated().times(1).returning(|| Ok(false));
        converter.expect_convert().never();

        assert!(!run_legacy_gate(&converter).await.unwrap());
    }

    #[tokio::test]
    async fn legacy_gate_failure_propagates() {
        let mut converter = MockLegacyConverter::new();
        converter.expect_is_outdated().returning(|| Ok(true));
        converter
            .expect_convert()
            .returning(|| Err(RepoError::migration("table marriages_v1 already exists")));

        let result = run_legacy_gate(&converter).await;

        assert!(matches!(result, Err(RepoError::Migration(_))));
    }

    #[tokio::test]
    async fn start_preloads_configured_players() {
        let ids = vec![PlayerId::new(), PlayerId::new()];
        let config = EngineConfig {
            preload: ids.clone(),
            ..memory_config()
        };

        let app = App::start(&config, MarriageEventBus::new()).await.unwrap();

        assert_eq!(app.players.len(), 2);
        assert!(ids.iter().all(|id| app.players.contains(*id)));
    }

    #[tokio::test]
    async fn shutdown_saves_everything_and_empties_the_cache() {
        let repo = Arc::new(InMemoryMarriageRepo::new());
        let app = App::new(repo.clone(), MarriageEventBus::new(), Arc::new(SystemClock::new()), 4);
        let (a, b) = (PlayerId::new(), PlayerId::new());
        let pa = app.players.get(a).await.unwrap();
        let pb = app.players.get(b).await.unwrap();
        pa.write().await.set_gender(Gender::Female);

        app.use_cases.marriage.marry.execute(&pa, &pb, None).await.unwrap();
        let saved = app.shutdown().await;

        assert_eq!(saved, 2);
        assert!(app.players.is_empty());
        assert_eq!(app.runner().pending(), 0);
        assert_eq!(repo.marriage_count().await, 1);
        let stored = repo.load_player(a).await.unwrap();
        assert_eq!(stored.gender(), Gender::Female);
        assert!(stored.is_married_to(b));
    }
}
