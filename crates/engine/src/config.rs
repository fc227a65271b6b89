//! Engine configuration from environment variables.
//!
//! | Variable              | Default        |
//! |-----------------------|----------------|
//! | `MARRIAGE_STORAGE`    | `sqlite`       |
//! | `MARRIAGE_DB`         | `marriages.db` |
//! | `MARRIAGE_MAX_WRITES` | `8`            |
//! | `MARRIAGE_PRELOAD`    | (empty)        |
//!
//! Unparseable values fall back to the default with a warning.

use std::str::FromStr;

use marriage_domain::PlayerId;

use crate::infrastructure::persist_runner::DEFAULT_MAX_CONCURRENT_WRITES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub storage: StorageBackend,
    pub db_path: String,
    pub max_concurrent_writes: usize,
    /// Players to load before serving, e.g. everyone online across a reload.
    pub preload: Vec<PlayerId>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Sqlite,
            db_path: "marriages.db".into(),
            max_concurrent_writes: DEFAULT_MAX_CONCURRENT_WRITES,
            preload: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let storage = parse_or(lookup("MARRIAGE_STORAGE"), "MARRIAGE_STORAGE", defaults.storage);
        let db_path = lookup("MARRIAGE_DB")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.db_path);
        let max_concurrent_writes = parse_or(
            lookup("MARRIAGE_MAX_WRITES"),
            "MARRIAGE_MAX_WRITES",
            defaults.max_concurrent_writes,
        )
        .max(1);

        let preload = lookup("MARRIAGE_PRELOAD")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .filter_map(|s| match s.parse::<PlayerId>() {
                        Ok(id) => Some(id),
                        Err(e) => {
                            tracing::warn!(value = %s, error = %e, "Skipping invalid MARRIAGE_PRELOAD entry");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            storage,
            db_path,
            max_concurrent_writes,
            preload,
        }
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!(key, value = %raw, error = %e, default = ?default, "Invalid setting, using default");
            default
        }),
    }
}
