//! Ports for collaborators outside the marriage core.

use async_trait::async_trait;
use marriage_domain::MarryIntent;

use super::error::RepoError;

/// Answer from a listener to a marry intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Veto,
}

/// Something that gets a say before two players are married
/// (land-protection hooks, cooldown rules, and the like).
///
/// Called synchronously on the caller's path; implementations must not block.
#[cfg_attr(test, mockall::automock)]
pub trait MarriageListener: Send + Sync {
    fn on_marry(&self, intent: &MarryIntent) -> Verdict;
}

/// Startup gate for data written by older releases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LegacyConverter: Send + Sync {
    async fn is_outdated(&self) -> Result<bool, RepoError>;
    async fn convert(&self) -> Result<(), RepoError>;
}
