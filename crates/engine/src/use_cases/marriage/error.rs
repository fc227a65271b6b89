//! Marriage operation errors.

use crate::infrastructure::ports::RepoError;
use marriage_domain::DomainError;

/// Errors that can occur during marriage operations.
///
/// A vetoed marriage is not an error; see `MarryOutcome::Declined`.
#[derive(Debug, thiserror::Error)]
pub enum MarriageError {
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
