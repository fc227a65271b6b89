//! Error types for port operations.

/// Storage operation errors with context for debugging.
///
/// Any of these surfacing from a load means the backing store could not
/// produce the player; callers treat the player as not loaded.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// A stored row could not be turned back into a domain value.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Legacy data could not be converted to the current layout.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl RepoError {
    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    /// Create a Migration error.
    pub fn migration(message: impl ToString) -> Self {
        Self::Migration(message.to_string())
    }
}
