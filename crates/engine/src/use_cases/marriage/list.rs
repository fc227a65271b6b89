//! Paged marriage listing.

use std::sync::Arc;

use marriage_domain::MarriageList;

use crate::infrastructure::ports::MarriageRepo;

use super::MarriageError;

/// Reads a page straight from storage on every call.
pub struct ListMarriages {
    repo: Arc<dyn MarriageRepo>,
}

impl ListMarriages {
    pub fn new(repo: Arc<dyn MarriageRepo>) -> Self {
        Self { repo }
    }

    /// `scale` marriages per page, `page` counted from zero.
    pub async fn execute(&self, scale: u32, page: u32) -> Result<MarriageList, MarriageError> {
        Ok(self.repo.list_marriages(scale, page).await?)
    }
}
