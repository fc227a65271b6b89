use serde::{Deserialize, Serialize};

use crate::Marriage;

/// One page of the durable marriage listing, oldest first.
///
/// Recomputed from storage on every request; never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarriageList {
    pub scale: u32,
    pub page: u32,
    /// Number of marriages in storage, across all pages.
    pub total: u64,
    pub marriages: Vec<Marriage>,
}

impl MarriageList {
    pub fn is_empty(&self) -> bool {
        self.marriages.is_empty()
    }

    /// Number of pages at the current scale. Always at least one so an
    /// empty listing still renders "page 1 of 1".
    pub fn page_count(&self) -> u64 {
        if self.scale == 0 {
            return 1;
        }
        let scale = u64::from(self.scale);
        self.total.div_ceil(scale).max(1)
    }
}
