//! Marriage use cases.
//!
//! Creating and removing marriages, linking them into both partners' cached
//! records, and listing what is stored.
//!
//! Durable writes are scheduled on the persistence runner and the cache is
//! updated straight after, as two separate steps. If the process dies in
//! between, the cache and storage disagree until the affected players are
//! loaded again; loads always rebuild marriages from storage.

use std::sync::Arc;

mod divorce;
mod error;
mod list;
mod marry;

pub use divorce::Divorce;
pub use error::MarriageError;
pub use list::ListMarriages;
pub use marry::{Marry, MarryOutcome};

/// Container for marriage use cases.
pub struct MarriageUseCases {
    pub marry: Arc<Marry>,
    pub divorce: Arc<Divorce>,
    pub list: Arc<ListMarriages>,
}

impl MarriageUseCases {
    pub fn new(marry: Arc<Marry>, divorce: Arc<Divorce>, list: Arc<ListMarriages>) -> Self {
        Self {
            marry,
            divorce,
            list,
        }
    }
}
