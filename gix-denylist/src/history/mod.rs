//! Enumeration of the commits a push introduces.
//!
//! The decision driver only needs an ordered list of commit identifiers per update, so the
//! repository is hidden behind the [`History`] trait. [`RepositoryHistory`] walks a real
//! repository, tests substitute their own implementation.

use crate::push::CommitRange;
use crate::Error;

mod repository;

pub use repository::RepositoryHistory;

/// Source of the commits introduced by a ref update.
pub trait History {
    /// Return the commits in `range`, in the order they should be checked.
    ///
    /// Identifiers may be abbreviated but must be at least as long as
    /// [`PREFIX_LEN`](crate::policy::PREFIX_LEN) to be matchable.
    fn commits(&mut self, range: CommitRange<'_>) -> Result<Vec<String>, Error>;
}
