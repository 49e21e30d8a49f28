//! Record storage collaborator used by the link store
//!
//! A backend only persists and retrieves [`Link`] records. It must enforce
//! uniqueness of `short_code` itself and perform every mutation as a single
//! atomic operation; the link store relies on both.

use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::model::{Link, NewLink};

pub trait LinkRecords: Send + Sync {
    /// Trivial round trip proving the backend answers at all.
    fn ping(&self) -> Result<(), StorageError>;

    /// Confirms the links table itself can be opened.
    fn probe_table(&self) -> Result<(), StorageError>;

    fn find_by_code(&self, code: &str) -> Result<Option<Link>, StorageError>;

    fn find_by_id(&self, id: u64) -> Result<Option<Link>, StorageError>;

    fn exists(&self, code: &str) -> Result<bool, StorageError>;

    /// Newest first by `created_at`.
    fn list_page(&self, limit: usize, offset: usize) -> Result<Vec<Link>, StorageError>;

    fn count(&self) -> Result<u64, StorageError>;

    /// Inserts a record and returns it with its assigned id.
    ///
    /// Fails with [`StorageError::DuplicateCode`] if the code is taken at the
    /// moment of the insert, whatever an earlier [`LinkRecords::exists`] said.
    fn insert(&self, link: NewLink) -> Result<Link, StorageError>;

    /// Returns `None` when no record has this code.
    fn update_destination(&self, code: &str, url: &str) -> Result<Option<Link>, StorageError>;

    /// Increments the click counter and sets the last click time in one
    /// atomic step. Returns `false` when no record has this code.
    fn record_click(&self, code: &str, at: DateTime<Utc>) -> Result<bool, StorageError>;

    /// Returns whether a record was removed.
    fn delete(&self, code: &str) -> Result<bool, StorageError>;

    fn delete_by_id(&self, id: u64) -> Result<bool, StorageError>;

    /// Highest `total_clicks` first.
    fn most_clicked(&self, limit: usize) -> Result<Vec<Link>, StorageError>;

    /// Clicked links only, most recent click first.
    fn recently_clicked(&self, limit: usize) -> Result<Vec<Link>, StorageError>;
}
