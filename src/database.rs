//! Database initialization and the redb-backed link records
//!
//! This module handles the setup of the embedded redb database and
//! implements [`LinkRecords`] on top of it. Every mutation runs inside a
//! single write transaction; redb allows only one writer at a time, so the
//! duplicate check performed inside [`RedbRecords::insert`] is the
//! authoritative uniqueness constraint on short codes.

use chrono::{DateTime, Utc};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};

use crate::error::StorageError;
use crate::model::{Link, NewLink};
use crate::storage::LinkRecords;

/// Main table for link records
///
/// Key: short code
/// Value: JSON-serialized [`Link`]
///
/// Example:
/// - Key: "abc123"
/// - Value: '{"id":1,"short_code":"abc123","destination_url":"https://example.com",...}'
pub const TABLE_LINKS: TableDefinition<&str, &str> = TableDefinition::new("links_v1");

/// Secondary index from surrogate id to short code
pub const TABLE_LINK_IDS: TableDefinition<u64, &str> = TableDefinition::new("link_ids_v1");

/// Index for newest-first listing
///
/// Key: (created_at in unix micros, id). The id breaks ties between links
/// created within the same microsecond.
/// Value: short code
pub const TABLE_CREATED_INDEX: TableDefinition<(i64, u64), &str> =
    TableDefinition::new("links_by_created_v1");

/// Small key/value table for counters
pub const TABLE_META: TableDefinition<&str, u64> = TableDefinition::new("meta_v1");

const LINK_SEQUENCE_KEY: &str = "link_seq";

/// Initializes the embedded database and creates required tables
///
/// # Arguments
///
/// * `db_path` - File path where the database should be stored (e.g., "data.db")
///
/// # Example
///
/// ```no_run
/// # use tinylink::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_LINKS)?;
        write_txn.open_table(TABLE_LINK_IDS)?;
        write_txn.open_table(TABLE_CREATED_INDEX)?;
        write_txn.open_table(TABLE_META)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// [`LinkRecords`] backed by a redb [`Database`]
pub struct RedbRecords {
    db: Database,
}

impl RedbRecords {
    /// Wraps a database already prepared by [`init_db`].
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn open(db_path: &str) -> Result<Self, StorageError> {
        Ok(Self::new(init_db(db_path)?))
    }

    /// Applies `change` to the record stored under `code` and writes it back
    /// in the same transaction.
    fn modify<F>(&self, code: &str, change: F) -> Result<Option<Link>, StorageError>
    where
        F: FnOnce(&mut Link),
    {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut links = write_txn.open_table(TABLE_LINKS)?;
            let current = match links.get(code)? {
                Some(value) => Some(decode(value.value())?),
                None => None,
            };
            match current {
                Some(mut link) => {
                    change(&mut link);
                    let record = serde_json::to_string(&link)?;
                    links.insert(code, record.as_str())?;
                    Some(link)
                }
                None => None,
            }
        };
        write_txn.commit()?;

        Ok(updated)
    }

    fn all_links(&self) -> Result<Vec<Link>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let links = read_txn.open_table(TABLE_LINKS)?;

        let mut all = Vec::new();
        for entry in links.iter()? {
            let (_, value) = entry?;
            all.push(decode(value.value())?);
        }
        Ok(all)
    }
}

fn decode(value: &str) -> Result<Link, StorageError> {
    Ok(serde_json::from_str(value)?)
}

/// Removes the secondary index entries of a deleted link.
fn unindex(write_txn: &WriteTransaction, link: &Link) -> Result<(), StorageError> {
    write_txn.open_table(TABLE_LINK_IDS)?.remove(link.id)?;
    write_txn
        .open_table(TABLE_CREATED_INDEX)?
        .remove((link.created_at.timestamp_micros(), link.id))?;
    Ok(())
}

impl LinkRecords for RedbRecords {
    fn ping(&self) -> Result<(), StorageError> {
        self.db.begin_read()?;
        Ok(())
    }

    fn probe_table(&self) -> Result<(), StorageError> {
        let read_txn = self.db.begin_read()?;
        read_txn.open_table(TABLE_LINKS)?;
        Ok(())
    }

    fn find_by_code(&self, code: &str) -> Result<Option<Link>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let links = read_txn.open_table(TABLE_LINKS)?;

        let link = match links.get(code)? {
            Some(value) => Some(decode(value.value())?),
            None => None,
        };
        Ok(link)
    }

    fn find_by_id(&self, id: u64) -> Result<Option<Link>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let ids = read_txn.open_table(TABLE_LINK_IDS)?;

        let code = ids.get(id)?.map(|value| value.value().to_string());
        let Some(code) = code else {
            return Ok(None);
        };

        let links = read_txn.open_table(TABLE_LINKS)?;
        let link = match links.get(code.as_str())? {
            Some(value) => Some(decode(value.value())?),
            None => None,
        };
        Ok(link)
    }

    fn exists(&self, code: &str) -> Result<bool, StorageError> {
        let read_txn = self.db.begin_read()?;
        let links = read_txn.open_table(TABLE_LINKS)?;
        let found = links.get(code)?.is_some();
        Ok(found)
    }

    fn list_page(&self, limit: usize, offset: usize) -> Result<Vec<Link>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(TABLE_CREATED_INDEX)?;
        let links = read_txn.open_table(TABLE_LINKS)?;

        // reversed so the newest key comes first
        let mut page = Vec::with_capacity(limit);
        for entry in index.iter()?.rev().skip(offset).take(limit) {
            let (_, code) = entry?;
            if let Some(value) = links.get(code.value())? {
                page.push(decode(value.value())?);
            }
        }
        Ok(page)
    }

    fn count(&self) -> Result<u64, StorageError> {
        let read_txn = self.db.begin_read()?;
        let links = read_txn.open_table(TABLE_LINKS)?;
        let total = links.len()?;
        Ok(total)
    }

    fn insert(&self, new_link: NewLink) -> Result<Link, StorageError> {
        let write_txn = self.db.begin_write()?;
        let link = {
            let mut links = write_txn.open_table(TABLE_LINKS)?;
            if links.get(new_link.short_code.as_str())?.is_some() {
                // dropping the uncommitted transaction discards it
                return Err(StorageError::DuplicateCode(new_link.short_code));
            }

            let mut meta = write_txn.open_table(TABLE_META)?;
            let next_id = meta
                .get(LINK_SEQUENCE_KEY)?
                .map(|value| value.value())
                .unwrap_or(0)
                + 1;
            meta.insert(LINK_SEQUENCE_KEY, next_id)?;

            let link = new_link.into_link(next_id);
            let record = serde_json::to_string(&link)?;
            links.insert(link.short_code.as_str(), record.as_str())?;

            write_txn
                .open_table(TABLE_LINK_IDS)?
                .insert(link.id, link.short_code.as_str())?;
            write_txn.open_table(TABLE_CREATED_INDEX)?.insert(
                (link.created_at.timestamp_micros(), link.id),
                link.short_code.as_str(),
            )?;
            link
        };
        write_txn.commit()?;

        Ok(link)
    }

    fn update_destination(&self, code: &str, url: &str) -> Result<Option<Link>, StorageError> {
        self.modify(code, |link| link.destination_url = url.to_string())
    }

    fn record_click(&self, code: &str, at: DateTime<Utc>) -> Result<bool, StorageError> {
        let updated = self.modify(code, |link| {
            link.total_clicks += 1;
            link.last_clicked_at = Some(at);
        })?;
        Ok(updated.is_some())
    }

    fn delete(&self, code: &str) -> Result<bool, StorageError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut links = write_txn.open_table(TABLE_LINKS)?;
            let removed = match links.remove(code)? {
                Some(value) => Some(decode(value.value())?),
                None => None,
            };
            if let Some(link) = &removed {
                unindex(&write_txn, link)?;
            }
            removed.is_some()
        };
        write_txn.commit()?;

        Ok(removed)
    }

    fn delete_by_id(&self, id: u64) -> Result<bool, StorageError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut ids = write_txn.open_table(TABLE_LINK_IDS)?;
            let code = ids.remove(id)?.map(|value| value.value().to_string());
            match code {
                Some(code) => {
                    let mut links = write_txn.open_table(TABLE_LINKS)?;
                    let removed = match links.remove(code.as_str())? {
                        Some(value) => Some(decode(value.value())?),
                        None => None,
                    };
                    if let Some(link) = &removed {
                        write_txn
                            .open_table(TABLE_CREATED_INDEX)?
                            .remove((link.created_at.timestamp_micros(), link.id))?;
                    }
                    removed.is_some()
                }
                None => false,
            }
        };
        write_txn.commit()?;

        Ok(removed)
    }

    fn most_clicked(&self, limit: usize) -> Result<Vec<Link>, StorageError> {
        let mut links = self.all_links()?;
        links.sort_by(|a, b| {
            b.total_clicks
                .cmp(&a.total_clicks)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        links.truncate(limit);
        Ok(links)
    }

    fn recently_clicked(&self, limit: usize) -> Result<Vec<Link>, StorageError> {
        let mut links: Vec<Link> = self
            .all_links()?
            .into_iter()
            .filter(|link| link.last_clicked_at.is_some())
            .collect();
        links.sort_by(|a, b| b.last_clicked_at.cmp(&a.last_clicked_at));
        links.truncate(limit);
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn records() -> (RedbRecords, NamedTempFile) {
        let temp_db = NamedTempFile::new().expect("Failed to create temp file");
        let records = RedbRecords::open(temp_db.path().to_str().unwrap()).unwrap();
        (records, temp_db)
    }

    fn new_link(code: &str) -> NewLink {
        NewLink {
            short_code: code.to_string(),
            destination_url: format!("https://example.com/{code}"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let (records, _temp_db) = records();
        let first = records.insert(new_link("one")).unwrap();
        let second = records.insert(new_link("two")).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(records.count().unwrap(), 2);
    }

    #[test]
    fn test_insert_rejects_duplicate_code() {
        let (records, _temp_db) = records();
        records.insert(new_link("dup")).unwrap();

        let err = records.insert(new_link("dup")).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateCode(code) if code == "dup"));
        assert_eq!(records.count().unwrap(), 1);

        // the aborted insert must not have consumed an id
        let next = records.insert(new_link("next")).unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn test_find_by_id_and_delete_by_id() {
        let (records, _temp_db) = records();
        let link = records.insert(new_link("byid")).unwrap();

        assert_eq!(records.find_by_id(link.id).unwrap(), Some(link.clone()));
        assert!(records.delete_by_id(link.id).unwrap());
        assert!(records.find_by_id(link.id).unwrap().is_none());
        assert!(records.find_by_code("byid").unwrap().is_none());
        assert!(!records.delete_by_id(link.id).unwrap());
        assert!(records.list_page(10, 0).unwrap().is_empty());
    }

    #[test]
    fn test_delete_cleans_indexes() {
        let (records, _temp_db) = records();
        let link = records.insert(new_link("gone")).unwrap();

        assert!(records.delete("gone").unwrap());
        assert!(!records.delete("gone").unwrap());
        assert!(records.find_by_id(link.id).unwrap().is_none());
        assert!(records.list_page(10, 0).unwrap().is_empty());
        assert_eq!(records.count().unwrap(), 0);
    }

    #[test]
    fn test_record_click_missing_code() {
        let (records, _temp_db) = records();
        assert!(!records.record_click("nope", Utc::now()).unwrap());
        assert!(records.update_destination("nope", "https://a.com").unwrap().is_none());
    }

    #[test]
    fn test_ping_and_probe() {
        let (records, _temp_db) = records();
        assert!(records.ping().is_ok());
        assert!(records.probe_table().is_ok());
    }
}
