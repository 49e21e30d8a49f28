//! Link store
//!
//! Owns the short code uniqueness invariant and the link lifecycle:
//! - Creating links with custom or generated codes (bounded retry)
//! - Looking up, updating, and deleting links
//! - Recording clicks
//! - Paginated and ranked listings
//!
//! The existence probe before an insert is only a fast path. Two creators can
//! both pass it for the same code, so the backend's own uniqueness check on
//! insert decides, and a rejection there becomes a conflict (explicit code) or
//! another attempt (generated code).

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{GeneratorError, LinkError, Result, StorageError};
use crate::generator::CodeGenerator;
use crate::model::{Link, NewLink};
use crate::storage::LinkRecords;
use crate::validation::{
    check_generator, require_code, validate_custom_code, validate_destination, validate_limit,
    validate_offset,
};

/// Candidates tried for a generated code before giving up
pub const MAX_ALLOCATION_ATTEMPTS: usize = 10;

/// Result of [`LinkStore::health`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreHealth {
    pub connected: bool,
    /// `None` when the backend is not reachable at all
    pub table_accessible: Option<bool>,
}

pub struct LinkStore {
    records: Arc<dyn LinkRecords>,
    generator: CodeGenerator,
}

impl LinkStore {
    /// Fails when `generator` can produce codes that are not valid short
    /// codes (wrong length or characters outside the URL-safe set).
    pub fn new(
        records: Arc<dyn LinkRecords>,
        generator: CodeGenerator,
    ) -> std::result::Result<Self, GeneratorError> {
        check_generator(&generator)?;
        Ok(Self { records, generator })
    }

    /// Liveness probe. Never fails; a broken backend reports `false`.
    pub fn ping(&self) -> bool {
        match self.records.ping() {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Database health check failed");
                false
            }
        }
    }

    /// Like [`LinkStore::ping`] but also checks the links table opens.
    pub fn health(&self) -> StoreHealth {
        if !self.ping() {
            return StoreHealth {
                connected: false,
                table_accessible: None,
            };
        }
        let table_accessible = match self.records.probe_table() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "links table is not accessible");
                false
            }
        };
        StoreHealth {
            connected: true,
            table_accessible: Some(table_accessible),
        }
    }

    /// Returns `Ok(None)` when no link has this code.
    pub fn get_by_code(&self, code: &str) -> Result<Option<Link>> {
        require_code(code)?;
        self.records
            .find_by_code(code)
            .map_err(|e| storage_failure("get_by_code", code, format!("Failed to fetch URL: {code}"), e))
    }

    pub fn get_by_id(&self, id: u64) -> Result<Option<Link>> {
        require_id(id)?;
        self.records.find_by_id(id).map_err(|e| {
            storage_failure(
                "get_by_id",
                &id.to_string(),
                format!("Failed to fetch URL by ID: {id}"),
                e,
            )
        })
    }

    /// Heuristic gate used before inserts.
    ///
    /// A backend failure reads as "free" so allocation can proceed; the
    /// insert's uniqueness check still catches a real duplicate.
    pub fn code_exists(&self, code: &str) -> bool {
        if code.trim().is_empty() {
            return false;
        }
        match self.records.exists(code) {
            Ok(found) => found,
            Err(e) => {
                error!(operation = "code_exists", code, error = %e, "Error checking URL code");
                false
            }
        }
    }

    /// Creates a link to `destination_url`.
    ///
    /// With `Some(code)` the code must be 3-20 ASCII alphanumerics and free;
    /// with `None` (or an empty code) one is generated, trying at most
    /// [`MAX_ALLOCATION_ATTEMPTS`] candidates.
    pub fn create(&self, destination_url: &str, code: Option<&str>) -> Result<Link> {
        validate_destination(destination_url)?;

        match code.filter(|c| !c.is_empty()) {
            Some(code) => self.create_with_code(destination_url, code),
            None => self.create_with_generated_code(destination_url),
        }
    }

    fn create_with_code(&self, destination_url: &str, code: &str) -> Result<Link> {
        validate_custom_code(code)?;
        if self.code_exists(code) {
            return Err(code_in_use());
        }

        match self.records.insert(new_link(destination_url, code)) {
            Ok(link) => {
                info!(code, id = link.id, "Created link");
                Ok(link)
            }
            Err(StorageError::DuplicateCode(_)) => {
                debug!(code, "code taken between existence check and insert");
                Err(code_in_use())
            }
            Err(e) => Err(storage_failure("create", code, "Failed to add URL", e)),
        }
    }

    fn create_with_generated_code(&self, destination_url: &str) -> Result<Link> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let candidate = self.generator.generate();
            if self.code_exists(&candidate) {
                debug!(code = %candidate, attempt, "generated code collides");
                continue;
            }

            match self.records.insert(new_link(destination_url, &candidate)) {
                Ok(link) => {
                    info!(code = %link.short_code, id = link.id, attempt, "Created link");
                    return Ok(link);
                }
                Err(StorageError::DuplicateCode(_)) => {
                    debug!(code = %candidate, attempt, "generated code taken at insert");
                }
                Err(e) => return Err(storage_failure("create", &candidate, "Failed to add URL", e)),
            }
        }

        warn!(
            attempts = MAX_ALLOCATION_ATTEMPTS,
            "Failed to generate unique code"
        );
        Err(LinkError::Exhausted {
            attempts: MAX_ALLOCATION_ATTEMPTS,
        })
    }

    /// Points an existing code at a new destination. Click data and the
    /// creation time are left untouched.
    pub fn update_destination(&self, code: &str, new_destination_url: &str) -> Result<Link> {
        require_code(code)?;
        validate_destination(new_destination_url)?;

        match self.records.update_destination(code, new_destination_url) {
            Ok(Some(link)) => {
                info!(code, "Updated link destination");
                Ok(link)
            }
            Ok(None) => Err(code_not_found(code)),
            Err(e) => Err(storage_failure(
                "update_destination",
                code,
                format!("Failed to update redirect URL: {code}"),
                e,
            )),
        }
    }

    /// Counts one click and stamps the click time, atomically in storage.
    pub fn record_click(&self, code: &str) -> Result<()> {
        require_code(code)?;

        match self.records.record_click(code, Utc::now()) {
            Ok(true) => Ok(()),
            Ok(false) => Err(code_not_found(code)),
            Err(e) => Err(storage_failure(
                "record_click",
                code,
                format!("Failed to update click statistics: {code}"),
                e,
            )),
        }
    }

    pub fn delete(&self, code: &str) -> Result<()> {
        require_code(code)?;

        match self.records.delete(code) {
            Ok(true) => {
                info!(code, "Deleted link");
                Ok(())
            }
            Ok(false) => Err(code_not_found(code)),
            Err(e) => Err(storage_failure(
                "delete",
                code,
                format!("Failed to delete URL: {code}"),
                e,
            )),
        }
    }

    pub fn delete_by_id(&self, id: u64) -> Result<()> {
        require_id(id)?;

        match self.records.delete_by_id(id) {
            Ok(true) => {
                info!(id, "Deleted link");
                Ok(())
            }
            Ok(false) => Err(LinkError::not_found(format!("URL with ID {id} not found"))),
            Err(e) => Err(storage_failure(
                "delete_by_id",
                &id.to_string(),
                format!("Failed to delete URL by ID: {id}"),
                e,
            )),
        }
    }

    /// One page of links, newest first. Pair with [`LinkStore::count`] to
    /// build pagination metadata.
    pub fn list_page(&self, limit: i64, offset: i64) -> Result<Vec<Link>> {
        let limit = validate_limit(limit)?;
        let offset = validate_offset(offset)?;

        self.records
            .list_page(limit, offset)
            .map_err(|e| storage_failure("list_page", "", "Failed to fetch paginated URLs", e))
    }

    pub fn count(&self) -> Result<u64> {
        self.records
            .count()
            .map_err(|e| storage_failure("count", "", "Failed to get URL count", e))
    }

    pub fn most_clicked(&self, limit: i64) -> Result<Vec<Link>> {
        let limit = validate_limit(limit)?;
        self.records
            .most_clicked(limit)
            .map_err(|e| storage_failure("most_clicked", "", "Failed to fetch most clicked URLs", e))
    }

    pub fn recently_clicked(&self, limit: i64) -> Result<Vec<Link>> {
        let limit = validate_limit(limit)?;
        self.records.recently_clicked(limit).map_err(|e| {
            storage_failure(
                "recently_clicked",
                "",
                "Failed to fetch recently clicked URLs",
                e,
            )
        })
    }
}

fn new_link(destination_url: &str, code: &str) -> NewLink {
    NewLink {
        short_code: code.to_string(),
        destination_url: destination_url.to_string(),
        created_at: Utc::now(),
    }
}

fn require_id(id: u64) -> Result<()> {
    if id == 0 {
        return Err(LinkError::validation("Invalid ID provided"));
    }
    Ok(())
}

fn code_in_use() -> LinkError {
    LinkError::conflict("Code already in use. Please choose a different code.")
}

fn code_not_found(code: &str) -> LinkError {
    LinkError::not_found(format!("URL with code '{code}' not found"))
}

/// Logs a backend failure with its context and wraps it for the caller.
fn storage_failure(
    operation: &'static str,
    code: &str,
    message: impl Into<String>,
    source: StorageError,
) -> LinkError {
    let message = message.into();
    error!(operation, code, error = %source, "{}", message);
    LinkError::storage(message, source)
}
