use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::csv_import::{import_contacts, EMPTY_FILE_MESSAGE};
use super::query::QueryPlan;
use super::validation::validate_list_request;
use crate::db::ContactRepository;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    ContactChanges, ContactDto, ImportOutcome, ListRequest, ListResponse, ParsedImport,
};

pub const INVALID_REQUEST_MESSAGE: &str = "Invalid request.";
pub const UNSUPPORTED_FILE_MESSAGE: &str = "Only .csv files are supported.";

fn check_cancelled(cancel: &CancellationToken) -> ServiceResult<()> {
    if cancel.is_cancelled() {
        return Err(ServiceError::Cancelled);
    }
    Ok(())
}

fn has_csv_extension(file_name: &str) -> bool {
    Path::new(file_name.trim())
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
}

/// Contact use cases on top of a [`ContactRepository`].
pub struct ContactService<R> {
    repo: R,
}

impl<R: ContactRepository> ContactService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// One page of contacts for a data-table request.
    ///
    /// Structurally invalid requests never reach storage; they get a
    /// zero-count response carrying an error marker.
    pub async fn list(
        &self,
        request: &ListRequest,
        cancel: &CancellationToken,
    ) -> ServiceResult<ListResponse> {
        if let Err(errors) = validate_list_request(request) {
            log::warn!("Rejected list request (draw {}): {}", request.draw, errors.join(" "));
            return Ok(ListResponse::rejected(request.draw, INVALID_REQUEST_MESSAGE));
        }

        let plan = QueryPlan::from_request(request);
        log::debug!("List plan for draw {}: {:?}", request.draw, plan);

        check_cancelled(cancel)?;
        let page = self.repo.query(&plan, cancel).await?;
        check_cancelled(cancel)?;

        Ok(ListResponse {
            draw: request.draw,
            records_total: page.records_total,
            records_filtered: page.records_filtered,
            data: page.rows.iter().map(|c| c.to_dto()).collect(),
            error: None,
        })
    }

    pub async fn get_by_id(
        &self,
        id: Uuid,
        cancel: &CancellationToken,
    ) -> ServiceResult<Option<ContactDto>> {
        check_cancelled(cancel)?;
        let contact = self.repo.get_by_id(id, cancel).await?;
        Ok(contact.map(|c| c.to_dto()))
    }

    /// Overwrite a contact's fields. Returns false if it does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &ContactChanges,
        cancel: &CancellationToken,
    ) -> ServiceResult<bool> {
        check_cancelled(cancel)?;
        let Some(mut contact) = self.repo.get_by_id(id, cancel).await? else {
            log::warn!("Update skipped, contact {} not found", id);
            return Ok(false);
        };

        contact.apply_changes(changes);
        self.repo.update(contact);
        self.commit(cancel).await?;

        log::info!("Updated contact {}", id);
        Ok(true)
    }

    /// Remove a contact. Returns false if it does not exist.
    pub async fn delete(&self, id: Uuid, cancel: &CancellationToken) -> ServiceResult<bool> {
        check_cancelled(cancel)?;
        let Some(contact) = self.repo.get_by_id(id, cancel).await? else {
            log::warn!("Delete skipped, contact {} not found", id);
            return Ok(false);
        };

        self.repo.remove(contact);
        self.commit(cancel).await?;

        log::info!("Deleted contact {}", id);
        Ok(true)
    }

    /// Import contacts from a CSV upload.
    ///
    /// Missing or empty input and non-`.csv` names are refused before any row
    /// is read. Row failures are reported in the outcome; every parsed contact
    /// is stored in one bulk insert. Reading and parsing run on the blocking
    /// pool.
    pub async fn import_csv<S: Read + Send + 'static>(
        &self,
        input: Option<S>,
        file_name: &str,
        cancel: &CancellationToken,
    ) -> ServiceResult<ImportOutcome> {
        let Some(input) = input else {
            return Ok(ImportOutcome::rejected(EMPTY_FILE_MESSAGE));
        };

        let is_csv = has_csv_extension(file_name);
        let parse_cancel = cancel.clone();
        let parsed = tokio::task::spawn_blocking(move || -> ServiceResult<ParsedImport> {
            let mut input = BufReader::new(input);
            if input.fill_buf()?.is_empty() {
                return Err(ServiceError::Validation(EMPTY_FILE_MESSAGE.to_string()));
            }
            if !is_csv {
                return Err(ServiceError::Validation(UNSUPPORTED_FILE_MESSAGE.to_string()));
            }

            check_cancelled(&parse_cancel)?;
            import_contacts(input, &parse_cancel)
        })
        .await
        .map_err(|e| {
            ServiceError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("Import task failed: {}", e),
            ))
        })?;

        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(ServiceError::Validation(message)) => return Ok(ImportOutcome::rejected(&message)),
            Err(e) => return Err(e),
        };
        let outcome = parsed.outcome();

        if !parsed.contacts.is_empty() {
            self.repo.add_range(parsed.contacts, cancel).await?;
            self.commit(cancel).await?;
        }

        log::info!(
            "Imported {} contacts from {} ({} rows rejected)",
            outcome.imported,
            file_name,
            outcome.failed
        );
        Ok(outcome)
    }

    /// Save staged changes, dropping them if cancelled or if the save fails.
    async fn commit(&self, cancel: &CancellationToken) -> ServiceResult<usize> {
        if cancel.is_cancelled() {
            self.repo.discard_changes();
            return Err(ServiceError::Cancelled);
        }

        match self.repo.save_changes(cancel).await {
            Ok(affected) => Ok(affected),
            Err(e) => {
                self.repo.discard_changes();
                Err(e.into())
            }
        }
    }
}
