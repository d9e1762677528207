//! Memo use-case service.
//!
//! # Responsibility
//! - Provide memo create/update/get/list/delete APIs for HTTP and CLI callers.
//! - Turn raw form input into validated drafts and parsed tag names.
//! - Emit metadata-only logging events for every mutation.
//!
//! # Invariants
//! - Invalid input never reaches the repository.
//! - Tag attachment is all-or-nothing; failures surface as
//!   [`MemoServiceError::TagAttach`] naming the offending tag.
//! - Edit replaces the full tag set with the submitted one.

use crate::model::memo::{Memo, MemoDraft, MemoId, MemoValidationError};
use crate::model::tag::{parse_tag_csv, AttachOutcome, TagAttachReport};
use crate::repo::memo_repo::{MemoListQuery, MemoRepository, RepoError};
use crate::text::query::{normalize_query, SortKey};
use log::{info, warn};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for memo use-cases.
#[derive(Debug)]
pub enum MemoServiceError {
    /// User input was rejected; message is safe to show.
    Validation(MemoValidationError),
    /// Target memo does not exist.
    MemoNotFound(MemoId),
    /// One tag could not be attached; the whole write was rolled back.
    TagAttach { name: String, source: RepoError },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl MemoServiceError {
    /// Whether the error is caused by user input rather than storage.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::TagAttach {
                    source: RepoError::InvalidTag(_),
                    ..
                }
        )
    }
}

impl Display for MemoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::MemoNotFound(id) => write!(f, "memo not found: {id}"),
            Self::TagAttach { source, .. } => write!(f, "{source}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent memo state: {details}"),
        }
    }
}

impl Error for MemoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::TagAttach { source, .. } | Self::Repo(source) => Some(source),
            _ => None,
        }
    }
}

impl From<MemoValidationError> for MemoServiceError {
    fn from(value: MemoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for MemoServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::MemoNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::InvalidTag(err) => Self::TagAttach {
                name: err.name().to_string(),
                source: RepoError::InvalidTag(err),
            },
            RepoError::TagAttach { name, source } => Self::TagAttach {
                name: name.clone(),
                source: RepoError::TagAttach { name, source },
            },
            other => Self::Repo(other),
        }
    }
}

/// Raw create/edit form values, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MemoForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Comma-delimited tag names.
    #[serde(default)]
    pub tags: String,
}

/// Memo read back after a successful write, plus what happened to its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoSaved {
    pub memo: Memo,
    pub tags: TagAttachReport,
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoListResult {
    pub items: Vec<Memo>,
    /// Normalized query actually applied.
    pub query: String,
    /// Sort order actually applied.
    pub sort: SortKey,
}

/// Memo service facade over repository implementations.
pub struct MemoService<R: MemoRepository> {
    repo: R,
}

impl<R: MemoRepository> MemoService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates the form, inserts the memo and attaches its tags atomically.
    pub fn create_memo(&mut self, form: &MemoForm) -> Result<MemoSaved, MemoServiceError> {
        let draft = validated_draft(form, "memo_create")?;
        let tag_names = parse_tag_csv(Some(form.tags.as_str()));

        let (id, report) = self
            .repo
            .create_memo(&draft, &tag_names)
            .inspect_err(|err| log_write_failure("memo_create", None, err))?;
        log_tag_report("memo_create", id, &report);

        let memo = self
            .repo
            .get_memo(id)?
            .ok_or(MemoServiceError::InconsistentState(
                "created memo not found in read-back",
            ))?;
        Ok(MemoSaved { memo, tags: report })
    }

    /// Rewrites title/body and replaces the tag set of an existing memo.
    ///
    /// A missing memo is reported before the form is validated.
    pub fn update_memo(
        &mut self,
        id: MemoId,
        form: &MemoForm,
    ) -> Result<MemoSaved, MemoServiceError> {
        if self.repo.get_memo(id)?.is_none() {
            info!("event=memo_update module=service status=not_found memo_id={id}");
            return Err(MemoServiceError::MemoNotFound(id));
        }
        let draft = validated_draft(form, "memo_update")?;
        let tag_names = parse_tag_csv(Some(form.tags.as_str()));

        let report = self
            .repo
            .update_memo(id, &draft, &tag_names)
            .inspect_err(|err| log_write_failure("memo_update", Some(id), err))?;
        log_tag_report("memo_update", id, &report);

        let memo = self
            .repo
            .get_memo(id)?
            .ok_or(MemoServiceError::InconsistentState(
                "updated memo not found in read-back",
            ))?;
        Ok(MemoSaved { memo, tags: report })
    }

    /// Adds tags from a comma-delimited string, keeping existing links.
    pub fn attach_tags(
        &mut self,
        id: MemoId,
        tag_csv: Option<&str>,
    ) -> Result<TagAttachReport, MemoServiceError> {
        let tag_names = parse_tag_csv(tag_csv);
        let report = self
            .repo
            .attach_tags(id, &tag_names)
            .inspect_err(|err| log_write_failure("memo_attach_tags", Some(id), err))?;
        log_tag_report("memo_attach_tags", id, &report);
        Ok(report)
    }

    /// Gets one memo by id.
    pub fn get_memo(&self, id: MemoId) -> Result<Option<Memo>, MemoServiceError> {
        Ok(self.repo.get_memo(id)?)
    }

    /// Gets one memo by id, mapping absence to [`MemoServiceError::MemoNotFound`].
    pub fn require_memo(&self, id: MemoId) -> Result<Memo, MemoServiceError> {
        self.get_memo(id)?.ok_or(MemoServiceError::MemoNotFound(id))
    }

    /// Lists memos whose title or body contains the normalized query.
    ///
    /// Matching is ASCII case-insensitive; `%` and `_` match literally.
    pub fn list_memos(
        &self,
        query: Option<&str>,
        sort: Option<&str>,
    ) -> Result<MemoListResult, MemoServiceError> {
        let list_query = MemoListQuery {
            text: normalize_query(query),
            sort: SortKey::parse(sort),
        };
        let items = self.repo.list_memos(&list_query)?;
        Ok(MemoListResult {
            items,
            query: list_query.text,
            sort: list_query.sort,
        })
    }

    /// Deletes one memo and its tag links.
    pub fn delete_memo(&mut self, id: MemoId) -> Result<(), MemoServiceError> {
        self.repo
            .delete_memo(id)
            .inspect_err(|err| log_write_failure("memo_delete", Some(id), err))?;
        info!("event=memo_delete module=service status=ok memo_id={id}");
        Ok(())
    }
}

fn validated_draft(form: &MemoForm, event: &str) -> Result<MemoDraft, MemoServiceError> {
    MemoDraft::new(&form.title, &form.body).map_err(|err| {
        info!("event={event} module=service status=rejected reason={err:?}");
        MemoServiceError::Validation(err)
    })
}

fn log_tag_report(event: &str, id: MemoId, report: &TagAttachReport) {
    info!(
        "event={event} module=service status=ok memo_id={id} tags={} tags_created={} tags_linked={}",
        report.attachments.len(),
        report.count(AttachOutcome::Created),
        report.count(AttachOutcome::Linked)
    );
}

fn log_write_failure(event: &str, id: Option<MemoId>, err: &RepoError) {
    let memo_id = id.map_or_else(|| "-".to_string(), |value| value.to_string());
    match err {
        RepoError::NotFound(_) => {
            info!("event={event} module=service status=not_found memo_id={memo_id}");
        }
        RepoError::Validation(_) | RepoError::InvalidTag(_) => {
            info!("event={event} module=service status=rejected memo_id={memo_id}");
        }
        RepoError::TagAttach { source, .. } => {
            warn!(
                "event={event} module=service status=error memo_id={memo_id} error_code=tag_attach_failed error={source}"
            );
        }
        other => {
            warn!("event={event} module=service status=error memo_id={memo_id} error={other}");
        }
    }
}
