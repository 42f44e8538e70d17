//! Repositories over the document store.
//!
//! Store calls run on the blocking pool. Reads race against the caller's
//! [`FetchScope`] and a deadline; the outcome is classified here so that a
//! caller going away is never reported as a failure.

mod appointments;
mod patients;
mod scope;

pub use appointments::*;
pub use patients::*;
pub use scope::*;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error};

use crate::store::{Document, DocumentStore, StoreError, StoreResult};

/// Default deadline for a read.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Repository errors.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Load failed: {0}")]
    LoadFailed(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl From<StoreError> for RepoError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Cancelled => RepoError::Cancelled,
            StoreError::NotFound { collection, id } => {
                RepoError::NotFound(format!("{}/{}", collection, id))
            }
            StoreError::PermissionDenied(msg) => RepoError::PermissionDenied(msg),
            StoreError::Unavailable(msg) => RepoError::StoreUnavailable(msg),
            StoreError::Json(e) => RepoError::Serialization(e),
            other @ (StoreError::InvalidQuery(_) | StoreError::Sqlite(_)) => {
                RepoError::StoreUnavailable(other.to_string())
            }
        }
    }
}

impl RepoError {
    /// Validation error naming the blank required fields.
    pub fn missing_fields(fields: &[&str]) -> Self {
        RepoError::Validation(format!(
            "Please fill in all required fields: {}",
            fields.join(", ")
        ))
    }

    /// Cancellations are expected and never shown to the user.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, RepoError::Cancelled)
    }

    /// Text to show the user.
    pub fn user_message(&self) -> String {
        match self {
            RepoError::Validation(msg) | RepoError::LoadFailed(msg) => msg.clone(),
            RepoError::NotFound(_) => "The requested record no longer exists.".into(),
            RepoError::Cancelled => "Request was interrupted. Please try again.".into(),
            RepoError::StoreUnavailable(_) => {
                "Network error. Please check your connection and try again.".into()
            }
            RepoError::PermissionDenied(_) => {
                "Permission denied. Please check the database access rules.".into()
            }
            RepoError::Serialization(_) => "A stored record could not be read.".into(),
        }
    }
}

/// Repository tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryOptions {
    /// Deadline for each read before it is reported as `LoadFailed`.
    pub load_timeout: Duration,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }
}

/// Result of a read that its caller may have walked away from.
pub(crate) enum Fetched<T> {
    Ready(T),
    Abandoned,
}

impl<T: Default> Fetched<T> {
    /// Abandoned reads collapse to the empty value.
    pub(crate) fn or_empty(self) -> T {
        match self {
            Fetched::Ready(value) => value,
            Fetched::Abandoned => T::default(),
        }
    }
}

/// Shared store access for the repositories.
#[derive(Clone)]
pub(crate) struct StoreHandle {
    store: Arc<dyn DocumentStore>,
    options: RepositoryOptions,
}

impl StoreHandle {
    pub(crate) fn new(store: Arc<dyn DocumentStore>, options: RepositoryOptions) -> Self {
        Self { store, options }
    }

    async fn blocking<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&dyn DocumentStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| {
                if e.is_cancelled() {
                    StoreError::Cancelled
                } else {
                    StoreError::Unavailable(format!("store task failed: {}", e))
                }
            })?
    }

    /// Run a write. Writes have no deadline and no caller scope.
    pub(crate) async fn write<T, F>(&self, what: &'static str, op: F) -> RepoResult<T>
    where
        F: FnOnce(&dyn DocumentStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.blocking(op).await.map_err(|e| {
            if matches!(e, StoreError::Cancelled) {
                debug!(what, "write cancelled");
            } else {
                error!(what, error = %e, "store write failed");
            }
            e.into()
        })
    }

    /// Run a read bounded by the caller's scope and the load deadline.
    pub(crate) async fn read<T, F>(
        &self,
        scope: &FetchScope,
        what: &'static str,
        op: F,
    ) -> RepoResult<Fetched<T>>
    where
        F: FnOnce(&dyn DocumentStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        if scope.is_ended() {
            debug!(what, "fetch skipped, caller already gone");
            return Ok(Fetched::Abandoned);
        }

        let deadline = self.options.load_timeout;
        let fetch = tokio::time::timeout(deadline, self.blocking(op));

        tokio::select! {
            biased;
            _ = scope.ended() => {
                debug!(what, "fetch abandoned by caller");
                Ok(Fetched::Abandoned)
            }
            outcome = fetch => match outcome {
                Err(_) => {
                    error!(what, ?deadline, "store request timed out");
                    Err(RepoError::LoadFailed(format!(
                        "Failed to load {}. Please check your internet connection and try again.",
                        what
                    )))
                }
                Ok(Err(StoreError::Cancelled)) => {
                    debug!(what, "fetch cancelled by store");
                    Ok(Fetched::Abandoned)
                }
                Ok(Err(e)) => {
                    error!(what, error = %e, "store read failed");
                    Err(e.into())
                }
                Ok(Ok(value)) => Ok(Fetched::Ready(value)),
            },
        }
    }
}

/// Decode every document, failing on the first malformed one.
pub(crate) fn decode_all<T: serde::de::DeserializeOwned>(docs: Vec<Document>) -> RepoResult<Vec<T>> {
    docs.into_iter()
        .map(Document::decode)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}
