//! Backend failure records.
//!
//! An [`FsError`] is data, not a Rust error: it lives inside component state
//! (a failed download, an upload error, an [`ErrorLedger`] entry) so the
//! renderer can show it and offer a retry. Illegal operations on components
//! are reported with each component's own `thiserror` enum instead.

use std::collections::BTreeMap;

use kbfs_types::ErrorId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::request::FsRequest;

/// A backend failure attached to the request that caused it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsError {
    /// Unix milliseconds when the failure was recorded.
    pub time: u64,
    pub message: String,
    pub errored_action: FsRequest,
    /// Request to resend on retry, if the failure is retriable.
    pub retriable_action: Option<FsRequest>,
}

impl FsError {
    /// A failure that cannot be retried.
    pub fn new(message: impl Into<String>, errored_action: FsRequest) -> Self {
        Self {
            time: kbfs_types::now_millis(),
            message: message.into(),
            errored_action,
            retriable_action: None,
        }
    }

    /// A failure whose triggering request can simply be resent.
    pub fn retriable(message: impl Into<String>, errored_action: FsRequest) -> Self {
        let retriable_action = Some(errored_action.clone());
        Self {
            retriable_action,
            ..Self::new(message, errored_action)
        }
    }

    pub fn at(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    pub fn is_retriable(&self) -> bool {
        self.retriable_action.is_some()
    }
}

impl std::fmt::Display for FsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.errored_action.kind(), self.message)
    }
}

// ============================================================================
// ErrorLedger
// ============================================================================

/// Failures that belong to no transfer or edit, such as a folder listing
/// that never arrived. Entries stay until dismissed, retried, or resolved by
/// a later success of the same request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorLedger {
    errors: BTreeMap<ErrorId, FsError>,
}

impl ErrorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ErrorId) -> Option<&FsError> {
        self.errors.get(&id)
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (&ErrorId, &FsError)> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn record(&mut self, error: FsError) -> ErrorId {
        let id = ErrorId::new();
        debug!(error = ?id, action = error.errored_action.kind(), "error recorded");
        self.errors.insert(id, error);
        id
    }

    pub fn dismiss(&mut self, id: ErrorId) -> Option<FsError> {
        self.errors.remove(&id)
    }

    /// Remove a retriable entry and return the request to resend. A
    /// non-retriable entry stays in place and yields `None`.
    pub fn retry(&mut self, id: ErrorId) -> Option<FsRequest> {
        let action = self.errors.get(&id)?.retriable_action.clone()?;
        self.errors.remove(&id);
        Some(action)
    }

    /// Drop every entry raised by `request`, now that it went through.
    pub fn resolve(&mut self, request: &FsRequest) -> usize {
        let before = self.errors.len();
        self.errors.retain(|_, e| &e.errored_action != request);
        before - self.errors.len()
    }
}
