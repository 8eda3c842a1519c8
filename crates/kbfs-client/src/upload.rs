//! Upload and journal sync tracking.
//!
//! The aggregate sync fields are replaced wholesale by each status
//! notification; only the per-path error ledger and the journal write set
//! are maintained incrementally.

use std::collections::{BTreeMap, BTreeSet};

use kbfs_types::Path;
use serde::{Deserialize, Serialize};

use crate::error::FsError;
use crate::request::FsRequest;

/// A journal sync status notification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    #[serde(default)]
    pub syncing_paths: Vec<Path>,
    #[serde(default)]
    pub total_syncing_bytes: u64,
    pub end_estimate: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Uploads {
    pub writing_to_journal: BTreeSet<Path>,
    pub errors: BTreeMap<Path, FsError>,
    pub total_syncing_bytes: u64,
    pub end_estimate: Option<u64>,
    pub syncing_paths: BTreeSet<Path>,
    #[serde(skip)]
    pending_retries: BTreeSet<Path>,
}

impl Uploads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal_write_started(&mut self, path: Path) -> bool {
        self.writing_to_journal.insert(path)
    }

    pub fn journal_write_finished(&mut self, path: &Path) -> bool {
        self.writing_to_journal.remove(path)
    }

    pub fn apply_sync_status(&mut self, status: SyncStatus) {
        self.syncing_paths = status.syncing_paths.into_iter().collect();
        self.total_syncing_bytes = status.total_syncing_bytes;
        self.end_estimate = status.end_estimate;
    }

    /// Record (or replace) the error for a path. Any pending retry of the
    /// previous error is dropped.
    pub fn record_error(&mut self, path: Path, error: FsError) {
        self.pending_retries.remove(&path);
        self.errors.insert(path, error);
    }

    pub fn dismiss_error(&mut self, path: &Path) -> Option<FsError> {
        self.pending_retries.remove(path);
        self.errors.remove(path)
    }

    /// The stored retriable request, marking a retry as pending. `None` when
    /// there is no error or it is not retriable.
    pub fn retry(&mut self, path: &Path) -> Option<FsRequest> {
        let action = self.errors.get(path)?.retriable_action.clone()?;
        self.pending_retries.insert(path.clone());
        Some(action)
    }

    /// Clear the error once its retry went through. Ignored unless a retry
    /// for that path is pending.
    pub fn retry_succeeded(&mut self, path: &Path) -> bool {
        if !self.pending_retries.remove(path) {
            return false;
        }
        self.errors.remove(path).is_some()
    }

    pub fn is_retry_pending(&self, path: &Path) -> bool {
        self.pending_retries.contains(path)
    }

    /// Whether the path is being written to the journal or synced.
    pub fn is_uploading(&self, path: &Path) -> bool {
        self.writing_to_journal.contains(path) || self.syncing_paths.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbfs_types::LocalPath;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn upload_error(path: &Path) -> FsError {
        FsError::retriable(
            "quota",
            FsRequest::Upload {
                local_path: LocalPath::new("/tmp/a.txt"),
                parent_path: path.parent(),
            },
        )
    }

    #[test]
    fn test_sync_status_is_wholesale() {
        let mut up = Uploads::new();
        up.apply_sync_status(SyncStatus {
            syncing_paths: vec![p("/keybase/private/alice/a"), p("/keybase/private/alice/b")],
            total_syncing_bytes: 2048,
            end_estimate: Some(50),
        });
        assert_eq!(up.syncing_paths.len(), 2);
        assert!(up.is_uploading(&p("/keybase/private/alice/a")));

        up.apply_sync_status(SyncStatus::default());
        assert!(up.syncing_paths.is_empty());
        assert_eq!(up.total_syncing_bytes, 0);
        assert_eq!(up.end_estimate, None);
    }

    #[test]
    fn test_journal_writes() {
        let mut up = Uploads::new();
        let path = p("/keybase/team/acme/x");
        assert!(up.journal_write_started(path.clone()));
        assert!(up.is_uploading(&path));
        assert!(up.journal_write_finished(&path));
        assert!(!up.journal_write_finished(&path));
    }

    #[test]
    fn test_retry_ledger() {
        let mut up = Uploads::new();
        let path = p("/keybase/private/alice/a.txt");
        assert_eq!(up.retry(&path), None);

        up.record_error(path.clone(), upload_error(&path));
        assert!(!up.retry_succeeded(&path));
        assert!(up.errors.contains_key(&path));

        let action = up.retry(&path).unwrap();
        assert!(matches!(action, FsRequest::Upload { .. }));
        assert!(up.is_retry_pending(&path));
        assert!(up.retry_succeeded(&path));
        assert!(up.errors.is_empty());
    }

    #[test]
    fn test_non_retriable_and_dismiss() {
        let mut up = Uploads::new();
        let path = p("/keybase/private/alice/b.txt");
        up.record_error(path.clone(), FsError::new("denied", FsRequest::LoadFavorites));
        assert_eq!(up.retry(&path), None);
        assert!(!up.is_retry_pending(&path));
        assert!(up.dismiss_error(&path).is_some());
        assert!(up.dismiss_error(&path).is_none());
    }
}
