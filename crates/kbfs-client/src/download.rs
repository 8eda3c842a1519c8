//! Download tracking.
//!
//! A download is `Running` until the first of done, canceled or errored
//! arrives; that terminal state is write-once. Progress is applied only
//! while running and only if it does not go backwards. Cancellation is
//! optimistic: the local state flips to canceled immediately and a
//! `cancel_download` request goes to the backend, whose later completion
//! signals are then ignored.

use std::collections::BTreeMap;

use kbfs_types::{DownloadIntent, LocalPath, Path, PathType, TransferId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::FsError;
use crate::request::FsRequest;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadMeta {
    pub entry_type: PathType,
    pub intent: DownloadIntent,
    pub path: Path,
    pub local_path: LocalPath,
    #[serde(rename = "transferID")]
    pub transfer_id: TransferId,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadState {
    pub canceled: bool,
    pub complete_portion: f64,
    pub end_estimate: Option<u64>,
    pub error: Option<FsError>,
    pub is_done: bool,
    pub started_at: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadPhase {
    Running,
    Done,
    Canceled,
    Errored,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Download {
    pub meta: DownloadMeta,
    pub state: DownloadState,
}

impl Download {
    pub fn phase(&self) -> DownloadPhase {
        if self.state.canceled {
            DownloadPhase::Canceled
        } else if self.state.error.is_some() {
            DownloadPhase::Errored
        } else if self.state.is_done {
            DownloadPhase::Done
        } else {
            DownloadPhase::Running
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase() != DownloadPhase::Running
    }
}

/// What happened to a progress or terminal signal.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Applied,
    Ignored { reason: IgnoreReason },
}

#[derive(Debug, Clone, PartialEq)]
pub enum IgnoreReason {
    /// The download already reached this terminal phase.
    Terminal(DownloadPhase),
    /// The reported portion is below the current one.
    Regressed { current: f64, offered: f64 },
    /// The reported portion is NaN or infinite.
    NotFinite,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error("no download {0}")]
    NotFound(TransferId),

    #[error("download {0} already started")]
    Duplicate(TransferId),

    #[error("download {0} is still running")]
    StillRunning(TransferId),
}

pub type DownloadResult<T> = Result<T, DownloadError>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DownloadEngine {
    downloads: BTreeMap<TransferId, Download>,
}

impl DownloadEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &TransferId) -> Option<&Download> {
        self.downloads.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TransferId, &Download)> {
        self.downloads.iter()
    }

    pub fn len(&self) -> usize {
        self.downloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.downloads.is_empty()
    }

    pub fn start(&mut self, meta: DownloadMeta, started_at: u64) -> DownloadResult<()> {
        if self.downloads.contains_key(&meta.transfer_id) {
            return Err(DownloadError::Duplicate(meta.transfer_id));
        }
        let state = DownloadState {
            started_at,
            ..Default::default()
        };
        self.downloads.insert(meta.transfer_id.clone(), Download { meta, state });
        Ok(())
    }

    fn running(&mut self, id: &TransferId) -> DownloadResult<Result<&mut Download, IgnoreReason>> {
        let download = self
            .downloads
            .get_mut(id)
            .ok_or_else(|| DownloadError::NotFound(id.clone()))?;
        match download.phase() {
            DownloadPhase::Running => Ok(Ok(download)),
            phase => {
                debug!(transfer = %id, ?phase, "signal after terminal state ignored");
                Ok(Err(IgnoreReason::Terminal(phase)))
            }
        }
    }

    pub fn progress(
        &mut self,
        id: &TransferId,
        portion: f64,
        end_estimate: Option<u64>,
    ) -> DownloadResult<DownloadOutcome> {
        let download = match self.running(id)? {
            Ok(download) => download,
            Err(reason) => return Ok(DownloadOutcome::Ignored { reason }),
        };
        if !portion.is_finite() {
            return Ok(DownloadOutcome::Ignored {
                reason: IgnoreReason::NotFinite,
            });
        }
        let portion = portion.clamp(0.0, 1.0);
        let current = download.state.complete_portion;
        if portion < current {
            debug!(transfer = %id, current, offered = portion, "regressing progress ignored");
            return Ok(DownloadOutcome::Ignored {
                reason: IgnoreReason::Regressed {
                    current,
                    offered: portion,
                },
            });
        }
        download.state.complete_portion = portion;
        download.state.end_estimate = end_estimate;
        Ok(DownloadOutcome::Applied)
    }

    pub fn finish(&mut self, id: &TransferId) -> DownloadResult<DownloadOutcome> {
        Ok(match self.running(id)? {
            Ok(download) => {
                download.state.is_done = true;
                download.state.complete_portion = 1.0;
                download.state.end_estimate = None;
                DownloadOutcome::Applied
            }
            Err(reason) => DownloadOutcome::Ignored { reason },
        })
    }

    pub fn fail(&mut self, id: &TransferId, error: FsError) -> DownloadResult<DownloadOutcome> {
        Ok(match self.running(id)? {
            Ok(download) => {
                download.state.error = Some(error);
                download.state.end_estimate = None;
                DownloadOutcome::Applied
            }
            Err(reason) => DownloadOutcome::Ignored { reason },
        })
    }

    /// Mark canceled and return the request for the backend. `None` when the
    /// download already reached a terminal state.
    pub fn cancel(&mut self, id: &TransferId) -> DownloadResult<Option<FsRequest>> {
        Ok(match self.running(id)? {
            Ok(download) => {
                download.state.canceled = true;
                download.state.end_estimate = None;
                Some(FsRequest::CancelDownload {
                    transfer_id: id.clone(),
                })
            }
            Err(_) => None,
        })
    }

    /// Remove a download whose terminal state the renderer has shown.
    pub fn dismiss(&mut self, id: &TransferId) -> DownloadResult<Download> {
        let download = self
            .downloads
            .get(id)
            .ok_or_else(|| DownloadError::NotFound(id.clone()))?;
        if !download.is_terminal() {
            return Err(DownloadError::StillRunning(id.clone()));
        }
        self.downloads
            .remove(id)
            .ok_or_else(|| DownloadError::NotFound(id.clone()))
    }
}
