//! Outbound requests to the backend filesystem service.
//!
//! The model never performs I/O. Every state change that needs the backend
//! yields an [`FsRequest`]; the backend answers later with an
//! [`FsEvent`](crate::FsEvent).

use kbfs_types::{DownloadIntent, EditId, LocalPath, Path, TransferId};
use serde::{Deserialize, Serialize};

/// Where a copy reads from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopySource {
    Path(Path),
    Local(LocalPath),
}

/// Closed set of requests the model hands to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FsRequest {
    LoadFavorites,
    List {
        path: Path,
    },
    CreateFolder {
        edit_id: EditId,
        parent_path: Path,
        name: String,
    },
    StartDownload {
        path: Path,
        intent: DownloadIntent,
        local_path: Option<LocalPath>,
    },
    CancelDownload {
        transfer_id: TransferId,
    },
    Upload {
        local_path: LocalPath,
        parent_path: Path,
    },
    Move {
        source: Path,
        destination_parent_path: Path,
    },
    Copy {
        source: CopySource,
        destination_parent_path: Path,
    },
}

impl FsRequest {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FsRequest::LoadFavorites => "load_favorites",
            FsRequest::List { .. } => "list",
            FsRequest::CreateFolder { .. } => "create_folder",
            FsRequest::StartDownload { .. } => "start_download",
            FsRequest::CancelDownload { .. } => "cancel_download",
            FsRequest::Upload { .. } => "upload",
            FsRequest::Move { .. } => "move",
            FsRequest::Copy { .. } => "copy",
        }
    }
}
