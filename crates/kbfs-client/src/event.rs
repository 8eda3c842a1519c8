//! Inbound events: backend notifications and user intents.
//!
//! Events are the only way to mutate the model. They are internally tagged
//! JSON (`{"type": "download_progress", ...}`) so a recorded session can be
//! replayed line by line.

use kbfs_types::{DaemonStatus, DownloadIntent, EditId, ErrorId, LocalPath, Path, RefreshTag, SortSetting, TransferId, Visibility};
use serde::{Deserialize, Serialize};

use crate::download::DownloadMeta;
use crate::error::FsError;
use crate::path_item::{Dirent, Mime};
use crate::picker::PickerSource;
use crate::tlf::{FavoriteFolder, ParticipantUnlock, UnlockDevice};
use crate::tlf_updates::TlfUpdate;
use crate::upload::SyncStatus;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FsEvent {
    // ── Backend notifications ────────────────────────────────────────────
    FavoritesLoaded {
        favorites: Vec<FavoriteFolder>,
    },
    TlfRekeyInfo {
        visibility: Visibility,
        name: String,
        #[serde(default)]
        waiting_for_participant_unlock: Option<Vec<ParticipantUnlock>>,
        #[serde(default)]
        you_can_unlock: Option<Vec<UnlockDevice>>,
    },
    FolderListLoaded {
        path: Path,
        #[serde(default)]
        entry: Option<Dirent>,
        #[serde(default)]
        children: Vec<Dirent>,
    },
    /// A `list` request came back with an error.
    FolderListFailed {
        path: Path,
        message: String,
    },
    PathItemLoaded {
        path: Path,
        entry: Dirent,
    },
    MimeTypeLoaded {
        path: Path,
        mime: Mime,
    },
    PathChanged {
        path: Path,
    },
    FullReload,
    SyncStatus {
        status: SyncStatus,
    },
    JournalWriteStarted {
        path: Path,
    },
    JournalWriteFinished {
        path: Path,
    },
    UploadFailed {
        path: Path,
        error: FsError,
    },
    RetrySucceeded {
        path: Path,
    },
    DownloadStarted {
        meta: DownloadMeta,
        started_at: u64,
    },
    DownloadProgress {
        transfer_id: TransferId,
        portion: f64,
        #[serde(default)]
        end_estimate: Option<u64>,
    },
    DownloadFinished {
        transfer_id: TransferId,
    },
    DownloadFailed {
        transfer_id: TransferId,
        message: String,
    },
    CreateFolderSucceeded {
        edit_id: EditId,
    },
    CreateFolderFailed {
        edit_id: EditId,
        message: String,
    },
    DaemonStatusChanged {
        status: DaemonStatus,
    },
    TlfUpdatesLoaded {
        #[serde(default)]
        updates: Vec<TlfUpdate>,
    },

    // ── User intents ─────────────────────────────────────────────────────
    LoadFolder {
        tag: RefreshTag,
        path: Path,
    },
    NewFolderRow {
        parent_path: Path,
        #[serde(default)]
        edit_id: Option<EditId>,
    },
    EditNameChanged {
        edit_id: EditId,
        name: String,
    },
    CommitEdit {
        edit_id: EditId,
    },
    RetryEdit {
        edit_id: EditId,
    },
    DiscardEdit {
        edit_id: EditId,
    },
    StartDownload {
        path: Path,
        #[serde(default)]
        intent: DownloadIntent,
        #[serde(default)]
        local_path: Option<LocalPath>,
    },
    CancelDownload {
        transfer_id: TransferId,
    },
    DismissDownload {
        transfer_id: TransferId,
    },
    Upload {
        local_path: LocalPath,
        parent_path: Path,
    },
    DismissUploadError {
        path: Path,
    },
    RetryUpload {
        path: Path,
    },
    SetSortSetting {
        path: Path,
        setting: SortSetting,
    },
    PickerOpen {
        source: PickerSource,
    },
    PickerNavigate {
        index: usize,
        path: Path,
    },
    PickerBackUp {
        index: usize,
    },
    PickerCopyHere {
        index: usize,
    },
    PickerMoveHere {
        index: usize,
    },
    PickerNewFolder {
        index: usize,
        #[serde(default)]
        edit_id: Option<EditId>,
    },
    PickerClose,
    DismissError {
        error_id: ErrorId,
    },
    RetryError {
        error_id: ErrorId,
    },
}

/// Part of the model an applied event may have touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeScope {
    Tlfs,
    PathItems,
    Edits,
    Downloads,
    Uploads,
    Picker,
    Settings,
    Daemon,
    Errors,
    TlfUpdates,
    /// Requests only; no state changed.
    Requests,
    /// Everything may have changed.
    All,
}

impl FsEvent {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FsEvent::FavoritesLoaded { .. } => "favorites_loaded",
            FsEvent::TlfRekeyInfo { .. } => "tlf_rekey_info",
            FsEvent::FolderListLoaded { .. } => "folder_list_loaded",
            FsEvent::FolderListFailed { .. } => "folder_list_failed",
            FsEvent::PathItemLoaded { .. } => "path_item_loaded",
            FsEvent::MimeTypeLoaded { .. } => "mime_type_loaded",
            FsEvent::PathChanged { .. } => "path_changed",
            FsEvent::FullReload => "full_reload",
            FsEvent::SyncStatus { .. } => "sync_status",
            FsEvent::JournalWriteStarted { .. } => "journal_write_started",
            FsEvent::JournalWriteFinished { .. } => "journal_write_finished",
            FsEvent::UploadFailed { .. } => "upload_failed",
            FsEvent::RetrySucceeded { .. } => "retry_succeeded",
            FsEvent::DownloadStarted { .. } => "download_started",
            FsEvent::DownloadProgress { .. } => "download_progress",
            FsEvent::DownloadFinished { .. } => "download_finished",
            FsEvent::DownloadFailed { .. } => "download_failed",
            FsEvent::CreateFolderSucceeded { .. } => "create_folder_succeeded",
            FsEvent::CreateFolderFailed { .. } => "create_folder_failed",
            FsEvent::DaemonStatusChanged { .. } => "daemon_status_changed",
            FsEvent::TlfUpdatesLoaded { .. } => "tlf_updates_loaded",
            FsEvent::LoadFolder { .. } => "load_folder",
            FsEvent::NewFolderRow { .. } => "new_folder_row",
            FsEvent::EditNameChanged { .. } => "edit_name_changed",
            FsEvent::CommitEdit { .. } => "commit_edit",
            FsEvent::RetryEdit { .. } => "retry_edit",
            FsEvent::DiscardEdit { .. } => "discard_edit",
            FsEvent::StartDownload { .. } => "start_download",
            FsEvent::CancelDownload { .. } => "cancel_download",
            FsEvent::DismissDownload { .. } => "dismiss_download",
            FsEvent::Upload { .. } => "upload",
            FsEvent::DismissUploadError { .. } => "dismiss_upload_error",
            FsEvent::RetryUpload { .. } => "retry_upload",
            FsEvent::SetSortSetting { .. } => "set_sort_setting",
            FsEvent::PickerOpen { .. } => "picker_open",
            FsEvent::PickerNavigate { .. } => "picker_navigate",
            FsEvent::PickerBackUp { .. } => "picker_back_up",
            FsEvent::PickerCopyHere { .. } => "picker_copy_here",
            FsEvent::PickerMoveHere { .. } => "picker_move_here",
            FsEvent::PickerNewFolder { .. } => "picker_new_folder",
            FsEvent::PickerClose => "picker_close",
            FsEvent::DismissError { .. } => "dismiss_error",
            FsEvent::RetryError { .. } => "retry_error",
        }
    }

    pub fn scope(&self) -> ChangeScope {
        match self {
            FsEvent::FavoritesLoaded { .. } | FsEvent::TlfRekeyInfo { .. } => ChangeScope::Tlfs,
            FsEvent::FolderListLoaded { .. }
            | FsEvent::PathItemLoaded { .. }
            | FsEvent::MimeTypeLoaded { .. }
            | FsEvent::LoadFolder { .. } => ChangeScope::PathItems,
            FsEvent::PathChanged { .. }
            | FsEvent::StartDownload { .. }
            | FsEvent::Upload { .. } => ChangeScope::Requests,
            FsEvent::FullReload => ChangeScope::All,
            FsEvent::SyncStatus { .. }
            | FsEvent::JournalWriteStarted { .. }
            | FsEvent::JournalWriteFinished { .. }
            | FsEvent::UploadFailed { .. }
            | FsEvent::RetrySucceeded { .. }
            | FsEvent::DismissUploadError { .. }
            | FsEvent::RetryUpload { .. } => ChangeScope::Uploads,
            FsEvent::DownloadStarted { .. }
            | FsEvent::DownloadProgress { .. }
            | FsEvent::DownloadFinished { .. }
            | FsEvent::DownloadFailed { .. }
            | FsEvent::CancelDownload { .. }
            | FsEvent::DismissDownload { .. } => ChangeScope::Downloads,
            FsEvent::CreateFolderSucceeded { .. }
            | FsEvent::CreateFolderFailed { .. }
            | FsEvent::NewFolderRow { .. }
            | FsEvent::EditNameChanged { .. }
            | FsEvent::CommitEdit { .. }
            | FsEvent::RetryEdit { .. }
            | FsEvent::DiscardEdit { .. }
            | FsEvent::PickerNewFolder { .. } => ChangeScope::Edits,
            FsEvent::DaemonStatusChanged { .. } => ChangeScope::Daemon,
            FsEvent::TlfUpdatesLoaded { .. } => ChangeScope::TlfUpdates,
            FsEvent::FolderListFailed { .. }
            | FsEvent::DismissError { .. }
            | FsEvent::RetryError { .. } => ChangeScope::Errors,
            FsEvent::SetSortSetting { .. } => ChangeScope::Settings,
            FsEvent::PickerOpen { .. }
            | FsEvent::PickerNavigate { .. }
            | FsEvent::PickerBackUp { .. }
            | FsEvent::PickerCopyHere { .. }
            | FsEvent::PickerMoveHere { .. }
            | FsEvent::PickerClose => ChangeScope::Picker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_parse_from_json_lines() {
        let ev: FsEvent = serde_json::from_str(
            r#"{"type":"download_progress","transfer_id":"t1","portion":0.25}"#,
        )
        .unwrap();
        assert_eq!(ev.kind(), "download_progress");
        assert_eq!(ev.scope(), ChangeScope::Downloads);

        let ev: FsEvent = serde_json::from_str(
            r#"{"type":"load_folder","tag":"primary-view","path":"/keybase/team/acme/"}"#,
        )
        .unwrap();
        assert_eq!(
            ev,
            FsEvent::LoadFolder {
                tag: RefreshTag::PrimaryView,
                path: Path::parse("/keybase/team/acme").unwrap(),
            }
        );

        let ev: FsEvent = serde_json::from_str(
            r#"{"type":"picker_open","source":{"type":"move-or-copy","path":"/keybase/private/alice/a"}}"#,
        )
        .unwrap();
        assert_eq!(ev.scope(), ChangeScope::Picker);
    }

    #[test]
    fn test_bad_paths_are_rejected_at_decode() {
        let res = serde_json::from_str::<FsEvent>(r#"{"type":"path_changed","path":"/etc"}"#);
        assert!(res.is_err());
        let res = serde_json::from_str::<FsEvent>(r#"{"type":"no_such_event"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_tlf_updates_event_decodes() {
        let ev: FsEvent = serde_json::from_str(
            r#"{"type":"tlf_updates_loaded","updates":[{"path":"/keybase/team/acme","writer":"bob","serverTime":7,
                "history":[{"filename":"/keybase/team/acme/plan.md","serverTime":7,"editType":"created"}]}]}"#,
        )
        .unwrap();
        assert_eq!(ev.kind(), "tlf_updates_loaded");
        assert_eq!(ev.scope(), ChangeScope::TlfUpdates);
        let FsEvent::TlfUpdatesLoaded { updates } = ev else {
            panic!("wrong variant");
        };
        assert_eq!(updates[0].history.len(), 1);
    }
}
