//! The aggregate model and its single mutation entry point.
//!
//! [`FsState::apply`] consumes one [`FsEvent`] and returns the requests the
//! backend must execute. Rejected events (an illegal edit transition, a
//! progress report for an unknown transfer, a picker action that is not
//! permitted) are logged and dropped; they never propagate out of the model.

use std::collections::BTreeMap;

use kbfs_types::{DaemonStatus, EditId, ErrorId, Path, RefreshTag, TransferId};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ModelConfig;
use crate::constants::NEW_FOLDER_BASE_NAME;
use crate::download::{DownloadEngine, DownloadError, DownloadOutcome};
use crate::edit::{EditEngine, EditError};
use crate::error::{ErrorLedger, FsError};
use crate::event::FsEvent;
use crate::path_item::{PathItem, PathItemCache};
use crate::picker::{DestinationPicker, PickerError, PickerNavigator};
use crate::refresh::RefreshInterest;
use crate::request::FsRequest;
use crate::settings::PathUserSettings;
use crate::tlf::TlfRegistry;
use crate::tlf_updates::TlfUpdates;
use crate::upload::Uploads;

/// Why an event was dropped.
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Picker(#[from] PickerError),

    #[error("unknown tlf {0}")]
    UnknownTlf(String),

    #[error("no error {0}")]
    UnknownError(ErrorId),

    #[error("error {0} has no retriable action")]
    NotRetriable(ErrorId),
}

#[derive(Debug)]
pub struct FsState {
    tlfs: TlfRegistry,
    path_items: PathItemCache,
    edits: EditEngine,
    downloads: DownloadEngine,
    uploads: Uploads,
    picker: PickerNavigator,
    refresh: RefreshInterest,
    settings: PathUserSettings,
    daemon_status: DaemonStatus,
    errors: ErrorLedger,
    tlf_updates: TlfUpdates,
}

impl Default for FsState {
    fn default() -> Self {
        Self::new(&ModelConfig::default())
    }
}

impl FsState {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            tlfs: TlfRegistry::new(),
            path_items: PathItemCache::new(),
            edits: EditEngine::new(),
            downloads: DownloadEngine::new(),
            uploads: Uploads::new(),
            picker: PickerNavigator::new(config.picker_single_pane),
            refresh: RefreshInterest::new(),
            settings: PathUserSettings::new(config.default_sort),
            daemon_status: DaemonStatus::Unknown,
            errors: ErrorLedger::new(),
            tlf_updates: TlfUpdates::new(),
        }
    }

    // ── Read access ──────────────────────────────────────────────────────

    pub fn tlfs(&self) -> &TlfRegistry {
        &self.tlfs
    }

    pub fn path_items(&self) -> &PathItemCache {
        &self.path_items
    }

    /// Shorthand for `path_items().get(path)`, owned.
    pub fn path_item(&self, path: &Path) -> PathItem {
        self.path_items.get(path).into_owned()
    }

    pub fn edits(&self) -> &EditEngine {
        &self.edits
    }

    pub fn downloads(&self) -> &DownloadEngine {
        &self.downloads
    }

    pub fn uploads(&self) -> &Uploads {
        &self.uploads
    }

    pub fn picker(&self) -> &PickerNavigator {
        &self.picker
    }

    pub fn refresh(&self) -> &RefreshInterest {
        &self.refresh
    }

    pub fn settings(&self) -> &PathUserSettings {
        &self.settings
    }

    pub fn daemon_status(&self) -> DaemonStatus {
        self.daemon_status
    }

    pub fn errors(&self) -> &ErrorLedger {
        &self.errors
    }

    pub fn tlf_updates(&self) -> &TlfUpdates {
        &self.tlf_updates
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            daemon_status: self.daemon_status,
            tlfs: self.tlfs.clone(),
            path_items: self.path_items.snapshot(),
            edits: self.edits.clone(),
            downloads: self.downloads.clone(),
            uploads: self.uploads.clone(),
            picker: self.picker.picker().cloned(),
            errors: self.errors.clone(),
            tlf_updates: self.tlf_updates.clone(),
        }
    }

    // ── Mutation ─────────────────────────────────────────────────────────

    /// Apply one event. Returns the requests to hand to the backend.
    #[tracing::instrument(skip_all, name = "state.apply", fields(event = event.kind()))]
    pub fn apply(&mut self, event: FsEvent) -> Vec<FsRequest> {
        match self.try_apply(event) {
            Ok(requests) => requests,
            Err(e) => {
                warn!(error = %e, "event rejected");
                Vec::new()
            }
        }
    }

    fn try_apply(&mut self, event: FsEvent) -> Result<Vec<FsRequest>, StateError> {
        let mut out = Vec::new();
        match event {
            // ── Backend notifications ────────────────────────────────
            FsEvent::FavoritesLoaded { favorites } => {
                let stored = self.tlfs.replace_all(&favorites);
                let seeded = self.path_items.seed_favorites(&self.tlfs);
                self.path_items.refresh_writability(&self.tlfs);
                info!(stored, seeded, "favorites loaded");
            }
            FsEvent::TlfRekeyInfo {
                visibility,
                name,
                waiting_for_participant_unlock,
                you_can_unlock,
            } => {
                if !self.tlfs.set_rekey_info(
                    visibility,
                    &name,
                    waiting_for_participant_unlock,
                    you_can_unlock,
                ) {
                    return Err(StateError::UnknownTlf(format!("{visibility}/{name}")));
                }
            }
            FsEvent::FolderListLoaded {
                path,
                entry,
                children,
            } => {
                self.path_items
                    .apply_listing(&path, entry.as_ref(), &children, &self.tlfs);
                self.refresh.satisfy(&path);
                self.errors.resolve(&FsRequest::List { path });
            }
            FsEvent::FolderListFailed { path, message } => {
                // Clear the in-flight mark so later changes reload this path.
                self.refresh.satisfy(&path);
                let id = self
                    .errors
                    .record(FsError::retriable(message, FsRequest::List { path: path.clone() }));
                warn!(%path, error = %id, "folder list failed");
            }
            FsEvent::PathItemLoaded { path, entry } => {
                self.path_items.apply_entry(&path, &entry, &self.tlfs);
            }
            FsEvent::MimeTypeLoaded { path, mime } => {
                if !self.path_items.set_mime(&path, mime) {
                    debug!(%path, "mime for non-file ignored");
                }
            }
            FsEvent::PathChanged { path } => {
                out.extend(
                    self.refresh
                        .affected_by(&path)
                        .into_iter()
                        .map(|path| FsRequest::List { path }),
                );
            }
            FsEvent::FullReload => {
                self.path_items.invalidate_all();
                self.refresh.clear_loading();
                info!("full reload");
                out.push(FsRequest::LoadFavorites);
                out.extend(
                    self.refresh
                        .affected_by(&Path::root())
                        .into_iter()
                        .map(|path| FsRequest::List { path }),
                );
            }
            FsEvent::SyncStatus { status } => self.uploads.apply_sync_status(status),
            FsEvent::JournalWriteStarted { path } => {
                self.uploads.journal_write_started(path);
            }
            FsEvent::JournalWriteFinished { path } => {
                self.uploads.journal_write_finished(&path);
            }
            FsEvent::UploadFailed { path, error } => self.uploads.record_error(path, error),
            FsEvent::RetrySucceeded { path } => {
                if !self.uploads.retry_succeeded(&path) {
                    debug!(%path, "retry success without pending retry");
                }
            }
            FsEvent::DownloadStarted { meta, started_at } => {
                self.downloads.start(meta, started_at)?;
            }
            FsEvent::DownloadProgress {
                transfer_id,
                portion,
                end_estimate,
            } => {
                let outcome = self.downloads.progress(&transfer_id, portion, end_estimate)?;
                log_ignored(&transfer_id, &outcome);
            }
            FsEvent::DownloadFinished { transfer_id } => {
                let outcome = self.downloads.finish(&transfer_id)?;
                log_ignored(&transfer_id, &outcome);
            }
            FsEvent::DownloadFailed {
                transfer_id,
                message,
            } => {
                let meta = &self
                    .downloads
                    .get(&transfer_id)
                    .ok_or_else(|| DownloadError::NotFound(transfer_id.clone()))?
                    .meta;
                let error = FsError::retriable(
                    message,
                    FsRequest::StartDownload {
                        path: meta.path.clone(),
                        intent: meta.intent,
                        local_path: Some(meta.local_path.clone()),
                    },
                );
                let outcome = self.downloads.fail(&transfer_id, error)?;
                log_ignored(&transfer_id, &outcome);
            }
            FsEvent::CreateFolderSucceeded { edit_id } => {
                let edit = self.edits.on_success(edit_id)?;
                out.push(FsRequest::List {
                    path: edit.parent_path,
                });
            }
            FsEvent::CreateFolderFailed { edit_id, message } => {
                self.edits.on_failure(edit_id, message)?;
            }
            FsEvent::DaemonStatusChanged { status } => {
                let was = std::mem::replace(&mut self.daemon_status, status);
                if was != status {
                    info!(%was, now = %status, "daemon status changed");
                }
                if status == DaemonStatus::Connected && was != DaemonStatus::Connected {
                    out.push(FsRequest::LoadFavorites);
                }
            }
            FsEvent::TlfUpdatesLoaded { updates } => {
                self.tlf_updates.replace(updates);
                debug!(count = self.tlf_updates.len(), "tlf updates loaded");
            }

            // ── User intents ─────────────────────────────────────────
            FsEvent::LoadFolder { tag, path } => {
                self.refresh.register(tag, path.clone());
                self.path_items.mark_pending(&path);
                // An explicit load always lists, even with a reload in flight.
                self.refresh.mark_loading(tag, &path);
                out.push(FsRequest::List { path });
            }
            FsEvent::NewFolderRow {
                parent_path,
                edit_id,
            } => {
                self.new_folder_row(parent_path, edit_id)?;
            }
            FsEvent::EditNameChanged { edit_id, name } => self.edits.set_name(edit_id, name)?,
            FsEvent::CommitEdit { edit_id } => out.push(self.edits.commit(edit_id)?),
            FsEvent::RetryEdit { edit_id } => out.push(self.edits.retry(edit_id)?),
            FsEvent::DiscardEdit { edit_id } => {
                self.edits.cancel(edit_id)?;
            }
            FsEvent::StartDownload {
                path,
                intent,
                local_path,
            } => out.push(FsRequest::StartDownload {
                path,
                intent,
                local_path,
            }),
            FsEvent::CancelDownload { transfer_id } => {
                out.extend(self.downloads.cancel(&transfer_id)?);
            }
            FsEvent::DismissDownload { transfer_id } => {
                self.downloads.dismiss(&transfer_id)?;
            }
            FsEvent::Upload {
                local_path,
                parent_path,
            } => out.push(FsRequest::Upload {
                local_path,
                parent_path,
            }),
            FsEvent::DismissUploadError { path } => {
                self.uploads.dismiss_error(&path);
            }
            FsEvent::RetryUpload { path } => out.extend(self.uploads.retry(&path)),
            FsEvent::SetSortSetting { path, setting } => {
                self.settings.set_sort_setting(path, setting)
            }
            FsEvent::PickerOpen { source } => self.picker.open(source),
            FsEvent::PickerNavigate { index, path } => self.picker.navigate(index, path)?,
            FsEvent::PickerBackUp { index } => {
                self.picker.back_up(index)?;
            }
            FsEvent::PickerCopyHere { index } => {
                out.push(self.picker.copy_here(index, &self.path_items)?);
            }
            FsEvent::PickerMoveHere { index } => {
                out.push(self.picker.move_here(index, &self.path_items)?);
            }
            FsEvent::PickerNewFolder { index, edit_id } => {
                let parent = self.picker.new_folder(index, &self.path_items)?;
                self.new_folder_row(parent, edit_id)?;
            }
            FsEvent::PickerClose => {
                self.picker.close();
            }
            FsEvent::DismissError { error_id } => {
                self.errors
                    .dismiss(error_id)
                    .ok_or(StateError::UnknownError(error_id))?;
            }
            FsEvent::RetryError { error_id } => {
                if self.errors.get(error_id).is_none() {
                    return Err(StateError::UnknownError(error_id));
                }
                let request = self
                    .errors
                    .retry(error_id)
                    .ok_or(StateError::NotRetriable(error_id))?;
                out.push(request);
            }
        }
        Ok(out)
    }

    fn new_folder_row(&mut self, parent: Path, edit_id: Option<EditId>) -> Result<EditId, StateError> {
        let name = self.path_items.unique_child_name(&parent, NEW_FOLDER_BASE_NAME);
        let id = match edit_id {
            Some(id) => {
                self.edits.insert(id, parent, name)?;
                id
            }
            None => self.edits.create(parent, name),
        };
        Ok(id)
    }

    /// Paths currently remembered for each refresh tag.
    pub fn refresh_targets(&self) -> BTreeMap<RefreshTag, Path> {
        [
            RefreshTag::PrimaryView,
            RefreshTag::ActionPopup,
            RefreshTag::DestinationPicker,
        ]
        .into_iter()
        .filter_map(|tag| self.refresh.latest(tag).map(|p| (tag, p.clone())))
        .collect()
    }
}

fn log_ignored(transfer_id: &TransferId, outcome: &DownloadOutcome) {
    if let DownloadOutcome::Ignored { reason } = outcome {
        debug!(transfer = %transfer_id, ?reason, "download signal ignored");
    }
}

/// Serializable view of the whole model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub daemon_status: DaemonStatus,
    pub tlfs: TlfRegistry,
    pub path_items: BTreeMap<Path, PathItem>,
    pub edits: EditEngine,
    pub downloads: DownloadEngine,
    pub uploads: Uploads,
    pub picker: Option<DestinationPicker>,
    pub errors: ErrorLedger,
    pub tlf_updates: TlfUpdates,
}
