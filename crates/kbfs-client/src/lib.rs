//! Client-side state model for the kbfs virtual filesystem.
//!
//! The model classifies paths, caches metadata, and runs the state machines
//! for folder creation, downloads, uploads and the destination picker. It
//! performs no I/O: every change that needs the backend becomes an
//! [`FsRequest`], and the backend's answers come back as [`FsEvent`]s.
//!
//! ```text
//!  backend notifications ─┐                         ┌─▶ FsRequest (backend)
//!                         ├─▶ FsEvent ─▶ FsState ───┤
//!  user intents ──────────┘      (apply, one at     └─▶ StoreChange (renderers)
//!                                 a time)
//! ```
//!
//! Use [`FsState`] directly for synchronous, single-owner embedding, or
//! [`spawn_store`] to run it behind an actor with concurrent readers.

pub mod config;
pub mod constants;
pub mod download;
pub mod edit;
pub mod error;
pub mod event;
pub mod path_item;
pub mod picker;
pub mod refresh;
pub mod request;
pub mod settings;
pub mod state;
pub mod store;
pub mod tlf;
pub mod tlf_updates;
pub mod upload;

pub use config::{ConfigError, ModelConfig};
pub use download::{
    Download, DownloadEngine, DownloadError, DownloadMeta, DownloadOutcome, DownloadPhase,
    DownloadState, IgnoreReason,
};
pub use edit::{Edit, EditEngine, EditError, EditStatus};
pub use error::{ErrorLedger, FsError};
pub use event::{ChangeScope, FsEvent};
pub use path_item::{
    Dirent, ListingOutcome, Mime, PathItem, PathItemCache, PathItemKind, PathItemMeta, Progress,
};
pub use picker::{
    DestinationPicker, PickerError, PickerNavigator, PickerSource, split_file_name_and_extension,
};
pub use refresh::RefreshInterest;
pub use request::{CopySource, FsRequest};
pub use settings::PathUserSettings;
pub use state::{FsState, StateError, StateSnapshot};
pub use store::{SharedFsState, StoreChange, StoreError, StoreHandle, spawn_store};
pub use tlf::{FavoriteFolder, ParticipantUnlock, ResetMember, Tlf, TlfRegistry, UnlockDevice};
pub use tlf_updates::{FileEditType, TlfEdit, TlfUpdate, TlfUpdates};
pub use upload::{SyncStatus, Uploads};
