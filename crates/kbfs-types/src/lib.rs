//! Path grammar and wire types for the kbfs client model.
//!
//! This crate is the leaf of the workspace: validated paths, the path
//! classifier, closed wire enumerations, and typed identifiers. It has **no
//! internal dependencies**; the model crate builds on it.
//!
//! # Path Hierarchy
//!
//! ```text
//! /keybase                                  root
//! /keybase/private                          tlf-list (private)
//! /keybase/private/alice,bob#carol          group-tlf (writers, readers)
//! /keybase/private/alice,bob#carol/docs     in-group-tlf (rest = [docs])
//! /keybase/team/acme                        team-tlf
//! /keybase/team/acme/docs/readme.md         in-team-tlf (rest = [docs, readme.md])
//! ```
//!
//! # Key Types
//!
//! |------------------|------------------------------------------------|
//! | Type             | Purpose                                        |
//! |------------------|------------------------------------------------|
//! | [`Path`]         | Validated, normalized, immutable path          |
//! | [`ParsedPath`]   | Typed identity of a path (closed variants)     |
//! | [`Visibility`]   | private / public / team                        |
//! | [`FolderType`]   | Wire-level folder type (total mapping)         |
//! | [`DirentType`]   | Wire-level directory entry type                |
//! | [`PathType`]     | folder / file / symlink / unknown              |
//! | [`EditId`]       | Process-unique edit identifier (UUIDv7)        |
//! | [`ErrorId`]      | Error ledger entry identifier (UUIDv7)         |
//! | [`TransferId`]   | Opaque backend transfer identifier             |
//! |------------------|------------------------------------------------|

pub mod ids;
pub mod kinds;
pub mod parsed;
pub mod path;

pub use ids::{EditId, ErrorId, TransferId};
pub use kinds::{
    DaemonStatus, DirentType, DownloadIntent, FolderType, PathType, RefreshTag, SortBy,
    SortOrder, SortSetting, Visibility,
};
pub use parsed::{GroupVisibility, ParsedPath};
pub use path::{LocalPath, Path, PathError, ROOT};

/// Current time as Unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
