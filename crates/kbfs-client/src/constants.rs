//! Model defaults.
//!
//! Centralizes hardcoded values so the config layer and tests agree on them.

/// Capacity of the store's change broadcast. Subscribers that fall further
/// behind than this observe a generation gap and re-read state.
pub const DEFAULT_CHANGE_BUFFER: usize = 256;

/// Default `tracing` filter for the replay binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Base name for folders created through the new-folder row.
pub const NEW_FOLDER_BASE_NAME: &str = "New Folder";
