//! In-place folder creation.
//!
//! # State Machine
//!
//! ```text
//!            create / insert
//!                  │
//!                  v
//!            +-----------+  cancel
//!            |  Editing  |──────────▶ removed
//!            +-----+-----+
//!                  │ commit (emits create_folder)
//!                  v
//!            +-----------+  on_success
//!     ┌─────▶|  Saving   |──────────▶ removed
//!     │      +-----+-----+
//!     │            │ on_failure
//!     │ retry      v
//!     │      +-----------+  cancel
//!     └──────|  Failed   |──────────▶ removed
//!            +-----------+
//! ```
//!
//! A failed edit never falls back to `Editing`, and a saving edit cannot be
//! canceled because its request is already with the backend.

use std::collections::BTreeMap;

use kbfs_types::{EditId, Path};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::request::FsRequest;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditStatus {
    Editing,
    Saving,
    Failed,
}

impl EditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditStatus::Editing => "editing",
            EditStatus::Saving => "saving",
            EditStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for EditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending new-folder edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edit {
    pub parent_path: Path,
    pub name: String,
    /// The name originally proposed for the row.
    pub hint: String,
    pub status: EditStatus,
    pub error: Option<String>,
}

impl Edit {
    fn request(&self, id: EditId) -> FsRequest {
        FsRequest::CreateFolder {
            edit_id: id,
            parent_path: self.parent_path.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no edit {0}")]
    NotFound(EditId),

    #[error("edit {0} already exists")]
    AlreadyExists(EditId),

    #[error("cannot {action} edit {id} while {from}")]
    IllegalTransition {
        id: EditId,
        from: EditStatus,
        action: &'static str,
    },
}

pub type EditResult<T> = Result<T, EditError>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EditEngine {
    edits: BTreeMap<EditId, Edit>,
}

impl EditEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: EditId) -> Option<&Edit> {
        self.edits.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EditId, &Edit)> {
        self.edits.iter()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Start an edit under a freshly minted id.
    pub fn create(&mut self, parent_path: Path, name: impl Into<String>) -> EditId {
        let id = EditId::new();
        let name = name.into();
        self.edits.insert(
            id,
            Edit {
                parent_path,
                hint: name.clone(),
                name,
                status: EditStatus::Editing,
                error: None,
            },
        );
        debug!(edit = ?id, "edit created");
        id
    }

    /// Start an edit under a caller-supplied id.
    pub fn insert(&mut self, id: EditId, parent_path: Path, name: impl Into<String>) -> EditResult<()> {
        if self.edits.contains_key(&id) {
            return Err(EditError::AlreadyExists(id));
        }
        let name = name.into();
        self.edits.insert(
            id,
            Edit {
                parent_path,
                hint: name.clone(),
                name,
                status: EditStatus::Editing,
                error: None,
            },
        );
        Ok(())
    }

    fn expect_status(
        &mut self,
        id: EditId,
        allowed: &[EditStatus],
        action: &'static str,
    ) -> EditResult<&mut Edit> {
        let edit = self.edits.get_mut(&id).ok_or(EditError::NotFound(id))?;
        if allowed.contains(&edit.status) {
            Ok(edit)
        } else {
            Err(EditError::IllegalTransition {
                id,
                from: edit.status,
                action,
            })
        }
    }

    pub fn set_name(&mut self, id: EditId, name: impl Into<String>) -> EditResult<()> {
        let edit = self.expect_status(id, &[EditStatus::Editing], "rename")?;
        edit.name = name.into();
        Ok(())
    }

    /// Editing → saving. Returns the request to send.
    pub fn commit(&mut self, id: EditId) -> EditResult<FsRequest> {
        let edit = self.expect_status(id, &[EditStatus::Editing], "commit")?;
        edit.status = EditStatus::Saving;
        Ok(edit.request(id))
    }

    /// Failed → saving. Returns the same request as the original commit.
    pub fn retry(&mut self, id: EditId) -> EditResult<FsRequest> {
        let edit = self.expect_status(id, &[EditStatus::Failed], "retry")?;
        edit.status = EditStatus::Saving;
        edit.error = None;
        Ok(edit.request(id))
    }

    /// Saving → removed.
    pub fn on_success(&mut self, id: EditId) -> EditResult<Edit> {
        self.expect_status(id, &[EditStatus::Saving], "complete")?;
        self.edits.remove(&id).ok_or(EditError::NotFound(id))
    }

    /// Saving → failed, keeping parent, name and hint.
    pub fn on_failure(&mut self, id: EditId, error: impl Into<String>) -> EditResult<()> {
        let edit = self.expect_status(id, &[EditStatus::Saving], "fail")?;
        edit.status = EditStatus::Failed;
        edit.error = Some(error.into());
        Ok(())
    }

    /// Editing or failed → removed.
    pub fn cancel(&mut self, id: EditId) -> EditResult<Edit> {
        self.expect_status(id, &[EditStatus::Editing, EditStatus::Failed], "cancel")?;
        self.edits.remove(&id).ok_or(EditError::NotFound(id))
    }
}
