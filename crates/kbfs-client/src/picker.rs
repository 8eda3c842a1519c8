//! Destination picker navigation for move, copy and incoming-share flows.
//!
//! The picker is a stack of panes indexed by depth. Pane `i` displays the
//! children of `destination_parent_path[i]`; navigating from pane `i` writes
//! pane `i + 1` and drops every deeper pane. A pane that was never written
//! falls back to the source's parent (move/copy) or the root.
//!
//! Capability flags are recomputed from the cache on every call and never
//! stored.

use kbfs_types::{LocalPath, Path};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path_item::PathItemCache;
use crate::request::{CopySource, FsRequest};

/// What the picker is choosing a destination for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PickerSource {
    MoveOrCopy {
        path: Path,
    },
    IncomingShare {
        local_path: LocalPath,
    },
    #[default]
    None,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationPicker {
    pub destination_parent_path: Vec<Option<Path>>,
    pub source: PickerSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickerError {
    #[error("destination picker is not open")]
    NotOpen,

    #[error("cannot write to {0}")]
    CannotWrite(Path),

    #[error("cannot copy into {0}")]
    CannotCopy(Path),

    #[error("cannot move into {0}")]
    CannotMove(Path),

    #[error("cannot back up from {0}")]
    CannotBackUp(Path),

    #[error("pane {index} is beyond the {panes} open panes")]
    IndexOutOfRange { index: usize, panes: usize },
}

pub type PickerResult<T> = Result<T, PickerError>;

#[derive(Clone, Debug, Default)]
pub struct PickerNavigator {
    picker: Option<DestinationPicker>,
    single_pane: bool,
}

impl PickerNavigator {
    /// `single_pane` enables backing up within one pane instead of relying on
    /// stacked panes.
    pub fn new(single_pane: bool) -> Self {
        Self {
            picker: None,
            single_pane,
        }
    }

    pub fn is_open(&self) -> bool {
        self.picker.is_some()
    }

    pub fn picker(&self) -> Option<&DestinationPicker> {
        self.picker.as_ref()
    }

    pub fn source(&self) -> Option<&PickerSource> {
        self.picker.as_ref().map(|p| &p.source)
    }

    pub fn open(&mut self, source: PickerSource) {
        self.picker = Some(DestinationPicker {
            destination_parent_path: Vec::new(),
            source,
        });
    }

    /// Returns false if the picker was not open.
    pub fn close(&mut self) -> bool {
        self.picker.take().is_some()
    }

    /// Show `path` in pane `current_index + 1`, dropping deeper panes.
    /// `current_index` may be at most the number of written panes.
    pub fn navigate(&mut self, current_index: usize, path: Path) -> PickerResult<()> {
        let picker = self.picker.as_mut().ok_or(PickerError::NotOpen)?;
        let panes = &mut picker.destination_parent_path;
        // Navigating may only extend the stack by one pane past its end.
        let target = current_index
            .checked_add(1)
            .filter(|_| current_index <= panes.len())
            .ok_or(PickerError::IndexOutOfRange {
                index: current_index,
                panes: panes.len(),
            })?;
        panes.truncate(target);
        panes.resize(target, None);
        panes.push(Some(path));
        Ok(())
    }

    /// The folder displayed by pane `index`.
    pub fn parent_path(&self, index: usize) -> Path {
        let Some(picker) = &self.picker else {
            return Path::root();
        };
        if let Some(Some(path)) = picker.destination_parent_path.get(index) {
            return path.clone();
        }
        match &picker.source {
            PickerSource::MoveOrCopy { path } => path.parent(),
            _ => Path::root(),
        }
    }

    // ── Capability flags ─────────────────────────────────────────────────

    pub fn can_write(&self, index: usize, cache: &PathItemCache) -> bool {
        if !self.is_open() {
            return false;
        }
        let parent = self.parent_path(index);
        parent.depth() > 2 && cache.get(&parent).meta.writable
    }

    pub fn can_copy(&self, index: usize, cache: &PathItemCache) -> bool {
        if !self.can_write(index, cache) {
            return false;
        }
        match self.source() {
            Some(PickerSource::IncomingShare { .. }) => true,
            Some(PickerSource::MoveOrCopy { path }) => self.parent_path(index) != path.parent(),
            _ => false,
        }
    }

    pub fn can_move(&self, index: usize, cache: &PathItemCache) -> bool {
        if !self.can_copy(index, cache) {
            return false;
        }
        let Some(PickerSource::MoveOrCopy { path }) = self.source() else {
            return false;
        };
        path.classify()
            .tlf_path()
            .is_some_and(|tlf| self.parent_path(index).is_in_tlf_path(&tlf))
    }

    pub fn can_back_up(&self, index: usize) -> bool {
        self.single_pane && self.is_open() && self.parent_path(index).depth() > 1
    }

    /// Whether a row for `path` can be opened as a new pane.
    pub fn can_open(&self, path: &Path, cache: &PathItemCache) -> bool {
        let browsable = path.depth() <= 2 || cache.get(path).is_folder();
        browsable
            && match self.source() {
                Some(PickerSource::IncomingShare { .. }) => true,
                Some(PickerSource::MoveOrCopy { path: source }) => path != source,
                _ => false,
            }
    }

    /// Name of the item being moved, copied or shared.
    pub fn target_name(&self) -> Option<String> {
        match self.source()? {
            PickerSource::MoveOrCopy { path } => Some(path.name().to_string()),
            PickerSource::IncomingShare { local_path } => Some(local_path.name().to_string()),
            PickerSource::None => None,
        }
    }

    // ── Actions ──────────────────────────────────────────────────────────

    /// Replace pane `index + 1` with the grandparent of pane `index`.
    pub fn back_up(&mut self, index: usize) -> PickerResult<Path> {
        if !self.is_open() {
            return Err(PickerError::NotOpen);
        }
        let current = self.parent_path(index);
        if !self.can_back_up(index) {
            return Err(PickerError::CannotBackUp(current));
        }
        let up = current.parent();
        self.navigate(index, up.clone())?;
        Ok(up)
    }

    /// Copy into pane `index`, closing the picker.
    pub fn copy_here(&mut self, index: usize, cache: &PathItemCache) -> PickerResult<FsRequest> {
        let destination = self.parent_path(index);
        if !self.is_open() {
            return Err(PickerError::NotOpen);
        }
        if !self.can_copy(index, cache) {
            return Err(PickerError::CannotCopy(destination));
        }
        let source = match self.source() {
            Some(PickerSource::MoveOrCopy { path }) => CopySource::Path(path.clone()),
            Some(PickerSource::IncomingShare { local_path }) => CopySource::Local(local_path.clone()),
            _ => return Err(PickerError::CannotCopy(destination)),
        };
        self.close();
        Ok(FsRequest::Copy {
            source,
            destination_parent_path: destination,
        })
    }

    /// Move into pane `index`, closing the picker.
    pub fn move_here(&mut self, index: usize, cache: &PathItemCache) -> PickerResult<FsRequest> {
        let destination = self.parent_path(index);
        if !self.is_open() {
            return Err(PickerError::NotOpen);
        }
        if !self.can_move(index, cache) {
            return Err(PickerError::CannotMove(destination));
        }
        let Some(PickerSource::MoveOrCopy { path }) = self.source().cloned() else {
            return Err(PickerError::CannotMove(destination));
        };
        self.close();
        Ok(FsRequest::Move {
            source: path,
            destination_parent_path: destination,
        })
    }

    /// Parent under which a new-folder edit should be created.
    pub fn new_folder(&self, index: usize, cache: &PathItemCache) -> PickerResult<Path> {
        if !self.is_open() {
            return Err(PickerError::NotOpen);
        }
        let parent = self.parent_path(index);
        if !self.can_write(index, cache) {
            return Err(PickerError::CannotWrite(parent));
        }
        Ok(parent)
    }
}

/// Split at the last `.`: `"a.tar.gz"` → `("a.tar", ".gz")`. A leading dot
/// does not start an extension.
pub fn split_file_name_and_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_item::Dirent;
    use crate::tlf::TlfRegistry;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn folder(name: &str) -> Dirent {
        Dirent {
            name: name.into(),
            dirent_type: 1,
            writable: true,
            ..Default::default()
        }
    }

    /// alice/{src, dst}, src/{photo.jpg}; bob/{inbox}
    fn cache() -> PathItemCache {
        let reg = TlfRegistry::new();
        let mut cache = PathItemCache::new();
        cache.apply_listing(
            &p("/keybase/private/alice"),
            None,
            &[folder("src"), folder("dst")],
            &reg,
        );
        let mut photo = folder("photo.jpg");
        photo.dirent_type = 0;
        cache.apply_listing(&p("/keybase/private/alice/src"), None, &[photo], &reg);
        cache.apply_listing(&p("/keybase/private/bob"), None, &[folder("inbox")], &reg);
        cache
    }

    fn move_photo() -> PickerSource {
        PickerSource::MoveOrCopy {
            path: p("/keybase/private/alice/src/photo.jpg"),
        }
    }

    #[test]
    fn test_parent_path_fallbacks_and_navigation() {
        let mut nav = PickerNavigator::new(false);
        nav.open(move_photo());
        assert_eq!(nav.parent_path(0), p("/keybase/private/alice/src"));

        nav.navigate(0, p("/keybase/private/alice")).unwrap();
        nav.navigate(1, p("/keybase/private/alice/dst")).unwrap();
        assert_eq!(nav.parent_path(2), p("/keybase/private/alice/dst"));

        // Re-navigating from pane 0 drops pane 2.
        nav.navigate(0, p("/keybase/private/bob")).unwrap();
        assert_eq!(nav.parent_path(1), p("/keybase/private/bob"));
        assert_eq!(nav.picker().unwrap().destination_parent_path.len(), 2);
        assert_eq!(nav.parent_path(2), p("/keybase/private/alice/src"));

        let mut share = PickerNavigator::new(false);
        share.open(PickerSource::IncomingShare {
            local_path: LocalPath::new("/tmp/pic.png"),
        });
        assert_eq!(share.parent_path(0), Path::root());
        assert_eq!(share.target_name().as_deref(), Some("pic.png"));
    }

    #[test]
    fn test_flags_for_move_or_copy() {
        let cache = cache();
        let mut nav = PickerNavigator::new(false);
        nav.open(move_photo());

        // Pane 0 is the source's own folder: writable but not a new destination.
        assert!(nav.can_write(0, &cache));
        assert!(!nav.can_copy(0, &cache));

        nav.navigate(0, p("/keybase/private/alice/dst")).unwrap();
        assert!(nav.can_copy(1, &cache));
        assert!(nav.can_move(1, &cache));

        nav.navigate(1, p("/keybase/private/bob/inbox")).unwrap();
        assert!(nav.can_copy(2, &cache));
        assert!(!nav.can_move(2, &cache));

        // TLF level is never writable.
        nav.navigate(2, p("/keybase/private/alice")).unwrap();
        assert!(!nav.can_write(3, &cache));
    }

    #[test]
    fn test_can_move_requires_move_or_copy() {
        let cache = cache();
        let mut nav = PickerNavigator::new(false);
        nav.open(PickerSource::IncomingShare {
            local_path: LocalPath::new("/tmp/pic.png"),
        });
        nav.navigate(0, p("/keybase/private/alice/dst")).unwrap();
        assert!(nav.can_copy(1, &cache));
        assert!(!nav.can_move(1, &cache));
        assert!(matches!(nav.move_here(1, &cache), Err(PickerError::CannotMove(_))));
        assert!(nav.is_open());
    }

    #[test]
    fn test_terminal_actions_close() {
        let cache = cache();
        let mut nav = PickerNavigator::new(false);
        nav.open(move_photo());
        nav.navigate(0, p("/keybase/private/alice/dst")).unwrap();

        let req = nav.move_here(1, &cache).unwrap();
        assert_eq!(
            req,
            FsRequest::Move {
                source: p("/keybase/private/alice/src/photo.jpg"),
                destination_parent_path: p("/keybase/private/alice/dst"),
            }
        );
        assert!(!nav.is_open());
        assert_eq!(nav.copy_here(1, &cache), Err(PickerError::NotOpen));

        nav.open(move_photo());
        nav.navigate(0, p("/keybase/private/bob/inbox")).unwrap();
        assert!(matches!(
            nav.copy_here(1, &cache).unwrap(),
            FsRequest::Copy { source: CopySource::Path(_), .. }
        ));
        assert!(!nav.is_open());
    }

    #[test]
    fn test_navigate_rejects_index_past_open_panes() {
        let mut nav = PickerNavigator::new(true);
        nav.open(move_photo());
        let alice = p("/keybase/private/alice");

        assert_eq!(
            nav.navigate(usize::MAX, alice.clone()),
            Err(PickerError::IndexOutOfRange {
                index: usize::MAX,
                panes: 0
            })
        );
        assert!(matches!(
            nav.navigate(1_000_000_000_000, alice.clone()),
            Err(PickerError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            nav.back_up(usize::MAX),
            Err(PickerError::IndexOutOfRange { .. })
        ));
        assert!(nav.picker().unwrap().destination_parent_path.is_empty());

        // One past the end is the furthest a navigation may reach.
        nav.navigate(0, alice.clone()).unwrap();
        nav.navigate(2, p("/keybase/private/alice/dst")).unwrap();
        assert_eq!(nav.picker().unwrap().destination_parent_path.len(), 4);
        assert!(nav.navigate(5, alice).is_err());
    }

    #[test]
    fn test_back_up_only_in_single_pane() {
        let mut stacked = PickerNavigator::new(false);
        stacked.open(move_photo());
        assert!(!stacked.can_back_up(0));
        assert!(stacked.back_up(0).is_err());

        let mut single = PickerNavigator::new(true);
        single.open(move_photo());
        assert!(single.can_back_up(0));
        assert_eq!(single.back_up(0).unwrap(), p("/keybase/private/alice"));
        assert_eq!(single.parent_path(1), p("/keybase/private/alice"));

        single.navigate(1, p("/keybase/private")).unwrap();
        assert!(!single.can_back_up(2));
    }

    #[test]
    fn test_can_open_and_new_folder() {
        let cache = cache();
        let mut nav = PickerNavigator::new(false);
        nav.open(move_photo());
        assert!(nav.can_open(&p("/keybase/private"), &cache));
        assert!(nav.can_open(&p("/keybase/private/alice/dst"), &cache));
        assert!(!nav.can_open(&p("/keybase/private/alice/src/photo.jpg"), &cache));
        assert!(!nav.can_open(&p("/keybase/private/alice/unlisted"), &cache));

        assert_eq!(nav.new_folder(0, &cache).unwrap(), p("/keybase/private/alice/src"));
        nav.navigate(0, p("/keybase/team")).unwrap();
        assert!(matches!(nav.new_folder(1, &cache), Err(PickerError::CannotWrite(_))));
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_file_name_and_extension("a.tar.gz"), ("a.tar", ".gz"));
        assert_eq!(split_file_name_and_extension("README"), ("README", ""));
        assert_eq!(split_file_name_and_extension(".bashrc"), (".bashrc", ""));
    }
}
