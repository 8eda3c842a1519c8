//! Path metadata cache.
//!
//! Maps each [`Path`] to a [`PathItem`]: shared metadata plus a kind-specific
//! payload. Folders carry a three-stage load marker:
//!
//! ```text
//! favorite ──▶ pending ──▶ loaded
//! (seeded from    (metadata known,   (children listed)
//!  favorites)      children not)
//! ```
//!
//! Progress only moves forward; [`PathItemCache::invalidate_all`] is the one
//! way back. A kind change is never merged: a folder that becomes a file is
//! replaced outright.
//!
//! `writable` is derived, never copied from the backend:
//! `depth > 2 && backend flag && registry permission`. The backend flag is
//! kept beside each entry so [`PathItemCache::refresh_writability`] can
//! re-derive it whenever the TLF registry changes.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use kbfs_types::{PathType, Path};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::tlf::TlfRegistry;

/// Folder load stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Progress {
    Favorite,
    Pending,
    Loaded,
}

/// Detected content type of a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mime {
    pub mime_type: String,
    pub display_preview: bool,
}

/// Metadata shared by every kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathItemMeta {
    pub name: String,
    pub last_modified_timestamp: u64,
    pub size: u64,
    pub last_writer: String,
    pub writable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PathItemKind {
    Folder {
        children: BTreeSet<String>,
        progress: Progress,
    },
    Symlink {
        link_target: String,
    },
    File {
        mime: Option<Mime>,
    },
    Unknown,
}

impl PathItemKind {
    pub fn path_type(&self) -> PathType {
        match self {
            PathItemKind::Folder { .. } => PathType::Folder,
            PathItemKind::Symlink { .. } => PathType::Symlink,
            PathItemKind::File { .. } => PathType::File,
            PathItemKind::Unknown => PathType::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(flatten)]
    pub meta: PathItemMeta,
    pub kind: PathItemKind,
}

impl PathItem {
    /// Placeholder for paths with no cached entry.
    pub fn unknown() -> Self {
        Self {
            meta: PathItemMeta::default(),
            kind: PathItemKind::Unknown,
        }
    }

    pub fn path_type(&self) -> PathType {
        self.kind.path_type()
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, PathItemKind::Folder { .. })
    }

    pub fn children(&self) -> Option<&BTreeSet<String>> {
        match &self.kind {
            PathItemKind::Folder { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<Progress> {
        match &self.kind {
            PathItemKind::Folder { progress, .. } => Some(*progress),
            _ => None,
        }
    }
}

/// A directory entry as reported by the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dirent {
    pub name: String,
    /// Integer wire code (file=0, dir=1, sym=2, exec=3).
    pub dirent_type: i64,
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub last_writer: String,
    #[serde(default)]
    pub writable: bool,
    #[serde(default)]
    pub symlink_target: String,
}

impl Dirent {
    pub fn path_type(&self) -> PathType {
        PathType::from_wire_dirent(self.dirent_type)
    }
}

#[derive(Clone, Debug)]
struct Entry {
    item: PathItem,
    backend_writable: bool,
}

/// Counts reported by [`PathItemCache::apply_listing`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListingOutcome {
    pub upserted: usize,
    pub skipped: usize,
    pub evicted: usize,
}

#[derive(Debug, Default)]
pub struct PathItemCache {
    entries: HashMap<Path, Entry>,
}

impl PathItemCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached item, or the unknown placeholder. Never fails.
    pub fn get(&self, path: &Path) -> Cow<'_, PathItem> {
        match self.entries.get(path) {
            Some(entry) => Cow::Borrowed(&entry.item),
            None => Cow::Owned(PathItem::unknown()),
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &PathItem)> {
        self.entries.iter().map(|(path, entry)| (path, &entry.item))
    }

    /// Ordered copy for serialization.
    pub fn snapshot(&self) -> BTreeMap<Path, PathItem> {
        self.iter().map(|(p, item)| (p.clone(), item.clone())).collect()
    }

    fn derive_writable(path: &Path, backend_writable: bool, registry: &TlfRegistry) -> bool {
        path.depth() > 2 && backend_writable && registry.permits_write(path)
    }

    /// Create `favorite` folder entries for registered TLFs not yet cached.
    pub fn seed_favorites(&mut self, registry: &TlfRegistry) -> usize {
        let mut seeded = 0;
        for (path, tlf) in registry.tlf_paths() {
            if self.entries.contains_key(&path) {
                continue;
            }
            let item = PathItem {
                meta: PathItemMeta {
                    name: tlf.name.clone(),
                    ..Default::default()
                },
                kind: PathItemKind::Folder {
                    children: BTreeSet::new(),
                    progress: Progress::Favorite,
                },
            };
            self.entries.insert(
                path,
                Entry {
                    item,
                    backend_writable: false,
                },
            );
            seeded += 1;
        }
        seeded
    }

    /// Advance a folder from `favorite` to `pending`. Any other state is left
    /// alone.
    pub fn mark_pending(&mut self, path: &Path) -> bool {
        match self.entries.get_mut(path).map(|e| &mut e.item.kind) {
            Some(PathItemKind::Folder { progress, .. }) if *progress == Progress::Favorite => {
                *progress = Progress::Pending;
                true
            }
            _ => false,
        }
    }

    /// Apply a directory listing.
    ///
    /// The parent becomes a loaded folder whose children set is replaced.
    /// Each child is upserted; children that disappeared are evicted along
    /// with everything below them.
    pub fn apply_listing(
        &mut self,
        parent: &Path,
        entry: Option<&Dirent>,
        children: &[Dirent],
        registry: &TlfRegistry,
    ) -> ListingOutcome {
        let mut outcome = ListingOutcome::default();
        let previous = self
            .entries
            .get(parent)
            .and_then(|e| e.item.children().cloned())
            .unwrap_or_default();

        let mut names = BTreeSet::new();
        for dirent in children {
            match parent.child(&dirent.name) {
                Ok(path) => {
                    self.upsert_dirent(path, dirent, registry);
                    names.insert(dirent.name.clone());
                    outcome.upserted += 1;
                }
                Err(e) => {
                    debug!(%parent, error = %e, "skipping listing entry");
                    outcome.skipped += 1;
                }
            }
        }

        for gone in previous.difference(&names) {
            if let Ok(path) = parent.child(gone) {
                outcome.evicted += self.remove_subtree(&path);
            }
        }

        let (meta, backend_writable) = match (entry, self.entries.get(parent)) {
            (Some(dirent), _) => (meta_from_dirent(parent, dirent), dirent.writable),
            (None, Some(existing)) => (existing.item.meta.clone(), existing.backend_writable),
            (None, None) => (
                PathItemMeta {
                    name: parent.name().to_string(),
                    ..Default::default()
                },
                false,
            ),
        };
        let mut item = PathItem {
            meta,
            kind: PathItemKind::Folder {
                children: names,
                progress: Progress::Loaded,
            },
        };
        item.meta.writable = Self::derive_writable(parent, backend_writable, registry);
        self.entries.insert(
            parent.clone(),
            Entry {
                item,
                backend_writable,
            },
        );

        trace!(%parent, ?outcome, "applied listing");
        outcome
    }

    /// Upsert a single entry reported outside a listing.
    pub fn apply_entry(&mut self, path: &Path, dirent: &Dirent, registry: &TlfRegistry) {
        self.upsert_dirent(path.clone(), dirent, registry);
    }

    fn upsert_dirent(&mut self, path: Path, dirent: &Dirent, registry: &TlfRegistry) {
        let mut meta = meta_from_dirent(&path, dirent);
        meta.writable = Self::derive_writable(&path, dirent.writable, registry);
        let path_type = dirent.path_type();

        if let Some(existing) = self.entries.get_mut(&path) {
            if existing.item.path_type() == path_type {
                existing.item.meta = meta;
                existing.backend_writable = dirent.writable;
                if let PathItemKind::Symlink { link_target } = &mut existing.item.kind {
                    link_target.clone_from(&dirent.symlink_target);
                }
                return;
            }
            // Kind changed: drop whatever was cached below the old entry.
            self.remove_subtree(&path);
        }

        let kind = match path_type {
            PathType::Folder => PathItemKind::Folder {
                children: BTreeSet::new(),
                progress: Progress::Pending,
            },
            PathType::Symlink => PathItemKind::Symlink {
                link_target: dirent.symlink_target.clone(),
            },
            PathType::File => PathItemKind::File { mime: None },
            PathType::Unknown => PathItemKind::Unknown,
        };
        self.entries.insert(
            path,
            Entry {
                item: PathItem { meta, kind },
                backend_writable: dirent.writable,
            },
        );
    }

    /// Attach a detected mime type. Only files carry one.
    pub fn set_mime(&mut self, path: &Path, mime: Mime) -> bool {
        match self.entries.get_mut(path).map(|e| &mut e.item.kind) {
            Some(PathItemKind::File { mime: slot }) => {
                *slot = Some(mime);
                true
            }
            _ => false,
        }
    }

    /// Remove a path, its subtree, and its name from the parent's children.
    pub fn remove(&mut self, path: &Path) -> usize {
        let removed = self.remove_subtree(path);
        if !path.is_root() {
            let name = path.name().to_string();
            if let Some(PathItemKind::Folder { children, .. }) =
                self.entries.get_mut(&path.parent()).map(|e| &mut e.item.kind)
            {
                children.remove(&name);
            }
        }
        removed
    }

    fn remove_subtree(&mut self, path: &Path) -> usize {
        let before = self.entries.len();
        self.entries.retain(|p, _| !p.is_in_tlf_path(path));
        before - self.entries.len()
    }

    /// Drop every entry (full reload).
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    /// Re-derive `writable` for every entry against the registry.
    pub fn refresh_writability(&mut self, registry: &TlfRegistry) {
        for (path, entry) in self.entries.iter_mut() {
            entry.item.meta.writable =
                Self::derive_writable(path, entry.backend_writable, registry);
        }
    }

    /// First of `base`, `base (2)`, `base (3)`, ... not among the parent's
    /// cached children.
    pub fn unique_child_name(&self, parent: &Path, base: &str) -> String {
        let item = self.get(parent);
        let taken = |name: &str| item.children().is_some_and(|c| c.contains(name));
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base} ({n})"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

fn meta_from_dirent(path: &Path, dirent: &Dirent) -> PathItemMeta {
    let name = if dirent.name.is_empty() {
        path.name().to_string()
    } else {
        dirent.name.clone()
    };
    PathItemMeta {
        name,
        last_modified_timestamp: dirent.time,
        size: dirent.size,
        last_writer: dirent.last_writer.clone(),
        writable: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlf::Tlf;
    use kbfs_types::Visibility;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn dirent(name: &str, code: i64) -> Dirent {
        Dirent {
            name: name.into(),
            dirent_type: code,
            time: 10,
            size: 3,
            last_writer: "alice".into(),
            writable: true,
            symlink_target: String::new(),
        }
    }

    #[test]
    fn test_get_unfetched_is_placeholder() {
        let cache = PathItemCache::new();
        let item = cache.get(&p("/keybase/private/alice/nothing"));
        assert_eq!(item.path_type(), PathType::Unknown);
        assert!(!item.meta.writable);
        assert_eq!(item.meta.size, 0);
        assert_eq!(item.meta.name, "");
        assert!(matches!(item, Cow::Owned(_)));
    }

    #[test]
    fn test_seed_then_progress_only_advances() {
        let mut reg = TlfRegistry::new();
        reg.upsert(Visibility::Private, Tlf::new("alice"));
        let mut cache = PathItemCache::new();
        assert_eq!(cache.seed_favorites(&reg), 1);
        assert_eq!(cache.seed_favorites(&reg), 0);

        let tlf = p("/keybase/private/alice");
        assert_eq!(cache.get(&tlf).progress(), Some(Progress::Favorite));
        assert!(cache.mark_pending(&tlf));
        assert!(!cache.mark_pending(&tlf));

        cache.apply_listing(&tlf, None, &[dirent("a.txt", 0)], &reg);
        assert_eq!(cache.get(&tlf).progress(), Some(Progress::Loaded));
        assert!(!cache.mark_pending(&tlf));
        assert_eq!(cache.get(&tlf).meta.name, "alice");
    }

    #[test]
    fn test_listing_merges_same_kind_and_replaces_kind_change() {
        let reg = TlfRegistry::new();
        let mut cache = PathItemCache::new();
        let tlf = p("/keybase/private/alice");
        let docs = p("/keybase/private/alice/docs");

        cache.apply_listing(&tlf, None, &[dirent("docs", 1), dirent("a.txt", 0)], &reg);
        cache.apply_listing(&docs, None, &[dirent("inner", 0)], &reg);
        assert!(cache.set_mime(
            &p("/keybase/private/alice/a.txt"),
            Mime {
                mime_type: "text/plain".into(),
                display_preview: true,
            }
        ));

        // Same kinds: folder keeps its children and progress, file keeps mime.
        cache.apply_listing(&tlf, None, &[dirent("docs", 1), dirent("a.txt", 0)], &reg);
        assert_eq!(cache.get(&docs).progress(), Some(Progress::Loaded));
        assert!(cache.contains(&p("/keybase/private/alice/docs/inner")));
        assert!(matches!(
            cache.get(&p("/keybase/private/alice/a.txt")).kind,
            PathItemKind::File { mime: Some(_) }
        ));

        // docs turns into a file: full replacement, subtree gone.
        cache.apply_listing(&tlf, None, &[dirent("docs", 0), dirent("a.txt", 0)], &reg);
        assert_eq!(cache.get(&docs).path_type(), PathType::File);
        assert!(!cache.contains(&p("/keybase/private/alice/docs/inner")));
    }

    #[test]
    fn test_listing_evicts_vanished_children() {
        let reg = TlfRegistry::new();
        let mut cache = PathItemCache::new();
        let tlf = p("/keybase/team/acme");
        cache.apply_listing(&tlf, None, &[dirent("old", 1), dirent("keep", 0)], &reg);
        cache.apply_listing(&p("/keybase/team/acme/old"), None, &[dirent("x", 0)], &reg);

        let outcome = cache.apply_listing(&tlf, None, &[dirent("keep", 0), dirent("bad/name", 0)], &reg);
        assert_eq!(outcome.evicted, 2);
        assert_eq!(outcome.skipped, 1);
        assert!(!cache.contains(&p("/keybase/team/acme/old")));
        assert_eq!(cache.get(&tlf).children().unwrap().len(), 1);
    }

    #[test]
    fn test_writability_depth_and_registry() {
        let mut reg = TlfRegistry::new();
        let mut cache = PathItemCache::new();
        let tlf = p("/keybase/private/alice");
        let mut tlf_dirent = dirent("alice", 1);
        tlf_dirent.writable = true;
        cache.apply_listing(&tlf, Some(&tlf_dirent), &[dirent("a.txt", 0)], &reg);

        let file = p("/keybase/private/alice/a.txt");
        assert!(!cache.get(&tlf).meta.writable);
        assert!(cache.get(&file).meta.writable);

        let mut locked = Tlf::new("alice");
        locked.needs_rekey = true;
        reg.upsert(Visibility::Private, locked);
        cache.refresh_writability(&reg);
        assert!(!cache.get(&file).meta.writable);

        reg.clear();
        cache.refresh_writability(&reg);
        assert!(cache.get(&file).meta.writable);
    }

    #[test]
    fn test_remove_updates_parent_children() {
        let reg = TlfRegistry::new();
        let mut cache = PathItemCache::new();
        let tlf = p("/keybase/public/bob");
        cache.apply_listing(&tlf, None, &[dirent("a", 0), dirent("b", 0)], &reg);
        assert_eq!(cache.remove(&p("/keybase/public/bob/a")), 1);
        assert_eq!(cache.get(&tlf).children().unwrap().len(), 1);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unique_child_name() {
        let reg = TlfRegistry::new();
        let mut cache = PathItemCache::new();
        let tlf = p("/keybase/private/alice");
        assert_eq!(cache.unique_child_name(&tlf, "New Folder"), "New Folder");
        cache.apply_listing(
            &tlf,
            None,
            &[dirent("New Folder", 1), dirent("New Folder (2)", 1)],
            &reg,
        );
        assert_eq!(cache.unique_child_name(&tlf, "New Folder"), "New Folder (3)");
    }

    #[test]
    fn test_symlink_target_updates() {
        let reg = TlfRegistry::new();
        let mut cache = PathItemCache::new();
        let link = p("/keybase/private/alice/link");
        let mut d = dirent("link", 2);
        d.symlink_target = "a".into();
        cache.apply_entry(&link, &d, &reg);
        d.symlink_target = "b".into();
        cache.apply_entry(&link, &d, &reg);
        assert_eq!(
            cache.get(&link).kind,
            PathItemKind::Symlink {
                link_target: "b".into()
            }
        );
    }
}
