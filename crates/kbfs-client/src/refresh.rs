//! Refresh interest tracking.
//!
//! Each [`RefreshTag`] remembers only the most recent path it loaded. There
//! is no unsubscribe: a component that loses interest simply stops
//! registering, and its stale path is replaced by whatever it loads next.
//! When a path changes, every remembered path related to it by ancestry is
//! reloaded at most once until its listing arrives.

use std::collections::{BTreeMap, BTreeSet};

use kbfs_types::{Path, RefreshTag};

#[derive(Clone, Debug, Default)]
pub struct RefreshInterest {
    latest: BTreeMap<RefreshTag, Path>,
    loading: BTreeMap<Path, BTreeSet<RefreshTag>>,
}

impl RefreshInterest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` as the tag's latest interest, replacing the previous one.
    pub fn register(&mut self, tag: RefreshTag, path: Path) {
        self.latest.insert(tag, path);
    }

    pub fn latest(&self, tag: RefreshTag) -> Option<&Path> {
        self.latest.get(&tag)
    }

    /// Remembered paths that `changed` may have invalidated and that are not
    /// already being reloaded. Returned paths are marked as loading.
    pub fn affected_by(&mut self, changed: &Path) -> Vec<Path> {
        let mut hits: BTreeMap<Path, BTreeSet<RefreshTag>> = BTreeMap::new();
        for (tag, path) in &self.latest {
            if path.is_in_tlf_path(changed) || changed.is_in_tlf_path(path) {
                hits.entry(path.clone()).or_default().insert(*tag);
            }
        }

        let mut out = Vec::with_capacity(hits.len());
        for (path, tags) in hits {
            if self.loading.contains_key(&path) {
                continue;
            }
            self.loading.insert(path.clone(), tags);
            out.push(path);
        }
        out
    }

    /// Mark a reload as started outside of change notifications.
    pub fn mark_loading(&mut self, tag: RefreshTag, path: &Path) -> bool {
        let tags = self.loading.entry(path.clone()).or_default();
        let first = tags.is_empty();
        tags.insert(tag);
        first
    }

    pub fn is_loading(&self, path: &Path) -> bool {
        self.loading.contains_key(path)
    }

    /// A listing for `path` arrived.
    pub fn satisfy(&mut self, path: &Path) -> Option<BTreeSet<RefreshTag>> {
        self.loading.remove(path)
    }

    pub fn clear_loading(&mut self) {
        self.loading.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn test_latest_per_tag_replaces() {
        let mut interest = RefreshInterest::new();
        interest.register(RefreshTag::PrimaryView, p("/keybase/private/alice"));
        interest.register(RefreshTag::PrimaryView, p("/keybase/team/acme"));
        assert_eq!(interest.latest(RefreshTag::PrimaryView), Some(&p("/keybase/team/acme")));
        assert!(interest.affected_by(&p("/keybase/private/alice/x")).is_empty());
    }

    #[test]
    fn test_affected_by_ancestry_and_dedup() {
        let mut interest = RefreshInterest::new();
        let docs = p("/keybase/private/alice/docs");
        interest.register(RefreshTag::PrimaryView, docs.clone());
        interest.register(RefreshTag::DestinationPicker, docs.clone());
        interest.register(RefreshTag::ActionPopup, p("/keybase/private/alice/docs/a.txt"));

        // A change inside docs affects docs (ancestor) but not a sibling file.
        let hits = interest.affected_by(&p("/keybase/private/alice/docs/b.txt"));
        assert_eq!(hits, vec![docs.clone()]);
        assert!(interest.is_loading(&docs));

        // Already loading: not returned again.
        assert!(interest.affected_by(&p("/keybase/private/alice/docs/c.txt")).is_empty());

        let tags = interest.satisfy(&docs).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(interest.affected_by(&p("/keybase/private/alice/docs/c.txt")), vec![docs]);
    }

    #[test]
    fn test_change_above_interest() {
        let mut interest = RefreshInterest::new();
        let deep = p("/keybase/team/acme/a/b");
        interest.register(RefreshTag::PrimaryView, deep.clone());
        assert_eq!(interest.affected_by(&p("/keybase/team/acme")), vec![deep.clone()]);
        interest.clear_loading();
        assert!(!interest.is_loading(&deep));
        assert!(interest.mark_loading(RefreshTag::PrimaryView, &deep));
        assert!(!interest.mark_loading(RefreshTag::ActionPopup, &deep));
    }
}
