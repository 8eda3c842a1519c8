//! Recent activity per TLF.
//!
//! The backend reports the latest writes as one list of [`TlfUpdate`]s, each
//! a writer's burst of file edits inside a TLF. Every load replaces the
//! list wholesale.

use kbfs_types::Path;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileEditType {
    Created,
    Modified,
    Deleted,
    Renamed,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlfEdit {
    pub filename: String,
    pub server_time: u64,
    #[serde(default)]
    pub edit_type: FileEditType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlfUpdate {
    /// The TLF the edits landed in.
    pub path: Path,
    pub writer: String,
    pub server_time: u64,
    #[serde(default)]
    pub history: Vec<TlfEdit>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TlfUpdates {
    updates: Vec<TlfUpdate>,
}

impl TlfUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list, keeping the backend's order.
    pub fn replace(&mut self, updates: Vec<TlfUpdate>) {
        self.updates = updates;
    }

    pub fn list(&self) -> &[TlfUpdate] {
        &self.updates
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Updates that landed in `tlf` or below it.
    pub fn for_tlf<'a>(&'a self, tlf: &'a Path) -> impl Iterator<Item = &'a TlfUpdate> + 'a {
        self.updates.iter().filter(move |u| u.path.is_in_tlf_path(tlf))
    }

    /// Most recent server time across every update, if any.
    pub fn latest_server_time(&self) -> Option<u64> {
        self.updates.iter().map(|u| u.server_time).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn update(path: &str, writer: &str, time: u64) -> TlfUpdate {
        TlfUpdate {
            path: p(path),
            writer: writer.into(),
            server_time: time,
            history: vec![TlfEdit {
                filename: format!("{path}/notes.txt"),
                server_time: time,
                edit_type: FileEditType::Modified,
            }],
        }
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut updates = TlfUpdates::new();
        updates.replace(vec![
            update("/keybase/private/alice", "alice", 30),
            update("/keybase/team/acme", "bob", 10),
        ]);
        assert_eq!(updates.len(), 2);
        assert_eq!(updates.latest_server_time(), Some(30));

        updates.replace(vec![update("/keybase/team/acme", "carol", 40)]);
        assert_eq!(updates.list()[0].writer, "carol");
        assert_eq!(updates.len(), 1);

        updates.replace(Vec::new());
        assert!(updates.is_empty());
        assert_eq!(updates.latest_server_time(), None);
    }

    #[test]
    fn test_for_tlf_filters_by_ancestry() {
        let mut updates = TlfUpdates::new();
        updates.replace(vec![
            update("/keybase/private/alice", "alice", 1),
            update("/keybase/private/alice2", "alice2", 2),
            update("/keybase/team/acme", "bob", 3),
        ]);
        let alice = p("/keybase/private/alice");
        let writers: Vec<_> = updates.for_tlf(&alice).map(|u| u.writer.as_str()).collect();
        assert_eq!(writers, vec!["alice"]);
    }

    #[test]
    fn test_unknown_edit_types_decode() {
        let edit: TlfEdit = serde_json::from_str(
            r#"{"filename":"/keybase/team/acme/a","serverTime":5,"editType":"truncated"}"#,
        )
        .unwrap();
        assert_eq!(edit.edit_type, FileEditType::Unknown);
        let edit: TlfEdit =
            serde_json::from_str(r#"{"filename":"/keybase/team/acme/a","serverTime":5,"editType":"renamed"}"#)
                .unwrap();
        assert_eq!(edit.edit_type, FileEditType::Renamed);
    }
}
