//! Typed identity of a path.
//!
//! [`ParsedPath::classify`] is total: every [`Path`] maps to exactly one
//! variant. A visibility segment outside {private, public, team} does not fail;
//! it degrades to `TlfList { visibility: None }` at any depth.
//!
//! Group TLF names encode writers and optional readers: `alice,bob#carol`
//! has writers `[alice, bob]` and readers `[carol]`. Splitting on `,` and the
//! first `#` is exactly inverted by [`ParsedPath::tlf_name`], so a parsed path
//! reserializes to the same string.

use serde::{Deserialize, Serialize};

use crate::kinds::Visibility;
use crate::path::Path;

const WRITER_SEPARATOR: char = ',';
const READER_MARKER: char = '#';

/// Visibilities that use the writers/readers naming scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupVisibility {
    Private,
    Public,
}

impl GroupVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupVisibility::Private => "private",
            GroupVisibility::Public => "public",
        }
    }
}

impl From<GroupVisibility> for Visibility {
    fn from(v: GroupVisibility) -> Self {
        match v {
            GroupVisibility::Private => Visibility::Private,
            GroupVisibility::Public => Visibility::Public,
        }
    }
}

/// Classified path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ParsedPath {
    Root,
    /// `visibility: None` is the sentinel for an unrecognized visibility.
    TlfList {
        visibility: Option<Visibility>,
    },
    GroupTlf {
        visibility: GroupVisibility,
        writers: Vec<String>,
        readers: Option<Vec<String>>,
    },
    TeamTlf {
        team: String,
    },
    InGroupTlf {
        visibility: GroupVisibility,
        writers: Vec<String>,
        readers: Option<Vec<String>>,
        rest: Vec<String>,
    },
    InTeamTlf {
        team: String,
        rest: Vec<String>,
    },
}

impl ParsedPath {
    /// The sentinel for paths whose visibility segment is not recognized.
    pub const NO_VISIBILITY: ParsedPath = ParsedPath::TlfList { visibility: None };

    pub fn classify(path: &Path) -> ParsedPath {
        let segments = path.segments();
        let Some((&first, deeper)) = segments.split_first() else {
            return ParsedPath::Root;
        };

        let Some(visibility) = Visibility::from_segment(first) else {
            return Self::NO_VISIBILITY;
        };
        let Some((&tlf, rest)) = deeper.split_first() else {
            return ParsedPath::TlfList {
                visibility: Some(visibility),
            };
        };
        let rest: Vec<String> = rest.iter().map(|s| s.to_string()).collect();

        let group = match visibility {
            Visibility::Private => GroupVisibility::Private,
            Visibility::Public => GroupVisibility::Public,
            Visibility::Team => {
                let team = tlf.to_string();
                return if rest.is_empty() {
                    ParsedPath::TeamTlf { team }
                } else {
                    ParsedPath::InTeamTlf { team, rest }
                };
            }
        };

        let (writers, readers) = split_group_name(tlf);
        if rest.is_empty() {
            ParsedPath::GroupTlf {
                visibility: group,
                writers,
                readers,
            }
        } else {
            ParsedPath::InGroupTlf {
                visibility: group,
                writers,
                readers,
                rest,
            }
        }
    }

    /// True for the unrecognized-visibility sentinel.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, ParsedPath::TlfList { visibility: None })
    }

    pub fn visibility(&self) -> Option<Visibility> {
        match self {
            ParsedPath::Root => None,
            ParsedPath::TlfList { visibility } => *visibility,
            ParsedPath::GroupTlf { visibility, .. } | ParsedPath::InGroupTlf { visibility, .. } => {
                Some((*visibility).into())
            }
            ParsedPath::TeamTlf { .. } | ParsedPath::InTeamTlf { .. } => Some(Visibility::Team),
        }
    }

    /// Segments below the root. The sentinel reports 1.
    pub fn depth(&self) -> usize {
        match self {
            ParsedPath::Root => 0,
            ParsedPath::TlfList { .. } => 1,
            ParsedPath::GroupTlf { .. } | ParsedPath::TeamTlf { .. } => 2,
            ParsedPath::InGroupTlf { rest, .. } | ParsedPath::InTeamTlf { rest, .. } => {
                2 + rest.len()
            }
        }
    }

    /// Name of the owning TLF, for TLF and in-TLF variants.
    pub fn tlf_name(&self) -> Option<String> {
        match self {
            ParsedPath::GroupTlf {
                writers, readers, ..
            }
            | ParsedPath::InGroupTlf {
                writers, readers, ..
            } => Some(join_group_name(writers, readers.as_deref())),
            ParsedPath::TeamTlf { team } | ParsedPath::InTeamTlf { team, .. } => Some(team.clone()),
            ParsedPath::Root | ParsedPath::TlfList { .. } => None,
        }
    }

    /// Path of the owning TLF, for TLF and in-TLF variants.
    pub fn tlf_path(&self) -> Option<Path> {
        let visibility = self.visibility()?;
        let name = self.tlf_name()?;
        Path::from_elements(["keybase", visibility.as_str(), name.as_str()]).ok()
    }

    /// Reserialize. `None` for the sentinel, or for a hand-built value whose
    /// names are not valid segments.
    pub fn to_path(&self) -> Option<Path> {
        let visibility = match self {
            ParsedPath::Root => return Some(Path::root()),
            ParsedPath::TlfList { visibility: None } => return None,
            other => other.visibility()?,
        };

        let mut elems = vec!["keybase".to_string(), visibility.as_str().to_string()];
        elems.extend(self.tlf_name());
        if let ParsedPath::InGroupTlf { rest, .. } | ParsedPath::InTeamTlf { rest, .. } = self {
            elems.extend(rest.iter().cloned());
        }

        Path::from_elements(&elems).ok()
    }
}

fn split_group_name(name: &str) -> (Vec<String>, Option<Vec<String>>) {
    let split = |s: &str| -> Vec<String> { s.split(WRITER_SEPARATOR).map(str::to_string).collect() };
    match name.split_once(READER_MARKER) {
        Some((writers, readers)) => (split(writers), Some(split(readers))),
        None => (split(name), None),
    }
}

fn join_group_name(writers: &[String], readers: Option<&[String]>) -> String {
    let mut name = writers.join(&WRITER_SEPARATOR.to_string());
    if let Some(readers) = readers {
        name.push(READER_MARKER);
        name.push_str(&readers.join(&WRITER_SEPARATOR.to_string()));
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classify(s: &str) -> ParsedPath {
        Path::parse(s).expect("valid path").classify()
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_root_and_lists() {
        assert_eq!(classify("/keybase"), ParsedPath::Root);
        assert_eq!(
            classify("/keybase/team"),
            ParsedPath::TlfList {
                visibility: Some(Visibility::Team)
            }
        );
        assert_eq!(classify("/keybase/nope"), ParsedPath::NO_VISIBILITY);
        assert_eq!(classify("/keybase/nope/deeper/still"), ParsedPath::NO_VISIBILITY);
    }

    #[test]
    fn test_group_tlf_writers_and_readers() {
        assert_eq!(
            classify("/keybase/private/alice,bob#carol"),
            ParsedPath::GroupTlf {
                visibility: GroupVisibility::Private,
                writers: strings(&["alice", "bob"]),
                readers: Some(strings(&["carol"])),
            }
        );
        assert_eq!(
            classify("/keybase/public/alice"),
            ParsedPath::GroupTlf {
                visibility: GroupVisibility::Public,
                writers: strings(&["alice"]),
                readers: None,
            }
        );
    }

    #[test]
    fn test_in_tlf_rest() {
        assert_eq!(
            classify("/keybase/team/acme/docs/readme.md"),
            ParsedPath::InTeamTlf {
                team: "acme".into(),
                rest: strings(&["docs", "readme.md"]),
            }
        );
        let parsed = classify("/keybase/private/alice#bob/x");
        assert_eq!(parsed.depth(), 3);
        assert_eq!(parsed.tlf_name().as_deref(), Some("alice#bob"));
        assert_eq!(
            parsed.tlf_path(),
            Some(Path::parse("/keybase/private/alice#bob").unwrap())
        );
    }

    #[test]
    fn test_to_path_except_sentinel() {
        assert_eq!(ParsedPath::Root.to_path(), Some(Path::root()));
        assert_eq!(ParsedPath::NO_VISIBILITY.to_path(), None);
        assert!(ParsedPath::NO_VISIBILITY.is_sentinel());
        assert_eq!(
            ParsedPath::TeamTlf { team: "acme".into() }.to_path(),
            Some(Path::parse("/keybase/team/acme").unwrap())
        );
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_value(classify("/keybase/team/acme")).unwrap();
        assert_eq!(json["kind"], "team-tlf");
        assert_eq!(json["team"], "acme");
        let list = serde_json::to_value(ParsedPath::NO_VISIBILITY).unwrap();
        assert_eq!(list["kind"], "tlf-list");
        assert!(list["visibility"].is_null());
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z0-9#,. _-]{1,8}".prop_filter("plain segment", |s| s != "." && s != "..")
    }

    fn first_segment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("private".to_string()),
            Just("public".to_string()),
            Just("team".to_string()),
            segment(),
        ]
    }

    proptest! {
        #[test]
        fn classify_is_stable_under_reserialization(
            first in first_segment(),
            tail in proptest::collection::vec(segment(), 0..5),
        ) {
            let mut elems = vec!["keybase".to_string(), first];
            elems.extend(tail);
            let path = Path::from_elements(&elems).unwrap();
            let parsed = path.classify();

            match parsed.to_path() {
                Some(back) => {
                    prop_assert_eq!(&back, &path);
                    prop_assert_eq!(back.classify(), parsed.clone());
                    prop_assert_eq!(parsed.depth(), path.depth());
                }
                None => prop_assert!(parsed.is_sentinel()),
            }
        }
    }
}
