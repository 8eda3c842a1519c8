//! Validated filesystem paths.
//!
//! A [`Path`] is an absolute, `/`-separated identifier rooted at [`ROOT`].
//! The only constructors normalize their input, so a `Path` held anywhere in
//! the model is already well-formed: no repeated or trailing separators, no
//! `.`/`..` segments, nothing outside the root prefix.
//!
//! Two depth measures exist:
//!
//! - [`Path::level`] counts every element from `/` (`/keybase` = 1).
//! - [`Path::depth`] counts segments below the root (`/keybase` = 0,
//!   `/keybase/private` = 1, `/keybase/private/alice` = 2). The classifier
//!   and the capability flags use this one.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::kinds::Visibility;
use crate::parsed::ParsedPath;

/// Separator for model paths.
pub const SEPARATOR: char = '/';

/// Fixed root prefix of every model path.
pub const ROOT: &str = "/keybase";

/// First element of every model path.
const ROOT_ELEMENT: &str = "keybase";

/// Path construction error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Path does not start with `/`.
    #[error("path is not absolute: {0:?}")]
    NotAbsolute(String),

    /// Path is absolute but not under the root prefix.
    #[error("path is outside {ROOT}: {0:?}")]
    OutsideRoot(String),

    /// A segment is empty, relative, or contains a separator.
    #[error("invalid segment {segment:?} in {path:?}")]
    InvalidSegment { path: String, segment: String },
}

/// A validated, normalized, immutable model path.
///
/// Cloning is cheap (shared string). Ordering is lexicographic on the
/// normalized string, so a parent always sorts before its descendants.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Arc<str>);

impl Path {
    /// The root path, `/keybase`.
    pub fn root() -> Self {
        Self(Arc::from(ROOT))
    }

    /// Normalize and validate a path string.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if !s.starts_with(SEPARATOR) {
            return Err(PathError::NotAbsolute(s.to_string()));
        }

        let mut normalized = String::with_capacity(s.len());
        for segment in s.split(SEPARATOR).filter(|seg| !seg.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(PathError::InvalidSegment {
                    path: s.to_string(),
                    segment: segment.to_string(),
                });
            }
            normalized.push(SEPARATOR);
            normalized.push_str(segment);
        }

        let rooted = normalized == ROOT
            || normalized
                .strip_prefix(ROOT)
                .is_some_and(|rest| rest.starts_with(SEPARATOR));
        if !rooted {
            return Err(PathError::OutsideRoot(s.to_string()));
        }

        Ok(Self(Arc::from(normalized)))
    }

    /// Build a path from its full element list (`["keybase", ...]`).
    ///
    /// Unlike [`Path::parse`] this is strict: every element must be a
    /// non-empty plain segment, so `from_elements(es).elements() == es`.
    pub fn from_elements<I, S>(elems: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut joined = String::new();
        for elem in elems {
            let elem = elem.as_ref();
            if !is_plain_segment(elem) {
                return Err(PathError::InvalidSegment {
                    path: format!("{joined}{SEPARATOR}{elem}"),
                    segment: elem.to_string(),
                });
            }
            joined.push(SEPARATOR);
            joined.push_str(elem);
        }
        if joined.is_empty() {
            return Err(PathError::OutsideRoot(SEPARATOR.to_string()));
        }
        Self::parse(&joined)
    }

    /// The normalized path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Every element from `/`, starting with `keybase`.
    pub fn elements(&self) -> Vec<&str> {
        self.0.split(SEPARATOR).skip(1).collect()
    }

    /// Segments below the root prefix.
    pub fn segments(&self) -> Vec<&str> {
        self.0.split(SEPARATOR).skip(2).collect()
    }

    /// Number of elements from `/` (`/keybase` = 1).
    pub fn level(&self) -> usize {
        self.0.matches(SEPARATOR).count()
    }

    /// Number of segments below the root (`/keybase` = 0).
    pub fn depth(&self) -> usize {
        self.level() - 1
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.depth() == 0
    }

    /// The last element.
    pub fn name(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or(ROOT_ELEMENT)
    }

    /// The path with its last segment stripped. The root is its own parent.
    pub fn parent(&self) -> Path {
        match self.0.rfind(SEPARATOR) {
            Some(idx) if !self.is_root() => Self(Arc::from(&self.0[..idx])),
            _ => self.clone(),
        }
    }

    /// Append a relative name. An empty name returns the path unchanged.
    pub fn join(&self, name: &str) -> Result<Path, PathError> {
        if name.is_empty() {
            return Ok(self.clone());
        }
        Self::parse(&format!("{}{SEPARATOR}{name}", self.0))
    }

    /// Append exactly one segment. Rejects names that are empty, relative,
    /// or contain a separator.
    pub fn child(&self, name: &str) -> Result<Path, PathError> {
        if !is_plain_segment(name) {
            return Err(PathError::InvalidSegment {
                path: format!("{}{SEPARATOR}{name}", self.0),
                segment: name.to_string(),
            });
        }
        Ok(Self(Arc::from(format!("{}{SEPARATOR}{name}", self.0))))
    }

    /// True iff this path equals `tlf` or is a separator-bounded descendant.
    ///
    /// `/keybase/private/alice2` is *not* in `/keybase/private/alice`.
    pub fn is_in_tlf_path(&self, tlf: &Path) -> bool {
        self.0
            .strip_prefix(tlf.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(SEPARATOR))
    }

    /// The visibility segment, if it names one.
    pub fn visibility(&self) -> Option<Visibility> {
        self.0
            .split(SEPARATOR)
            .nth(2)
            .and_then(Visibility::from_segment)
    }

    /// Classify into a typed identity. Total and deterministic.
    pub fn classify(&self) -> ParsedPath {
        ParsedPath::classify(self)
    }

    /// True for `/keybase/private` and `/keybase/public`.
    pub fn is_non_team_tlf_list(&self) -> bool {
        self.depth() == 1
            && matches!(
                self.visibility(),
                Some(Visibility::Private | Visibility::Public)
            )
    }
}

fn is_plain_segment(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(SEPARATOR)
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({:?})", &*self.0)
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Path {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Path::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Local paths
// ============================================================================

#[cfg(windows)]
const LOCAL_SEPARATOR: char = '\\';
#[cfg(not(windows))]
const LOCAL_SEPARATOR: char = '/';

/// A path on the local machine (download destination, incoming share).
///
/// Not validated: local paths come from the platform and are only
/// concatenated and split here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalPath(String);

impl LocalPath {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a name with the platform separator.
    pub fn join(&self, name: &str) -> LocalPath {
        Self(format!("{}{LOCAL_SEPARATOR}{name}", self.0))
    }

    /// The last non-empty element, or `""`.
    pub fn name(&self) -> &str {
        self.0
            .rsplit(LOCAL_SEPARATOR)
            .find(|elem| !elem.is_empty())
            .unwrap_or("")
    }

    /// Everything before the last separator.
    pub fn dir(&self) -> &str {
        match self.0.rfind(LOCAL_SEPARATOR) {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// The path with `/` separators regardless of platform.
    pub fn normalized(&self) -> String {
        if LOCAL_SEPARATOR == '/' {
            self.0.clone()
        } else {
            self.0.replace(LOCAL_SEPARATOR, "/")
        }
    }
}

impl fmt::Display for LocalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
