//! Closed enumerations shared by the model and its collaborators.
//!
//! Wire enums (`FolderType`, `DirentType`) carry integer codes from the
//! backend; decoding is total, with unrecognized codes mapped to an
//! `Unknown` variant rather than an error. String tags parse through
//! `strum::EnumString` and reject unknown input with `strum::ParseError`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

// ============================================================================
// Visibility / FolderType
// ============================================================================

/// Visibility segment of a path (`/keybase/<visibility>/...`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
    Team,
}

impl Visibility {
    pub const ALL: [Visibility; 3] = [Visibility::Private, Visibility::Public, Visibility::Team];

    /// Exact match on a path segment. Path segments are case-sensitive.
    pub fn from_segment(s: &str) -> Option<Self> {
        match s {
            "private" => Some(Visibility::Private),
            "public" => Some(Visibility::Public),
            "team" => Some(Visibility::Team),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
            Visibility::Team => "team",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend folder type. `Unknown` stands for an absent visibility.
///
/// Serialized as its integer wire code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(from = "i64", into = "i64")]
#[strum(serialize_all = "lowercase")]
pub enum FolderType {
    #[default]
    Unknown,
    Private,
    Public,
    Team,
}

impl FolderType {
    /// Decode a wire code. Unrecognized codes become `Unknown`.
    pub fn from_wire(code: i64) -> Self {
        match code {
            1 => FolderType::Private,
            2 => FolderType::Public,
            3 => FolderType::Team,
            _ => FolderType::Unknown,
        }
    }

    pub fn to_wire(self) -> i64 {
        match self {
            FolderType::Unknown => 0,
            FolderType::Private => 1,
            FolderType::Public => 2,
            FolderType::Team => 3,
        }
    }

    pub fn visibility(self) -> Option<Visibility> {
        match self {
            FolderType::Unknown => None,
            FolderType::Private => Some(Visibility::Private),
            FolderType::Public => Some(Visibility::Public),
            FolderType::Team => Some(Visibility::Team),
        }
    }

    pub fn from_visibility(visibility: Option<Visibility>) -> Self {
        match visibility {
            None => FolderType::Unknown,
            Some(Visibility::Private) => FolderType::Private,
            Some(Visibility::Public) => FolderType::Public,
            Some(Visibility::Team) => FolderType::Team,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FolderType::Unknown => "unknown",
            FolderType::Private => "private",
            FolderType::Public => "public",
            FolderType::Team => "team",
        }
    }
}

impl From<i64> for FolderType {
    fn from(code: i64) -> Self {
        Self::from_wire(code)
    }
}

impl From<FolderType> for i64 {
    fn from(folder_type: FolderType) -> Self {
        folder_type.to_wire()
    }
}

impl From<Option<Visibility>> for FolderType {
    fn from(visibility: Option<Visibility>) -> Self {
        Self::from_visibility(visibility)
    }
}

impl From<Visibility> for FolderType {
    fn from(visibility: Visibility) -> Self {
        Self::from_visibility(Some(visibility))
    }
}

impl From<FolderType> for Option<Visibility> {
    fn from(folder_type: FolderType) -> Self {
        folder_type.visibility()
    }
}

impl fmt::Display for FolderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Directory entries
// ============================================================================

/// Backend directory entry type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DirentType {
    File,
    Dir,
    Sym,
    Exec,
}

impl DirentType {
    /// Decode a wire code. `None` for codes outside the closed set.
    pub fn from_wire(code: i64) -> Option<Self> {
        match code {
            0 => Some(DirentType::File),
            1 => Some(DirentType::Dir),
            2 => Some(DirentType::Sym),
            3 => Some(DirentType::Exec),
            _ => None,
        }
    }

    pub fn to_wire(self) -> i64 {
        match self {
            DirentType::File => 0,
            DirentType::Dir => 1,
            DirentType::Sym => 2,
            DirentType::Exec => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DirentType::File => "file",
            DirentType::Dir => "dir",
            DirentType::Sym => "sym",
            DirentType::Exec => "exec",
        }
    }
}

impl fmt::Display for DirentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model-level kind of a path item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PathType {
    Folder,
    File,
    Symlink,
    #[default]
    Unknown,
}

impl PathType {
    /// Map a raw wire dirent code; unrecognized codes are `Unknown`.
    pub fn from_wire_dirent(code: i64) -> Self {
        DirentType::from_wire(code).map_or(PathType::Unknown, PathType::from)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathType::Folder => "folder",
            PathType::File => "file",
            PathType::Symlink => "symlink",
            PathType::Unknown => "unknown",
        }
    }
}

impl From<DirentType> for PathType {
    fn from(dirent: DirentType) -> Self {
        match dirent {
            DirentType::Dir => PathType::Folder,
            DirentType::Sym => PathType::Symlink,
            DirentType::File | DirentType::Exec => PathType::File,
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Sorting
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortBy {
    #[default]
    Name,
    Time,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Name => "name",
            SortBy::Time => "time",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-path sort preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSetting {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl SortSetting {
    pub const fn new(sort_by: SortBy, sort_order: SortOrder) -> Self {
        Self { sort_by, sort_order }
    }
}

impl fmt::Display for SortSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.sort_by, self.sort_order)
    }
}

/// Parses `"name-asc"`, `"time-desc"`, etc.
impl FromStr for SortSetting {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (by, order) = s
            .split_once('-')
            .ok_or(strum::ParseError::VariantNotFound)?;
        Ok(Self::new(by.parse()?, order.parse()?))
    }
}

// ============================================================================
// Tags and statuses
// ============================================================================

/// Component that registered interest in a path's freshness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RefreshTag {
    PrimaryView,
    ActionPopup,
    DestinationPicker,
}

impl RefreshTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshTag::PrimaryView => "primary-view",
            RefreshTag::ActionPopup => "action-popup",
            RefreshTag::DestinationPicker => "destination-picker",
        }
    }
}

impl fmt::Display for RefreshTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the renderer does with a finished download.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DownloadIntent {
    #[default]
    None,
    CameraRoll,
    Share,
}

impl DownloadIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadIntent::None => "none",
            DownloadIntent::CameraRoll => "camera-roll",
            DownloadIntent::Share => "share",
        }
    }
}

impl fmt::Display for DownloadIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection status of the local filesystem daemon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DaemonStatus {
    #[default]
    Unknown,
    Waiting,
    Connected,
    WaitTimeout,
}

impl DaemonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DaemonStatus::Unknown => "unknown",
            DaemonStatus::Waiting => "waiting",
            DaemonStatus::Connected => "connected",
            DaemonStatus::WaitTimeout => "wait-timeout",
        }
    }
}

impl fmt::Display for DaemonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_type_mapping_is_total() {
        for code in -1..6 {
            let ft = FolderType::from_wire(code);
            assert_eq!(FolderType::from(ft.visibility()), ft);
        }
        assert_eq!(FolderType::from_wire(7), FolderType::Unknown);
        assert_eq!(FolderType::from_wire(3).to_wire(), 3);
        for vis in Visibility::ALL {
            let back: Option<Visibility> = FolderType::from(vis).into();
            assert_eq!(back, Some(vis));
        }
        assert_eq!(FolderType::from(None), FolderType::Unknown);
    }

    #[test]
    fn test_folder_type_wire_serde() {
        assert_eq!(serde_json::to_string(&FolderType::Team).unwrap(), "3");
        let ft: FolderType = serde_json::from_str("2").unwrap();
        assert_eq!(ft, FolderType::Public);
        let ft: FolderType = serde_json::from_str("99").unwrap();
        assert_eq!(ft, FolderType::Unknown);
    }

    #[test]
    fn test_dirent_to_path_type() {
        assert_eq!(PathType::from(DirentType::Dir), PathType::Folder);
        assert_eq!(PathType::from(DirentType::Sym), PathType::Symlink);
        assert_eq!(PathType::from(DirentType::File), PathType::File);
        assert_eq!(PathType::from(DirentType::Exec), PathType::File);
        assert_eq!(PathType::from_wire_dirent(1), PathType::Folder);
        assert_eq!(PathType::from_wire_dirent(42), PathType::Unknown);
    }

    #[test]
    fn test_path_type_from_str_rejects_unknown_tag() {
        assert_eq!(PathType::from_str("folder").unwrap(), PathType::Folder);
        assert_eq!(PathType::from_str("symlink").unwrap(), PathType::Symlink);
        assert!(PathType::from_str("directory").is_err());
    }

    #[test]
    fn test_tag_strings_round_trip() {
        for tag in [RefreshTag::PrimaryView, RefreshTag::ActionPopup, RefreshTag::DestinationPicker] {
            assert_eq!(RefreshTag::from_str(tag.as_str()).unwrap(), tag);
        }
        assert_eq!(DaemonStatus::from_str("wait-timeout").unwrap(), DaemonStatus::WaitTimeout);
        assert_eq!(DownloadIntent::from_str("camera-roll").unwrap(), DownloadIntent::CameraRoll);
        assert_eq!(
            serde_json::to_string(&DownloadIntent::CameraRoll).unwrap(),
            "\"camera-roll\""
        );
    }

    #[test]
    fn test_sort_setting_parse() {
        let s: SortSetting = "time-desc".parse().unwrap();
        assert_eq!(s, SortSetting::new(SortBy::Time, SortOrder::Desc));
        assert_eq!(s.to_string(), "time-desc");
        assert!("time".parse::<SortSetting>().is_err());
        assert!("size-asc".parse::<SortSetting>().is_err());
        assert_eq!(SortSetting::default(), SortSetting::new(SortBy::Name, SortOrder::Asc));
    }
}
