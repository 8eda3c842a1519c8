//! Top-level folder registry.
//!
//! Holds one `name -> Tlf` map per visibility. Favorites loads replace the
//! registry wholesale; rekey info and the ignored flag are merged in place.

use std::collections::BTreeMap;

use kbfs_types::{FolderType, ParsedPath, Path, Visibility};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A participant removed by an account reset, awaiting re-admission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetMember {
    pub username: String,
    pub uid: String,
}

/// A participant whose device must come online before a rekey completes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantUnlock {
    pub name: String,
    pub devices: String,
}

/// One of the current user's devices able to perform a rekey.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockDevice {
    #[serde(rename = "type")]
    pub device_type: String,
    pub name: String,
    #[serde(rename = "deviceID")]
    pub device_id: String,
}

/// Top-level folder metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tlf {
    pub name: String,
    pub is_favorite: bool,
    pub is_ignored: bool,
    pub is_new: bool,
    pub needs_rekey: bool,
    pub reset_participants: Vec<ResetMember>,
    pub team_id: String,
    pub waiting_for_participant_unlock: Option<Vec<ParticipantUnlock>>,
    pub you_can_unlock: Option<Vec<UnlockDevice>>,
}

impl Tlf {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the TLF currently accepts writes.
    ///
    /// A TLF waiting for a rekey, or with reset participants not yet
    /// re-admitted, is read-only regardless of what the backend reports for
    /// individual entries.
    pub fn allows_writes(&self) -> bool {
        !self.needs_rekey && self.reset_participants.is_empty()
    }
}

/// A favorites-list entry as reported by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteFolder {
    pub name: String,
    /// Integer wire code; unrecognized codes decode to `Unknown`.
    pub folder_type: FolderType,
    #[serde(default)]
    pub is_ignored: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub needs_rekey: bool,
    #[serde(default)]
    pub reset_participants: Vec<ResetMember>,
    #[serde(default)]
    pub team_id: String,
}

/// Per-visibility TLF store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlfRegistry {
    private: BTreeMap<String, Tlf>,
    public: BTreeMap<String, Tlf>,
    team: BTreeMap<String, Tlf>,
}

impl TlfRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, visibility: Visibility) -> &BTreeMap<String, Tlf> {
        match visibility {
            Visibility::Private => &self.private,
            Visibility::Public => &self.public,
            Visibility::Team => &self.team,
        }
    }

    fn map_mut(&mut self, visibility: Visibility) -> &mut BTreeMap<String, Tlf> {
        match visibility {
            Visibility::Private => &mut self.private,
            Visibility::Public => &mut self.public,
            Visibility::Team => &mut self.team,
        }
    }

    pub fn get(&self, visibility: Visibility, name: &str) -> Option<&Tlf> {
        self.map(visibility).get(name)
    }

    pub fn list(&self, visibility: Visibility) -> &BTreeMap<String, Tlf> {
        self.map(visibility)
    }

    pub fn len(&self) -> usize {
        Visibility::ALL.iter().map(|v| self.map(*v).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn upsert(&mut self, visibility: Visibility, tlf: Tlf) {
        self.map_mut(visibility).insert(tlf.name.clone(), tlf);
    }

    /// Replace the whole registry from a favorites load.
    ///
    /// Rekey info already merged for a TLF that survives the reload is kept.
    /// Entries whose folder type is `Unknown` are skipped. Returns the number
    /// of entries stored.
    pub fn replace_all(&mut self, favorites: &[FavoriteFolder]) -> usize {
        let previous = std::mem::take(self);
        let mut stored = 0;

        for fav in favorites {
            let Some(visibility) = fav.folder_type.visibility() else {
                warn!(name = %fav.name, "skipping favorite with unknown folder type");
                continue;
            };
            let kept = previous.get(visibility, &fav.name);
            let tlf = Tlf {
                name: fav.name.clone(),
                is_favorite: !fav.is_ignored,
                is_ignored: fav.is_ignored,
                is_new: fav.is_new,
                needs_rekey: fav.needs_rekey,
                reset_participants: fav.reset_participants.clone(),
                team_id: fav.team_id.clone(),
                waiting_for_participant_unlock: kept
                    .and_then(|t| t.waiting_for_participant_unlock.clone()),
                you_can_unlock: kept.and_then(|t| t.you_can_unlock.clone()),
            };
            self.upsert(visibility, tlf);
            stored += 1;
        }
        stored
    }

    /// Merge externally computed rekey info. Returns false for an unknown TLF.
    pub fn set_rekey_info(
        &mut self,
        visibility: Visibility,
        name: &str,
        waiting_for_participant_unlock: Option<Vec<ParticipantUnlock>>,
        you_can_unlock: Option<Vec<UnlockDevice>>,
    ) -> bool {
        match self.map_mut(visibility).get_mut(name) {
            Some(tlf) => {
                tlf.waiting_for_participant_unlock = waiting_for_participant_unlock;
                tlf.you_can_unlock = you_can_unlock;
                true
            }
            None => false,
        }
    }

    /// Returns false for an unknown TLF.
    pub fn set_ignored(&mut self, visibility: Visibility, name: &str, ignored: bool) -> bool {
        match self.map_mut(visibility).get_mut(name) {
            Some(tlf) => {
                tlf.is_ignored = ignored;
                tlf.is_favorite = !ignored;
                true
            }
            None => false,
        }
    }

    /// The TLF owning a classified path, if the registry knows it.
    pub fn tlf_for(&self, parsed: &ParsedPath) -> Option<&Tlf> {
        let visibility = parsed.visibility()?;
        let name = parsed.tlf_name()?;
        self.get(visibility, &name)
    }

    /// Write permission the registry grants a path. A TLF the registry does
    /// not know grants it, leaving the decision to the backend flag.
    pub fn permits_write(&self, path: &Path) -> bool {
        self.tlf_for(&path.classify())
            .is_none_or(Tlf::allows_writes)
    }

    /// Paths of every registered TLF.
    pub fn tlf_paths(&self) -> impl Iterator<Item = (Path, &Tlf)> + '_ {
        Visibility::ALL.into_iter().flat_map(move |visibility| {
            self.map(visibility).iter().filter_map(move |(name, tlf)| {
                Path::from_elements(["keybase", visibility.as_str(), name.as_str()])
                    .ok()
                    .map(|path| (path, tlf))
            })
        })
    }

    pub fn clear(&mut self) {
        self.private.clear();
        self.public.clear();
        self.team.clear();
    }
}
