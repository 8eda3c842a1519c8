//! Per-path user settings.

use std::collections::BTreeMap;

use kbfs_types::{Path, SortBy, SortOrder, SortSetting};

use crate::path_item::PathItemCache;

#[derive(Clone, Debug, Default)]
pub struct PathUserSettings {
    default_sort: SortSetting,
    sort: BTreeMap<Path, SortSetting>,
}

impl PathUserSettings {
    pub fn new(default_sort: SortSetting) -> Self {
        Self {
            default_sort,
            sort: BTreeMap::new(),
        }
    }

    pub fn sort_setting(&self, path: &Path) -> SortSetting {
        self.sort.get(path).copied().unwrap_or(self.default_sort)
    }

    pub fn set_sort_setting(&mut self, path: Path, setting: SortSetting) {
        self.sort.insert(path, setting);
    }

    /// The parent's cached children ordered by its sort setting. Time ties
    /// fall back to name order.
    pub fn sorted_children(&self, parent: &Path, cache: &PathItemCache) -> Vec<Path> {
        let item = cache.get(parent);
        let Some(children) = item.children() else {
            return Vec::new();
        };

        let mut rows: Vec<(Path, u64)> = children
            .iter()
            .filter_map(|name| parent.child(name).ok())
            .map(|path| {
                let time = cache.get(&path).meta.last_modified_timestamp;
                (path, time)
            })
            .collect();

        let setting = self.sort_setting(parent);
        rows.sort_by(|(a, a_time), (b, b_time)| {
            let by_name = || a.name().cmp(b.name());
            let ord = match setting.sort_by {
                SortBy::Name => by_name(),
                SortBy::Time => a_time.cmp(b_time).then_with(by_name),
            };
            match setting.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        rows.into_iter().map(|(path, _)| path).collect()
    }
}
