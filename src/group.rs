//! Grouping of exclaves under the main body sharing their admin code.
//!
//! Ordering policy:
//! - groups follow the input order of their main feature
//! - fragments inside a group follow their input order
//! - when several main features share a code, the first one in input order
//!   owns the group and the others are reported as duplicates
//! - exclaves whose code has no main feature are reported as orphans
//! - features without an admin code never own a group, so exclaves without a
//!   code are always orphans

use hashbrown::HashMap;
use tracing::{info, warn};

use crate::models::{Batch, FeatureId};

/// One administrative unit with at least one exclave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub admin_code: String,
    pub main: FeatureId,
    pub fragments: Vec<FeatureId>,
}

impl Group {
    /// Main feature first, then fragments in discovery order
    pub fn members(&self) -> impl Iterator<Item = FeatureId> + '_ {
        std::iter::once(self.main).chain(self.fragments.iter().copied())
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }
}

/// Groups keyed by admin code, iterated in main-feature input order
#[derive(Debug, Clone, Default)]
pub struct GroupMap {
    groups: Vec<Group>,
}

impl GroupMap {
    #[cfg(test)]
    pub fn get(&self, admin_code: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.admin_code == admin_code)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn push(&mut self, group: Group) {
        self.groups.push(group);
    }
}

impl<'a> IntoIterator for &'a GroupMap {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Grouping {
    pub groups: GroupMap,
    /// Exclaves whose admin code has no main feature, in input order
    pub orphans: Vec<FeatureId>,
    /// Main features that lost to an earlier main with the same code
    pub duplicate_mains: Vec<FeatureId>,
}

/// Associate every exclave with the main feature sharing its admin code
pub fn group(batch: &Batch, main: &[FeatureId], exclaves: &[FeatureId]) -> Grouping {
    let mut owner: HashMap<&str, FeatureId> = HashMap::new();
    let mut duplicate_mains = Vec::new();

    for &id in main {
        let code = batch[id].admin_code();
        if code.is_empty() {
            continue;
        }
        match owner.get(code) {
            Some(&first) => {
                warn!(
                    "Admin code '{}' has more than one main feature: keeping {}, ignoring {}",
                    code, first, id
                );
                duplicate_mains.push(id);
            }
            None => {
                owner.insert(code, id);
            }
        }
    }

    let mut fragments: HashMap<&str, Vec<FeatureId>> = HashMap::new();
    let mut orphans = Vec::new();

    for &id in exclaves {
        let code = batch[id].admin_code();
        if owner.contains_key(code) {
            fragments.entry(code).or_default().push(id);
        } else {
            warn!("Exclave {} has no main feature for admin code '{}'", id, code);
            orphans.push(id);
        }
    }

    let mut groups = GroupMap::default();
    for &id in main {
        let code = batch[id].admin_code();
        if owner.get(code) != Some(&id) {
            continue;
        }
        if let Some(found) = fragments.remove(code) {
            groups.push(Group {
                admin_code: code.to_string(),
                main: id,
                fragments: found,
            });
        }
    }

    info!(
        "Grouped {} exclaves into {} units ({} orphans)",
        exclaves.len() - orphans.len(),
        groups.len(),
        orphans.len()
    );

    Grouping {
        groups,
        orphans,
        duplicate_mains,
    }
}
