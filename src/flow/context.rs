//! The guard-context lattice.
//!
//! A [`GuardContext`] is the set of "worlds" (platform plus OS version) the
//! program can be running in at a given point. Each mentioned platform maps
//! to the versions still possible on it; every platform not in the map is
//! either fully possible (`others == true`) or impossible (`others == false`).
//!
//! The map is an `im::OrdMap`, so cloning a context at a branch point is O(1)
//! and branches never observe each other's refinements.

use im::OrdMap;
use std::fmt;

use crate::guards::{GuardFact, GuardRelation};
use crate::platform::{PlatformName, VersionRange, VersionSet};

#[derive(Clone, PartialEq, Eq)]
pub struct GuardContext {
    platforms: OrdMap<PlatformName, VersionSet>,
    others: bool,
}

impl GuardContext {
    /// No knowledge: every platform and version is possible.
    pub fn all() -> Self {
        Self { platforms: OrdMap::new(), others: true }
    }

    /// Dead code: nothing is possible.
    pub fn unreachable() -> Self {
        Self { platforms: OrdMap::new(), others: false }
    }

    /// Only `platform` at `versions`.
    pub fn only(platform: PlatformName, versions: VersionSet) -> Self {
        Self::unreachable().with_versions(platform, versions)
    }

    /// Every platform except `platform`'s `versions`.
    pub fn except(platform: PlatformName, versions: VersionSet) -> Self {
        Self::only(platform, versions).complement()
    }

    /// World set in which `fact` holds. `ios` facts also hold on platforms
    /// running iOS code (Mac Catalyst).
    pub fn from_fact(fact: &GuardFact) -> Self {
        let range = match fact.relation {
            GuardRelation::AtLeast => VersionRange::at_least(fact.version),
            GuardRelation::EarlierThan => VersionRange::before(fact.version),
        };
        let versions = VersionSet::from_range(range);
        let mut world = Self::only(fact.platform.clone(), versions.clone());
        if let Some(implied) = fact.platform.implied() {
            world = world.union(&Self::only(implied, versions));
        }
        if fact.negated {
            world.complement()
        } else {
            world
        }
    }

    fn default_versions(&self) -> VersionSet {
        if self.others {
            VersionSet::all()
        } else {
            VersionSet::empty()
        }
    }

    fn with_versions(mut self, platform: PlatformName, versions: VersionSet) -> Self {
        if versions == self.default_versions() {
            self.platforms.remove(&platform);
        } else {
            self.platforms.insert(platform, versions);
        }
        self
    }

    /// Versions of `platform` still possible.
    pub fn versions_of(&self, platform: &PlatformName) -> VersionSet {
        self.platforms
            .get(platform)
            .cloned()
            .unwrap_or_else(|| self.default_versions())
    }

    /// True when platforms outside [`Self::mentioned_platforms`] are possible.
    pub fn others_possible(&self) -> bool {
        self.others
    }

    /// Platforms with a non-default version set, in name order.
    pub fn mentioned_platforms(&self) -> impl Iterator<Item = &PlatformName> {
        self.platforms.keys()
    }

    /// Mentioned platforms with at least one possible version.
    pub fn reachable_platforms(&self) -> Vec<(PlatformName, VersionSet)> {
        self.platforms
            .iter()
            .filter(|(_, versions)| !versions.is_empty())
            .map(|(p, v)| (p.clone(), v.clone()))
            .collect()
    }

    pub fn is_unreachable(&self) -> bool {
        !self.others && self.platforms.values().all(|v| v.is_empty())
    }

    pub fn is_all(&self) -> bool {
        self.others && self.platforms.is_empty()
    }

    fn combine(
        &self,
        other: &GuardContext,
        others: bool,
        op: impl Fn(&VersionSet, &VersionSet) -> VersionSet,
    ) -> GuardContext {
        let mut result = GuardContext { platforms: OrdMap::new(), others };
        let keys: Vec<PlatformName> = self
            .platforms
            .keys()
            .chain(other.platforms.keys())
            .cloned()
            .collect();
        for key in keys {
            if result.platforms.contains_key(&key) {
                continue;
            }
            let versions = op(&self.versions_of(&key), &other.versions_of(&key));
            result = result.with_versions(key, versions);
        }
        result
    }

    pub fn intersect(&self, other: &GuardContext) -> GuardContext {
        self.combine(other, self.others && other.others, |a, b| a.intersect(b))
    }

    pub fn union(&self, other: &GuardContext) -> GuardContext {
        self.combine(other, self.others || other.others, |a, b| a.union(b))
    }

    pub fn complement(&self) -> GuardContext {
        let mut result = GuardContext { platforms: OrdMap::new(), others: !self.others };
        for (platform, versions) in self.platforms.iter() {
            result = result.with_versions(platform.clone(), versions.complement());
        }
        result
    }

    pub fn difference(&self, other: &GuardContext) -> GuardContext {
        self.intersect(&other.complement())
    }

    pub fn is_subset_of(&self, other: &GuardContext) -> bool {
        if self.others && !other.others {
            return false;
        }
        self.platforms
            .keys()
            .chain(other.platforms.keys())
            .all(|p| self.versions_of(p).is_subset_of(&other.versions_of(p)))
    }
}

impl Default for GuardContext {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for GuardContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for GuardContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .platforms
            .iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect();
        let rest = if self.others { "others: *" } else { "others: {}" };
        write!(f, "{{{}{}{}}}", parts.join(", "), if parts.is_empty() { "" } else { ", " }, rest)
    }
}
