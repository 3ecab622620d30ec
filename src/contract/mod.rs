/*!
# Availability Contracts

Per-symbol merged platform availability. A contract maps each mentioned
platform to a [`PlatformAvailability`]:

| supported | unsupported | meaning                                   |
|-----------|-------------|-------------------------------------------|
| `s`       | none        | allowed from `s`                          |
| `s`       | `u > s`     | allowed in `[s, u)`                       |
| none      | `u`         | denied from `u`                           |
| `s`       | `u <= s`    | denied in `[u, s)`, supported again at `s` |

A contract containing at least one "allowed" entry is an allow-list: the
symbol works only on the listed platforms. Otherwise it is a deny-list.

Layers are merged from the outermost scope inwards with [`AvailabilityContract::merge_child`].
*/

pub mod builder;
pub mod cache;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::flow::GuardContext;
use crate::platform::{PlatformName, Version, VersionRange, VersionSet};

pub use builder::OwnAttributes;
pub use cache::ContractCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityKind {
    Supported,
    Unsupported,
    Obsoleted,
}

/// One normalised attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityEntry {
    pub kind: AvailabilityKind,
    pub platform: PlatformName,
    pub version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObsoletedInfo {
    pub version: Version,
    pub message: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformAvailability {
    pub supported: Option<Version>,
    pub unsupported: Option<Version>,
    pub unsupported_message: Option<String>,
    pub obsoleted: Option<ObsoletedInfo>,
}

impl PlatformAvailability {
    /// Range the platform is allowed in, for allow entries.
    pub fn allowed_range(&self) -> Option<VersionRange> {
        let supported = self.supported?;
        match self.unsupported {
            None => Some(VersionRange::at_least(supported)),
            Some(unsupported) if supported < unsupported => {
                Some(VersionRange::new(supported, Some(unsupported)))
            }
            Some(_) => None,
        }
    }

    /// Range the platform is denied in, for deny entries.
    pub fn denied_range(&self) -> Option<VersionRange> {
        let unsupported = self.unsupported?;
        match self.supported {
            None => Some(VersionRange::at_least(unsupported)),
            Some(supported) if unsupported <= supported => {
                Some(VersionRange::new(unsupported, Some(supported)))
            }
            Some(_) => None,
        }
    }

    pub fn is_allow(&self) -> bool {
        self.allowed_range().is_some()
    }

    /// Supported again after a denied range.
    pub fn reintroduced_at(&self) -> Option<Version> {
        self.denied_range().and(self.supported)
    }

    pub fn has_support_facts(&self) -> bool {
        self.supported.is_some() || self.unsupported.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_support_facts() && self.obsoleted.is_none()
    }
}

/// Merged contract of one symbol. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityContract {
    platforms: BTreeMap<PlatformName, PlatformAvailability>,
}

impl AvailabilityContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the entries of one attribute layer. Within a layer the highest
    /// supported and lowest unsupported version win.
    pub fn from_entries<'e>(entries: impl IntoIterator<Item = &'e AvailabilityEntry>) -> Self {
        let mut contract = Self::new();
        for entry in entries {
            let slot = contract.platforms.entry(entry.platform.clone()).or_default();
            match entry.kind {
                AvailabilityKind::Supported => {
                    slot.supported = Some(slot.supported.map_or(entry.version, |v| v.max(entry.version)));
                }
                AvailabilityKind::Unsupported => {
                    if slot.unsupported.map_or(true, |v| entry.version < v) {
                        slot.unsupported = Some(entry.version);
                        slot.unsupported_message = entry.message.clone();
                    }
                }
                AvailabilityKind::Obsoleted => {
                    if slot.obsoleted.as_ref().map_or(true, |o| entry.version < o.version) {
                        slot.obsoleted = Some(ObsoletedInfo {
                            version: entry.version,
                            message: entry.message.clone(),
                            url: entry.url.clone(),
                        });
                    }
                }
            }
        }
        contract.apply_implied_platforms();
        contract
    }

    /// `ios` facts also describe Mac Catalyst unless it is mentioned itself.
    fn apply_implied_platforms(&mut self) {
        let implied: Vec<(PlatformName, PlatformAvailability)> = self
            .platforms
            .iter()
            .filter_map(|(platform, availability)| {
                let implied = platform.implied()?;
                if self.platforms.contains_key(&implied) {
                    return None;
                }
                let copy = PlatformAvailability {
                    obsoleted: None,
                    ..availability.clone()
                };
                copy.has_support_facts().then_some((implied, copy))
            })
            .collect();
        self.platforms.extend(implied);
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.values().all(PlatformAvailability::is_empty)
    }

    pub fn get(&self, platform: &PlatformName) -> Option<&PlatformAvailability> {
        self.platforms.get(platform)
    }

    pub fn platforms(&self) -> impl Iterator<Item = (&PlatformName, &PlatformAvailability)> {
        self.platforms.iter()
    }

    pub fn is_allow_list(&self) -> bool {
        self.platforms.values().any(PlatformAvailability::is_allow)
    }

    /// Union of the allowed ranges per platform (allow-lists only).
    pub fn allowed_versions(&self, platform: &PlatformName) -> VersionSet {
        match self.platforms.get(platform) {
            Some(availability) => {
                if let Some(range) = availability.allowed_range() {
                    VersionSet::from_range(range)
                } else if let Some(reintroduced) = availability.reintroduced_at() {
                    VersionSet::from_range(VersionRange::at_least(reintroduced))
                } else {
                    VersionSet::empty()
                }
            }
            None => VersionSet::empty(),
        }
    }

    /// Platforms listed as allowed, for allow-lists.
    pub fn allowed_platforms(&self) -> Vec<PlatformName> {
        self.platforms
            .iter()
            .filter(|(_, a)| a.is_allow() || a.reintroduced_at().is_some())
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Worlds in which the symbol may run. Callers of the symbol can only be
    /// executing in these worlds.
    pub fn allowed_worlds(&self) -> GuardContext {
        if self.is_allow_list() {
            self.allowed_platforms()
                .into_iter()
                .fold(GuardContext::unreachable(), |acc, platform| {
                    let versions = self.allowed_versions(&platform);
                    acc.union(&GuardContext::only(platform, versions))
                })
        } else {
            self.platforms
                .iter()
                .filter_map(|(platform, a)| a.denied_range().map(|r| (platform, r)))
                .fold(GuardContext::all(), |acc, (platform, range)| {
                    acc.intersect(&GuardContext::except(platform.clone(), VersionSet::from_range(range)))
                })
        }
    }

    /// Merges an inner scope's layer over this (outer) contract.
    pub fn merge_child(&self, child: &AvailabilityContract) -> AvailabilityContract {
        let parent_allow_list = self.is_allow_list();
        let mut merged = self.platforms.clone();

        for (platform, c) in &child.platforms {
            let Some(p) = self.platforms.get(platform) else {
                let mut inherited = c.clone();
                // cannot add platforms to an enclosing allow-list
                if parent_allow_list && inherited.supported.is_some() {
                    inherited.supported = None;
                }
                if !inherited.is_empty() {
                    merged.insert(platform.clone(), inherited);
                }
                continue;
            };

            let mut result = p.clone();
            result.supported = match (p.supported, c.supported) {
                (Some(ps), Some(cs)) => Some(ps.max(cs)),
                (ps, cs) => ps.or(cs),
            };
            if let Some(cu) = c.unsupported {
                if p.unsupported.map_or(true, |pu| cu < pu) {
                    result.unsupported = Some(cu);
                    result.unsupported_message = c.unsupported_message.clone();
                }
                if c.supported.is_none() && p.supported.is_some_and(|ps| ps >= cu) {
                    result.supported = None;
                }
            }
            if c.obsoleted.is_some() {
                result.obsoleted = c.obsoleted.clone();
            }
            merged.insert(platform.clone(), result);
        }

        AvailabilityContract { platforms: merged }
    }
}

impl fmt::Display for AvailabilityContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .platforms
            .iter()
            .map(|(platform, a)| {
                let mut facts = Vec::new();
                if let Some(s) = a.supported {
                    facts.push(format!("supported {s}"));
                }
                if let Some(u) = a.unsupported {
                    facts.push(format!("unsupported {u}"));
                }
                if let Some(o) = &a.obsoleted {
                    facts.push(format!("obsoleted {}", o.version));
                }
                format!("{platform}({})", facts.join(", "))
            })
            .collect();
        write!(f, "[{}]", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(kind: AvailabilityKind, platform: &str, major: u32) -> AvailabilityEntry {
        AvailabilityEntry {
            kind,
            platform: PlatformName::canonical(platform),
            version: if major == 0 { Version::ZERO } else { Version::new(major, 0) },
            message: None,
            url: None,
        }
    }

    fn layer(entries: &[AvailabilityEntry]) -> AvailabilityContract {
        AvailabilityContract::from_entries(entries)
    }

    fn p(name: &str) -> PlatformName {
        PlatformName::canonical(name)
    }

    #[test]
    fn test_range_shapes() {
        let allow = layer(&[
            entry(AvailabilityKind::Supported, "windows", 10),
            entry(AvailabilityKind::Unsupported, "windows", 11),
        ]);
        assert!(allow.is_allow_list());
        assert_eq!(
            allow.get(&p("windows")).unwrap().allowed_range(),
            Some(VersionRange::new(Version::new(10, 0), Some(Version::new(11, 0))))
        );

        let reintroduced = layer(&[
            entry(AvailabilityKind::Unsupported, "windows", 0),
            entry(AvailabilityKind::Supported, "windows", 10),
        ]);
        assert!(!reintroduced.is_allow_list());
        assert_eq!(
            reintroduced.get(&p("windows")).unwrap().denied_range(),
            Some(VersionRange::before(Version::new(10, 0)))
        );
    }

    #[test]
    fn test_same_layer_picks_extremes() {
        let c = layer(&[
            entry(AvailabilityKind::Supported, "windows", 8),
            entry(AvailabilityKind::Supported, "windows", 10),
            entry(AvailabilityKind::Unsupported, "linux", 5),
            entry(AvailabilityKind::Unsupported, "linux", 3),
        ]);
        assert_eq!(c.get(&p("windows")).unwrap().supported, Some(Version::new(10, 0)));
        assert_eq!(c.get(&p("linux")).unwrap().unsupported, Some(Version::new(3, 0)));
    }

    #[test]
    fn test_ios_implies_catalyst() {
        let c = layer(&[entry(AvailabilityKind::Supported, "ios", 14)]);
        assert_eq!(c.get(&p("maccatalyst")).unwrap().supported, Some(Version::new(14, 0)));

        let explicit = layer(&[
            entry(AvailabilityKind::Supported, "ios", 14),
            entry(AvailabilityKind::Unsupported, "maccatalyst", 0),
        ]);
        assert_eq!(explicit.get(&p("maccatalyst")).unwrap().supported, None);
    }

    #[test]
    fn test_member_reintroduces_inside_denied_container() {
        let container = layer(&[entry(AvailabilityKind::Unsupported, "windows", 0)]);
        let member = layer(&[entry(AvailabilityKind::Supported, "windows", 10)]);
        let merged = container.merge_child(&member);
        let windows = merged.get(&p("windows")).unwrap();
        assert_eq!(windows.denied_range(), Some(VersionRange::before(Version::new(10, 0))));
    }

    #[test]
    fn test_member_cannot_widen_allow_list() {
        let container = layer(&[entry(AvailabilityKind::Supported, "windows", 10)]);
        let member = layer(&[
            entry(AvailabilityKind::Supported, "linux", 0),
            entry(AvailabilityKind::Supported, "windows", 8),
        ]);
        let merged = container.merge_child(&member);
        assert!(merged.get(&p("linux")).is_none());
        assert_eq!(merged.get(&p("windows")).unwrap().supported, Some(Version::new(10, 0)));
    }

    #[test]
    fn test_member_unsupported_clears_container_support() {
        let container = layer(&[entry(AvailabilityKind::Supported, "windows", 10)]);
        let member = layer(&[entry(AvailabilityKind::Unsupported, "windows", 0)]);
        let merged = container.merge_child(&member);
        let windows = merged.get(&p("windows")).unwrap();
        assert_eq!(windows.supported, None);
        assert_eq!(windows.denied_range(), Some(VersionRange::all()));
    }

    #[test]
    fn test_inherited_platforms_unchanged() {
        let assembly = layer(&[entry(AvailabilityKind::Unsupported, "browser", 0)]);
        let member = layer(&[entry(AvailabilityKind::Obsoleted, "windows", 10)]);
        let merged = assembly.merge_child(&member);
        assert_eq!(merged.get(&p("browser")), assembly.get(&p("browser")));
        assert!(merged.get(&p("windows")).unwrap().obsoleted.is_some());
    }

    #[test]
    fn test_allowed_worlds() {
        let allow = layer(&[entry(AvailabilityKind::Supported, "windows", 10)]);
        let worlds = allow.allowed_worlds();
        assert!(!worlds.others_possible());
        assert!(worlds.versions_of(&p("windows")).contains(Version::new(10, 0)));
        assert!(!worlds.versions_of(&p("windows")).contains(Version::new(8, 0)));

        let deny = layer(&[entry(AvailabilityKind::Unsupported, "browser", 0)]);
        let worlds = deny.allowed_worlds();
        assert!(worlds.others_possible());
        assert!(worlds.versions_of(&p("browser")).is_empty());

        assert!(AvailabilityContract::new().allowed_worlds().is_all());
    }
}
