//! Half-open version ranges and normalised sets of them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::version::Version;

/// `[start, end)`; `end == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRange {
    pub start: Version,
    pub end: Option<Version>,
}

impl VersionRange {
    pub fn new(start: Version, end: Option<Version>) -> Self {
        Self { start, end }
    }

    /// Every version.
    pub fn all() -> Self {
        Self { start: Version::ZERO, end: None }
    }

    /// `[start, inf)`.
    pub fn at_least(start: Version) -> Self {
        Self { start, end: None }
    }

    /// `[0, end)`.
    pub fn before(end: Version) -> Self {
        Self { start: Version::ZERO, end: Some(end) }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.end, Some(end) if end <= self.start)
    }

    pub fn is_all(&self) -> bool {
        self.start.is_zero() && self.end.is_none()
    }

    pub fn contains(&self, version: Version) -> bool {
        version >= self.start && self.end.map_or(true, |end| version < end)
    }

    /// True when `other` is entirely inside `self`.
    pub fn covers(&self, other: &VersionRange) -> bool {
        if other.is_empty() {
            return true;
        }
        other.start >= self.start && end_le(other.end, self.end)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start.is_zero(), self.end) {
            (true, None) => write!(f, "*"),
            (false, None) => write!(f, "[{}, *)", self.start),
            (_, Some(end)) => write!(f, "[{}, {})", self.start, end),
        }
    }
}

/// `a <= b` on upper bounds, `None` being infinity.
fn end_le(a: Option<Version>, b: Option<Version>) -> bool {
    match (a, b) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(a), Some(b)) => a <= b,
    }
}

fn min_end(a: Option<Version>, b: Option<Version>) -> Option<Version> {
    if end_le(a, b) {
        a
    } else {
        b
    }
}

fn max_end(a: Option<Version>, b: Option<Version>) -> Option<Version> {
    if end_le(a, b) {
        b
    } else {
        a
    }
}

/// Sorted, disjoint, non-adjacent ranges. The empty set is "no version".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<VersionRange>", into = "Vec<VersionRange>")]
pub struct VersionSet {
    ranges: Vec<VersionRange>,
}

impl VersionSet {
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn all() -> Self {
        Self { ranges: vec![VersionRange::all()] }
    }

    pub fn from_range(range: VersionRange) -> Self {
        Self::from_ranges(std::iter::once(range))
    }

    pub fn from_ranges<I: IntoIterator<Item = VersionRange>>(ranges: I) -> Self {
        let mut ranges: Vec<VersionRange> = ranges.into_iter().filter(|r| !r.is_empty()).collect();
        ranges.sort_by(|a, b| a.start.cmp(&b.start));

        let mut merged: Vec<VersionRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                // overlapping or touching
                Some(last) if last.end.map_or(true, |end| range.start <= end) => {
                    last.end = max_end(last.end, range.end);
                }
                _ => merged.push(range),
            }
        }
        Self { ranges: merged }
    }

    pub fn ranges(&self) -> &[VersionRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn is_all(&self) -> bool {
        self.ranges.len() == 1 && self.ranges[0].is_all()
    }

    pub fn contains(&self, version: Version) -> bool {
        self.ranges.iter().any(|r| r.contains(version))
    }

    pub fn union(&self, other: &VersionSet) -> VersionSet {
        Self::from_ranges(self.ranges.iter().chain(other.ranges.iter()).copied())
    }

    pub fn intersect(&self, other: &VersionSet) -> VersionSet {
        let mut out = Vec::new();
        for a in &self.ranges {
            for b in &other.ranges {
                let candidate = VersionRange::new(a.start.max(b.start), min_end(a.end, b.end));
                if !candidate.is_empty() {
                    out.push(candidate);
                }
            }
        }
        Self::from_ranges(out)
    }

    pub fn complement(&self) -> VersionSet {
        let mut out = Vec::new();
        let mut cursor = Some(Version::ZERO);
        for range in &self.ranges {
            let Some(start) = cursor else { break };
            if range.start > start {
                out.push(VersionRange::new(start, Some(range.start)));
            }
            cursor = range.end;
        }
        if let Some(start) = cursor {
            out.push(VersionRange::at_least(start));
        }
        Self::from_ranges(out)
    }

    pub fn difference(&self, other: &VersionSet) -> VersionSet {
        self.intersect(&other.complement())
    }

    pub fn intersects(&self, other: &VersionSet) -> bool {
        !self.intersect(other).is_empty()
    }

    pub fn is_subset_of(&self, other: &VersionSet) -> bool {
        self.ranges
            .iter()
            .all(|r| other.ranges.iter().any(|o| o.covers(r)))
    }
}

impl From<Vec<VersionRange>> for VersionSet {
    fn from(value: Vec<VersionRange>) -> Self {
        Self::from_ranges(value)
    }
}

impl From<VersionSet> for Vec<VersionRange> {
    fn from(value: VersionSet) -> Self {
        value.ranges
    }
}

impl From<VersionRange> for VersionSet {
    fn from(value: VersionRange) -> Self {
        Self::from_range(value)
    }
}

impl fmt::Display for VersionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ranges.is_empty() {
            return write!(f, "{{}}");
        }
        let parts: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(major: u32, minor: u32) -> Version {
        Version::new(major, minor)
    }

    #[test]
    fn adjacent_ranges_merge() {
        let set = VersionSet::from_ranges([
            VersionRange::new(v(1, 0), Some(v(2, 0))),
            VersionRange::new(v(2, 0), Some(v(3, 0))),
        ]);
        assert_eq!(set.ranges(), &[VersionRange::new(v(1, 0), Some(v(3, 0)))]);
    }

    #[test]
    fn complement_of_from_is_before() {
        let set = VersionSet::from_range(VersionRange::at_least(v(10, 0)));
        assert_eq!(set.complement(), VersionSet::from_range(VersionRange::before(v(10, 0))));
        assert!(set.complement().complement() == set);
    }

    #[test]
    fn complement_of_all_is_empty() {
        assert!(VersionSet::all().complement().is_empty());
        assert!(VersionSet::empty().complement().is_all());
    }

    #[test]
    fn intersect_and_subset() {
        let a = VersionSet::from_range(VersionRange::at_least(v(10, 0)));
        let b = VersionSet::from_range(VersionRange::new(v(8, 0), Some(v(12, 0))));
        let both = a.intersect(&b);
        assert_eq!(both.ranges(), &[VersionRange::new(v(10, 0), Some(v(12, 0)))]);
        assert!(both.is_subset_of(&a));
        assert!(both.is_subset_of(&b));
        assert!(!a.is_subset_of(&b));
        assert!(VersionSet::empty().is_subset_of(&b));
    }

    #[test]
    fn difference_splits_range() {
        let hole = VersionSet::from_range(VersionRange::new(v(2, 0), Some(v(3, 0))));
        let rest = VersionSet::all().difference(&hole);
        assert_eq!(
            rest.ranges(),
            &[VersionRange::before(v(2, 0)), VersionRange::at_least(v(3, 0))]
        );
        assert!(!rest.contains(v(2, 5)));
        assert!(rest.contains(v(3, 0)));
    }

    #[test]
    fn zero_start_complement_has_no_empty_prefix() {
        let set = VersionSet::from_range(VersionRange::before(v(5, 0)));
        assert_eq!(set.complement().ranges(), &[VersionRange::at_least(v(5, 0))]);
    }
}
