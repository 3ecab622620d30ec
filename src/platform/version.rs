//! Versions of up to four numeric components.
//!
//! Ordering is lexicographic with missing trailing components treated as 0,
//! so `10.0` and `10.0.0.0` are the same version.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Maximum number of version components.
pub const MAX_VERSION_PARTS: usize = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Version {
    parts: [u32; MAX_VERSION_PARTS],
    /// Number of components as written (0 for "no version").
    len: u8,
}

impl Version {
    /// The minimum version; also used for "any version" and for
    /// best-effort defaults after a parse error.
    pub const ZERO: Version = Version { parts: [0; MAX_VERSION_PARTS], len: 0 };

    pub fn new(major: u32, minor: u32) -> Self {
        Self { parts: [major, minor, 0, 0], len: 2 }
    }

    /// Builds a version from 0..=4 components. Returns `None` for more.
    pub fn from_parts(parts: &[u32]) -> Option<Self> {
        if parts.len() > MAX_VERSION_PARTS {
            return None;
        }
        let mut out = [0u32; MAX_VERSION_PARTS];
        out[..parts.len()].copy_from_slice(parts);
        Some(Self { parts: out, len: parts.len() as u8 })
    }

    pub fn parts(&self) -> &[u32] {
        &self.parts[..self.len as usize]
    }

    pub fn major(&self) -> u32 {
        self.parts[0]
    }

    /// Number of components as written.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when every component is zero, i.e. the version imposes no bound.
    pub fn is_zero(&self) -> bool {
        self.parts.iter().all(|p| *p == 0)
    }

    /// Pads a single major component to `major.0`.
    pub fn normalized(self) -> Self {
        if self.len == 1 {
            Self { len: 2, ..self }
        } else {
            self
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = (self.len as usize).max(2);
        let text: Vec<String> = self.parts[..shown].iter().map(|p| p.to_string()).collect();
        write!(f, "{}", text.join("."))
    }
}
