//! Canonical platform names and the built-in vocabulary.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Case-folded canonical platform identifier (`windows`, `macos`, ...).
///
/// Cloning is cheap; names are shared between contracts and contexts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PlatformName(Arc<str>);

impl PlatformName {
    /// Canonicalises `name` (case fold + alias resolution) without checking
    /// that the platform is known.
    pub fn canonical(name: &str) -> Self {
        let folded = name.trim().to_ascii_lowercase();
        let resolved = ALIASES
            .iter()
            .find(|(alias, _)| *alias == folded)
            .map(|(_, target)| (*target).to_string())
            .unwrap_or(folded);
        Self(Arc::from(resolved))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Built-in description, `None` for custom platforms.
    pub fn builtin(&self) -> Option<&'static BuiltinPlatform> {
        BUILTIN_PLATFORMS.iter().find(|p| p.name == self.as_str())
    }

    /// Platforms a guard or contract for `self` also covers
    /// (Mac Catalyst runs iOS code).
    pub fn implied(&self) -> Option<PlatformName> {
        if self.as_str() == "ios" {
            Some(PlatformName::canonical("maccatalyst"))
        } else {
            None
        }
    }
}

impl From<String> for PlatformName {
    fn from(value: String) -> Self {
        Self::canonical(&value)
    }
}

impl From<&str> for PlatformName {
    fn from(value: &str) -> Self {
        Self::canonical(value)
    }
}

impl From<PlatformName> for String {
    fn from(value: PlatformName) -> Self {
        value.0.to_string()
    }
}

impl Borrow<str> for PlatformName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Built-in platform with its accepted version arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinPlatform {
    pub name: &'static str,
    /// Name as used by `OperatingSystem.Is<Name>()` guard methods.
    pub guard_name: &'static str,
    /// Maximum number of version components; 0 means no version allowed.
    pub max_version_parts: usize,
}

pub const BUILTIN_PLATFORMS: &[BuiltinPlatform] = &[
    BuiltinPlatform { name: "windows", guard_name: "Windows", max_version_parts: 4 },
    BuiltinPlatform { name: "linux", guard_name: "Linux", max_version_parts: 0 },
    BuiltinPlatform { name: "macos", guard_name: "MacOS", max_version_parts: 3 },
    BuiltinPlatform { name: "ios", guard_name: "IOS", max_version_parts: 3 },
    BuiltinPlatform { name: "maccatalyst", guard_name: "MacCatalyst", max_version_parts: 3 },
    BuiltinPlatform { name: "tvos", guard_name: "TvOS", max_version_parts: 3 },
    BuiltinPlatform { name: "watchos", guard_name: "WatchOS", max_version_parts: 3 },
    BuiltinPlatform { name: "android", guard_name: "Android", max_version_parts: 4 },
    BuiltinPlatform { name: "browser", guard_name: "Browser", max_version_parts: 0 },
    BuiltinPlatform { name: "freebsd", guard_name: "FreeBSD", max_version_parts: 0 },
];

const ALIASES: &[(&str, &str)] = &[("osx", "macos")];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(PlatformName::canonical("Windows"), PlatformName::canonical("WINDOWS"));
        assert_eq!(PlatformName::canonical("Windows").as_str(), "windows");
    }

    #[test]
    fn osx_is_macos() {
        assert_eq!(PlatformName::canonical("OSX"), PlatformName::canonical("macOS"));
    }

    #[test]
    fn builtin_lookup() {
        assert_eq!(PlatformName::canonical("browser").builtin().unwrap().max_version_parts, 0);
        assert!(PlatformName::canonical("solaris").builtin().is_none());
        assert_eq!(
            PlatformName::canonical("iOS").implied(),
            Some(PlatformName::canonical("maccatalyst"))
        );
    }

    #[test]
    fn serde_round_trip_canonicalises() {
        let name: PlatformName = serde_json::from_str("\"Linux\"").unwrap();
        assert_eq!(name.as_str(), "linux");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"linux\"");
    }
}
