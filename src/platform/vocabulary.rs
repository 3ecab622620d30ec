//! Platform vocabulary: built-in names unioned with configured custom names,
//! plus parsing of platform-attribute strings such as `"Windows10.1.2.3"`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use super::name::PlatformName;
use super::version::{Version, MAX_VERSION_PARTS};
use crate::core::PlatformError;

/// `<letters><digit...>`; everything after the first digit is the version part.
static PLATFORM_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[^0-9]*)(?P<version>[0-9].*)?$").expect("Invalid platform attribute regex")
});

static LETTERS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+$").expect("Invalid platform name regex"));

/// Result of parsing a platform attribute string. Always produced, even when
/// `errors` is non-empty: the analysis degrades instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPlatform {
    pub name: PlatformName,
    pub version: Version,
    pub errors: Vec<PlatformError>,
}

impl ParsedPlatform {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Recognised platform names for one compilation.
#[derive(Debug, Clone, Default)]
pub struct PlatformVocabulary {
    custom: BTreeSet<String>,
}

impl PlatformVocabulary {
    /// Vocabulary with only the built-in platforms.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Built-in platforms plus `custom` names from project configuration.
    pub fn with_custom<I, S>(custom: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let custom = custom
            .into_iter()
            .map(|name| PlatformName::canonical(name.as_ref()).as_str().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { custom }
    }

    pub fn custom_platforms(&self) -> impl Iterator<Item = &str> {
        self.custom.iter().map(|s| s.as_str())
    }

    pub fn is_known(&self, name: &PlatformName) -> bool {
        name.builtin().is_some() || self.custom.contains(name.as_str())
    }

    /// Canonicalises and validates a platform name.
    pub fn parse_platform_name(&self, raw: &str) -> Result<PlatformName, PlatformError> {
        if !LETTERS_ONLY.is_match(raw.trim()) {
            return Err(PlatformError::UnknownPlatform(raw.to_string()));
        }
        let name = PlatformName::canonical(raw);
        if self.is_known(&name) {
            Ok(name)
        } else {
            Err(PlatformError::UnknownPlatform(raw.to_string()))
        }
    }

    /// Maximum version components accepted for `platform`. Custom and unknown
    /// platforms accept any arity.
    pub fn max_version_parts(&self, platform: &PlatformName) -> usize {
        platform
            .builtin()
            .map(|p| p.max_version_parts)
            .unwrap_or(MAX_VERSION_PARTS)
    }

    /// Parses the version part of an attribute under the platform's arity rule.
    /// An empty string is always valid and means "any version".
    pub fn parse_version(&self, platform: &PlatformName, raw: &str) -> Result<Version, PlatformError> {
        if raw.is_empty() {
            return Ok(Version::ZERO);
        }
        let not_parseable = || PlatformError::NotParseableVersion {
            platform: platform.to_string(),
            version: raw.to_string(),
        };

        let mut parts = Vec::new();
        for piece in raw.split('.') {
            if piece.is_empty() || !piece.bytes().all(|b| b.is_ascii_digit()) {
                return Err(not_parseable());
            }
            parts.push(piece.parse::<u32>().map_err(|_| not_parseable())?);
        }

        let max = self.max_version_parts(platform);
        let arity_error = |expected: String| PlatformError::InvalidVersionArity {
            platform: platform.to_string(),
            version: raw.to_string(),
            expected,
        };
        if max == 0 {
            return Err(arity_error("no version part".to_string()));
        }
        if parts.len() > max {
            return Err(arity_error(format!("2 to {max} parts")));
        }
        Version::from_parts(&parts)
            .map(Version::normalized)
            .ok_or_else(|| arity_error(format!("2 to {max} parts")))
    }

    /// Splits `"Windows10.1.2.3"` into platform and version, validating both.
    /// Errors are collected; the returned name and version are best-effort
    /// (`Version::ZERO` when the version is unusable).
    pub fn parse_attribute(&self, raw: &str) -> ParsedPlatform {
        let raw = raw.trim();
        let (name_part, version_part) = match PLATFORM_ATTRIBUTE.captures(raw) {
            Some(caps) => (
                caps.name("name").map(|m| m.as_str()).unwrap_or_default(),
                caps.name("version").map(|m| m.as_str()).unwrap_or_default(),
            ),
            None => (raw, ""),
        };

        let mut errors = Vec::new();
        let name = match self.parse_platform_name(name_part) {
            Ok(name) => name,
            Err(err) => {
                errors.push(err);
                PlatformName::canonical(name_part)
            }
        };
        let version = match self.parse_version(&name, version_part) {
            Ok(version) => version,
            Err(err) => {
                errors.push(err);
                Version::ZERO
            }
        };

        ParsedPlatform { name, version, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vocab() -> PlatformVocabulary {
        PlatformVocabulary::with_custom(["Solaris"])
    }

    #[test]
    fn splits_trailing_version() {
        let parsed = vocab().parse_attribute("Windows10.1.2.3");
        assert!(parsed.is_valid());
        assert_eq!(parsed.name.as_str(), "windows");
        assert_eq!(parsed.version, Version::from_parts(&[10, 1, 2, 3]).unwrap());
    }

    #[test]
    fn bare_platform_is_any_version() {
        let parsed = vocab().parse_attribute("ios");
        assert!(parsed.is_valid());
        assert!(parsed.version.is_zero());
    }

    #[test]
    fn single_component_normalised() {
        let parsed = vocab().parse_attribute("windows10");
        assert!(parsed.is_valid());
        assert_eq!(parsed.version.to_string(), "10.0");
    }

    #[test]
    fn no_version_platforms_reject_versions() {
        let parsed = vocab().parse_attribute("browser1.0");
        assert_eq!(parsed.name.as_str(), "browser");
        assert!(parsed.version.is_zero());
        assert!(matches!(parsed.errors[0], PlatformError::InvalidVersionArity { .. }));
    }

    #[test]
    fn arity_limits_per_platform() {
        let v = vocab();
        assert!(v.parse_attribute("android1.2.3.4").is_valid());
        assert!(!v.parse_attribute("ios1.2.3.4").is_valid());
        assert!(v.parse_attribute("macos12.0.1").is_valid());
    }

    #[test]
    fn garbage_version_not_parseable() {
        let parsed = vocab().parse_attribute("windows10.x");
        assert!(matches!(parsed.errors[0], PlatformError::NotParseableVersion { .. }));
        let parsed = vocab().parse_attribute("windows10..1");
        assert!(matches!(parsed.errors[0], PlatformError::NotParseableVersion { .. }));
    }

    #[test]
    fn unknown_platform_still_recorded() {
        let parsed = vocab().parse_attribute("Plan9");
        assert_eq!(parsed.name.as_str(), "plan");
        assert!(matches!(parsed.errors[0], PlatformError::UnknownPlatform(_)));
    }

    #[test]
    fn custom_platforms_are_known() {
        let v = vocab();
        assert_eq!(v.parse_platform_name("SOLARIS").unwrap().as_str(), "solaris");
        assert!(v.parse_attribute("solaris11.4").is_valid());
        assert!(PlatformVocabulary::builtin().parse_platform_name("solaris").is_err());
    }
}
