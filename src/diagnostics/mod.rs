/*!
# Platform Diagnostics

The output tuple produced for every flagged call site or malformed platform
attribute. Rule kinds map onto three public diagnostic codes:

- `CA1416` - call site reachable on a platform the target does not support
- `CA1418` - invalid platform name or version in an attribute
- `CA1422` - call site reachable on a platform where the target is obsolete
*/

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::Span;

/// Diagnostic codes.
pub mod codes {
    pub const PLATFORM_COMPATIBILITY: &str = "CA1416";
    pub const INVALID_PLATFORM_ATTRIBUTE: &str = "CA1418";
    pub const OBSOLETED_PLATFORM: &str = "CA1422";

    pub const ALL: &[&str] = &[PLATFORM_COMPATIBILITY, INVALID_PLATFORM_ATTRIBUTE, OBSOLETED_PLATFORM];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    #[default]
    Warning,
    Info,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Obsoleted,
    Unsupported,
    OnlySupported,
    InvalidPlatformName,
    InvalidVersion,
}

impl RuleKind {
    pub fn code(self) -> &'static str {
        match self {
            RuleKind::Obsoleted => codes::OBSOLETED_PLATFORM,
            RuleKind::Unsupported | RuleKind::OnlySupported => codes::PLATFORM_COMPATIBILITY,
            RuleKind::InvalidPlatformName | RuleKind::InvalidVersion => codes::INVALID_PLATFORM_ATTRIBUTE,
        }
    }

    pub fn default_severity(self) -> Severity {
        match self {
            RuleKind::Obsoleted => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

/// Where a diagnostic is reported.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub length: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, span: Span) -> Self {
        Self {
            file: file.into(),
            line: span.start.line,
            column: span.start.column,
            offset: span.start.offset,
            length: span.len(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformDiagnostic {
    pub rule_kind: RuleKind,
    pub code: String,
    pub severity: Severity,
    pub location: Location,
    /// `Type.Member` of the referenced symbol (or the attributed symbol for CA1418).
    pub target: String,
    /// Platform(s) the diagnostic is about, comma separated for allow-lists.
    pub platform: String,
    pub version_description: String,
    pub reachability_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Rendered user-facing text.
    pub text: String,
}

impl PlatformDiagnostic {
    pub fn new(rule_kind: RuleKind, location: Location, text: impl Into<String>) -> Self {
        Self {
            rule_kind,
            code: rule_kind.code().to_string(),
            severity: rule_kind.default_severity(),
            location,
            target: String::new(),
            platform: String::new(),
            version_description: String::new(),
            reachability_description: String::new(),
            message: None,
            url: None,
            text: text.into(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_version_description(mut self, description: impl Into<String>) -> Self {
        self.version_description = description.into();
        self
    }

    pub fn with_reachability(mut self, description: impl Into<String>) -> Self {
        self.reachability_description = description.into();
        self
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for PlatformDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}: {}", self.location, self.severity, self.code, self.text)
    }
}

/// Sort order used in reports: file, line, column, then code.
pub fn sort_diagnostics(diagnostics: &mut [PlatformDiagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.location
            .cmp(&b.location)
            .then_with(|| a.code.cmp(&b.code))
            .then_with(|| a.text.cmp(&b.text))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_codes_and_severities() {
        assert_eq!(RuleKind::Obsoleted.code(), "CA1422");
        assert_eq!(RuleKind::OnlySupported.code(), "CA1416");
        assert_eq!(RuleKind::InvalidVersion.code(), "CA1418");
        assert_eq!(RuleKind::Obsoleted.default_severity(), Severity::Info);
        assert_eq!(RuleKind::Unsupported.default_severity(), Severity::Warning);
    }

    #[test]
    fn test_display_line() {
        let diagnostic = PlatformDiagnostic::new(
            RuleKind::Unsupported,
            Location::new("Program.cs", Span::at(12, 9, 4)),
            "something is unsupported",
        );
        assert_eq!(diagnostic.location.length, 4);
        assert_eq!(
            diagnostic.to_string(),
            "Program.cs:12:9: warning CA1416: something is unsupported"
        );
    }

    #[test]
    fn test_severity_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Hint).unwrap(), "\"hint\"");
        let parsed: Severity = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, Severity::Error);
    }
}
