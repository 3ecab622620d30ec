/*!
# Analyzer Configuration

Configuration for the platform-compatibility analyzer. Loaded from TOML,
YAML or JSON (chosen by file extension):

```toml
enabled = true
custom_platforms = ["solaris"]
minimum_target_framework = "5.0"
analyze_below_minimum = false

[rules.CA1422]
enabled = true
severity = "warning"
```
*/

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::diagnostics::{codes, PlatformDiagnostic, Severity};
use crate::platform::PlatformVocabulary;

/// Per-rule overrides, keyed by diagnostic code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Replaces the rule's default severity when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self { enabled: true, severity: None }
    }
}

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_minimum_target() -> String {
    "5.0".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Platform names recognised in addition to the built-in vocabulary.
    #[serde(default)]
    pub custom_platforms: Vec<String>,

    /// Target framework (e.g. `net6.0`) used when the compilation has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_framework: Option<String>,

    /// Below this framework version analysis is skipped.
    #[serde(default = "default_minimum_target")]
    pub minimum_target_framework: String,

    #[serde(default)]
    pub analyze_below_minimum: bool,

    #[serde(default)]
    pub rules: HashMap<String, RuleSettings>,

    /// Worker threads; defaults to the number of CPUs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        let rules = codes::ALL
            .iter()
            .map(|code| (code.to_string(), RuleSettings::default()))
            .collect();
        Self {
            version: default_version(),
            enabled: true,
            custom_platforms: Vec::new(),
            target_framework: None,
            minimum_target_framework: default_minimum_target(),
            analyze_below_minimum: false,
            rules,
            threads: None,
        }
    }
}

impl AnalyzerConfig {
    /// Loads a configuration file. The format follows the extension:
    /// `.toml`, `.yml`/`.yaml` or `.json`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read analyzer config from {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let config: Self = match extension.as_str() {
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config from {}", path.display()))?,
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config from {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config from {}", path.display()))?,
            other => bail!("Unsupported config format '{}' for {}", other, path.display()),
        };
        Ok(config)
    }

    /// Saves the configuration as TOML.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize analyzer config to TOML")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write analyzer config to {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Human-readable problems; an empty list means the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let vocabulary = PlatformVocabulary::builtin();
        for name in &self.custom_platforms {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
                warnings.push(format!("Custom platform '{}' must consist of letters only", name));
            } else if vocabulary.parse_platform_name(name).is_ok() {
                warnings.push(format!("Custom platform '{}' is already a built-in platform", name));
            }
        }

        if framework_version(&self.minimum_target_framework).is_none() {
            warnings.push(format!(
                "Minimum target framework '{}' is not a recognised framework version",
                self.minimum_target_framework
            ));
        }
        if let Some(tfm) = &self.target_framework {
            if framework_version(tfm).is_none() {
                warnings.push(format!("Target framework '{}' is not recognised", tfm));
            }
        }

        for rule_id in self.rules.keys() {
            if !codes::ALL.contains(&rule_id.as_str()) {
                warnings.push(format!("Unknown rule '{}'", rule_id));
            }
        }

        if self.threads == Some(0) {
            warnings.push("Thread count must be at least 1".to_string());
        }

        warnings
    }

    /// Commented TOML template with every option at its default.
    pub fn generate_default_config() -> String {
        let mut out = String::new();
        out.push_str("# Platform compatibility analyzer configuration\n\n");
        out.push_str("version = \"1.0\"\n");
        out.push_str("# Set to false to skip the analysis entirely\n");
        out.push_str("enabled = true\n\n");
        out.push_str("# Platform names accepted in addition to the built-in ones\n");
        out.push_str("custom_platforms = []\n\n");
        out.push_str("# Used when the compilation does not state its target framework\n");
        out.push_str("# target_framework = \"net8.0\"\n\n");
        out.push_str("# Analysis is skipped for targets below this version...\n");
        out.push_str("minimum_target_framework = \"5.0\"\n");
        out.push_str("# ...unless this is true\n");
        out.push_str("analyze_below_minimum = false\n\n");
        out.push_str("# Worker threads (defaults to the number of CPUs)\n");
        out.push_str("# threads = 4\n");
        for (code, description) in [
            (codes::PLATFORM_COMPATIBILITY, "Validate platform compatibility"),
            (codes::INVALID_PLATFORM_ATTRIBUTE, "Invalid platform name or version in attribute"),
            (codes::OBSOLETED_PLATFORM, "Validate obsoleted platform APIs"),
        ] {
            out.push_str(&format!("\n# {}\n[rules.{}]\nenabled = true\n", description, code));
            out.push_str("# severity = \"warning\"  # error | warning | info | hint\n");
        }
        out
    }

    pub fn vocabulary(&self) -> PlatformVocabulary {
        PlatformVocabulary::with_custom(&self.custom_platforms)
    }

    pub fn thread_count(&self) -> usize {
        self.threads.filter(|t| *t > 0).unwrap_or_else(num_cpus::get)
    }

    /// Whether a compilation targeting `target_framework` should be analysed.
    /// Falls back to the configured target when the compilation has none;
    /// unknown frameworks are analysed.
    pub fn should_analyze(&self, target_framework: Option<&str>) -> bool {
        if !self.enabled {
            return false;
        }
        if self.analyze_below_minimum {
            return true;
        }
        let tfm = target_framework.or(self.target_framework.as_deref());
        match (tfm.and_then(framework_version), framework_version(&self.minimum_target_framework)) {
            (Some(target), Some(minimum)) => target >= minimum,
            _ => true,
        }
    }

    pub fn is_rule_enabled(&self, code: &str) -> bool {
        self.rules.get(code).map_or(true, |r| r.enabled)
    }

    /// Drops diagnostics of disabled rules and applies severity overrides.
    pub fn apply_rule_settings(&self, diagnostics: Vec<PlatformDiagnostic>) -> Vec<PlatformDiagnostic> {
        diagnostics
            .into_iter()
            .filter(|d| self.is_rule_enabled(&d.code))
            .map(|d| match self.rules.get(&d.code).and_then(|r| r.severity) {
                Some(severity) => d.with_severity(severity),
                None => d,
            })
            .collect()
    }
}

/// `(major, minor)` of a target framework moniker or bare version:
/// `net8.0`, `net5.0-windows`, `netcoreapp3.1`, `net48`, `5.0`.
pub fn framework_version(tfm: &str) -> Option<(u32, u32)> {
    let tfm = tfm.trim().to_ascii_lowercase();
    let base = tfm.split('-').next().unwrap_or_default();
    if base.starts_with("netstandard") {
        return Some((0, 0));
    }
    let digits = base
        .strip_prefix("netcoreapp")
        .or_else(|| base.strip_prefix("net"))
        .unwrap_or(base);
    if digits.is_empty() {
        return None;
    }
    match digits.split_once('.') {
        Some((major, minor)) => Some((major.parse().ok()?, minor.parse().ok()?)),
        // .NET Framework monikers: net48, net472
        None if base.starts_with("net") => {
            if !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let mut chars = digits.chars();
            let major = chars.next()?.to_digit(10)?;
            let minor = chars.next().and_then(|c| c.to_digit(10)).unwrap_or(0);
            Some((major, minor))
        }
        None => Some((digits.parse().ok()?, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Span;
    use crate::diagnostics::{Location, RuleKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.rules.len(), 3);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_load_each_format() {
        let toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::fs::write(toml_file.path(), "custom_platforms = [\"solaris\"]\nthreads = 2\n").unwrap();
        let config = AnalyzerConfig::load_from_file(toml_file.path()).unwrap();
        assert_eq!(config.custom_platforms, vec!["solaris".to_string()]);
        assert_eq!(config.thread_count(), 2);

        let mut yaml_file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml_file, "analyze_below_minimum: true").unwrap();
        let config = AnalyzerConfig::load_from_file(yaml_file.path()).unwrap();
        assert!(config.analyze_below_minimum);

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json_file, r#"{{"rules": {{"CA1422": {{"enabled": false}}}}}}"#).unwrap();
        let config = AnalyzerConfig::load_from_file(json_file.path()).unwrap();
        assert!(!config.is_rule_enabled("CA1422"));
        assert!(config.is_rule_enabled("CA1416"));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = NamedTempFile::new().unwrap();
        assert!(AnalyzerConfig::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_generated_template_parses() {
        let template = AnalyzerConfig::generate_default_config();
        let config: AnalyzerConfig = toml::from_str(&template).unwrap();
        assert_eq!(config.minimum_target_framework, "5.0");
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let mut config = AnalyzerConfig::default();
        config.custom_platforms.push("haiku".to_string());
        config.save_to_file(file.path()).unwrap();
        assert_eq!(AnalyzerConfig::load_from_file(file.path()).unwrap(), config);
    }

    #[test]
    fn test_validation_warnings() {
        let mut config = AnalyzerConfig::default();
        config.custom_platforms = vec!["windows".into(), "my-os".into()];
        config.rules.insert("CA9999".into(), RuleSettings::default());
        config.threads = Some(0);
        assert_eq!(config.validate().len(), 4);
    }

    #[test]
    fn test_target_framework_gate() {
        let config = AnalyzerConfig::default();
        assert!(config.should_analyze(Some("net6.0")));
        assert!(config.should_analyze(Some("net5.0-windows10.0.19041")));
        assert!(!config.should_analyze(Some("netcoreapp3.1")));
        assert!(!config.should_analyze(Some("net48")));
        assert!(!config.should_analyze(Some("netstandard2.0")));
        assert!(config.should_analyze(None));

        let lenient = AnalyzerConfig { analyze_below_minimum: true, ..AnalyzerConfig::default() };
        assert!(lenient.should_analyze(Some("netcoreapp3.1")));

        let disabled = AnalyzerConfig { enabled: false, ..AnalyzerConfig::default() };
        assert!(!disabled.should_analyze(Some("net8.0")));
    }

    #[test]
    fn test_apply_rule_settings() {
        let mut config = AnalyzerConfig::default();
        config.rules.insert(
            "CA1416".into(),
            RuleSettings { enabled: true, severity: Some(Severity::Error) },
        );
        config.rules.insert("CA1422".into(), RuleSettings { enabled: false, severity: None });

        let location = Location::new("a.cs", Span::zero());
        let diagnostics = vec![
            PlatformDiagnostic::new(RuleKind::Unsupported, location.clone(), "x"),
            PlatformDiagnostic::new(RuleKind::Obsoleted, location, "y"),
        ];
        let applied = config.apply_rule_settings(diagnostics);
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].severity, Severity::Error);
    }
}
