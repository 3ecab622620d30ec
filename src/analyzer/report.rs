/*!
# Analysis Report

Result of analysing one or more compilations: the diagnostics plus the
bookkeeping the CLI prints at the end of a run.
*/

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::diagnostics::{sort_diagnostics, PlatformDiagnostic, Severity};

/// How a single body walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyOutcome {
    Analyzed,
    Cancelled,
    Failed,
}

/// Run metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub analyzer_version: String,
    /// Compilations that were analysed (not skipped).
    pub compilations: Vec<String>,
    /// Compilations skipped by the target-framework gate or `enabled = false`.
    pub skipped: Vec<String>,
    pub bodies_analyzed: usize,
    /// Bodies whose walk was cancelled; their diagnostics are discarded.
    pub bodies_cancelled: usize,
    /// Bodies whose walk failed for another reason; also without diagnostics.
    #[serde(default)]
    pub bodies_failed: usize,
    pub contracts_built: usize,
    #[serde(default)]
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    diagnostics: Vec<PlatformDiagnostic>,
    metadata: ReportMetadata,
}

impl AnalysisReport {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            metadata: ReportMetadata {
                analyzer_version: env!("CARGO_PKG_VERSION").to_string(),
                ..ReportMetadata::default()
            },
        }
    }

    pub(crate) fn for_compilation(name: &str) -> Self {
        let mut report = Self::new();
        report.metadata.compilations.push(name.to_string());
        report
    }

    pub(crate) fn skipped(name: &str) -> Self {
        let mut report = Self::new();
        report.metadata.skipped.push(name.to_string());
        report
    }

    pub fn add_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = PlatformDiagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub(crate) fn record_body(&mut self, outcome: BodyOutcome) {
        let counter = match outcome {
            BodyOutcome::Analyzed => &mut self.metadata.bodies_analyzed,
            BodyOutcome::Cancelled => &mut self.metadata.bodies_cancelled,
            BodyOutcome::Failed => &mut self.metadata.bodies_failed,
        };
        *counter += 1;
    }

    pub(crate) fn set_contracts_built(&mut self, count: usize) {
        self.metadata.contracts_built = count;
    }

    pub(crate) fn set_duration(&mut self, duration: Duration) {
        self.metadata.duration_ms = duration.as_millis();
    }

    pub fn diagnostics(&self) -> &[PlatformDiagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<PlatformDiagnostic> {
        self.diagnostics
    }

    pub fn metadata(&self) -> &ReportMetadata {
        &self.metadata
    }

    pub fn was_skipped(&self) -> bool {
        self.metadata.compilations.is_empty() && !self.metadata.skipped.is_empty()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }

    pub fn error_count(&self) -> usize {
        self.count_by_severity(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count_by_severity(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn total_issues(&self) -> usize {
        self.diagnostics.len()
    }

    /// Diagnostic counts per code, e.g. `CA1416 -> 3`.
    pub fn counts_by_code(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for diagnostic in &self.diagnostics {
            *counts.entry(diagnostic.code.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Diagnostics reported in `file`.
    pub fn filter_by_file(&self, file: &str) -> Vec<&PlatformDiagnostic> {
        self.diagnostics.iter().filter(|d| d.location.file == file).collect()
    }

    pub fn merge(&mut self, other: AnalysisReport) {
        self.diagnostics.extend(other.diagnostics);
        let meta = other.metadata;
        self.metadata.compilations.extend(meta.compilations);
        self.metadata.skipped.extend(meta.skipped);
        self.metadata.bodies_analyzed += meta.bodies_analyzed;
        self.metadata.bodies_cancelled += meta.bodies_cancelled;
        self.metadata.bodies_failed += meta.bodies_failed;
        self.metadata.contracts_built += meta.contracts_built;
        self.metadata.duration_ms += meta.duration_ms;
    }

    pub fn sort(&mut self) {
        sort_diagnostics(&mut self.diagnostics);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Console rendering: one line per diagnostic and a summary line.
    pub fn render_text(&self, colorize: bool) -> String {
        let mut out = String::new();
        for diagnostic in &self.diagnostics {
            let line = diagnostic.to_string();
            let line = if colorize {
                match diagnostic.severity {
                    Severity::Error => line.red().to_string(),
                    Severity::Warning => line.yellow().to_string(),
                    Severity::Info => line.blue().to_string(),
                    Severity::Hint => line.dimmed().to_string(),
                }
            } else {
                line
            };
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&self.summary());
        out.push('\n');
        out
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} diagnostic(s): {} error(s), {} warning(s) in {} bod{}",
            self.total_issues(),
            self.error_count(),
            self.warning_count(),
            self.metadata.bodies_analyzed,
            if self.metadata.bodies_analyzed == 1 { "y" } else { "ies" },
        );
        if self.metadata.bodies_cancelled > 0 {
            summary.push_str(&format!(", {} cancelled", self.metadata.bodies_cancelled));
        }
        if self.metadata.bodies_failed > 0 {
            summary.push_str(&format!(", {} failed", self.metadata.bodies_failed));
        }
        if !self.metadata.skipped.is_empty() {
            summary.push_str(&format!(", skipped: {}", self.metadata.skipped.join(", ")));
        }
        summary
    }
}

impl std::fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render_text(false))
    }
}
