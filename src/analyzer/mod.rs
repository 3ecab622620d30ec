/*!
# Analyzer

Drives the per-body guard analysis of a compilation. Bodies are independent
units of work and are walked in parallel on a rayon pool; all walks of one
compilation share a single [`ContractCache`].

```ignore
let analyzer = PlatformCompatibilityAnalyzer::new(AnalyzerConfig::default());
let report = analyzer.analyze(&compilation);
for diagnostic in report.diagnostics() {
    println!("{}", diagnostic);
}
```
*/

pub mod report;

pub use report::{AnalysisReport, BodyOutcome, ReportMetadata};

use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::contract::ContractCache;
use crate::core::{AnalysisError, CancellationToken};
use crate::flow::FlowEngine;
use crate::diagnostics::PlatformDiagnostic;
use crate::operations::{Compilation, MethodBody};
use crate::platform::PlatformVocabulary;

pub struct PlatformCompatibilityAnalyzer {
    config: AnalyzerConfig,
    vocabulary: PlatformVocabulary,
    pool: Option<rayon::ThreadPool>,
}

impl PlatformCompatibilityAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let threads = config.thread_count();
        let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => {
                debug!("Configured {} worker threads for body analysis", threads);
                Some(pool)
            }
            Err(err) => {
                warn!("Failed to build thread pool, using the global pool: {}", err);
                None
            }
        };
        let vocabulary = config.vocabulary();
        Self { config, vocabulary, pool }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &PlatformVocabulary {
        &self.vocabulary
    }

    pub fn analyze(&self, compilation: &Compilation) -> AnalysisReport {
        self.analyze_with_cancellation(compilation, &CancellationToken::new())
    }

    /// Analyses every body of `compilation`. A body whose walk observes the
    /// cancellation contributes no diagnostics; the others are unaffected.
    pub fn analyze_with_cancellation(
        &self,
        compilation: &Compilation,
        cancellation: &CancellationToken,
    ) -> AnalysisReport {
        let start = Instant::now();
        if !self.config.should_analyze(compilation.target_framework.as_deref()) {
            info!(
                compilation = %compilation.name,
                target = compilation.target_framework.as_deref().unwrap_or("unknown"),
                "Skipping analysis: target framework below minimum or analysis disabled"
            );
            return AnalysisReport::skipped(&compilation.name);
        }

        let contracts = ContractCache::new(&compilation.symbols, &self.vocabulary);
        let engine = FlowEngine::new(&compilation.symbols, &self.vocabulary, &contracts);
        if !engine.guard_recognition_enabled() {
            warn!(
                compilation = %compilation.name,
                "Platform-check APIs not found; guard recognition is disabled"
            );
        }

        let walk = || {
            compilation
                .bodies
                .par_iter()
                .map(|body| engine.analyze_body(body, cancellation))
                .collect::<Vec<_>>()
        };
        let results = match &self.pool {
            Some(pool) => pool.install(walk),
            None => walk(),
        };

        let mut report = AnalysisReport::for_compilation(&compilation.name);
        let mut diagnostics = contracts.attribute_diagnostics();
        diagnostics.extend(collect_body_results(&mut report, &compilation.bodies, results));

        report.add_diagnostics(self.config.apply_rule_settings(diagnostics));
        report.set_contracts_built(contracts.len());
        report.sort();
        report.set_duration(start.elapsed());

        info!(
            compilation = %compilation.name,
            bodies = report.metadata().bodies_analyzed,
            cancelled = report.metadata().bodies_cancelled,
            failed = report.metadata().bodies_failed,
            diagnostics = report.total_issues(),
            "Platform compatibility analysis completed"
        );
        report
    }

    /// Analyses several compilations into one merged report.
    pub fn analyze_all<'c>(&self, compilations: impl IntoIterator<Item = &'c Compilation>) -> AnalysisReport {
        let mut merged = AnalysisReport::new();
        for compilation in compilations {
            merged.merge(self.analyze(compilation));
        }
        merged.sort();
        merged
    }
}

/// Keeps the diagnostics of completed walks. Cancelled and failed walks are
/// only counted.
fn collect_body_results(
    report: &mut AnalysisReport,
    bodies: &[MethodBody],
    results: Vec<Result<Vec<PlatformDiagnostic>, AnalysisError>>,
) -> Vec<PlatformDiagnostic> {
    let mut diagnostics = Vec::new();
    for (body, result) in bodies.iter().zip(results) {
        match result {
            Ok(found) => {
                diagnostics.extend(found);
                report.record_body(BodyOutcome::Analyzed);
            }
            Err(AnalysisError::Cancelled) => report.record_body(BodyOutcome::Cancelled),
            Err(err) => {
                warn!(owner = %body.owner, "Body analysis failed: {}", err);
                report.record_body(BodyOutcome::Failed);
            }
        }
    }
    diagnostics
}

impl Default for PlatformCompatibilityAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{RuleKind, Severity};
    use crate::operations::{MethodBody, Operation};
    use crate::symbols::{PlatformAttribute, SymbolKind, SymbolTable};

    fn compilation() -> Compilation {
        let mut symbols = SymbolTable::new();
        let lib = symbols.add_symbol("Lib", SymbolKind::Type, None);
        let api = symbols.add_symbol("WindowsOnly", SymbolKind::Method, Some(lib));
        symbols.add_attribute(api, PlatformAttribute::supported("windows"));
        let bad = symbols.add_symbol("Broken", SymbolKind::Method, Some(lib));
        symbols.add_attribute(bad, PlatformAttribute::supported("amiga"));
        let caller = symbols.add_symbol("Caller", SymbolKind::Method, Some(lib));

        let mut compilation = Compilation::new("Demo", symbols).with_target_framework("net6.0");
        compilation.add_body(MethodBody::new(
            caller,
            "Caller.cs",
            Operation::block(vec![Operation::call(api, vec![])]),
        ));
        compilation
    }

    #[test]
    fn test_reports_unguarded_call_and_attribute_error() {
        let report = PlatformCompatibilityAnalyzer::default().analyze(&compilation());
        let kinds: Vec<RuleKind> = report.diagnostics().iter().map(|d| d.rule_kind).collect();
        assert!(kinds.contains(&RuleKind::OnlySupported));
        assert!(kinds.contains(&RuleKind::InvalidPlatformName));
        assert_eq!(report.metadata().bodies_analyzed, 1);
    }

    #[test]
    fn test_rule_settings_applied() {
        let mut config = AnalyzerConfig::default();
        if let Some(rule) = config.rules.get_mut("CA1418") {
            rule.enabled = false;
        }
        if let Some(rule) = config.rules.get_mut("CA1416") {
            rule.severity = Some(Severity::Error);
        }
        let report = PlatformCompatibilityAnalyzer::new(config).analyze(&compilation());
        assert_eq!(report.total_issues(), 1);
        assert!(report.has_errors());
    }

    #[test]
    fn test_below_minimum_target_is_skipped() {
        let compilation = compilation().with_target_framework("netcoreapp3.1");
        let report = PlatformCompatibilityAnalyzer::default().analyze(&compilation);
        assert!(report.was_skipped());
        assert_eq!(report.total_issues(), 0);
    }

    #[test]
    fn test_cancelled_bodies_contribute_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let report = PlatformCompatibilityAnalyzer::default().analyze_with_cancellation(&compilation(), &token);
        assert_eq!(report.metadata().bodies_cancelled, 1);
        assert!(report
            .diagnostics()
            .iter()
            .all(|d| d.rule_kind != RuleKind::OnlySupported));
    }

    #[test]
    fn test_cancelled_and_failed_bodies_keep_other_results() {
        let compilation = compilation();
        let body = compilation.bodies[0].clone();
        let bodies = vec![body.clone(), body.clone(), body];

        let vocabulary = PlatformVocabulary::builtin();
        let contracts = ContractCache::new(&compilation.symbols, &vocabulary);
        let engine = FlowEngine::new(&compilation.symbols, &vocabulary, &contracts);
        let completed = engine.analyze_body(&bodies[0], &CancellationToken::new());
        assert!(completed.as_ref().map(|d| d.len() == 1).unwrap_or(false));

        let results = vec![
            Err(AnalysisError::Cancelled),
            completed,
            Err(AnalysisError::Config("broken body".to_string())),
        ];
        let mut report = AnalysisReport::for_compilation("Demo");
        let kept = collect_body_results(&mut report, &bodies, results);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].rule_kind, RuleKind::OnlySupported);
        assert_eq!(report.metadata().bodies_analyzed, 1);
        assert_eq!(report.metadata().bodies_cancelled, 1);
        assert_eq!(report.metadata().bodies_failed, 1);
    }

    #[test]
    fn test_single_thread_config() {
        let config = AnalyzerConfig { threads: Some(1), ..AnalyzerConfig::default() };
        let analyzer = PlatformCompatibilityAnalyzer::new(config);
        let report = analyzer.analyze_all([&compilation(), &compilation()]);
        assert_eq!(report.metadata().bodies_analyzed, 2);
    }
}
