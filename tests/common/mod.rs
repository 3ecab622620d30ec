//! Compilation fixtures shared by the integration tests.
#![allow(dead_code)]

use platform_compat_analyzer::config::AnalyzerConfig;
use platform_compat_analyzer::operations::{Compilation, MethodBody, Operation};
use platform_compat_analyzer::symbols::{
    declare_platform_check_api, PlatformAttribute, PlatformCheckApi, SymbolId, SymbolKind, SymbolTable,
};
use platform_compat_analyzer::{AnalysisReport, CancellationToken, PlatformCompatibilityAnalyzer, PlatformDiagnostic, RuleKind};

pub const FILE: &str = "Program.cs";

pub struct Fixture {
    pub symbols: SymbolTable,
    pub assembly: SymbolId,
    pub api: Option<PlatformCheckApi>,
    /// Type holding the annotated APIs.
    pub library: SymbolId,
    /// Type holding the callers.
    pub program: SymbolId,
    bodies: Vec<MethodBody>,
}

impl Fixture {
    pub fn new() -> Self {
        let mut fixture = Self::without_guard_api();
        let runtime = fixture.symbols.add_symbol("System.Runtime", SymbolKind::Assembly, None);
        fixture.api = Some(declare_platform_check_api(&mut fixture.symbols, runtime));
        fixture
    }

    /// A compilation that does not reference the platform-check types.
    pub fn without_guard_api() -> Self {
        let mut symbols = SymbolTable::new();
        let assembly = symbols.add_symbol("App", SymbolKind::Assembly, None);
        let library = symbols.add_symbol("App.Library", SymbolKind::Type, Some(assembly));
        let program = symbols.add_symbol("App.Program", SymbolKind::Type, Some(assembly));
        Self {
            symbols,
            assembly,
            api: None,
            library,
            program,
            bodies: Vec::new(),
        }
    }

    /// Method of `App.Library` carrying `attributes`.
    pub fn api_method(&mut self, name: &str, attributes: Vec<PlatformAttribute>) -> SymbolId {
        self.member(self.library, name, SymbolKind::Method, attributes)
    }

    pub fn member(
        &mut self,
        containing: SymbolId,
        name: &str,
        kind: SymbolKind,
        attributes: Vec<PlatformAttribute>,
    ) -> SymbolId {
        let id = self.symbols.add_symbol(name, kind, Some(containing));
        for attribute in attributes {
            self.symbols.add_attribute(id, attribute);
        }
        id
    }

    /// Method of `App.Program` carrying `attributes`.
    pub fn caller(&mut self, name: &str, attributes: Vec<PlatformAttribute>) -> SymbolId {
        self.member(self.program, name, SymbolKind::Method, attributes)
    }

    pub fn local_function(&mut self, owner: SymbolId, name: &str) -> SymbolId {
        self.symbols.add_symbol(name, SymbolKind::LocalFunction, Some(owner))
    }

    pub fn body(&mut self, owner: SymbolId, statements: Vec<Operation>) {
        self.bodies.push(MethodBody::new(owner, FILE, Operation::block(statements)));
    }

    fn operating_system_member(&self, name: &str) -> SymbolId {
        let api = self.api.expect("fixture declares the platform-check API");
        self.symbols
            .find_member(api.operating_system, name)
            .unwrap_or_else(|| panic!("OperatingSystem.{name} is declared"))
    }

    /// `OperatingSystem.<name>(args..)`.
    pub fn check(&self, name: &str, arguments: Vec<Operation>) -> Operation {
        Operation::call(self.operating_system_member(name), arguments)
    }

    pub fn is_windows(&self) -> Operation {
        self.check("IsWindows", vec![])
    }

    pub fn is_linux(&self) -> Operation {
        self.check("IsLinux", vec![])
    }

    /// `OperatingSystem.IsOSPlatformOrLater("platform", parts..)`.
    pub fn or_later(&self, platform: &str, parts: &[i64]) -> Operation {
        let mut arguments = vec![Operation::string(platform)];
        arguments.extend(parts.iter().map(|p| Operation::int(*p)));
        self.check("IsOSPlatformOrLater", arguments)
    }

    /// `RuntimeInformation.IsOSPlatform(OSPlatform.<property>)`.
    pub fn runtime_is(&self, property: &str) -> Operation {
        let api = self.api.expect("fixture declares the platform-check API");
        let method = self.symbols.find_member(api.runtime_information, "IsOSPlatform").expect("declared");
        let platform = self.symbols.find_member(api.os_platform, property).expect("declared");
        Operation::call(method, vec![Operation::member(platform)])
    }

    pub fn debug_assert(&self, condition: Operation) -> Operation {
        let api = self.api.expect("fixture declares the platform-check API");
        let assert = self.symbols.find_member(api.debug, "Assert").expect("declared");
        Operation::call(assert, vec![condition])
    }

    pub fn compilation(&self) -> Compilation {
        let mut compilation = Compilation::new("Fixture", self.symbols.clone()).with_target_framework("net8.0");
        for body in &self.bodies {
            compilation.add_body(body.clone());
        }
        compilation
    }

    pub fn analyze(&self) -> AnalysisReport {
        let config = AnalyzerConfig { threads: Some(2), ..AnalyzerConfig::default() };
        PlatformCompatibilityAnalyzer::new(config).analyze(&self.compilation())
    }

    pub fn analyze_cancelled(&self) -> AnalysisReport {
        let token = CancellationToken::new();
        token.cancel();
        PlatformCompatibilityAnalyzer::default().analyze_with_cancellation(&self.compilation(), &token)
    }

    /// Call-site diagnostics as `(line, rule)`, sorted.
    pub fn call_site_findings(&self) -> Vec<(usize, RuleKind)> {
        findings(self.analyze().diagnostics())
    }
}

pub fn findings(diagnostics: &[PlatformDiagnostic]) -> Vec<(usize, RuleKind)> {
    let mut found: Vec<(usize, RuleKind)> = diagnostics
        .iter()
        .filter(|d| d.code != "CA1418")
        .map(|d| (d.location.line, d.rule_kind))
        .collect();
    found.sort_by_key(|(line, _)| *line);
    found
}

/// `api()` placed on `line`.
pub fn call_at(api: SymbolId, line: usize) -> Operation {
    Operation::call(api, vec![]).at(line, 9)
}
