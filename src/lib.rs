/*!
# Platform Compatibility Analyzer

Static analysis that checks every use of a platform-annotated API is
reachable only on platforms (and versions) where that API is available.

APIs carry availability attributes (`SupportedOSPlatform`,
`UnsupportedOSPlatform`, `ObsoletedOSPlatform`) on themselves, their
containing types or their assembly. Call sites are protected by guards such
as `OperatingSystem.IsWindowsVersionAtLeast(10)` or
`RuntimeInformation.IsOSPlatform(OSPlatform.Linux)`. The analyzer walks each
method body forward, tracks which platform worlds can reach every program
point and reports the uses that escape the API's contract.

## Architecture

```text
Platform Compatibility Analyzer
├── platform     - versions, platform vocabulary, version sets
├── symbols      - symbol table and raw platform attributes
├── operations   - operation trees, method bodies, compilations
├── contract     - merged availability contracts and their cache
├── guards       - recognition of platform-check expressions
├── flow         - guard-context lattice and the body walker
├── checker      - call-site rules (CA1416, CA1422)
├── diagnostics  - diagnostic records, codes, severities
├── config       - TOML / YAML / JSON configuration
└── analyzer     - parallel driver and reports
```

## Usage

```ignore
use platform_compat_analyzer::{AnalyzerConfig, Compilation, PlatformCompatibilityAnalyzer};

let compilation = Compilation::load("app.json".as_ref())?;
let analyzer = PlatformCompatibilityAnalyzer::new(AnalyzerConfig::default());
let report = analyzer.analyze(&compilation);
println!("{}", report);
```
*/

pub mod analyzer;
pub mod checker;
pub mod cli_common;
pub mod config;
pub mod contract;
pub mod core;
pub mod diagnostics;
pub mod flow;
pub mod guards;
pub mod operations;
pub mod platform;
pub mod symbols;

pub use analyzer::{AnalysisReport, PlatformCompatibilityAnalyzer};
pub use checker::{CallSite, CompatibilityChecker};
pub use config::{AnalyzerConfig, RuleSettings};
pub use contract::{AvailabilityContract, ContractCache};
pub use core::{AnalysisError, CancellationToken, PlatformError, Position, Span};
pub use diagnostics::{PlatformDiagnostic, RuleKind, Severity};
pub use flow::GuardContext;
pub use guards::{GuardApi, GuardExtractor};
pub use operations::{Compilation, MethodBody, Operation};
pub use platform::{PlatformName, PlatformVocabulary, Version, VersionSet, BUILTIN_PLATFORMS};
pub use symbols::{SymbolId, SymbolKind, SymbolTable};

use anyhow::{Context, Result};
use std::path::Path;

/// Loads a JSON compilation and analyses it with the default configuration.
pub fn analyze_compilation_file<P: AsRef<Path>>(path: P) -> Result<AnalysisReport> {
    let path = path.as_ref();
    let compilation = Compilation::load(path)
        .with_context(|| format!("Failed to load compilation from {}", path.display()))?;
    Ok(PlatformCompatibilityAnalyzer::default().analyze(&compilation))
}
