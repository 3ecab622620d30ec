/*!
# Guard Predicate Extraction

Recognises boolean operations that assert a platform fact:

- `OperatingSystem.IsOSPlatform("name")` and
  `OperatingSystem.IsOSPlatformVersionAtLeast("name", major, ...)`
- `OperatingSystem.Is<Platform>()` and `Is<Platform>VersionAtLeast(major, ...)`
- legacy `IsOSPlatformOrLater` / `IsOSPlatformEarlierThan`, with either
  integer components or a version embedded in the platform string
- `RuntimeInformation.IsOSPlatform(OSPlatform.X)` and
  `RuntimeInformation.IsOSPlatform(OSPlatform.Create("name"))`
- members annotated as platform guards
- `!guard`, and reads of locals caching a guard result (see [`locals`])

Only literal arguments are understood. A platform name or version held in a
variable drops the guard, which the checker then treats as "not guarded".
`&&` and `||` are combined structurally by [`crate::flow`].
*/

pub mod locals;

use tracing::debug;

use crate::contract::ContractCache;
use crate::flow::GuardContext;
use crate::operations::{Constant, LocalId, Operation, OperationKind, UnaryOperator};
use crate::platform::{PlatformName, PlatformVocabulary, Version, BUILTIN_PLATFORMS};
use crate::symbols::well_known::{
    IS_OS_PLATFORM, IS_OS_PLATFORM_EARLIER_THAN, IS_OS_PLATFORM_OR_LATER, IS_OS_PLATFORM_VERSION_AT_LEAST,
    OPERATING_SYSTEM_TYPE, OS_PLATFORM_CREATE, OS_PLATFORM_PROPERTIES, OS_PLATFORM_TYPE,
    RUNTIME_INFORMATION_TYPE, VERSION_AT_LEAST_SUFFIX,
};
use crate::symbols::{SymbolId, SymbolTable};

pub use locals::CachedGuardLocals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardRelation {
    AtLeast,
    EarlierThan,
}

/// One recognised platform check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GuardFact {
    pub platform: PlatformName,
    pub relation: GuardRelation,
    /// `Version::ZERO` for a bare platform check.
    pub version: Version,
    pub negated: bool,
}

impl GuardFact {
    pub fn at_least(platform: PlatformName, version: Version) -> Self {
        Self { platform, relation: GuardRelation::AtLeast, version, negated: false }
    }

    pub fn earlier_than(platform: PlatformName, version: Version) -> Self {
        Self { platform, relation: GuardRelation::EarlierThan, version, negated: false }
    }

    pub fn negate(&self) -> Self {
        Self { negated: !self.negated, ..self.clone() }
    }
}

/// Result of [`GuardExtractor::try_extract_guard`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedGuard {
    Fact(GuardFact),
    /// A guard member: the set of worlds in which it returns true.
    Member(GuardContext),
    /// A local caching a guard result; evaluate its initializer instead.
    PlatformLocal(LocalId),
}

impl ExtractedGuard {
    fn negate(self) -> Option<Self> {
        match self {
            ExtractedGuard::Fact(fact) => Some(ExtractedGuard::Fact(fact.negate())),
            ExtractedGuard::Member(world) => Some(ExtractedGuard::Member(world.complement())),
            // handled structurally by the engine
            ExtractedGuard::PlatformLocal(_) => None,
        }
    }
}

/// Resolved platform-check types of one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardApi {
    pub operating_system: Option<SymbolId>,
    pub runtime_information: Option<SymbolId>,
    pub os_platform: Option<SymbolId>,
}

impl GuardApi {
    /// `None` when neither `OperatingSystem` nor `RuntimeInformation` exists;
    /// guard recognition is then disabled for the compilation.
    pub fn resolve(symbols: &SymbolTable) -> Option<GuardApi> {
        let api = GuardApi {
            operating_system: symbols.find_type(OPERATING_SYSTEM_TYPE),
            runtime_information: symbols.find_type(RUNTIME_INFORMATION_TYPE),
            os_platform: symbols.find_type(OS_PLATFORM_TYPE),
        };
        if api.operating_system.is_none() && api.runtime_information.is_none() {
            debug!("platform-check API types not found, guard recognition disabled");
            return None;
        }
        Some(api)
    }

    fn is_check_type(&self, type_id: Option<SymbolId>) -> bool {
        type_id.is_some() && (type_id == self.operating_system || type_id == self.runtime_information)
    }
}

/// Turns operations into [`ExtractedGuard`]s for one method body.
pub struct GuardExtractor<'a> {
    symbols: &'a SymbolTable,
    vocabulary: &'a PlatformVocabulary,
    contracts: &'a ContractCache<'a>,
    api: Option<GuardApi>,
    cached_locals: CachedGuardLocals,
}

impl<'a> GuardExtractor<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        vocabulary: &'a PlatformVocabulary,
        contracts: &'a ContractCache<'a>,
        api: Option<GuardApi>,
    ) -> Self {
        Self {
            symbols,
            vocabulary,
            contracts,
            api,
            cached_locals: CachedGuardLocals::default(),
        }
    }

    /// Enables substitution of cached guard locals found in `body`.
    pub fn with_cached_locals(mut self, body: &Operation) -> Self {
        self.cached_locals = CachedGuardLocals::scan(body, &self);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.api.is_some()
    }

    /// Initializer of a cached guard local.
    pub fn cached_initializer(&self, local: LocalId) -> Option<&Operation> {
        self.cached_locals.initializer(local)
    }

    pub fn try_extract_guard(&self, op: &Operation) -> Option<ExtractedGuard> {
        let api = self.api?;
        match &op.kind {
            OperationKind::Unary { operator: UnaryOperator::Not, operand } => {
                self.try_extract_guard(operand)?.negate()
            }
            OperationKind::Invocation { target, arguments, .. } => self
                .extract_call(&api, *target, arguments)
                .map(ExtractedGuard::Fact)
                .or_else(|| self.guard_member(*target).map(ExtractedGuard::Member)),
            OperationKind::MemberReference { member, .. } => {
                self.guard_member(*member).map(ExtractedGuard::Member)
            }
            OperationKind::LocalReference { local } => self
                .cached_locals
                .initializer(*local)
                .map(|_| ExtractedGuard::PlatformLocal(*local)),
            _ => None,
        }
    }

    fn extract_call(&self, api: &GuardApi, target: SymbolId, arguments: &[Operation]) -> Option<GuardFact> {
        let symbol = self.symbols.get(target)?;
        if !api.is_check_type(symbol.containing) {
            return None;
        }
        let name = symbol.name.as_str();
        let (first, rest) = match arguments.split_first() {
            Some((first, rest)) => (Some(first), rest),
            None => (None, arguments),
        };

        match name {
            IS_OS_PLATFORM => {
                let platform = self.platform_argument(api, first?)?;
                Some(GuardFact::at_least(platform, Version::ZERO))
            }
            IS_OS_PLATFORM_VERSION_AT_LEAST => {
                let platform = self.platform_argument(api, first?)?;
                Some(GuardFact::at_least(platform, version_from_arguments(rest)?))
            }
            IS_OS_PLATFORM_OR_LATER | IS_OS_PLATFORM_EARLIER_THAN => {
                let (platform, version) = self.platform_and_version(api, first?, rest)?;
                if name == IS_OS_PLATFORM_OR_LATER {
                    Some(GuardFact::at_least(platform, version))
                } else {
                    Some(GuardFact::earlier_than(platform, version))
                }
            }
            _ => self.named_platform_check(name, arguments),
        }
    }

    /// `IsWindows()`, `IsWindowsVersionAtLeast(10, 0)` and friends.
    fn named_platform_check(&self, name: &str, arguments: &[Operation]) -> Option<GuardFact> {
        let guard_part = name.strip_prefix("Is")?;
        if let Some(platform) = guard_part.strip_suffix(VERSION_AT_LEAST_SUFFIX) {
            let builtin = BUILTIN_PLATFORMS.iter().find(|p| p.guard_name == platform)?;
            let version = version_from_arguments(arguments)?;
            return Some(GuardFact::at_least(PlatformName::canonical(builtin.name), version));
        }
        let builtin = BUILTIN_PLATFORMS.iter().find(|p| p.guard_name == guard_part)?;
        if !arguments.is_empty() {
            return None;
        }
        Some(GuardFact::at_least(PlatformName::canonical(builtin.name), Version::ZERO))
    }

    /// String literal, `OSPlatform.X` or `OSPlatform.Create("x")`.
    fn platform_argument(&self, api: &GuardApi, argument: &Operation) -> Option<PlatformName> {
        match &argument.kind {
            OperationKind::Literal { value: Constant::String(name) } => Some(PlatformName::canonical(name)),
            OperationKind::MemberReference { member, .. } => {
                let symbol = self.symbols.get(*member)?;
                if symbol.containing.is_none() || symbol.containing != api.os_platform {
                    return None;
                }
                OS_PLATFORM_PROPERTIES
                    .iter()
                    .find(|(property, _)| *property == symbol.name)
                    .map(|(_, platform)| PlatformName::canonical(platform))
            }
            OperationKind::Invocation { target, arguments, .. } => {
                let symbol = self.symbols.get(*target)?;
                if symbol.name != OS_PLATFORM_CREATE
                    || symbol.containing.is_none()
                    || symbol.containing != api.os_platform
                {
                    return None;
                }
                match arguments.first().and_then(Operation::as_constant) {
                    Some(Constant::String(name)) => Some(PlatformName::canonical(name)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Legacy overloads: `("Windows", 10, 1)` or `("Windows10.1")`.
    fn platform_and_version(
        &self,
        api: &GuardApi,
        first: &Operation,
        rest: &[Operation],
    ) -> Option<(PlatformName, Version)> {
        if !rest.is_empty() {
            let platform = self.platform_argument(api, first)?;
            return Some((platform, version_from_arguments(rest)?));
        }
        match first.as_constant() {
            Some(Constant::String(raw)) => {
                let parsed = self.vocabulary.parse_attribute(raw);
                if parsed.errors.iter().any(|e| e.is_version_error()) {
                    return None;
                }
                Some((parsed.name, parsed.version))
            }
            _ => self.platform_argument(api, first).map(|p| (p, Version::ZERO)),
        }
    }

    /// World set of a member carrying guard attributes.
    fn guard_member(&self, member: SymbolId) -> Option<GuardContext> {
        let own = self.contracts.own_attributes(member);
        own.guard_world()
    }
}

/// Integer literal components, at most four, all non-negative.
fn version_from_arguments(arguments: &[Operation]) -> Option<Version> {
    let mut parts = Vec::with_capacity(arguments.len());
    for argument in arguments {
        match argument.as_constant() {
            Some(Constant::Int(value)) => parts.push(u32::try_from(*value).ok()?),
            _ => return None,
        }
    }
    Version::from_parts(&parts).map(Version::normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{declare_platform_check_api, AttributeKind, PlatformAttribute, SymbolKind};
    use pretty_assertions::assert_eq;

    struct Fixture {
        table: SymbolTable,
        vocabulary: PlatformVocabulary,
    }

    impl Fixture {
        fn new() -> Self {
            let mut table = SymbolTable::new();
            let asm = table.add_symbol("System.Runtime", SymbolKind::Assembly, None);
            declare_platform_check_api(&mut table, asm);
            Self { table, vocabulary: PlatformVocabulary::builtin() }
        }

        fn member(&self, type_name: &str, name: &str) -> SymbolId {
            let ty = self.table.find_type(type_name).unwrap();
            self.table.find_member(ty, name).unwrap()
        }

        fn extract(&self, op: &Operation) -> Option<ExtractedGuard> {
            let cache = ContractCache::new(&self.table, &self.vocabulary);
            let extractor = GuardExtractor::new(
                &self.table,
                &self.vocabulary,
                &cache,
                GuardApi::resolve(&self.table),
            );
            extractor.try_extract_guard(op)
        }
    }

    fn fact(platform: &str, major: u32, minor: u32) -> ExtractedGuard {
        ExtractedGuard::Fact(GuardFact::at_least(PlatformName::canonical(platform), Version::new(major, minor)))
    }

    #[test]
    fn test_named_platform_checks() {
        let fx = Fixture::new();
        let is_windows = fx.member(OPERATING_SYSTEM_TYPE, "IsWindows");
        let is_ios_at_least = fx.member(OPERATING_SYSTEM_TYPE, "IsIOSVersionAtLeast");

        assert_eq!(
            fx.extract(&Operation::call(is_windows, vec![])),
            Some(ExtractedGuard::Fact(GuardFact::at_least(PlatformName::canonical("windows"), Version::ZERO)))
        );
        assert_eq!(
            fx.extract(&Operation::call(is_ios_at_least, vec![Operation::int(14), Operation::int(2)])),
            Some(fact("ios", 14, 2))
        );
    }

    #[test]
    fn test_string_overloads() {
        let fx = Fixture::new();
        let at_least = fx.member(OPERATING_SYSTEM_TYPE, IS_OS_PLATFORM_VERSION_AT_LEAST);
        let op = Operation::call(at_least, vec![Operation::string("Windows"), Operation::int(10)]);
        assert_eq!(fx.extract(&op), Some(fact("windows", 10, 0)));

        let legacy = fx.member(OPERATING_SYSTEM_TYPE, IS_OS_PLATFORM_EARLIER_THAN);
        let op = Operation::call(legacy, vec![Operation::string("Windows10.1")]);
        assert_eq!(
            fx.extract(&op),
            Some(ExtractedGuard::Fact(GuardFact::earlier_than(
                PlatformName::canonical("windows"),
                Version::new(10, 1)
            )))
        );
    }

    #[test]
    fn test_runtime_information_overload() {
        let fx = Fixture::new();
        let is_os = fx.member(RUNTIME_INFORMATION_TYPE, IS_OS_PLATFORM);
        let osx = fx.member(OS_PLATFORM_TYPE, "OSX");
        let create = fx.member(OS_PLATFORM_TYPE, OS_PLATFORM_CREATE);

        let op = Operation::call(is_os, vec![Operation::member(osx)]);
        assert_eq!(fx.extract(&op), Some(fact("macos", 0, 0)));

        let op = Operation::call(is_os, vec![Operation::call(create, vec![Operation::string("Browser")])]);
        assert_eq!(fx.extract(&op), Some(fact("browser", 0, 0)));
    }

    #[test]
    fn test_negation_flips() {
        let fx = Fixture::new();
        let is_linux = fx.member(OPERATING_SYSTEM_TYPE, "IsLinux");
        match fx.extract(&Operation::not(Operation::call(is_linux, vec![]))) {
            Some(ExtractedGuard::Fact(f)) => assert!(f.negated),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_non_literal_arguments_drop_guard() {
        let fx = Fixture::new();
        let is_os = fx.member(OPERATING_SYSTEM_TYPE, IS_OS_PLATFORM);
        let at_least = fx.member(OPERATING_SYSTEM_TYPE, "IsWindowsVersionAtLeast");
        assert_eq!(fx.extract(&Operation::call(is_os, vec![Operation::local(0)])), None);
        assert_eq!(
            fx.extract(&Operation::call(at_least, vec![Operation::int(10), Operation::local(1)])),
            None
        );
        assert_eq!(fx.extract(&Operation::call(at_least, vec![Operation::int(-1)])), None);
    }

    #[test]
    fn test_guard_member_attributes() {
        let mut fx = Fixture::new();
        let asm = fx.table.add_symbol("App", SymbolKind::Assembly, None);
        let ty = fx.table.add_symbol("App.Helpers", SymbolKind::Type, Some(asm));
        let prop = fx.table.add_symbol("IsDesktop", SymbolKind::Property, Some(ty));
        fx.table.add_attribute(prop, PlatformAttribute::new(AttributeKind::SupportedGuard, "windows"));
        fx.table.add_attribute(prop, PlatformAttribute::new(AttributeKind::SupportedGuard, "linux"));

        match fx.extract(&Operation::member(prop)) {
            Some(ExtractedGuard::Member(world)) => {
                assert!(world.versions_of(&PlatformName::canonical("linux")).is_all());
                assert!(world.versions_of(&PlatformName::canonical("macos")).is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_disabled_without_api_types() {
        let mut table = SymbolTable::new();
        let asm = table.add_symbol("App", SymbolKind::Assembly, None);
        let ty = table.add_symbol("App.OperatingSystem", SymbolKind::Type, Some(asm));
        let is_windows = table.add_symbol("IsWindows", SymbolKind::Method, Some(ty));
        assert!(GuardApi::resolve(&table).is_none());

        let vocabulary = PlatformVocabulary::builtin();
        let cache = ContractCache::new(&table, &vocabulary);
        let extractor = GuardExtractor::new(&table, &vocabulary, &cache, None);
        assert!(!extractor.is_enabled());
        assert_eq!(extractor.try_extract_guard(&Operation::call(is_windows, vec![])), None);
    }
}
