//! Normalisation of one symbol's own platform attributes.

use tracing::trace;

use super::{AvailabilityContract, AvailabilityEntry, AvailabilityKind};
use crate::core::PlatformError;
use crate::diagnostics::{Location, PlatformDiagnostic, RuleKind};
use crate::flow::GuardContext;
use crate::guards::GuardFact;
use crate::platform::{PlatformName, PlatformVocabulary, Version};
use crate::symbols::{AttributeKind, PlatformAttribute, Symbol, SymbolTable};

/// Everything derived from the attributes written directly on a symbol.
#[derive(Debug, Clone, Default)]
pub struct OwnAttributes {
    pub entries: Vec<AvailabilityEntry>,
    /// `entries` folded into a single layer.
    pub layer: AvailabilityContract,
    pub supported_guards: Vec<(PlatformName, Version)>,
    pub unsupported_guards: Vec<(PlatformName, Version)>,
    /// CA1418 diagnostics for malformed attributes.
    pub diagnostics: Vec<PlatformDiagnostic>,
}

impl OwnAttributes {
    pub fn build(symbol: &Symbol, symbols: &SymbolTable, vocabulary: &PlatformVocabulary) -> Self {
        let mut own = OwnAttributes::default();
        for attribute in &symbol.attributes {
            let parsed = vocabulary.parse_attribute(&attribute.platform);
            for error in &parsed.errors {
                own.diagnostics.push(attribute_diagnostic(symbol, symbols, attribute, error));
            }
            trace!(symbol = %symbol.id, kind = ?attribute.kind, platform = %parsed.name, "platform attribute");

            let kind = match attribute.kind {
                AttributeKind::Supported => AvailabilityKind::Supported,
                AttributeKind::Unsupported => AvailabilityKind::Unsupported,
                AttributeKind::Obsoleted => AvailabilityKind::Obsoleted,
                AttributeKind::SupportedGuard => {
                    own.supported_guards.push((parsed.name, parsed.version));
                    continue;
                }
                AttributeKind::UnsupportedGuard => {
                    own.unsupported_guards.push((parsed.name, parsed.version));
                    continue;
                }
            };
            own.entries.push(AvailabilityEntry {
                kind,
                platform: parsed.name,
                version: parsed.version,
                message: attribute.message.clone(),
                url: attribute.url.clone(),
            });
        }
        own.layer = AvailabilityContract::from_entries(&own.entries);
        own
    }

    pub fn is_guard(&self) -> bool {
        !self.supported_guards.is_empty() || !self.unsupported_guards.is_empty()
    }

    /// Worlds in which a guard member returns true: any supported-guard
    /// platform and none of the unsupported-guard platforms.
    pub fn guard_world(&self) -> Option<GuardContext> {
        if !self.is_guard() {
            return None;
        }
        let supported = if self.supported_guards.is_empty() {
            GuardContext::all()
        } else {
            self.supported_guards
                .iter()
                .fold(GuardContext::unreachable(), |acc, (platform, version)| {
                    acc.union(&GuardContext::from_fact(&GuardFact::at_least(platform.clone(), *version)))
                })
        };
        let world = self.unsupported_guards.iter().fold(supported, |acc, (platform, version)| {
            let fact = GuardFact::at_least(platform.clone(), *version).negate();
            acc.intersect(&GuardContext::from_fact(&fact))
        });
        Some(world)
    }
}

fn attribute_diagnostic(
    symbol: &Symbol,
    symbols: &SymbolTable,
    attribute: &PlatformAttribute,
    error: &PlatformError,
) -> PlatformDiagnostic {
    let rule = if error.is_version_error() {
        RuleKind::InvalidVersion
    } else {
        RuleKind::InvalidPlatformName
    };
    let location = Location::new(symbol.file.clone().unwrap_or_default(), attribute.span);
    PlatformDiagnostic::new(rule, location, error.to_string())
        .with_target(symbols.display_name(symbol.id))
        .with_platform(attribute.platform.clone())
}
