/*!
# Compatibility Checker

Decides, for one use of an annotated symbol, whether the active guard
context is enough to make the use safe. Three rules are applied
independently:

1. obsoletion: every reachable version of a platform is obsolete
2. unsupported: a reachable version falls in a denied range
3. only-supported: the reachable worlds are not contained in the target's
   allow-list

The active context already includes the caller's own contract (it is used
as the seed of every walk), so the checks below compare the context against
the target's contract directly. The caller's contract is consulted only for
self-declaration suppression.
*/

pub mod messages;

use std::sync::Arc;
use tracing::trace;

use crate::contract::AvailabilityContract;
use crate::diagnostics::{Location, PlatformDiagnostic, RuleKind};
use crate::flow::GuardContext;
use crate::platform::{VersionRange, VersionSet};
use crate::symbols::{SymbolId, SymbolTable};

/// One use of an annotated symbol, as seen by the checker.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub target: SymbolId,
    pub target_contract: Arc<AvailabilityContract>,
    pub active_context: GuardContext,
    pub enclosing_contract: Arc<AvailabilityContract>,
    pub location: Location,
}

pub struct CompatibilityChecker<'a> {
    symbols: &'a SymbolTable,
}

impl<'a> CompatibilityChecker<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self { symbols }
    }

    pub fn check(&self, site: &CallSite) -> Vec<PlatformDiagnostic> {
        let context = &site.active_context;
        if site.target_contract.is_empty() || context.is_unreachable() {
            return Vec::new();
        }
        trace!(target = %site.target, context = %context, "checking call site");

        let target = self.symbols.display_name(site.target);
        let reachability = messages::describe_reachability(context);
        let mut diagnostics = Vec::new();

        self.check_obsoleted(site, &target, &reachability, &mut diagnostics);
        if site.target_contract.is_allow_list() {
            self.check_only_supported(site, &target, &reachability, &mut diagnostics);
        } else {
            self.check_unsupported(site, &target, &reachability, &mut diagnostics);
        }
        diagnostics
    }

    fn check_obsoleted(
        &self,
        site: &CallSite,
        target: &str,
        reachability: &str,
        out: &mut Vec<PlatformDiagnostic>,
    ) {
        for (platform, availability) in site.target_contract.platforms() {
            let Some(obsoleted) = &availability.obsoleted else {
                continue;
            };
            let reachable = site.active_context.versions_of(platform);
            let range = VersionRange::at_least(obsoleted.version);
            if reachable.is_empty() || !reachable.is_subset_of(&VersionSet::from_range(range)) {
                continue;
            }
            let self_declared = site
                .enclosing_contract
                .get(platform)
                .and_then(|a| a.obsoleted.as_ref())
                .is_some_and(|own| own.version <= obsoleted.version);
            if self_declared {
                continue;
            }

            let description = messages::describe_range(platform, &range);
            let text = messages::obsoleted(
                reachability,
                target,
                &description,
                obsoleted.message.as_deref(),
                obsoleted.url.as_deref(),
            );
            out.push(
                PlatformDiagnostic::new(RuleKind::Obsoleted, site.location.clone(), text)
                    .with_target(target)
                    .with_platform(platform.as_str())
                    .with_version_description(description)
                    .with_reachability(reachability)
                    .with_message(obsoleted.message.clone())
                    .with_url(obsoleted.url.clone()),
            );
        }
    }

    fn check_unsupported(
        &self,
        site: &CallSite,
        target: &str,
        reachability: &str,
        out: &mut Vec<PlatformDiagnostic>,
    ) {
        for (platform, availability) in site.target_contract.platforms() {
            let Some(denied) = availability.denied_range() else {
                continue;
            };
            let reachable = site.active_context.versions_of(platform);
            if !reachable.intersects(&VersionSet::from_range(denied)) {
                continue;
            }
            // "I already told my callers I don't work there either"
            let self_declared = site
                .enclosing_contract
                .get(platform)
                .and_then(|a| a.denied_range())
                .is_some_and(|own| own.covers(&denied));
            if self_declared {
                continue;
            }

            let description = messages::describe_range(platform, &denied);
            let text = messages::unsupported(reachability, target, &description);
            out.push(
                PlatformDiagnostic::new(RuleKind::Unsupported, site.location.clone(), text)
                    .with_target(target)
                    .with_platform(platform.as_str())
                    .with_version_description(description)
                    .with_reachability(reachability)
                    .with_message(availability.unsupported_message.clone()),
            );
        }
    }

    fn check_only_supported(
        &self,
        site: &CallSite,
        target: &str,
        reachability: &str,
        out: &mut Vec<PlatformDiagnostic>,
    ) {
        let contract = &site.target_contract;
        let allowed = contract.allowed_worlds();
        if site.active_context.is_subset_of(&allowed) {
            return;
        }

        let platforms = contract.allowed_platforms();
        let description = platforms
            .iter()
            .map(|p| messages::describe_set(p, &contract.allowed_versions(p)))
            .collect::<Vec<_>>()
            .join(", ");
        let platform_list = platforms.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ");
        let text = messages::only_supported(reachability, target, &description);
        out.push(
            PlatformDiagnostic::new(RuleKind::OnlySupported, site.location.clone(), text)
                .with_target(target)
                .with_platform(platform_list)
                .with_version_description(description)
                .with_reachability(reachability),
        );
    }
}
