//! Property tests for the guard lattice and the body walk.

mod common;

use common::{call_at, Fixture};
use platform_compat_analyzer::flow::GuardContext;
use platform_compat_analyzer::guards::GuardFact;
use platform_compat_analyzer::operations::Operation;
use platform_compat_analyzer::symbols::PlatformAttribute;
use platform_compat_analyzer::{PlatformName, RuleKind, Version};
use proptest::prelude::*;

const VERSIONED: &[&str] = &["windows", "macos", "ios", "android", "tvos"];

fn same_worlds(a: &GuardContext, b: &GuardContext) -> bool {
    a.is_subset_of(b) && b.is_subset_of(a)
}

fn platform() -> impl Strategy<Value = &'static str> {
    prop::sample::select(VERSIONED)
}

fn version() -> impl Strategy<Value = (u32, u32)> {
    (0u32..16, 0u32..6)
}

fn fact() -> impl Strategy<Value = GuardFact> {
    (platform(), version(), any::<bool>()).prop_map(|(p, (major, minor), earlier)| {
        let fact = GuardFact::at_least(PlatformName::canonical(p), Version::new(major, minor));
        if earlier {
            fact.negate()
        } else {
            fact
        }
    })
}

/// Contexts reachable by intersecting and joining a few facts.
fn context() -> impl Strategy<Value = GuardContext> {
    prop::collection::vec((fact(), any::<bool>()), 0..4).prop_map(|facts| {
        facts.iter().fold(GuardContext::all(), |acc, (fact, join)| {
            let world = GuardContext::from_fact(fact);
            if *join {
                acc.union(&world)
            } else {
                acc.intersect(&world)
            }
        })
    })
}

/// `OperatingSystem.IsOSPlatformVersionAtLeast("p", major, minor)`.
fn version_check(f: &Fixture, platform: &str, (major, minor): (u32, u32)) -> Operation {
    f.check(
        "IsOSPlatformVersionAtLeast",
        vec![
            Operation::string(platform),
            Operation::int(i64::from(major)),
            Operation::int(i64::from(minor)),
        ],
    )
}

fn fixture_with_api(platform: &str, (major, minor): (u32, u32)) -> (Fixture, platform_compat_analyzer::SymbolId, platform_compat_analyzer::SymbolId) {
    let mut f = Fixture::new();
    let api = f.api_method("Api", vec![PlatformAttribute::supported(format!("{platform}{major}.{minor}"))]);
    let caller = f.caller("M1", vec![]);
    (f, api, caller)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn newer_version_check_implies_older(p in platform(), v1 in version(), v2 in version()) {
        let (low, high) = if v1 <= v2 { (v1, v2) } else { (v2, v1) };
        let name = PlatformName::canonical(p);
        let newer = GuardContext::from_fact(&GuardFact::at_least(name.clone(), Version::new(high.0, high.1)));
        let older = GuardContext::from_fact(&GuardFact::at_least(name, Version::new(low.0, low.1)));
        prop_assert!(newer.is_subset_of(&older));
    }

    #[test]
    fn negation_swaps_branch_contexts(c in context(), f in fact()) {
        let world = GuardContext::from_fact(&f);
        let negated = GuardContext::from_fact(&f.negate());
        prop_assert!(same_worlds(&c.intersect(&world), &c.difference(&negated)));
        prop_assert!(same_worlds(&c.difference(&world), &c.intersect(&negated)));
    }

    #[test]
    fn conjunction_with_itself_is_idempotent(c in context(), f in fact()) {
        let world = GuardContext::from_fact(&f);
        let once = c.intersect(&world);
        prop_assert!(same_worlds(&once.intersect(&world), &once));
    }

    #[test]
    fn join_never_gains_worlds_over_branches(c in context(), f in fact()) {
        let world = GuardContext::from_fact(&f);
        let joined = c.intersect(&world).union(&c.difference(&world));
        prop_assert!(same_worlds(&joined, &c));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn negated_condition_swaps_findings(
        p in platform(),
        api_version in version(),
        guard_version in version(),
    ) {
        let (mut f, api, caller) = fixture_with_api(p, api_version);
        let guard = version_check(&f, p, guard_version);
        f.body(caller, vec![Operation::if_else(guard, call_at(api, 1), call_at(api, 2))]);
        let direct = f.call_site_findings();

        let (mut g, api, caller) = fixture_with_api(p, api_version);
        let guard = version_check(&g, p, guard_version);
        g.body(caller, vec![Operation::if_else(Operation::not(guard), call_at(api, 2), call_at(api, 1))]);
        prop_assert_eq!(direct.clone(), g.call_site_findings());

        // the false branch always escapes the allow-list
        prop_assert!(direct.contains(&(2, RuleKind::OnlySupported)));
        let guarded = (guard_version.0, guard_version.1) >= api_version;
        prop_assert_eq!(direct.contains(&(1, RuleKind::OnlySupported)), !guarded);
    }

    #[test]
    fn self_conjunction_suppresses_like_single_guard(
        p in platform(),
        api_version in version(),
        guard_version in version(),
    ) {
        let (mut f, api, caller) = fixture_with_api(p, api_version);
        let guard = version_check(&f, p, guard_version);
        f.body(caller, vec![Operation::if_then(guard, call_at(api, 1))]);

        let (mut g, api, caller) = fixture_with_api(p, api_version);
        let guard = version_check(&g, p, guard_version);
        g.body(caller, vec![Operation::if_then(Operation::and(guard.clone(), guard), call_at(api, 1))]);

        prop_assert_eq!(f.call_site_findings(), g.call_site_findings());
    }

    #[test]
    fn guard_in_both_empty_branches_does_not_leak(
        p in platform(),
        api_version in version(),
        guard_version in version(),
    ) {
        let (mut f, api, caller) = fixture_with_api(p, api_version);
        let guard = version_check(&f, p, guard_version);
        f.body(
            caller,
            vec![
                Operation::if_else(guard, Operation::block(vec![]), Operation::block(vec![])),
                call_at(api, 2),
            ],
        );
        prop_assert_eq!(f.call_site_findings(), vec![(2, RuleKind::OnlySupported)]);
    }
}
