//! Human-readable descriptions of version ranges and reachability.

use crate::flow::GuardContext;
use crate::platform::{PlatformName, VersionRange, VersionSet};

/// `'windows' 10.0 and later`, `'windows' before 10.0`,
/// `'windows' from 10.0 to 11.0`, or just `'linux'`.
pub fn describe_range(platform: &PlatformName, range: &VersionRange) -> String {
    match (range.start.is_zero(), range.end) {
        (true, None) => format!("'{platform}'"),
        (false, None) => format!("'{platform}' {} and later", range.start),
        (true, Some(end)) => format!("'{platform}' before {end}"),
        (false, Some(end)) => format!("'{platform}' from {} to {end}", range.start),
    }
}

pub fn describe_set(platform: &PlatformName, versions: &VersionSet) -> String {
    versions
        .ranges()
        .iter()
        .map(|range| describe_range(platform, range))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Platforms the call site can run on.
pub fn describe_reachability(context: &GuardContext) -> String {
    if context.others_possible() {
        return "all platforms".to_string();
    }
    let parts: Vec<String> = context
        .reachable_platforms()
        .iter()
        .map(|(platform, versions)| describe_set(platform, versions))
        .collect();
    parts.join(", ")
}

pub fn only_supported(reachability: &str, target: &str, allowed: &str) -> String {
    format!("This call site is reachable on {reachability}. '{target}' is only supported on: {allowed}.")
}

pub fn unsupported(reachability: &str, target: &str, denied: &str) -> String {
    format!("This call site is reachable on {reachability}. '{target}' is unsupported on: {denied}.")
}

pub fn obsoleted(
    reachability: &str,
    target: &str,
    obsoleted: &str,
    message: Option<&str>,
    url: Option<&str>,
) -> String {
    let mut text =
        format!("This call site is reachable on {reachability}. '{target}' has been marked obsolete on: {obsoleted}.");
    if let Some(message) = message {
        text.push(' ');
        text.push_str(message);
    }
    if let Some(url) = url {
        text.push_str(&format!(" ({url})"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Version;

    #[test]
    fn test_range_descriptions() {
        let windows = PlatformName::canonical("windows");
        let v10 = Version::new(10, 0);
        let v11 = Version::new(11, 0);
        assert_eq!(describe_range(&windows, &VersionRange::all()), "'windows'");
        assert_eq!(describe_range(&windows, &VersionRange::at_least(v10)), "'windows' 10.0 and later");
        assert_eq!(describe_range(&windows, &VersionRange::before(v10)), "'windows' before 10.0");
        assert_eq!(
            describe_range(&windows, &VersionRange::new(v10, Some(v11))),
            "'windows' from 10.0 to 11.0"
        );
    }

    #[test]
    fn test_obsolete_text_with_message_and_url() {
        let text = obsoleted("all platforms", "Api.Run", "'ios' 13.0 and later", Some("Use Run2."), Some("https://aka.ms/x"));
        assert_eq!(
            text,
            "This call site is reachable on all platforms. 'Api.Run' has been marked obsolete on: 'ios' 13.0 and later. Use Run2. (https://aka.ms/x)"
        );
    }
}
