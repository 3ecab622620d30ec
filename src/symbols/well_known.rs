//! Declarations of the platform-check API surface.
//!
//! Real compilations get these symbols from the referenced framework; test
//! fixtures and the demo compilations declare them with
//! [`declare_platform_check_api`].

use super::{SymbolId, SymbolKind, SymbolTable};
use crate::platform::BUILTIN_PLATFORMS;

pub const OPERATING_SYSTEM_TYPE: &str = "System.OperatingSystem";
pub const RUNTIME_INFORMATION_TYPE: &str = "System.Runtime.InteropServices.RuntimeInformation";
pub const OS_PLATFORM_TYPE: &str = "System.Runtime.InteropServices.OSPlatform";
pub const DEBUG_TYPE: &str = "System.Diagnostics.Debug";

pub const IS_OS_PLATFORM: &str = "IsOSPlatform";
pub const IS_OS_PLATFORM_VERSION_AT_LEAST: &str = "IsOSPlatformVersionAtLeast";
pub const IS_OS_PLATFORM_OR_LATER: &str = "IsOSPlatformOrLater";
pub const IS_OS_PLATFORM_EARLIER_THAN: &str = "IsOSPlatformEarlierThan";
pub const VERSION_AT_LEAST_SUFFIX: &str = "VersionAtLeast";
pub const OS_PLATFORM_CREATE: &str = "Create";
pub const ASSERT: &str = "Assert";

/// `OSPlatform` static properties and the platform they denote.
pub const OS_PLATFORM_PROPERTIES: &[(&str, &str)] = &[
    ("Windows", "windows"),
    ("Linux", "linux"),
    ("OSX", "macos"),
    ("FreeBSD", "freebsd"),
];

/// Ids of the declared well-known types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCheckApi {
    pub operating_system: SymbolId,
    pub runtime_information: SymbolId,
    pub os_platform: SymbolId,
    pub debug: SymbolId,
}

/// Declares `OperatingSystem`, `RuntimeInformation`, `OSPlatform` and
/// `Debug` inside `assembly`.
pub fn declare_platform_check_api(table: &mut SymbolTable, assembly: SymbolId) -> PlatformCheckApi {
    let operating_system = table.add_symbol(OPERATING_SYSTEM_TYPE, SymbolKind::Type, Some(assembly));
    for name in [
        IS_OS_PLATFORM,
        IS_OS_PLATFORM_VERSION_AT_LEAST,
        IS_OS_PLATFORM_OR_LATER,
        IS_OS_PLATFORM_EARLIER_THAN,
    ] {
        table.add_symbol(name, SymbolKind::Method, Some(operating_system));
    }
    for platform in BUILTIN_PLATFORMS {
        table.add_symbol(format!("Is{}", platform.guard_name), SymbolKind::Method, Some(operating_system));
        if platform.max_version_parts > 0 {
            table.add_symbol(
                format!("Is{}{}", platform.guard_name, VERSION_AT_LEAST_SUFFIX),
                SymbolKind::Method,
                Some(operating_system),
            );
        }
    }

    let runtime_information = table.add_symbol(RUNTIME_INFORMATION_TYPE, SymbolKind::Type, Some(assembly));
    table.add_symbol(IS_OS_PLATFORM, SymbolKind::Method, Some(runtime_information));

    let os_platform = table.add_symbol(OS_PLATFORM_TYPE, SymbolKind::Type, Some(assembly));
    for (property, _) in OS_PLATFORM_PROPERTIES {
        table.add_symbol(*property, SymbolKind::Property, Some(os_platform));
    }
    table.add_symbol(OS_PLATFORM_CREATE, SymbolKind::Method, Some(os_platform));

    let debug = table.add_symbol(DEBUG_TYPE, SymbolKind::Type, Some(assembly));
    table.add_symbol(ASSERT, SymbolKind::Method, Some(debug));

    PlatformCheckApi {
        operating_system,
        runtime_information,
        os_platform,
        debug,
    }
}
