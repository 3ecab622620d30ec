/*!
# Platform vocabulary

Platform names, versions and version ranges. Every platform-dependent
fact in the analysis (contracts, guard results, flow contexts) is expressed
with the types in this module.
*/

pub mod name;
pub mod range;
pub mod version;
pub mod vocabulary;

pub use name::{BuiltinPlatform, PlatformName, BUILTIN_PLATFORMS};
pub use range::{VersionRange, VersionSet};
pub use version::{Version, MAX_VERSION_PARTS};
pub use vocabulary::{ParsedPlatform, PlatformVocabulary};
