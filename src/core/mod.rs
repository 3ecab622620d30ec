/*!
# Core Module

Core functionality shared by every analysis phase: error types,
source positions and the cooperative cancellation token.
*/

pub mod cancellation;
pub mod errors;
pub mod fs_utils;
pub mod position;

pub use cancellation::CancellationToken;
pub use errors::{AnalysisError, PlatformError};
pub use fs_utils::read_json_file;
pub use position::{Position, Span};
