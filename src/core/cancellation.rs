//! Cooperative cancellation for body walks.
//!
//! The walker polls the token between node visits; a cancelled walk discards
//! the partial diagnostics of that body only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::AnalysisError;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every walk observing this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(AnalysisError::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), AnalysisError> {
        if self.is_cancelled() {
            Err(AnalysisError::Cancelled)
        } else {
            Ok(())
        }
    }
}
