//! Page navigation side effects.

use std::sync::{Mutex, PoisonError};

use tracing::info;

/// Performs page navigation (e.g., "redirect to login").
pub trait Navigator: Send + Sync {
    /// Navigate to `url`.
    fn redirect(&self, url: &str);
}

/// Navigator for headless use: logs the redirect instead of performing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, url: &str) {
        info!(url, "Redirecting");
    }
}

/// Navigator that remembers every redirect, in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Create a navigator with no recorded visits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All redirect targets so far.
    #[must_use]
    pub fn visits(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of redirects so far.
    #[must_use]
    pub fn redirect_count(&self) -> usize {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, url: &str) {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
    }
}
