//! Redirect port.

use std::sync::{Mutex, PoisonError};

/// Hands the visitor over to an external page
///
/// In a browser host this sets the window location. Headless hosts decide
/// for themselves what a redirect means.
pub trait Navigator: Send + Sync {
    /// Navigate to `url`
    fn redirect(&self, url: &str);
}

/// [`Navigator`] that records redirects instead of performing them
#[derive(Debug, Default)]
pub struct RedirectLog {
    urls: Mutex<Vec<String>>,
}

impl RedirectLog {
    /// Empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every URL redirected to, oldest first
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Most recent redirect
    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for RedirectLog {
    fn redirect(&self, url: &str) {
        tracing::info!(url, "Redirecting to payment page");
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
    }
}
