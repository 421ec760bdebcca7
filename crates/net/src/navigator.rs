//! Navigation hook for authentication failures
//!
//! The gateway never decides what "go to sign-in" means. It calls the
//! navigator and the hosting front end does the rest.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Route shown to unauthenticated users
pub const LANDING_ROUTE: &str = "/";

/// Receives navigation requests from the gateway
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Ignores navigation requests
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _route: &str) {}
}

/// Counts navigation requests. Useful for front ends that poll.
#[derive(Debug, Default)]
pub struct CountingNavigator {
    count: AtomicUsize,
}

impl CountingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of redirects requested so far
    pub fn redirects(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Return the count and reset it to zero
    pub fn take(&self) -> usize {
        self.count.swap(0, Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn navigate(&self, route: &str) {
        tracing::debug!(route, "Navigation requested");
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
