//! Production Environment implementation backed by the tokio clock.
//!
//! `SystemEnv` reads time from `tokio::time::Instant`, which tracks the real
//! monotonic clock in production. Under a paused tokio runtime the same type
//! follows virtual time, so the room runtime can be tested for drift and
//! settle timing without real waits.

use std::time::Duration;

use videosync_core::Environment;

/// Production environment using the tokio clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = tokio::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
