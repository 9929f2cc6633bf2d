//! Environment abstraction for deterministic testing.
//!
//! Decouples room logic from the clock. Production uses the runtime's clock;
//! tests run on a paused clock that only advances when every task is idle,
//! which makes drift checks and settle delays reproducible.

use std::time::Duration;

/// Abstract environment providing time and async sleeping.
///
/// Implementations MUST guarantee that `now()` never goes backwards.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment.
    type Instant: Copy + Ord + Send + Sync + std::fmt::Debug + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only runtime code (room tasks, drift monitors) sleeps; room state
    /// transitions take `now` as a parameter and never block.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
