//! Test doubles for videosync.
//!
//! - [`FakeVideoProvider`]: scripted [`VideoInfoProvider`](videosync_core::VideoInfoProvider)
//!   with call counting and failure injection
//! - [`TestClient`]: an admitted [`Session`](videosync_server::Session) plus the
//!   receiving end of its link, so tests can act as a member without a socket
//!
//! Tests in this crate drive the server runtime on tokio's paused clock, which
//! only advances when every task is idle. Settle delays and drift ticks then
//! run instantly and in a reproducible order.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fake_provider;
pub mod test_client;

pub use fake_provider::FakeVideoProvider;
pub use test_client::TestClient;
