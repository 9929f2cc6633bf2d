//! Runtime configuration.

use std::time::Duration;

/// Tuning knobs for every room actor.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Period of the drift monitor
    pub drift_interval: Duration,

    /// Pause between `load` and `play` so clients can buffer the new video
    pub settle_delay: Duration,

    /// Upper bound on a single write to one member
    pub send_timeout: Duration,

    /// Commands a room accepts before submitters start waiting
    pub mailbox_capacity: usize,

    /// Server messages buffered per member before writes start waiting
    pub outbound_buffer: usize,

    /// How long a new connection may take to send `introduce`
    pub introduce_timeout: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            drift_interval: Duration::from_secs(1),
            settle_delay: Duration::from_secs(1),
            send_timeout: Duration::from_secs(5),
            mailbox_capacity: 10,
            outbound_buffer: 32,
            introduce_timeout: Duration::from_secs(10),
        }
    }
}

/// Server runtime configuration.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind the HTTP listener to
    pub bind_address: String,

    /// Per-room settings
    pub room: RoomConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0:8080".to_string(), room: RoomConfig::default() }
    }
}
