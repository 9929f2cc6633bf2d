//! Scripted video metadata provider.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use videosync_core::{ResolveError, VideoInfoProvider};
use videosync_proto::Video;

/// Resolves only the videos it was given.
///
/// Lookups match the input exactly, so tests can register a URL and a bare id
/// as separate entries.
#[derive(Debug, Default)]
pub struct FakeVideoProvider {
    videos: HashMap<String, Video>,
    unavailable: HashMap<String, String>,
    latency: Option<Duration>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl FakeVideoProvider {
    /// Provider that knows no videos.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `key` to `video`.
    #[must_use]
    pub fn with_video(mut self, key: impl Into<String>, video: Video) -> Self {
        self.videos.insert(key.into(), video);
        self
    }

    /// Shorthand for a video whose key and id are both `id`.
    #[must_use]
    pub fn with(self, id: &str, title: &str, duration: f64) -> Self {
        self.with_video(id, Video::new(id, title, duration))
    }

    /// Fail lookups of `key` as if the service were down.
    #[must_use]
    pub fn with_outage(mut self, key: impl Into<String>, reason: impl Into<String>) -> Self {
        self.unavailable.insert(key.into(), reason.into());
        self
    }

    /// Delay every lookup by `latency` (on the tokio clock).
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Delay lookups of `key` by `delay`, overriding [`with_latency`](Self::with_latency).
    #[must_use]
    pub fn with_delay(mut self, key: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(key.into(), delay);
        self
    }

    /// Number of lookups so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoInfoProvider for FakeVideoProvider {
    async fn resolve(&self, id_or_url: &str) -> Result<Video, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(id_or_url).copied().or(self.latency) {
            tokio::time::sleep(delay).await;
        }

        if let Some(reason) = self.unavailable.get(id_or_url) {
            return Err(ResolveError::Unavailable(reason.clone()));
        }
        self.videos
            .get(id_or_url)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(id_or_url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use videosync_core::Environment;
    use videosync_server::SystemEnv;

    use super::*;

    #[tokio::test]
    async fn resolves_known_and_counts_calls() {
        let provider = FakeVideoProvider::new().with("abc", "ABC", 12.0).with_outage("down", "503");

        assert_eq!(provider.resolve("abc").await.map(|v| v.duration), Ok(12.0));
        assert_eq!(provider.resolve("nope").await, Err(ResolveError::NotFound("nope".into())));
        assert_eq!(provider.resolve("down").await, Err(ResolveError::Unavailable("503".into())));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn per_key_delay_overrides_latency() {
        let provider = FakeVideoProvider::new()
            .with("fast", "Fast", 1.0)
            .with("slow", "Slow", 1.0)
            .with_latency(Duration::from_millis(10))
            .with_delay("slow", Duration::from_secs(2));

        let env = SystemEnv::new();
        let start = env.now();
        provider.resolve("fast").await.unwrap();
        assert!(env.now() - start < Duration::from_secs(1));

        let start = env.now();
        provider.resolve("slow").await.unwrap();
        assert!(env.now() - start >= Duration::from_secs(2));
    }
}
