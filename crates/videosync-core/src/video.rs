//! Video metadata lookup seam.

use std::sync::Arc;

use async_trait::async_trait;
use videosync_proto::Video;

use crate::error::ResolveError;

/// Resolves a video id or URL to `{id, title, duration}`.
///
/// Implementations talk to an external metadata service and may fail for any
/// reason; callers treat every failure the same way. Must be shareable across
/// room tasks.
#[async_trait]
pub trait VideoInfoProvider: Send + Sync + 'static {
    /// Resolve `id_or_url` to a video.
    async fn resolve(&self, id_or_url: &str) -> Result<Video, ResolveError>;
}

#[async_trait]
impl<P: VideoInfoProvider + ?Sized> VideoInfoProvider for Arc<P> {
    async fn resolve(&self, id_or_url: &str) -> Result<Video, ResolveError> {
        (**self).resolve(id_or_url).await
    }
}
