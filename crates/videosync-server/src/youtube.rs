//! YouTube metadata provider.
//!
//! Accepts anything a user is likely to paste (watch, short, embed, live and
//! `youtu.be` links, with or without scheme, or a bare 11-character id) and
//! resolves it through the YouTube Data API v3 `videos` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;
use videosync_core::{ResolveError, VideoInfoProvider};
use videosync_proto::Video;

use crate::error::ServerError;

/// Default Data API endpoint for video lookups.
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";

const VIDEO_ID_LEN: usize = 11;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether `candidate` has the shape of a YouTube video id.
pub fn is_video_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Extract the video id from a URL or bare id. `None` if none is recognisable.
pub fn parse_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if is_video_id(input) {
        return Some(input.to_string());
    }

    let url = Url::parse(input).or_else(|_| Url::parse(&format!("https://{input}"))).ok()?;
    let host = url.host_str()?;
    let host = ["www.", "m.", "music."]
        .iter()
        .find_map(|prefix| host.strip_prefix(prefix))
        .unwrap_or(host);

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next()?.to_string(),
        "youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next()? {
                "watch" => url.query_pairs().find(|(k, _)| k == "v")?.1.into_owned(),
                "shorts" | "embed" | "live" | "v" => segments.next()?.to_string(),
                _ => return None,
            }
        },
        _ => return None,
    };

    is_video_id(&candidate).then_some(candidate)
}

/// Parse an ISO-8601 duration such as `PT1H2M3S` or `P1DT30M` into seconds.
///
/// Only day and time components are supported; YouTube never reports years,
/// months or weeks.
pub fn parse_duration(iso: &str) -> Option<f64> {
    let rest = iso.strip_prefix('P')?;
    let (date, time) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    let mut seconds = 0.0;
    if !date.is_empty() {
        let days = date.strip_suffix('D')?;
        seconds += parse_component(days)? * 86_400.0;
    }

    if let Some(mut time) = time {
        if time.is_empty() {
            return None;
        }
        for (unit, scale) in [('H', 3_600.0), ('M', 60.0), ('S', 1.0)] {
            if let Some((value, tail)) = time.split_once(unit) {
                seconds += parse_component(value)? * scale;
                time = tail;
            }
        }
        if !time.is_empty() {
            return None;
        }
    }

    Some(seconds)
}

/// One numeric duration component. Rejects negative and non-finite values.
fn parse_component(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    channel_title: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

fn video_from_response(id: &str, response: VideoListResponse) -> Result<Video, ResolveError> {
    let item = response
        .items
        .into_iter()
        .find(|item| item.id == id)
        .ok_or_else(|| ResolveError::NotFound(id.to_string()))?;

    let duration = parse_duration(&item.content_details.duration).ok_or_else(|| {
        ResolveError::Malformed(format!("duration {:?}", item.content_details.duration))
    })?;

    let Thumbnails { high, medium, default } = item.snippet.thumbnails;
    let mut video = Video::new(item.id, item.snippet.title, duration);
    video.channel = item.snippet.channel_title;
    video.thumbnail = high.or(medium).or(default).map(|t| t.url);
    Ok(video)
}

/// [`VideoInfoProvider`] backed by the YouTube Data API.
#[derive(Debug, Clone)]
pub struct YouTubeProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl YouTubeProvider {
    /// Provider using `api_key` against the public endpoint.
    ///
    /// # Errors
    ///
    /// `ServerError::Config` if the key is empty or the HTTP client cannot be
    /// built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ServerError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ServerError::Config("YouTube API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ServerError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { client, api_key, endpoint: DEFAULT_ENDPOINT.to_string() })
    }

    /// Point the provider at a different endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl VideoInfoProvider for YouTubeProvider {
    async fn resolve(&self, id_or_url: &str) -> Result<Video, ResolveError> {
        let id = parse_video_id(id_or_url)
            .ok_or_else(|| ResolveError::InvalidReference(id_or_url.to_string()))?;
        debug!(video = %id, "looking up video");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("part", "snippet,contentDetails"),
                ("id", id.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ResolveError::Unavailable(e.without_url().to_string()))?;

        match response.status() {
            StatusCode::OK => {},
            StatusCode::NOT_FOUND => return Err(ResolveError::NotFound(id)),
            status => return Err(ResolveError::Unavailable(format!("status {status}"))),
        }

        let body: VideoListResponse =
            response.json().await.map_err(|e| ResolveError::Malformed(e.to_string()))?;
        video_from_response(&id, body)
    }
}
