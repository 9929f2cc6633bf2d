//! Playback position model.
//!
//! The server never simulates continuous playback. It keeps the last absolute
//! position a client reported and the instant it was reported, and
//! extrapolates from there:
//!
//! ```text
//! position(now) = clamp(last + (playing ? now - reported_at : 0), 0, duration)
//! ```
//!
//! # State machine
//!
//! `Empty -> Paused -> Playing <-> Paused`. Only [`Playback::clear`] returns to
//! `Empty`, and only [`Playback::load`] leaves it.
//!
//! # Invariants
//!
//! - `state == Empty` iff no current video.
//! - Stored positions are never negative.

use std::time::Duration;

use serde::Serialize;
use videosync_proto::QueuedVideo;

/// Play/pause state of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No video loaded
    #[default]
    Empty,
    /// Video advancing in real time
    Playing,
    /// Video stopped at the last reported position
    Paused,
}

impl PlaybackState {
    /// Integer code used on the wire.
    ///
    /// Matches the embedded player's codes for playing (1) and paused (2).
    pub fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Playing => 1,
            Self::Paused => 2,
        }
    }
}

/// Current video plus the latest position sample.
///
/// Generic over `I` (Instant type) to support virtual time in tests.
#[derive(Debug, Clone)]
pub struct Playback<I> {
    current: Option<QueuedVideo>,
    state: PlaybackState,
    last_position: f64,
    reported_at: Option<I>,
}

impl<I> Default for Playback<I> {
    fn default() -> Self {
        Self { current: None, state: PlaybackState::Empty, last_position: 0.0, reported_at: None }
    }
}

impl<I> Playback<I>
where
    I: Copy + std::ops::Sub<Output = Duration>,
{
    /// Empty playback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Currently loaded video, if any.
    pub fn current(&self) -> Option<&QueuedVideo> {
        self.current.as_ref()
    }

    /// Id of the current video, or the empty string.
    pub fn video_id(&self) -> &str {
        self.current.as_ref().map_or("", QueuedVideo::id)
    }

    /// Last reported position, before extrapolation.
    pub fn last_position(&self) -> f64 {
        self.last_position
    }

    /// Replace the current video, paused at zero.
    pub fn load(&mut self, video: QueuedVideo, now: I) {
        self.current = Some(video);
        self.state = PlaybackState::Paused;
        self.last_position = 0.0;
        self.reported_at = Some(now);
    }

    /// Drop the current video and return to `Empty`.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Record a client position report.
    ///
    /// Returns `false` (and changes nothing) when no video is loaded, since a
    /// playing or paused state without a video would break the state machine.
    pub fn report(&mut self, state: PlaybackState, position: f64, now: I) -> bool {
        if self.current.is_none() || state == PlaybackState::Empty {
            return false;
        }

        self.state = state;
        self.last_position = position.max(0.0);
        self.reported_at = Some(now);
        true
    }

    /// Extrapolated position without clamping to the video length.
    ///
    /// The drift check compares this against the duration to detect overrun.
    pub fn unclamped_position(&self, now: I) -> f64 {
        match (self.state, self.reported_at) {
            (PlaybackState::Playing, Some(at)) => self.last_position + (now - at).as_secs_f64(),
            _ => self.last_position,
        }
    }

    /// Extrapolated position clamped to `[0, duration]`. Zero when empty.
    pub fn position(&self, now: I) -> f64 {
        match &self.current {
            Some(entry) => self.unclamped_position(now).clamp(0.0, entry.video.duration.max(0.0)),
            None => 0.0,
        }
    }

    /// Whether playback has run past the end of the current video.
    pub fn has_overrun(&self, now: I) -> bool {
        self.current
            .as_ref()
            .is_some_and(|entry| self.unclamped_position(now) > entry.video.duration)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use videosync_proto::Video;

    use super::*;

    fn entry(duration: f64) -> QueuedVideo {
        QueuedVideo::new(Video::new("vid", "Video", duration), "alice")
    }

    #[test]
    fn empty_playback_reports_zero() {
        let playback = Playback::<Instant>::new();
        assert_eq!(playback.state(), PlaybackState::Empty);
        assert_eq!(playback.video_id(), "");
    }

    #[test]
    fn load_pauses_at_zero() {
        #[allow(clippy::disallowed_methods)]
        let now = Instant::now();
        let mut playback = Playback::new();

        playback.load(entry(100.0), now);

        assert_eq!(playback.state(), PlaybackState::Paused);
        assert_eq!(playback.video_id(), "vid");
        assert!(playback.position(now + Duration::from_secs(30)).abs() < f64::EPSILON);
    }

    #[test]
    fn report_on_empty_is_ignored() {
        #[allow(clippy::disallowed_methods)]
        let now = Instant::now();
        let mut playback = Playback::new();

        assert!(!playback.report(PlaybackState::Playing, 10.0, now));
        assert_eq!(playback.state(), PlaybackState::Empty);
    }

    #[test]
    fn negative_reports_clamp_to_zero() {
        #[allow(clippy::disallowed_methods)]
        let now = Instant::now();
        let mut playback = Playback::new();
        playback.load(entry(100.0), now);

        playback.report(PlaybackState::Paused, -5.0, now);
        assert!(playback.last_position().abs() < f64::EPSILON);
    }

    #[test]
    fn position_clamps_to_duration_but_overrun_is_detected() {
        #[allow(clippy::disallowed_methods)]
        let start = Instant::now();
        let mut playback = Playback::new();
        playback.load(entry(100.0), start);
        playback.report(PlaybackState::Playing, 95.0, start);

        let later = start + Duration::from_secs(10);
        assert!((playback.position(later) - 100.0).abs() < f64::EPSILON);
        assert!((playback.unclamped_position(later) - 105.0).abs() < 1e-9);
        assert!(playback.has_overrun(later));
    }

    #[test]
    fn clear_returns_to_empty() {
        #[allow(clippy::disallowed_methods)]
        let now = Instant::now();
        let mut playback = Playback::new();
        playback.load(entry(10.0), now);

        playback.clear();

        assert_eq!(playback.state(), PlaybackState::Empty);
        assert!(playback.current().is_none());
        assert!(!playback.has_overrun(now + Duration::from_secs(60)));
    }

    #[test]
    fn wire_codes_match_player_states() {
        assert_eq!(PlaybackState::Empty.code(), 0);
        assert_eq!(PlaybackState::Playing.code(), 1);
        assert_eq!(PlaybackState::Paused.code(), 2);
    }
}
