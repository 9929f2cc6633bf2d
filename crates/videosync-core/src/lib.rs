//! Sans-IO room engine for videosync.
//!
//! Everything in this crate is pure logic: time comes in as a parameter and
//! side effects go out as [`RoomAction`]s. The server crate owns the tasks,
//! sockets and clocks that execute them.
//!
//! # Components
//!
//! - [`Playback`]: current video and extrapolated position
//! - [`Queue`]: pending videos with client-index reorder/remove
//! - [`RoomState`]: members, playback and queue combined into one state
//!   machine that emits [`RoomAction`]s
//! - [`Environment`]: clock abstraction so tests can run on virtual time
//! - [`VideoInfoProvider`]: seam for resolving a URL or id to metadata

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod error;
pub mod playback;
pub mod queue;
pub mod room;
pub mod video;

pub use env::Environment;
pub use error::ResolveError;
pub use playback::{Playback, PlaybackState};
pub use queue::Queue;
pub use room::{MemberId, RoomAction, RoomSnapshot, RoomState};
pub use video::VideoInfoProvider;
