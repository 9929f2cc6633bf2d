//! Videosync production server.
//!
//! Runs the [`videosync_core`] room state machines as tokio actors and serves
//! them over WebSockets with axum.
//!
//! # Architecture
//!
//! [`RoomState`](videosync_core::RoomState) is pure logic that returns
//! actions. Each room gets one actor task ([`RoomHandle`]) that owns the state,
//! applies commands one at a time, and executes the resulting actions: member
//! writes, settle delays, and starting or stopping the drift monitor.
//!
//! # Components
//!
//! - [`RoomManager`]: create-on-demand registry of room actors
//! - [`RoomHandle`]: submits operations to one room's mailbox
//! - [`Session`]: connection protocol (introduce, dispatch, kick)
//! - [`YouTubeProvider`]: video metadata via the YouTube Data API
//! - [`Server`]: binds the listener and serves the HTTP routes
//! - [`SystemEnv`]: production environment on the tokio clock

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod member;
mod room;
mod room_manager;
mod session;
mod system_env;
pub mod transport;
pub mod youtube;

use std::{net::SocketAddr, sync::Arc};

pub use config::{RoomConfig, ServerRuntimeConfig};
pub use error::{RoomError, SendError, ServerError};
pub use member::{CloseSignal, Link, LinkReceiver, MemberId, MemberIds, link};
pub use room::RoomHandle;
pub use room_manager::RoomManager;
pub use session::{Session, SessionError};
pub use system_env::SystemEnv;
use tokio::net::TcpListener;
use tracing::info;
use videosync_core::VideoInfoProvider;
pub use youtube::YouTubeProvider;

/// Production server: an HTTP listener serving room sockets.
pub struct Server {
    listener: TcpListener,
    rooms: Arc<RoomManager<SystemEnv>>,
}

impl Server {
    /// Bind the listener and set up the room registry.
    ///
    /// # Errors
    ///
    /// - `ServerError::Config` if the bind address does not parse
    /// - `ServerError::Transport` if the address cannot be bound
    pub async fn bind(
        config: ServerRuntimeConfig,
        provider: Arc<dyn VideoInfoProvider>,
    ) -> Result<Self, ServerError> {
        let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
            ServerError::Config(format!("invalid bind address {:?}: {e}", config.bind_address))
        })?;

        let listener = TcpListener::bind(addr).await?;
        let rooms = Arc::new(RoomManager::new(SystemEnv::new(), config.room, provider));

        Ok(Self { listener, rooms })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Room registry served by this server.
    pub fn rooms(&self) -> Arc<RoomManager<SystemEnv>> {
        Arc::clone(&self.rooms)
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(async {
            // Without a signal handler we can only run until killed.
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = transport::router(self.rooms);
        axum::serve(self.listener, router).with_graceful_shutdown(shutdown).await?;
        info!("server stopped");
        Ok(())
    }
}
