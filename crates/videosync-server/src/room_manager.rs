//! Room registry.
//!
//! Maps room ids to running room actors. Rooms are created on first use and
//! live for the rest of the process; an emptied room keeps its queue and
//! playback so members navigating back find it as they left it.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::info;
use videosync_core::{Environment, VideoInfoProvider};

use crate::{config::RoomConfig, room::RoomHandle};

/// Registry of live rooms.
///
/// Lookups take a shared lock; only the first request for an unknown id takes
/// the exclusive lock to create it.
pub struct RoomManager<E: Environment> {
    rooms: RwLock<HashMap<String, RoomHandle>>,
    env: E,
    config: RoomConfig,
    provider: Arc<dyn VideoInfoProvider>,
}

impl<E: Environment> std::fmt::Debug for RoomManager<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomManager").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<E: Environment> RoomManager<E> {
    /// Empty registry. Rooms it creates share `env`, `config` and `provider`.
    pub fn new(env: E, config: RoomConfig, provider: Arc<dyn VideoInfoProvider>) -> Self {
        Self { rooms: RwLock::new(HashMap::new()), env, config, provider }
    }

    /// Handle to room `id`, starting the room if it does not exist yet.
    ///
    /// Concurrent calls for the same id always return handles to the same
    /// room. Must be called from within a tokio runtime.
    pub async fn get(&self, id: &str) -> RoomHandle {
        if let Some(room) = self.rooms.read().await.get(id) {
            return room.clone();
        }

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(id.to_string())
            .or_insert_with(|| {
                info!(room = id, "creating room");
                RoomHandle::spawn(id, self.env.clone(), self.config.clone(), self.provider.clone())
            })
            .clone()
    }

    /// Whether room `id` has been created.
    pub async fn has_room(&self, id: &str) -> bool {
        self.rooms.read().await.contains_key(id)
    }

    /// Number of rooms created so far.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Settings applied to every room.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }
}
