//! RoomManager behavior and properties.

use std::{collections::HashSet, sync::Arc};

use proptest::prelude::*;
use videosync_harness::{FakeVideoProvider, TestClient};
use videosync_proto::ClientMessage;
use videosync_server::{MemberId, RoomConfig, RoomManager, SystemEnv};

fn manager() -> RoomManager<SystemEnv> {
    let provider = FakeVideoProvider::new().with("A", "Video A", 100.0);
    RoomManager::new(SystemEnv::new(), RoomConfig::default(), Arc::new(provider))
}

#[tokio::test(start_paused = true)]
async fn concurrent_gets_share_one_room() {
    let manager = Arc::new(manager());

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.get("lobby").await })
        })
        .collect();

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap());
    }

    assert!(handles.iter().all(|h| h.same_room(&handles[0])));
    assert_eq!(manager.room_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn distinct_ids_get_distinct_rooms() {
    let manager = manager();
    assert!(!manager.has_room("a").await);

    let a = manager.get("a").await;
    let b = manager.get("b").await;

    assert!(!a.same_room(&b));
    assert_eq!(a.id(), "a");
    assert!(manager.has_room("a").await);
    assert_eq!(manager.room_count().await, 2);
}

#[tokio::test(start_paused = true)]
async fn emptied_room_keeps_its_state() {
    let manager = manager();
    let room = manager.get("lobby").await;
    let alice = TestClient::join(&room, MemberId(1), "alice").await.unwrap();
    alice.send(&ClientMessage::queue_url("A")).await.unwrap();
    alice.leave().await.unwrap();

    let again = manager.get("lobby").await;
    let snapshot = again.snapshot().await.unwrap();

    assert!(again.same_room(&room));
    assert!(snapshot.members.is_empty());
    assert_eq!(snapshot.current_video.map(|v| v.video.id), Some("A".to_string()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: the registry holds exactly one room per distinct id
    #[test]
    fn prop_one_room_per_id(ids in prop::collection::vec("[a-z]{1,3}", 1..20)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .unwrap();

        let (count, unique) = runtime.block_on(async {
            let manager = manager();
            for id in &ids {
                let first = manager.get(id).await;
                let second = manager.get(id).await;
                assert!(first.same_room(&second));
            }
            let unique: HashSet<&String> = ids.iter().collect();
            (manager.room_count().await, unique.len())
        });

        prop_assert_eq!(count, unique);
    }
}
