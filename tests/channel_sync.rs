use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use focuslink::sync::{ChannelOptions, MemoryStore, SharedStateChannel, SharedStore};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Doc {
    text: String,
    revision: u32,
}

fn pull_only() -> ChannelOptions {
    ChannelOptions {
        poll_interval: Duration::from_millis(500),
        push_enabled: false,
    }
}

fn open(store: &Arc<MemoryStore>, options: ChannelOptions) -> SharedStateChannel<Doc> {
    SharedStateChannel::open(store.clone(), "doc", Doc::default(), options)
}

#[tokio::test(start_paused = true)]
async fn pull_path_alone_converges_within_one_interval() {
    let store = Arc::new(MemoryStore::new());
    let a = open(&store, pull_only());
    let b = open(&store, pull_only());

    let value = Doc {
        text: "hello".into(),
        revision: 1,
    };
    a.write(value.clone()).await;

    // No push path at all: one poll interval is enough.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(b.last_known(), value);
}

#[tokio::test(start_paused = true)]
async fn push_path_delivers_without_waiting_for_the_poll() {
    let store = Arc::new(MemoryStore::new());
    let a = open(&store, ChannelOptions::default());
    let b = open(&store, ChannelOptions::default());
    let mut rx = b.subscribe();

    a.write(Doc {
        text: "fast".into(),
        revision: 1,
    })
    .await;

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().text, "fast");
}

#[tokio::test(start_paused = true)]
async fn own_write_never_feeds_back_as_external_change() {
    let store = Arc::new(MemoryStore::new());
    let a = open(&store, ChannelOptions::default());
    let mut rx = a.subscribe();

    a.write(Doc {
        text: "mine".into(),
        revision: 1,
    })
    .await;

    // Several poll intervals with push enabled: nothing external appears.
    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert!(!rx.has_changed().unwrap());
    assert_eq!(a.last_known().text, "mine");
}

#[tokio::test(start_paused = true)]
async fn read_falls_back_to_initial_when_store_is_unreachable() {
    let store = Arc::new(MemoryStore::new());
    store.set_offline(true);
    let a = open(&store, pull_only());

    assert_eq!(a.read().await, Doc::default());
}

#[tokio::test(start_paused = true)]
async fn failed_write_is_retried_on_the_next_tick() {
    let store = Arc::new(MemoryStore::new());
    let a = open(&store, pull_only());
    let b = open(&store, pull_only());

    store.set_offline(true);
    let value = Doc {
        text: "deferred".into(),
        revision: 3,
    };
    a.write(value.clone()).await;

    // The writer's own view already reflects the write.
    assert_eq!(a.last_known(), value);
    assert!(store.snapshot_of("doc").is_none());

    store.set_offline(false);
    tokio::time::sleep(Duration::from_millis(1200)).await;

    assert!(store.snapshot_of("doc").is_some());
    assert_eq!(b.last_known(), value);
}

#[tokio::test(start_paused = true)]
async fn pending_write_is_not_rolled_back_by_the_pull() {
    let store = Arc::new(MemoryStore::new());
    let a = open(&store, pull_only());
    let b = open(&store, pull_only());

    b.write(Doc {
        text: "older".into(),
        revision: 1,
    })
    .await;

    store.set_offline(true);
    let newer = Doc {
        text: "newer".into(),
        revision: 2,
    };
    a.write(newer.clone()).await;

    // Polls run while the store is down; the deferred local write must not
    // be overwritten by the stale stored value.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(a.last_known(), newer);

    store.set_offline(false);
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(b.last_known(), newer);
}

#[tokio::test(start_paused = true)]
async fn undecodable_snapshot_keeps_last_known_value() {
    let store = Arc::new(MemoryStore::new());
    let a = open(&store, pull_only());

    let good = Doc {
        text: "good".into(),
        revision: 1,
    };
    a.write(good.clone()).await;

    store
        .save("doc", "{not json", uuid::Uuid::new_v4())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(a.last_known(), good);
}

#[tokio::test(start_paused = true)]
async fn update_merges_over_the_reconciled_value() {
    let store = Arc::new(MemoryStore::new());
    let a = open(&store, pull_only());
    let b = open(&store, pull_only());

    a.write(Doc {
        text: "base".into(),
        revision: 1,
    })
    .await;
    tokio::time::sleep(Duration::from_millis(600)).await;

    b.update(|doc| doc.revision += 1).await;
    tokio::time::sleep(Duration::from_millis(600)).await;

    // B's update kept A's field because it replaced the whole value based on
    // its reconciled copy.
    let merged = a.last_known();
    assert_eq!(merged.text, "base");
    assert_eq!(merged.revision, 2);
}

#[tokio::test(start_paused = true)]
async fn closed_channel_stops_polling() {
    let store = Arc::new(MemoryStore::new());
    let a = open(&store, pull_only());
    let b = open(&store, pull_only());

    b.close();
    a.write(Doc {
        text: "after close".into(),
        revision: 1,
    })
    .await;

    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert_eq!(b.last_known(), Doc::default());
}

#[tokio::test(start_paused = true)]
async fn channels_converge_on_the_latest_write() {
    let store = Arc::new(MemoryStore::new());
    let a = open(&store, pull_only());
    let b = open(&store, pull_only());

    for revision in 1..=3 {
        a.write(Doc {
            text: format!("rev {revision}"),
            revision,
        })
        .await;
    }
    b.write(Doc {
        text: "final".into(),
        revision: 4,
    })
    .await;

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(a.last_known().text, "final");
    assert_eq!(b.last_known().text, "final");
}
