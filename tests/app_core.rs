use std::sync::Arc;
use std::time::Duration;

use focuslink::surface::HeadlessHost;
use focuslink::timer::TimerPhase;
use focuslink::AppCore;

#[tokio::test]
async fn full_cycle_from_start_to_report() {
    let dir = tempfile::tempdir().unwrap();
    let core = AppCore::start(dir.path(), Arc::new(HeadlessHost::new()))
        .await
        .unwrap();

    core.engine.start().await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    core.engine.reset("Work").await;

    assert_eq!(core.engine.snapshot().await.phase, TimerPhase::Idle);

    // The sink persists through the fire-and-forget queue; poll briefly.
    let mut blocks = Vec::new();
    for _ in 0..20 {
        blocks = core.merged_blocks().await.unwrap();
        if !blocks.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].tag, "Work");

    let buckets = core.day_buckets().await.unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].session_count, 1);
    assert!(buckets[0].total_secs >= 1);

    core.shutdown().await;
}

#[tokio::test]
async fn companion_opens_with_configured_geometry() {
    struct SilentView;
    impl focuslink::surface::CompanionView for SilentView {
        fn render(&mut self, _mirror: &focuslink::timer::TimerMirror) {}
    }

    let dir = tempfile::tempdir().unwrap();
    let core = AppCore::start(dir.path(), Arc::new(HeadlessHost::new()))
        .await
        .unwrap();

    core.open_companion(|_remote| Box::new(SilentView)).await.unwrap();
    assert!(core.surfaces.is_open().await);

    core.shutdown().await;
    assert!(!core.surfaces.is_open().await);
}

#[tokio::test]
async fn settings_are_created_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let core = AppCore::start(dir.path(), Arc::new(HeadlessHost::new()))
        .await
        .unwrap();

    let timer = core.settings.timer();
    assert_eq!(timer.tick_interval_ms, 250);
    assert_eq!(timer.poll_interval_ms, 500);
    assert_eq!(timer.channel_key, "timer-state");

    core.shutdown().await;
}
