pub mod clock;
pub mod db;
pub mod error;
pub mod events;
pub mod settings;
pub mod surface;
pub mod sync;
pub mod timeline;
pub mod timer;
pub mod utils;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use clock::{Clock, SystemClock};
use db::{Database, SqliteSessionSink};
use events::EventBus;
use settings::SettingsStore;
use error::SurfaceError;
use surface::{CompanionRemote, CompanionView, SurfaceHost, SurfaceManager};
use sync::{ChannelOptions, SharedStateChannel, SharedStore, SqliteSharedStore};
use timer::{TimerEngine, TimerMirror};

/// Application root owning every core component. Constructed explicitly and
/// handed to the surfaces that need it; there are no module-level
/// singletons.
pub struct AppCore {
    pub db: Database,
    pub settings: SettingsStore,
    pub events: EventBus,
    pub engine: TimerEngine,
    pub surfaces: SurfaceManager,
}

impl AppCore {
    pub async fn start(data_dir: &Path, host: Arc<dyn SurfaceHost>) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let db = Database::new(data_dir.join("focuslink.sqlite3"))?;
        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let timer_settings = settings.timer();

        let events = EventBus::default();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store: Arc<dyn SharedStore> = Arc::new(SqliteSharedStore::new(db.clone()));

        let channel_options = ChannelOptions {
            poll_interval: Duration::from_millis(timer_settings.poll_interval_ms),
            push_enabled: true,
        };
        let channel = SharedStateChannel::open(
            store.clone(),
            timer_settings.channel_key.clone(),
            TimerMirror::default(),
            channel_options.clone(),
        );

        let sink = Arc::new(SqliteSessionSink::new(db.clone(), events.clone()));
        let engine = TimerEngine::new(
            clock.clone(),
            sink,
            events.clone(),
            channel,
            Duration::from_millis(timer_settings.tick_interval_ms),
        );
        engine.watch_control_signals().await;

        let surfaces = SurfaceManager::new(
            host,
            store,
            events.clone(),
            clock,
            timer_settings.channel_key,
            channel_options,
        );

        Ok(Self {
            db,
            settings,
            events,
            engine,
            surfaces,
        })
    }

    /// Open the companion surface with the configured geometry.
    pub async fn open_companion<F>(&self, view_factory: F) -> Result<(), SurfaceError>
    where
        F: FnOnce(CompanionRemote) -> Box<dyn CompanionView>,
    {
        self.surfaces
            .spawn(view_factory, &self.settings.surface())
            .await
    }

    /// Full session history clustered into display blocks for the calendar
    /// view, using the configured gap threshold.
    pub async fn merged_blocks(&self) -> Result<Vec<timeline::MergedBlock>> {
        let sessions = self.db.list_focus_sessions().await?;
        Ok(timeline::merge_sessions(
            &sessions,
            self.settings.timer().merge_gap_secs,
        ))
    }

    /// Per-day totals over the full session history, in local time.
    pub async fn day_buckets(&self) -> Result<Vec<timeline::DayBucket>> {
        let sessions = self.db.list_focus_sessions().await?;
        Ok(timeline::day_buckets_local(&sessions))
    }

    /// Tear down the companion surface and stop the engine loops.
    pub async fn shutdown(&self) {
        self.surfaces.teardown().await;
        self.engine.shutdown().await;
    }
}
