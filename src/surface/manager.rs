use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::SurfaceError;
use crate::events::{AppEvent, EventBus};
use crate::sync::{ChannelOptions, SharedStateChannel, SharedStore};
use crate::timer::TimerMirror;

use super::companion::{CompanionRemote, CompanionView};
use super::host::{SurfaceConfig, SurfaceHandle, SurfaceHost};

struct OpenSurface {
    generation: u64,
    handle: Box<dyn SurfaceHandle>,
    loop_task: JoinHandle<()>,
    cancel: CancellationToken,
    channel: SharedStateChannel<TimerMirror>,
}

/// Lifecycle owner of the companion surface. At most one surface is open at
/// a time: a new spawn always replaces, never stacks. Teardown is idempotent
/// and a platform-level close reaches the same fully-released state, with no
/// poller left running against a closed surface.
#[derive(Clone)]
pub struct SurfaceManager {
    host: Arc<dyn SurfaceHost>,
    store: Arc<dyn SharedStore>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    channel_key: String,
    channel_options: ChannelOptions,
    slot: Arc<Mutex<Option<OpenSurface>>>,
    /// Distinguishes the current surface from a stale loop's release
    /// attempt after a replacement spawn.
    generation: Arc<AtomicU64>,
}

impl SurfaceManager {
    pub fn new(
        host: Arc<dyn SurfaceHost>,
        store: Arc<dyn SharedStore>,
        events: EventBus,
        clock: Arc<dyn Clock>,
        channel_key: String,
        channel_options: ChannelOptions,
    ) -> Self {
        Self {
            host,
            store,
            events,
            clock,
            channel_key,
            channel_options,
            slot: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Open the companion surface and mount the view built by
    /// `view_factory`. Fails with [`SurfaceError::Unsupported`] when the
    /// host has no secondary-surface capability; any surface still open from
    /// a prior spawn is torn down first.
    pub async fn spawn<F>(&self, view_factory: F, config: &SurfaceConfig) -> Result<(), SurfaceError>
    where
        F: FnOnce(CompanionRemote) -> Box<dyn CompanionView>,
    {
        self.teardown().await;

        let mut slot = self.slot.lock().await;
        let handle = self.host.open(config)?;
        let closed = handle.closed();

        let channel = SharedStateChannel::open(
            self.store.clone(),
            self.channel_key.clone(),
            TimerMirror::default(),
            self.channel_options.clone(),
        );
        let remote = CompanionRemote::new(channel.clone(), self.clock.clone());
        let view = view_factory(remote);

        let cancel = CancellationToken::new();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let loop_task = tokio::spawn(companion_loop(
            view,
            channel.clone(),
            cancel.clone(),
            closed,
            self.slot.clone(),
            self.events.clone(),
            generation,
        ));

        *slot = Some(OpenSurface {
            generation,
            handle,
            loop_task,
            cancel,
            channel,
        });
        self.events.emit(AppEvent::SurfaceOpened);
        Ok(())
    }

    /// Close the surface if one is open: cancel the companion loop, close
    /// the platform handle, unmount the view, release the channel. Safe to
    /// call when nothing is open.
    pub async fn teardown(&self) {
        let open = self.slot.lock().await.take();
        let Some(mut open) = open else { return };

        open.cancel.cancel();
        open.handle.close();
        let _ = open.loop_task.await;
        open.channel.close();
        self.events.emit(AppEvent::SurfaceClosed);
    }

    pub async fn is_open(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

/// Renders reconciled mirror updates into the view until the surface goes
/// away, then unmounts. On a platform-level close this loop is the one that
/// releases the manager slot, guarded by generation so a stale loop never
/// releases a replacement surface.
async fn companion_loop(
    mut view: Box<dyn CompanionView>,
    channel: SharedStateChannel<TimerMirror>,
    cancel: CancellationToken,
    closed: CancellationToken,
    slot: Arc<Mutex<Option<OpenSurface>>>,
    events: EventBus,
    generation: u64,
) {
    let mut rx = channel.subscribe();
    let initial = channel.read().await;
    view.render(&initial);

    let platform_closed = loop {
        tokio::select! {
            _ = cancel.cancelled() => break false,
            _ = closed.cancelled() => break true,
            changed = rx.changed() => {
                if changed.is_err() {
                    break false;
                }
                let mirror = rx.borrow_and_update().clone();
                view.render(&mirror);
            }
        }
    };

    view.unmount();

    if platform_closed {
        let mut guard = slot.lock().await;
        let is_current = guard
            .as_ref()
            .map(|open| open.generation == generation)
            .unwrap_or(false);
        if is_current {
            if let Some(mut open) = guard.take() {
                open.handle.close();
                open.channel.close();
                events.emit(AppEvent::SurfaceClosed);
            }
        }
    }
}
