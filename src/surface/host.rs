use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::SurfaceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceConfig {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub always_on_top: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            title: "Focus".into(),
            width: 220.0,
            height: 84.0,
            always_on_top: true,
        }
    }
}

/// Platform capability for opening an independently rendered top-level
/// surface. Optional: a host without the capability returns
/// [`SurfaceError::Unsupported`] and the feature degrades, never crashes.
pub trait SurfaceHost: Send + Sync {
    fn open(&self, config: &SurfaceConfig) -> Result<Box<dyn SurfaceHandle>, SurfaceError>;
}

/// An open platform surface. `closed()` fires when the end user closes the
/// surface at the platform level; `close()` is the idempotent programmatic
/// teardown.
pub trait SurfaceHandle: Send {
    fn closed(&self) -> CancellationToken;

    fn close(&mut self);
}

/// In-process surfaces with no real windowing, for tests and headless
/// embeddings. `simulate_platform_close` stands in for the end user closing
/// the surface directly.
pub struct HeadlessHost {
    current: Mutex<Option<CancellationToken>>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    pub fn simulate_platform_close(&self) {
        if let Some(token) = self.current.lock().unwrap().take() {
            token.cancel();
        }
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceHost for HeadlessHost {
    fn open(&self, _config: &SurfaceConfig) -> Result<Box<dyn SurfaceHandle>, SurfaceError> {
        let token = CancellationToken::new();
        *self.current.lock().unwrap() = Some(token.clone());
        Ok(Box::new(HeadlessHandle { token }))
    }
}

struct HeadlessHandle {
    token: CancellationToken,
}

impl SurfaceHandle for HeadlessHandle {
    fn closed(&self) -> CancellationToken {
        self.token.clone()
    }

    fn close(&mut self) {
        self.token.cancel();
    }
}

/// Host for platforms without a secondary-surface capability.
pub struct UnsupportedHost;

impl SurfaceHost for UnsupportedHost {
    fn open(&self, _config: &SurfaceConfig) -> Result<Box<dyn SurfaceHandle>, SurfaceError> {
        Err(SurfaceError::Unsupported)
    }
}
