use thiserror::Error;

/// Companion-surface failures. `Unsupported` means the host provides no
/// secondary-surface capability; the feature is disabled, never a crash.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("secondary surfaces are not supported by this host")]
    Unsupported,

    #[error("surface host failed: {0}")]
    Host(String),
}

/// Shared-store faults inside the sync channel. Never propagated to channel
/// callers: reads fall back to the last-known value, writes are retried on
/// the next reconciliation tick.
#[derive(Debug, Error)]
pub enum ChannelIoError {
    #[error("shared store unavailable: {0}")]
    Store(String),

    #[error("snapshot codec failed: {0}")]
    Codec(#[from] serde_json::Error),
}
