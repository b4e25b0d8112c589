//! Cross-context state synchronization.
//!
//! Independent execution contexts (the primary surface and the companion
//! surface) have no shared memory and no call path between them; they agree
//! on state only through a durable store both can reach. A
//! [`SharedStateChannel`] wraps one key of that store and keeps a local copy
//! reconciled against it over two paths: best-effort change notifications
//! (push, a latency optimization) and a fixed-interval poll (pull, the path
//! of record). Conflict resolution is last-write-wins by snapshot identity.

pub mod channel;
pub mod poller;
pub mod store;
pub mod subscriber;

pub use channel::{ChannelOptions, ChannelRecord, SharedStateChannel};
pub use store::{ChangeNote, MemoryStore, SharedStore, SqliteSharedStore};
