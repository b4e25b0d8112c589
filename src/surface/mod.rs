mod companion;
mod host;
mod manager;

pub use companion::{CompanionRemote, CompanionView};
pub use host::{HeadlessHost, SurfaceConfig, SurfaceHandle, SurfaceHost, UnsupportedHost};
pub use manager::SurfaceManager;
