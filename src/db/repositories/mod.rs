pub mod sessions;
pub mod shared_state;
