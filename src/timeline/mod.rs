mod buckets;
mod merge;

pub use buckets::{day_buckets_in, day_buckets_local, DayBucket};
pub use merge::{merge_sessions, MergedBlock, DEFAULT_MERGE_GAP_SECS};
