//! Shared, load-once GPU resources keyed by source path(s).

mod cache;

pub use cache::{CacheError, CacheKey, LoadError, ResourceCache};
