//! Generic in-memory caching of keyed entity collections.
//!
//! This module is Jira-agnostic:
//! - Entities are grouped into collections addressed by a [`CacheKey`]
//! - A collection is either populated (fetched once) or absent
//! - Populated collections are never re-fetched, only mutated by `add`/`remove`
//! - Concurrent misses on the same key are coalesced into a single fetch

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{dedup_first_wins, CacheError, EntityCache};
pub use traits::{CacheKey, CacheResult, CacheSource, Cacheable};
