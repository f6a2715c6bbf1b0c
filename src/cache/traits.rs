//! Core traits and types for the caching system.

/// Trait for entities that can be cached.
///
/// Implementors provide the identity used to deduplicate entities within a
/// collection. Two entities with the same `cache_id` are the same entity.
pub trait Cacheable: Clone + Send + Sync {
  /// Unique identifier for this entity (e.g., field id, component id)
  fn cache_id(&self) -> &str;

  /// Entity type name used in log output (e.g., "custom_field")
  fn entity_type() -> &'static str;
}

/// Identifies one collection inside an [`EntityCache`](super::EntityCache).
pub trait CacheKey {
  /// Stable string form of the key.
  fn cache_key(&self) -> String;

  /// Human readable description for log output.
  fn description(&self) -> String {
    self.cache_key()
  }
}

impl CacheKey for str {
  fn cache_key(&self) -> String {
    self.to_string()
  }
}

impl CacheKey for String {
  fn cache_key(&self) -> String {
    self.clone()
  }
}

/// Result from a cache operation, including data and where it came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched from the server during this call
  Network,
  /// Served from a populated collection
  Cache,
}
