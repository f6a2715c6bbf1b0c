//! Cache layer that orchestrates caching logic with network fetching.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::storage::{CacheError, EntityCache};
use super::traits::{CacheKey, CacheResult, Cacheable};

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// Cache layer that manages cache-first fetching.
///
/// This layer sits between a service and the request executor. A lookup
/// for a populated key never reaches the network. Misses on the same key are
/// serialized through a per-key lock so only one caller fetches; misses on
/// different keys run independently.
pub struct CacheLayer<T: Cacheable> {
  storage: Arc<EntityCache<T>>,
  in_flight: Arc<Mutex<HashMap<String, KeyLock>>>,
}

impl<T: Cacheable> CacheLayer<T> {
  pub fn new() -> Self {
    Self {
      storage: Arc::new(EntityCache::new()),
      in_flight: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Direct access to the underlying collections for targeted mutation.
  pub fn storage(&self) -> &EntityCache<T> {
    &self.storage
  }

  /// Fetch a collection with cache-first strategy.
  ///
  /// 1. Populated key - return the cached entities
  /// 2. Otherwise wait for the key's lock and check again
  /// 3. Still absent - run `fetcher`, populate, return the stored view
  ///
  /// Fetch errors propagate unchanged and leave the key absent.
  pub async fn fetch_list<K, F, Fut, E>(
    &self,
    key: &K,
    fetcher: F,
  ) -> Result<CacheResult<Vec<T>>, E>
  where
    K: CacheKey + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
    E: From<CacheError>,
  {
    if let Some(cached) = self.storage.get(key) {
      debug!(key = %key.description(), entity = T::entity_type(), "cache hit");
      return Ok(CacheResult::from_cache(cached));
    }

    let handle = KeyLockHandle::acquire(&self.in_flight, key.cache_key());
    let _guard = handle.lock.lock().await;
    self.fetch_locked(key, fetcher).await
  }

  async fn fetch_locked<K, F, Fut, E>(&self, key: &K, fetcher: F) -> Result<CacheResult<Vec<T>>, E>
  where
    K: CacheKey + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
    E: From<CacheError>,
  {
    // Another caller may have populated the key while we waited
    if let Some(cached) = self.storage.get(key) {
      debug!(key = %key.description(), entity = T::entity_type(), "cache hit after wait");
      return Ok(CacheResult::from_cache(cached));
    }

    debug!(key = %key.description(), entity = T::entity_type(), "cache miss, fetching");
    let data = fetcher().await?;
    self.storage.populate(key, data)?;

    Ok(CacheResult::from_network(
      self.storage.get(key).unwrap_or_default(),
    ))
  }

}

/// A caller's share of a key's lock. Dropping it, whether the fetch finished
/// or the future was cancelled, forgets the lock once no other caller holds
/// it.
struct KeyLockHandle<'a> {
  in_flight: &'a Mutex<HashMap<String, KeyLock>>,
  key: String,
  lock: KeyLock,
}

impl<'a> KeyLockHandle<'a> {
  fn acquire(in_flight: &'a Mutex<HashMap<String, KeyLock>>, key: String) -> Self {
    let lock = Arc::clone(in_flight.lock().entry(key.clone()).or_default());
    Self {
      in_flight,
      key,
      lock,
    }
  }
}

impl Drop for KeyLockHandle<'_> {
  fn drop(&mut self) {
    let mut in_flight = self.in_flight.lock();
    // Give up our share under the map lock so concurrent drops see exact counts
    drop(std::mem::take(&mut self.lock));
    if in_flight
      .get(&self.key)
      .is_some_and(|lock| Arc::strong_count(lock) == 1)
    {
      in_flight.remove(&self.key);
    }
  }
}

impl<T: Cacheable> Default for CacheLayer<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Cacheable> Clone for CacheLayer<T> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      in_flight: Arc::clone(&self.in_flight),
    }
  }
}
