//! In-memory storage of keyed entity collections.

use std::collections::HashMap;

use indexmap::IndexMap;
use parking_lot::RwLock;
use thiserror::Error;

use super::traits::{CacheKey, Cacheable};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
  /// `populate` was called for a key that has already been populated.
  #[error("Cache collection '{key}' of {entity_type} is already populated")]
  AlreadyPopulated {
    key: String,
    entity_type: &'static str,
  },
}

/// Collapse entities sharing an id, keeping the first occurrence in
/// iteration order.
pub fn dedup_first_wins<T: Cacheable>(entities: impl IntoIterator<Item = T>) -> Vec<T> {
  let mut collection = EntityCollection::empty();
  for entity in entities {
    collection.insert_first_wins(entity);
  }
  collection.entities.into_values().collect()
}

/// One keyed collection of entities, deduplicated by id.
#[derive(Debug, Clone)]
struct EntityCollection<T> {
  entities: IndexMap<String, T>,
  /// Set once the collection has been filled from the server.
  populated: bool,
}

impl<T: Cacheable> EntityCollection<T> {
  fn empty() -> Self {
    Self {
      entities: IndexMap::new(),
      populated: false,
    }
  }

  /// Insert unless an entity with the same id is already present.
  fn insert_first_wins(&mut self, entity: T) -> bool {
    let id = entity.cache_id().to_string();
    if self.entities.contains_key(&id) {
      return false;
    }
    self.entities.insert(id, entity);
    true
  }
}

/// Process-local set of keyed entity collections.
///
/// A collection is either *absent* (never populated) or *populated*. That
/// state, not emptiness, decides whether a lookup is a hit. `add` and
/// `remove` may touch a collection in any state; a collection created by
/// `add` alone is still absent for `get`.
pub struct EntityCache<T: Cacheable> {
  collections: RwLock<HashMap<String, EntityCollection<T>>>,
}

impl<T: Cacheable> Default for EntityCache<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Cacheable> EntityCache<T> {
  pub fn new() -> Self {
    Self {
      collections: RwLock::new(HashMap::new()),
    }
  }

  /// Get the entities of a populated collection, or `None` if it was never
  /// populated.
  pub fn get<K: CacheKey + ?Sized>(&self, key: &K) -> Option<Vec<T>> {
    let collections = self.collections.read();
    collections
      .get(&key.cache_key())
      .filter(|c| c.populated)
      .map(|c| c.entities.values().cloned().collect())
  }

  pub fn is_populated<K: CacheKey + ?Sized>(&self, key: &K) -> bool {
    self
      .collections
      .read()
      .get(&key.cache_key())
      .is_some_and(|c| c.populated)
  }

  /// Populate a collection exactly once.
  ///
  /// Duplicate ids in `entities` collapse to the first occurrence. Entities
  /// previously `add`ed to the still-absent collection are kept after the
  /// fetched ones.
  pub fn populate<K: CacheKey + ?Sized>(
    &self,
    key: &K,
    entities: impl IntoIterator<Item = T>,
  ) -> Result<(), CacheError> {
    let key = key.cache_key();
    let mut collections = self.collections.write();

    let previous = match collections.remove(&key) {
      Some(existing) if existing.populated => {
        collections.insert(key.clone(), existing);
        return Err(CacheError::AlreadyPopulated {
          key,
          entity_type: T::entity_type(),
        });
      }
      Some(existing) => existing.entities,
      None => IndexMap::new(),
    };

    let mut collection = EntityCollection::empty();
    for entity in entities {
      collection.insert_first_wins(entity);
    }
    for (_, entity) in previous {
      collection.insert_first_wins(entity);
    }
    collection.populated = true;

    collections.insert(key, collection);
    Ok(())
  }

  /// Add a single entity, replacing any entity with the same id.
  pub fn add<K: CacheKey + ?Sized>(&self, key: &K, entity: T) {
    let mut collections = self.collections.write();
    let collection = collections
      .entry(key.cache_key())
      .or_insert_with(EntityCollection::empty);
    collection
      .entities
      .insert(entity.cache_id().to_string(), entity);
  }

  /// Remove an entity by id from one collection.
  pub fn remove<K: CacheKey + ?Sized>(&self, key: &K, id: &str) -> Option<T> {
    let mut collections = self.collections.write();
    collections
      .get_mut(&key.cache_key())
      .and_then(|c| c.entities.shift_remove(id))
  }

  /// Remove an entity by id from every collection. Returns how many
  /// collections contained it.
  pub fn remove_everywhere(&self, id: &str) -> usize {
    let mut collections = self.collections.write();
    collections
      .values_mut()
      .filter_map(|c| c.entities.shift_remove(id))
      .count()
  }

  /// Keys of all populated collections.
  pub fn keys(&self) -> Vec<String> {
    self
      .collections
      .read()
      .iter()
      .filter(|(_, c)| c.populated)
      .map(|(k, _)| k.clone())
      .collect()
  }

  /// Drop every collection; all keys become absent again.
  pub fn clear(&self) {
    self.collections.write().clear();
  }
}
