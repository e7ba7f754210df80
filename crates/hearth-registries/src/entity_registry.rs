//! Entity Registry
//!
//! Tracks registered entities with unique_id tracking, device linking, and a
//! device_id index that preserves insertion order. The condition engine's
//! introspection relies on that order being stable.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur in the entity registry
#[derive(Debug, Error, Clone)]
pub enum EntityRegistryError {
    /// Entity was not found
    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// A registered entity entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEntry {
    /// Internal registry ID
    pub id: String,
    /// Full entity ID (domain.object_id)
    pub entity_id: String,
    /// Platform-specific unique identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    /// Parent device ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Component/platform that provides this entity
    pub platform: String,
    /// Device class (e.g., "battery", "motion")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
}

impl EntityEntry {
    /// Get the domain from entity_id
    pub fn domain(&self) -> &str {
        self.entity_id.split('.').next().unwrap_or(&self.entity_id)
    }
}

/// Entity registry with in-memory indexes
///
/// Lookups by entity_id and unique_id are O(1); `entries_for_device` returns
/// entities in the order they were registered.
pub struct EntityRegistry {
    /// Primary index: entity_id -> entry, insertion order preserved
    by_entity_id: RwLock<IndexMap<String, Arc<EntityEntry>>>,
    /// Index: unique_id -> entity_id
    by_unique_id: DashMap<String, String>,
    /// Index: device_id -> entity_ids in registration order
    by_device_id: DashMap<String, Vec<String>>,
}

impl EntityRegistry {
    /// Create a new, empty entity registry
    pub fn new() -> Self {
        Self {
            by_entity_id: RwLock::new(IndexMap::new()),
            by_unique_id: DashMap::new(),
            by_device_id: DashMap::new(),
        }
    }

    /// Get an existing entity by unique_id, or register a new one
    pub fn get_or_create(
        &self,
        platform: impl Into<String>,
        entity_id: impl Into<String>,
        unique_id: Option<String>,
        device_id: Option<String>,
        device_class: Option<String>,
    ) -> Arc<EntityEntry> {
        let entity_id = entity_id.into();

        if let Some(ref unique_id) = unique_id {
            if let Some(existing_id) = self.by_unique_id.get(unique_id) {
                if let Some(entry) = self.get(existing_id.value()) {
                    return entry;
                }
            }
        }

        let entry = Arc::new(EntityEntry {
            id: ulid::Ulid::new().to_string().to_lowercase(),
            entity_id: entity_id.clone(),
            unique_id,
            device_id,
            platform: platform.into(),
            device_class,
        });

        debug!(entity_id = %entity_id, "Registering entity");
        self.index_entry(entry.clone());

        entry
    }

    fn index_entry(&self, entry: Arc<EntityEntry>) {
        let entity_id = entry.entity_id.clone();

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .insert(unique_id.clone(), entity_id.clone());
        }

        if let Some(ref device_id) = entry.device_id {
            let mut ids = self.by_device_id.entry(device_id.clone()).or_default();
            if !ids.contains(&entity_id) {
                ids.push(entity_id.clone());
            }
        }

        if let Ok(mut idx) = self.by_entity_id.write() {
            idx.insert(entity_id, entry);
        }
    }

    /// Get an entity by its entity_id
    pub fn get(&self, entity_id: &str) -> Option<Arc<EntityEntry>> {
        self.by_entity_id
            .read()
            .ok()
            .and_then(|m| m.get(entity_id).cloned())
    }

    /// Get all entities belonging to a device, in registration order
    pub fn entries_for_device(&self, device_id: &str) -> Vec<Arc<EntityEntry>> {
        let Some(ids) = self.by_device_id.get(device_id) else {
            return Vec::new();
        };
        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Update an entity in place
    pub fn update(
        &self,
        entity_id: &str,
        f: impl FnOnce(&mut EntityEntry),
    ) -> Result<Arc<EntityEntry>, EntityRegistryError> {
        let entry = self
            .get(entity_id)
            .ok_or_else(|| EntityRegistryError::NotFound(entity_id.to_string()))?;

        let mut updated = (*entry).clone();
        f(&mut updated);
        let updated = Arc::new(updated);

        // Device links may have moved; rebuild the affected index entries.
        if entry.device_id != updated.device_id {
            if let Some(ref old_device) = entry.device_id {
                if let Some(mut ids) = self.by_device_id.get_mut(old_device) {
                    ids.retain(|id| id != entity_id);
                }
            }
        }
        self.index_entry(updated.clone());

        Ok(updated)
    }

    /// Remove an entity from the registry
    pub fn remove(&self, entity_id: &str) -> Option<Arc<EntityEntry>> {
        let entry = self
            .by_entity_id
            .write()
            .ok()
            .and_then(|mut m| m.shift_remove(entity_id))?;

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id.remove(unique_id);
        }
        if let Some(ref device_id) = entry.device_id {
            if let Some(mut ids) = self.by_device_id.get_mut(device_id) {
                ids.retain(|id| id != entity_id);
            }
        }

        Some(entry)
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.by_entity_id.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
