//! Device Registry
//!
//! Tracks registered devices with identifiers and connections, indexed for
//! fast lookup by id and by identifier/connection key.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A device identifier (domain, id) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentifier(pub String, pub String);

impl DeviceIdentifier {
    pub fn new(domain: impl Into<String>, id: impl Into<String>) -> Self {
        Self(domain.into(), id.into())
    }

    /// Create a key for indexing
    pub fn key(&self) -> String {
        format!("{}:{}", self.0, self.1)
    }
}

/// A device connection (type, id) pair, e.g. ("mac", "12:34:56:ab:cd:ef")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceConnection(pub String, pub String);

impl DeviceConnection {
    pub fn new(conn_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self(conn_type.into(), id.into())
    }

    /// Create a key for indexing
    pub fn key(&self) -> String {
        format!("{}:{}", self.0, self.1)
    }
}

/// A registered device entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Internal device ID
    pub id: String,
    /// Identifiers (domain, id) that match this device
    pub identifiers: Vec<DeviceIdentifier>,
    /// Connections (type, id) that match this device
    pub connections: Vec<DeviceConnection>,
    /// Device name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Device registry with in-memory indexes
///
/// Lookup by id is O(1); `get_or_create` matches on any shared identifier or
/// connection key, mirroring how integrations claim devices.
pub struct DeviceRegistry {
    /// Primary index: device id -> entry, insertion order preserved
    by_id: RwLock<IndexMap<String, Arc<DeviceEntry>>>,
    /// Index: identifier/connection key -> device id
    by_key: DashMap<String, String>,
}

impl DeviceRegistry {
    /// Create a new, empty device registry
    pub fn new() -> Self {
        Self {
            by_id: RwLock::new(IndexMap::new()),
            by_key: DashMap::new(),
        }
    }

    /// Get an existing device matching any identifier or connection, or
    /// create a new one.
    pub fn get_or_create(
        &self,
        identifiers: &[DeviceIdentifier],
        connections: &[DeviceConnection],
        name: Option<&str>,
    ) -> Arc<DeviceEntry> {
        let keys: Vec<String> = identifiers
            .iter()
            .map(DeviceIdentifier::key)
            .chain(connections.iter().map(DeviceConnection::key))
            .collect();

        for key in &keys {
            if let Some(device_id) = self.by_key.get(key) {
                if let Some(entry) = self.get(device_id.value()) {
                    return entry;
                }
            }
        }

        let entry = Arc::new(DeviceEntry {
            id: ulid::Ulid::new().to_string().to_lowercase(),
            identifiers: identifiers.to_vec(),
            connections: connections.to_vec(),
            name: name.map(String::from),
        });

        debug!(device_id = %entry.id, "Registering device");

        for key in keys {
            self.by_key.insert(key, entry.id.clone());
        }
        if let Ok(mut by_id) = self.by_id.write() {
            by_id.insert(entry.id.clone(), entry.clone());
        }

        entry
    }

    /// Get a device by its id
    pub fn get(&self, device_id: &str) -> Option<Arc<DeviceEntry>> {
        self.by_id
            .read()
            .ok()
            .and_then(|m| m.get(device_id).cloned())
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        self.by_id.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
