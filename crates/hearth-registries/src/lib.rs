//! Device and entity registries for hearth
//!
//! The registries track which devices exist and which entities belong to
//! them. The condition engine treats them as a read-only index: device_id
//! resolves to its entities (insertion order preserved), and an entity
//! resolves to its device class.

pub mod device_registry;
pub mod entity_registry;

pub use device_registry::{DeviceConnection, DeviceEntry, DeviceIdentifier, DeviceRegistry};
pub use entity_registry::{EntityEntry, EntityRegistry, EntityRegistryError};

use std::sync::Arc;

/// Both registries bundled together
pub struct Registries {
    pub devices: DeviceRegistry,
    pub entities: EntityRegistry,
}

impl Registries {
    /// Create new, empty registries
    pub fn new() -> Self {
        Self {
            devices: DeviceRegistry::new(),
            entities: EntityRegistry::new(),
        }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for Registries
pub type SharedRegistries = Arc<Registries>;
