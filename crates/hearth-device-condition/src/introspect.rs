//! Capability introspection
//!
//! Read-only sibling of the evaluator: enumerates every valid condition for
//! a device, and reports which extra fields a condition accepts.

use serde::{Deserialize, Serialize};

use hearth_registries::EntityRegistry;

use crate::binary_sensor::{condition_types, DOMAIN};
use crate::condition::DeviceCondition;

/// Description of one configurable extra field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub optional: bool,
    pub r#type: String,
}

/// Extra configurable fields for a condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub extra_fields: Vec<FieldDescriptor>,
}

/// List every condition the given device supports
///
/// One entry per (binary_sensor entity on the device × supported type).
/// Entity order follows registry insertion order; type order follows the
/// registry table for the entity's device class. The `for` field is left
/// unset, to be filled in by the automation author.
pub fn conditions_for_device(device_id: &str, entities: &EntityRegistry) -> Vec<DeviceCondition> {
    let mut conditions = Vec::new();

    for entry in entities.entries_for_device(device_id) {
        if entry.domain() != DOMAIN {
            continue;
        }

        for def in condition_types(entry.device_class.as_deref()) {
            conditions.push(DeviceCondition {
                domain: DOMAIN.to_string(),
                device_id: device_id.to_string(),
                entity_id: entry.entity_id.clone(),
                r#type: def.condition_type.to_string(),
                for_period: None,
            });
        }
    }

    conditions
}

/// Extra fields accepted by a device condition
///
/// Every binary_sensor condition type accepts the same single optional
/// field: the `for` duration.
pub fn condition_capabilities(_condition: &DeviceCondition) -> Capabilities {
    Capabilities {
        extra_fields: vec![FieldDescriptor {
            name: "for".to_string(),
            optional: true,
            r#type: "positive_time_period_dict".to_string(),
        }],
    }
}
