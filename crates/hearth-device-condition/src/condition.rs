//! Device condition specification
//!
//! The wire shape consumed from automation configs:
//!
//! ```json
//! { "condition": "device", "domain": "binary_sensor", "device_id": "...",
//!   "entity_id": "...", "type": "is_bat_low", "for": { "seconds": 5 } }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::duration::time_period;

/// Errors surfaced when validating a device condition
///
/// These are config-validation errors, fatal to the rule's setup. Once a
/// condition is accepted, evaluation never fails; runtime inconsistencies
/// degrade to "not met" instead.
#[derive(Debug, Clone, Error)]
pub enum DeviceConditionError {
    #[error("unknown condition type {condition_type:?} for device class {device_class:?}")]
    UnknownType {
        condition_type: String,
        device_class: Option<String>,
    },

    #[error("neither device_id nor entity_id resolves to a {0} entity")]
    EntityNotResolved(String),

    #[error("malformed duration: {0}")]
    MalformedDuration(String),
}

/// A device condition: a boolean predicate over one entity's current state
///
/// `entity_id` is the terminal identity used for state lookup when set;
/// otherwise `device_id` is resolved through the entity registry. Conditions
/// are stateless and re-evaluated fresh on every trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCondition {
    /// Integration domain (here always "binary_sensor")
    pub domain: String,

    /// Device the condition belongs to
    #[serde(default)]
    pub device_id: String,

    /// Entity to read state from; resolved from device_id when empty
    #[serde(default)]
    pub entity_id: String,

    /// Condition type (e.g. "is_bat_low")
    pub r#type: String,

    /// Minimum continuous time the state must have held
    #[serde(
        rename = "for",
        default,
        skip_serializing_if = "Option::is_none",
        with = "time_period"
    )]
    pub for_period: Option<Duration>,
}

impl DeviceCondition {
    /// Parse a condition from its wire shape
    ///
    /// A bad `for` field (negative or unparseable) is a
    /// [`DeviceConditionError::MalformedDuration`], surfaced here at config
    /// time rather than at evaluation time.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DeviceConditionError> {
        serde_json::from_value(value)
            .map_err(|e| DeviceConditionError::MalformedDuration(e.to_string()))
    }
}
