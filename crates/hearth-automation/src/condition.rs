//! Condition types
//!
//! Conditions are state-based tests evaluated at trigger time. All of an
//! automation's conditions must hold for its actions to execute.

use serde::{Deserialize, Serialize};

use hearth_device_condition::DeviceCondition;

/// Condition definition
///
/// Single-variant by design: multi-entity boolean composition is out of
/// scope for this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum Condition {
    /// Check a device condition
    Device(DeviceCondition),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_device_condition_deserialize() {
        let json = r#"{
            "condition": "device",
            "domain": "binary_sensor",
            "device_id": "",
            "entity_id": "binary_sensor.battery",
            "type": "is_bat_low"
        }"#;

        let condition: Condition = serde_json::from_str(json).unwrap();
        let Condition::Device(c) = condition;
        assert_eq!(c.entity_id, "binary_sensor.battery");
        assert_eq!(c.r#type, "is_bat_low");
        assert!(c.for_period.is_none());
    }

    #[test]
    fn test_device_condition_with_for() {
        let json = r#"{
            "condition": "device",
            "domain": "binary_sensor",
            "device_id": "",
            "entity_id": "binary_sensor.battery",
            "type": "is_not_bat_low",
            "for": {"seconds": 5}
        }"#;

        let Condition::Device(c) = serde_json::from_str(json).unwrap();
        assert_eq!(c.for_period, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_serialize_carries_tag() {
        let condition: Condition = serde_json::from_str(
            r#"{"condition": "device", "domain": "binary_sensor", "type": "is_on"}"#,
        )
        .unwrap();

        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["condition"], "device");
    }
}
