//! Introspection over a device carrying one entity per device class.

use std::sync::Arc;

use hearth_device_condition::{
    condition_capabilities, condition_types, conditions_for_device, DeviceCondition,
    DeviceConditionEvaluator, DEVICE_CLASSES,
};
use hearth_registries::{DeviceConnection, DeviceRegistry, EntityRegistry};

fn populated_registries() -> (Arc<DeviceRegistry>, Arc<EntityRegistry>, String) {
    let devices = Arc::new(DeviceRegistry::new());
    let entities = Arc::new(EntityRegistry::new());

    let device = devices.get_or_create(
        &[],
        &[DeviceConnection::new("mac", "12:34:56:ab:cd:ef")],
        None,
    );

    for device_class in DEVICE_CLASSES {
        entities.get_or_create(
            "test",
            format!("binary_sensor.{device_class}"),
            Some(device_class.to_string()),
            Some(device.id.clone()),
            Some(device_class.to_string()),
        );
    }

    let device_id = device.id.clone();
    (devices, entities, device_id)
}

#[test]
fn test_get_conditions_for_every_device_class() {
    let (_devices, entities, device_id) = populated_registries();

    let expected: Vec<(String, String)> = DEVICE_CLASSES
        .iter()
        .flat_map(|device_class| {
            condition_types(Some(device_class)).iter().map(move |def| {
                (
                    format!("binary_sensor.{device_class}"),
                    def.condition_type.to_string(),
                )
            })
        })
        .collect();

    let conditions = conditions_for_device(&device_id, &entities);
    let actual: Vec<(String, String)> = conditions
        .iter()
        .map(|c| (c.entity_id.clone(), c.r#type.clone()))
        .collect();

    assert_eq!(actual, expected);
    assert!(conditions.iter().all(|c| c.device_id == device_id));
    assert!(conditions.iter().all(|c| c.domain == "binary_sensor"));
}

#[test]
fn test_capabilities_for_every_condition() {
    let (_devices, entities, device_id) = populated_registries();

    let expected = serde_json::json!({
        "extra_fields": [
            {"name": "for", "optional": true, "type": "positive_time_period_dict"}
        ]
    });

    for condition in conditions_for_device(&device_id, &entities) {
        let capabilities = condition_capabilities(&condition);
        assert_eq!(serde_json::to_value(&capabilities).unwrap(), expected);
    }
}

#[test]
fn test_every_listed_condition_validates() {
    use hearth_core::MockClock;
    use hearth_event_bus::EventBus;
    use hearth_state_machine::StateMachine;

    let (_devices, entities, device_id) = populated_registries();
    let states = Arc::new(StateMachine::new(
        Arc::new(EventBus::new()),
        Arc::new(MockClock::new()),
    ));
    let evaluator = DeviceConditionEvaluator::new(states, entities.clone());

    for condition in conditions_for_device(&device_id, &entities) {
        evaluator.validate(&condition).unwrap();
    }
}

#[test]
fn test_conditions_round_trip_through_json() {
    let (_devices, entities, device_id) = populated_registries();

    for condition in conditions_for_device(&device_id, &entities) {
        let json = serde_json::to_value(&condition).unwrap();
        let back: DeviceCondition = serde_json::from_value(json).unwrap();
        assert_eq!(back.entity_id, condition.entity_id);
        assert_eq!(back.r#type, condition.r#type);
    }
}
