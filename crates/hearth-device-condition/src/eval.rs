//! Device condition evaluation
//!
//! The evaluator composes the condition type registry, the state machine,
//! and the duration tracker into a single boolean answer. It holds read-only
//! handles and no mutable state, so concurrent in-flight evaluations need no
//! locking.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::trace;

use hearth_registries::EntityRegistry;
use hearth_state_machine::StateMachine;

use crate::binary_sensor::{required_state, DOMAIN};
use crate::condition::{DeviceCondition, DeviceConditionError};
use crate::duration::state_held_for;

/// Evaluates device conditions against the current state snapshot
///
/// Registry and state handles are injected at construction; every `now`
/// comes from the caller, so evaluation is a pure function of its inputs
/// plus the state snapshot at call time.
pub struct DeviceConditionEvaluator {
    states: Arc<StateMachine>,
    entities: Arc<EntityRegistry>,
}

impl DeviceConditionEvaluator {
    pub fn new(states: Arc<StateMachine>, entities: Arc<EntityRegistry>) -> Self {
        Self { states, entities }
    }

    /// Resolve the entity a condition reads state from
    ///
    /// `entity_id` wins when set; otherwise the first binary_sensor entity
    /// on `device_id`. When a device carries several entities of the domain,
    /// each condition names its own entity_id at authoring time.
    fn resolve_entity_id(&self, condition: &DeviceCondition) -> Option<String> {
        if !condition.entity_id.is_empty() {
            return Some(condition.entity_id.clone());
        }
        if condition.device_id.is_empty() {
            return None;
        }
        self.entities
            .entries_for_device(&condition.device_id)
            .into_iter()
            .find(|e| e.domain() == DOMAIN)
            .map(|e| e.entity_id.clone())
    }

    /// Device class for an entity: registry entry first, then the state
    /// attribute, then classless.
    fn device_class(&self, entity_id: &str) -> Option<String> {
        if let Some(entry) = self.entities.get(entity_id) {
            if entry.device_class.is_some() {
                return entry.device_class.clone();
            }
        }
        self.states
            .get(entity_id)
            .and_then(|s| s.attribute::<String>("device_class"))
    }

    /// Validate a condition at config time
    ///
    /// Fails when the entity cannot be resolved or when the type is not
    /// registered for the entity's device class. A condition that passes
    /// here never fails at evaluation time.
    pub fn validate(&self, condition: &DeviceCondition) -> Result<(), DeviceConditionError> {
        let entity_id = self
            .resolve_entity_id(condition)
            .ok_or_else(|| DeviceConditionError::EntityNotResolved(DOMAIN.to_string()))?;

        let device_class = self.device_class(&entity_id);
        required_state(device_class.as_deref(), &condition.r#type).ok_or_else(|| {
            DeviceConditionError::UnknownType {
                condition_type: condition.r#type.clone(),
                device_class,
            }
        })?;

        Ok(())
    }

    /// Evaluate a condition at the given instant
    ///
    /// A missing or unavailable state degrades to `Ok(false)`; errors are
    /// only returned for conditions that would already have failed
    /// validation.
    pub fn evaluate(
        &self,
        condition: &DeviceCondition,
        now: DateTime<Utc>,
    ) -> Result<bool, DeviceConditionError> {
        let entity_id = self
            .resolve_entity_id(condition)
            .ok_or_else(|| DeviceConditionError::EntityNotResolved(DOMAIN.to_string()))?;

        let device_class = self.device_class(&entity_id);
        let required = required_state(device_class.as_deref(), &condition.r#type).ok_or_else(
            || DeviceConditionError::UnknownType {
                condition_type: condition.r#type.clone(),
                device_class,
            },
        )?;

        let Some(state) = self.states.get(&entity_id) else {
            trace!(entity_id = %entity_id, "No state for entity, condition not met");
            return Ok(false);
        };

        if state.state != required.as_str() {
            return Ok(false);
        }

        let result = match condition.for_period {
            None => true,
            Some(required_span) => state_held_for(state.last_changed, now, required_span),
        };

        trace!(
            entity_id = %entity_id,
            condition_type = %condition.r#type,
            result,
            "Evaluated device condition"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::{Clock, Context, EntityId, MockClock};
    use hearth_event_bus::EventBus;
    use std::collections::HashMap;
    use std::time::Duration;

    struct Fixture {
        clock: MockClock,
        states: Arc<StateMachine>,
        entities: Arc<EntityRegistry>,
        evaluator: DeviceConditionEvaluator,
    }

    fn fixture() -> Fixture {
        let clock = MockClock::new();
        let states = Arc::new(StateMachine::new(
            Arc::new(EventBus::new()),
            Arc::new(clock.clone()),
        ));
        let entities = Arc::new(EntityRegistry::new());
        let evaluator = DeviceConditionEvaluator::new(states.clone(), entities.clone());
        Fixture {
            clock,
            states,
            entities,
            evaluator,
        }
    }

    fn set_state(f: &Fixture, value: &str) {
        f.states.set(
            EntityId::new("binary_sensor", "battery").unwrap(),
            value,
            HashMap::new(),
            Context::new(),
        );
    }

    fn battery_condition(r#type: &str, for_period: Option<Duration>) -> DeviceCondition {
        DeviceCondition {
            domain: DOMAIN.to_string(),
            device_id: String::new(),
            entity_id: "binary_sensor.battery".to_string(),
            r#type: r#type.to_string(),
            for_period,
        }
    }

    fn register_battery(f: &Fixture, device_id: &str) {
        f.entities.get_or_create(
            "test",
            "binary_sensor.battery",
            Some("battery1".to_string()),
            Some(device_id.to_string()),
            Some("battery".to_string()),
        );
    }

    #[test]
    fn test_wrong_state_is_false_regardless_of_duration() {
        let f = fixture();
        register_battery(&f, "device1");
        set_state(&f, "on");

        let condition = battery_condition("is_not_bat_low", Some(Duration::from_secs(5)));
        f.clock.advance_seconds(3600);
        assert!(!f.evaluator.evaluate(&condition, f.clock.now()).unwrap());
    }

    #[test]
    fn test_matching_state_without_for_is_true() {
        let f = fixture();
        register_battery(&f, "device1");
        set_state(&f, "on");

        let condition = battery_condition("is_bat_low", None);
        assert!(f.evaluator.evaluate(&condition, f.clock.now()).unwrap());
    }

    #[test]
    fn test_flip_and_flip_back_resets_for_clock() {
        let f = fixture();
        register_battery(&f, "device1");

        let t0 = f.clock.now();
        set_state(&f, "off");
        let condition = battery_condition("is_not_bat_low", Some(Duration::from_secs(5)));

        assert!(!f
            .evaluator
            .evaluate(&condition, t0 + chrono::Duration::seconds(1))
            .unwrap());

        f.clock.set(t0 + chrono::Duration::seconds(3));
        set_state(&f, "on");
        f.clock.set(t0 + chrono::Duration::seconds(12));
        set_state(&f, "off");

        // Only 3s since the last transition to "off"
        assert!(!f
            .evaluator
            .evaluate(&condition, t0 + chrono::Duration::seconds(15))
            .unwrap());
        assert!(f
            .evaluator
            .evaluate(&condition, t0 + chrono::Duration::seconds(18))
            .unwrap());
    }

    #[test]
    fn test_missing_state_degrades_to_false() {
        let f = fixture();
        register_battery(&f, "device1");

        let condition = battery_condition("is_bat_low", None);
        assert!(!f.evaluator.evaluate(&condition, f.clock.now()).unwrap());
    }

    #[test]
    fn test_resolves_entity_through_device_id() {
        let f = fixture();
        register_battery(&f, "device1");
        set_state(&f, "on");

        let condition = DeviceCondition {
            domain: DOMAIN.to_string(),
            device_id: "device1".to_string(),
            entity_id: String::new(),
            r#type: "is_bat_low".to_string(),
            for_period: None,
        };
        assert!(f.evaluator.evaluate(&condition, f.clock.now()).unwrap());
    }

    #[test]
    fn test_device_class_falls_back_to_state_attribute() {
        let f = fixture();
        // Not in the registry; device_class comes from the state attributes
        f.states.set(
            EntityId::new("binary_sensor", "battery").unwrap(),
            "on",
            HashMap::from([("device_class".to_string(), serde_json::json!("battery"))]),
            Context::new(),
        );

        let condition = battery_condition("is_bat_low", None);
        f.evaluator.validate(&condition).unwrap();
        assert!(f.evaluator.evaluate(&condition, f.clock.now()).unwrap());
    }

    #[test]
    fn test_validate_unknown_type() {
        let f = fixture();
        register_battery(&f, "device1");

        let condition = battery_condition("is_open", None);
        let err = f.evaluator.validate(&condition).unwrap_err();
        assert!(matches!(
            err,
            DeviceConditionError::UnknownType { ref condition_type, .. }
                if condition_type == "is_open"
        ));
    }

    #[test]
    fn test_validate_unresolved_entity() {
        let f = fixture();

        let condition = DeviceCondition {
            domain: DOMAIN.to_string(),
            device_id: "device_unknown".to_string(),
            entity_id: String::new(),
            r#type: "is_bat_low".to_string(),
            for_period: None,
        };
        assert!(matches!(
            f.evaluator.validate(&condition),
            Err(DeviceConditionError::EntityNotResolved(_))
        ));
    }
}
