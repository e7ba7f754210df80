//! State machine with domain indexing for hearth
//!
//! The StateMachine tracks the current state of all entities. It maintains a
//! domain index for efficient queries and fires state_changed events on the
//! event bus. All timestamps come from the injected clock, so `last_changed`
//! follows mocked time in tests.

use dashmap::DashMap;
use hearth_core::events::StateChangedData;
use hearth_core::{Clock, Context, EntityId, State};
use hearth_event_bus::EventBus;
use std::sync::Arc;
use tracing::{debug, trace};

/// The state machine tracks all entity states
///
/// Responsibilities:
/// - Store the current state of all entities
/// - Stamp `last_changed` only on value transitions, from the injected clock
/// - Fire state_changed events when states change
/// - Provide thread-safe concurrent access to states
pub struct StateMachine {
    /// All entity states keyed by entity_id string
    states: DashMap<String, State>,
    /// Index of entity_ids by domain
    domain_index: DashMap<String, Vec<String>>,
    /// Event bus for firing state change events
    event_bus: Arc<EventBus>,
    /// Time source for state timestamps
    clock: Arc<dyn Clock>,
}

impl StateMachine {
    /// Create a new state machine with the given event bus and clock
    pub fn new(event_bus: Arc<EventBus>, clock: Arc<dyn Clock>) -> Self {
        Self {
            states: DashMap::new(),
            domain_index: DashMap::new(),
            event_bus,
            clock,
        }
    }

    /// Set the state of an entity
    ///
    /// If the entity already has a state, `last_changed` is only updated if
    /// the state value actually changed. Fires a state_changed event with
    /// the old and new state.
    pub fn set(
        &self,
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: std::collections::HashMap<String, serde_json::Value>,
        context: Context,
    ) -> State {
        let entity_id_str = entity_id.to_string();
        let domain = entity_id.domain().to_string();
        let now = self.clock.now();

        let old_state = self.states.get(&entity_id_str).map(|s| s.clone());

        let new_state = match &old_state {
            Some(existing) => existing.with_update(state, attributes, context.clone(), now),
            None => State::new(entity_id.clone(), state, attributes, context.clone(), now),
        };

        debug!(
            entity_id = %entity_id_str,
            state = %new_state.state,
            changed = old_state.as_ref().map(|s| s.state != new_state.state).unwrap_or(true),
            "Setting entity state"
        );

        self.states.insert(entity_id_str.clone(), new_state.clone());

        if old_state.is_none() {
            self.domain_index
                .entry(domain)
                .or_default()
                .push(entity_id_str);
        }

        let event_data = StateChangedData {
            entity_id,
            old_state,
            new_state: Some(new_state.clone()),
        };
        self.event_bus.fire_typed(event_data, context);

        new_state
    }

    /// Get the current state of an entity
    pub fn get(&self, entity_id: &str) -> Option<State> {
        self.states.get(entity_id).map(|s| s.clone())
    }

    /// Get the state value as a string, or None if entity doesn't exist
    pub fn get_state(&self, entity_id: &str) -> Option<String> {
        self.states.get(entity_id).map(|s| s.state.clone())
    }

    /// Check if an entity is in a specific state
    pub fn is_state(&self, entity_id: &str, state: &str) -> bool {
        self.get_state(entity_id).as_deref() == Some(state)
    }

    /// Get all entity IDs for a domain
    pub fn entity_ids(&self, domain: &str) -> Vec<String> {
        self.domain_index
            .get(domain)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Remove an entity's state
    ///
    /// Fires a state_changed event with the old state and None for new_state.
    pub fn remove(&self, entity_id: &EntityId, context: Context) -> Option<State> {
        let entity_id_str = entity_id.to_string();
        let domain = entity_id.domain();

        let old_state = self.states.remove(&entity_id_str).map(|(_, s)| s);

        if let Some(ref state) = old_state {
            trace!(entity_id = %entity_id_str, "Removing entity state");

            if let Some(mut ids) = self.domain_index.get_mut(domain) {
                ids.retain(|id| id != &entity_id_str);
            }

            let event_data = StateChangedData {
                entity_id: entity_id.clone(),
                old_state: Some(state.clone()),
                new_state: None,
            };
            self.event_bus.fire_typed(event_data, context);
        }

        old_state
    }

    /// Get the total number of entities
    pub fn entity_count(&self) -> usize {
        self.states.len()
    }
}

/// Thread-safe wrapper for StateMachine
pub type SharedStateMachine = Arc<StateMachine>;

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::MockClock;
    use std::collections::HashMap;

    fn make_test_setup() -> (MockClock, StateMachine) {
        let clock = MockClock::new();
        let event_bus = Arc::new(EventBus::new());
        let sm = StateMachine::new(event_bus, Arc::new(clock.clone()));
        (clock, sm)
    }

    #[test]
    fn test_set_and_get_state() {
        let (_, sm) = make_test_setup();

        let entity_id = EntityId::new("binary_sensor", "battery").unwrap();
        sm.set(entity_id, "on", HashMap::new(), Context::new());

        let retrieved = sm.get("binary_sensor.battery").unwrap();
        assert_eq!(retrieved.state, "on");
        assert!(sm.is_state("binary_sensor.battery", "on"));
        assert!(!sm.is_state("binary_sensor.battery", "off"));
        assert!(!sm.is_state("binary_sensor.missing", "on"));
    }

    #[test]
    fn test_last_changed_follows_mock_clock() {
        let (clock, sm) = make_test_setup();
        let entity_id = EntityId::new("binary_sensor", "battery").unwrap();

        let t0 = clock.now();
        sm.set(entity_id.clone(), "on", HashMap::new(), Context::new());

        clock.advance_seconds(10);
        // Same value keeps last_changed pinned at t0
        let same = sm.set(entity_id.clone(), "on", HashMap::new(), Context::new());
        assert_eq!(same.last_changed, t0);
        assert_eq!(same.last_updated, clock.now());

        clock.advance_seconds(10);
        let changed = sm.set(entity_id, "off", HashMap::new(), Context::new());
        assert_eq!(changed.last_changed, clock.now());
    }

    #[test]
    fn test_domain_indexing() {
        let (_, sm) = make_test_setup();

        sm.set(
            EntityId::new("binary_sensor", "battery").unwrap(),
            "on",
            HashMap::new(),
            Context::new(),
        );
        sm.set(
            EntityId::new("binary_sensor", "motion").unwrap(),
            "off",
            HashMap::new(),
            Context::new(),
        );
        sm.set(
            EntityId::new("switch", "kitchen").unwrap(),
            "on",
            HashMap::new(),
            Context::new(),
        );

        let ids = sm.entity_ids("binary_sensor");
        assert_eq!(
            ids,
            vec!["binary_sensor.battery", "binary_sensor.motion"]
        );
        assert_eq!(sm.entity_ids("switch"), vec!["switch.kitchen"]);
        assert_eq!(sm.entity_count(), 3);
    }

    #[test]
    fn test_remove_state() {
        let (_, sm) = make_test_setup();

        let entity_id = EntityId::new("binary_sensor", "battery").unwrap();
        sm.set(entity_id.clone(), "on", HashMap::new(), Context::new());

        let removed = sm.remove(&entity_id, Context::new());
        assert_eq!(removed.unwrap().state, "on");
        assert!(sm.get("binary_sensor.battery").is_none());
        assert!(sm.entity_ids("binary_sensor").is_empty());
    }

    #[tokio::test]
    async fn test_state_changed_event_fired() {
        let clock = MockClock::new();
        let event_bus = Arc::new(EventBus::new());
        let sm = StateMachine::new(event_bus.clone(), Arc::new(clock));

        let mut rx = event_bus.subscribe_typed::<StateChangedData>();

        let entity_id = EntityId::new("binary_sensor", "battery").unwrap();
        sm.set(entity_id, "on", HashMap::new(), Context::new());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.data.entity_id.to_string(), "binary_sensor.battery");
        assert!(event.data.old_state.is_none());
        assert_eq!(event.data.new_state.unwrap().state, "on");
    }
}
