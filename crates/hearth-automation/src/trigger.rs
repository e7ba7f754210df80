//! Trigger types
//!
//! Triggers decide which events cause an automation to run. Matching an
//! event produces `TriggerData`, which becomes the `trigger` variable in
//! action templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::trace;

use hearth_core::Event;

/// Data produced when a trigger matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerData {
    /// Optional trigger ID for referencing in conditions/actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Trigger platform type (e.g., "event")
    pub platform: String,

    /// Additional variables available in templates
    #[serde(flatten)]
    pub variables: HashMap<String, serde_json::Value>,

    /// When the trigger matched
    pub triggered_at: DateTime<Utc>,
}

impl TriggerData {
    /// Create new trigger data stamped at `now`
    pub fn new(platform: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            platform: platform.into(),
            variables: HashMap::new(),
            triggered_at: now,
        }
    }

    /// Set trigger ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a variable
    pub fn with_var(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.variables.insert(key.into(), value);
        self
    }
}

/// Trigger definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires on any event with optional data matching
    Event(EventTrigger),
}

impl Trigger {
    /// Check whether an event matches this trigger
    ///
    /// Returns the trigger data for the automation run, stamped at `now`.
    pub fn matches(
        &self,
        event: &Event<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Option<TriggerData> {
        match self {
            Trigger::Event(t) => t.matches(event, now),
        }
    }
}

/// Event trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTrigger {
    /// Optional trigger ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Event type to match
    pub event_type: String,

    /// Optional event data to match (subset match)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_data: Option<serde_json::Value>,
}

impl EventTrigger {
    fn matches(
        &self,
        event: &Event<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Option<TriggerData> {
        if event.event_type.as_str() != self.event_type {
            return None;
        }

        if let Some(expected) = &self.event_data {
            if !json_subset_matches(&event.data, expected) {
                trace!(event_type = %self.event_type, "Event data doesn't match");
                return None;
            }
        }

        let mut data = TriggerData::new("event", now).with_var(
            "event",
            json!({
                "event_type": self.event_type,
                "data": event.data,
            }),
        );
        if let Some(id) = &self.id {
            data = data.with_id(id);
        }

        trace!(event_type = %self.event_type, "Event trigger matched");
        Some(data)
    }
}

/// Check that every key in `expected` is present in `actual` with an equal
/// value. Nested objects match recursively.
fn json_subset_matches(actual: &serde_json::Value, expected: &serde_json::Value) -> bool {
    match (actual, expected) {
        (serde_json::Value::Object(actual), serde_json::Value::Object(expected)) => expected
            .iter()
            .all(|(k, v)| actual.get(k).is_some_and(|a| json_subset_matches(a, v))),
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::Context;

    fn event(event_type: &str, data: serde_json::Value) -> Event<serde_json::Value> {
        Event::new(event_type, data, Utc::now(), Context::new())
    }

    #[test]
    fn test_event_trigger_deserialize() {
        let trigger: Trigger = serde_json::from_str(
            r#"{"platform": "event", "event_type": "test_event1"}"#,
        )
        .unwrap();
        assert!(matches!(trigger, Trigger::Event(_)));
    }

    #[test]
    fn test_event_trigger_matches_type() {
        let trigger: Trigger = serde_json::from_str(
            r#"{"platform": "event", "event_type": "test_event1"}"#,
        )
        .unwrap();

        let data = trigger
            .matches(&event("test_event1", json!({})), Utc::now())
            .unwrap();
        assert_eq!(data.platform, "event");
        assert_eq!(data.variables["event"]["event_type"], "test_event1");

        assert!(trigger
            .matches(&event("test_event2", json!({})), Utc::now())
            .is_none());
    }

    #[test]
    fn test_event_data_subset_match() {
        let trigger: Trigger = serde_json::from_str(
            r#"{"platform": "event", "event_type": "press", "event_data": {"button": 1}}"#,
        )
        .unwrap();

        assert!(trigger
            .matches(&event("press", json!({"button": 1, "extra": true})), Utc::now())
            .is_some());
        assert!(trigger
            .matches(&event("press", json!({"button": 2})), Utc::now())
            .is_none());
        assert!(trigger
            .matches(&event("press", json!({})), Utc::now())
            .is_none());
    }

    #[test]
    fn test_trigger_data_serializes_for_templates() {
        let trigger: Trigger = serde_json::from_str(
            r#"{"platform": "event", "event_type": "test_event1", "id": "first"}"#,
        )
        .unwrap();

        let data = trigger
            .matches(&event("test_event1", json!({"x": 1})), Utc::now())
            .unwrap();
        let value = serde_json::to_value(&data).unwrap();

        assert_eq!(value["platform"], "event");
        assert_eq!(value["id"], "first");
        assert_eq!(value["event"]["event_type"], "test_event1");
        assert_eq!(value["event"]["data"]["x"], 1);
    }
}
