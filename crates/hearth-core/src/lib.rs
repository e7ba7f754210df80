//! Core types for hearth
//!
//! This crate provides the fundamental types used throughout the hearth
//! automation engine: EntityId, State, Event, Context, ServiceCall, and the
//! injectable Clock used everywhere a timestamp is read.

mod clock;
mod context;
mod entity_id;
mod event;
mod service_call;
mod state;

pub use clock::{Clock, MockClock, SystemClock};
pub use context::Context;
pub use entity_id::{EntityId, EntityIdError};
pub use event::{Event, EventData, EventType};
pub use service_call::ServiceCall;
pub use state::State;

/// State value of a binary sensor that is active
pub const STATE_ON: &str = "on";

/// State value of a binary sensor that is inactive
pub const STATE_OFF: &str = "off";

/// Standard event types used by hearth
pub mod events {
    use super::*;

    /// Event type for state changes
    pub const STATE_CHANGED: &str = "state_changed";

    /// Event type for service calls
    pub const CALL_SERVICE: &str = "call_service";

    /// Data for STATE_CHANGED events
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    pub struct StateChangedData {
        pub entity_id: EntityId,
        pub old_state: Option<State>,
        pub new_state: Option<State>,
    }

    impl EventData for StateChangedData {
        fn event_type() -> &'static str {
            STATE_CHANGED
        }
    }

    /// Data for CALL_SERVICE events
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    pub struct CallServiceData {
        pub domain: String,
        pub service: String,
        pub service_data: serde_json::Value,
    }

    impl EventData for CallServiceData {
        fn event_type() -> &'static str {
            CALL_SERVICE
        }
    }
}
