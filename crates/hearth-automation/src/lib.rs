//! Automation rules for hearth
//!
//! An automation is triggers + conditions + actions. The engine subscribes
//! to the event bus, matches events against triggers, re-evaluates the
//! automation's device conditions synchronously, and dispatches service-call
//! actions whose payloads may be templated against the trigger.

pub mod action;
pub mod automation;
pub mod condition;
pub mod engine;
pub mod trigger;

pub use action::{ActionError, ActionRenderer, ServiceAction};
pub use automation::{
    Automation, AutomationConfig, AutomationError, AutomationManager, AutomationResult,
};
pub use condition::Condition;
pub use engine::AutomationEngine;
pub use trigger::{EventTrigger, Trigger, TriggerData};
