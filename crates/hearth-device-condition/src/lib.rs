//! Device conditions for binary sensors
//!
//! A device condition is a boolean predicate over one entity's current
//! state, named by a semantic type ("is battery low") instead of a raw state
//! value, and optionally gated by a minimum continuous-duration requirement
//! (`for: {seconds: 5}`).
//!
//! The pieces:
//! - [`binary_sensor`]: static per-device-class condition type tables
//! - [`condition`]: the [`DeviceCondition`] type and its wire shape
//! - [`duration`]: the "held for" computation and `for`-field parsing
//! - [`eval`]: the [`DeviceConditionEvaluator`]
//! - [`introspect`]: enumerating conditions and extra fields per device
//!
//! There are no background timers here. The automation engine re-evaluates
//! conditions synchronously on every relevant trigger firing, which is what
//! makes the point-in-time `for` check sufficient.

pub mod binary_sensor;
pub mod condition;
pub mod duration;
pub mod eval;
pub mod introspect;

pub use binary_sensor::{condition_types, ConditionTypeDef, RequiredState, DEVICE_CLASSES, DOMAIN};
pub use condition::{DeviceCondition, DeviceConditionError};
pub use duration::state_held_for;
pub use eval::DeviceConditionEvaluator;
pub use introspect::{condition_capabilities, conditions_for_device, Capabilities, FieldDescriptor};
