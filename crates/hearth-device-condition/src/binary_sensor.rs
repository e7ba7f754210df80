//! Condition type registry for binary sensors
//!
//! Static tables mapping each device class to its supported condition types.
//! The tables are pure data: each entry carries the raw state ("on"/"off")
//! the condition requires, so the evaluator never special-cases a class.
//! Adding a device class is a data edit here, nothing else.

use hearth_core::{STATE_OFF, STATE_ON};

/// The entity domain this condition engine operates within
pub const DOMAIN: &str = "binary_sensor";

/// The raw state a condition type requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredState {
    On,
    Off,
}

impl RequiredState {
    /// The raw state value as stored in the state machine
    pub fn as_str(self) -> &'static str {
        match self {
            RequiredState::On => STATE_ON,
            RequiredState::Off => STATE_OFF,
        }
    }
}

/// A single condition type definition within a device class
#[derive(Debug, Clone, Copy)]
pub struct ConditionTypeDef {
    /// The condition type name used in automation configs
    pub condition_type: &'static str,
    /// Human-readable label
    pub label: &'static str,
    /// The raw state the entity must be in for this condition to hold
    pub required_state: RequiredState,
}

const fn def(
    condition_type: &'static str,
    label: &'static str,
    required_state: RequiredState,
) -> ConditionTypeDef {
    ConditionTypeDef {
        condition_type,
        label,
        required_state,
    }
}

const fn pair(
    on_type: &'static str,
    on_label: &'static str,
    off_type: &'static str,
    off_label: &'static str,
) -> [ConditionTypeDef; 2] {
    [
        def(on_type, on_label, RequiredState::On),
        def(off_type, off_label, RequiredState::Off),
    ]
}

static BATTERY: [ConditionTypeDef; 2] =
    pair("is_bat_low", "Battery low", "is_not_bat_low", "Battery normal");
static COLD: [ConditionTypeDef; 2] = pair("is_cold", "Cold", "is_not_cold", "Not cold");
static CONNECTIVITY: [ConditionTypeDef; 2] =
    pair("is_connected", "Connected", "is_not_connected", "Disconnected");
static DOOR: [ConditionTypeDef; 2] = pair("is_open", "Open", "is_not_open", "Closed");
static GARAGE_DOOR: [ConditionTypeDef; 2] = pair("is_open", "Open", "is_not_open", "Closed");
static GAS: [ConditionTypeDef; 2] = pair("is_gas", "Gas detected", "is_no_gas", "No gas");
static HEAT: [ConditionTypeDef; 2] = pair("is_hot", "Hot", "is_not_hot", "Not hot");
static LIGHT: [ConditionTypeDef; 2] =
    pair("is_light", "Light detected", "is_no_light", "No light");
// Lock sensors report "on" when unlocked, so the pairing is inverted.
static LOCK: [ConditionTypeDef; 2] = [
    def("is_locked", "Locked", RequiredState::Off),
    def("is_not_locked", "Unlocked", RequiredState::On),
];
static MOISTURE: [ConditionTypeDef; 2] = pair("is_moist", "Moist", "is_not_moist", "Dry");
static MOTION: [ConditionTypeDef; 2] =
    pair("is_motion", "Motion detected", "is_no_motion", "No motion");
static MOVING: [ConditionTypeDef; 2] = pair("is_moving", "Moving", "is_not_moving", "Not moving");
static OCCUPANCY: [ConditionTypeDef; 2] =
    pair("is_occupied", "Occupied", "is_not_occupied", "Not occupied");
static OPENING: [ConditionTypeDef; 2] = pair("is_open", "Open", "is_not_open", "Closed");
static PLUG: [ConditionTypeDef; 2] =
    pair("is_plugged_in", "Plugged in", "is_not_plugged_in", "Unplugged");
static POWER: [ConditionTypeDef; 2] =
    pair("is_powered", "Powered", "is_not_powered", "Not powered");
static PRESENCE: [ConditionTypeDef; 2] = pair("is_present", "Present", "is_not_present", "Away");
static PROBLEM: [ConditionTypeDef; 2] =
    pair("is_problem", "Problem detected", "is_no_problem", "No problem");
static SAFETY: [ConditionTypeDef; 2] = pair("is_unsafe", "Unsafe", "is_not_unsafe", "Safe");
static SMOKE: [ConditionTypeDef; 2] =
    pair("is_smoke", "Smoke detected", "is_no_smoke", "No smoke");
static SOUND: [ConditionTypeDef; 2] =
    pair("is_sound", "Sound detected", "is_no_sound", "No sound");
static VIBRATION: [ConditionTypeDef; 2] = pair(
    "is_vibration",
    "Vibration detected",
    "is_no_vibration",
    "No vibration",
);
static WINDOW: [ConditionTypeDef; 2] = pair("is_open", "Open", "is_not_open", "Closed");
static DEFAULT: [ConditionTypeDef; 2] = pair("is_on", "On", "is_off", "Off");

/// All known binary sensor device classes, in display order
pub const DEVICE_CLASSES: &[&str] = &[
    "battery",
    "cold",
    "connectivity",
    "door",
    "garage_door",
    "gas",
    "heat",
    "light",
    "lock",
    "moisture",
    "motion",
    "moving",
    "occupancy",
    "opening",
    "plug",
    "power",
    "presence",
    "problem",
    "safety",
    "smoke",
    "sound",
    "vibration",
    "window",
];

/// Get the condition types for a device class
///
/// Returns the same fixed slice on every call. `None` selects the classless
/// default (`is_on`/`is_off`); an unknown class yields an empty slice rather
/// than an error.
pub fn condition_types(device_class: Option<&str>) -> &'static [ConditionTypeDef] {
    match device_class {
        None => &DEFAULT,
        Some("battery") => &BATTERY,
        Some("cold") => &COLD,
        Some("connectivity") => &CONNECTIVITY,
        Some("door") => &DOOR,
        Some("garage_door") => &GARAGE_DOOR,
        Some("gas") => &GAS,
        Some("heat") => &HEAT,
        Some("light") => &LIGHT,
        Some("lock") => &LOCK,
        Some("moisture") => &MOISTURE,
        Some("motion") => &MOTION,
        Some("moving") => &MOVING,
        Some("occupancy") => &OCCUPANCY,
        Some("opening") => &OPENING,
        Some("plug") => &PLUG,
        Some("power") => &POWER,
        Some("presence") => &PRESENCE,
        Some("problem") => &PROBLEM,
        Some("safety") => &SAFETY,
        Some("smoke") => &SMOKE,
        Some("sound") => &SOUND,
        Some("vibration") => &VIBRATION,
        Some("window") => &WINDOW,
        Some(_) => &[],
    }
}

/// Look up the raw state required by a condition type for a device class
pub fn required_state(device_class: Option<&str>, condition_type: &str) -> Option<RequiredState> {
    condition_types(device_class)
        .iter()
        .find(|d| d.condition_type == condition_type)
        .map(|d| d.required_state)
}
