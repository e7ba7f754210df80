//! Automation management
//!
//! An automation ties together triggers, conditions, and actions. The
//! AutomationManager handles the lifecycle of all automations.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::action::ServiceAction;
use crate::condition::Condition;
use crate::trigger::Trigger;

/// Automation errors
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Automation not found: {0}")]
    NotFound(String),

    #[error("Invalid automation configuration: {0}")]
    InvalidConfig(String),

    #[error("Condition error: {0}")]
    Condition(#[from] hearth_device_condition::DeviceConditionError),
}

/// Result type for automation operations
pub type AutomationResult<T> = Result<T, AutomationError>;

/// Automation configuration
///
/// The trigger/condition/action keys each accept a single object or a list,
/// as the wire format does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Unique ID (optional, auto-generated if not provided)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Human-readable name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Triggers that start the automation
    #[serde(default, alias = "trigger", deserialize_with = "one_or_many::deserialize")]
    pub triggers: Vec<Trigger>,

    /// Conditions that must be met
    #[serde(default, alias = "condition", deserialize_with = "one_or_many::deserialize")]
    pub conditions: Vec<Condition>,

    /// Actions to execute
    #[serde(default, alias = "action", deserialize_with = "one_or_many::deserialize")]
    pub actions: Vec<ServiceAction>,

    /// Whether the automation is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// A loaded automation
#[derive(Debug, Clone)]
pub struct Automation {
    /// Unique identifier
    pub id: String,

    /// Human-readable name
    pub alias: Option<String>,

    /// Triggers that start the automation
    pub triggers: Vec<Trigger>,

    /// Conditions that must be met
    pub conditions: Vec<Condition>,

    /// Actions to execute
    pub actions: Vec<ServiceAction>,

    /// Whether enabled
    pub enabled: bool,
}

impl Automation {
    /// Create from config
    pub fn from_config(config: AutomationConfig) -> Self {
        let id = config
            .id
            .unwrap_or_else(|| ulid::Ulid::new().to_string().to_lowercase());

        Self {
            id,
            alias: config.alias,
            triggers: config.triggers,
            conditions: config.conditions,
            actions: config.actions,
            enabled: config.enabled,
        }
    }

    /// Get display name (alias or ID)
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.id)
    }
}

/// Manages all automations
pub struct AutomationManager {
    /// All automations by ID
    automations: DashMap<String, Automation>,
}

impl AutomationManager {
    /// Create a new automation manager
    pub fn new() -> Self {
        Self {
            automations: DashMap::new(),
        }
    }

    /// Load automations from configs
    ///
    /// Configs are registered as-is; device conditions are not checked
    /// against the registries here. Load through
    /// [`AutomationEngine::load_automations`](crate::AutomationEngine::load_automations)
    /// when they should be validated first.
    pub fn load(&self, configs: Vec<AutomationConfig>) -> AutomationResult<()> {
        for config in configs {
            self.add(Automation::from_config(config));
        }
        Ok(())
    }

    /// Add a single automation
    pub fn add(&self, automation: Automation) {
        info!(
            "Loaded automation: {} ({})",
            automation.display_name(),
            automation.id
        );
        self.automations.insert(automation.id.clone(), automation);
    }

    /// Get an automation by ID
    pub fn get(&self, id: &str) -> Option<Automation> {
        self.automations.get(id).map(|a| a.value().clone())
    }

    /// Get all automations
    pub fn all(&self) -> Vec<Automation> {
        self.automations.iter().map(|a| a.value().clone()).collect()
    }

    /// Get automation count
    pub fn count(&self) -> usize {
        self.automations.len()
    }

    /// Enable or disable an automation
    pub fn set_enabled(&self, id: &str, enabled: bool) -> AutomationResult<()> {
        let mut automation = self
            .automations
            .get_mut(id)
            .ok_or_else(|| AutomationError::NotFound(id.to_string()))?;
        debug!(automation_id = %id, enabled, "Setting automation enabled");
        automation.enabled = enabled;
        Ok(())
    }

    /// Remove an automation
    pub fn remove(&self, id: &str) -> AutomationResult<Automation> {
        self.automations
            .remove(id)
            .map(|(_, a)| a)
            .ok_or_else(|| AutomationError::NotFound(id.to_string()))
    }
}

impl Default for AutomationManager {
    fn default() -> Self {
        Self::new()
    }
}

mod one_or_many {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(item) => Ok(vec![item]),
            OneOrMany::Many(items) => Ok(items),
        }
    }
}
