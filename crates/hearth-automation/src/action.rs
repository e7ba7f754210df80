//! Action types and payload templating
//!
//! The only action kind this engine dispatches is a service call. Payloads
//! may be given verbatim (`data`) or as templates (`data_template`), whose
//! string values are rendered against the trigger that fired.

use minijinja::Environment;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::trigger::TriggerData;

/// Action errors
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("invalid service reference: {0:?} (expected \"domain.service\")")]
    InvalidService(String),

    #[error("template error: {0}")]
    Template(String),
}

/// A service call action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAction {
    /// Service to call as "domain.service"
    pub service: String,

    /// Data passed verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Data whose string values are rendered as templates before dispatch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_template: Option<serde_json::Value>,
}

impl ServiceAction {
    /// Split the service reference into (domain, service)
    pub fn split_service(&self) -> Result<(&str, &str), ActionError> {
        self.service
            .split_once('.')
            .ok_or_else(|| ActionError::InvalidService(self.service.clone()))
    }
}

/// Renders action payloads against the trigger that fired
pub struct ActionRenderer {
    env: Environment<'static>,
}

impl ActionRenderer {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Build the final service data for an action
    ///
    /// `data` is taken verbatim; `data_template` values are rendered with
    /// the trigger available as `trigger`, overriding `data` on key clashes.
    pub fn render(
        &self,
        action: &ServiceAction,
        trigger: &TriggerData,
    ) -> Result<serde_json::Value, ActionError> {
        let mut result = action.data.clone().unwrap_or_else(|| json!({}));

        if let Some(template_data) = &action.data_template {
            let context = json!({ "trigger": trigger });
            let rendered = self.render_value(template_data, &context)?;

            match (&mut result, rendered) {
                (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
                    for (k, v) in overlay {
                        base.insert(k, v);
                    }
                }
                (slot, rendered) => *slot = rendered,
            }
        }

        Ok(result)
    }

    fn render_value(
        &self,
        value: &serde_json::Value,
        context: &serde_json::Value,
    ) -> Result<serde_json::Value, ActionError> {
        match value {
            serde_json::Value::String(template) => {
                let rendered = self
                    .env
                    .render_str(template, context)
                    .map_err(|e| ActionError::Template(e.to_string()))?;
                Ok(serde_json::Value::String(rendered))
            }
            serde_json::Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), self.render_value(v, context)?);
                }
                Ok(serde_json::Value::Object(out))
            }
            serde_json::Value::Array(items) => items
                .iter()
                .map(|v| self.render_value(v, context))
                .collect::<Result<Vec<_>, _>>()
                .map(serde_json::Value::Array),
            other => Ok(other.clone()),
        }
    }
}

impl Default for ActionRenderer {
    fn default() -> Self {
        Self::new()
    }
}
