//! Service call type for invoking registered services

use crate::Context;
use serde::{Deserialize, Serialize};

/// A call to a registered service
///
/// Services are how automations act on the world. Each service belongs to a
/// domain and carries associated service data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    /// The domain the service belongs to (e.g., "light", "test")
    pub domain: String,

    /// The service name (e.g., "turn_on", "automation")
    pub service: String,

    /// Data passed to the service
    pub service_data: serde_json::Value,

    /// Context tracking what initiated this call
    pub context: Context,
}

impl ServiceCall {
    /// Create a new service call
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        service_data: serde_json::Value,
        context: Context,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data,
            context,
        }
    }

    /// Get the full service identifier (domain.service)
    pub fn service_id(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }

    /// Get a value from service_data
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.service_data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
