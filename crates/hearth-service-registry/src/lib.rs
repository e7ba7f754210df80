//! Service registry with async handlers for hearth
//!
//! Services are how automations act on the world: an automation whose
//! conditions pass calls a registered service. The registry routes each call
//! to the handler registered under its "domain.service" key.

use dashmap::DashMap;
use hearth_core::{Context, ServiceCall};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Result type for service calls
pub type ServiceResult = Result<(), ServiceError>;

/// Future type for async service handlers
pub type ServiceFuture = Pin<Box<dyn Future<Output = ServiceResult> + Send>>;

/// Service handler function type
pub type ServiceHandler = Arc<dyn Fn(ServiceCall) -> ServiceFuture + Send + Sync>;

/// Errors that can occur when working with services
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("service not found: {domain}.{service}")]
    NotFound { domain: String, service: String },

    #[error("service call failed: {0}")]
    CallFailed(String),
}

/// The service registry manages all registered services
///
/// Responsibilities:
/// - Register services with their async handlers
/// - Route calls to the appropriate handler
/// - Report which services exist
pub struct ServiceRegistry {
    /// Services indexed by "domain.service" key
    services: DashMap<String, ServiceHandler>,
}

impl ServiceRegistry {
    /// Create a new empty service registry
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Register a new service handler under domain.service
    pub fn register<F, Fut>(&self, domain: impl Into<String>, service: impl Into<String>, handler: F)
    where
        F: Fn(ServiceCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult> + Send + 'static,
    {
        let domain = domain.into();
        let service = service.into();
        let key = format!("{}.{}", domain, service);

        debug!(domain = %domain, service = %service, "Registering service");

        let handler: ServiceHandler =
            Arc::new(move |call| Box::pin(handler(call)) as ServiceFuture);
        self.services.insert(key, handler);
    }

    /// Call a service by domain and service name
    pub async fn call(
        &self,
        domain: &str,
        service: &str,
        service_data: serde_json::Value,
        context: Context,
    ) -> ServiceResult {
        let key = format!("{}.{}", domain, service);

        let handler = match self.services.get(&key) {
            Some(entry) => entry.value().clone(),
            None => {
                warn!(domain = %domain, service = %service, "Service not found");
                return Err(ServiceError::NotFound {
                    domain: domain.to_string(),
                    service: service.to_string(),
                });
            }
        };

        debug!(service = %key, "Calling service");
        let call = ServiceCall::new(domain, service, service_data, context);
        handler(call).await
    }

    /// Check whether a service is registered
    pub fn has_service(&self, domain: &str, service: &str) -> bool {
        self.services.contains_key(&format!("{}.{}", domain, service))
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for ServiceRegistry
pub type SharedServiceRegistry = Arc<ServiceRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_register_and_call() {
        let registry = ServiceRegistry::new();
        let calls: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));

        let calls_clone = calls.clone();
        registry.register("test", "automation", move |call: ServiceCall| {
            let calls = calls_clone.clone();
            async move {
                calls.lock().unwrap().push(call.service_data);
                Ok(())
            }
        });

        assert!(registry.has_service("test", "automation"));
        registry
            .call("test", "automation", json!({"some": "data"}), Context::new())
            .await
            .unwrap();

        let recorded = calls.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0]["some"], "data");
    }

    #[tokio::test]
    async fn test_call_unknown_service() {
        let registry = ServiceRegistry::new();

        let result = registry
            .call("test", "missing", json!({}), Context::new())
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::NotFound { ref domain, ref service })
                if domain == "test" && service == "missing"
        ));
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let registry = ServiceRegistry::new();
        registry.register("test", "failing", |_call: ServiceCall| async {
            Err(ServiceError::CallFailed("boom".to_string()))
        });

        let result = registry.call("test", "failing", json!({}), Context::new()).await;
        assert!(matches!(result, Err(ServiceError::CallFailed(_))));
    }
}
