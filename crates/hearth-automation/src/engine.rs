//! Automation execution engine
//!
//! Orchestrates the trigger → condition → action pipeline. Conditions are
//! re-evaluated synchronously inside every candidate trigger firing; a
//! condition that doesn't hold suppresses the actions with no retry and no
//! side effect. There is no background scheduling: `for` durations are
//! satisfied purely by re-evaluation at the next relevant event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

use hearth_core::{Clock, Context, Event};
use hearth_device_condition::DeviceConditionEvaluator;
use hearth_event_bus::EventBus;
use hearth_registries::EntityRegistry;
use hearth_service_registry::ServiceRegistry;
use hearth_state_machine::StateMachine;

use crate::action::ActionRenderer;
use crate::automation::{Automation, AutomationConfig, AutomationManager, AutomationResult};
use crate::condition::Condition;
use crate::trigger::TriggerData;

/// Automation engine that orchestrates trigger → condition → action flow
pub struct AutomationEngine {
    /// Event bus for subscribing to events
    event_bus: Arc<EventBus>,
    /// Service registry for dispatching actions
    services: Arc<ServiceRegistry>,
    /// Time source for condition evaluation and trigger timestamps
    clock: Arc<dyn Clock>,
    /// Automation manager with all registered automations
    manager: Arc<AutomationManager>,
    /// Device condition evaluator
    condition_evaluator: DeviceConditionEvaluator,
    /// Action payload renderer
    renderer: ActionRenderer,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,
}

impl AutomationEngine {
    /// Create a new automation engine
    pub fn new(
        event_bus: Arc<EventBus>,
        states: Arc<StateMachine>,
        entities: Arc<EntityRegistry>,
        services: Arc<ServiceRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            event_bus,
            services,
            clock,
            manager: Arc::new(AutomationManager::new()),
            condition_evaluator: DeviceConditionEvaluator::new(states, entities),
            renderer: ActionRenderer::new(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Get a reference to the automation manager for configuration
    pub fn manager(&self) -> Arc<AutomationManager> {
        self.manager.clone()
    }

    /// Validate and register an automation
    ///
    /// Device conditions are checked against the registries up front, so a
    /// bad `type` or an unresolvable entity fails the rule's setup instead
    /// of surfacing at evaluation time.
    pub fn add_automation(&self, config: AutomationConfig) -> AutomationResult<String> {
        let automation = Automation::from_config(config);

        for condition in &automation.conditions {
            let Condition::Device(device_condition) = condition;
            self.condition_evaluator.validate(device_condition)?;
        }

        let id = automation.id.clone();
        self.manager.add(automation);
        Ok(id)
    }

    /// Validate and register a batch of automation configs
    ///
    /// Each config goes through the same validation as
    /// [`add_automation`](Self::add_automation). Stops at the first invalid
    /// config; configs before it stay registered.
    pub fn load_automations(
        &self,
        configs: Vec<AutomationConfig>,
    ) -> AutomationResult<Vec<String>> {
        configs
            .into_iter()
            .map(|config| self.add_automation(config))
            .collect()
    }

    /// Start the automation engine
    ///
    /// Subscribes to all events and processes each one against the
    /// registered automations until `stop` is called.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Automation engine already running");
            return;
        }

        info!("Starting automation engine");

        let mut event_rx = self.event_bus.subscribe_all();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let engine = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event_result = event_rx.recv() => {
                        match event_result {
                            Ok(event) => engine.handle_event(&event).await,
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                warn!("Automation engine lagged by {} events", n);
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                info!("Event bus closed, stopping automation engine");
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Received shutdown signal");
                        break;
                    }
                }
            }

            engine.running.store(false, Ordering::SeqCst);
            info!("Automation engine stopped");
        });
    }

    /// Stop the automation engine
    pub fn stop(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }

        info!("Stopping automation engine");
        let _ = self.shutdown_tx.send(());
    }

    /// Check if the engine is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Process one event against all automations
    ///
    /// The full trigger → condition → action chain runs inline, so by the
    /// time this returns every automation has either dispatched its actions
    /// or been suppressed by its conditions.
    pub async fn handle_event(&self, event: &Event<serde_json::Value>) {
        trace!(event_type = %event.event_type, "Processing event");

        for automation in self.manager.all() {
            if !automation.enabled {
                continue;
            }

            for trigger in &automation.triggers {
                if let Some(trigger_data) = trigger.matches(event, self.clock.now()) {
                    debug!(
                        automation_id = %automation.id,
                        trigger_platform = %trigger_data.platform,
                        "Trigger matched"
                    );
                    self.run_automation(&automation, trigger_data, &event.context)
                        .await;
                }
            }
        }
    }

    /// Run a single automation: check conditions, then dispatch actions
    async fn run_automation(
        &self,
        automation: &Automation,
        trigger_data: TriggerData,
        parent_context: &Context,
    ) {
        let now = self.clock.now();

        for condition in &automation.conditions {
            let Condition::Device(device_condition) = condition;

            let met = match self.condition_evaluator.evaluate(device_condition, now) {
                Ok(met) => met,
                Err(e) => {
                    warn!(
                        automation_id = %automation.id,
                        error = %e,
                        "Error evaluating condition, treating as not met"
                    );
                    false
                }
            };

            if !met {
                debug!(
                    automation_id = %automation.id,
                    condition_type = %device_condition.r#type,
                    "Condition not met, skipping actions"
                );
                return;
            }
        }

        info!(automation_id = %automation.id, "Executing automation actions");

        for action in &automation.actions {
            let (domain, service) = match action.split_service() {
                Ok(parts) => parts,
                Err(e) => {
                    error!(automation_id = %automation.id, error = %e, "Invalid action");
                    continue;
                }
            };

            let service_data = match self.renderer.render(action, &trigger_data) {
                Ok(data) => data,
                Err(e) => {
                    error!(
                        automation_id = %automation.id,
                        error = %e,
                        "Failed to render action data"
                    );
                    continue;
                }
            };

            if let Err(e) = self
                .services
                .call(domain, service, service_data, parent_context.child())
                .await
            {
                error!(
                    automation_id = %automation.id,
                    service = %action.service,
                    error = %e,
                    "Service call failed"
                );
            }
        }
    }
}