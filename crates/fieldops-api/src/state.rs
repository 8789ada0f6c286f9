use fieldops_llm::ProviderHealth;
use fieldops_scheduling::SchedulingServices;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<SchedulingServices>,

    /// Storage backend label for health reports
    pub storage: &'static str,

    /// Health of the insight enhancer, when one is configured
    pub enhancer_health: Option<Arc<ProviderHealth>>,
}

impl AppState {
    pub fn new(services: SchedulingServices, storage: &'static str) -> Self {
        Self {
            services: Arc::new(services),
            storage,
            enhancer_health: None,
        }
    }

    pub fn with_enhancer_health(mut self, health: Arc<ProviderHealth>) -> Self {
        self.enhancer_health = Some(health);
        self
    }
}
