//! Builds the scheduling services for one command invocation

use anyhow::Result;
use fieldops_core::clock::{Clock, SystemClock};
use fieldops_core::config::LayeredConfig;
use fieldops_geo::{DistanceMatrixProvider, RoutingProvider, UnconfiguredProvider};
use fieldops_llm::{ChatEnhancer, ChatEnhancerConfig, InsightEnhancer, ProviderHealth};
use fieldops_scheduling::SchedulingServices;
use fieldops_store::Stores;
use std::env;
use std::sync::Arc;
use std::time::Duration;

pub fn build(stores: &Stores, config: &LayeredConfig) -> Result<SchedulingServices> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let provider = routing_provider(config)?;
    let enhancer = enhancer(config, clock.clone())?;

    Ok(SchedulingServices::build(stores, provider, config, enhancer, clock))
}

fn routing_provider(config: &LayeredConfig) -> Result<Arc<dyn RoutingProvider>> {
    match env_value("FIELDOPS_ROUTING_API_KEY") {
        Some(key) => {
            let timeout = Duration::from_secs(config.routing_timeout_secs.value);
            Ok(Arc::new(DistanceMatrixProvider::google(key, timeout)?))
        }
        None => {
            tracing::debug!("FIELDOPS_ROUTING_API_KEY not set; travel legs will be unknown");
            Ok(Arc::new(UnconfiguredProvider))
        }
    }
}

fn enhancer(config: &LayeredConfig, clock: Arc<dyn Clock>) -> Result<Option<Arc<dyn InsightEnhancer>>> {
    if !config.enhancer_enabled.value {
        return Ok(None);
    }

    let (Some(base_url), Some(api_key)) =
        (env_value("FIELDOPS_ENHANCER_URL"), env_value("FIELDOPS_ENHANCER_API_KEY"))
    else {
        tracing::warn!("Enhancer enabled but FIELDOPS_ENHANCER_URL or FIELDOPS_ENHANCER_API_KEY is missing");
        return Ok(None);
    };

    let chat = ChatEnhancer::new(
        ChatEnhancerConfig::new(base_url, api_key, config.enhancer_model.value.clone()),
        Arc::new(ProviderHealth::default()),
    )?
    .with_clock(clock);

    Ok(Some(Arc::new(chat)))
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
