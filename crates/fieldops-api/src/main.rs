use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use fieldops_core::clock::{Clock, SystemClock};
use fieldops_core::config::LayeredConfig;
use fieldops_geo::{DistanceMatrixProvider, RoutingProvider, UnconfiguredProvider};
use fieldops_llm::{ChatEnhancer, ChatEnhancerConfig, InsightEnhancer, ProviderHealth};
use fieldops_scheduling::SchedulingServices;
use fieldops_store::postgres::{PostgresConfig, PostgresStore};
use fieldops_store::Stores;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fieldops_api::config::ApiConfig;
use fieldops_api::router::create_router;
use fieldops_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fieldops_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    let settings = LayeredConfig::with_defaults()
        .load_from_optional_file(&config.config_file)
        .context("Failed to load scheduling configuration")?
        .load_from_env();

    tracing::info!(
        port = config.port,
        timezone = %settings.business_timezone.value.name(),
        postgres = config.uses_postgres(),
        "Starting Fieldops API server"
    );

    let stores = if config.uses_postgres() {
        tracing::info!("DATABASE_URL found, connecting to PostgreSQL...");
        match init_postgres_storage().await {
            Ok(store) => {
                tracing::info!("Connected to PostgreSQL");
                Stores::postgres(store)
            }
            Err(e) => {
                tracing::error!("Failed to connect to PostgreSQL: {}", e);
                tracing::error!(
                    "Remediation:\n\
                    1. Ensure PostgreSQL is running\n\
                    2. Verify DATABASE_URL is correct\n\
                    3. Check that the database exists and is accessible"
                );
                std::process::exit(1);
            }
        }
    } else {
        tracing::info!("Using in-memory storage (set DATABASE_URL for PostgreSQL)");
        Stores::memory()
    };

    let timeout = Duration::from_secs(settings.routing_timeout_secs.value);
    let provider: Arc<dyn RoutingProvider> = match &config.routing_api_key {
        Some(key) => Arc::new(DistanceMatrixProvider::google(key.clone(), timeout)?),
        None => {
            tracing::warn!(
                "FIELDOPS_ROUTING_API_KEY not set; travel checks will fall back to unavailable"
            );
            Arc::new(UnconfiguredProvider)
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut enhancer_health = None;
    let mut enhancer: Option<Arc<dyn InsightEnhancer>> = None;
    if settings.enhancer_enabled.value {
        match &config.enhancer {
            Some(endpoint) => {
                let health = Arc::new(ProviderHealth::default());
                let chat = ChatEnhancer::new(
                    ChatEnhancerConfig::new(
                        endpoint.base_url.clone(),
                        endpoint.api_key.clone(),
                        settings.enhancer_model.value.clone(),
                    ),
                    health.clone(),
                )?
                .with_clock(clock.clone());
                enhancer = Some(Arc::new(chat));
                enhancer_health = Some(health);
            }
            None => tracing::warn!(
                "Enhancer enabled but FIELDOPS_ENHANCER_URL or FIELDOPS_ENHANCER_API_KEY is missing"
            ),
        }
    }

    let services = SchedulingServices::build(&stores, provider, &settings, enhancer, clock);
    let mut state = AppState::new(services, stores.backend);
    if let Some(health) = enhancer_health {
        state = state.with_enhancer_health(health);
    }

    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid FIELDOPS_CORS_ORIGIN '{}'", config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = create_router(Arc::new(state)).layer(cors);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", config.cors_origin);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize PostgreSQL storage from DATABASE_URL and the pool settings
async fn init_postgres_storage() -> Result<Arc<PostgresStore>, String> {
    let config =
        PostgresConfig::from_env().map_err(|e| format!("Invalid database configuration: {}", e))?;

    PostgresStore::with_migrations(config)
        .await
        .map(Arc::new)
        .map_err(|e| format!("Connection failed: {}", e))
}
