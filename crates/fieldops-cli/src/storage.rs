use crate::cli::StorageBackend;
use anyhow::{Context, Result};
use fieldops_core::models::{Booking, DueItem};
use fieldops_store::memory::MemoryBookingStore;
use fieldops_store::postgres::{PostgresConfig, PostgresStore};
use fieldops_store::Stores;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Bookings and due items used to seed the memory backend
#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub due_items: Vec<DueItem>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))
    }
}

/// Parse database URL to extract connection details for error messages
fn parse_database_url(url: &str) -> (String, String, String) {
    let authority = url.split('@').nth(1).and_then(|s| s.split('/').next());

    let host = authority
        .and_then(|s| s.split(':').next())
        .unwrap_or("localhost")
        .to_string();

    let port = authority
        .and_then(|s| s.split(':').nth(1))
        .unwrap_or("5432")
        .to_string();

    let database = url
        .split('/')
        .next_back()
        .and_then(|s| s.split('?').next())
        .unwrap_or("fieldops")
        .to_string();

    (host, port, database)
}

/// Open the selected backend
pub async fn open(backend: StorageBackend, data: Option<&Path>) -> Result<Stores> {
    match backend {
        StorageBackend::Memory => open_memory(data),
        StorageBackend::Postgres => {
            if data.is_some() {
                tracing::warn!("--data only seeds the memory backend; ignoring it");
            }
            open_postgres().await
        }
    }
}

fn open_memory(data: Option<&Path>) -> Result<Stores> {
    let fixture = match data {
        Some(path) => Fixture::load(path)?,
        None => Fixture::default(),
    };
    tracing::debug!(
        bookings = fixture.bookings.len(),
        due_items = fixture.due_items.len(),
        "Seeding memory storage"
    );

    let bookings = MemoryBookingStore::with_data(fixture.bookings, fixture.due_items);
    Ok(Stores::memory_with(Arc::new(bookings)))
}

async fn open_postgres() -> Result<Stores> {
    let config = PostgresConfig::from_env().context(
        "Failed to load PostgreSQL configuration. Set DATABASE_URL environment variable.",
    )?;

    let store = PostgresStore::with_migrations(config.clone()).await.map_err(|e| {
        let (host, port, database) = parse_database_url(&config.database_url);

        anyhow::anyhow!(
            "Failed to connect to PostgreSQL\n\n\
                Connection details:\n\
                  Host: {}\n\
                  Port: {}\n\
                  Database: {}\n\n\
                Remediation:\n\
                  1. Ensure PostgreSQL is running\n\
                  2. Check DATABASE_URL environment variable\n\
                  3. Verify credentials and database exists\n\n\
                Error: {}",
            host,
            port,
            database,
            e
        )
    })?;

    Ok(Stores::postgres(Arc::new(store)))
}
