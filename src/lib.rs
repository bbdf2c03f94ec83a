pub mod config;
pub mod controllers;
pub mod error;
pub mod models;
pub mod queue;
pub mod redis_client;
pub mod services;
pub mod storage;
pub mod store;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use config::{Config, StoreBackend};
use models::{Category, Event};
use queue::{MemoryQueue, Notifier, RedisQueue};
use services::{CategoryService, EventService};
use storage::{MemoryObjectStore, ObjectStore, RedisObjectStore};
use store::{MemoryTable, RecordStore, RedisTable};

// Shared state for every request; all handles are safe to use concurrently
#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub categories: CategoryService,
    pub objects: Arc<dyn ObjectStore>,
    pub config: Config,
}

/// Every external collaborator the service talks to.
pub struct Backends {
    pub events: Arc<dyn RecordStore<Event>>,
    pub categories: Arc<dyn RecordStore<Category>>,
    pub notifier: Arc<dyn Notifier>,
    pub objects: Arc<dyn ObjectStore>,
}

impl Backends {
    /// Builds the backends selected by `STORE_BACKEND`.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let backends = match config.storage.backend {
            StoreBackend::Redis => {
                let redis = redis_client::RedisClient::new(&config.redis.url).await?;
                Backends {
                    events: Arc::new(RedisTable::<Event>::new(
                        redis.clone(),
                        &config.storage.events_table,
                    )),
                    categories: Arc::new(RedisTable::<Category>::new(
                        redis.clone(),
                        &config.storage.categories_table,
                    )),
                    notifier: Arc::new(RedisQueue::new(redis.clone(), &config.queue.name)),
                    objects: Arc::new(RedisObjectStore::new(redis)),
                }
            }
            StoreBackend::Memory => {
                info!("Using the in-memory backend; data is lost on exit");
                Backends {
                    events: Arc::new(MemoryTable::<Event>::new(&config.storage.events_table)),
                    categories: Arc::new(MemoryTable::<Category>::new(
                        &config.storage.categories_table,
                    )),
                    notifier: Arc::new(MemoryQueue::new()),
                    objects: Arc::new(MemoryObjectStore::new()),
                }
            }
        };
        Ok(backends)
    }

    /// Ensures the bucket exists and, when enabled, registers the tables.
    pub async fn provision(&self, config: &Config) -> anyhow::Result<()> {
        self.objects.ensure_bucket(&config.storage.bucket_name).await?;
        if config.storage.auto_create_tables {
            self.events.ensure_table().await?;
            self.categories.ensure_table().await?;
        }
        Ok(())
    }
}

impl AppState {
    /// Connects the configured backends and provisions tables and bucket.
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let backends = Backends::connect(&config).await?;
        backends.provision(&config).await?;
        Ok(Self::from_backends(config, backends))
    }

    pub fn from_backends(config: Config, backends: Backends) -> Arc<Self> {
        Arc::new(Self {
            events: EventService::new(
                backends.events,
                backends.notifier,
                config.queue.message_format,
            ),
            categories: CategoryService::new(backends.categories),
            objects: backends.objects,
            config,
        })
    }
}

/// Full HTTP surface: banner, health check and the `/api` routes.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Event Catalog API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
