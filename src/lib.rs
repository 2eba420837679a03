pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export logic types
pub use logic::{Paginator, PersonService, ServiceError, ServiceResult, MAX_PAGE_SIZE};

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, PersonStore, PostgresStore, StoreError};

use std::sync::Arc;

use crate::api::handlers::AppContext;
use crate::config::{AppConfig, StoreBackend};

/// Build the application router around `store`
pub fn build_app<S: PersonStore + 'static>(store: Arc<S>, config: &AppConfig) -> axum::Router {
    let paginator = Paginator::new(config.pagination.max_page_size);
    let context = AppContext {
        service: PersonService::new(store, paginator),
        default_page_size: config.pagination.default_page_size,
    };

    api::routes::create_router().with_state(Arc::new(context))
}

/// Serve `app` on the configured address until the process is stopped
pub async fn serve(app: axum::Router, config: &AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    log::info!("person service running on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Load configuration, connect the configured store and serve
pub async fn run_server() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    log::info!(
        "configuration loaded: server={}, store={:?}, max page size={}",
        config.server_address(),
        config.store.backend,
        config.pagination.max_page_size
    );

    let app = match config.store.backend {
        StoreBackend::Postgres => {
            log::info!("connecting to PostgreSQL");
            let store = PostgresStore::new(&config.database_url(), config.max_connections()).await?;
            store.migrate().await?;
            build_app(Arc::new(store), &config)
        }
        StoreBackend::Memory => {
            log::warn!("using the in-memory store, data is lost on shutdown");
            build_app(Arc::new(MemoryStore::new()), &config)
        }
    };

    serve(app, &config).await
}
