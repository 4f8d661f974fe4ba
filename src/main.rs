//! Movie night backend binary wiring configuration, storage, metadata lookups and the REST/SSE layers.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_night_back::{
    config::{AppConfig, MetadataConfig, StorageConfig},
    dao::{
        game_store::{GameStore, memory::MemoryGameStore},
        metadata::{FixedMetadataProvider, MetadataProvider},
    },
    routes,
    services::lifecycle,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = build_store(config.storage()).await?;
    let metadata = build_metadata(config.metadata())?;
    let port = config.port();

    let app_state = AppState::new(config, store, metadata);
    lifecycle::restore(&app_state)
        .await
        .context("restoring round lifecycle from storage")?;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

async fn build_store(storage: &StorageConfig) -> anyhow::Result<Arc<dyn GameStore>> {
    match storage {
        StorageConfig::Memory => {
            info!("using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryGameStore::new()))
        }
        #[cfg(feature = "json-store")]
        StorageConfig::JsonFile { path } => {
            let store = movie_night_back::dao::game_store::json_file::JsonFileGameStore::open(
                path.clone(),
            )
            .await
            .with_context(|| format!("opening JSON store at {}", path.display()))?;
            info!(path = %path.display(), "using JSON file storage");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "json-store"))]
        StorageConfig::JsonFile { path } => anyhow::bail!(
            "JSON storage at {} requested but the `json-store` feature is disabled",
            path.display()
        ),
    }
}

fn build_metadata(metadata: &MetadataConfig) -> anyhow::Result<Arc<dyn MetadataProvider>> {
    match metadata {
        MetadataConfig::Fixed => {
            info!("using fixed movie metadata; titles are stored as typed");
            Ok(Arc::new(FixedMetadataProvider::new()))
        }
        #[cfg(feature = "omdb-metadata")]
        MetadataConfig::Omdb { base_url, api_key } => {
            use movie_night_back::dao::metadata::omdb::{OmdbConfig, OmdbMetadataProvider};

            let provider = OmdbMetadataProvider::new(OmdbConfig {
                base_url: base_url.clone(),
                api_key: api_key.clone(),
            })
            .context("building OMDb client")?;
            info!(%base_url, "using OMDb movie metadata");
            Ok(Arc::new(provider))
        }
        #[cfg(not(feature = "omdb-metadata"))]
        MetadataConfig::Omdb { .. } => {
            anyhow::bail!("OMDb lookups requested but the `omdb-metadata` feature is disabled")
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
