//! League Roster Back binary entrypoint wiring REST, SSE, and the selected storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use league_roster_back::{
    config::{AppConfig, StorageBackend},
    dao::{
        roster_store::{RosterRepository, memory::InMemoryRosterStore},
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    spawn_storage(app_state.clone(), StorageBackend::from_env());
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

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

/// Start the storage supervisor for the configured backend. The service stays in
/// degraded mode until the first connection succeeds.
fn spawn_storage(state: SharedState, backend: StorageBackend) {
    match backend {
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => {
            use league_roster_back::dao::roster_store::mongodb::{MongoConfig, MongoRosterStore};

            info!("using MongoDB storage backend");
            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoRosterStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn RosterRepository>)
            }));
        }
        #[cfg(feature = "couch-store")]
        StorageBackend::Couch => {
            use league_roster_back::dao::roster_store::couchdb::{CouchConfig, CouchRosterStore};

            info!("using CouchDB storage backend");
            tokio::spawn(storage_supervisor::run(state, || async {
                let config = CouchConfig::from_env()?;
                let store = CouchRosterStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn RosterRepository>)
            }));
        }
        StorageBackend::Memory => spawn_memory(state),
        #[allow(unreachable_patterns)]
        other => {
            warn!(backend = ?other, "storage backend not compiled in; using in-memory storage");
            spawn_memory(state);
        }
    }
}

fn spawn_memory(state: SharedState) {
    warn!("using in-memory storage; divisions are lost on restart");
    let store: Arc<dyn RosterRepository> = Arc::new(InMemoryRosterStore::new());
    tokio::spawn(storage_supervisor::run(state, move || {
        let store = store.clone();
        async move { Ok::<_, StorageError>(store) }
    }));
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
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
