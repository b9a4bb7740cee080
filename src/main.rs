//! Hiburim Back binary entrypoint wiring the catalog, the puzzle store, the
//! session task and the REST/SSE layers.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hiburim_back::{
    config::AppConfig,
    dao::{
        catalog::load_catalog,
        kv_store::FileStore,
        puzzle_store::{CURRENT_NAMESPACE, LEGACY_NAMESPACE, PuzzleStore},
    },
    routes,
    services::{calendar::today_local, session_runtime::SessionRuntime, session_service::SessionController},
    state::{AppState, EVENT_CAPACITY, SharedState, SseHub, catalog::Catalog},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let catalog_source = config.catalog_source();
    let catalog = match load_catalog(&catalog_source).await {
        Ok(catalog) => catalog,
        Err(err) => {
            // Served as "no puzzle available" until the next day's reload.
            error!(error = %err, "failed to load puzzle catalog");
            Catalog::default()
        }
    };

    let file_store = FileStore::open(config.store_path()).context("opening puzzle store")?;
    let mut store = PuzzleStore::new(file_store);
    if let Err(err) = store.migrate_legacy_keys(LEGACY_NAMESPACE, CURRENT_NAMESPACE) {
        warn!(error = %err, "legacy key migration failed; continuing with current keys only");
    }

    let events = Arc::new(SseHub::new(EVENT_CAPACITY));
    let mut controller = SessionController::new(catalog, store, events.clone());
    // A missing puzzle is reported on the event stream and the health route.
    let _ = controller.start(&today_local());

    let session = SessionRuntime::new(controller)
        .with_catalog_source(catalog_source)
        .spawn();
    let app_state = AppState::new(session, events);
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
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
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
