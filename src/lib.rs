//! # Lexicon
//!
//! Dictionary lookup API over a Meilisearch word index, with Redis carrying
//! the state every replica must agree on: the word-of-day cache entry and
//! the per-client request counters.
//!
//! ## Endpoints
//! - `GET /api/v1/words/search?q=<term>&page=<n>&limit=<n>`
//! - `GET /api/v1/words/random`
//! - `GET /api/v1/words/word-of-day`
//! - `GET /api/v1/words/{id}`
//!
//! Every `/api/v1` request passes the fixed-window rate limiter before its
//! handler runs (100 requests per client per minute, `X-RateLimit-*` headers
//! on the way out).
//!
//! ## Redis + Meilisearch
//! Meilisearch owns the documents and the search behavior. Redis is the one
//! shared mutable resource: replicas never coordinate directly, the daily
//! cache converges because selection is deterministic for a given day, and
//! the limiter orders requests through atomic INCR. Neither core component
//! holds mutable state of its own.

use std::{net::SocketAddr, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    middleware::from_fn_with_state,
    routing::get,
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod daily;
pub mod database;
pub mod error;
pub mod limiter;
pub mod models;
pub mod routes;
pub mod search;
pub mod selector;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

use limiter::rate_limit;
use routes::{random_handler, search_handler, word_handler, word_of_day_handler};
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route("/words/search", get(search_handler))
        .route("/words/random", get(random_handler))
        .route("/words/word-of-day", get(word_of_day_handler))
        .route("/words/{id}", get(word_handler))
        .layer(from_fn_with_state(state.clone(), rate_limit));

    let app = Router::new()
        .nest("/api/v1", api)
        .layer(CatchPanicLayer::new())
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap();

    info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
