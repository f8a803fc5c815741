//! HTTP surface: axum router, shared state, and server bootstrap.

mod accounts;
mod medicines;

use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::http::{HeaderMap, Method, header};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{SESSION_COOKIE, SessionClaims, SessionSigner};
use crate::config::Config;
use crate::registry::NdcClient;
use crate::store::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub registry: NdcClient,
    pub signer: Arc<SessionSigner>,
    pub config: Arc<Config>,
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // The browser frontend is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(accounts::health))
        .route("/google_login", post(accounts::google_login))
        .route("/logout", post(accounts::logout))
        .route(
            "/medicines",
            get(medicines::list_medicines).post(medicines::create_medicine),
        )
        .route("/medicines/query", get(medicines::query_medicines))
        .route(
            "/medicines/{id}",
            get(medicines::get_medicine).delete(medicines::delete_medicine),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reads and verifies the session cookie. Missing, tampered, and expired
/// tokens all count as no session.
pub(crate) fn session_from_headers(
    signer: &SessionSigner,
    headers: &HeaderMap,
) -> Option<SessionClaims> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            pair.strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .and_then(|token| signer.verify(token))
}

/// Open the store, wire up the state, and serve until shutdown.
pub async fn serve(host: &str, port: u16, db_path: &Path) -> anyhow::Result<()> {
    let config = Arc::new(Config::from_env());
    let db = Database::open(db_path)?;

    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        registry: NdcClient::new(&config)?,
        signer: Arc::new(SessionSigner::new(&config)),
        config,
    };

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!(host, port, "medcycle listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
