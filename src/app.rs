use crate::catalog::ApiError;
use crate::config::Config;
use crate::container::Container;
use crate::query::{Queries, QueryState, SearchQuery};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub container: Arc<Container>,
    pub queries: Arc<Queries>,
}

impl AppState {
    pub fn new(container: Arc<Container>, config: &Config) -> Self {
        let queries = Arc::new(Queries::new(&container.use_cases, config.featured_stale));
        Self { container, queries }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let container = Arc::new(Container::from_config(&config));
    let state = AppState::new(container, &config);
    let app = build_router(state);

    info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Storefront server failed")?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/home", get(home))
        .route("/api/search", get(search))
        .route("/api/movies/:id", get(movie_detail))
        .route("/api/movies/:id/assets", get(movie_assets))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "backend": state.container.backend_kind().as_str()
    }))
}

async fn home(State(state): State<AppState>) -> Response {
    match state.queries.featured.get().await {
        QueryState::Success(rails) => Json(&*rails).into_response(),
        other => unsettled(other, "featured rails"),
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    if !SearchQuery::is_enabled(&params.q) {
        return Json(json!([])).into_response();
    }
    match state.queries.search.get(&params.q).await {
        QueryState::Success(results) => Json(&*results).into_response(),
        other => unsettled(other, "search"),
    }
}

async fn movie_detail(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.queries.detail.get(id).await {
        QueryState::Success(Some(detail)) => Json(&*detail).into_response(),
        QueryState::Success(None) => not_found(id),
        other => unsettled(other, "movie detail"),
    }
}

async fn movie_assets(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.container.movie_assets(id).await {
        Ok(Some(assets)) => Json(assets).into_response(),
        Ok(None) => not_found(id),
        Err(e) => upstream_error(&e, "movie assets"),
    }
}

fn not_found(id: i64) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"status": "error", "message": format!("Movie {} not found", id)})),
    )
        .into_response()
}

fn upstream_error(err: &ApiError, what: &str) -> Response {
    warn!(path = err.path(), status = ?err.status(), "Failed to load {}: {}", what, err);
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({"status": "error", "message": err.to_string()})),
    )
        .into_response()
}

fn unsettled<T>(state: QueryState<T>, what: &str) -> Response {
    match state {
        QueryState::Error(e) => upstream_error(&e, what),
        _ => {
            error!("Query for {} did not settle", what);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
