//! JSON HTTP API.
//!
//! Exposes the report pipeline for dashboard frontends and other HTTP
//! consumers. The classifier chain is constructed once at startup and
//! shared across requests; the availability of the primary strategy is
//! therefore decided once for the server's lifetime.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/api/report?q=&days=&limit=` | Build and return a [`Report`](crate::report::Report) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "days must be in [1, 365], got 0" } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser
//! dashboards.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::classifier::ClassifierChain;
use crate::config::Config;
use crate::db;
use crate::report;

/// Shared application state passed to route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pool: SqlitePool,
    chain: Arc<ClassifierChain>,
}

/// Start the HTTP server on the configured bind address. Runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;
    let chain = ClassifierChain::from_config(&config.classifier)?;

    let state = AppState {
        config: Arc::new(config.clone()),
        pool,
        chain: Arc::new(chain),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/report", get(handle_report))
        .layer(cors)
        .with_state(state);

    println!("Server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Validation failures carry range wording from `validate_window`; map
/// those to 400 and everything else to 500.
fn classify_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();
    if msg.contains("must be in") {
        bad_request(msg)
    } else {
        internal_error(msg)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/report ============

#[derive(Deserialize)]
struct ReportParams {
    /// Free-text query; empty or absent means unfiltered.
    q: Option<String>,
    days: Option<i64>,
    limit: Option<i64>,
}

async fn handle_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<report::Report>, AppError> {
    let query = params.q.unwrap_or_default();
    let days = params.days.unwrap_or(state.config.report.default_days);
    let limit = params.limit.unwrap_or(state.config.report.default_limit);

    let report = report::build_report(
        &state.config,
        &state.pool,
        &state.chain,
        &query,
        days,
        limit,
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(report))
}
