//! HTTP server for the rimeflow charts.
//!
//! Serves the chart data the browser frontend renders with ECharts, plus
//! the static frontend itself. Aggregation runs server-side per request;
//! the browser only draws.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                        |
//! |--------|-----------------------|------------------------------------|
//! | GET    | `/health`             | Health check                       |
//! | GET    | `/api/sources`        | The registered data sources        |
//! | GET    | `/api/charts/{id}`    | Aggregated chart data for a source |
//! | GET    | `/api/logs`           | SSE stream for real-time logs      |
//! | GET    | `/*`                  | Static frontend files              |

use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use super::logs::{log_error, log_info, log_success, LOG_BUS};
use super::types::{error_response, ChartsResponse};
use crate::engine::aggregate;
use crate::models::FieldConfig;
use crate::source::{AutoSource, RecordSource};
use crate::viewer::SourceRegistry;

/// Shared server state: the source registry and the field configuration.
pub struct AppState {
    pub registry: SourceRegistry,
    pub config: FieldConfig,
}

/// Start the HTTP server.
pub async fn start_server(
    port: u16,
    registry: SourceRegistry,
    config: FieldConfig,
    static_dir: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    // Permissive CORS for development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let state = Arc::new(AppState { registry, config });

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/sources", get(list_sources))
        .route("/api/charts/{id}", get(charts))
        .route("/api/logs", get(sse_logs))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 rimeflow server running on http://localhost:{}", port);
    println!("   GET /api/sources     - Registered data sources");
    println!("   GET /api/charts/{{id}} - Aggregated chart data");
    println!("   GET /api/logs        - SSE log stream");
    println!("   GET /health          - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "rimeflow",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// The fixed set of selectable data sources.
async fn list_sources(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "sources": state.registry.entries() }))
}

/// Load one data source, aggregate it, and return the chart data.
async fn charts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ChartsResponse>, (StatusCode, Json<Value>)> {
    let entry = state.registry.resolve(&id).cloned().ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(error_response(&format!("Unknown data source: {}", id))),
        )
    })?;

    log_info(format!("📄 Loading source '{}' ({})", entry.label, entry.location));

    let table = AutoSource.load(&entry.location).await.map_err(|e| {
        log_error(format!("Load failed: {}", e));
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_response(&e.to_string())),
        )
    })?;

    log_success(format!(
        "Decoded {} rows ({}, '{}')",
        table.records.len(),
        table.encoding,
        table.delimiter
    ));

    let models = aggregate(&table.records, &state.config);
    log_success(format!(
        "Aggregated {} nodes, {} edges, {} distribution entries",
        models.graph.nodes.len(),
        models.graph.edges.len(),
        models.distribution.entries.len()
    ));

    Ok(Json(ChartsResponse::build(&entry, &table, models)))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BUS.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
