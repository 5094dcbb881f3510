//! HTTP server binary for billscan.
//!
//! A thin shim over the library crate: clap flags build a
//! [`BillScanConfig`] once at startup, and axum routes each
//! `POST /extract-bill-data` request through
//! [`billscan::handle_extract`]. The endpoint always answers HTTP 200;
//! the `is_success` flag in the body carries the real outcome.

use anyhow::{Context, Result};
use axum::{extract::State, routing::get, routing::post, Json, Router};
use billscan::{handle_extract, ApiResponse, BillRequest, BillScanConfig};
use clap::Parser;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "billscan",
    about = "HTTP service extracting structured line items from bill images via a vision model",
    version
)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0", env = "BILLSCAN_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000, env = "BILLSCAN_PORT")]
    port: u16,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Primary model identifier.
    #[arg(long, default_value = "gemini-flash-latest")]
    model: String,

    /// Fallback model tried once when the primary attempt fails.
    #[arg(long, default_value = "gemini-1.5-flash")]
    fallback_model: String,

    /// Tolerated difference between the extracted sum and the printed total.
    #[arg(long, default_value_t = 1.0)]
    tolerance: f64,

    /// Skip the image-cleanup pass before extraction.
    #[arg(long)]
    no_preprocess: bool,
}

struct AppState {
    config: BillScanConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = BillScanConfig::builder()
        .api_key(args.api_key)
        .primary_model(args.model)
        .fallback_model(args.fallback_model)
        .reconcile_tolerance(args.tolerance)
        .preprocess(!args.no_preprocess)
        .build()
        .context("invalid configuration")?;

    let state = Arc::new(AppState { config });

    let app = Router::new()
        .route("/extract-bill-data", post(extract_bill_data))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", args.host, args.port);
    info!("billscan listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// POST /extract-bill-data — run the pipeline for one bill URL.
async fn extract_bill_data(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BillRequest>,
) -> Json<ApiResponse> {
    Json(handle_extract(&request.document, &state.config).await)
}

/// GET /health — liveness probe.
async fn health() -> &'static str {
    "ok"
}
