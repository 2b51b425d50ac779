//! Prometheus metrics for the Quill node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`]; [`serve_metrics`] exposes it
//! in the text exposition format on `/metrics`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};
use tokio::sync::broadcast;

use crate::NodeError;

pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Block ranges committed to the ledger.
    pub ranges_synced: IntCounter,
    pub events_applied: IntCounter,
    /// Synchronization attempts that rolled back.
    pub sync_failures: IntCounter,
    pub transactions_submitted: IntCounter,
    pub transactions_failed: IntCounter,
    /// Head subscriptions re-established after a drop.
    pub head_reconnects: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Last block applied to the ledger.
    pub sync_cursor: IntGauge,
    /// Last head height announced by the chain.
    pub chain_head: IntGauge,
}

impl NodeMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let ranges_synced = register_int_counter_with_registry!(
            Opts::new("quill_ranges_synced_total", "Block ranges committed"),
            registry
        )
        .expect("failed to register ranges_synced counter");

        let events_applied = register_int_counter_with_registry!(
            Opts::new("quill_events_applied_total", "Contract events applied"),
            registry
        )
        .expect("failed to register events_applied counter");

        let sync_failures = register_int_counter_with_registry!(
            Opts::new("quill_sync_failures_total", "Synchronization attempts rolled back"),
            registry
        )
        .expect("failed to register sync_failures counter");

        let transactions_submitted = register_int_counter_with_registry!(
            Opts::new(
                "quill_transactions_submitted_total",
                "Transactions accepted by the chain"
            ),
            registry
        )
        .expect("failed to register transactions_submitted counter");

        let transactions_failed = register_int_counter_with_registry!(
            Opts::new(
                "quill_transactions_failed_total",
                "Transactions rejected or not delivered"
            ),
            registry
        )
        .expect("failed to register transactions_failed counter");

        let head_reconnects = register_int_counter_with_registry!(
            Opts::new("quill_head_reconnects_total", "Head subscription reconnects"),
            registry
        )
        .expect("failed to register head_reconnects counter");

        let sync_cursor = register_int_gauge_with_registry!(
            Opts::new("quill_sync_cursor", "Last block applied to the ledger"),
            registry
        )
        .expect("failed to register sync_cursor gauge");

        let chain_head = register_int_gauge_with_registry!(
            Opts::new("quill_chain_head", "Last announced chain head height"),
            registry
        )
        .expect("failed to register chain_head gauge");

        Self {
            registry,
            ranges_synced,
            events_applied,
            sync_failures,
            transactions_submitted,
            transactions_failed,
            head_reconnects,
            sync_cursor,
            chain_head,
        }
    }

    /// Text exposition of every registered metric.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| NodeError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| NodeError::Metrics(e.to_string()))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

pub fn router(metrics: Arc<NodeMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<Arc<NodeMetrics>>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Serve `/metrics` on `addr` until shutdown is signalled.
pub async fn serve_metrics(
    addr: SocketAddr,
    metrics: Arc<NodeMetrics>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), NodeError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "metrics endpoint listening");
    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;
    Ok(())
}
