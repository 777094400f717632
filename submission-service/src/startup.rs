//! Application startup and lifecycle management.

use crate::config::SubmissionConfig;
use crate::handlers::{
    create_invoices, get_invoice, health_check, list_invoices, metrics_handler, readiness_check,
    submit_invoices,
};
use crate::services::{
    init_metrics, Database, FbrClient, InvoiceAssembler, InvoiceStore, SubmissionPipeline,
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InvoiceStore>,
    pub pipeline: Arc<SubmissionPipeline>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .route("/invoices", get(list_invoices).post(create_invoices))
        .route("/invoices/submit", post(submit_invoices))
        .route("/invoices/:id", get(get_invoice))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connect to PostgreSQL, run migrations and bind the listener.
    pub async fn build(config: SubmissionConfig) -> Result<Self, AppError> {
        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            e
        })?;

        Self::build_with_store(config, Arc::new(db)).await
    }

    /// Build the application on top of an existing store.
    pub async fn build_with_store(
        config: SubmissionConfig,
        store: Arc<dyn InvoiceStore>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let client = FbrClient::new(config.fbr.clone()).map_err(|e| {
            tracing::error!(error = %e, "Failed to build FBR client");
            AppError::InternalError(anyhow::anyhow!("Failed to build FBR client: {}", e))
        })?;
        let assembler = InvoiceAssembler::new(config.fbr.include_scenario_in_production);
        let pipeline = Arc::new(SubmissionPipeline::new(store.clone(), client, assembler));

        let state = AppState {
            store,
            pipeline,
        };

        let http_addr = config.common.listen_addr();
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %http_addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!(
            http_port = http_port,
            fbr_base_url = %config.fbr.base_url,
            "Submission service listener bound"
        );

        Ok(Self {
            http_port,
            http_listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        tracing::info!(
            service = "submission-service",
            version = env!("CARGO_PKG_VERSION"),
            http_port = self.http_port,
            "Service ready to accept connections"
        );

        axum::serve(self.http_listener, router).await
    }
}
