//! `ledgerlink` - the integration server binary.

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use ledgerlink::adapters::http::{integration_router, IntegrationAppState};
use ledgerlink::adapters::quickbooks::{
    IntuitOAuthClient, IntuitOAuthConfig, QuickBooksApiClient, QuickBooksApiConfig,
};
use ledgerlink::adapters::storage::JsonDocumentStore;
use ledgerlink::application::{Dispatcher, WebhookService, WorkflowOrchestrator};
use ledgerlink::config::AppConfig;
use ledgerlink::domain::webhook::WebhookVerifier;
use secrecy::ExposeSecret;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let quickbooks = &config.quickbooks;
    let api = QuickBooksApiClient::new(
        QuickBooksApiConfig::new(quickbooks.api_base_url())
            .with_minor_version(quickbooks.minor_version)
            .with_timeout(quickbooks.request_timeout()),
    )?;
    let oauth = IntuitOAuthClient::new(
        IntuitOAuthConfig::new(
            quickbooks.client_id.clone(),
            quickbooks.client_secret.expose_secret().clone(),
            quickbooks.redirect_uri.clone(),
        )
        .with_timeout(quickbooks.request_timeout()),
    )?;

    let store = JsonDocumentStore::open(&config.storage.document_path).await?;

    let orchestrator = Arc::new(WorkflowOrchestrator::new(
        Arc::new(store),
        Arc::new(oauth),
        Arc::new(api),
        config.workflow_settings(),
    ));
    let webhooks = Arc::new(WebhookService::new(
        WebhookVerifier::new(quickbooks.webhook_verifier_token.expose_secret().clone()),
        Dispatcher::for_orchestrator(orchestrator.clone()),
    ));

    let app = integration_router()
        .with_state(IntegrationAppState::new(orchestrator, webhooks))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, environment = ?config.server.environment, "ledgerlink listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("ledgerlink stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.server.log_level.clone().into());

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
