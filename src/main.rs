use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webflow_sync::config::SyncConfig;
use webflow_sync::server::{build_router, AppState};
use webflow_sync::store::PostgrestStore;
use webflow_sync::sync::SyncOrchestrator;
use webflow_sync::webflow::WebflowClient;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webflow_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "refusing to start without configuration");
            return ExitCode::FAILURE;
        }
    };

    let remote = WebflowClient::new(
        config.webflow_token.clone(),
        config.webflow_collection_id.clone(),
        config.webflow_site_id.clone(),
    );
    let store = PostgrestStore::new(
        config.supabase_url.clone(),
        config.supabase_service_key.clone(),
    );
    let orchestrator = SyncOrchestrator::new(remote, store.clone(), store);
    let app = build_router(AppState::new(orchestrator));

    tracing::info!("listening on {}", config.listen_addr);

    let listener = match tokio::net::TcpListener::bind(config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.listen_addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
