use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::context::AppContext;
use crate::narrative::NarrativeGenerator;
use crate::services::ForecastOrchestrator;

/// Running HTTP server
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    /// Build and initialize the application
    ///
    /// Loads the historical series and models once, wires the orchestrator
    /// and narrative client, and spawns the HTTP API server (Axum).
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");

        // Series and model artifacts are plain file IO
        let load_config = config.clone();
        let context = tokio::task::spawn_blocking(move || AppContext::load(&load_config)).await??;

        let narrative = NarrativeGenerator::new(config.narrative.clone())?;
        info!(
            "Narrative provider {} (model {}, timeout {}s, {} retries)",
            narrative.endpoint(),
            config.narrative.model,
            config.narrative.timeout_secs,
            config.narrative.max_retries
        );

        let orchestrator = ForecastOrchestrator::new(Arc::new(context), narrative);
        let app = create_router(AppState { orchestrator }).layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        let server_handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await
        });

        info!("Application initialized successfully");

        Ok(Self { server_handle })
    }

    /// Run until the server stops (which runs indefinitely unless error)
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
