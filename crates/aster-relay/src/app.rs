//! Application wiring: configuration -> signer -> router -> listener.

use std::sync::Arc;

use aster_core::SystemClock;
use aster_signer::{PayloadSigner, RequestSigner, SharedClock};
use axum::Router;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::server::{create_router, AppState};

/// Main application.
pub struct Application {
    config: AppConfig,
    state: AppState,
}

impl Application {
    /// Build from configuration, loading the signer key as configured.
    ///
    /// Fails fast when the selected scheme is missing credentials.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let clock: SharedClock = Arc::new(SystemClock);
        let signer = config.build_signer(clock.clone())?;
        Self::with_signer(config, signer, clock)
    }

    /// Build with an already constructed signer and clock.
    pub fn with_signer(
        config: AppConfig,
        signer: RequestSigner,
        clock: SharedClock,
    ) -> AppResult<Self> {
        config.validate()?;

        info!(
            scheme = %signer.scheme(),
            test_mode = config.test_mode,
            order_url = %config.order_url,
            recv_window = config.recv_window,
            "Signer ready"
        );
        if !config.test_mode {
            warn!("Test mode disabled: orders will be submitted to the exchange");
        }

        let state = AppState::new(&config, signer, clock)?;
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        let addr = self.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(%addr, test_mode = self.state.is_test_mode(), "Webhook relay listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Webhook relay stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
