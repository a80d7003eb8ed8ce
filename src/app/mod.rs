//! Application bootstrap.
//!
//! Resolves nothing by itself: the caller hands in a [`Config`], the app
//! derives its log handlers, initialises its extensions and exposes the
//! router.

mod error;

pub use error::AppError;

use axum::{Router, middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{Config, Environment, KeyOrigin};
use crate::extensions::{self, Extensions};
use crate::logging::{self, LogGuard, LogHandler};
use crate::views;

/// State shared with every request handler.
pub struct AppState {
    pub config: Arc<Config>,
    pub extensions: Arc<Extensions>,
}

/// A fully wired application instance.
pub struct App {
    state: Arc<AppState>,
    handlers: Vec<LogHandler>,
}

impl App {
    /// Builds an application without touching the global log subscriber.
    pub async fn create(config: Config) -> Result<Self, AppError> {
        config.validate()?;
        let handlers = logging::handlers(&config)?;
        Self::assemble(config, handlers).await
    }

    async fn assemble(config: Config, handlers: Vec<LogHandler>) -> Result<Self, AppError> {
        let generated_secret = config.secret_key.origin() == KeyOrigin::Generated;
        if config.env == Environment::Production && generated_secret {
            warn!("SECRET_KEY is not set; sessions will not survive a restart");
        }

        let extensions = Extensions::init(&config).await?;

        info!(
            env = %config.env,
            debug = config.debug,
            database = %config.database_url(),
            handlers = handlers.len(),
            "Application created"
        );

        Ok(Self {
            state: Arc::new(AppState {
                config: Arc::new(config),
                extensions: Arc::new(extensions),
            }),
            handlers,
        })
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    pub fn extensions(&self) -> &Extensions {
        &self.state.extensions
    }

    /// Log handlers derived from the active configuration.
    pub fn log_handlers(&self) -> &[LogHandler] {
        &self.handlers
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Build the full application router.
    ///
    /// Request guards run only once a route and method have matched, so
    /// unknown paths stay 404 and unsupported methods stay 405.
    pub fn router(&self) -> Router {
        let csrf = self.state.extensions.csrf.clone();
        let ext = Arc::clone(&self.state.extensions);

        views::public::router()
            .route_layer(middleware::from_fn_with_state(csrf, extensions::protect))
            .route_layer(middleware::from_fn_with_state(ext, extensions::remember_user))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state())
    }

    /// Serve until ctrl-c, then close the database.
    pub async fn serve(self) -> Result<(), AppError> {
        let addr = self.state.config.bind.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| AppError::Bind {
                addr: addr.clone(),
                source,
            })?;

        let local_addr = listener.local_addr().map_err(AppError::Serve)?;
        info!(addr = %local_addr, env = %self.state.config.env, "Listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(AppError::Serve)?;

        self.state.extensions.db.close().await;
        info!("Server shut down gracefully");
        Ok(())
    }
}

/// Startup sequence: derive handlers, install them globally, then build
/// the application so its own startup is logged through them.
pub async fn bootstrap(config: Config) -> Result<(App, LogGuard), AppError> {
    config.validate()?;
    let handlers = logging::handlers(&config)?;
    let guard = logging::install(&handlers)?;
    let app = App::assemble(config, handlers).await?;
    Ok((app, guard))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}

#[cfg(test)]
mod tests;
