//! Public section: the home page.

use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

use crate::app::AppState;

/// Body returned by the home page.
pub const GREETING: &str = "Hello World!";

/// Routes of the public section. Trailing slashes are accepted.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/home", get(home))
        .route("/home/", get(home))
}

/// Home page.
async fn home() -> &'static str {
    trace!("Hello from the home route!");
    debug!("Hello from the home route!");
    info!("Hello from the home route!");
    warn!("Hello from the home route!");
    error!("Hello from the home route!");
    GREETING
}
