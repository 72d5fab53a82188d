use salvo::{Router, handler};

use hearth_core::constants::HEALTHCHECK_ROUTE_COMPONENT;

/// Liveness probe; no auth, no body.
#[handler]
async fn healthcheck() -> &'static str {
    "OK"
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(HEALTHCHECK_ROUTE_COMPONENT).get(healthcheck)
}
