mod auth;
mod calendar;
pub mod error;
mod healthcheck;
mod news;
mod travel;
mod users;

use salvo::Router;

use crate::middleware::auth::AuthMiddleware;
use hearth_core::constants::API_ROUTE_COMPONENT;

/// Generic `{"success": true, "message": ...}` response body.
#[derive(Debug, serde::Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// ## Summary
/// Constructs the main API router with all resource handlers.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_ROUTE_COMPONENT)
        .hoop(AuthMiddleware)
        .push(healthcheck::routes())
        .push(auth::routes())
        .push(calendar::routes())
        .push(travel::routes())
        .push(news::routes())
        .push(users::routes())
}
