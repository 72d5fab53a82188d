use salvo::Depot;
use tracing::error;

use crate::token_handler::get_token_service_from_depot;
use hearth_service::auth::depot::{AuthUser, depot_keys};

/// ## Summary
/// Authentication middleware that verifies the bearer token and stores the
/// resulting claims in the depot.
///
/// A missing or invalid token is not an error at this layer; the request is
/// marked public and each handler decides whether authentication is required.
///
/// ## Side Effects
/// Inserts an [`AuthUser`] into the depot for downstream handlers to access.
#[salvo::async_trait]
impl salvo::Handler for AuthMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        tracing::trace!("Authenticating request");

        if req.method() == salvo::http::Method::OPTIONS {
            depot.insert(depot_keys::AUTHENTICATED_USER, AuthUser::Public);
            return;
        }

        let token_service = match get_token_service_from_depot(depot) {
            Ok(svc) => svc,
            Err(e) => {
                error!(error = ?e, "Failed to get token service from depot");
                res.status_code(salvo::http::StatusCode::INTERNAL_SERVER_ERROR);
                ctrl.skip_rest();
                return;
            }
        };

        let bearer = req
            .headers()
            .get(salvo::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = bearer else {
            tracing::trace!("No bearer token presented, treating as public");
            depot.insert(depot_keys::AUTHENTICATED_USER, AuthUser::Public);
            return;
        };

        match token_service.verify(token) {
            Ok(claims) => {
                tracing::debug!(user_email = %claims.email, "User authenticated successfully");
                depot.insert(depot_keys::AUTHENTICATED_USER, AuthUser::User(claims));
            }
            Err(_e) => {
                tracing::debug!("Bearer token rejected, treating as public");
                depot.insert(depot_keys::AUTHENTICATED_USER, AuthUser::Public);
            }
        }
    }
}

/// ## Summary
/// Middleware handler for authentication.
/// Use this as a handler in routes to protect them with authentication.
pub struct AuthMiddleware;
