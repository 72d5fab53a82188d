use salvo::async_trait;
use std::sync::Arc;

use crate::error::AppResult;
use hearth_core::error::CoreError;
use hearth_service::auth::token::TokenService;

pub struct TokenServiceHandler {
    pub service: Arc<TokenService>,
}

#[async_trait]
impl salvo::Handler for TokenServiceHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.service.clone());
    }
}

/// ## Summary
/// Retrieves the token service from the depot.
///
/// ## Errors
/// Returns an error if the token service is not found in the depot.
pub fn get_token_service_from_depot(depot: &salvo::Depot) -> AppResult<Arc<TokenService>> {
    depot
        .obtain::<Arc<TokenService>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Token service not found in depot").into())
}
