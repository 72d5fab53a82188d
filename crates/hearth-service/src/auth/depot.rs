//! Depot helpers for extracting the authenticated user from Salvo requests.

use crate::auth::token::Claims;
use crate::error::{ServiceError, ServiceResult};

pub mod depot_keys {
    pub const AUTHENTICATED_USER: &str = "__authenticated_user";
}

/// Authentication context stored in the depot by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthUser {
    /// Request carried a valid bearer token.
    User(Claims),
    /// No (valid) credentials were presented.
    Public,
}

/// Get the authenticated user's claims from the depot.
///
/// ## Errors
///
/// Returns `NotAuthenticated` if no user is found in the depot or if the
/// request is public.
pub fn require_user(depot: &salvo::Depot) -> ServiceResult<&Claims> {
    let auth_user = depot
        .get::<AuthUser>(depot_keys::AUTHENTICATED_USER)
        .map_err(|_e| ServiceError::NotAuthenticated)?;

    match auth_user {
        AuthUser::User(claims) => Ok(claims),
        AuthUser::Public => Err(ServiceError::NotAuthenticated),
    }
}

/// Get the authenticated user's claims, requiring the admin role.
///
/// ## Errors
///
/// Returns `NotAuthenticated` if the request is unauthenticated and
/// `AuthorizationError` if the user is not an admin.
pub fn require_admin(depot: &salvo::Depot) -> ServiceResult<&Claims> {
    let claims = require_user(depot)?;

    if claims.role.is_admin() {
        Ok(claims)
    } else {
        Err(ServiceError::AuthorizationError(
            "Admin access required".to_string(),
        ))
    }
}
