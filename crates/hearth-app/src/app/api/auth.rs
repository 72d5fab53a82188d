//! Registration, login, and current-user endpoints.

use salvo::{Depot, Request, Router, handler, writing::Json};
use serde::Serialize;
use tracing::error;

use super::error::ApiError;
use crate::db_handler::get_db_from_depot;
use crate::token_handler::get_token_service_from_depot;
use hearth_core::constants::AUTH_ROUTE_COMPONENT;
use hearth_db::{db::enums::Role, model::user::User};
use hearth_service::auth::depot::require_user;
use hearth_service::validate::{LoginPayload, RegisterPayload, Validate};

/// Login/register response payload; the token is a bearer JWT.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub success: bool,
    pub user: User,
}

/// ## Summary
/// POST /api/auth/register - Create a member account and issue a token.
///
/// New accounts always get the member role; only an admin can promote a user
/// afterwards.
///
/// ## Errors
/// Returns HTTP 400 if the payload is malformed or fails validation
/// Returns HTTP 409 if the email is already registered
/// Returns HTTP 503 if no database connection is available
#[handler]
async fn register_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<AuthResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::{db::schema, model::user::NewUser};

    tracing::debug!("Processing register request");

    let payload: RegisterPayload = req.parse_json().await.map_err(|e| {
        error!(error = ?e, "Failed to parse register request");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;
    payload.validate()?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let existing = schema::app_user::table
        .filter(schema::app_user::email.eq(&payload.email))
        .select(User::as_select())
        .first::<User>(&mut conn)
        .await
        .optional()?;

    if existing.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hearth_service::auth::password::hash_password(&payload.password)?;

    let new_user = NewUser {
        id: uuid::Uuid::now_v7(),
        name: &payload.name,
        email: &payload.email,
        password_hash: &password_hash,
        role: Role::Member,
    };

    let user = diesel::insert_into(schema::app_user::table)
        .values(&new_user)
        .returning(User::as_select())
        .get_result::<User>(&mut conn)
        .await?;

    let token_service = get_token_service_from_depot(depot)?;
    let token = token_service.issue(&user)?;

    tracing::info!(user_id = %user.id, email = %user.email, "User registered");

    Ok(Json(AuthResponse {
        success: true,
        token,
        user,
    }))
}

/// ## Summary
/// POST /api/auth/login - Verify credentials and issue a token.
///
/// Unknown email and wrong password are indistinguishable in the response.
///
/// ## Errors
/// Returns HTTP 400 if the payload is malformed or fails validation
/// Returns HTTP 401 if the credentials are invalid
/// Returns HTTP 503 if no database connection is available
#[handler]
async fn login_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<AuthResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    tracing::debug!("Processing login request");

    let payload: LoginPayload = req.parse_json().await.map_err(|e| {
        error!(error = ?e, "Failed to parse login request");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;
    payload.validate()?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let user = schema::app_user::table
        .filter(schema::app_user::email.eq(&payload.email))
        .select(User::as_select())
        .first::<User>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    hearth_service::auth::password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_e| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let token_service = get_token_service_from_depot(depot)?;
    let token = token_service.issue(&user)?;

    tracing::info!(user_id = %user.id, email = %user.email, "User logged in");

    Ok(Json(AuthResponse {
        success: true,
        token,
        user,
    }))
}

/// ## Summary
/// GET /api/auth/me - Return the account behind the presented token.
///
/// ## Errors
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 404 if the account no longer exists
/// Returns HTTP 503 if no database connection is available
#[handler]
async fn me_handler(depot: &mut Depot) -> Result<Json<CurrentUserResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    let user_id = require_user(depot)?.sub;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let user = schema::app_user::table
        .filter(schema::app_user::id.eq(user_id))
        .select(User::as_select())
        .first::<User>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(CurrentUserResponse {
        success: true,
        user,
    }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(AUTH_ROUTE_COMPONENT)
        .push(Router::with_path("register").post(register_handler))
        .push(Router::with_path("login").post(login_handler))
        .push(Router::with_path("me").get(me_handler))
}
