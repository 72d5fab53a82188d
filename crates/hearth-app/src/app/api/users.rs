//! Admin-only account management.

use salvo::{Depot, Request, Router, handler, writing::Json};
use serde::Serialize;
use tracing::error;

use super::MessageResponse;
use super::error::ApiError;
use crate::db_handler::get_db_from_depot;
use hearth_core::constants::USERS_ROUTE_COMPONENT;
use hearth_db::model::user::User;
use hearth_service::auth::depot::require_admin;
use hearth_service::validate::{CreateUserPayload, UpdateUserPayload, Validate};

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

fn parse_user_id(req: &Request) -> Result<uuid::Uuid, ApiError> {
    let raw = req
        .param::<String>("user_id")
        .ok_or_else(|| ApiError::BadRequest("User ID required".to_string()))?;
    uuid::Uuid::parse_str(&raw)
        .map_err(|_e| ApiError::BadRequest("Invalid user ID format".to_string()))
}

/// ## Summary
/// GET /api/users - List all accounts, newest first.
///
/// ## Errors
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 403 if the caller is not an admin
/// Returns HTTP 503 if no database connection is available
#[handler]
async fn list_users_handler(depot: &mut Depot) -> Result<Json<UserListResponse>, ApiError> {
    use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    require_admin(depot)?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let users = schema::app_user::table
        .order(schema::app_user::created_at.desc())
        .select(User::as_select())
        .load::<User>(&mut conn)
        .await?;

    Ok(Json(UserListResponse {
        success: true,
        users,
    }))
}

/// ## Summary
/// GET /`api/users/:user_id` - Fetch one account.
///
/// ## Errors
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 403 if the caller is not an admin
/// Returns HTTP 404 if the account does not exist
#[handler]
async fn get_user_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<UserResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    require_admin(depot)?;
    let user_id = parse_user_id(req)?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let user = schema::app_user::table
        .filter(schema::app_user::id.eq(user_id))
        .select(User::as_select())
        .first::<User>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// ## Summary
/// POST /api/users - Create an account with an explicit role.
///
/// ## Errors
/// Returns HTTP 400 if the payload is malformed or fails validation
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 403 if the caller is not an admin
/// Returns HTTP 409 if the email is already registered
#[handler]
async fn create_user_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<UserResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::{db::schema, model::user::NewUser};

    tracing::debug!("Processing create user request");

    let admin = require_admin(depot)?.clone();

    let payload: CreateUserPayload = req.parse_json().await.map_err(|e| {
        error!(error = ?e, "Failed to parse create user request");
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
        role: payload.role,
    };

    let user = diesel::insert_into(schema::app_user::table)
        .values(&new_user)
        .returning(User::as_select())
        .get_result::<User>(&mut conn)
        .await?;

    tracing::info!(
        user_id = %user.id,
        email = %user.email,
        role = %user.role,
        created_by = %admin.email,
        "User created"
    );

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// ## Summary
/// PUT /`api/users/:user_id` - Update name, email, role, or password.
///
/// A new password is re-hashed before storage; a changed email must stay
/// unique across accounts.
///
/// ## Errors
/// Returns HTTP 400 if the payload is malformed or fails validation
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 403 if the caller is not an admin
/// Returns HTTP 404 if the account does not exist
/// Returns HTTP 409 if the new email is already taken
#[handler]
async fn update_user_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<UserResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::{db::schema, model::user::UserChangeset};

    tracing::debug!("Processing update user request");

    let admin = require_admin(depot)?.clone();
    let user_id = parse_user_id(req)?;

    let payload: UpdateUserPayload = req.parse_json().await.map_err(|e| {
        error!(error = ?e, "Failed to parse update user request");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;
    payload.validate()?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let existing = schema::app_user::table
        .filter(schema::app_user::id.eq(user_id))
        .select(User::as_select())
        .first::<User>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if let Some(email) = &payload.email {
        if *email != existing.email {
            let taken = schema::app_user::table
                .filter(schema::app_user::email.eq(email))
                .filter(schema::app_user::id.ne(user_id))
                .select(User::as_select())
                .first::<User>(&mut conn)
                .await
                .optional()?;

            if taken.is_some() {
                return Err(ApiError::Conflict("Email already registered".to_string()));
            }
        }
    }

    let password_hash = match &payload.password {
        Some(password) => Some(hearth_service::auth::password::hash_password(password)?),
        None => None,
    };

    let changeset = UserChangeset {
        name: payload.name,
        email: payload.email,
        password_hash,
        role: payload.role,
        updated_at: Some(chrono::Utc::now()),
    };

    let user = diesel::update(schema::app_user::table.filter(schema::app_user::id.eq(user_id)))
        .set(&changeset)
        .returning(User::as_select())
        .get_result::<User>(&mut conn)
        .await?;

    tracing::info!(
        user_id = %user.id,
        updated_by = %admin.email,
        "User updated"
    );

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// ## Summary
/// DELETE /`api/users/:user_id` - Remove an account.
///
/// Admins cannot delete their own account; that would leave the hub without a
/// way to undo the mistake.
///
/// ## Errors
/// Returns HTTP 400 if the target is the caller's own account
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 403 if the caller is not an admin
/// Returns HTTP 404 if the account does not exist
#[handler]
async fn delete_user_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<MessageResponse>, ApiError> {
    use diesel::{ExpressionMethods, QueryDsl};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    tracing::debug!("Processing delete user request");

    let admin = require_admin(depot)?.clone();
    let user_id = parse_user_id(req)?;

    if user_id == admin.sub {
        return Err(ApiError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let deleted = diesel::delete(schema::app_user::table.filter(schema::app_user::id.eq(user_id)))
        .execute(&mut conn)
        .await?;

    if deleted == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(
        user_id = %user_id,
        deleted_by = %admin.email,
        "User deleted"
    );

    Ok(Json(MessageResponse::ok("User deleted")))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(USERS_ROUTE_COMPONENT)
        .get(list_users_handler)
        .post(create_user_handler)
        .push(
            Router::with_path("<user_id>")
                .get(get_user_handler)
                .put(update_user_handler)
                .delete(delete_user_handler),
        )
}
