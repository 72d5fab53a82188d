//! Family news feed endpoints.

use salvo::{Depot, Request, Router, handler, writing::Json};
use serde::Serialize;
use tracing::error;

use super::MessageResponse;
use super::error::ApiError;
use crate::db_handler::get_db_from_depot;
use hearth_core::constants::NEWS_ROUTE_COMPONENT;
use hearth_db::model::{news::NewsEntry, user::Creator};
use hearth_service::auth::depot::require_user;
use hearth_service::validate::{NewsEntryPayload, UpdateNewsEntryPayload, Validate};

const DEFAULT_FEED_LIMIT: i64 = 50;

/// An entry with its author joined in, as sent over the wire.
#[derive(Debug, Serialize)]
pub struct EntryRecord {
    #[serde(flatten)]
    pub entry: NewsEntry,
    pub creator: Creator,
}

#[derive(Debug, Serialize)]
pub struct EntryListResponse {
    pub success: bool,
    pub entries: Vec<EntryRecord>,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub success: bool,
    pub entry: EntryRecord,
}

fn parse_entry_id(req: &Request) -> Result<uuid::Uuid, ApiError> {
    let raw = req
        .param::<String>("entry_id")
        .ok_or_else(|| ApiError::BadRequest("Entry ID required".to_string()))?;
    uuid::Uuid::parse_str(&raw)
        .map_err(|_e| ApiError::BadRequest("Invalid entry ID format".to_string()))
}

/// ## Summary
/// GET /api/news - List news entries, newest first.
///
/// A `limit` query parameter caps the feed length; non-positive or missing
/// values fall back to the default of 50.
///
/// ## Errors
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 503 if no database connection is available
#[handler]
async fn list_entries_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<EntryListResponse>, ApiError> {
    use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    require_user(depot)?;

    let limit = req
        .query::<i64>("limit")
        .filter(|&l| l > 0)
        .unwrap_or(DEFAULT_FEED_LIMIT);

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let rows: Vec<(NewsEntry, Creator)> = schema::news_entry::table
        .inner_join(schema::app_user::table)
        .order(schema::news_entry::created_at.desc())
        .limit(limit)
        .select((NewsEntry::as_select(), Creator::as_select()))
        .load(&mut conn)
        .await?;

    let entries = rows
        .into_iter()
        .map(|(entry, creator)| EntryRecord { entry, creator })
        .collect();

    Ok(Json(EntryListResponse {
        success: true,
        entries,
    }))
}

/// ## Summary
/// GET /`api/news/:entry_id` - Fetch one news entry.
///
/// ## Errors
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 404 if the entry does not exist
#[handler]
async fn get_entry_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<EntryResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    require_user(depot)?;
    let entry_id = parse_entry_id(req)?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let (entry, creator) = schema::news_entry::table
        .inner_join(schema::app_user::table)
        .filter(schema::news_entry::id.eq(entry_id))
        .select((NewsEntry::as_select(), Creator::as_select()))
        .first::<(NewsEntry, Creator)>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("News entry not found".to_string()))?;

    Ok(Json(EntryResponse {
        success: true,
        entry: EntryRecord { entry, creator },
    }))
}

/// ## Summary
/// POST /api/news - Create a news entry authored by the caller.
///
/// ## Errors
/// Returns HTTP 400 if the payload is malformed or fails validation
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 503 if no database connection is available
#[handler]
async fn create_entry_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<EntryResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::{db::schema, model::news::NewNewsEntry};

    tracing::debug!("Processing create news entry request");

    let user_id = require_user(depot)?.sub;

    let payload: NewsEntryPayload = req.parse_json().await.map_err(|e| {
        error!(error = ?e, "Failed to parse create news entry request");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;
    payload.validate()?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let creator = schema::app_user::table
        .filter(schema::app_user::id.eq(user_id))
        .select(Creator::as_select())
        .first::<Creator>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    let new_entry = NewNewsEntry {
        id: uuid::Uuid::now_v7(),
        title: &payload.title,
        content: &payload.content,
        created_by: user_id,
    };

    let entry = diesel::insert_into(schema::news_entry::table)
        .values(&new_entry)
        .returning(NewsEntry::as_select())
        .get_result::<NewsEntry>(&mut conn)
        .await?;

    tracing::info!(entry_id = %entry.id, created_by = %user_id, "News entry created");

    Ok(Json(EntryResponse {
        success: true,
        entry: EntryRecord { entry, creator },
    }))
}

/// ## Summary
/// PUT /`api/news/:entry_id` - Update a news entry.
///
/// Only the author or an admin may edit an entry.
///
/// ## Errors
/// Returns HTTP 400 if the payload is malformed or fails validation
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 403 if the caller is neither the author nor an admin
/// Returns HTTP 404 if the entry does not exist
#[handler]
async fn update_entry_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<EntryResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::{db::schema, model::news::NewsEntryChangeset};

    tracing::debug!("Processing update news entry request");

    let claims = require_user(depot)?.clone();
    let entry_id = parse_entry_id(req)?;

    let payload: UpdateNewsEntryPayload = req.parse_json().await.map_err(|e| {
        error!(error = ?e, "Failed to parse update news entry request");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;
    payload.validate()?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let existing = schema::news_entry::table
        .filter(schema::news_entry::id.eq(entry_id))
        .select(NewsEntry::as_select())
        .first::<NewsEntry>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("News entry not found".to_string()))?;

    if existing.created_by != claims.sub && !claims.role.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only edit your own news entries".to_string(),
        ));
    }

    let changeset = NewsEntryChangeset {
        title: payload.title,
        content: payload.content,
        updated_at: Some(chrono::Utc::now()),
    };

    let entry = diesel::update(schema::news_entry::table.filter(schema::news_entry::id.eq(entry_id)))
        .set(&changeset)
        .returning(NewsEntry::as_select())
        .get_result::<NewsEntry>(&mut conn)
        .await?;

    let creator = schema::app_user::table
        .filter(schema::app_user::id.eq(entry.created_by))
        .select(Creator::as_select())
        .first::<Creator>(&mut conn)
        .await?;

    tracing::info!(entry_id = %entry.id, updated_by = %claims.sub, "News entry updated");

    Ok(Json(EntryResponse {
        success: true,
        entry: EntryRecord { entry, creator },
    }))
}

/// ## Summary
/// DELETE /`api/news/:entry_id` - Delete a news entry.
///
/// Only the author or an admin may delete an entry.
///
/// ## Errors
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 403 if the caller is neither the author nor an admin
/// Returns HTTP 404 if the entry does not exist
#[handler]
async fn delete_entry_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<MessageResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    tracing::debug!("Processing delete news entry request");

    let claims = require_user(depot)?.clone();
    let entry_id = parse_entry_id(req)?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let existing = schema::news_entry::table
        .filter(schema::news_entry::id.eq(entry_id))
        .select(NewsEntry::as_select())
        .first::<NewsEntry>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("News entry not found".to_string()))?;

    if existing.created_by != claims.sub && !claims.role.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only delete your own news entries".to_string(),
        ));
    }

    diesel::delete(schema::news_entry::table.filter(schema::news_entry::id.eq(entry_id)))
        .execute(&mut conn)
        .await?;

    tracing::info!(entry_id = %entry_id, deleted_by = %claims.sub, "News entry deleted");

    Ok(Json(MessageResponse::ok("News entry deleted")))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(NEWS_ROUTE_COMPONENT)
        .get(list_entries_handler)
        .post(create_entry_handler)
        .push(
            Router::with_path("<entry_id>")
                .get(get_entry_handler)
                .put(update_entry_handler)
                .delete(delete_entry_handler),
        )
}
