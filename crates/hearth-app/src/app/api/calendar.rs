//! Calendar event endpoints.
//!
//! Listing expands recurring events server side, so clients always receive
//! concrete dated occurrences alongside one-off events.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use salvo::{Depot, Request, Router, handler, writing::Json};
use serde::Serialize;
use tracing::error;

use super::MessageResponse;
use super::error::ApiError;
use crate::db_handler::get_db_from_depot;
use hearth_core::constants::CALENDAR_ROUTE_COMPONENT;
use hearth_core::types::ViewMode;
use hearth_db::model::{calendar::CalendarEvent, user::Creator};
use hearth_service::auth::depot::require_user;
use hearth_service::calendar::recurrence::{
    EventRecord, expand_recurring_events, get_calendar_range,
};
use hearth_service::validate::{CalendarEventPayload, UpdateCalendarEventPayload, Validate};

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub success: bool,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub success: bool,
    pub event: EventRecord,
}

/// Joins the creator projection into the wire-shape record. Row fields the
/// expansion engine does not model (creator, timestamps) ride along in the
/// record's extra fields.
fn to_record(event: CalendarEvent, creator: Creator) -> Result<EventRecord, ApiError> {
    let mut value = serde_json::to_value(&event)?;
    if let serde_json::Value::Object(map) = &mut value {
        map.insert("creator".to_string(), serde_json::to_value(&creator)?);
    }
    Ok(serde_json::from_value(value)?)
}

fn parse_event_id(req: &Request) -> Result<uuid::Uuid, ApiError> {
    let raw = req
        .param::<String>("event_id")
        .ok_or_else(|| ApiError::BadRequest("Event ID required".to_string()))?;
    uuid::Uuid::parse_str(&raw)
        .map_err(|_e| ApiError::BadRequest("Invalid event ID format".to_string()))
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_e| ApiError::BadRequest(format!("Invalid date: {raw}")))
}

/// Resolves the display window: an explicit `startDate`/`endDate` pair wins,
/// otherwise the window is derived from `date` and `view` (defaulting to a
/// month view around now).
fn resolve_window(req: &mut Request) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    let start = req.query::<String>("startDate");
    let end = req.query::<String>("endDate");

    if let (Some(start), Some(end)) = (start, end) {
        let range_start = parse_instant(&start)?;
        let range_end = parse_instant(&end)?;
        if range_end < range_start {
            return Err(ApiError::BadRequest(
                "endDate must not precede startDate".to_string(),
            ));
        }
        return Ok((range_start, range_end));
    }

    let pivot = match req.query::<String>("date") {
        Some(raw) => parse_instant(&raw)?,
        None => Utc::now(),
    };

    let view = match req.query::<String>("view") {
        Some(raw) => raw
            .parse::<ViewMode>()
            .map_err(|_e| ApiError::BadRequest(format!("Invalid view mode: {raw}")))?,
        None => ViewMode::Month,
    };

    Ok(get_calendar_range(pivot, view))
}

/// ## Summary
/// GET /api/calendar - List events overlapping the display window, with
/// recurring events expanded into occurrences.
///
/// Recurring events are always fetched regardless of their stored dates; the
/// expansion decides which occurrences fall near the window.
///
/// ## Errors
/// Returns HTTP 400 if the window parameters are malformed
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 503 if no database connection is available
#[handler]
async fn list_events_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<EventListResponse>, ApiError> {
    use diesel::{BoolExpressionMethods, ExpressionMethods, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    require_user(depot)?;
    let (range_start, range_end) = resolve_window(req)?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let rows: Vec<(CalendarEvent, Creator)> = schema::calendar_event::table
        .inner_join(schema::app_user::table)
        .filter(
            schema::calendar_event::is_recurring.eq(true).or(schema::calendar_event::start_date
                .le(range_end)
                .and(schema::calendar_event::end_date.ge(range_start))),
        )
        .order(schema::calendar_event::start_date.asc())
        .select((CalendarEvent::as_select(), Creator::as_select()))
        .load(&mut conn)
        .await?;

    let mut records = Vec::with_capacity(rows.len());
    for (event, creator) in rows {
        records.push(to_record(event, creator)?);
    }

    let events = expand_recurring_events(records, range_start, range_end);

    tracing::debug!(
        range_start = %range_start,
        range_end = %range_end,
        count = events.len(),
        "Listed calendar events"
    );

    Ok(Json(EventListResponse {
        success: true,
        events,
    }))
}

/// ## Summary
/// POST /api/calendar - Create an event owned by the caller.
///
/// ## Errors
/// Returns HTTP 400 if the payload is malformed or fails validation
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 503 if no database connection is available
#[handler]
async fn create_event_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<EventResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::{db::schema, model::calendar::NewCalendarEvent};

    tracing::debug!("Processing create event request");

    let user_id = require_user(depot)?.sub;

    let payload: CalendarEventPayload = req.parse_json().await.map_err(|e| {
        error!(error = ?e, "Failed to parse create event request");
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

    let new_event = NewCalendarEvent {
        id: uuid::Uuid::now_v7(),
        title: &payload.title,
        description: payload.description.as_deref(),
        start_date: payload.start_date,
        end_date: payload.end_date,
        location: payload.location.as_deref(),
        all_day: payload.all_day,
        is_recurring: payload.is_recurring,
        recurrence_pattern: payload.recurrence_pattern.as_deref(),
        created_by: user_id,
    };

    let event = diesel::insert_into(schema::calendar_event::table)
        .values(&new_event)
        .returning(CalendarEvent::as_select())
        .get_result::<CalendarEvent>(&mut conn)
        .await?;

    tracing::info!(event_id = %event.id, created_by = %user_id, "Calendar event created");

    Ok(Json(EventResponse {
        success: true,
        event: to_record(event, creator)?,
    }))
}

/// ## Summary
/// PUT /`api/calendar/:event_id` - Update an event.
///
/// Only the creator or an admin may edit an event.
///
/// ## Errors
/// Returns HTTP 400 if the payload is malformed or fails validation
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 403 if the caller is neither the creator nor an admin
/// Returns HTTP 404 if the event does not exist
#[handler]
async fn update_event_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<EventResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::{db::schema, model::calendar::CalendarEventChangeset};

    tracing::debug!("Processing update event request");

    let claims = require_user(depot)?.clone();
    let event_id = parse_event_id(req)?;

    let payload: UpdateCalendarEventPayload = req.parse_json().await.map_err(|e| {
        error!(error = ?e, "Failed to parse update event request");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;
    payload.validate()?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let existing = schema::calendar_event::table
        .filter(schema::calendar_event::id.eq(event_id))
        .select(CalendarEvent::as_select())
        .first::<CalendarEvent>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    if existing.created_by != claims.sub && !claims.role.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only edit your own events".to_string(),
        ));
    }

    let changeset = CalendarEventChangeset {
        title: payload.title,
        description: payload.description,
        start_date: payload.start_date,
        end_date: payload.end_date,
        location: payload.location,
        all_day: payload.all_day,
        is_recurring: payload.is_recurring,
        recurrence_pattern: payload.recurrence_pattern,
        updated_at: Some(Utc::now()),
    };

    let event = diesel::update(
        schema::calendar_event::table.filter(schema::calendar_event::id.eq(event_id)),
    )
    .set(&changeset)
    .returning(CalendarEvent::as_select())
    .get_result::<CalendarEvent>(&mut conn)
    .await?;

    let creator = schema::app_user::table
        .filter(schema::app_user::id.eq(event.created_by))
        .select(Creator::as_select())
        .first::<Creator>(&mut conn)
        .await?;

    tracing::info!(event_id = %event.id, updated_by = %claims.sub, "Calendar event updated");

    Ok(Json(EventResponse {
        success: true,
        event: to_record(event, creator)?,
    }))
}

/// ## Summary
/// DELETE /`api/calendar/:event_id` - Delete an event.
///
/// Only the creator or an admin may delete an event. Deleting a recurring
/// event removes the whole series; occurrences have no rows of their own.
///
/// ## Errors
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 403 if the caller is neither the creator nor an admin
/// Returns HTTP 404 if the event does not exist
#[handler]
async fn delete_event_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<MessageResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    tracing::debug!("Processing delete event request");

    let claims = require_user(depot)?.clone();
    let event_id = parse_event_id(req)?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let existing = schema::calendar_event::table
        .filter(schema::calendar_event::id.eq(event_id))
        .select(CalendarEvent::as_select())
        .first::<CalendarEvent>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    if existing.created_by != claims.sub && !claims.role.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only delete your own events".to_string(),
        ));
    }

    diesel::delete(schema::calendar_event::table.filter(schema::calendar_event::id.eq(event_id)))
        .execute(&mut conn)
        .await?;

    tracing::info!(event_id = %event_id, deleted_by = %claims.sub, "Calendar event deleted");

    Ok(Json(MessageResponse::ok("Event deleted")))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(CALENDAR_ROUTE_COMPONENT)
        .get(list_events_handler)
        .post(create_event_handler)
        .push(
            Router::with_path("<event_id>")
                .put(update_event_handler)
                .delete(delete_event_handler),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test_log::test]
    fn test_parse_instant_accepts_rfc3339_and_bare_dates() {
        let full = parse_instant("2024-06-15T12:30:00Z").expect("parses");
        assert_eq!(
            full,
            Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0)
                .single()
                .expect("valid timestamp")
        );

        let bare = parse_instant("2024-06-15").expect("parses");
        assert_eq!(
            bare,
            Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0)
                .single()
                .expect("valid timestamp")
        );

        assert!(parse_instant("next tuesday").is_err());
    }

    #[test_log::test]
    fn test_to_record_joins_creator_into_wire_shape() {
        let now = Utc
            .with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        let event = CalendarEvent {
            id: uuid::Uuid::now_v7(),
            title: "Picnic".to_string(),
            description: None,
            start_date: now,
            end_date: now + chrono::TimeDelta::hours(2),
            location: Some("Park".to_string()),
            all_day: false,
            is_recurring: false,
            recurrence_pattern: None,
            created_by: uuid::Uuid::now_v7(),
            created_at: now,
            updated_at: now,
        };
        let creator = Creator {
            id: event.created_by,
            name: "Jane Smith".to_string(),
            email: "jane@family-hub.test".to_string(),
        };

        let record = to_record(event.clone(), creator).expect("converts");
        assert_eq!(record.id, event.id.to_string());
        assert_eq!(record.start_date, event.start_date);

        let value = serde_json::to_value(&record).expect("encodes");
        assert_eq!(value["creator"]["name"], "Jane Smith");
        assert_eq!(value["createdBy"], event.created_by.to_string());
        assert_eq!(value["location"], "Park");
        // Marker fields of generated occurrences stay absent on plain events
        assert!(value.get("_isRecurrenceInstance").is_none());
    }
}
