//! Travel plan endpoints.

use salvo::{Depot, Request, Router, handler, writing::Json};
use serde::Serialize;
use tracing::error;

use super::MessageResponse;
use super::error::ApiError;
use crate::db_handler::get_db_from_depot;
use hearth_core::constants::TRAVEL_ROUTE_COMPONENT;
use hearth_db::model::{travel::TravelPlan, user::Creator};
use hearth_service::auth::depot::require_user;
use hearth_service::validate::{TravelPlanPayload, UpdateTravelPlanPayload, Validate};

/// A plan with its creator joined in, as sent over the wire.
#[derive(Debug, Serialize)]
pub struct PlanRecord {
    #[serde(flatten)]
    pub plan: TravelPlan,
    pub creator: Creator,
}

#[derive(Debug, Serialize)]
pub struct PlanListResponse {
    pub success: bool,
    pub plans: Vec<PlanRecord>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub success: bool,
    pub plan: PlanRecord,
}

fn parse_plan_id(req: &Request) -> Result<uuid::Uuid, ApiError> {
    let raw = req
        .param::<String>("plan_id")
        .ok_or_else(|| ApiError::BadRequest("Plan ID required".to_string()))?;
    uuid::Uuid::parse_str(&raw)
        .map_err(|_e| ApiError::BadRequest("Invalid plan ID format".to_string()))
}

/// ## Summary
/// GET /api/travel - List travel plans, most recent departure first.
///
/// ## Errors
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 503 if no database connection is available
#[handler]
async fn list_plans_handler(depot: &mut Depot) -> Result<Json<PlanListResponse>, ApiError> {
    use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    require_user(depot)?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let rows: Vec<(TravelPlan, Creator)> = schema::travel_plan::table
        .inner_join(schema::app_user::table)
        .order(schema::travel_plan::start_date.desc())
        .select((TravelPlan::as_select(), Creator::as_select()))
        .load(&mut conn)
        .await?;

    let plans = rows
        .into_iter()
        .map(|(plan, creator)| PlanRecord { plan, creator })
        .collect();

    Ok(Json(PlanListResponse {
        success: true,
        plans,
    }))
}

/// ## Summary
/// GET /`api/travel/:plan_id` - Fetch one travel plan.
///
/// ## Errors
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 404 if the plan does not exist
#[handler]
async fn get_plan_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<PlanResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    require_user(depot)?;
    let plan_id = parse_plan_id(req)?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let (plan, creator) = schema::travel_plan::table
        .inner_join(schema::app_user::table)
        .filter(schema::travel_plan::id.eq(plan_id))
        .select((TravelPlan::as_select(), Creator::as_select()))
        .first::<(TravelPlan, Creator)>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Travel plan not found".to_string()))?;

    Ok(Json(PlanResponse {
        success: true,
        plan: PlanRecord { plan, creator },
    }))
}

/// ## Summary
/// POST /api/travel - Create a travel plan owned by the caller.
///
/// ## Errors
/// Returns HTTP 400 if the payload is malformed or fails validation
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 503 if no database connection is available
#[handler]
async fn create_plan_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<PlanResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::{db::schema, model::travel::NewTravelPlan};

    tracing::debug!("Processing create travel plan request");

    let user_id = require_user(depot)?.sub;

    let payload: TravelPlanPayload = req.parse_json().await.map_err(|e| {
        error!(error = ?e, "Failed to parse create travel plan request");
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

    let new_plan = NewTravelPlan {
        id: uuid::Uuid::now_v7(),
        title: &payload.title,
        destination: &payload.destination,
        description: payload.description.as_deref(),
        start_date: payload.start_date,
        end_date: payload.end_date,
        itinerary: payload.itinerary.as_deref(),
        budget: payload.budget,
        created_by: user_id,
    };

    let plan = diesel::insert_into(schema::travel_plan::table)
        .values(&new_plan)
        .returning(TravelPlan::as_select())
        .get_result::<TravelPlan>(&mut conn)
        .await?;

    tracing::info!(plan_id = %plan.id, created_by = %user_id, "Travel plan created");

    Ok(Json(PlanResponse {
        success: true,
        plan: PlanRecord { plan, creator },
    }))
}

/// ## Summary
/// PUT /`api/travel/:plan_id` - Update a travel plan.
///
/// Only the creator or an admin may edit a plan.
///
/// ## Errors
/// Returns HTTP 400 if the payload is malformed or fails validation
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 403 if the caller is neither the creator nor an admin
/// Returns HTTP 404 if the plan does not exist
#[handler]
async fn update_plan_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<PlanResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::{db::schema, model::travel::TravelPlanChangeset};

    tracing::debug!("Processing update travel plan request");

    let claims = require_user(depot)?.clone();
    let plan_id = parse_plan_id(req)?;

    let payload: UpdateTravelPlanPayload = req.parse_json().await.map_err(|e| {
        error!(error = ?e, "Failed to parse update travel plan request");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;
    payload.validate()?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let existing = schema::travel_plan::table
        .filter(schema::travel_plan::id.eq(plan_id))
        .select(TravelPlan::as_select())
        .first::<TravelPlan>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Travel plan not found".to_string()))?;

    if existing.created_by != claims.sub && !claims.role.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only edit your own travel plans".to_string(),
        ));
    }

    let changeset = TravelPlanChangeset {
        title: payload.title,
        destination: payload.destination,
        description: payload.description,
        start_date: payload.start_date,
        end_date: payload.end_date,
        itinerary: payload.itinerary,
        budget: payload.budget,
        updated_at: Some(chrono::Utc::now()),
    };

    let plan =
        diesel::update(schema::travel_plan::table.filter(schema::travel_plan::id.eq(plan_id)))
            .set(&changeset)
            .returning(TravelPlan::as_select())
            .get_result::<TravelPlan>(&mut conn)
            .await?;

    let creator = schema::app_user::table
        .filter(schema::app_user::id.eq(plan.created_by))
        .select(Creator::as_select())
        .first::<Creator>(&mut conn)
        .await?;

    tracing::info!(plan_id = %plan.id, updated_by = %claims.sub, "Travel plan updated");

    Ok(Json(PlanResponse {
        success: true,
        plan: PlanRecord { plan, creator },
    }))
}

/// ## Summary
/// DELETE /`api/travel/:plan_id` - Delete a travel plan.
///
/// Only the creator or an admin may delete a plan.
///
/// ## Errors
/// Returns HTTP 401 if not authenticated
/// Returns HTTP 403 if the caller is neither the creator nor an admin
/// Returns HTTP 404 if the plan does not exist
#[handler]
async fn delete_plan_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<MessageResponse>, ApiError> {
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
    use diesel_async::RunQueryDsl;
    use hearth_db::db::schema;

    tracing::debug!("Processing delete travel plan request");

    let claims = require_user(depot)?.clone();
    let plan_id = parse_plan_id(req)?;

    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let existing = schema::travel_plan::table
        .filter(schema::travel_plan::id.eq(plan_id))
        .select(TravelPlan::as_select())
        .first::<TravelPlan>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Travel plan not found".to_string()))?;

    if existing.created_by != claims.sub && !claims.role.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only delete your own travel plans".to_string(),
        ));
    }

    diesel::delete(schema::travel_plan::table.filter(schema::travel_plan::id.eq(plan_id)))
        .execute(&mut conn)
        .await?;

    tracing::info!(plan_id = %plan_id, deleted_by = %claims.sub, "Travel plan deleted");

    Ok(Json(MessageResponse::ok("Travel plan deleted")))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(TRAVEL_ROUTE_COMPONENT)
        .get(list_plans_handler)
        .post(create_plan_handler)
        .push(
            Router::with_path("<plan_id>")
                .get(get_plan_handler)
                .put(update_plan_handler)
                .delete(delete_plan_handler),
        )
}
