use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};

#[derive(
    Debug, Clone, PartialEq, Identifiable, Queryable, Selectable, Associations, serde::Serialize,
)]
#[diesel(table_name = schema::travel_plan)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::user::User, foreign_key = created_by))]
#[serde(rename_all = "camelCase")]
pub struct TravelPlan {
    pub id: uuid::Uuid,
    pub title: String,
    pub destination: String,
    pub description: Option<String>,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub itinerary: Option<String>,
    pub budget: Option<f64>,
    pub created_by: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = schema::travel_plan)]
pub struct NewTravelPlan<'a> {
    pub id: uuid::Uuid,
    pub title: &'a str,
    pub destination: &'a str,
    pub description: Option<&'a str>,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub itinerary: Option<&'a str>,
    pub budget: Option<f64>,
    pub created_by: uuid::Uuid,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::travel_plan)]
pub struct TravelPlanChangeset {
    pub title: Option<String>,
    pub destination: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    pub itinerary: Option<Option<String>>,
    pub budget: Option<Option<f64>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
