use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};

#[derive(
    Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations, serde::Serialize,
)]
#[diesel(table_name = schema::calendar_event)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::user::User, foreign_key = created_by))]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub location: Option<String>,
    pub all_day: bool,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub created_by: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::calendar_event)]
pub struct NewCalendarEvent<'a> {
    pub id: uuid::Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub location: Option<&'a str>,
    pub all_day: bool,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<&'a str>,
    pub created_by: uuid::Uuid,
}

/// Partial update; `None` fields are left untouched. Nullable columns use a
/// double `Option` so callers can distinguish "don't touch" from "set NULL".
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::calendar_event)]
pub struct CalendarEventChangeset {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    pub location: Option<Option<String>>,
    pub all_day: Option<bool>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<Option<String>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
