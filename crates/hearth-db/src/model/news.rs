use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};

#[derive(
    Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations, serde::Serialize,
)]
#[diesel(table_name = schema::news_entry)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::user::User, foreign_key = created_by))]
#[serde(rename_all = "camelCase")]
pub struct NewsEntry {
    pub id: uuid::Uuid,
    pub title: String,
    pub content: String,
    pub created_by: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::news_entry)]
pub struct NewNewsEntry<'a> {
    pub id: uuid::Uuid,
    pub title: &'a str,
    pub content: &'a str,
    pub created_by: uuid::Uuid,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::news_entry)]
pub struct NewsEntryChangeset {
    pub title: Option<String>,
    pub content: Option<String>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
