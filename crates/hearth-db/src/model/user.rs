use crate::db::{enums::Role, schema};
use diesel::{pg::Pg, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, serde::Serialize)]
#[diesel(table_name = schema::app_user)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::app_user)]
pub struct NewUser<'a> {
    pub id: uuid::Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::app_user)]
pub struct UserChangeset {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Creator projection joined into event/plan/entry responses.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, serde::Serialize)]
#[diesel(table_name = schema::app_user)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
}
