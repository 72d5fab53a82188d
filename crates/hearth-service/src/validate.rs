//! Typed request payloads and their validation rules.
//!
//! Payloads are decoded into concrete structs and validated before any domain
//! logic runs. Validation failures are returned as structured field errors,
//! never raised.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hearth_db::db::enums::Role;

/// A single failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Payload validation evaluated before any domain logic.
pub trait Validate {
    /// ## Errors
    /// Returns the list of failed rules; an empty error list is never returned.
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

fn check_len(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) {
    if value.chars().count() < min {
        let message = if min <= 1 {
            format!("{field} is required")
        } else {
            format!("{field} must be at least {min} characters")
        };
        errors.push(FieldError::new(field, message));
    } else if value.chars().count() > max {
        errors.push(FieldError::new(
            field,
            format!("{field} must be at most {max} characters"),
        ));
    }
}

fn check_opt_len(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<&str>,
    max: usize,
) {
    if let Some(value) = value {
        if value.chars().count() > max {
            errors.push(FieldError::new(
                field,
                format!("{field} must be at most {max} characters"),
            ));
        }
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterPayload {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_len(&mut errors, "name", &self.name, 2, 100);
        check_len(&mut errors, "email", &self.email, 1, 100);
        check_len(&mut errors, "password", &self.password, 6, 100);
        finish(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

impl Validate for LoginPayload {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.email.is_empty() {
            errors.push(FieldError::new("email", "email is required"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "password is required"));
        }
        finish(errors)
    }
}

fn default_role() -> Role {
    Role::Member
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

impl Validate for CreateUserPayload {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_len(&mut errors, "name", &self.name, 2, 100);
        check_len(&mut errors, "email", &self.email, 1, 100);
        check_len(&mut errors, "password", &self.password, 6, 100);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl Validate for UpdateUserPayload {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_len(&mut errors, "name", name, 2, 100);
        }
        if let Some(email) = &self.email {
            check_len(&mut errors, "email", email, 1, 100);
        }
        if let Some(password) = &self.password {
            check_len(&mut errors, "password", password, 6, 100);
        }
        finish(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventPayload {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_pattern: Option<String>,
}

impl Validate for CalendarEventPayload {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_len(&mut errors, "title", &self.title, 1, 200);
        check_opt_len(&mut errors, "description", self.description.as_deref(), 2000);
        check_opt_len(&mut errors, "location", self.location.as_deref(), 200);
        finish(errors)
    }
}

/// Partial event update. `Option<Option<_>>` distinguishes an omitted
/// nullable field from an explicit null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCalendarEventPayload {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_explicit_null")]
    pub description: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_explicit_null")]
    pub location: Option<Option<String>>,
    pub all_day: Option<bool>,
    pub is_recurring: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_explicit_null")]
    pub recurrence_pattern: Option<Option<String>>,
}

impl Validate for UpdateCalendarEventPayload {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            check_len(&mut errors, "title", title, 1, 200);
        }
        if let Some(description) = &self.description {
            check_opt_len(&mut errors, "description", description.as_deref(), 2000);
        }
        if let Some(location) = &self.location {
            check_opt_len(&mut errors, "location", location.as_deref(), 200);
        }
        finish(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelPlanPayload {
    pub title: String,
    pub destination: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub itinerary: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
}

impl Validate for TravelPlanPayload {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_len(&mut errors, "title", &self.title, 1, 200);
        check_len(&mut errors, "destination", &self.destination, 1, 200);
        check_opt_len(&mut errors, "description", self.description.as_deref(), 2000);
        check_opt_len(&mut errors, "itinerary", self.itinerary.as_deref(), 10000);
        if let Some(budget) = self.budget {
            if budget <= 0.0 {
                errors.push(FieldError::new("budget", "budget must be positive"));
            }
        }
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTravelPlanPayload {
    pub title: Option<String>,
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "deserialize_explicit_null")]
    pub description: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_explicit_null")]
    pub itinerary: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_explicit_null")]
    pub budget: Option<Option<f64>>,
}

impl Validate for UpdateTravelPlanPayload {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            check_len(&mut errors, "title", title, 1, 200);
        }
        if let Some(destination) = &self.destination {
            check_len(&mut errors, "destination", destination, 1, 200);
        }
        if let Some(description) = &self.description {
            check_opt_len(&mut errors, "description", description.as_deref(), 2000);
        }
        if let Some(itinerary) = &self.itinerary {
            check_opt_len(&mut errors, "itinerary", itinerary.as_deref(), 10000);
        }
        if let Some(Some(budget)) = self.budget {
            if budget <= 0.0 {
                errors.push(FieldError::new("budget", "budget must be positive"));
            }
        }
        finish(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsEntryPayload {
    pub title: String,
    pub content: String,
}

impl Validate for NewsEntryPayload {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_len(&mut errors, "title", &self.title, 1, 200);
        check_len(&mut errors, "content", &self.content, 1, 10000);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNewsEntryPayload {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl Validate for UpdateNewsEntryPayload {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            check_len(&mut errors, "title", title, 1, 200);
        }
        if let Some(content) = &self.content {
            check_len(&mut errors, "content", content, 1, 10000);
        }
        finish(errors)
    }
}

/// Maps a present-but-null JSON field to `Some(None)` and an absent field
/// (via `#[serde(default)]`) to `None`.
fn deserialize_explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_payload_rules() {
        let payload = RegisterPayload {
            name: "J".to_string(),
            email: String::new(),
            password: "short".to_string(),
        };

        let errors = payload.validate().expect_err("should fail");
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email", "password"]);
    }

    #[test]
    fn test_register_payload_accepts_valid_input() {
        let payload = RegisterPayload {
            name: "John Doe".to_string(),
            email: "john@family-hub.test".to_string(),
            password: "secret123".to_string(),
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_event_payload_limits() {
        let payload = CalendarEventPayload {
            title: "x".repeat(201),
            description: Some("y".repeat(2001)),
            start_date: chrono::Utc::now(),
            end_date: chrono::Utc::now(),
            location: None,
            all_day: false,
            is_recurring: false,
            recurrence_pattern: None,
        };

        let errors = payload.validate().expect_err("should fail");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_update_payload_distinguishes_null_from_absent() {
        let omitted: UpdateCalendarEventPayload =
            serde_json::from_str(r#"{"title":"New"}"#).expect("decodes");
        assert_eq!(omitted.description, None);

        let nulled: UpdateCalendarEventPayload =
            serde_json::from_str(r#"{"description":null}"#).expect("decodes");
        assert_eq!(nulled.description, Some(None));
    }

    #[test]
    fn test_travel_budget_must_be_positive() {
        let payload = TravelPlanPayload {
            title: "Trip".to_string(),
            destination: "Lisbon".to_string(),
            description: None,
            start_date: chrono::Utc::now(),
            end_date: chrono::Utc::now(),
            itinerary: None,
            budget: Some(-20.0),
        };

        let errors = payload.validate().expect_err("should fail");
        assert_eq!(errors[0].field, "budget");
    }

    #[test]
    fn test_create_user_defaults_to_member_role() {
        let payload: CreateUserPayload = serde_json::from_str(
            r#"{"name":"Jane Smith","email":"jane@family-hub.test","password":"secret123"}"#,
        )
        .expect("decodes");
        assert_eq!(payload.role, Role::Member);
    }
}
