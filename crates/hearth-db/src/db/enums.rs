//! Database enum types with Diesel serialization.
//!
//! Each enum implements `ToSql` and `FromSql` for automatic conversion between
//! Rust and `PostgreSQL` TEXT columns backed by CHECK constraints.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;

/// User role classification.
///
/// Maps to the `app_user.role` CHECK constraint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsExpression,
    FromSqlRow,
    serde::Serialize,
    serde::Deserialize,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl ToSql<Text, Pg> for Role {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for Role {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"admin" => Ok(Self::Admin),
            b"member" => Ok(Self::Member),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl Role {
    /// Returns the database string representation of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = hearth_core::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(hearth_core::error::CoreError::InvalidInput(format!(
                "Unknown role: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test_log::test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Member] {
            assert_eq!(Role::from_str(role.as_str()).expect("parses"), role);
        }
        assert!(Role::from_str("root").is_err());
    }

    #[test_log::test]
    fn test_role_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Role::Admin).expect("serializes"),
            "\"admin\""
        );
        let parsed: Role = serde_json::from_str("\"member\"").expect("deserializes");
        assert_eq!(parsed, Role::Member);
    }
}
