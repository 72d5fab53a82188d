//! Hearth family hub server - domain services.
//!
//! Recurrence expansion for the calendar, password hashing, JWT issuance and
//! verification, and request payload validation.

pub mod auth;
pub mod calendar;
pub mod error;
pub mod validate;
