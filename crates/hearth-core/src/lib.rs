//! Hearth family hub server - shared configuration, errors, and types.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
