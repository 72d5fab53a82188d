//! Hearth family hub server - database schema, models, and connection pool.

pub mod db;
pub mod error;
pub mod model;
