//! Hearth family hub server - HTTP application.

pub mod app;
pub mod config;
pub mod db_handler;
pub mod error;
pub mod middleware;
pub mod token_handler;
