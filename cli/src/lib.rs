//! # LastLayer CLI
//!
//! Terminal front-end over the engine: loads configuration, sets up logging
//! and dispatches subcommands to the theme repository and restore points.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
