//! Rota ML - delivery routes, expenses and monthly loose-package metrics
//!
//! HTTP API over a pluggable record store (SQLite or MongoDB).

pub mod cli;
pub mod config;
pub mod db;
pub mod defaults;
pub mod error;
pub mod handlers;
pub mod services;
pub mod types;
