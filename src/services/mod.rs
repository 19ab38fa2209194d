//! Business services

pub mod coerce;
pub mod import_processor;
pub mod metrics;
pub mod month_window;
