//! Database queries (SQL backend)

pub mod expense;
pub mod route;
