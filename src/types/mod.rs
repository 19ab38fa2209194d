//! Type definitions

pub mod expense;
pub mod import;
pub mod messages;
pub mod route;

pub use expense::*;
pub use import::*;
pub use messages::*;
pub use route::*;
