//! HTTP message types

use serde::{Deserialize, Serialize};

/// Store-assigned identifier: integer row id (SQL) or ObjectId hex (document)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{}", id),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// `year` / `month` query string, kept raw so junk values degrade to "absent"
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthQuery {
    pub year: Option<String>,
    pub month: Option<String>,
}

/// Plain `{ok: true}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Result of an update or delete by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangesResponse {
    pub ok: bool,
    pub changes: u64,
}

impl ChangesResponse {
    pub fn new(changes: u64) -> Self {
        Self { ok: true, changes }
    }
}

/// Monthly metric result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricResponse {
    pub total: f64,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: message.into(),
            code: code.into(),
        }
    }
}

/// Service index served at `/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    pub name: String,
    pub status: String,
    pub endpoints: Vec<String>,
}

/// Database health at `/health/db`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbHealthResponse {
    pub ok: bool,
    pub db: String,
    pub backend: String,
    pub collections: Vec<String>,
}
