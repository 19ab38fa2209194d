//! Configuration management

use std::fmt;
use std::str::FromStr;

use anyhow::{self, Context, Result};

use crate::defaults::{DEFAULT_AVULSO_UNIT, DEFAULT_DATABASE_NAME, DEFAULT_LOGS_DIR, DEFAULT_PORT};

/// Persistence technology behind the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Relational store speaking parameterized SQL (SQLite dialect)
    Sql,
    /// Document store (MongoDB)
    Document,
}

impl StoreBackend {
    /// Pick a backend from the connection string scheme
    pub fn infer(url: &str) -> Option<Self> {
        let lower = url.trim().to_ascii_lowercase();
        if lower.starts_with("sqlite:") {
            Some(Self::Sql)
        } else if lower.starts_with("mongodb://") || lower.starts_with("mongodb+srv://") {
            Some(Self::Document)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Document => "document",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sql" | "sqlite" => Ok(Self::Sql),
            "document" | "mongo" | "mongodb" => Ok(Self::Document),
            other => anyhow::bail!("unknown STORE_BACKEND '{}' (expected 'sql' or 'document')", other),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to open the record store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub database_name: String,
    pub backend: StoreBackend,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection string; `None` leaves the store unconfigured
    pub database_url: Option<String>,

    /// Database name (document backend, reported by /health/db)
    pub database_name: String,

    /// Backend selected for `database_url`
    pub backend: Option<StoreBackend>,

    /// Unit value for the monthly loose-package metric
    pub avulso_unit: f64,

    /// HTTP listen port
    pub port: u16,

    /// Directory for the rolling log file
    pub logs_dir: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL").or_else(|| non_empty("MONGODB_URI"));

        let database_name = non_empty("DATABASE_NAME")
            .or_else(|| non_empty("MONGODB_DB"))
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());

        let explicit_backend = non_empty("STORE_BACKEND")
            .map(|raw| raw.parse::<StoreBackend>())
            .transpose()?;

        let backend = match (&database_url, explicit_backend) {
            (None, _) => None,
            (Some(_), Some(backend)) => Some(backend),
            (Some(url), None) => Some(StoreBackend::infer(url).with_context(|| {
                format!(
                    "cannot infer store backend from DATABASE_URL '{}' (set STORE_BACKEND)",
                    mask_credentials(url)
                )
            })?),
        };

        let avulso_unit = match non_empty("AVULSO_UNIT") {
            Some(raw) => {
                let unit: f64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("AVULSO_UNIT must be a number, got '{}'", raw))?;
                if !unit.is_finite() {
                    anyhow::bail!("AVULSO_UNIT must be finite, got '{}'", raw);
                }
                unit
            }
            None => DEFAULT_AVULSO_UNIT,
        };

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got '{}'", raw))?,
            None => DEFAULT_PORT,
        };

        let logs_dir = non_empty("LOGS_DIR").unwrap_or_else(|| DEFAULT_LOGS_DIR.to_string());

        Ok(Self {
            database_url,
            database_name,
            backend,
            avulso_unit,
            port,
            logs_dir,
        })
    }

    /// Store settings, or `None` when no database is configured
    pub fn store(&self) -> Option<StoreConfig> {
        match (&self.database_url, self.backend) {
            (Some(url), Some(backend)) => Some(StoreConfig {
                url: url.clone(),
                database_name: self.database_name.clone(),
                backend,
            }),
            _ => None,
        }
    }
}

/// Hide the password part of a connection string for display
pub fn mask_credentials(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest = &url[scheme_end + 3..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => {
            let userinfo = &rest[..at];
            let user = userinfo.split(':').next().unwrap_or_default();
            format!("{}://{}:***{}", &url[..scheme_end], user, &rest[at..])
        }
        None => url.to_string(),
    }
}
