//! Database configuration and URL resolution.
//!
//! Deployments name their connection settings in several ways. All of
//! them funnel through [`DatabaseConfig::resolve_url`], which applies one
//! documented precedence:
//!
//! 1. `database.url`, then `DATABASE_URL`, then `SQLALCHEMY_DATABASE_URL`
//! 2. a PostgreSQL URL assembled from host, user and password variables
//!    (each with several accepted aliases)
//! 3. the bundled SQLite file

use serde::{Deserialize, Serialize};

use super::default_true;

/// Fallback when nothing is configured
pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/app.db?mode=rwc";

/// Database assembled from PostgreSQL parts when none is named
pub const DEFAULT_POSTGRES_DB: &str = "dailyliferoleplay";

const URL_VARS: &[&str] = &["DATABASE_URL", "SQLALCHEMY_DATABASE_URL"];
const HOST_VARS: &[&str] = &["POSTGRES_HOST", "PGHOST", "PGSQL_HOST", "PSQL_HOST"];
const PORT_VARS: &[&str] = &["POSTGRES_PORT", "PGPORT", "PGSQL_PORT", "PSQL_PORT"];
const USER_VARS: &[&str] = &["POSTGRES_USER", "PGUSER", "PGSQL_USER", "PSQL_USER", "PSQL_User"];
const PASSWORD_VARS: &[&str] = &[
    "POSTGRES_PASSWORD",
    "PGPASSWORD",
    "PGSQL_PASS",
    "PSQL_PASS",
    "PSQL_Pass",
];
const DB_VARS: &[&str] = &["POSTGRES_DB", "PGDATABASE", "PGSQL_DB", "PSQL_DB"];
const SSLMODE_VARS: &[&str] = &[
    "POSTGRES_SSLMODE",
    "PGSSLMODE",
    "PGSQL_SSLMODE",
    "PSQL_SSLMODE",
];

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Explicit connection URL; wins over every environment alias
    #[serde(default, skip_serializing)]
    pub url: Option<String>,

    /// Maximum number of concurrent database connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Whether to run pending migrations on startup (default: true)
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    /// Resolve the connection URL from the process environment
    pub fn resolve_url_from_env(&self) -> String {
        self.resolve_url(|name| std::env::var(name).ok())
    }

    /// Resolve the connection URL with the given variable lookup
    pub fn resolve_url(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        let explicit = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .or_else(|| first_set(&lookup, URL_VARS));

        if let Some(url) = explicit {
            return normalize_scheme(&url);
        }

        postgres_from_parts(&lookup).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }
}

/// First alias with a non-blank value
fn first_set(lookup: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| lookup(name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn postgres_from_parts(lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    let host = first_set(lookup, HOST_VARS)?;
    let user = first_set(lookup, USER_VARS)?;
    let password = first_set(lookup, PASSWORD_VARS)?;
    let port = first_set(lookup, PORT_VARS).unwrap_or_else(|| "5432".to_string());
    let database = first_set(lookup, DB_VARS).unwrap_or_else(|| DEFAULT_POSTGRES_DB.to_string());

    let mut url = format!(
        "postgres://{}:{}@{host}:{port}/{}",
        encode(&user),
        encode(&password),
        encode(&database)
    );
    if let Some(mode) = first_set(lookup, SSLMODE_VARS) {
        url.push_str(&format!("?sslmode={}", encode(&mode)));
    }
    Some(url)
}

/// Rewrite driver-qualified schemes such as `postgresql+psycopg://`
fn normalize_scheme(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) if scheme.to_lowercase().starts_with("postgresql+") => {
            format!("postgres://{rest}")
        },
        _ => url.to_string(),
    }
}

/// Percent-encode everything outside the unreserved set
fn encode(input: &str) -> String {
    let mut result = String::with_capacity(input.len() * 3);
    for b in input.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(char::from(b));
            },
            _ => result.push_str(&format!("%{b:02X}")),
        }
    }
    result
}
