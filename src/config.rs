//! Configuration module - Environment-based configuration
//!
//! All settings come from environment variables (optionally via `.env`).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::error::{TagError, TagResult};
use crate::repositories::DbContext;
use crate::service::TagService;

const DEFAULT_DATABASE_URL: &str = "sqlite://user_tags.db?mode=rwc";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server config
    pub host: String,
    pub port: u16,

    // Storage
    pub db: DbConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: var("TAGS_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "TAGS_PORT", 8080),
            db: DbConfig::from_vars(&var),
        }
    }

    /// Get server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite connection URL.
    pub database_url: String,
    /// Maximum pool connections.
    pub max_connections: u32,
    /// Minimum pool connections.
    pub min_connections: u32,
    /// Connection acquire timeout in seconds.
    pub acquire_timeout_secs: u64,
    /// Idle connection timeout in seconds.
    pub idle_timeout_secs: u64,
    /// How long a statement waits on a locked database, in seconds.
    pub busy_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            busy_timeout_secs: 5,
        }
    }
}

impl DbConfig {
    fn from_vars(var: &impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_or(var, "DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_or(var, "DB_MIN_CONNECTIONS", defaults.min_connections),
            acquire_timeout_secs: parse_or(
                var,
                "DB_ACQUIRE_TIMEOUT",
                defaults.acquire_timeout_secs,
            ),
            idle_timeout_secs: parse_or(var, "DB_IDLE_TIMEOUT", defaults.idle_timeout_secs),
            busy_timeout_secs: parse_or(var, "DB_BUSY_TIMEOUT", defaults.busy_timeout_secs),
        }
    }

    /// Connect using this configuration.
    pub async fn connect(&self) -> TagResult<SqlitePool> {
        let options = SqliteConnectOptions::from_str(&self.database_url)
            .map_err(TagError::storage("database", "parse url of"))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(self.busy_timeout_secs));

        SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect_with(options)
            .await
            .map_err(TagError::storage("database", "connect to"))
    }
}

/// Open a private in-memory database with the schema applied.
///
/// The pool holds a single connection that is never recycled, since the
/// database lives exactly as long as that connection.
pub async fn connect_in_memory() -> TagResult<DbContext> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(TagError::storage("database", "parse url of"))?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(TagError::storage("database", "connect to"))?;

    let db = DbContext::new(pool);
    db.migrate().await?;
    Ok(db)
}

fn parse_or<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    var(key).and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub tags: TagService,
}

impl AppState {
    pub fn new(db: DbContext) -> Self {
        Self {
            tags: TagService::new(db),
        }
    }
}
