//! User Tags - Library
//!
//! Per-user labels on feed entries: tag registry, entry associations,
//! validation and the entry-listing filter, plus a thin JSON API.

pub mod config;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod query;
pub mod repositories;
pub mod service;
pub mod validator;

pub use config::{connect_in_memory, AppState, Config, DbConfig};
pub use error::{TagError, TagResult, ValidationError};
pub use repositories::DbContext;
pub use service::TagService;
