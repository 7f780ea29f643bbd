//! Database entities and request types.
//!
//! These structs map directly to the SQLite tables created by the
//! migrations in `migrations/`.

pub mod entry;
pub mod tag;

pub use entry::*;
pub use tag::*;
