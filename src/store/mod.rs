//! Persistence layer: libSQL-backed storage for onboarding pages and users.

pub mod libsql_backend;
pub mod migrations;
pub mod seed;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use seed::seed_default_pages;
pub use traits::Database;
