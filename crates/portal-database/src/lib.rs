//! # portal-database
//!
//! PostgreSQL connection management and the directory of users, roles,
//! and module grants that sessions are computed from.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{DirectoryRepository, MemoryDirectory, PgDirectoryRepository};
