//! `SQLite` backend for the course store.
//!
//! # Architecture
//!
//! - **[`connection`]**: `r2d2` pool with WAL mode, foreign keys, and
//!   performance pragmas applied to every connection.
//! - **[`migrations`]**: version-tracked schema, embedded at compile time
//!   and run transactionally.
//! - **[`row_types`]**: raw row structs and their domain conversions.
//! - **[`repositories`]**: stateless repository structs, one per entity.
//! - **[`course_store`]**: the [`SqliteStore`] facade composing the repos
//!   into atomic [`CourseStore`](crate::CourseStore) operations.

pub mod connection;
pub mod course_store;
pub mod migrations;
pub mod repositories;
pub mod row_types;

pub use connection::{ConnectionConfig, ConnectionPool, PooledConnection, new_file, new_in_memory};
pub use course_store::SqliteStore;
pub use migrations::{current_version, run_migrations};
