//! # lexi-store
//!
//! Persistence for the Course → Book → Unit hierarchy and the context
//! aggregation queries the progression engine consumes.
//!
//! The [`CourseStore`] trait is the seam: [`sqlite::SqliteStore`] is the
//! production implementation (pooled `SQLite`, WAL, embedded migrations),
//! [`memory::MemoryStore`] backs tests. Both honor the same contracts:
//! lookups return `Ok(None)` for missing IDs, and stage writes are atomic
//! with their derived taught-facts.
//!
//! ## Crate Position
//!
//! Depends on `lexi-core`. Consumed by `lexi-engine`.

#![deny(unsafe_code)]

pub mod errors;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use errors::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{CourseStore, NewBook, NewCourse, NewUnit};
