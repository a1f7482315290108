//! # lexi-engine
//!
//! The unit progression engine: everything between an incoming
//! "generate this stage" request and the committed content.
//!
//! - [`progress`]: the pure state machine and the payload-presence guard
//!   contract
//! - [`locks`]: at-most-one-generation-per-unit plus the global
//!   concurrency limit
//! - [`context`]: RAG context assembly from prior units of the book
//! - [`orchestrator`]: the per-stage entry points tying guard, context,
//!   selection, generation, validation, and the transactional write
//!   together
//! - [`hierarchy`]: course/book/unit creation with level validation
//!
//! ## Crate Position
//!
//! Depends on every other crate in the workspace; nothing depends on it.
//! Construct a [`ProgressionEngine`] with a store, a generator, and an
//! image analyzer, and share it behind an `Arc`.

#![deny(unsafe_code)]

pub mod context;
pub mod errors;
pub mod hierarchy;
pub mod locks;
pub mod orchestrator;
pub mod progress;

pub use errors::{EngineError, Result};
pub use locks::UnitLocks;
pub use orchestrator::ProgressionEngine;
