//! Engine error types.
//!
//! [`EngineError`] is the boundary type every orchestrator entry point
//! returns. Store, selection, and generator errors convert in via
//! `#[from]`; the remaining variants are the engine's own contract
//! violations (guards, locking, validation).

use lexi_catalog::SelectionError;
use lexi_core::unit::{Stage, UnitStatus};
use lexi_llm::GeneratorError;
use lexi_store::StoreError;
use thiserror::Error;

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors from the progression engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Course lookup failed.
    #[error("course not found: {0}")]
    CourseNotFound(String),

    /// Book lookup failed.
    #[error("book not found: {0}")]
    BookNotFound(String),

    /// Unit lookup failed.
    #[error("unit not found: {0}")]
    UnitNotFound(String),

    /// An earlier stage's payload is absent.
    #[error("cannot generate {stage}: {missing} content is missing")]
    Prerequisite {
        /// Stage that was requested.
        stage: Stage,
        /// Earliest missing prerequisite stage.
        missing: Stage,
    },

    /// The unit's status does not admit this stage.
    #[error("cannot generate {stage} while unit is {status}")]
    InvalidState {
        /// Stage that was requested.
        stage: Stage,
        /// Status the unit is in.
        status: UnitStatus,
    },

    /// Input or payload validation failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Another generation for the same unit is in flight.
    #[error("unit {0} already has a generation in progress")]
    Busy(String),

    /// The generator call exceeded the configured timeout.
    #[error("{stage} generation timed out after {timeout_secs}s")]
    Timeout {
        /// Stage being generated.
        stage: Stage,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The engine was shut down while a generation was pending.
    #[error("generation cancelled")]
    Cancelled,

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Selection engine failure.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Content generator failure.
    #[error(transparent)]
    Generator(#[from] GeneratorError),
}
