//! Selection engine error types.

use lexi_core::unit::UnitType;
use thiserror::Error;

/// Errors from the selection engines.
///
/// These indicate catalog or configuration defects, not user error: with
/// the shipped catalogs every unit type has at least four applicable
/// assessment types and both strategy families always have candidates.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// Fewer candidates remained than the selection requires.
    #[error(
        "selection exhausted: {required} candidates required for {unit_type} units, {available} available"
    )]
    Exhausted {
        /// Unit type the selection was filtered to.
        unit_type: UnitType,
        /// Number of candidates required.
        required: usize,
        /// Number of candidates available after filtering.
        available: usize,
    },
}
