//! The unit progression state machine.
//!
//! Pure functions over [`Unit`] and the lifecycle enums. The authoritative
//! guard is payload presence; `status` is a hint that catches out-of-order
//! requests early. `Error` status is recoverable: the effective status is
//! recomputed from the payloads, so retrying the in-flight stage works
//! without a separate reset step.

use lexi_core::unit::{Stage, Unit, UnitStatus};

use crate::errors::{EngineError, Result};

/// Pipeline stages that must hold content before `stage` may run.
#[must_use]
pub fn prerequisites(stage: Stage) -> &'static [Stage] {
    match stage {
        Stage::Vocabulary => &[],
        Stage::Sentences => &[Stage::Vocabulary],
        Stage::Strategy => &[Stage::Vocabulary, Stage::Sentences],
        Stage::Assessments => &[Stage::Vocabulary, Stage::Sentences, Stage::Strategy],
        Stage::Qa => &[
            Stage::Vocabulary,
            Stage::Sentences,
            Stage::Strategy,
            Stage::Assessments,
        ],
    }
}

/// Statuses from which generating `stage` is legal.
///
/// Vocabulary admits both `Creating` and `VocabPending` so regeneration is
/// idempotent. Q&A admits `AssessmentsPending` and `Completed` because it
/// never advances the pipeline.
#[must_use]
pub fn allowed_statuses(stage: Stage) -> &'static [UnitStatus] {
    match stage {
        Stage::Vocabulary => &[UnitStatus::Creating, UnitStatus::VocabPending],
        Stage::Sentences => &[UnitStatus::SentencesPending],
        Stage::Strategy => &[UnitStatus::ContentPending],
        Stage::Assessments => &[UnitStatus::AssessmentsPending],
        Stage::Qa => &[UnitStatus::AssessmentsPending, UnitStatus::Completed],
    }
}

/// Status after `stage` completes successfully.
///
/// `current` only matters for Q&A, which keeps the status it found.
#[must_use]
pub fn status_after(stage: Stage, current: UnitStatus) -> UnitStatus {
    match stage {
        Stage::Vocabulary => UnitStatus::SentencesPending,
        Stage::Sentences => UnitStatus::ContentPending,
        Stage::Strategy => UnitStatus::AssessmentsPending,
        Stage::Assessments => UnitStatus::Completed,
        Stage::Qa => current,
    }
}

/// Status after deleting `stage`'s content: the stage becomes pending
/// again. Deleting Q&A leaves the status where it was.
#[must_use]
pub fn status_after_delete(stage: Stage, current: UnitStatus) -> UnitStatus {
    match stage {
        Stage::Vocabulary => UnitStatus::VocabPending,
        Stage::Sentences => UnitStatus::SentencesPending,
        Stage::Strategy => UnitStatus::ContentPending,
        Stage::Assessments => UnitStatus::AssessmentsPending,
        Stage::Qa => current,
    }
}

/// The status the unit's payloads imply: the first missing pipeline
/// stage's pending status, or `Completed` when all four are present.
///
/// Used to re-enter the pipeline from `Error` and to recover after a
/// stage deletion left later payloads in place.
#[must_use]
pub fn effective_status(unit: &Unit) -> UnitStatus {
    for stage in Stage::PIPELINE {
        if !unit.has_stage(stage) {
            return status_after_delete(stage, unit.status);
        }
    }
    UnitStatus::Completed
}

/// Full guard for generating `stage` on `unit`.
///
/// Checks prerequisite payloads first (the authoritative contract), then
/// the status hint. A unit in `Error` is judged by its effective status,
/// so retrying the stage that failed is always legal.
pub fn check_stage(unit: &Unit, stage: Stage) -> Result<()> {
    for required in prerequisites(stage) {
        if !unit.has_stage(*required) {
            return Err(EngineError::Prerequisite {
                stage,
                missing: *required,
            });
        }
    }

    let status = if unit.status == UnitStatus::Error {
        effective_status(unit)
    } else {
        unit.status
    };
    if !allowed_statuses(stage).contains(&status) {
        return Err(EngineError::InvalidState {
            stage,
            status: unit.status,
        });
    }
    Ok(())
}
