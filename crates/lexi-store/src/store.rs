//! The [`CourseStore`] trait — the persistence seam the engine works
//! against.
//!
//! Methods are synchronous; `SQLite` work is fast and the engine calls the
//! store from async context without an executor hop. Implementations must
//! be `Send + Sync` so one store can back concurrent generations.
//!
//! Two contracts matter to callers:
//!
//! - `get_*` lookups return `Ok(None)` for missing IDs, never errors.
//! - `write_stage_content` and `delete_stage_content` are atomic: the
//!   payload column, the derived taught-facts, the status, and
//!   `updated_at` all change together or not at all.

use lexi_core::content::{AssessmentUsage, ImageInfo, StagePayload};
use lexi_core::ids::{BookId, CourseId, UnitId};
use lexi_core::level::{CefrLevel, LanguageVariant};
use lexi_core::unit::{Book, Course, Stage, Unit, UnitStatus, UnitType};

use crate::errors::Result;

/// Options for creating a course.
pub struct NewCourse {
    /// Display name.
    pub name: String,
    /// CEFR levels the course targets.
    pub target_levels: Vec<CefrLevel>,
    /// Target-language variant.
    pub language_variant: LanguageVariant,
    /// Methodology tags.
    pub methodology: Vec<String>,
}

/// Options for creating a book. Sequence is assigned from the course
/// counter, never by the caller.
pub struct NewBook {
    /// Owning course.
    pub course_id: CourseId,
    /// Display name.
    pub name: String,
    /// The single CEFR level this book targets.
    pub target_level: CefrLevel,
}

/// Options for creating a unit. Sequence is assigned from the book
/// counter; course and language variant are inherited from the book.
pub struct NewUnit {
    /// Owning book.
    pub book_id: BookId,
    /// Display title.
    pub title: String,
    /// Optional thematic context.
    pub context: Option<String>,
    /// Lexical or grammar.
    pub unit_type: UnitType,
    /// CEFR level of this unit.
    pub cefr_level: CefrLevel,
    /// Source images attached at creation.
    pub images: Vec<ImageInfo>,
}

/// Persistence operations over the course hierarchy.
pub trait CourseStore: Send + Sync {
    /// Create a course.
    fn create_course(&self, new: &NewCourse) -> Result<Course>;

    /// Fetch a course, `Ok(None)` if missing.
    fn get_course(&self, id: &CourseId) -> Result<Option<Course>>;

    /// Create a book under a course, assigning the next sequence number.
    ///
    /// Returns [`crate::StoreError::CourseNotFound`] if the course is
    /// missing.
    fn create_book(&self, new: &NewBook) -> Result<Book>;

    /// Fetch a book, `Ok(None)` if missing.
    fn get_book(&self, id: &BookId) -> Result<Option<Book>>;

    /// All books of a course, ordered by sequence.
    fn list_books(&self, course_id: &CourseId) -> Result<Vec<Book>>;

    /// Create a unit under a book, assigning the next sequence number.
    ///
    /// Units are persisted awaiting vocabulary; there is no stored
    /// "creating" state.
    fn create_unit(&self, new: &NewUnit) -> Result<Unit>;

    /// Fetch a unit, `Ok(None)` if missing.
    fn get_unit(&self, id: &UnitId) -> Result<Option<Unit>>;

    /// All units of a book, ordered by sequence.
    fn list_units(&self, book_id: &BookId) -> Result<Vec<Unit>>;

    /// Set a unit's status (used for the error flag and recovery).
    fn update_unit_status(&self, id: &UnitId, status: UnitStatus) -> Result<()>;

    /// Write a stage payload, re-derive taught-facts, and set the status,
    /// atomically. Returns the updated unit.
    fn write_stage_content(
        &self,
        id: &UnitId,
        payload: &StagePayload,
        status: UnitStatus,
    ) -> Result<Unit>;

    /// Clear a stage payload and its derived facts and set the status,
    /// atomically. Returns the updated unit.
    fn delete_stage_content(&self, id: &UnitId, stage: Stage, status: UnitStatus) -> Result<Unit>;

    // ─────────────────────────────────────────────────────────────────────
    // Context aggregation
    // ─────────────────────────────────────────────────────────────────────

    /// Words taught by units of `book_id` with `sequence_order <
    /// before_sequence`, deduplicated in first-taught order.
    fn taught_vocabulary(&self, book_id: &BookId, before_sequence: i64) -> Result<Vec<String>>;

    /// Strategy identifiers applied by prior units, in unit order, with
    /// repetition.
    fn used_strategies(&self, book_id: &BookId, before_sequence: i64) -> Result<Vec<String>>;

    /// Per-type assessment activity counts across prior units.
    fn used_assessments(&self, book_id: &BookId, before_sequence: i64) -> Result<AssessmentUsage>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared payload projection
// ─────────────────────────────────────────────────────────────────────────────

/// Apply a stage payload to a unit, rewriting the derived facts that the
/// payload projects. Status and timestamps are the caller's concern.
pub(crate) fn apply_payload(unit: &mut Unit, payload: &StagePayload) {
    match payload {
        StagePayload::Vocabulary(section) => {
            unit.vocabulary_taught = section.items.iter().map(|i| i.word.clone()).collect();
            unit.vocabulary = Some(section.clone());
        }
        StagePayload::Sentences(section) => {
            unit.sentences = Some(section.clone());
        }
        StagePayload::Tips(content) => {
            unit.strategies_used = vec![content.strategy.as_str().to_string()];
            unit.tips = Some(content.clone());
        }
        StagePayload::Grammar(content) => {
            unit.strategies_used = vec![content.strategy.as_str().to_string()];
            unit.grammar = Some(content.clone());
        }
        StagePayload::Assessments(section) => {
            unit.assessments_used = section.activity_types();
            unit.assessments = Some(section.clone());
        }
        StagePayload::Qa(section) => {
            unit.qa = Some(section.clone());
        }
    }
}

/// Clear a stage payload and the derived facts it projected.
pub(crate) fn clear_stage(unit: &mut Unit, stage: Stage) {
    match stage {
        Stage::Vocabulary => {
            unit.vocabulary = None;
            unit.vocabulary_taught.clear();
        }
        Stage::Sentences => {
            unit.sentences = None;
        }
        Stage::Strategy => {
            unit.tips = None;
            unit.grammar = None;
            unit.strategies_used.clear();
        }
        Stage::Assessments => {
            unit.assessments = None;
            unit.assessments_used.clear();
        }
        Stage::Qa => {
            unit.qa = None;
        }
    }
}
