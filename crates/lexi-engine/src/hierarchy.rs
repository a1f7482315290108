//! Course, book, and unit creation.
//!
//! Thin layer over the store that owns the cross-entity validation the
//! store cannot do alone: a book's level must be one of its course's
//! target levels, and image attachments are analyzed before the unit is
//! persisted. Sequence numbers are assigned by the store, never by
//! callers.

use lexi_core::unit::{Book, Course, Unit};
use lexi_llm::ImageSource;
use lexi_store::{NewBook, NewCourse, NewUnit};
use tracing::{info, instrument, warn};

use crate::errors::{EngineError, Result};
use crate::orchestrator::ProgressionEngine;

impl ProgressionEngine {
    /// Create a course.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub fn create_course(&self, new: &NewCourse) -> Result<Course> {
        if new.name.trim().is_empty() {
            return Err(EngineError::Validation("course name is empty".into()));
        }
        if new.target_levels.is_empty() {
            return Err(EngineError::Validation(
                "course needs at least one target level".into(),
            ));
        }
        let course = self.store.create_course(new)?;
        info!(course_id = %course.id, "course created");
        Ok(course)
    }

    /// Create a book. Its target level must be one of the course's.
    #[instrument(skip(self, new), fields(course_id = %new.course_id, name = %new.name))]
    pub fn create_book(&self, new: &NewBook) -> Result<Book> {
        let course = self
            .store
            .get_course(&new.course_id)?
            .ok_or_else(|| EngineError::CourseNotFound(new.course_id.as_str().to_string()))?;
        if !course.target_levels.contains(&new.target_level) {
            return Err(EngineError::Validation(format!(
                "book level {} is not among the course's target levels",
                new.target_level
            )));
        }
        let book = self.store.create_book(new)?;
        info!(book_id = %book.id, sequence = book.sequence_order, "book created");
        Ok(book)
    }

    /// Create a unit. It is persisted awaiting vocabulary generation.
    #[instrument(skip(self, new), fields(book_id = %new.book_id, title = %new.title))]
    pub fn create_unit(&self, new: &NewUnit) -> Result<Unit> {
        if self.store.get_book(&new.book_id)?.is_none() {
            return Err(EngineError::BookNotFound(new.book_id.as_str().to_string()));
        }
        let unit = self.store.create_unit(new)?;
        info!(unit_id = %unit.id, sequence = unit.sequence_order, "unit created");
        Ok(unit)
    }

    /// Create a unit with image attachments, analyzing them first so the
    /// vocabulary stage can draw on the detected content.
    ///
    /// Analysis failure is not fatal: the unit is created without image
    /// context and the failure is logged.
    #[instrument(skip(self, new, sources), fields(book_id = %new.book_id, images = sources.len()))]
    pub async fn create_unit_with_images(
        &self,
        mut new: NewUnit,
        sources: &[ImageSource],
    ) -> Result<Unit> {
        match self.analyzer.analyze(sources, new.context.as_deref()).await {
            Ok(infos) => new.images = infos,
            Err(err) => warn!(error = %err, "image analysis failed, creating unit without it"),
        }
        self.create_unit(&new)
    }
}
