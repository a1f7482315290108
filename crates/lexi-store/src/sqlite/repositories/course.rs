//! Course repository.

use rusqlite::{Connection, OptionalExtension, Row, params};

use lexi_core::ids::CourseId;
use lexi_core::unit::Course;

use crate::errors::Result;
use crate::sqlite::row_types::CourseRow;
use crate::store::NewCourse;

const COLUMNS: &str =
    "id, name, target_levels, language_variant, methodology, next_book_sequence, created_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<CourseRow> {
    Ok(CourseRow {
        id: row.get(0)?,
        name: row.get(1)?,
        target_levels: row.get(2)?,
        language_variant: row.get(3)?,
        methodology: row.get(4)?,
        next_book_sequence: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Course repository — stateless, every method takes `&Connection`.
pub struct CourseRepo;

impl CourseRepo {
    /// Insert a new course.
    pub fn create(conn: &Connection, new: &NewCourse) -> Result<Course> {
        let course = Course {
            id: CourseId::new(),
            name: new.name.clone(),
            target_levels: new.target_levels.clone(),
            language_variant: new.language_variant,
            methodology: new.methodology.clone(),
            next_book_sequence: 1,
            created_at: chrono::Utc::now(),
        };
        let _ = conn.execute(
            "INSERT INTO courses (id, name, target_levels, language_variant, methodology,
                                  next_book_sequence, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            params![
                course.id.as_str(),
                course.name,
                serde_json::to_string(&course.target_levels)?,
                course.language_variant.as_str(),
                serde_json::to_string(&course.methodology)?,
                course.created_at.to_rfc3339(),
            ],
        )?;
        Ok(course)
    }

    /// Fetch a course by ID.
    pub fn get(conn: &Connection, id: &CourseId) -> Result<Option<Course>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM courses WHERE id = ?1"),
                params![id.as_str()],
                map_row,
            )
            .optional()?;
        row.map(CourseRow::into_domain).transpose()
    }

    /// Atomically claim the next book sequence number for a course.
    ///
    /// Returns `None` if the course does not exist.
    pub fn claim_book_sequence(conn: &Connection, id: &CourseId) -> Result<Option<i64>> {
        let claimed: Option<i64> = conn
            .query_row(
                "UPDATE courses SET next_book_sequence = next_book_sequence + 1
                 WHERE id = ?1
                 RETURNING next_book_sequence - 1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(claimed)
    }
}
