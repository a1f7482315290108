//! Book repository.

use rusqlite::{Connection, OptionalExtension, Row, params};

use lexi_core::ids::{BookId, CourseId};
use lexi_core::unit::Book;

use crate::errors::Result;
use crate::sqlite::row_types::BookRow;

const COLUMNS: &str =
    "id, course_id, name, target_level, sequence_order, next_unit_sequence, created_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<BookRow> {
    Ok(BookRow {
        id: row.get(0)?,
        course_id: row.get(1)?,
        name: row.get(2)?,
        target_level: row.get(3)?,
        sequence_order: row.get(4)?,
        next_unit_sequence: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Book repository — stateless, every method takes `&Connection`.
pub struct BookRepo;

impl BookRepo {
    /// Insert a book with a caller-assigned sequence number.
    ///
    /// The sequence comes from [`CourseRepo::claim_book_sequence`] inside
    /// the same transaction.
    ///
    /// [`CourseRepo::claim_book_sequence`]: crate::sqlite::repositories::course::CourseRepo::claim_book_sequence
    pub fn insert(conn: &Connection, book: &Book) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO books (id, course_id, name, target_level, sequence_order,
                                next_unit_sequence, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                book.id.as_str(),
                book.course_id.as_str(),
                book.name,
                book.target_level.as_str(),
                book.sequence_order,
                book.next_unit_sequence,
                book.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a book by ID.
    pub fn get(conn: &Connection, id: &BookId) -> Result<Option<Book>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM books WHERE id = ?1"),
                params![id.as_str()],
                map_row,
            )
            .optional()?;
        row.map(BookRow::into_domain).transpose()
    }

    /// All books of a course, ordered by sequence.
    pub fn list(conn: &Connection, course_id: &CourseId) -> Result<Vec<Book>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM books WHERE course_id = ?1 ORDER BY sequence_order"
        ))?;
        let rows = stmt.query_map(params![course_id.as_str()], map_row)?;
        rows.map(|r| r.map_err(Into::into).and_then(BookRow::into_domain))
            .collect()
    }

    /// Atomically claim the next unit sequence number for a book.
    ///
    /// Returns `None` if the book does not exist.
    pub fn claim_unit_sequence(conn: &Connection, id: &BookId) -> Result<Option<i64>> {
        let claimed: Option<i64> = conn
            .query_row(
                "UPDATE books SET next_unit_sequence = next_unit_sequence + 1
                 WHERE id = ?1
                 RETURNING next_unit_sequence - 1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(claimed)
    }
}
