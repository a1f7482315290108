//! Database row types and their conversion into domain types.
//!
//! Row structs mirror the raw column shape (strings and JSON text).
//! Conversion into `lexi-core` types happens here so the repositories
//! stay focused on SQL.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use lexi_core::ids::{BookId, CourseId, UnitId};
use lexi_core::level::{CefrLevel, LanguageVariant};
use lexi_core::unit::{AssessmentType, Book, Course, Unit, UnitStatus, UnitType};

use crate::errors::{Result, StoreError};

/// Parse an RFC 3339 timestamp column.
fn parse_time(column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptRow(format!("{column}: {e}")))
}

/// Parse a JSON text column.
fn parse_json<T: DeserializeOwned>(column: &str, value: &str) -> Result<T> {
    serde_json::from_str(value).map_err(|e| StoreError::CorruptRow(format!("{column}: {e}")))
}

/// Parse an optional JSON payload column.
fn parse_opt_json<T: DeserializeOwned>(column: &str, value: Option<&str>) -> Result<Option<T>> {
    value.map(|v| parse_json(column, v)).transpose()
}

fn corrupt(column: &str, message: String) -> StoreError {
    StoreError::CorruptRow(format!("{column}: {message}"))
}

/// Raw course row from the `courses` table.
#[derive(Clone, Debug)]
pub struct CourseRow {
    /// Course ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Target levels as a JSON array.
    pub target_levels: String,
    /// Language variant identifier.
    pub language_variant: String,
    /// Methodology tags as a JSON array.
    pub methodology: String,
    /// Next book sequence counter.
    pub next_book_sequence: i64,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl CourseRow {
    /// Convert into the domain type.
    pub fn into_domain(self) -> Result<Course> {
        Ok(Course {
            id: CourseId::from_string(self.id),
            name: self.name,
            target_levels: parse_json("target_levels", &self.target_levels)?,
            language_variant: self
                .language_variant
                .parse::<LanguageVariant>()
                .map_err(|e| corrupt("language_variant", e))?,
            methodology: parse_json("methodology", &self.methodology)?,
            next_book_sequence: self.next_book_sequence,
            created_at: parse_time("created_at", &self.created_at)?,
        })
    }
}

/// Raw book row from the `books` table.
#[derive(Clone, Debug)]
pub struct BookRow {
    /// Book ID.
    pub id: String,
    /// Owning course ID.
    pub course_id: String,
    /// Display name.
    pub name: String,
    /// Target CEFR level.
    pub target_level: String,
    /// Position within the course.
    pub sequence_order: i64,
    /// Next unit sequence counter.
    pub next_unit_sequence: i64,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl BookRow {
    /// Convert into the domain type.
    pub fn into_domain(self) -> Result<Book> {
        Ok(Book {
            id: BookId::from_string(self.id),
            course_id: CourseId::from_string(self.course_id),
            name: self.name,
            target_level: self
                .target_level
                .parse::<CefrLevel>()
                .map_err(|e| corrupt("target_level", e.to_string()))?,
            sequence_order: self.sequence_order,
            next_unit_sequence: self.next_unit_sequence,
            created_at: parse_time("created_at", &self.created_at)?,
        })
    }
}

/// Raw unit row from the `units` table.
#[derive(Clone, Debug)]
pub struct UnitRow {
    /// Unit ID.
    pub id: String,
    /// Owning course ID.
    pub course_id: String,
    /// Owning book ID.
    pub book_id: String,
    /// Display title.
    pub title: String,
    /// Thematic context.
    pub context: Option<String>,
    /// Position within the book.
    pub sequence_order: i64,
    /// Unit type identifier.
    pub unit_type: String,
    /// CEFR level.
    pub cefr_level: String,
    /// Language variant identifier.
    pub language_variant: String,
    /// Pipeline status identifier.
    pub status: String,
    /// Attached images as a JSON array.
    pub images: String,
    /// Vocabulary payload JSON.
    pub vocabulary: Option<String>,
    /// Sentences payload JSON.
    pub sentences: Option<String>,
    /// TIPS payload JSON.
    pub tips: Option<String>,
    /// Grammar payload JSON.
    pub grammar: Option<String>,
    /// Assessments payload JSON.
    pub assessments: Option<String>,
    /// Q&A payload JSON.
    pub qa: Option<String>,
    /// Derived taught words as a JSON array.
    pub vocabulary_taught: String,
    /// Derived strategy identifiers as a JSON array.
    pub strategies_used: String,
    /// Derived assessment types as a JSON array.
    pub assessments_used: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

impl UnitRow {
    /// Convert into the domain type.
    pub fn into_domain(self) -> Result<Unit> {
        Ok(Unit {
            id: UnitId::from_string(self.id),
            course_id: CourseId::from_string(self.course_id),
            book_id: BookId::from_string(self.book_id),
            title: self.title,
            context: self.context,
            sequence_order: self.sequence_order,
            unit_type: self
                .unit_type
                .parse::<UnitType>()
                .map_err(|e| corrupt("unit_type", e))?,
            cefr_level: self
                .cefr_level
                .parse::<CefrLevel>()
                .map_err(|e| corrupt("cefr_level", e.to_string()))?,
            language_variant: self
                .language_variant
                .parse::<LanguageVariant>()
                .map_err(|e| corrupt("language_variant", e))?,
            status: self
                .status
                .parse::<UnitStatus>()
                .map_err(|e| corrupt("status", e))?,
            images: parse_json("images", &self.images)?,
            vocabulary: parse_opt_json("vocabulary", self.vocabulary.as_deref())?,
            sentences: parse_opt_json("sentences", self.sentences.as_deref())?,
            tips: parse_opt_json("tips", self.tips.as_deref())?,
            grammar: parse_opt_json("grammar", self.grammar.as_deref())?,
            assessments: parse_opt_json("assessments", self.assessments.as_deref())?,
            qa: parse_opt_json("qa", self.qa.as_deref())?,
            vocabulary_taught: parse_json("vocabulary_taught", &self.vocabulary_taught)?,
            strategies_used: parse_json("strategies_used", &self.strategies_used)?,
            assessments_used: parse_json::<Vec<AssessmentType>>(
                "assessments_used",
                &self.assessments_used,
            )?,
            created_at: parse_time("created_at", &self.created_at)?,
            updated_at: parse_time("updated_at", &self.updated_at)?,
        })
    }
}
