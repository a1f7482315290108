//! Unit repository, including the context aggregation queries.

use rusqlite::{Connection, OptionalExtension, Row, params};

use lexi_core::content::AssessmentUsage;
use lexi_core::ids::{BookId, UnitId};
use lexi_core::unit::{AssessmentType, Unit, UnitStatus};

use crate::errors::Result;
use crate::sqlite::row_types::UnitRow;

const COLUMNS: &str = "id, course_id, book_id, title, context, sequence_order, unit_type, \
                       cefr_level, language_variant, status, images, \
                       vocabulary, sentences, tips, grammar, assessments, qa, \
                       vocabulary_taught, strategies_used, assessments_used, \
                       created_at, updated_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<UnitRow> {
    Ok(UnitRow {
        id: row.get(0)?,
        course_id: row.get(1)?,
        book_id: row.get(2)?,
        title: row.get(3)?,
        context: row.get(4)?,
        sequence_order: row.get(5)?,
        unit_type: row.get(6)?,
        cefr_level: row.get(7)?,
        language_variant: row.get(8)?,
        status: row.get(9)?,
        images: row.get(10)?,
        vocabulary: row.get(11)?,
        sentences: row.get(12)?,
        tips: row.get(13)?,
        grammar: row.get(14)?,
        assessments: row.get(15)?,
        qa: row.get(16)?,
        vocabulary_taught: row.get(17)?,
        strategies_used: row.get(18)?,
        assessments_used: row.get(19)?,
        created_at: row.get(20)?,
        updated_at: row.get(21)?,
    })
}

fn opt_json<T: serde::Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value.map(|v| serde_json::to_string(v)).transpose().map_err(Into::into)
}

/// Unit repository — stateless, every method takes `&Connection`.
pub struct UnitRepo;

impl UnitRepo {
    /// Insert a fully-formed unit row.
    pub fn insert(conn: &Connection, unit: &Unit) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO units (id, course_id, book_id, title, context, sequence_order,
                                unit_type, cefr_level, language_variant, status, images,
                                vocabulary, sentences, tips, grammar, assessments, qa,
                                vocabulary_taught, strategies_used, assessments_used,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                     ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
            params![
                unit.id.as_str(),
                unit.course_id.as_str(),
                unit.book_id.as_str(),
                unit.title,
                unit.context,
                unit.sequence_order,
                unit.unit_type.as_str(),
                unit.cefr_level.as_str(),
                unit.language_variant.as_str(),
                unit.status.as_str(),
                serde_json::to_string(&unit.images)?,
                opt_json(unit.vocabulary.as_ref())?,
                opt_json(unit.sentences.as_ref())?,
                opt_json(unit.tips.as_ref())?,
                opt_json(unit.grammar.as_ref())?,
                opt_json(unit.assessments.as_ref())?,
                opt_json(unit.qa.as_ref())?,
                serde_json::to_string(&unit.vocabulary_taught)?,
                serde_json::to_string(&unit.strategies_used)?,
                serde_json::to_string(&unit.assessments_used)?,
                unit.created_at.to_rfc3339(),
                unit.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a unit by ID.
    pub fn get(conn: &Connection, id: &UnitId) -> Result<Option<Unit>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM units WHERE id = ?1"),
                params![id.as_str()],
                map_row,
            )
            .optional()?;
        row.map(UnitRow::into_domain).transpose()
    }

    /// All units of a book, ordered by sequence.
    pub fn list(conn: &Connection, book_id: &BookId) -> Result<Vec<Unit>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM units WHERE book_id = ?1 ORDER BY sequence_order"
        ))?;
        let rows = stmt.query_map(params![book_id.as_str()], map_row)?;
        rows.map(|r| r.map_err(Into::into).and_then(UnitRow::into_domain))
            .collect()
    }

    /// Update status and `updated_at`. Returns true if the row existed.
    pub fn update_status(conn: &Connection, id: &UnitId, status: UnitStatus) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE units SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![
                id.as_str(),
                status.as_str(),
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
        Ok(changed > 0)
    }

    /// Rewrite all payload columns, derived facts, status, and
    /// `updated_at` from an already-updated domain unit.
    pub fn save_content(conn: &Connection, unit: &Unit) -> Result<()> {
        let _ = conn.execute(
            "UPDATE units SET
                 status = ?2,
                 vocabulary = ?3, sentences = ?4, tips = ?5, grammar = ?6,
                 assessments = ?7, qa = ?8,
                 vocabulary_taught = ?9, strategies_used = ?10, assessments_used = ?11,
                 updated_at = ?12
             WHERE id = ?1",
            params![
                unit.id.as_str(),
                unit.status.as_str(),
                opt_json(unit.vocabulary.as_ref())?,
                opt_json(unit.sentences.as_ref())?,
                opt_json(unit.tips.as_ref())?,
                opt_json(unit.grammar.as_ref())?,
                opt_json(unit.assessments.as_ref())?,
                opt_json(unit.qa.as_ref())?,
                serde_json::to_string(&unit.vocabulary_taught)?,
                serde_json::to_string(&unit.strategies_used)?,
                serde_json::to_string(&unit.assessments_used)?,
                unit.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Context aggregation
    // ─────────────────────────────────────────────────────────────────────

    /// Derived-fact JSON columns of prior units, in unit order.
    fn prior_facts(
        conn: &Connection,
        column: &str,
        book_id: &BookId,
        before_sequence: i64,
    ) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {column} FROM units
             WHERE book_id = ?1 AND sequence_order < ?2
             ORDER BY sequence_order"
        ))?;
        let rows = stmt.query_map(params![book_id.as_str(), before_sequence], |row| {
            row.get::<_, String>(0)
        })?;
        rows.map(|r| r.map_err(Into::into)).collect()
    }

    /// Words taught by prior units, deduplicated in first-taught order.
    pub fn taught_vocabulary(
        conn: &Connection,
        book_id: &BookId,
        before_sequence: i64,
    ) -> Result<Vec<String>> {
        let mut seen = Vec::new();
        for facts in Self::prior_facts(conn, "vocabulary_taught", book_id, before_sequence)? {
            let words: Vec<String> = serde_json::from_str(&facts)?;
            for word in words {
                if !seen.contains(&word) {
                    seen.push(word);
                }
            }
        }
        Ok(seen)
    }

    /// Strategy identifiers applied by prior units, with repetition.
    pub fn used_strategies(
        conn: &Connection,
        book_id: &BookId,
        before_sequence: i64,
    ) -> Result<Vec<String>> {
        let mut used = Vec::new();
        for facts in Self::prior_facts(conn, "strategies_used", book_id, before_sequence)? {
            let strategies: Vec<String> = serde_json::from_str(&facts)?;
            used.extend(strategies);
        }
        Ok(used)
    }

    /// Per-type assessment counts across prior units.
    pub fn used_assessments(
        conn: &Connection,
        book_id: &BookId,
        before_sequence: i64,
    ) -> Result<AssessmentUsage> {
        let mut usage = AssessmentUsage::new();
        for facts in Self::prior_facts(conn, "assessments_used", book_id, before_sequence)? {
            let kinds: Vec<AssessmentType> = serde_json::from_str(&facts)?;
            for kind in kinds {
                *usage.entry(kind).or_insert(0) += 1;
            }
        }
        Ok(usage)
    }
}
