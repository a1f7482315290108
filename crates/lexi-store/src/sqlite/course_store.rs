//! `SQLite`-backed [`CourseStore`].
//!
//! Wraps a connection pool and composes repository calls into atomic
//! operations. Every multi-row write runs inside a single transaction, so
//! callers never observe a claimed sequence number without its row, or a
//! payload without its derived facts.

use chrono::Utc;
use tracing::instrument;

use lexi_core::content::{AssessmentUsage, StagePayload};
use lexi_core::ids::{BookId, CourseId, UnitId};
use lexi_core::unit::{Book, Course, Stage, Unit, UnitStatus};

use crate::errors::{Result, StoreError};
use crate::sqlite::connection::{ConnectionConfig, ConnectionPool, PooledConnection, new_file, new_in_memory};
use crate::sqlite::migrations::run_migrations;
use crate::sqlite::repositories::book::BookRepo;
use crate::sqlite::repositories::course::CourseRepo;
use crate::sqlite::repositories::unit::UnitRepo;
use crate::store::{CourseStore, NewBook, NewCourse, NewUnit, apply_payload, clear_stage};

/// `SQLite` store over a connection pool.
pub struct SqliteStore {
    pool: ConnectionPool,
}

impl SqliteStore {
    /// Open a file-backed store, running pending migrations.
    pub fn open(path: &str, config: &ConnectionConfig) -> Result<Self> {
        let pool = new_file(path, config)?;
        let conn = pool.get()?;
        let _ = run_migrations(&conn)?;
        Ok(Self { pool })
    }

    /// Open an in-memory store (for testing), running migrations.
    pub fn in_memory() -> Result<Self> {
        let pool = new_in_memory(&ConnectionConfig::default())?;
        let conn = pool.get()?;
        let _ = run_migrations(&conn)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Load a unit inside a transaction, apply `mutate`, and persist the
    /// full payload/derived-fact state in the same transaction.
    fn mutate_unit(
        &self,
        id: &UnitId,
        status: UnitStatus,
        mutate: impl FnOnce(&mut Unit),
    ) -> Result<Unit> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut unit = UnitRepo::get(&tx, id)?
            .ok_or_else(|| StoreError::UnitNotFound(id.to_string()))?;
        mutate(&mut unit);
        unit.status = status;
        unit.updated_at = Utc::now();
        UnitRepo::save_content(&tx, &unit)?;
        tx.commit()?;
        Ok(unit)
    }
}

impl CourseStore for SqliteStore {
    #[instrument(skip_all, fields(name = %new.name))]
    fn create_course(&self, new: &NewCourse) -> Result<Course> {
        let conn = self.conn()?;
        CourseRepo::create(&conn, new)
    }

    fn get_course(&self, id: &CourseId) -> Result<Option<Course>> {
        let conn = self.conn()?;
        CourseRepo::get(&conn, id)
    }

    #[instrument(skip_all, fields(course_id = %new.course_id, name = %new.name))]
    fn create_book(&self, new: &NewBook) -> Result<Book> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let sequence = CourseRepo::claim_book_sequence(&tx, &new.course_id)?
            .ok_or_else(|| StoreError::CourseNotFound(new.course_id.to_string()))?;
        let book = Book {
            id: BookId::new(),
            course_id: new.course_id.clone(),
            name: new.name.clone(),
            target_level: new.target_level,
            sequence_order: sequence,
            next_unit_sequence: 1,
            created_at: Utc::now(),
        };
        BookRepo::insert(&tx, &book)?;
        tx.commit()?;
        Ok(book)
    }

    fn get_book(&self, id: &BookId) -> Result<Option<Book>> {
        let conn = self.conn()?;
        BookRepo::get(&conn, id)
    }

    fn list_books(&self, course_id: &CourseId) -> Result<Vec<Book>> {
        let conn = self.conn()?;
        BookRepo::list(&conn, course_id)
    }

    #[instrument(skip_all, fields(book_id = %new.book_id, title = %new.title))]
    fn create_unit(&self, new: &NewUnit) -> Result<Unit> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let book = BookRepo::get(&tx, &new.book_id)?
            .ok_or_else(|| StoreError::BookNotFound(new.book_id.to_string()))?;
        let course = CourseRepo::get(&tx, &book.course_id)?
            .ok_or_else(|| StoreError::CourseNotFound(book.course_id.to_string()))?;
        let sequence = BookRepo::claim_unit_sequence(&tx, &new.book_id)?
            .ok_or_else(|| StoreError::BookNotFound(new.book_id.to_string()))?;

        let now = Utc::now();
        let unit = Unit {
            id: UnitId::new(),
            course_id: book.course_id.clone(),
            book_id: new.book_id.clone(),
            title: new.title.clone(),
            context: new.context.clone(),
            sequence_order: sequence,
            unit_type: new.unit_type,
            cefr_level: new.cefr_level,
            language_variant: course.language_variant,
            status: UnitStatus::VocabPending,
            images: new.images.clone(),
            vocabulary: None,
            sentences: None,
            tips: None,
            grammar: None,
            assessments: None,
            qa: None,
            vocabulary_taught: Vec::new(),
            strategies_used: Vec::new(),
            assessments_used: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        UnitRepo::insert(&tx, &unit)?;
        tx.commit()?;
        Ok(unit)
    }

    fn get_unit(&self, id: &UnitId) -> Result<Option<Unit>> {
        let conn = self.conn()?;
        UnitRepo::get(&conn, id)
    }

    fn list_units(&self, book_id: &BookId) -> Result<Vec<Unit>> {
        let conn = self.conn()?;
        UnitRepo::list(&conn, book_id)
    }

    fn update_unit_status(&self, id: &UnitId, status: UnitStatus) -> Result<()> {
        let conn = self.conn()?;
        let existed = UnitRepo::update_status(&conn, id, status)?;
        if existed {
            Ok(())
        } else {
            Err(StoreError::UnitNotFound(id.to_string()))
        }
    }

    #[instrument(skip_all, fields(unit_id = %id, stage = %payload.stage(), status = %status))]
    fn write_stage_content(
        &self,
        id: &UnitId,
        payload: &StagePayload,
        status: UnitStatus,
    ) -> Result<Unit> {
        self.mutate_unit(id, status, |unit| apply_payload(unit, payload))
    }

    #[instrument(skip_all, fields(unit_id = %id, stage = %stage, status = %status))]
    fn delete_stage_content(&self, id: &UnitId, stage: Stage, status: UnitStatus) -> Result<Unit> {
        self.mutate_unit(id, status, |unit| clear_stage(unit, stage))
    }

    fn taught_vocabulary(&self, book_id: &BookId, before_sequence: i64) -> Result<Vec<String>> {
        let conn = self.conn()?;
        UnitRepo::taught_vocabulary(&conn, book_id, before_sequence)
    }

    fn used_strategies(&self, book_id: &BookId, before_sequence: i64) -> Result<Vec<String>> {
        let conn = self.conn()?;
        UnitRepo::used_strategies(&conn, book_id, before_sequence)
    }

    fn used_assessments(&self, book_id: &BookId, before_sequence: i64) -> Result<AssessmentUsage> {
        let conn = self.conn()?;
        UnitRepo::used_assessments(&conn, book_id, before_sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use lexi_core::content::{
        AssessmentActivity, AssessmentSection, VocabularyItem, VocabularySection,
    };
    use lexi_core::level::{CefrLevel, LanguageVariant};
    use lexi_core::unit::{AssessmentType, UnitType};

    fn store_with_book() -> (SqliteStore, BookId) {
        let store = SqliteStore::in_memory().unwrap();
        let course = store
            .create_course(&NewCourse {
                name: "English Foundations".into(),
                target_levels: vec![CefrLevel::A1, CefrLevel::A2],
                language_variant: LanguageVariant::BritishEnglish,
                methodology: vec!["lexical_approach".into()],
            })
            .unwrap();
        let book = store
            .create_book(&NewBook {
                course_id: course.id,
                name: "First Steps".into(),
                target_level: CefrLevel::A1,
            })
            .unwrap();
        (store, book.id)
    }

    fn make_unit(store: &SqliteStore, book_id: &BookId, title: &str) -> Unit {
        store
            .create_unit(&NewUnit {
                book_id: book_id.clone(),
                title: title.into(),
                context: Some("hotel check-in".into()),
                unit_type: UnitType::Lexical,
                cefr_level: CefrLevel::A1,
                images: Vec::new(),
            })
            .unwrap()
    }

    fn vocab_payload(words: &[&str]) -> StagePayload {
        StagePayload::Vocabulary(VocabularySection {
            items: words
                .iter()
                .map(|w| VocabularyItem {
                    word: (*w).into(),
                    phoneme: "/x/".into(),
                    definition: "a word".into(),
                    example: "An example.".into(),
                    word_class: "noun".into(),
                    frequency_level: "high".into(),
                })
                .collect(),
            total_count: words.len(),
            context_relevance: 0.8,
            generated_at: Utc::now(),
        })
    }

    #[test]
    fn course_and_book_round_trip() {
        let (store, book_id) = store_with_book();
        let book = store.get_book(&book_id).unwrap().unwrap();
        assert_eq!(book.sequence_order, 1);

        let course = store.get_course(&book.course_id).unwrap().unwrap();
        assert_eq!(course.language_variant, LanguageVariant::BritishEnglish);
        assert_eq!(course.target_levels, vec![CefrLevel::A1, CefrLevel::A2]);
    }

    #[test]
    fn units_inherit_variant_and_sequence() {
        let (store, book_id) = store_with_book();
        let u1 = make_unit(&store, &book_id, "Arrival");
        let u2 = make_unit(&store, &book_id, "Breakfast");
        assert_eq!(u1.sequence_order, 1);
        assert_eq!(u2.sequence_order, 2);
        assert_eq!(u1.language_variant, LanguageVariant::BritishEnglish);
        assert_eq!(u1.status, UnitStatus::VocabPending);

        let listed = store.list_units(&book_id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "Arrival");
    }

    #[test]
    fn missing_lookups_return_none() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_course(&CourseId::new()).unwrap().is_none());
        assert!(store.get_book(&BookId::new()).unwrap().is_none());
        assert!(store.get_unit(&UnitId::new()).unwrap().is_none());
    }

    #[test]
    fn missing_parent_is_an_error() {
        let store = SqliteStore::in_memory().unwrap();
        let result = store.create_book(&NewBook {
            course_id: CourseId::new(),
            name: "Orphan".into(),
            target_level: CefrLevel::B1,
        });
        assert_matches!(result, Err(StoreError::CourseNotFound(_)));
    }

    #[test]
    fn stage_write_and_delete_round_trip() {
        let (store, book_id) = store_with_book();
        let unit = make_unit(&store, &book_id, "Shopping");

        let updated = store
            .write_stage_content(
                &unit.id,
                &vocab_payload(&["receipt", "discount"]),
                UnitStatus::SentencesPending,
            )
            .unwrap();
        assert_eq!(updated.vocabulary_taught, vec!["receipt", "discount"]);

        let fetched = store.get_unit(&unit.id).unwrap().unwrap();
        assert_eq!(fetched.status, UnitStatus::SentencesPending);
        assert!(fetched.vocabulary.is_some());

        let reverted = store
            .delete_stage_content(&unit.id, Stage::Vocabulary, UnitStatus::VocabPending)
            .unwrap();
        assert!(reverted.vocabulary.is_none());
        assert!(reverted.vocabulary_taught.is_empty());
        assert_eq!(reverted.status, UnitStatus::VocabPending);
    }

    #[test]
    fn status_updates_and_aggregations_round_trip() {
        let (store, book_id) = store_with_book();
        let book = store.get_book(&book_id).unwrap().unwrap();
        assert_eq!(store.list_books(&book.course_id).unwrap().len(), 1);

        let u1 = make_unit(&store, &book_id, "One");
        let u2 = make_unit(&store, &book_id, "Two");
        let _ = store
            .write_stage_content(
                &u1.id,
                &vocab_payload(&["ticket"]),
                UnitStatus::SentencesPending,
            )
            .unwrap();

        store.update_unit_status(&u2.id, UnitStatus::Error).unwrap();
        assert_eq!(
            store.get_unit(&u2.id).unwrap().unwrap().status,
            UnitStatus::Error
        );
        assert_matches!(
            store.update_unit_status(&UnitId::new(), UnitStatus::Error),
            Err(StoreError::UnitNotFound(_))
        );

        let taught = store.taught_vocabulary(&book_id, u2.sequence_order).unwrap();
        assert_eq!(taught, vec!["ticket"]);
        assert!(store.used_strategies(&book_id, u2.sequence_order).unwrap().is_empty());
    }

    #[test]
    fn assessment_usage_counts_accumulate() {
        let (store, book_id) = store_with_book();
        let u1 = make_unit(&store, &book_id, "One");
        let u2 = make_unit(&store, &book_id, "Two");
        let u3 = make_unit(&store, &book_id, "Three");

        let section = AssessmentSection {
            activities: vec![
                AssessmentActivity {
                    kind: AssessmentType::GapFill,
                    title: "Fill".into(),
                    instructions: "Fill the gaps.".into(),
                    content: serde_json::json!({}),
                    answer_key: serde_json::json!({}),
                    estimated_minutes: 10,
                },
                AssessmentActivity {
                    kind: AssessmentType::Matching,
                    title: "Match".into(),
                    instructions: "Match pairs.".into(),
                    content: serde_json::json!({}),
                    answer_key: serde_json::json!({}),
                    estimated_minutes: 8,
                },
            ],
            selection_rationale: "gap_fill with matching for coverage".into(),
            skills_assessed: vec!["vocabulary".into()],
            total_estimated_minutes: 18,
        };
        for unit in [&u1, &u2] {
            let _ = store
                .write_stage_content(
                    &unit.id,
                    &StagePayload::Assessments(section.clone()),
                    UnitStatus::Completed,
                )
                .unwrap();
        }

        let usage = store.used_assessments(&book_id, u3.sequence_order).unwrap();
        assert_eq!(usage.get(&AssessmentType::GapFill), Some(&2));
        assert_eq!(usage.get(&AssessmentType::Matching), Some(&2));
        assert!(!usage.contains_key(&AssessmentType::ClozeTest));
    }
}
