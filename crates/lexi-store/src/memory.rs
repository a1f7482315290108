//! In-memory [`CourseStore`] for tests and sandboxed runs.
//!
//! Same contract as the `SQLite` store, backed by `parking_lot` locked
//! maps. A single write lock per mutation gives the same atomicity the
//! `SQLite` transactions give: no caller observes a payload without its
//! derived facts.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;

use lexi_core::content::{AssessmentUsage, StagePayload};
use lexi_core::ids::{BookId, CourseId, UnitId};
use lexi_core::unit::{Book, Course, Stage, Unit, UnitStatus};

use crate::errors::{Result, StoreError};
use crate::store::{CourseStore, NewBook, NewCourse, NewUnit, apply_payload, clear_stage};

#[derive(Default)]
struct Inner {
    courses: HashMap<CourseId, Course>,
    books: HashMap<BookId, Book>,
    units: HashMap<UnitId, Unit>,
}

impl Inner {
    /// Units of a book strictly before `before_sequence`, in unit order.
    fn prior_units(&self, book_id: &BookId, before_sequence: i64) -> Vec<&Unit> {
        let mut prior: Vec<&Unit> = self
            .units
            .values()
            .filter(|u| &u.book_id == book_id && u.sequence_order < before_sequence)
            .collect();
        prior.sort_by_key(|u| u.sequence_order);
        prior
    }
}

/// In-memory store. Cheap to construct per test.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CourseStore for MemoryStore {
    fn create_course(&self, new: &NewCourse) -> Result<Course> {
        let course = Course {
            id: CourseId::new(),
            name: new.name.clone(),
            target_levels: new.target_levels.clone(),
            language_variant: new.language_variant,
            methodology: new.methodology.clone(),
            next_book_sequence: 1,
            created_at: Utc::now(),
        };
        let _ = self
            .inner
            .write()
            .courses
            .insert(course.id.clone(), course.clone());
        Ok(course)
    }

    fn get_course(&self, id: &CourseId) -> Result<Option<Course>> {
        Ok(self.inner.read().courses.get(id).cloned())
    }

    fn create_book(&self, new: &NewBook) -> Result<Book> {
        let mut inner = self.inner.write();
        let course = inner
            .courses
            .get_mut(&new.course_id)
            .ok_or_else(|| StoreError::CourseNotFound(new.course_id.to_string()))?;
        let sequence = course.next_book_sequence;
        course.next_book_sequence += 1;

        let book = Book {
            id: BookId::new(),
            course_id: new.course_id.clone(),
            name: new.name.clone(),
            target_level: new.target_level,
            sequence_order: sequence,
            next_unit_sequence: 1,
            created_at: Utc::now(),
        };
        let _ = inner.books.insert(book.id.clone(), book.clone());
        Ok(book)
    }

    fn get_book(&self, id: &BookId) -> Result<Option<Book>> {
        Ok(self.inner.read().books.get(id).cloned())
    }

    fn list_books(&self, course_id: &CourseId) -> Result<Vec<Book>> {
        let inner = self.inner.read();
        let mut books: Vec<Book> = inner
            .books
            .values()
            .filter(|b| &b.course_id == course_id)
            .cloned()
            .collect();
        books.sort_by_key(|b| b.sequence_order);
        Ok(books)
    }

    fn create_unit(&self, new: &NewUnit) -> Result<Unit> {
        let mut inner = self.inner.write();
        let book = inner
            .books
            .get_mut(&new.book_id)
            .ok_or_else(|| StoreError::BookNotFound(new.book_id.to_string()))?;
        let sequence = book.next_unit_sequence;
        book.next_unit_sequence += 1;
        let course_id = book.course_id.clone();

        let variant = inner
            .courses
            .get(&course_id)
            .map(|c| c.language_variant)
            .ok_or_else(|| StoreError::CourseNotFound(course_id.to_string()))?;

        let now = Utc::now();
        let unit = Unit {
            id: UnitId::new(),
            course_id,
            book_id: new.book_id.clone(),
            title: new.title.clone(),
            context: new.context.clone(),
            sequence_order: sequence,
            unit_type: new.unit_type,
            cefr_level: new.cefr_level,
            language_variant: variant,
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
        let _ = inner.units.insert(unit.id.clone(), unit.clone());
        Ok(unit)
    }

    fn get_unit(&self, id: &UnitId) -> Result<Option<Unit>> {
        Ok(self.inner.read().units.get(id).cloned())
    }

    fn list_units(&self, book_id: &BookId) -> Result<Vec<Unit>> {
        let inner = self.inner.read();
        let mut units: Vec<Unit> = inner
            .units
            .values()
            .filter(|u| &u.book_id == book_id)
            .cloned()
            .collect();
        units.sort_by_key(|u| u.sequence_order);
        Ok(units)
    }

    fn update_unit_status(&self, id: &UnitId, status: UnitStatus) -> Result<()> {
        let mut inner = self.inner.write();
        let unit = inner
            .units
            .get_mut(id)
            .ok_or_else(|| StoreError::UnitNotFound(id.to_string()))?;
        unit.status = status;
        unit.updated_at = Utc::now();
        Ok(())
    }

    fn write_stage_content(
        &self,
        id: &UnitId,
        payload: &StagePayload,
        status: UnitStatus,
    ) -> Result<Unit> {
        let mut inner = self.inner.write();
        let unit = inner
            .units
            .get_mut(id)
            .ok_or_else(|| StoreError::UnitNotFound(id.to_string()))?;
        apply_payload(unit, payload);
        unit.status = status;
        unit.updated_at = Utc::now();
        Ok(unit.clone())
    }

    fn delete_stage_content(&self, id: &UnitId, stage: Stage, status: UnitStatus) -> Result<Unit> {
        let mut inner = self.inner.write();
        let unit = inner
            .units
            .get_mut(id)
            .ok_or_else(|| StoreError::UnitNotFound(id.to_string()))?;
        clear_stage(unit, stage);
        unit.status = status;
        unit.updated_at = Utc::now();
        Ok(unit.clone())
    }

    fn taught_vocabulary(&self, book_id: &BookId, before_sequence: i64) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let mut seen = Vec::new();
        for unit in inner.prior_units(book_id, before_sequence) {
            for word in &unit.vocabulary_taught {
                if !seen.contains(word) {
                    seen.push(word.clone());
                }
            }
        }
        Ok(seen)
    }

    fn used_strategies(&self, book_id: &BookId, before_sequence: i64) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let mut used = Vec::new();
        for unit in inner.prior_units(book_id, before_sequence) {
            used.extend(unit.strategies_used.iter().cloned());
        }
        Ok(used)
    }

    fn used_assessments(&self, book_id: &BookId, before_sequence: i64) -> Result<AssessmentUsage> {
        let inner = self.inner.read();
        let mut usage = AssessmentUsage::new();
        for unit in inner.prior_units(book_id, before_sequence) {
            for kind in &unit.assessments_used {
                *usage.entry(*kind).or_insert(0) += 1;
            }
        }
        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use lexi_core::content::{VocabularyItem, VocabularySection};
    use lexi_core::level::{CefrLevel, LanguageVariant};
    use lexi_core::unit::UnitType;

    fn store_with_book() -> (MemoryStore, BookId) {
        let store = MemoryStore::new();
        let course = store
            .create_course(&NewCourse {
                name: "English Foundations".into(),
                target_levels: vec![CefrLevel::A1, CefrLevel::A2],
                language_variant: LanguageVariant::AmericanEnglish,
                methodology: vec!["communicative".into()],
            })
            .unwrap();
        let book = store
            .create_book(&NewBook {
                course_id: course.id,
                name: "Everyday Situations".into(),
                target_level: CefrLevel::A1,
            })
            .unwrap();
        (store, book.id)
    }

    fn vocab_payload(words: &[&str]) -> StagePayload {
        StagePayload::Vocabulary(VocabularySection {
            items: words
                .iter()
                .map(|w| VocabularyItem {
                    word: (*w).into(),
                    phoneme: String::new(),
                    definition: String::new(),
                    example: String::new(),
                    word_class: "noun".into(),
                    frequency_level: "high".into(),
                })
                .collect(),
            total_count: words.len(),
            context_relevance: 1.0,
            generated_at: Utc::now(),
        })
    }

    fn new_unit(book_id: &BookId, title: &str) -> NewUnit {
        NewUnit {
            book_id: book_id.clone(),
            title: title.into(),
            context: None,
            unit_type: UnitType::Lexical,
            cefr_level: CefrLevel::A1,
            images: Vec::new(),
        }
    }

    #[test]
    fn unit_sequences_are_monotonic_per_book() {
        let (store, book_id) = store_with_book();
        let u1 = store.create_unit(&new_unit(&book_id, "Greetings")).unwrap();
        let u2 = store.create_unit(&new_unit(&book_id, "Numbers")).unwrap();
        assert_eq!(u1.sequence_order, 1);
        assert_eq!(u2.sequence_order, 2);
        assert_eq!(u1.status, UnitStatus::VocabPending);
    }

    #[test]
    fn missing_parents_are_errors_missing_lookups_are_none() {
        let store = MemoryStore::new();
        let missing = store.get_unit(&UnitId::new()).unwrap();
        assert!(missing.is_none());

        let err = store.create_unit(&new_unit(&BookId::new(), "Orphan"));
        assert_matches!(err, Err(StoreError::BookNotFound(_)));
    }

    #[test]
    fn write_stage_derives_taught_facts_atomically() {
        let (store, book_id) = store_with_book();
        let unit = store.create_unit(&new_unit(&book_id, "Travel")).unwrap();

        let updated = store
            .write_stage_content(
                &unit.id,
                &vocab_payload(&["ticket", "platform"]),
                UnitStatus::SentencesPending,
            )
            .unwrap();
        assert_eq!(updated.vocabulary_taught, vec!["ticket", "platform"]);
        assert_eq!(updated.status, UnitStatus::SentencesPending);

        let reverted = store
            .delete_stage_content(&unit.id, Stage::Vocabulary, UnitStatus::VocabPending)
            .unwrap();
        assert!(reverted.vocabulary.is_none());
        assert!(reverted.vocabulary_taught.is_empty());
    }

    #[test]
    fn aggregation_scopes_to_prior_units_only() {
        let (store, book_id) = store_with_book();
        let u1 = store.create_unit(&new_unit(&book_id, "One")).unwrap();
        let u2 = store.create_unit(&new_unit(&book_id, "Two")).unwrap();
        let u3 = store.create_unit(&new_unit(&book_id, "Three")).unwrap();

        let _ = store
            .write_stage_content(
                &u1.id,
                &vocab_payload(&["apple", "bread"]),
                UnitStatus::SentencesPending,
            )
            .unwrap();
        let _ = store
            .write_stage_content(
                &u2.id,
                &vocab_payload(&["bread", "cheese"]),
                UnitStatus::SentencesPending,
            )
            .unwrap();
        let _ = store
            .write_stage_content(
                &u3.id,
                &vocab_payload(&["date"]),
                UnitStatus::SentencesPending,
            )
            .unwrap();

        // Third unit sees the first two, deduplicated in first-taught order.
        let taught = store.taught_vocabulary(&book_id, u3.sequence_order).unwrap();
        assert_eq!(taught, vec!["apple", "bread", "cheese"]);

        // First unit sees nothing.
        let none = store.taught_vocabulary(&book_id, u1.sequence_order).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn aggregation_never_crosses_book_boundaries() {
        let (store, book_id) = store_with_book();
        let course_id = store.get_book(&book_id).unwrap().unwrap().course_id;
        let sibling = store
            .create_book(&NewBook {
                course_id,
                name: "At Work".into(),
                target_level: CefrLevel::A2,
            })
            .unwrap();

        // Both units sit at sequence 1 in their own books, so any leak
        // across books would show up below.
        let home = store.create_unit(&new_unit(&book_id, "Home")).unwrap();
        let office = store.create_unit(&new_unit(&sibling.id, "Office")).unwrap();
        let _ = store
            .write_stage_content(
                &home.id,
                &vocab_payload(&["lamp", "sofa"]),
                UnitStatus::SentencesPending,
            )
            .unwrap();
        let _ = store
            .write_stage_content(
                &office.id,
                &vocab_payload(&["printer", "stapler"]),
                UnitStatus::SentencesPending,
            )
            .unwrap();

        let taught = store.taught_vocabulary(&book_id, home.sequence_order + 1).unwrap();
        assert_eq!(taught, vec!["lamp", "sofa"]);
        let taught = store
            .taught_vocabulary(&sibling.id, office.sequence_order + 1)
            .unwrap();
        assert_eq!(taught, vec!["printer", "stapler"]);
    }
}
