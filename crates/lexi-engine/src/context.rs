//! RAG context assembly.
//!
//! Pulls the three taught-facts projections from the store and attaches
//! the coarse progression signals derived from the unit's position. The
//! store is re-queried on every generation call; progression state
//! changes between units, so nothing here is cached.

use lexi_core::ids::BookId;
use lexi_core::level::ProgressionLevel;
use lexi_llm::RagContext;
use lexi_store::CourseStore;

use crate::errors::Result;

/// Assemble the context for a unit at `sequence_order` in `book_id`.
///
/// Scope is units with a strictly smaller sequence in the same book;
/// the first unit of a book gets empty structures. Densities are facts
/// per preceding-or-current unit slot, a rough pacing signal for the
/// generator.
pub fn assemble(
    store: &dyn CourseStore,
    book_id: &BookId,
    sequence_order: i64,
) -> Result<RagContext> {
    let taught_vocabulary = store.taught_vocabulary(book_id, sequence_order)?;
    let used_strategies = store.used_strategies(book_id, sequence_order)?;
    let used_assessments = store.used_assessments(book_id, sequence_order)?;

    let slots = sequence_order.max(1) as f64;
    let vocabulary_density = taught_vocabulary.len() as f64 / slots;
    let strategy_density = used_strategies.len() as f64 / slots;

    Ok(RagContext {
        taught_vocabulary,
        used_strategies,
        used_assessments,
        progression_level: ProgressionLevel::from_sequence(sequence_order),
        vocabulary_density,
        strategy_density,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lexi_core::content::{StagePayload, VocabularyItem, VocabularySection};
    use lexi_core::level::{CefrLevel, LanguageVariant};
    use lexi_core::unit::{UnitStatus, UnitType};
    use lexi_store::{MemoryStore, NewBook, NewCourse, NewUnit};

    fn vocabulary(words: &[&str]) -> StagePayload {
        StagePayload::Vocabulary(VocabularySection {
            items: words
                .iter()
                .map(|w| VocabularyItem {
                    word: (*w).to_string(),
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

    #[test]
    fn first_unit_gets_empty_context() {
        let store = MemoryStore::new();
        let course = store
            .create_course(&NewCourse {
                name: "English".into(),
                target_levels: vec![CefrLevel::A1],
                language_variant: LanguageVariant::AmericanEnglish,
                methodology: vec![],
            })
            .unwrap();
        let book = store
            .create_book(&NewBook {
                course_id: course.id.clone(),
                name: "Starter".into(),
                target_level: CefrLevel::A1,
            })
            .unwrap();

        let rag = assemble(&store, &book.id, 1).unwrap();
        assert!(rag.taught_vocabulary.is_empty());
        assert!(rag.used_strategies.is_empty());
        assert!(rag.used_assessments.is_empty());
        assert_eq!(rag.progression_level, ProgressionLevel::Basic);
        assert_eq!(rag.vocabulary_density, 0.0);
    }

    #[test]
    fn densities_and_level_track_position() {
        let store = MemoryStore::new();
        let course = store
            .create_course(&NewCourse {
                name: "English".into(),
                target_levels: vec![CefrLevel::A1],
                language_variant: LanguageVariant::AmericanEnglish,
                methodology: vec![],
            })
            .unwrap();
        let book = store
            .create_book(&NewBook {
                course_id: course.id.clone(),
                name: "Starter".into(),
                target_level: CefrLevel::A1,
            })
            .unwrap();

        for words in [["lamp", "desk"], ["rug", "sofa"]] {
            let unit = store
                .create_unit(&NewUnit {
                    book_id: book.id.clone(),
                    title: "Furniture".into(),
                    context: None,
                    unit_type: UnitType::Lexical,
                    cefr_level: CefrLevel::A1,
                    images: vec![],
                })
                .unwrap();
            let _ = store
                .write_stage_content(
                    &unit.id,
                    &vocabulary(&words),
                    UnitStatus::SentencesPending,
                )
                .unwrap();
        }

        let rag = assemble(&store, &book.id, 5).unwrap();
        assert_eq!(rag.taught_vocabulary.len(), 4);
        assert_eq!(rag.vocabulary_density, 4.0 / 5.0);
        assert_eq!(rag.progression_level, ProgressionLevel::Intermediate);
    }
}
