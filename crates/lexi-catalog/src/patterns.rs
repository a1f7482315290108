//! Vocabulary signal analysis.
//!
//! Inspects a unit's vocabulary items for the structural signals that
//! trigger each TIPS strategy: affix patterns, compound indicators,
//! collocation seeds, fixed-expression potential, idiomatic seeds, and
//! functional chunks. The output feeds the lexical selection engine.

use lexi_core::content::VocabularyItem;
use serde::{Deserialize, Serialize};

/// Common prefixes indicating affixation potential.
const COMMON_PREFIXES: &[&str] = &["un", "re", "pre", "dis", "mis", "over", "under"];

/// Common suffixes indicating affixation potential.
const COMMON_SUFFIXES: &[&str] = &["er", "ed", "ing", "ly", "tion", "ness", "ful", "less"];

/// Substrings indicating compound-noun potential.
const COMPOUND_INDICATORS: &[&str] = &["-", "phone", "room", "book", "house", "work", "time"];

/// High-frequency collocation seed words (verb and intensifier partners).
const COLLOCATION_SEEDS: &[&str] = &["make", "take", "get", "have", "do", "heavy", "strong", "big"];

/// Seed words that commonly anchor idiomatic expressions.
const IDIOMATIC_SEEDS: &[&str] = &["under", "over", "break", "catch", "fall", "get", "come", "go"];

/// Functional/discourse words indicating chunk potential.
const FUNCTIONAL_SEEDS: &[&str] = &["would", "like", "could", "should", "how", "what", "where"];

/// Morphological complexity band, from average word length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphologicalComplexity {
    /// Average word length ≤ 5.
    #[default]
    Low,
    /// Average word length in (5, 7].
    Medium,
    /// Average word length > 7.
    High,
}

/// Structural signals detected in a unit's vocabulary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyPatterns {
    /// Words carry common prefixes or suffixes.
    pub has_affixes: bool,
    /// Words contain compound-indicative substrings.
    pub has_compounds: bool,
    /// High-frequency collocation partners are present.
    pub has_collocations: bool,
    /// Word set is large and varied enough for fixed expressions.
    pub has_fixed_expressions: bool,
    /// Idiomatic seed words are present.
    pub has_idiomatic_potential: bool,
    /// Functional/discourse words are present.
    pub has_functional_chunks: bool,
    /// Morphological complexity band.
    pub morphological_complexity: MorphologicalComplexity,
}

/// Analyze vocabulary items for strategy trigger signals.
///
/// Pure function over the lowercased word forms; word class and phoneme
/// fields are not consulted here.
#[must_use]
pub fn analyze_vocabulary(items: &[VocabularyItem]) -> VocabularyPatterns {
    let words: Vec<String> = items.iter().map(|i| i.word.to_lowercase()).collect();

    let has_affixes = words.iter().any(|w| {
        COMMON_PREFIXES.iter().any(|p| w.starts_with(p))
            || COMMON_SUFFIXES.iter().any(|s| w.ends_with(s))
    });

    let has_compounds = words
        .iter()
        .any(|w| COMPOUND_INDICATORS.iter().any(|c| w.contains(c)));

    let has_collocations = words
        .iter()
        .any(|w| COLLOCATION_SEEDS.contains(&w.as_str()));

    // Long, varied word sets lend themselves to fixed-expression teaching.
    let has_fixed_expressions = words.len() > 10 && words.iter().any(|w| w.len() > 6);

    let has_idiomatic_potential = words.iter().any(|w| IDIOMATIC_SEEDS.contains(&w.as_str()));

    let has_functional_chunks = words.iter().any(|w| FUNCTIONAL_SEEDS.contains(&w.as_str()));

    let avg_len = if words.is_empty() {
        0.0
    } else {
        words.iter().map(String::len).sum::<usize>() as f64 / words.len() as f64
    };
    let morphological_complexity = if avg_len > 7.0 {
        MorphologicalComplexity::High
    } else if avg_len > 5.0 {
        MorphologicalComplexity::Medium
    } else {
        MorphologicalComplexity::Low
    };

    VocabularyPatterns {
        has_affixes,
        has_compounds,
        has_collocations,
        has_fixed_expressions,
        has_idiomatic_potential,
        has_functional_chunks,
        morphological_complexity,
    }
}

#[cfg(test)]
pub(crate) fn items_from_words(words: &[&str]) -> Vec<VocabularyItem> {
    words
        .iter()
        .map(|w| VocabularyItem {
            word: (*w).to_owned(),
            phoneme: String::new(),
            definition: String::new(),
            example: String::new(),
            word_class: "noun".to_owned(),
            frequency_level: "high".to_owned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_affixes_from_prefix_and_suffix() {
        let items = items_from_words(&["unhappy", "cat"]);
        assert!(analyze_vocabulary(&items).has_affixes);

        let items = items_from_words(&["teacher", "cat"]);
        assert!(analyze_vocabulary(&items).has_affixes);

        let items = items_from_words(&["cat", "dog"]);
        assert!(!analyze_vocabulary(&items).has_affixes);
    }

    #[test]
    fn detects_compounds_and_collocation_seeds() {
        let patterns = analyze_vocabulary(&items_from_words(&["classroom", "make"]));
        assert!(patterns.has_compounds);
        assert!(patterns.has_collocations);
    }

    #[test]
    fn fixed_expressions_require_large_varied_sets() {
        let small = items_from_words(&["greeting", "hello"]);
        assert!(!analyze_vocabulary(&small).has_fixed_expressions);

        let large: Vec<&str> = vec![
            "nice", "meet", "you", "see", "soon", "welcome", "morning", "evening", "afternoon",
            "goodbye", "farewell",
        ];
        assert!(analyze_vocabulary(&items_from_words(&large)).has_fixed_expressions);
    }

    #[test]
    fn functional_words_trigger_chunks() {
        let patterns = analyze_vocabulary(&items_from_words(&["would", "tea"]));
        assert!(patterns.has_functional_chunks);
    }

    #[test]
    fn morphological_complexity_bands() {
        let low = analyze_vocabulary(&items_from_words(&["cat", "dog"]));
        assert_eq!(
            low.morphological_complexity,
            MorphologicalComplexity::Low
        );

        let high = analyze_vocabulary(&items_from_words(&["sophisticated", "extraordinary"]));
        assert_eq!(
            high.morphological_complexity,
            MorphologicalComplexity::High
        );
    }

    #[test]
    fn empty_vocabulary_yields_no_signals() {
        let patterns = analyze_vocabulary(&[]);
        assert_eq!(patterns, VocabularyPatterns::default());
    }
}
