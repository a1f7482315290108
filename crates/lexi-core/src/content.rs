//! Stage content payload models.
//!
//! One type per pipeline stage, mirroring what the external content
//! generator returns. All types are serde round-trippable; the store
//! persists them as JSON columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::unit::{AssessmentType, GrammarStrategy, TipStrategy};

// ─────────────────────────────────────────────────────────────────────────────
// Vocabulary
// ─────────────────────────────────────────────────────────────────────────────

/// A single vocabulary item with phonetic transcription.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    /// Word in the target language.
    pub word: String,
    /// IPA transcription.
    pub phoneme: String,
    /// Learner-language definition.
    pub definition: String,
    /// Example of use.
    pub example: String,
    /// Grammatical class (noun, verb, ...).
    pub word_class: String,
    /// Frequency band (high, medium, low).
    pub frequency_level: String,
}

/// Complete vocabulary payload for a unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VocabularySection {
    /// Vocabulary items.
    pub items: Vec<VocabularyItem>,
    /// Total word count.
    pub total_count: usize,
    /// Contextual relevance, 0.0–1.0.
    pub context_relevance: f64,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Sentences
// ─────────────────────────────────────────────────────────────────────────────

/// An example sentence connected to the unit vocabulary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Sentence text.
    pub text: String,
    /// Vocabulary words this sentence exercises.
    pub vocabulary_used: Vec<String>,
    /// Contextual situation (e.g. "restaurant_booking").
    pub context_situation: String,
    /// Complexity band.
    pub complexity_level: String,
}

/// Complete sentences payload for a unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentencesSection {
    /// Sentences.
    pub sentences: Vec<Sentence>,
    /// Fraction of the unit vocabulary covered, 0.0–1.0.
    pub vocabulary_coverage: f64,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Strategy content (tips XOR grammar)
// ─────────────────────────────────────────────────────────────────────────────

/// TIPS strategy payload for lexical units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TipsContent {
    /// Strategy applied.
    pub strategy: TipStrategy,
    /// Strategy title.
    pub title: String,
    /// How the strategy works, applied to this vocabulary.
    pub explanation: String,
    /// Practical examples using unit vocabulary.
    pub examples: Vec<String>,
    /// Practice activities.
    pub practice_suggestions: Vec<String>,
    /// Memory techniques aligned with the strategy.
    pub memory_techniques: Vec<String>,
    /// Unit vocabulary the strategy covers.
    #[serde(default)]
    pub vocabulary_coverage: Vec<String>,
    /// Suggested complementary strategies for later units.
    #[serde(default)]
    pub complementary_strategies: Vec<TipStrategy>,
    /// Why the selection engine chose this strategy. Reproducible from the
    /// same inputs.
    pub selection_rationale: String,
}

/// Grammar strategy payload for grammar units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrammarContent {
    /// Strategy applied.
    pub strategy: GrammarStrategy,
    /// The grammar point being taught.
    pub grammar_point: String,
    /// Systematic explanation of the rule.
    pub systematic_explanation: String,
    /// Usage rules.
    pub usage_rules: Vec<String>,
    /// Contextualized examples.
    pub examples: Vec<String>,
    /// Notes on first-language interference, if the L1 strategy applies.
    #[serde(default)]
    pub l1_interference_notes: Vec<String>,
    /// Common mistakes mapped to corrections.
    #[serde(default)]
    pub common_mistakes: Vec<MistakeCorrection>,
    /// Why the selection engine chose this strategy.
    pub selection_rationale: String,
}

/// A learner mistake and its correction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MistakeCorrection {
    /// The incorrect form learners produce.
    pub mistake: String,
    /// The correct form.
    pub correction: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Assessments
// ─────────────────────────────────────────────────────────────────────────────

/// One assessment activity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssessmentActivity {
    /// Activity type.
    #[serde(rename = "type")]
    pub kind: AssessmentType,
    /// Activity title.
    pub title: String,
    /// Learner-facing instructions.
    pub instructions: String,
    /// Type-specific activity body (sentences, word banks, options, ...).
    pub content: Value,
    /// Answer key.
    pub answer_key: Value,
    /// Estimated completion time in minutes.
    pub estimated_minutes: u32,
}

/// Complete assessment payload: exactly two complementary activities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSection {
    /// The two selected activities.
    pub activities: Vec<AssessmentActivity>,
    /// Why the selection engine chose this pair.
    pub selection_rationale: String,
    /// Combined skills assessed.
    pub skills_assessed: Vec<String>,
    /// Total estimated time in minutes.
    pub total_estimated_minutes: u32,
}

impl AssessmentSection {
    /// The activity types in this section, in order.
    #[must_use]
    pub fn activity_types(&self) -> Vec<AssessmentType> {
        self.activities.iter().map(|a| a.kind).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Q&A
// ─────────────────────────────────────────────────────────────────────────────

/// Teacher-facing questions and answers. A side-annotation: generating it
/// never changes unit status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QaSection {
    /// Questions for students.
    pub questions: Vec<String>,
    /// Full answers for teachers.
    pub answers: Vec<String>,
    /// Pedagogical notes.
    pub pedagogical_notes: Vec<String>,
    /// How difficulty progresses through the questions.
    pub difficulty_progression: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Images
// ─────────────────────────────────────────────────────────────────────────────

/// Analysis result of an image attached to a unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Original filename.
    pub filename: String,
    /// Model-produced description.
    pub description: String,
    /// Objects detected in the image.
    pub objects_detected: Vec<String>,
    /// Text detected in the image, if any.
    pub text_detected: Option<String>,
    /// Relevance to the unit context, 0.0–1.0.
    pub relevance_score: f64,
}

/// Assessment-type usage counts, keyed by type.
///
/// `BTreeMap` keeps iteration deterministic for scoring and rationale.
pub type AssessmentUsage = BTreeMap<AssessmentType, u32>;

// ─────────────────────────────────────────────────────────────────────────────
// Stage payload envelope
// ─────────────────────────────────────────────────────────────────────────────

/// A generated payload tagged with the pipeline stage that produced it.
///
/// The generator returns one of these per call; the store persists the
/// inner section into the unit's matching payload column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StagePayload {
    /// Vocabulary stage output.
    Vocabulary(VocabularySection),
    /// Sentences stage output.
    Sentences(SentencesSection),
    /// Strategy stage output for lexical units.
    Tips(TipsContent),
    /// Strategy stage output for grammar units.
    Grammar(GrammarContent),
    /// Assessments stage output.
    Assessments(AssessmentSection),
    /// Q&A stage output.
    Qa(QaSection),
}

impl StagePayload {
    /// The pipeline stage this payload belongs to.
    #[must_use]
    pub fn stage(&self) -> crate::unit::Stage {
        use crate::unit::Stage;
        match self {
            Self::Vocabulary(_) => Stage::Vocabulary,
            Self::Sentences(_) => Stage::Sentences,
            Self::Tips(_) | Self::Grammar(_) => Stage::Strategy,
            Self::Assessments(_) => Stage::Assessments,
            Self::Qa(_) => Stage::Qa,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn vocabulary_section_round_trips() {
        let section = VocabularySection {
            items: vec![VocabularyItem {
                word: "reservation".into(),
                phoneme: "/ˌrez.ɚˈveɪ.ʃən/".into(),
                definition: "the act of booking".into(),
                example: "I made a reservation for dinner.".into(),
                word_class: "noun".into(),
                frequency_level: "high".into(),
            }],
            total_count: 1,
            context_relevance: 0.9,
            generated_at: Utc::now(),
        };
        let json = serde_json::to_string(&section).unwrap();
        let back: VocabularySection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, section);
    }

    #[test]
    fn assessment_activity_type_field_is_renamed() {
        let activity = AssessmentActivity {
            kind: AssessmentType::GapFill,
            title: "Complete the sentences".into(),
            instructions: "Fill in the blanks.".into(),
            content: serde_json::json!({"sentences": []}),
            answer_key: serde_json::json!({}),
            estimated_minutes: 10,
        };
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "gap_fill");
    }
}
