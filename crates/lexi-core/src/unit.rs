//! Course → Book → Unit hierarchy models and the unit lifecycle enums.
//!
//! A [`Unit`] accumulates up to five optional content payloads (vocabulary,
//! sentences, strategy content, assessments, Q&A). Each payload contributes
//! derived "taught facts" (`vocabulary_taught`, `strategies_used`,
//! `assessments_used`) that later units consume through the context
//! aggregator. The derived lists are projections of the payloads and are
//! rewritten together with the payload in a single store transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::content::{
    AssessmentSection, GrammarContent, ImageInfo, QaSection, SentencesSection, TipsContent,
    VocabularySection,
};
use crate::ids::{BookId, CourseId, UnitId};
use crate::level::{CefrLevel, LanguageVariant};

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle enums
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of unit. Determines which strategy family applies and is
/// immutable after creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// Vocabulary-driven unit taught with one of the six TIPS strategies.
    Lexical,
    /// Grammar-point unit taught with one of the two grammar strategies.
    Grammar,
}

impl UnitType {
    /// String form used in persistence and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Grammar => "grammar",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lexical" => Ok(Self::Lexical),
            "grammar" => Ok(Self::Grammar),
            other => Err(format!("unknown unit type: {other}")),
        }
    }
}

/// Unit pipeline status.
///
/// The pipeline advances `Creating → VocabPending → SentencesPending →
/// ContentPending → AssessmentsPending → Completed`. `Error` is orthogonal:
/// reachable from any state on unrecoverable generation failure, and
/// re-entering the pipeline is done by retrying the in-flight stage (the
/// guard contract keys on payload presence, not status).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Unit row exists, no content yet.
    Creating,
    /// Waiting for vocabulary generation.
    VocabPending,
    /// Waiting for sentence generation.
    SentencesPending,
    /// Waiting for strategy content (tips or grammar).
    ContentPending,
    /// Waiting for assessment generation.
    AssessmentsPending,
    /// All pipeline stages complete.
    Completed,
    /// Last generation failed unrecoverably. Retry re-enters the pipeline.
    Error,
}

impl UnitStatus {
    /// String form used in persistence and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::VocabPending => "vocab_pending",
            Self::SentencesPending => "sentences_pending",
            Self::ContentPending => "content_pending",
            Self::AssessmentsPending => "assessments_pending",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Whether this status ends the pipeline.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creating" => Ok(Self::Creating),
            "vocab_pending" => Ok(Self::VocabPending),
            "sentences_pending" => Ok(Self::SentencesPending),
            "content_pending" => Ok(Self::ContentPending),
            "assessments_pending" => Ok(Self::AssessmentsPending),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown unit status: {other}")),
        }
    }
}

/// One of the five sequential content stages a unit accumulates.
///
/// `Qa` is a side-annotation: it is generated after assessments exist but
/// never advances the pipeline status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Vocabulary items with phonemes and definitions.
    Vocabulary,
    /// Example sentences connected to the vocabulary.
    Sentences,
    /// Pedagogical strategy content (tips XOR grammar by unit type).
    Strategy,
    /// Two selected assessment activities.
    Assessments,
    /// Teacher-facing questions and answers.
    Qa,
}

impl Stage {
    /// Pipeline stages in order, excluding the Q&A side-annotation.
    pub const PIPELINE: [Self; 4] = [
        Self::Vocabulary,
        Self::Sentences,
        Self::Strategy,
        Self::Assessments,
    ];

    /// String form used in logs, errors, and generator requests.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vocabulary => "vocabulary",
            Self::Sentences => "sentences",
            Self::Strategy => "strategy",
            Self::Assessments => "assessments",
            Self::Qa => "qa",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Strategy and assessment identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// One of the six TIPS lexical teaching strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipStrategy {
    /// Prefix/suffix patterns for systematic vocabulary expansion.
    Affixation,
    /// Thematic grouping of compound words by semantic field.
    CompoundNouns,
    /// Natural word partnerships (verb+noun, adjective+noun).
    Collocations,
    /// Crystallized phrases and functional formulas taught as units.
    FixedExpressions,
    /// Expressions with figurative, culturally-loaded meaning.
    Idioms,
    /// Functional language blocks drilled for automatic retrieval.
    Chunks,
}

impl TipStrategy {
    /// All strategies in catalog declaration order (tie-break order).
    pub const ALL: [Self; 6] = [
        Self::Affixation,
        Self::CompoundNouns,
        Self::Collocations,
        Self::FixedExpressions,
        Self::Idioms,
        Self::Chunks,
    ];

    /// Canonical identifier used in persistence and rationale text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Affixation => "affixation",
            Self::CompoundNouns => "compound_nouns",
            Self::Collocations => "collocations",
            Self::FixedExpressions => "fixed_expressions",
            Self::Idioms => "idioms",
            Self::Chunks => "chunks",
        }
    }
}

impl fmt::Display for TipStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TipStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown tip strategy: {s}"))
    }
}

/// One of the two grammar teaching strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarStrategy {
    /// Rule-first presentation with patterns and contextual examples.
    SystematicExplanation,
    /// Contrastive prevention of first-language interference errors.
    L1InterferencePrevention,
}

impl GrammarStrategy {
    /// Both strategies in catalog declaration order (tie-break order).
    pub const ALL: [Self; 2] = [Self::SystematicExplanation, Self::L1InterferencePrevention];

    /// Canonical identifier used in persistence and rationale text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SystematicExplanation => "systematic_explanation",
            Self::L1InterferencePrevention => "l1_interference_prevention",
        }
    }
}

impl fmt::Display for GrammarStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrammarStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| format!("unknown grammar strategy: {s}"))
    }
}

/// One of the seven assessment activity types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    /// General comprehension test with systematic gaps.
    ClozeTest,
    /// Targeted gap filling against a word bank.
    GapFill,
    /// Sentence or word reordering.
    Reordering,
    /// Grammatical structure transformation.
    Transformation,
    /// Multiple choice questions.
    MultipleChoice,
    /// True/false comprehension statements.
    TrueFalse,
    /// Element matching.
    Matching,
}

impl AssessmentType {
    /// All types in catalog declaration order (tie-break order).
    pub const ALL: [Self; 7] = [
        Self::ClozeTest,
        Self::GapFill,
        Self::Reordering,
        Self::Transformation,
        Self::MultipleChoice,
        Self::TrueFalse,
        Self::Matching,
    ];

    /// Canonical identifier used in persistence and rationale text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClozeTest => "cloze_test",
            Self::GapFill => "gap_fill",
            Self::Reordering => "reordering",
            Self::Transformation => "transformation",
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::Matching => "matching",
        }
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssessmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown assessment type: {s}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hierarchy models
// ─────────────────────────────────────────────────────────────────────────────

/// A course: the root of the hierarchy.
///
/// Immutable once referenced by books, except for administrative edits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier.
    pub id: CourseId,
    /// Display name.
    pub name: String,
    /// CEFR levels this course targets. Every book's level must be a member.
    pub target_levels: Vec<CefrLevel>,
    /// Target-language variant.
    pub language_variant: LanguageVariant,
    /// Methodology tags (free-form).
    pub methodology: Vec<String>,
    /// Next book sequence number. Monotonic, never reused.
    pub next_book_sequence: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A book: an ordered container of units at a single CEFR level.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier.
    pub id: BookId,
    /// Owning course.
    pub course_id: CourseId,
    /// Display name.
    pub name: String,
    /// The single CEFR level this book targets.
    pub target_level: CefrLevel,
    /// Position within the course. Unique, assigned monotonically.
    pub sequence_order: i64,
    /// Next unit sequence number. Monotonic, never reused.
    pub next_unit_sequence: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A unit: the pipeline's atom, accumulating content stage by stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier.
    pub id: UnitId,
    /// Owning course.
    pub course_id: CourseId,
    /// Owning book.
    pub book_id: BookId,
    /// Display title.
    pub title: String,
    /// Optional thematic context (e.g. "hotel check-in").
    pub context: Option<String>,
    /// Position within the book. Unique, assigned monotonically.
    pub sequence_order: i64,
    /// Lexical or grammar. Immutable after creation.
    pub unit_type: UnitType,
    /// CEFR level of this unit.
    pub cefr_level: CefrLevel,
    /// Target-language variant.
    pub language_variant: LanguageVariant,
    /// Current pipeline status. A hint; the guard contract keys on payloads.
    pub status: UnitStatus,

    /// Source images attached at creation (vocabulary stage input).
    #[serde(default)]
    pub images: Vec<ImageInfo>,
    /// Vocabulary payload.
    pub vocabulary: Option<VocabularySection>,
    /// Sentences payload.
    pub sentences: Option<SentencesSection>,
    /// TIPS payload. Only ever present on lexical units.
    pub tips: Option<TipsContent>,
    /// Grammar payload. Only ever present on grammar units.
    pub grammar: Option<GrammarContent>,
    /// Assessments payload.
    pub assessments: Option<AssessmentSection>,
    /// Q&A payload (side-annotation, no status effect).
    pub qa: Option<QaSection>,

    /// Derived: words taught by this unit's vocabulary payload.
    #[serde(default)]
    pub vocabulary_taught: Vec<String>,
    /// Derived: strategy identifiers applied by this unit (tip or grammar).
    #[serde(default)]
    pub strategies_used: Vec<String>,
    /// Derived: assessment types used by this unit's assessment payload.
    #[serde(default)]
    pub assessments_used: Vec<AssessmentType>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Unit {
    /// Whether the payload for `stage` is present.
    ///
    /// For [`Stage::Strategy`] either family counts; the wrong-family case
    /// is prevented at write time.
    #[must_use]
    pub fn has_stage(&self, stage: Stage) -> bool {
        match stage {
            Stage::Vocabulary => self.vocabulary.is_some(),
            Stage::Sentences => self.sentences.is_some(),
            Stage::Strategy => self.tips.is_some() || self.grammar.is_some(),
            Stage::Assessments => self.assessments.is_some(),
            Stage::Qa => self.qa.is_some(),
        }
    }

    /// Words of this unit's vocabulary payload, lowercased.
    #[must_use]
    pub fn vocabulary_words(&self) -> Vec<String> {
        self.vocabulary
            .as_ref()
            .map(|v| v.items.iter().map(|i| i.word.to_lowercase()).collect())
            .unwrap_or_default()
    }
}

/// Parse a persisted strategy-identifier list into typed tip strategies,
/// skipping grammar identifiers.
#[must_use]
pub fn tip_strategies(ids: &[String]) -> Vec<TipStrategy> {
    ids.iter().filter_map(|s| s.parse().ok()).collect()
}

/// Parse a persisted strategy-identifier list into typed grammar
/// strategies, skipping tip identifiers.
#[must_use]
pub fn grammar_strategies(ids: &[String]) -> Vec<GrammarStrategy> {
    ids.iter().filter_map(|s| s.parse().ok()).collect()
}
