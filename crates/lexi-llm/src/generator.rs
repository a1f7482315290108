//! The [`ContentGenerator`] trait and its request types.
//!
//! One `generate` call produces one stage payload. The request carries
//! everything the generator needs to write level-appropriate,
//! non-repetitive content: unit and hierarchy metadata, the aggregated
//! context from prior units, and the engine's strategy or assessment
//! decision for the strategy and assessment stages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lexi_catalog::assessment::AssessmentPlan;
use lexi_catalog::grammar::GrammarSelection;
use lexi_catalog::lexical::StrategySelection;
use lexi_core::content::{AssessmentUsage, ImageInfo, StagePayload};
use lexi_core::ids::UnitId;
use lexi_core::level::{CefrLevel, LanguageVariant, ProgressionLevel};
use lexi_core::unit::{Stage, Unit, UnitType};

use crate::errors::Result;

/// Aggregated facts from the units preceding this one in its book.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RagContext {
    /// Words already taught, deduplicated in first-taught order.
    pub taught_vocabulary: Vec<String>,
    /// Strategy identifiers already applied, in unit order, with
    /// repetition.
    pub used_strategies: Vec<String>,
    /// Assessment activity counts by type.
    pub used_assessments: AssessmentUsage,
    /// Coarse difficulty band from the unit's position.
    pub progression_level: ProgressionLevel,
    /// Taught words per unit of progression so far.
    pub vocabulary_density: f64,
    /// Strategy applications per unit of progression so far.
    pub strategy_density: f64,
}

/// The engine's strategy decision, passed through to the generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SelectedStrategy {
    /// Lexical units: one of the six TIPS strategies.
    Tips(StrategySelection),
    /// Grammar units: one of the two grammar strategies.
    Grammar(GrammarSelection),
}

/// Unit metadata the generator needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitMeta {
    /// Unit ID (used for cache keys and tracing only).
    pub id: UnitId,
    /// Display title.
    pub title: String,
    /// Thematic context, if any.
    pub context: Option<String>,
    /// Position within the book.
    pub sequence_order: i64,
    /// Lexical or grammar.
    pub unit_type: UnitType,
    /// CEFR level.
    pub cefr_level: CefrLevel,
    /// Target-language variant.
    pub language_variant: LanguageVariant,
    /// Vocabulary already generated for this unit, for the stages that
    /// build on it.
    pub vocabulary_words: Vec<String>,
    /// The unit's declared grammar point, for grammar units.
    pub grammar_point: Option<String>,
}

impl UnitMeta {
    /// Build from a stored unit.
    #[must_use]
    pub fn from_unit(unit: &Unit) -> Self {
        Self {
            id: unit.id.clone(),
            title: unit.title.clone(),
            context: unit.context.clone(),
            sequence_order: unit.sequence_order,
            unit_type: unit.unit_type,
            cefr_level: unit.cefr_level,
            language_variant: unit.language_variant,
            vocabulary_words: unit.vocabulary_words(),
            grammar_point: None,
        }
    }

    /// Same as [`from_unit`](Self::from_unit) with a grammar point
    /// attached (grammar units only).
    #[must_use]
    pub fn from_grammar_unit(unit: &Unit, grammar_point: String) -> Self {
        Self {
            grammar_point: Some(grammar_point),
            ..Self::from_unit(unit)
        }
    }
}

/// Course and book metadata the generator needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchyMeta {
    /// Course display name.
    pub course_name: String,
    /// Book display name.
    pub book_name: String,
}

/// A single stage generation request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageRequest {
    /// Which stage to generate.
    pub stage: Stage,
    /// Unit metadata.
    pub unit: UnitMeta,
    /// Hierarchy metadata.
    pub hierarchy: HierarchyMeta,
    /// Aggregated context from prior units.
    pub rag: RagContext,
    /// Strategy decision, present for the strategy stage.
    pub selection: Option<SelectedStrategy>,
    /// Assessment decision, present for the assessments stage.
    pub assessment_plan: Option<AssessmentPlan>,
    /// Image analysis results, present when the unit has images.
    pub image_analysis: Vec<ImageInfo>,
}

/// An external service that writes stage content.
///
/// Implementations must be cancel-safe: the engine wraps `generate` in a
/// timeout and may drop the future.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate the payload for one stage.
    async fn generate(&self, request: &StageRequest) -> Result<StagePayload>;
}
