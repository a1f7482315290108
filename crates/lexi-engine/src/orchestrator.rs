//! The progression orchestrator.
//!
//! One entry point per content stage. Each follows the same shape:
//! acquire the unit's generation slot, load and guard, assemble the RAG
//! context, run the selection engine where the stage needs one, call the
//! content generator under a timeout, validate the payload, and commit
//! payload + derived facts + status in one store transaction. Failures
//! before the write leave the unit untouched; generator failures flag
//! the unit `Error` so callers can surface and retry.

use std::sync::Arc;
use std::time::Duration;

use lexi_catalog::{
    analyze_vocabulary, identify_grammar_point, select_assessment_pair, select_grammar_strategy,
    select_tip_strategy,
};
use lexi_core::content::{StagePayload, VocabularyItem};
use lexi_core::ids::UnitId;
use lexi_core::unit::{
    Book, Course, Stage, Unit, UnitStatus, UnitType, grammar_strategies, tip_strategies,
};
use lexi_llm::{
    ContentGenerator, HierarchyMeta, ImageAnalyzer, RagContext, SelectedStrategy, StageRequest,
    UnitMeta,
};
use lexi_settings::{EngineSettings, RepeatPolicy};
use lexi_store::CourseStore;
use metrics::{counter, gauge};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::context;
use crate::errors::{EngineError, Result};
use crate::locks::UnitLocks;
use crate::progress;

/// The unit progression engine.
///
/// Cheap to share behind an [`Arc`]; all state is internally
/// synchronized.
pub struct ProgressionEngine {
    pub(crate) store: Arc<dyn CourseStore>,
    generator: Arc<dyn ContentGenerator>,
    pub(crate) analyzer: Arc<dyn ImageAnalyzer>,
    settings: EngineSettings,
    locks: UnitLocks,
    shutdown: CancellationToken,
}

impl ProgressionEngine {
    /// Create an engine over the given store and generator.
    #[must_use]
    pub fn new(
        store: Arc<dyn CourseStore>,
        generator: Arc<dyn ContentGenerator>,
        analyzer: Arc<dyn ImageAnalyzer>,
        settings: EngineSettings,
    ) -> Self {
        let locks = UnitLocks::new(settings.max_concurrent_generations);
        Self {
            store,
            generator,
            analyzer,
            settings,
            locks,
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancel all pending generator calls. In-flight store writes still
    /// complete.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Stage entry points
    // ─────────────────────────────────────────────────────────────────────

    /// Generate the vocabulary payload.
    #[instrument(skip(self), fields(unit_id = %id))]
    pub async fn generate_vocabulary(&self, id: &UnitId) -> Result<Unit> {
        self.generate_stage(id, Stage::Vocabulary).await
    }

    /// Generate the sentences payload.
    #[instrument(skip(self), fields(unit_id = %id))]
    pub async fn generate_sentences(&self, id: &UnitId) -> Result<Unit> {
        self.generate_stage(id, Stage::Sentences).await
    }

    /// Generate the strategy payload (tips or grammar by unit type).
    #[instrument(skip(self), fields(unit_id = %id))]
    pub async fn generate_strategy(&self, id: &UnitId) -> Result<Unit> {
        self.generate_stage(id, Stage::Strategy).await
    }

    /// Generate the assessments payload.
    #[instrument(skip(self), fields(unit_id = %id))]
    pub async fn generate_assessments(&self, id: &UnitId) -> Result<Unit> {
        self.generate_stage(id, Stage::Assessments).await
    }

    /// Generate the Q&A side-annotation. Never changes status.
    #[instrument(skip(self), fields(unit_id = %id))]
    pub async fn generate_qa(&self, id: &UnitId) -> Result<Unit> {
        self.generate_stage(id, Stage::Qa).await
    }

    /// Delete a stage's content, reverting the unit to that stage's
    /// pending status. Later payloads are kept; the guard contract
    /// re-validates them on regeneration.
    #[instrument(skip(self), fields(unit_id = %id))]
    pub async fn delete_stage(&self, id: &UnitId, stage: Stage) -> Result<Unit> {
        let _guard = self.locks.acquire(id).await?;
        let unit = self.load_unit(id)?;
        if !unit.has_stage(stage) {
            return Err(EngineError::Validation(format!(
                "unit has no {stage} content to delete"
            )));
        }
        let status = progress::status_after_delete(stage, unit.status);
        let updated = self.store.delete_stage_content(id, stage, status)?;
        info!(%stage, status = %updated.status, "deleted stage content");
        Ok(updated)
    }

    /// Clear the `Error` flag, restoring the status the unit's payloads
    /// imply.
    #[instrument(skip(self), fields(unit_id = %id))]
    pub async fn clear_error(&self, id: &UnitId) -> Result<Unit> {
        let _guard = self.locks.acquire(id).await?;
        let unit = self.load_unit(id)?;
        if unit.status != UnitStatus::Error {
            return Err(EngineError::Validation(format!(
                "unit is {}, not in error",
                unit.status
            )));
        }
        let status = progress::effective_status(&unit);
        self.store.update_unit_status(id, status)?;
        self.load_unit(id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Core flow
    // ─────────────────────────────────────────────────────────────────────

    async fn generate_stage(&self, id: &UnitId, stage: Stage) -> Result<Unit> {
        let _guard = self.locks.acquire(id).await?;

        let unit = self.load_unit(id)?;
        progress::check_stage(&unit, stage)?;

        let book = self
            .store
            .get_book(&unit.book_id)?
            .ok_or_else(|| EngineError::BookNotFound(unit.book_id.as_str().to_string()))?;
        let course = self
            .store
            .get_course(&unit.course_id)?
            .ok_or_else(|| EngineError::CourseNotFound(unit.course_id.as_str().to_string()))?;

        let rag = context::assemble(self.store.as_ref(), &unit.book_id, unit.sequence_order)?;
        let request = build_request(stage, &unit, &course, &book, rag)?;

        counter!("engine_generations_total", "stage" => stage.as_str()).increment(1);
        gauge!("engine_active_generations").increment(1.0);
        let outcome = self.call_generator(&request).await;
        gauge!("engine_active_generations").decrement(1.0);

        let mut payload = match outcome {
            Ok(payload) => payload,
            Err(err) => {
                counter!("engine_generation_failures_total", "stage" => stage.as_str())
                    .increment(1);
                self.flag_error(id, &err);
                return Err(err);
            }
        };

        validate_payload(&unit, stage, &request, &mut payload)?;
        if let StagePayload::Vocabulary(section) = &mut payload {
            apply_repeat_policy(
                section,
                &request.rag.taught_vocabulary,
                self.settings.vocabulary_repeat_policy,
            )?;
        }

        let current = if unit.status == UnitStatus::Error {
            progress::effective_status(&unit)
        } else {
            unit.status
        };
        let next = progress::status_after(stage, current);
        let updated = self.store.write_stage_content(id, &payload, next)?;
        info!(%stage, status = %updated.status, "stage generated");
        Ok(updated)
    }

    async fn call_generator(&self, request: &StageRequest) -> Result<StagePayload> {
        let timeout_secs = self.settings.generator_timeout_secs;
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => Err(EngineError::Cancelled),
            result = tokio::time::timeout(
                Duration::from_secs(timeout_secs),
                self.generator.generate(request),
            ) => match result {
                Ok(inner) => inner.map_err(EngineError::from),
                Err(_) => Err(EngineError::Timeout {
                    stage: request.stage,
                    timeout_secs,
                }),
            },
        }
    }

    /// Flag the unit `Error` after a generator-side failure. Engine-side
    /// rejections (guards, validation, busy) never flag.
    fn flag_error(&self, id: &UnitId, err: &EngineError) {
        if matches!(err, EngineError::Generator(_) | EngineError::Timeout { .. }) {
            if let Err(store_err) = self.store.update_unit_status(id, UnitStatus::Error) {
                warn!(unit_id = %id, error = %store_err, "failed to flag unit error");
            }
        }
    }

    pub(crate) fn load_unit(&self, id: &UnitId) -> Result<Unit> {
        self.store
            .get_unit(id)?
            .ok_or_else(|| EngineError::UnitNotFound(id.as_str().to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request assembly
// ─────────────────────────────────────────────────────────────────────────────

fn build_request(
    stage: Stage,
    unit: &Unit,
    course: &Course,
    book: &Book,
    rag: RagContext,
) -> Result<StageRequest> {
    let mut meta = UnitMeta::from_unit(unit);
    let mut selection = None;
    let mut assessment_plan = None;

    match stage {
        Stage::Strategy => match unit.unit_type {
            UnitType::Lexical => {
                let items: &[VocabularyItem] = unit
                    .vocabulary
                    .as_ref()
                    .map_or(&[], |v| v.items.as_slice());
                let patterns = analyze_vocabulary(items);
                let used = tip_strategies(&rag.used_strategies);
                selection = Some(SelectedStrategy::Tips(select_tip_strategy(
                    &patterns,
                    unit.cefr_level,
                    &used,
                )));
            }
            UnitType::Grammar => {
                let words = unit.vocabulary_words();
                let point = identify_grammar_point(&unit.title, unit.context.as_deref(), &words);
                let used = grammar_strategies(&rag.used_strategies);
                selection = Some(SelectedStrategy::Grammar(select_grammar_strategy(
                    &point, &words, &used,
                )));
                meta = UnitMeta::from_grammar_unit(unit, point);
            }
        },
        Stage::Assessments => {
            assessment_plan = Some(select_assessment_pair(
                unit.unit_type,
                unit.cefr_level,
                &rag.used_assessments,
            )?);
        }
        Stage::Vocabulary | Stage::Sentences | Stage::Qa => {}
    }

    let image_analysis = if stage == Stage::Vocabulary {
        unit.images.clone()
    } else {
        vec![]
    };

    Ok(StageRequest {
        stage,
        unit: meta,
        hierarchy: HierarchyMeta {
            course_name: course.name.clone(),
            book_name: book.name.clone(),
        },
        rag,
        selection,
        assessment_plan,
        image_analysis,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Payload validation
// ─────────────────────────────────────────────────────────────────────────────

fn validate_payload(
    unit: &Unit,
    stage: Stage,
    request: &StageRequest,
    payload: &mut StagePayload,
) -> Result<()> {
    if payload.stage() != stage {
        return Err(EngineError::Validation(format!(
            "generator returned a {} payload for the {stage} stage",
            payload.stage()
        )));
    }

    match payload {
        StagePayload::Tips(tips) => {
            if unit.unit_type != UnitType::Lexical {
                return Err(EngineError::Validation(
                    "tips content is only valid on lexical units".into(),
                ));
            }
            if let Some(SelectedStrategy::Tips(selected)) = &request.selection {
                if tips.strategy != selected.strategy {
                    return Err(EngineError::Validation(format!(
                        "generator used strategy {}, selection chose {}",
                        tips.strategy, selected.strategy
                    )));
                }
            }
        }
        StagePayload::Grammar(grammar) => {
            if unit.unit_type != UnitType::Grammar {
                return Err(EngineError::Validation(
                    "grammar content is only valid on grammar units".into(),
                ));
            }
            if let Some(SelectedStrategy::Grammar(selected)) = &request.selection {
                if grammar.strategy != selected.strategy {
                    return Err(EngineError::Validation(format!(
                        "generator used strategy {}, selection chose {}",
                        grammar.strategy, selected.strategy
                    )));
                }
            }
        }
        StagePayload::Assessments(section) => {
            let types = section.activity_types();
            if types.len() != 2 || types[0] == types[1] {
                return Err(EngineError::Validation(format!(
                    "assessments payload must hold exactly two distinct activities, got {}",
                    types.len()
                )));
            }
            if let Some(plan) = &request.assessment_plan {
                let planned = plan.activities;
                if !(types.contains(&planned[0]) && types.contains(&planned[1])) {
                    return Err(EngineError::Validation(format!(
                        "generator produced {}/{}, selection chose {}/{}",
                        types[0], types[1], planned[0], planned[1]
                    )));
                }
            }
        }
        StagePayload::Vocabulary(_) | StagePayload::Sentences(_) | StagePayload::Qa(_) => {}
    }
    Ok(())
}

/// Enforce the vocabulary repeat policy against already-taught words.
///
/// `Soft` relies on the avoid-list in the prompt and accepts repeats.
/// `Hard` filters repeats out of the payload and rejects it when nothing
/// new remains.
fn apply_repeat_policy(
    section: &mut lexi_core::content::VocabularySection,
    taught: &[String],
    policy: RepeatPolicy,
) -> Result<()> {
    if policy == RepeatPolicy::Soft {
        return Ok(());
    }
    let before = section.items.len();
    section
        .items
        .retain(|item| !taught.iter().any(|t| t.eq_ignore_ascii_case(&item.word)));
    section.total_count = section.items.len();
    if section.items.len() < before {
        debug!(
            removed = before - section.items.len(),
            "filtered already-taught vocabulary"
        );
    }
    if section.items.is_empty() {
        return Err(EngineError::Validation(
            "generator returned only previously taught vocabulary".into(),
        ));
    }
    Ok(())
}
