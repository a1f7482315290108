//! Assessment activity catalog and the 2-of-7 selection engine.
//!
//! Each of the seven activity types is tagged with the unit types it
//! applies to, the skills it exercises, and a CEFR difficulty band. The
//! engine picks exactly two distinct types: the first by variety pressure
//! against the book's usage counts plus band fit, the second re-scored to
//! favor skills the first pick left uncovered.

use lexi_core::content::AssessmentUsage;
use lexi_core::level::CefrLevel;
use lexi_core::unit::{AssessmentType, UnitType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::SelectionError;

/// Skill a given activity type exercises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// Text comprehension through reading.
    Reading,
    /// Grammatical form and accuracy.
    Grammar,
    /// Word knowledge and recall.
    Vocabulary,
    /// Ordering of words and clauses.
    SentenceStructure,
    /// Structural manipulation of sentences.
    Syntax,
    /// Global understanding of meaning.
    Comprehension,
}

impl Skill {
    /// Canonical identifier used in generated content.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Grammar => "grammar",
            Self::Vocabulary => "vocabulary",
            Self::SentenceStructure => "sentence_structure",
            Self::Syntax => "syntax",
            Self::Comprehension => "comprehension",
        }
    }
}

/// CEFR range an activity type is pitched at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DifficultyBand {
    /// A1 through B1.
    BeginnerToIntermediate,
    /// B1 through B2.
    Intermediate,
    /// A1 through C1.
    BeginnerToAdvanced,
    /// B2 through C2.
    Advanced,
}

impl DifficultyBand {
    fn range(self) -> (CefrLevel, CefrLevel) {
        match self {
            Self::BeginnerToIntermediate => (CefrLevel::A1, CefrLevel::B1),
            Self::Intermediate => (CefrLevel::B1, CefrLevel::B2),
            Self::BeginnerToAdvanced => (CefrLevel::A1, CefrLevel::C1),
            Self::Advanced => (CefrLevel::B2, CefrLevel::C2),
        }
    }

    /// Whether `level` falls inside the band.
    #[must_use]
    pub fn contains(self, level: CefrLevel) -> bool {
        let (lo, hi) = self.range();
        level >= lo && level <= hi
    }

    /// Whether `level` borders the band without falling inside it.
    #[must_use]
    pub fn adjacent(self, level: CefrLevel) -> bool {
        let (lo, hi) = self.range();
        let idx = level.index();
        idx + 1 == lo.index() || idx == hi.index() + 1
    }
}

/// Unit types an activity applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Applicability {
    Both,
    LexicalOnly,
    GrammarOnly,
}

impl Applicability {
    fn accepts(self, unit_type: UnitType) -> bool {
        match self {
            Self::Both => true,
            Self::LexicalOnly => unit_type == UnitType::Lexical,
            Self::GrammarOnly => unit_type == UnitType::Grammar,
        }
    }
}

/// One row of the assessment catalog.
pub struct AssessmentProfile {
    /// The activity type this row describes.
    pub activity: AssessmentType,
    applicability: Applicability,
    /// Skills the activity exercises.
    pub skills: &'static [Skill],
    /// CEFR range the activity is pitched at.
    pub band: DifficultyBand,
}

impl AssessmentProfile {
    /// Whether this activity applies to the given unit type.
    #[must_use]
    pub fn applies_to(&self, unit_type: UnitType) -> bool {
        self.applicability.accepts(unit_type)
    }
}

/// The seven activity types in declaration (tie-break) order.
pub const ASSESSMENT_CATALOG: [AssessmentProfile; 7] = [
    AssessmentProfile {
        activity: AssessmentType::ClozeTest,
        applicability: Applicability::Both,
        skills: &[Skill::Reading, Skill::Grammar, Skill::Vocabulary],
        band: DifficultyBand::Intermediate,
    },
    AssessmentProfile {
        activity: AssessmentType::GapFill,
        applicability: Applicability::Both,
        skills: &[Skill::Grammar, Skill::Vocabulary],
        band: DifficultyBand::BeginnerToIntermediate,
    },
    AssessmentProfile {
        activity: AssessmentType::Reordering,
        applicability: Applicability::GrammarOnly,
        skills: &[Skill::Grammar, Skill::SentenceStructure],
        band: DifficultyBand::Intermediate,
    },
    AssessmentProfile {
        activity: AssessmentType::Transformation,
        applicability: Applicability::GrammarOnly,
        skills: &[Skill::Grammar, Skill::Syntax],
        band: DifficultyBand::Advanced,
    },
    AssessmentProfile {
        activity: AssessmentType::MultipleChoice,
        applicability: Applicability::Both,
        skills: &[Skill::Grammar, Skill::Vocabulary, Skill::Reading],
        band: DifficultyBand::BeginnerToAdvanced,
    },
    AssessmentProfile {
        activity: AssessmentType::TrueFalse,
        applicability: Applicability::LexicalOnly,
        skills: &[Skill::Reading, Skill::Comprehension],
        band: DifficultyBand::BeginnerToIntermediate,
    },
    AssessmentProfile {
        activity: AssessmentType::Matching,
        applicability: Applicability::LexicalOnly,
        skills: &[Skill::Vocabulary, Skill::Comprehension],
        band: DifficultyBand::BeginnerToIntermediate,
    },
];

/// Result of an assessment pair selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssessmentPlan {
    /// Exactly two distinct activity types, selection order preserved.
    pub activities: [AssessmentType; 2],
    /// Human-readable reasons for each pick.
    pub rationale: Vec<String>,
    /// Union of the skills the pair exercises, deduplicated and sorted.
    pub skills_covered: Vec<Skill>,
}

impl AssessmentPlan {
    /// Whether the plan exercises the given skill.
    #[must_use]
    pub fn covers(&self, skill: Skill) -> bool {
        self.skills_covered.contains(&skill)
    }
}

fn usage_of(activity: AssessmentType, usage: &AssessmentUsage) -> u32 {
    usage.get(&activity).copied().unwrap_or(0)
}

/// Variety + novelty + band-fit score for a first pick.
fn base_score(
    profile: &AssessmentProfile,
    level: CefrLevel,
    usage: &AssessmentUsage,
    reasons: &mut Vec<String>,
) -> i32 {
    let uses = usage_of(profile.activity, usage);
    let mut score = 25 - 10 * i32::try_from(uses.min(2)).unwrap_or(2);
    if uses > 0 {
        reasons.push(format!("{uses} prior uses in this book"));
    } else {
        score += 10;
        reasons.push("not yet used in this book (+10)".to_string());
    }
    if profile.band.contains(level) {
        score += 15;
        reasons.push(format!("pitched at {level} (+15)"));
    } else if profile.band.adjacent(level) {
        score += 5;
        reasons.push(format!("near the {level} band (+5)"));
    }
    score
}

/// Select exactly two assessment activity types for a unit.
///
/// Pure and deterministic. `usage` is the book's prior per-type activity
/// counts from the context aggregator. Returns
/// [`SelectionError::Exhausted`] when fewer than two catalog entries apply
/// to the unit type.
pub fn select_assessment_pair(
    unit_type: UnitType,
    level: CefrLevel,
    usage: &AssessmentUsage,
) -> Result<AssessmentPlan, SelectionError> {
    let applicable: Vec<&AssessmentProfile> = ASSESSMENT_CATALOG
        .iter()
        .filter(|p| p.applies_to(unit_type))
        .collect();

    if applicable.len() < 2 {
        return Err(SelectionError::Exhausted {
            unit_type,
            required: 2,
            available: applicable.len(),
        });
    }

    let mut rationale = Vec::new();

    // First pick: variety pressure and band fit.
    let mut first = applicable[0];
    let mut first_score = i32::MIN;
    let mut first_reasons = Vec::new();
    for profile in &applicable {
        let mut reasons = Vec::new();
        let score = base_score(profile, level, usage, &mut reasons);
        debug!(activity = %profile.activity, score, "scored first pick");
        if score > first_score {
            first_score = score;
            first = profile;
            first_reasons = reasons;
        }
    }
    rationale.push(format!(
        "{}: {} (score {first_score})",
        first.activity,
        first_reasons.join(", ")
    ));

    // Second pick: same base plus skill-complement pressure.
    let mut second: Option<&AssessmentProfile> = None;
    let mut second_score = i32::MIN;
    let mut second_reasons = Vec::new();
    for profile in &applicable {
        if profile.activity == first.activity {
            continue;
        }
        let mut reasons = Vec::new();
        let mut score = base_score(profile, level, usage, &mut reasons);
        let fresh = profile
            .skills
            .iter()
            .filter(|s| !first.skills.contains(s))
            .count();
        let overlap = profile.skills.len() - fresh;
        score += 8 * i32::try_from(fresh).unwrap_or(0);
        score -= 6 * i32::try_from(overlap).unwrap_or(0);
        if fresh > 0 {
            reasons.push(format!("adds {fresh} uncovered skills (+{})", 8 * fresh));
        }
        if overlap > 0 {
            reasons.push(format!("{overlap} overlapping skills (-{})", 6 * overlap));
        }
        debug!(activity = %profile.activity, score, "scored second pick");
        if score > second_score {
            second_score = score;
            second = Some(profile);
            second_reasons = reasons;
        }
    }
    // At least two applicable entries were verified above.
    let Some(second) = second else {
        return Err(SelectionError::Exhausted {
            unit_type,
            required: 2,
            available: 1,
        });
    };
    rationale.push(format!(
        "{}: {} (score {second_score})",
        second.activity,
        second_reasons.join(", ")
    ));

    let mut skills_covered: Vec<Skill> = first
        .skills
        .iter()
        .chain(second.skills.iter())
        .copied()
        .collect();
    skills_covered.sort_unstable();
    skills_covered.dedup();

    Ok(AssessmentPlan {
        activities: [first.activity, second.activity],
        rationale,
        skills_covered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(pairs: &[(AssessmentType, u32)]) -> AssessmentUsage {
        pairs.iter().copied().collect()
    }

    #[test]
    fn grammar_only_types_never_offered_to_lexical_units() {
        for _ in 0..3 {
            let plan = select_assessment_pair(UnitType::Lexical, CefrLevel::B2, &usage(&[]))
                .expect("two lexical types exist");
            assert!(!plan.activities.contains(&AssessmentType::Reordering));
            assert!(!plan.activities.contains(&AssessmentType::Transformation));
        }
    }

    #[test]
    fn lexical_only_types_never_offered_to_grammar_units() {
        let plan = select_assessment_pair(UnitType::Grammar, CefrLevel::A2, &usage(&[]))
            .expect("grammar types exist");
        assert!(!plan.activities.contains(&AssessmentType::TrueFalse));
        assert!(!plan.activities.contains(&AssessmentType::Matching));
    }

    #[test]
    fn returns_two_distinct_types() {
        let plan = select_assessment_pair(UnitType::Lexical, CefrLevel::A1, &usage(&[]))
            .expect("selection succeeds");
        assert_ne!(plan.activities[0], plan.activities[1]);
        assert_eq!(plan.rationale.len(), 2);
    }

    #[test]
    fn fresh_book_at_a1_picks_in_band_gap_fill_first() {
        let plan = select_assessment_pair(UnitType::Lexical, CefrLevel::A1, &usage(&[]))
            .expect("selection succeeds");
        // All unused (35 base); gap_fill, multiple_choice, true_false and
        // matching are in band (+15) and tie at 50; catalog order keeps
        // gap_fill first.
        assert_eq!(plan.activities[0], AssessmentType::GapFill);
    }

    #[test]
    fn second_pick_complements_first_skills() {
        let plan = select_assessment_pair(UnitType::Lexical, CefrLevel::A1, &usage(&[]))
            .expect("selection succeeds");
        assert_eq!(plan.activities[0], AssessmentType::GapFill);
        // true_false adds reading + comprehension with zero overlap
        // against gap_fill's grammar + vocabulary.
        assert_eq!(plan.activities[1], AssessmentType::TrueFalse);
        assert!(plan.covers(Skill::Comprehension));
        assert!(plan.covers(Skill::Grammar));
    }

    #[test]
    fn variety_pressure_rotates_away_from_heavy_use() {
        let heavy = usage(&[
            (AssessmentType::GapFill, 3),
            (AssessmentType::TrueFalse, 2),
        ]);
        let plan = select_assessment_pair(UnitType::Lexical, CefrLevel::A1, &heavy)
            .expect("selection succeeds");
        assert!(!plan.activities.contains(&AssessmentType::GapFill));
        assert!(plan
            .rationale
            .iter()
            .all(|r| !r.starts_with("gap_fill")));
    }

    #[test]
    fn transformation_reserved_for_advanced_grammar() {
        let low = select_assessment_pair(UnitType::Grammar, CefrLevel::A1, &usage(&[]))
            .expect("selection succeeds");
        assert!(!low.activities.contains(&AssessmentType::Transformation));

        let high = select_assessment_pair(
            UnitType::Grammar,
            CefrLevel::C2,
            &usage(&[
                (AssessmentType::ClozeTest, 1),
                (AssessmentType::GapFill, 1),
                (AssessmentType::Reordering, 1),
                (AssessmentType::MultipleChoice, 1),
            ]),
        )
        .expect("selection succeeds");
        assert!(high.activities.contains(&AssessmentType::Transformation));
    }

    #[test]
    fn selection_is_reproducible() {
        let used = usage(&[(AssessmentType::ClozeTest, 2), (AssessmentType::Matching, 1)]);
        let a = select_assessment_pair(UnitType::Lexical, CefrLevel::B1, &used);
        let b = select_assessment_pair(UnitType::Lexical, CefrLevel::B1, &used);
        assert_eq!(a.ok(), b.ok());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn any_unit_type() -> impl Strategy<Value = UnitType> {
            prop_oneof![Just(UnitType::Lexical), Just(UnitType::Grammar)]
        }

        fn any_level() -> impl Strategy<Value = CefrLevel> {
            (0usize..CefrLevel::ALL.len()).prop_map(|i| CefrLevel::ALL[i])
        }

        fn any_usage() -> impl Strategy<Value = AssessmentUsage> {
            proptest::collection::vec(
                ((0usize..AssessmentType::ALL.len()), 0u32..6),
                0..AssessmentType::ALL.len(),
            )
            .prop_map(|pairs| {
                pairs
                    .into_iter()
                    .map(|(i, n)| (AssessmentType::ALL[i], n))
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn same_inputs_same_plan(
                unit_type in any_unit_type(),
                level in any_level(),
                usage in any_usage(),
            ) {
                let a = select_assessment_pair(unit_type, level, &usage).unwrap();
                let b = select_assessment_pair(unit_type, level, &usage).unwrap();
                prop_assert_eq!(a, b);
            }

            #[test]
            fn plan_is_distinct_and_applicable(
                unit_type in any_unit_type(),
                level in any_level(),
                usage in any_usage(),
            ) {
                let plan = select_assessment_pair(unit_type, level, &usage).unwrap();
                prop_assert_ne!(plan.activities[0], plan.activities[1]);
                for activity in plan.activities {
                    let profile = ASSESSMENT_CATALOG
                        .iter()
                        .find(|p| p.activity == activity)
                        .unwrap();
                    prop_assert!(profile.applies_to(unit_type));
                }
            }
        }
    }
}
