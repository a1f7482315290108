//! # lexi-catalog
//!
//! Static pedagogical knowledge bases and the deterministic selection
//! engines that consume them:
//!
//! - [`patterns`]: vocabulary signal analysis feeding the lexical engine
//! - [`lexical`]: the six TIPS strategies as a declarative table plus the
//!   6-way additive scoring loop
//! - [`grammar`]: the two grammar strategies and the L1-interference
//!   knowledge base behind the 2-way choice
//! - [`assessment`]: the seven assessment types and the
//!   complementarity-aware pair selection
//!
//! Every engine is a pure function: same inputs, same choice, same
//! rationale. The rule sets are data consumed by generic scoring loops, so
//! balancing behavior is testable by table inspection.
//!
//! ## Crate Position
//!
//! Pure logic over `lexi-core` types. No I/O.

#![deny(unsafe_code)]

pub mod assessment;
pub mod errors;
pub mod grammar;
pub mod lexical;
pub mod patterns;

pub use assessment::{AssessmentPlan, AssessmentProfile, Skill, select_assessment_pair};
pub use errors::SelectionError;
pub use grammar::{
    GrammarSelection, InterferencePattern, identify_grammar_point, select_grammar_strategy,
};
pub use lexical::{StrategyProfile, StrategySelection, select_tip_strategy};
pub use patterns::{MorphologicalComplexity, VocabularyPatterns, analyze_vocabulary};
