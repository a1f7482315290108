//! Grammar strategy catalog and the 2-way selection engine.
//!
//! Two candidates: rule-first systematic explanation, and contrastive
//! prevention of first-language interference. L1 prevention wins when the
//! unit's grammar point or vocabulary matches the interference knowledge
//! base; a trailing-run penalty keeps the two approaches alternating
//! across a book instead of streaking.

use lexi_core::unit::GrammarStrategy;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Penalty when the candidate closed out the last two or more units.
pub const STREAK_PENALTY: i32 = -40;

/// Penalty when the candidate was used in the immediately preceding unit.
pub const RECENT_PENALTY: i32 = -15;

/// Bonus for a candidate never used in the book.
pub const NOVELTY_BONUS: i32 = 10;

/// Base score for systematic explanation (always applicable).
const SYSTEMATIC_BASE: i32 = 20;

/// Extra systematic bonus for a book's first grammar unit.
const FIRST_EXPOSURE_BONUS: i32 = 10;

/// Score when at least one interference pattern matches.
const INTERFERENCE_MATCH: i32 = 35;

/// Per-additional-match bonus beyond the first.
const EXTRA_MATCH_BONUS: i32 = 5;

/// One entry of the L1 interference knowledge base.
pub struct InterferencePattern {
    /// Short identifier used in rationale text.
    pub name: &'static str,
    /// Vocabulary words that signal the pattern.
    pub signal_words: &'static [&'static str],
    /// Substrings matched case-insensitively against the grammar point.
    pub point_markers: &'static [&'static str],
}

impl InterferencePattern {
    /// Whether this pattern applies to the unit's grammar point or words.
    #[must_use]
    pub fn matches(&self, grammar_point: &str, words: &[String]) -> bool {
        let point = grammar_point.to_lowercase();
        if self.point_markers.iter().any(|m| point.contains(m)) {
            return true;
        }
        words
            .iter()
            .any(|w| self.signal_words.contains(&w.to_lowercase().as_str()))
    }
}

/// Known Portuguese-to-English transfer errors.
pub const INTERFERENCE_PATTERNS: [InterferencePattern; 6] = [
    InterferencePattern {
        name: "article usage",
        signal_words: &["the", "a", "an"],
        point_markers: &["article"],
    },
    InterferencePattern {
        name: "age expressions",
        signal_words: &["years", "old", "age"],
        point_markers: &["age", "to be"],
    },
    InterferencePattern {
        name: "countability",
        signal_words: &["information", "advice", "furniture", "money", "news"],
        point_markers: &["countable", "uncountable", "quantifier"],
    },
    InterferencePattern {
        name: "question word order",
        signal_words: &["what", "where", "when", "why", "how"],
        point_markers: &["question", "interrogative"],
    },
    InterferencePattern {
        name: "auxiliary omission",
        signal_words: &["do", "does", "did"],
        point_markers: &["auxiliary", "negative", "simple present", "simple past"],
    },
    InterferencePattern {
        name: "false cognates",
        signal_words: &["actually", "eventually", "pretend", "push", "library", "parents"],
        point_markers: &["cognate", "vocabulary in context"],
    },
];

/// Identify the grammar point a unit teaches from its title, context,
/// and vocabulary.
///
/// Keyword heuristics; the fallback names a generic focus so the
/// selection engine always has a point to work with.
#[must_use]
pub fn identify_grammar_point(title: &str, context: Option<&str>, words: &[String]) -> String {
    let text = format!("{title} {}", context.unwrap_or_default()).to_lowercase();
    let has_word = |list: &[&str]| {
        words
            .iter()
            .any(|w| list.contains(&w.to_lowercase().as_str()))
    };
    let in_text = |list: &[&str]| list.iter().any(|kw| text.contains(kw));

    if in_text(&["past", "yesterday", "ago", "last"]) {
        "Past Tenses".to_string()
    } else if in_text(&["future", "will", "going to", "tomorrow"]) {
        "Future Tenses".to_string()
    } else if in_text(&["present", "now", "currently", "always"]) {
        "Present Tenses".to_string()
    } else if has_word(&["can", "could", "should", "would", "must"]) {
        "Modal Verbs".to_string()
    } else if in_text(&["compare", "more", "most", "better", "best"]) {
        "Comparatives and Superlatives".to_string()
    } else if has_word(&["a", "an", "the"]) {
        "Articles".to_string()
    } else if in_text(&["where", "when", "who", "which", "that"]) {
        "Relative Clauses".to_string()
    } else if in_text(&["if", "condition", "unless"]) {
        "Conditional Sentences".to_string()
    } else {
        "General Grammar Structures".to_string()
    }
}

/// Result of a grammar strategy selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrammarSelection {
    /// Winning strategy.
    pub strategy: GrammarStrategy,
    /// Winning score.
    pub score: i32,
    /// Human-readable reasons that contributed to the winning score.
    pub rationale: Vec<String>,
    /// Names of the interference patterns that matched the unit.
    pub matched_patterns: Vec<String>,
}

/// Length of the trailing run of `strategy` at the end of `used`.
fn trailing_run(strategy: GrammarStrategy, used: &[GrammarStrategy]) -> usize {
    used.iter().rev().take_while(|s| **s == strategy).count()
}

/// Balance adjustment from the book's grammar strategy history.
fn balance_adjustment(
    strategy: GrammarStrategy,
    used: &[GrammarStrategy],
    reasons: &mut Vec<String>,
) -> i32 {
    if !used.contains(&strategy) {
        reasons.push(format!("not yet used in this book (+{NOVELTY_BONUS})"));
        return NOVELTY_BONUS;
    }
    match trailing_run(strategy, used) {
        0 => 0,
        1 => {
            reasons.push(format!("used in the previous unit ({RECENT_PENALTY})"));
            RECENT_PENALTY
        }
        n => {
            reasons.push(format!("used in the last {n} units ({STREAK_PENALTY})"));
            STREAK_PENALTY
        }
    }
}

/// Select the grammar strategy for a grammar unit.
///
/// Pure and deterministic. `grammar_point` is the unit's declared grammar
/// focus, `words` its vocabulary, and `used` the book's prior grammar
/// strategy sequence in unit order.
#[must_use]
pub fn select_grammar_strategy(
    grammar_point: &str,
    words: &[String],
    used: &[GrammarStrategy],
) -> GrammarSelection {
    let matched: Vec<&InterferencePattern> = INTERFERENCE_PATTERNS
        .iter()
        .filter(|p| p.matches(grammar_point, words))
        .collect();
    let matched_names: Vec<String> = matched.iter().map(|p| p.name.to_string()).collect();

    // Systematic explanation: always applicable baseline.
    let mut systematic_reasons = vec![format!(
        "systematic rule presentation fits any grammar point (+{SYSTEMATIC_BASE})"
    )];
    let mut systematic = SYSTEMATIC_BASE;
    if used.is_empty() {
        systematic += FIRST_EXPOSURE_BONUS;
        systematic_reasons.push(format!(
            "first grammar unit in the book (+{FIRST_EXPOSURE_BONUS})"
        ));
    }
    systematic += balance_adjustment(
        GrammarStrategy::SystematicExplanation,
        used,
        &mut systematic_reasons,
    );

    // L1 prevention: scores only when the knowledge base matches.
    let mut prevention_reasons = Vec::new();
    let mut prevention = 0;
    if let Some((first, rest)) = matched.split_first() {
        prevention += INTERFERENCE_MATCH;
        prevention_reasons.push(format!(
            "known interference pattern: {} (+{INTERFERENCE_MATCH})",
            first.name
        ));
        for pattern in rest {
            prevention += EXTRA_MATCH_BONUS;
            prevention_reasons.push(format!(
                "additional interference pattern: {} (+{EXTRA_MATCH_BONUS})",
                pattern.name
            ));
        }
    }
    prevention += balance_adjustment(
        GrammarStrategy::L1InterferencePrevention,
        used,
        &mut prevention_reasons,
    );

    debug!(systematic, prevention, matches = matched.len(), "scored grammar strategies");

    // Candidate order breaks ties in favor of systematic explanation.
    if prevention > systematic {
        GrammarSelection {
            strategy: GrammarStrategy::L1InterferencePrevention,
            score: prevention,
            rationale: prevention_reasons,
            matched_patterns: matched_names,
        }
    } else {
        GrammarSelection {
            strategy: GrammarStrategy::SystematicExplanation,
            score: systematic,
            rationale: systematic_reasons,
            matched_patterns: matched_names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn grammar_point_identified_from_title_and_words() {
        assert_eq!(
            identify_grammar_point("What I did yesterday", None, &[]),
            "Past Tenses"
        );
        assert_eq!(
            identify_grammar_point("Plans", Some("talking about tomorrow"), &[]),
            "Future Tenses"
        );
        assert_eq!(
            identify_grammar_point("Polite requests", None, &words(&["could", "please"])),
            "Modal Verbs"
        );
        assert_eq!(
            identify_grammar_point("Misc", None, &[]),
            "General Grammar Structures"
        );
    }

    #[test]
    fn first_unit_without_interference_goes_systematic() {
        let selection = select_grammar_strategy("Past Tenses", &words(&["walked", "visited"]), &[]);
        assert_eq!(selection.strategy, GrammarStrategy::SystematicExplanation);
        // 20 base + 10 first exposure + 10 novelty
        assert_eq!(selection.score, 40);
        assert!(selection.matched_patterns.is_empty());
    }

    #[test]
    fn interference_match_wins_after_first_exposure() {
        let used = [GrammarStrategy::SystematicExplanation];
        let selection = select_grammar_strategy("Articles", &words(&["museum", "city"]), &used);
        assert_eq!(selection.strategy, GrammarStrategy::L1InterferencePrevention);
        // 35 match + 10 novelty vs systematic 20 - 15 recent
        assert_eq!(selection.score, 45);
        assert_eq!(selection.matched_patterns, vec!["article usage".to_string()]);
    }

    #[test]
    fn additional_matches_add_five_each() {
        let used = [GrammarStrategy::SystematicExplanation];
        // Grammar point matches "question"; "do" and "actually" match two
        // more patterns through signal words.
        let selection =
            select_grammar_strategy("Question Formation", &words(&["do", "actually"]), &used);
        assert_eq!(selection.strategy, GrammarStrategy::L1InterferencePrevention);
        assert_eq!(selection.matched_patterns.len(), 3);
        // 35 + 5 + 5 + 10 novelty
        assert_eq!(selection.score, 55);
    }

    #[test]
    fn streak_penalty_breaks_a_run() {
        let used = [
            GrammarStrategy::L1InterferencePrevention,
            GrammarStrategy::L1InterferencePrevention,
        ];
        // Strong interference signal, but two consecutive uses must flip
        // the selection back to systematic.
        let selection = select_grammar_strategy("Articles", &words(&["the"]), &used);
        assert_eq!(selection.strategy, GrammarStrategy::SystematicExplanation);
        assert!(selection
            .rationale
            .iter()
            .any(|r| r.contains("not yet used")));
        // Prevention still reports the matched pattern for the rationale.
        assert_eq!(selection.matched_patterns, vec!["article usage".to_string()]);
    }

    #[test]
    fn trailing_run_resets_after_alternation() {
        let used = [
            GrammarStrategy::SystematicExplanation,
            GrammarStrategy::L1InterferencePrevention,
            GrammarStrategy::SystematicExplanation,
        ];
        // Prevention's last use is not trailing, so no penalty applies and
        // a single interference match is enough to win.
        let selection = select_grammar_strategy("Articles", &words(&["the"]), &used);
        assert_eq!(selection.strategy, GrammarStrategy::L1InterferencePrevention);
        assert_eq!(selection.score, 35);
    }

    #[test]
    fn ties_prefer_systematic() {
        // No matches, no history beyond one unit each: prevention scores 0,
        // systematic 20 - 15; systematic must still win on score, and on a
        // contrived tie the candidate order keeps systematic first.
        let used = [
            GrammarStrategy::L1InterferencePrevention,
            GrammarStrategy::SystematicExplanation,
        ];
        let selection = select_grammar_strategy("General Grammar Structures", &[], &used);
        assert_eq!(selection.strategy, GrammarStrategy::SystematicExplanation);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        const POINTS: [&str; 4] = [
            "Past Tenses",
            "Articles",
            "Question Formation",
            "General Grammar Structures",
        ];

        fn any_history() -> impl Strategy<Value = Vec<GrammarStrategy>> {
            proptest::collection::vec(
                (0usize..GrammarStrategy::ALL.len()).prop_map(|i| GrammarStrategy::ALL[i]),
                0..10,
            )
        }

        proptest! {
            #[test]
            fn same_inputs_same_selection(
                point in 0usize..POINTS.len(),
                words in proptest::collection::vec("[a-z]{2,8}", 0..8),
                used in any_history(),
            ) {
                let a = select_grammar_strategy(POINTS[point], &words, &used);
                let b = select_grammar_strategy(POINTS[point], &words, &used);
                prop_assert_eq!(a, b);
            }

            #[test]
            fn never_picks_a_third_consecutive_repeat(
                point in 0usize..POINTS.len(),
                words in proptest::collection::vec("[a-z]{2,8}", 0..8),
                mut used in any_history(),
                repeat in 0usize..GrammarStrategy::ALL.len(),
            ) {
                let repeat = GrammarStrategy::ALL[repeat];
                used.push(repeat);
                used.push(repeat);
                let selection = select_grammar_strategy(POINTS[point], &words, &used);
                prop_assert_ne!(selection.strategy, repeat);
            }
        }
    }
}
