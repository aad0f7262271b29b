// 🔍 Fuzzy Name Matcher - Best candidate for a normalized name
//
// Two stages:
//   1. Exact key present → return it immediately
//   2. Otherwise score every candidate, keep the strictly best one above threshold
//
// Both target and candidates must already be normalized (see normalizer.rs).

use crate::sources::SourceIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Debug;

/// Default acceptance threshold (exclusive)
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.5;

// ============================================================================
// SIMILARITY STRATEGY
// ============================================================================

/// Pluggable similarity metric between two normalized names
///
/// Must return a value in `0.0..=1.0`.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;

    /// Short identifier recorded in evidence output
    fn name(&self) -> &str {
        "custom"
    }
}

/// Word-overlap score: `|A ∩ B| / max(|A|, |B|)` over whitespace-delimited word sets
///
/// The denominator is the larger set, so "ANA GARCIA" vs "ANA GARCIA LOPEZ" scores
/// 2/3, not 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordOverlapScorer;

impl SimilarityScorer for WordOverlapScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a_words: HashSet<&str> = a.split_whitespace().collect();
        let b_words: HashSet<&str> = b.split_whitespace().collect();

        let denominator = a_words.len().max(b_words.len());
        if denominator == 0 {
            return 0.0;
        }

        let common = a_words.intersection(&b_words).count();
        common as f64 / denominator as f64
    }

    fn name(&self) -> &str {
        "word_overlap"
    }
}

// ============================================================================
// MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMatch {
    /// Candidate key that won
    pub candidate: String,

    /// Similarity score (1.0 for exact matches)
    pub score: f64,

    /// True when the target was found verbatim among the candidates
    pub exact: bool,
}

impl NameMatch {
    fn exact(target: &str) -> Self {
        NameMatch {
            candidate: target.to_string(),
            score: 1.0,
            exact: true,
        }
    }
}

// ============================================================================
// NAME MATCHER
// ============================================================================

pub struct NameMatcher<S: SimilarityScorer = WordOverlapScorer> {
    scorer: S,

    /// Scores must be strictly greater than this to be accepted
    pub threshold: f64,
}

impl NameMatcher<WordOverlapScorer> {
    pub fn new() -> Self {
        NameMatcher {
            scorer: WordOverlapScorer,
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl<S: SimilarityScorer> NameMatcher<S> {
    pub fn with_scorer(scorer: S, threshold: f64) -> Self {
        NameMatcher { scorer, threshold }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Find the best candidate for `target`
    ///
    /// Candidates are visited in iteration order; on equal scores the first one
    /// seen is kept. Callers pass source indices in insertion order so results
    /// are reproducible.
    ///
    /// Example:
    /// ```
    /// use attendance_reconciliation::NameMatcher;
    ///
    /// let matcher = NameMatcher::new();
    /// let m = matcher
    ///     .find_best_match("JOHN SMITH GARCIA", ["SMITH GARCIA", "JOHN DOE"])
    ///     .unwrap();
    /// assert_eq!(m.candidate, "SMITH GARCIA");
    /// ```
    pub fn find_best_match<'a, I>(&self, target: &str, candidates: I) -> Option<NameMatch>
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: Clone,
    {
        if target.is_empty() {
            return None;
        }

        let candidates = candidates.into_iter();

        // Exact short-circuit wins over any scored candidate
        if candidates.clone().any(|c| c == target) {
            return Some(NameMatch::exact(target));
        }

        self.best_scored(target, candidates)
    }

    /// Same contract as `find_best_match`, but the exact check is a hash lookup
    /// in the index instead of a scan
    pub fn find_in_index<V>(&self, target: &str, index: &SourceIndex<V>) -> Option<NameMatch>
    where
        V: Debug + PartialEq,
    {
        if target.is_empty() {
            return None;
        }

        if index.contains_key(target) {
            return Some(NameMatch::exact(target));
        }

        self.best_scored(target, index.keys())
    }

    fn best_scored<'a>(
        &self,
        target: &str,
        candidates: impl Iterator<Item = &'a str>,
    ) -> Option<NameMatch> {
        let mut best: Option<(&str, f64)> = None;
        for candidate in candidates {
            let score = self.scorer.score(target, candidate);
            let best_score = best.map(|(_, s)| s).unwrap_or(0.0);
            if score > best_score && score > self.threshold {
                best = Some((candidate, score));
            }
        }

        best.map(|(candidate, score)| NameMatch {
            candidate: candidate.to_string(),
            score,
            exact: false,
        })
    }
}

impl Default for NameMatcher<WordOverlapScorer> {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain lookup with the default word-overlap matcher
pub fn find_best_match<'a, I>(target: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: Clone,
{
    NameMatcher::new()
        .find_best_match(target, candidates)
        .map(|m| m.candidate)
}

// ============================================================================
// TESTS
// ============================================================================
