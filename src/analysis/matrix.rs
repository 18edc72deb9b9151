//! Pairwise compatibility matrix construction.
//!
//! Computes every unordered student pair exactly once (O(n²) pairs).
//! Pair computations are read-only over gathered state and independent,
//! so they run data-parallel and collect into the pair-keyed matrix.
//!
//! # Score
//!
//! | Component | Contribution |
//! |-----------|-------------|
//! | shared content (non-empty) | 40 |
//! | learning-style match | ×25 |
//! | pace compatibility | ×25 |
//! | social history | ×10 |
//!
//! Total is clamped to 0-100.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::models::{
    CompatibilityMatrix, CompositionCriteria, ContentItem, LearningPace, LearningStyle,
    PairCompatibility, StudentState,
};
use crate::providers::BookingHistoryProvider;

/// Builds the symmetric pairwise compatibility matrix for a student pool.
pub struct CompatibilityMatrixBuilder<'a> {
    criteria: &'a CompositionCriteria,
    history: &'a dyn BookingHistoryProvider,
}

impl<'a> CompatibilityMatrixBuilder<'a> {
    /// Creates a builder over the scoring knobs and booking history.
    pub fn new(
        criteria: &'a CompositionCriteria,
        history: &'a dyn BookingHistoryProvider,
    ) -> Self {
        Self { criteria, history }
    }

    /// Computes the full matrix over all unordered pairs in `states`.
    pub fn build(&self, states: &HashMap<String, StudentState>) -> CompatibilityMatrix {
        let mut ids: Vec<&str> = states.keys().map(String::as_str).collect();
        ids.sort_unstable();

        let pairs: Vec<(&str, &str)> = (0..ids.len())
            .flat_map(|i| (i + 1..ids.len()).map(move |j| (i, j)))
            .map(|(i, j)| (ids[i], ids[j]))
            .collect();

        let records: Vec<PairCompatibility> = pairs
            .par_iter()
            .map(|&(a, b)| self.compute_pair(&states[a], &states[b]))
            .collect();

        debug!(students = ids.len(), pairs = records.len(), "compatibility matrix built");
        CompatibilityMatrix::from_pairs(records)
    }

    /// Computes compatibility for one unordered pair.
    pub fn compute_pair(&self, a: &StudentState, b: &StudentState) -> PairCompatibility {
        let shared_content = shared_content(a, b);
        let style_match = self.style_match(a, b);
        let pace_compatibility = self.pace_compatibility(a, b);
        let social_history = self.social_history(&a.id, &b.id);

        let content_part = if shared_content.is_empty() { 0.0 } else { 40.0 };
        let score = (content_part
            + style_match * 25.0
            + pace_compatibility * 25.0
            + social_history * 10.0)
            .clamp(0.0, 100.0);

        let mut pair = PairCompatibility::new(a.id.clone(), b.id.clone());
        pair.score = score;
        pair.shared_content = shared_content;
        pair.style_match = style_match;
        pair.pace_compatibility = pace_compatibility;
        pair.social_history = social_history;
        pair
    }

    /// 1.0 on identical styles, partial if either is mixed (or unknown),
    /// mismatch score otherwise.
    fn style_match(&self, a: &StudentState, b: &StudentState) -> f64 {
        let style_a = a.analytics.as_ref().map(|an| an.preferred_style);
        let style_b = b.analytics.as_ref().map(|an| an.preferred_style);
        match (style_a, style_b) {
            (Some(sa), Some(sb)) if sa == sb => 1.0,
            (Some(LearningStyle::Mixed), Some(_)) | (Some(_), Some(LearningStyle::Mixed)) => {
                self.criteria.partial_match_score
            }
            (Some(_), Some(_)) => self.criteria.mismatch_score,
            // Missing analytics contributes no constraint.
            _ => self.criteria.partial_match_score,
        }
    }

    /// 1.0 on identical paces, partial when exactly one side is average,
    /// mismatch otherwise. Students without progress records are neutral
    /// with anyone.
    fn pace_compatibility(&self, a: &StudentState, b: &StudentState) -> f64 {
        match (a.dominant_pace(), b.dominant_pace()) {
            (Some(pa), Some(pb)) if pa == pb => 1.0,
            (Some(LearningPace::Average), Some(_)) | (Some(_), Some(LearningPace::Average)) => {
                self.criteria.partial_match_score
            }
            (Some(_), Some(_)) => self.criteria.mismatch_score,
            _ => self.criteria.neutral_pace_score,
        }
    }

    /// `min(1.0, step × shared class count)`. A history failure counts as
    /// no shared history — social data is additive only.
    fn social_history(&self, a: &str, b: &str) -> f64 {
        let count = match self.history.shared_class_count(a, b) {
            Ok(count) => count,
            Err(err) => {
                warn!(student_a = a, student_b = b, error = %err, "booking history unavailable");
                0
            }
        };
        (self.criteria.social_history_step * count as f64).min(1.0)
    }
}

/// Items both students still need: unit numbers match exactly, lesson
/// numbers differ by at most one. Deduplicated by content key.
fn shared_content(a: &StudentState, b: &StudentState) -> Vec<ContentItem> {
    let mut seen = std::collections::HashSet::new();
    let mut shared = Vec::new();
    for item in a.unlearned_items() {
        if b.needs_content(item) && seen.insert((item.unit, item.lesson)) {
            shared.push(item.clone());
        }
    }
    shared
}
