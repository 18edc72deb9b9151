//! Composition quality scoring.
//!
//! Evaluates any group (or full partition) against five weighted
//! sub-scores, each in 0-100:
//!
//! | Sub-score | Definition | Weight |
//! |-----------|-----------|--------|
//! | content_alignment | mean fraction of members needing each focus item, ×100 | 0.30 |
//! | difficulty_balance | 100 − 10 × variance(focus difficulty) | 0.25 |
//! | progress_compatibility | 100 − variance(member progress)/10 | 0.20 |
//! | social_compatibility | mean pairwise compatibility | 0.15 |
//! | size_optimization | 100 − 20 × \|actual − optimal\| | 0.10 |
//!
//! The aggregate partition score used by the optimizer is the
//! size-weighted mean of per-group totals.

use std::collections::{HashMap, HashSet};

use crate::models::{CompatibilityMatrix, CompositionScore, ContentItem, StudentState};

use super::{Partition, StudentGroup};

/// Sub-score fallback when the backing data is missing.
const MISSING_DATA_SCORE: f64 = 50.0;

/// Maximum focus content items per group.
pub(crate) const FOCUS_CAP: usize = 3;

/// Scores groups and partitions against gathered state and the
/// compatibility matrix.
pub struct CompositionScorer<'a> {
    states: &'a HashMap<String, StudentState>,
    matrix: &'a CompatibilityMatrix,
}

impl<'a> CompositionScorer<'a> {
    /// Creates a scorer over run state.
    pub fn new(
        states: &'a HashMap<String, StudentState>,
        matrix: &'a CompatibilityMatrix,
    ) -> Self {
        Self { states, matrix }
    }

    /// Evaluates one group, deriving its focus content first.
    pub fn evaluate_group(&self, group: &StudentGroup) -> CompositionScore {
        let focus = focus_content(&group.members, self.states, FOCUS_CAP);
        self.evaluate_with_focus(&group.members, &focus, group.optimal_size)
    }

    /// Evaluates a member set against an explicit focus-content list.
    pub fn evaluate_with_focus(
        &self,
        members: &[String],
        focus: &[ContentItem],
        optimal_size: usize,
    ) -> CompositionScore {
        CompositionScore::from_parts(
            self.content_alignment(members, focus),
            difficulty_balance(focus),
            self.progress_compatibility(members),
            self.social_compatibility(members),
            size_optimization(members.len(), optimal_size),
        )
    }

    /// Size-weighted mean of per-group totals. Empty partitions score 0.
    pub fn aggregate(&self, partition: &Partition) -> f64 {
        let total_students = partition.student_count();
        if total_students == 0 {
            return 0.0;
        }
        let weighted: f64 = partition
            .groups
            .iter()
            .map(|group| self.evaluate_group(group).total * group.len() as f64)
            .sum();
        weighted / total_students as f64
    }

    fn content_alignment(&self, members: &[String], focus: &[ContentItem]) -> f64 {
        if focus.is_empty() || members.is_empty() {
            return 0.0;
        }
        let per_item: f64 = focus
            .iter()
            .map(|item| {
                let needing = members
                    .iter()
                    .filter(|id| {
                        self.states
                            .get(*id)
                            .is_some_and(|state| state.needs_content(item))
                    })
                    .count();
                needing as f64 / members.len() as f64
            })
            .sum();
        per_item / focus.len() as f64 * 100.0
    }

    fn progress_compatibility(&self, members: &[String]) -> f64 {
        let progresses: Vec<f64> = members
            .iter()
            .filter_map(|id| self.states.get(id).and_then(StudentState::avg_progress))
            .collect();
        if progresses.is_empty() {
            return MISSING_DATA_SCORE;
        }
        (100.0 - variance(&progresses) / 10.0).max(0.0)
    }

    fn social_compatibility(&self, members: &[String]) -> f64 {
        if members.len() <= 1 {
            return 100.0;
        }
        let mut sum = 0.0;
        let mut pairs = 0usize;
        for i in 0..members.len() {
            for j in i + 1..members.len() {
                sum += self
                    .matrix
                    .score_or(&members[i], &members[j], MISSING_DATA_SCORE);
                pairs += 1;
            }
        }
        sum / pairs as f64
    }
}

fn difficulty_balance(focus: &[ContentItem]) -> f64 {
    let difficulties: Vec<f64> = focus.iter().map(|i| f64::from(i.difficulty)).collect();
    (100.0 - 10.0 * variance(&difficulties)).max(0.0)
}

fn size_optimization(actual: usize, optimal: usize) -> f64 {
    (100.0 - 20.0 * actual.abs_diff(optimal) as f64).max(0.0)
}

/// Population mean; 0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance; 0 for an empty slice.
pub(crate) fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Shared focus content for a member set: items every member still needs
/// (±1 lesson tolerance), ranked by exact-need breadth, capped to `cap`.
pub(crate) fn focus_content(
    members: &[String],
    states: &HashMap<String, StudentState>,
    cap: usize,
) -> Vec<ContentItem> {
    if members.is_empty() {
        return Vec::new();
    }

    // Distinct candidate items across members, first occurrence wins.
    let mut seen = HashSet::new();
    let mut candidates: Vec<&ContentItem> = Vec::new();
    for id in members {
        if let Some(state) = states.get(id) {
            for item in state.unlearned_items() {
                if seen.insert((item.unit, item.lesson)) {
                    candidates.push(item);
                }
            }
        }
    }

    let mut shared: Vec<(&ContentItem, usize)> = candidates
        .into_iter()
        .filter_map(|item| {
            let tolerant = members
                .iter()
                .filter(|id| states.get(*id).is_some_and(|s| s.needs_content(item)))
                .count();
            if tolerant < members.len() {
                return None;
            }
            let exact = members
                .iter()
                .filter(|id| {
                    states.get(*id).is_some_and(|s| {
                        s.unlearned_items()
                            .any(|i| i.unit == item.unit && i.lesson == item.lesson)
                    })
                })
                .count();
            Some((item, exact))
        })
        .collect();

    shared.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| a.0.unit.cmp(&b.0.unit))
            .then_with(|| a.0.lesson.cmp(&b.0.lesson))
    });

    shared.into_iter().take(cap).map(|(item, _)| item.clone()).collect()
}
