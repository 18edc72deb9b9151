//! Composition constraints and grouping options.
//!
//! Greedy thresholds and partial-match scores are policy knobs, not
//! hard-coded literals: they live here with their original default values
//! so callers can tune grouping behavior per deployment.

use serde::{Deserialize, Serialize};

/// Hard constraints and scoring knobs for one composition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionCriteria {
    /// Maximum students per group.
    pub max_students: usize,
    /// Minimum students per group (individual classes excepted).
    pub min_students: usize,
    /// Maximum acceptable variance in focus-content difficulty.
    pub max_difficulty_variance: f64,
    /// Maximum acceptable progress gap between members (percentage points).
    pub max_progress_gap: f64,
    /// Minimum content-overlap fraction for content-driven grouping.
    pub content_compatibility_threshold: f64,
    /// Weight of peer compatibility when ranking social-strategy seeds.
    pub peer_compatibility_weight: f64,
    /// Pairwise score a candidate must reach against every current member
    /// for the social strategy to admit them.
    pub social_threshold: f64,
    /// Style/pace sub-score when the match is partial (mixed style, or one
    /// side paced "average").
    pub partial_match_score: f64,
    /// Style/pace sub-score on a mismatch.
    pub mismatch_score: f64,
    /// Pace sub-score when a student has no progress records.
    pub neutral_pace_score: f64,
    /// Social-history increment per shared past class (capped at 1.0).
    pub social_history_step: f64,
}

impl Default for CompositionCriteria {
    fn default() -> Self {
        Self {
            max_students: 8,
            min_students: 2,
            max_difficulty_variance: 3.0,
            max_progress_gap: 25.0,
            content_compatibility_threshold: 0.6,
            peer_compatibility_weight: 0.15,
            social_threshold: 60.0,
            partial_match_score: 0.7,
            mismatch_score: 0.3,
            neutral_pace_score: 0.5,
            social_history_step: 0.2,
        }
    }
}

impl CompositionCriteria {
    /// Creates criteria with default knobs and the given size bounds.
    pub fn with_size_bounds(min_students: usize, max_students: usize) -> Self {
        Self {
            min_students,
            max_students,
            ..Self::default()
        }
    }
}

/// Grouping strategy for candidate generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupingStrategy {
    /// Groups of similar progress/pace.
    Homogeneous,
    /// Groups mixing progress levels.
    Heterogeneous,
    /// Let the objective decide per group.
    #[default]
    Mixed,
}

/// Primary optimization objective.
///
/// Single-objective runs lead with the named strategy; the remaining
/// strategies sweep up leftover students so the pool stays covered.
/// `Balanced` runs content, social, and progress in sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OptimizeFor {
    Content,
    Social,
    Progress,
    #[default]
    Balanced,
}

/// Run-level options for candidate generation and local search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingOptions {
    /// Grouping strategy.
    pub strategy: GroupingStrategy,
    /// Primary optimization objective.
    pub optimize_for: OptimizeFor,
    /// Whether leftover students may form one-student classes.
    pub allow_individual_classes: bool,
    /// Whether struggling students (lowest progress) are seeded first
    /// by the social strategy.
    pub prioritize_struggling_students: bool,
    /// Iteration budget for the local-search optimizer.
    pub max_iterations: usize,
    /// Minimum confidence for reported suggestions (0.0-1.0).
    pub min_confidence_threshold: f64,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            strategy: GroupingStrategy::Mixed,
            optimize_for: OptimizeFor::Balanced,
            allow_individual_classes: true,
            prioritize_struggling_students: false,
            max_iterations: 50,
            min_confidence_threshold: 0.5,
        }
    }
}

impl GroupingOptions {
    /// Sets the grouping strategy.
    pub fn with_strategy(mut self, strategy: GroupingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the optimization objective.
    pub fn with_objective(mut self, optimize_for: OptimizeFor) -> Self {
        self.optimize_for = optimize_for;
        self
    }

    /// Sets the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Allows or forbids one-student classes.
    pub fn with_individual_classes(mut self, allow: bool) -> Self {
        self.allow_individual_classes = allow;
        self
    }

    /// Enables struggling-student prioritization.
    pub fn with_struggling_priority(mut self, prioritize: bool) -> Self {
        self.prioritize_struggling_students = prioritize;
        self
    }
}
