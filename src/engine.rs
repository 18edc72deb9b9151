//! Composition engine facade.
//!
//! Wires the pipeline stages together behind one entry point:
//! gather → analyze (content clusters ∥ compatibility matrix) → generate
//! candidates → local search → build composition records.
//!
//! The engine owns no storage; it consumes [`LearningDataProvider`] and
//! [`BookingHistoryProvider`] collaborators and wraps every call in the
//! configured retry policy.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::analysis::{CompatibilityMatrixBuilder, ContentCompatibilityAnalyzer};
use crate::builder::ClassCompositionBuilder;
use crate::error::ComposerError;
use crate::gather::{StudentDataGatherer, DEFAULT_GATHER_CONCURRENCY};
use crate::grouping::{
    CancelToken, CandidateGroupingGenerator, CompositionScorer, LocalSearchOptimizer,
    OptimizerStatus,
};
use crate::models::{
    ClassComposition, CompositionCriteria, CompositionScore, ContentItem, GroupingOptions,
    PairCompatibility, StudentState,
};
use crate::providers::{
    BookingHistoryProvider, LearningDataProvider, ProviderError, RetryPolicy, Retrying,
};
use crate::validation::validate_criteria;

/// Result of one full composition run.
#[derive(Debug, Clone)]
pub struct CompositionRun {
    /// Final composition records, one per group.
    pub compositions: Vec<ClassComposition>,
    /// Students no strategy could place; empty when individual classes
    /// are allowed.
    pub unplaced: Vec<String>,
    /// How the optimizer finished.
    pub status: OptimizerStatus,
    /// Optimizer iterations performed.
    pub iterations: usize,
    /// Aggregate score of the final partition.
    pub score: f64,
}

/// Recommended class size for a student pool.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSizeSuggestion {
    /// Recommended group size, within the criteria bounds.
    pub recommended: usize,
    /// Lower bound applied (from criteria).
    pub min: usize,
    /// Upper bound applied (from criteria).
    pub max: usize,
    /// Human-readable rationale.
    pub reasoning: String,
}

/// Mean-pairwise-score fallback for pools with fewer than two students.
const NEUTRAL_COHESION: f64 = 50.0;

/// Public entry point for class composition.
pub struct CompositionEngine {
    learning: Arc<dyn LearningDataProvider>,
    history: Arc<dyn BookingHistoryProvider>,
    criteria: CompositionCriteria,
    options: GroupingOptions,
    concurrency: usize,
    retry: RetryPolicy,
}

impl CompositionEngine {
    /// Creates an engine with default criteria, options, and retry policy.
    pub fn new(
        learning: Arc<dyn LearningDataProvider>,
        history: Arc<dyn BookingHistoryProvider>,
    ) -> Self {
        Self {
            learning,
            history,
            criteria: CompositionCriteria::default(),
            options: GroupingOptions::default(),
            concurrency: DEFAULT_GATHER_CONCURRENCY,
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the composition criteria.
    pub fn with_criteria(mut self, criteria: CompositionCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Sets the grouping options.
    pub fn with_options(mut self, options: GroupingOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the gather worker-pool cap.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the provider retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Runs the full pipeline for a student pool.
    ///
    /// `course_type` restricts gathered data to one course type.
    /// Cancellation via `cancel` stops the optimizer and returns the best
    /// partition found so far; it never discards work.
    pub fn generate_class_compositions(
        &self,
        student_ids: &[String],
        course_type: Option<&str>,
        cancel: Option<&CancelToken>,
    ) -> Result<CompositionRun, ComposerError> {
        self.validate()?;
        if student_ids.is_empty() {
            return Err(ComposerError::EmptyStudentPool);
        }

        let states = self.gather(student_ids, course_type);

        let analyzer = ContentCompatibilityAnalyzer::new(self.criteria.min_students);
        let history = Retrying::new(Arc::clone(&self.history), self.retry.clone());
        let matrix_builder = CompatibilityMatrixBuilder::new(&self.criteria, &history);
        let (clusters, matrix) = rayon::join(
            || analyzer.analyze(&states),
            || matrix_builder.build(&states),
        );

        let generator =
            CandidateGroupingGenerator::new(&self.criteria, &self.options, &states, &matrix);
        let generated = generator.generate(student_ids, &clusters);

        let scorer = CompositionScorer::new(&states, &matrix);
        let optimizer =
            LocalSearchOptimizer::new(&self.criteria, &scorer, self.options.max_iterations);
        let outcome = optimizer.optimize(generated.partition, cancel);

        let compositions = ClassCompositionBuilder::new(&states).build(&outcome.partition);

        info!(
            students = student_ids.len(),
            compositions = compositions.len(),
            unplaced = generated.unplaced.len(),
            iterations = outcome.iterations,
            score = outcome.score,
            "composition run complete"
        );
        Ok(CompositionRun {
            compositions,
            unplaced: generated.unplaced,
            status: outcome.status,
            iterations: outcome.iterations,
            score: outcome.score,
        })
    }

    /// Scores an existing composition against current student data.
    ///
    /// Uses the composition's recorded focus content and optimal size, so
    /// a stale composition scores lower as its students move on.
    pub fn evaluate_composition(
        &self,
        composition: &ClassComposition,
    ) -> Result<CompositionScore, ComposerError> {
        self.validate()?;

        let states = self.gather(&composition.student_ids, None);
        let history = Retrying::new(Arc::clone(&self.history), self.retry.clone());
        let matrix = CompatibilityMatrixBuilder::new(&self.criteria, &history).build(&states);
        let scorer = CompositionScorer::new(&states, &matrix);

        Ok(scorer.evaluate_with_focus(
            &composition.student_ids,
            &composition.content_focus,
            composition.optimal_size,
        ))
    }

    /// Ranks `candidates` by pairwise compatibility with `target`,
    /// best first, truncated to `limit`.
    ///
    /// # Errors
    /// [`ComposerError::UnknownStudent`] when the data provider has no
    /// record of the target student.
    pub fn find_compatible_students(
        &self,
        target: &str,
        candidates: &[String],
        course_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PairCompatibility>, ComposerError> {
        self.validate()?;
        if let Err(ProviderError::NotFound(_)) = self.learning.unlearned_content(target) {
            return Err(ComposerError::UnknownStudent(target.to_string()));
        }

        let mut pool: Vec<String> = vec![target.to_string()];
        pool.extend(
            candidates
                .iter()
                .filter(|id| id.as_str() != target)
                .cloned(),
        );
        let states = self.gather(&pool, course_type);

        let history = Retrying::new(Arc::clone(&self.history), self.retry.clone());
        let matrix = CompatibilityMatrixBuilder::new(&self.criteria, &history).build(&states);

        let mut ranked: Vec<PairCompatibility> = candidates
            .iter()
            .filter(|id| id.as_str() != target)
            .filter_map(|id| matrix.get(target, id).cloned())
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.other(target).cmp(&b.other(target)))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Suggests a class size for a pool from its content overlap and
    /// social cohesion, clamped to the criteria bounds.
    ///
    /// A non-empty `content_items` list restricts the content-overlap
    /// signal to those items.
    pub fn suggest_optimal_class_size(
        &self,
        student_ids: &[String],
        content_items: &[ContentItem],
        course_type: Option<&str>,
    ) -> Result<ClassSizeSuggestion, ComposerError> {
        self.validate()?;
        if student_ids.is_empty() {
            return Err(ComposerError::EmptyStudentPool);
        }

        let states = self.gather(student_ids, course_type);
        let analyzer = ContentCompatibilityAnalyzer::new(self.criteria.min_students);
        let history = Retrying::new(Arc::clone(&self.history), self.retry.clone());
        let matrix_builder = CompatibilityMatrixBuilder::new(&self.criteria, &history);
        let (mut clusters, matrix) = rayon::join(
            || analyzer.analyze(&states),
            || matrix_builder.build(&states),
        );
        if !content_items.is_empty() {
            let keys: std::collections::HashSet<String> =
                content_items.iter().map(ContentItem::content_key).collect();
            clusters.retain(|cluster| keys.contains(&cluster.content_key));
        }

        let cohesion = if matrix.is_empty() {
            NEUTRAL_COHESION
        } else {
            matrix.iter().map(|pair| pair.score).sum::<f64>() / matrix.len() as f64
        };

        let largest_cluster = clusters.first().map_or(0, |cluster| cluster.len());
        let mut recommended = if largest_cluster > 0 {
            largest_cluster
        } else {
            states.len()
        };
        if cohesion < self.criteria.social_threshold {
            // Low cohesion favors smaller groups.
            recommended = recommended.div_ceil(2);
        }
        let recommended = recommended.clamp(self.criteria.min_students, self.criteria.max_students);

        let reasoning = format!(
            "largest shared-content cluster covers {largest_cluster} of {} students; \
             mean pairwise compatibility {cohesion:.0}",
            states.len()
        );
        Ok(ClassSizeSuggestion {
            recommended,
            min: self.criteria.min_students,
            max: self.criteria.max_students,
            reasoning,
        })
    }

    fn validate(&self) -> Result<(), ComposerError> {
        validate_criteria(&self.criteria, &self.options).map_err(|errors| {
            let message = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            ComposerError::InvalidCriteria(message)
        })
    }

    fn gather(
        &self,
        student_ids: &[String],
        course_type: Option<&str>,
    ) -> HashMap<String, StudentState> {
        let provider = Retrying::new(Arc::clone(&self.learning), self.retry.clone());
        StudentDataGatherer::new(&provider)
            .with_concurrency(self.concurrency)
            .gather(student_ids, course_type)
    }
}
