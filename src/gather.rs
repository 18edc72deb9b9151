//! Per-student data assembly.
//!
//! Pure data gathering — no scoring logic. Fetches for distinct students
//! are independent, so they run on a bounded worker pool. A student whose
//! provider calls fail ends up with empty state and the run continues;
//! downstream stages read empty state as "no constraints contributed".

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::models::StudentState;
use crate::providers::LearningDataProvider;

/// Default worker-pool cap for student fetches.
pub const DEFAULT_GATHER_CONCURRENCY: usize = 8;

/// Assembles `StudentState` for a pool of students.
pub struct StudentDataGatherer<'a> {
    provider: &'a dyn LearningDataProvider,
    concurrency: usize,
}

impl<'a> StudentDataGatherer<'a> {
    /// Creates a gatherer over the given data collaborator.
    pub fn new(provider: &'a dyn LearningDataProvider) -> Self {
        Self {
            provider,
            concurrency: DEFAULT_GATHER_CONCURRENCY,
        }
    }

    /// Sets the worker-pool cap (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Gathers state for every student id, optionally filtered to one
    /// course type. Duplicate ids collapse to a single entry.
    ///
    /// Provider failures yield empty state for that student; the batch
    /// never aborts.
    pub fn gather(
        &self,
        student_ids: &[String],
        course_type: Option<&str>,
    ) -> HashMap<String, StudentState> {
        if student_ids.is_empty() {
            return HashMap::new();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency.min(student_ids.len()))
            .build();

        let states: Vec<StudentState> = match pool {
            Ok(pool) => pool.install(|| {
                student_ids
                    .par_iter()
                    .map(|id| self.gather_one(id, course_type))
                    .collect()
            }),
            // Pool construction can fail under resource exhaustion; fall
            // back to sequential gathering.
            Err(_) => student_ids
                .iter()
                .map(|id| self.gather_one(id, course_type))
                .collect(),
        };

        states.into_iter().map(|s| (s.id.clone(), s)).collect()
    }

    fn gather_one(&self, student_id: &str, course_type: Option<&str>) -> StudentState {
        let mut state = StudentState::empty(student_id);

        match self.provider.progress(student_id) {
            Ok(progress) => state.progress = progress,
            Err(err) => {
                warn!(student_id, error = %err, "progress fetch failed; using empty state");
            }
        }
        match self.provider.unlearned_content(student_id) {
            Ok(unlearned) => state.unlearned = unlearned,
            Err(err) => {
                warn!(student_id, error = %err, "unlearned-content fetch failed; using empty state");
            }
        }
        match self.provider.learning_analytics(student_id) {
            Ok(analytics) => state.analytics = Some(analytics),
            Err(err) => {
                warn!(student_id, error = %err, "analytics fetch failed; using empty state");
            }
        }

        if let Some(course_type) = course_type {
            state.retain_course_type(course_type);
        }

        debug!(
            student_id,
            progress_records = state.progress.len(),
            unlearned_groups = state.unlearned.len(),
            "gathered student state"
        );
        state
    }
}
