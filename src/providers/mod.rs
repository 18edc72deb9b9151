//! Collaborator contracts for student data and booking history.
//!
//! The engine never talks to storage directly; it consumes these traits.
//! Provider calls may fail per student — failures are non-fatal to a batch
//! run (the gatherer substitutes empty state). Bounded retry with backoff
//! lives here at the collaborator boundary, not inside optimization logic.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::models::{ContentGroup, LearningAnalytics, ProgressRecord};

/// Result of a provider call.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure of a collaborator call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// The requested student is unknown to the collaborator.
    #[error("student '{0}' not found")]
    NotFound(String),
    /// The collaborator is temporarily unavailable.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Curriculum/progress data collaborator.
pub trait LearningDataProvider: Send + Sync {
    /// Progress records for one student.
    fn progress(&self, student_id: &str) -> ProviderResult<Vec<ProgressRecord>>;

    /// Unlearned content groups for one student.
    fn unlearned_content(&self, student_id: &str) -> ProviderResult<Vec<ContentGroup>>;

    /// Learning analytics for one student.
    fn learning_analytics(&self, student_id: &str) -> ProviderResult<LearningAnalytics>;
}

/// Booking history collaborator, used only for social-history scoring.
pub trait BookingHistoryProvider: Send + Sync {
    /// Number of distinct classes both students previously booked together.
    fn shared_class_count(&self, student_a: &str, student_b: &str) -> ProviderResult<u32>;
}

impl<P: LearningDataProvider + ?Sized> LearningDataProvider for std::sync::Arc<P> {
    fn progress(&self, student_id: &str) -> ProviderResult<Vec<ProgressRecord>> {
        (**self).progress(student_id)
    }

    fn unlearned_content(&self, student_id: &str) -> ProviderResult<Vec<ContentGroup>> {
        (**self).unlearned_content(student_id)
    }

    fn learning_analytics(&self, student_id: &str) -> ProviderResult<LearningAnalytics> {
        (**self).learning_analytics(student_id)
    }
}

impl<P: BookingHistoryProvider + ?Sized> BookingHistoryProvider for std::sync::Arc<P> {
    fn shared_class_count(&self, student_a: &str, student_b: &str) -> ProviderResult<u32> {
        (**self).shared_class_count(student_a, student_b)
    }
}

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts (first call included).
    pub attempts: u32,
    /// Backoff added per failed attempt.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// A policy that calls exactly once.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Runs `call` up to `attempts` times. `NotFound` is terminal and is
    /// never retried; `Unavailable` backs off and retries.
    pub fn run<T>(
        &self,
        operation: &str,
        mut call: impl FnMut() -> ProviderResult<T>,
    ) -> ProviderResult<T> {
        let mut last = None;
        for attempt in 1..=self.attempts.max(1) {
            match call() {
                Ok(value) => return Ok(value),
                Err(err @ ProviderError::NotFound(_)) => return Err(err),
                Err(err) => {
                    warn!(%operation, attempt, error = %err, "provider call failed");
                    last = Some(err);
                    if attempt < self.attempts && !self.backoff.is_zero() {
                        thread::sleep(self.backoff * attempt);
                    }
                }
            }
        }
        Err(last.unwrap_or_else(|| ProviderError::Unavailable(operation.to_string())))
    }
}

/// Retry wrapper around any provider pair.
pub struct Retrying<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P> Retrying<P> {
    /// Wraps a provider with the given retry policy.
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<P: LearningDataProvider> LearningDataProvider for Retrying<P> {
    fn progress(&self, student_id: &str) -> ProviderResult<Vec<ProgressRecord>> {
        self.policy.run("progress", || self.inner.progress(student_id))
    }

    fn unlearned_content(&self, student_id: &str) -> ProviderResult<Vec<ContentGroup>> {
        self.policy
            .run("unlearned_content", || self.inner.unlearned_content(student_id))
    }

    fn learning_analytics(&self, student_id: &str) -> ProviderResult<LearningAnalytics> {
        self.policy
            .run("learning_analytics", || self.inner.learning_analytics(student_id))
    }
}

impl<P: BookingHistoryProvider> BookingHistoryProvider for Retrying<P> {
    fn shared_class_count(&self, student_a: &str, student_b: &str) -> ProviderResult<u32> {
        self.policy.run("shared_class_count", || {
            self.inner.shared_class_count(student_a, student_b)
        })
    }
}

/// In-memory provider for tests and self-contained integrations.
///
/// Students without registered data yield `NotFound`; pairs without a
/// registered history yield zero shared classes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataProvider {
    progress: HashMap<String, Vec<ProgressRecord>>,
    unlearned: HashMap<String, Vec<ContentGroup>>,
    analytics: HashMap<String, LearningAnalytics>,
    shared_classes: HashMap<(String, String), u32>,
}

impl InMemoryDataProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a student with progress, unlearned content, and analytics.
    pub fn with_student(
        mut self,
        id: impl Into<String>,
        progress: Vec<ProgressRecord>,
        unlearned: Vec<ContentGroup>,
        analytics: LearningAnalytics,
    ) -> Self {
        let id = id.into();
        self.progress.insert(id.clone(), progress);
        self.unlearned.insert(id.clone(), unlearned);
        self.analytics.insert(id, analytics);
        self
    }

    /// Registers shared class history for a pair (order-insensitive).
    pub fn with_shared_classes(
        mut self,
        first: impl Into<String>,
        second: impl Into<String>,
        count: u32,
    ) -> Self {
        let (first, second) = (first.into(), second.into());
        let key = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        self.shared_classes.insert(key, count);
        self
    }
}

impl LearningDataProvider for InMemoryDataProvider {
    fn progress(&self, student_id: &str) -> ProviderResult<Vec<ProgressRecord>> {
        self.progress
            .get(student_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(student_id.to_string()))
    }

    fn unlearned_content(&self, student_id: &str) -> ProviderResult<Vec<ContentGroup>> {
        self.unlearned
            .get(student_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(student_id.to_string()))
    }

    fn learning_analytics(&self, student_id: &str) -> ProviderResult<LearningAnalytics> {
        self.analytics
            .get(student_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(student_id.to_string()))
    }
}

impl BookingHistoryProvider for InMemoryDataProvider {
    fn shared_class_count(&self, student_a: &str, student_b: &str) -> ProviderResult<u32> {
        let key = if student_a <= student_b {
            (student_a.to_string(), student_b.to_string())
        } else {
            (student_b.to_string(), student_a.to_string())
        };
        Ok(self.shared_classes.get(&key).copied().unwrap_or(0))
    }
}
