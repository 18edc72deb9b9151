//! Input validation for composition runs.
//!
//! Checks criteria and options before any computation starts. Detects:
//! - Non-positive size bounds
//! - `max_students` below `min_students`
//! - Weights and thresholds outside their ranges
//! - A zero iteration budget
//!
//! All problems are collected and reported together.

use crate::models::{CompositionCriteria, GroupingOptions};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A size bound is zero.
    NonPositiveBound,
    /// `max_students` is smaller than `min_students`.
    BoundOrdering,
    /// A weight or fractional score is outside 0.0-1.0.
    WeightOutOfRange,
    /// A threshold is outside its valid range.
    ThresholdOutOfRange,
    /// `max_iterations` is zero.
    ZeroIterationBudget,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates criteria and options for a composition run.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_criteria(
    criteria: &CompositionCriteria,
    options: &GroupingOptions,
) -> ValidationResult {
    let mut errors = Vec::new();

    if criteria.min_students == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NonPositiveBound,
            "min_students must be positive",
        ));
    }
    if criteria.max_students == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NonPositiveBound,
            "max_students must be positive",
        ));
    }
    if criteria.max_students < criteria.min_students {
        errors.push(ValidationError::new(
            ValidationErrorKind::BoundOrdering,
            format!(
                "max_students ({}) must be >= min_students ({})",
                criteria.max_students, criteria.min_students
            ),
        ));
    }
    if criteria.max_difficulty_variance <= 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NonPositiveBound,
            "max_difficulty_variance must be positive",
        ));
    }
    if criteria.max_progress_gap <= 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NonPositiveBound,
            "max_progress_gap must be positive",
        ));
    }

    for (name, value) in [
        (
            "content_compatibility_threshold",
            criteria.content_compatibility_threshold,
        ),
        ("peer_compatibility_weight", criteria.peer_compatibility_weight),
        ("partial_match_score", criteria.partial_match_score),
        ("mismatch_score", criteria.mismatch_score),
        ("neutral_pace_score", criteria.neutral_pace_score),
        ("social_history_step", criteria.social_history_step),
    ] {
        if value <= 0.0 || value > 1.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::WeightOutOfRange,
                format!("{name} must be in (0.0, 1.0], got {value}"),
            ));
        }
    }

    if !(0.0..=100.0).contains(&criteria.social_threshold) {
        errors.push(ValidationError::new(
            ValidationErrorKind::ThresholdOutOfRange,
            format!(
                "social_threshold must be in 0-100, got {}",
                criteria.social_threshold
            ),
        ));
    }

    if options.max_iterations == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::ZeroIterationBudget,
            "max_iterations must be positive",
        ));
    }
    if !(0.0..=1.0).contains(&options.min_confidence_threshold) {
        errors.push(ValidationError::new(
            ValidationErrorKind::ThresholdOutOfRange,
            format!(
                "min_confidence_threshold must be in 0.0-1.0, got {}",
                options.min_confidence_threshold
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
