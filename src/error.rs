//! Engine error taxonomy.
//!
//! Only configuration problems abort a run. Per-student data failures
//! degrade to empty state at the gathering stage, unplaced students are a
//! warning list on the result, and optimizer non-convergence is a status
//! flag — none of those surface here.

use thiserror::Error;

/// Errors surfaced by the composition engine's public operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ComposerError {
    /// Criteria or options failed validation before any computation.
    #[error("invalid composition criteria: {0}")]
    InvalidCriteria(String),

    /// The caller supplied no student ids.
    #[error("student pool is empty")]
    EmptyStudentPool,

    /// The target student of a compatibility query is missing from the
    /// candidate data.
    #[error("unknown student '{0}'")]
    UnknownStudent(String),
}
