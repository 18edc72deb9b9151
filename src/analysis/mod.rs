//! Compatibility analysis over gathered student state.
//!
//! Two independent read-only passes that may run concurrently:
//!
//! - [`ContentCompatibilityAnalyzer`]: clusters students by shared
//!   unneeded curriculum units (`unit-lesson` content keys).
//! - [`CompatibilityMatrixBuilder`]: computes a symmetric pairwise
//!   compatibility score for every student pair.

mod content;
mod matrix;

pub use content::{ContentCluster, ContentCompatibilityAnalyzer};
pub use matrix::CompatibilityMatrixBuilder;
