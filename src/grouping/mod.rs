//! Candidate generation, scoring, and local-search optimization.
//!
//! The grouping layer operates on plain student-id partitions:
//!
//! 1. [`CandidateGroupingGenerator`] produces an initial partition from
//!    content clusters, social compatibility, and progress buckets.
//! 2. [`CompositionScorer`] turns any group or partition into a single
//!    comparable number.
//! 3. [`LocalSearchOptimizer`] improves the partition with swap, merge,
//!    and split moves until a local optimum or the iteration budget.
//!
//! # Reference
//! Hoos & Stützle (2005), "Stochastic Local Search: Foundations and
//! Applications", Ch. 1-2

mod generator;
mod optimizer;
mod scorer;

pub use generator::{CandidateGroupingGenerator, GeneratedGroups};
pub use optimizer::{CancelToken, LocalSearchOptimizer, OptimizationOutcome, OptimizerStatus};
pub use scorer::CompositionScorer;
pub(crate) use scorer::{focus_content, FOCUS_CAP};

use serde::{Deserialize, Serialize};

/// A candidate group of students.
///
/// `optimal_size` is fixed at creation time (equal to the then-current
/// member count) and carried through moves so the size sub-score can
/// penalize later resizing of the same group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentGroup {
    /// Member student ids, in placement order.
    pub members: Vec<String>,
    /// Size the group was created at.
    pub optimal_size: usize,
}

impl StudentGroup {
    /// Creates a group; optimal size is the current member count.
    pub fn new(members: Vec<String>) -> Self {
        let optimal_size = members.len();
        Self {
            members,
            optimal_size,
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A partition of the student pool into candidate groups.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Partition {
    /// The groups; student ids are disjoint across groups.
    pub groups: Vec<StudentGroup>,
}

impl Partition {
    /// Creates a partition from groups.
    pub fn new(groups: Vec<StudentGroup>) -> Self {
        Self { groups }
    }

    /// Total number of students across all groups.
    pub fn student_count(&self) -> usize {
        self.groups.iter().map(StudentGroup::len).sum()
    }

    /// All student ids in group order.
    pub fn student_ids(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().flat_map(|g| g.members.iter().map(String::as_str))
    }
}
