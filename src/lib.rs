//! Class composition engine for education scheduling.
//!
//! Partitions a student pool into bounded-size classes that balance shared
//! curriculum needs, learning-style and pace compatibility, progress
//! similarity, and social history, then improves the partition with
//! first-improvement local search.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `StudentState`, `ContentItem`,
//!   `CompositionCriteria`, `ClassComposition`, `CompositionScore`
//! - **`providers`**: Collaborator traits for learning data and booking
//!   history, with bounded retry
//! - **`gather`**: Parallel per-student state assembly
//! - **`analysis`**: Content clustering and the pairwise compatibility matrix
//! - **`grouping`**: Candidate generation, scoring, and local-search
//!   optimization
//! - **`builder`**: Partition → `ClassComposition` record transform
//! - **`engine`**: `CompositionEngine` facade over the whole pipeline
//! - **`validation`**: Criteria/options integrity checks
//!
//! # Pipeline
//!
//! gather → content clusters ∥ compatibility matrix → candidate partition
//! → local search → composition records
//!
//! # References
//!
//! - Hoos & Stützle (2005), "Stochastic Local Search: Foundations and
//!   Applications"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod analysis;
pub mod builder;
pub mod engine;
pub mod error;
pub mod gather;
pub mod grouping;
pub mod models;
pub mod providers;
pub mod validation;

pub use engine::{ClassSizeSuggestion, CompositionEngine, CompositionRun};
pub use error::ComposerError;
pub use grouping::{CancelToken, OptimizerStatus};
pub use models::{
    ClassComposition, CompositionCriteria, CompositionScore, GroupingOptions, OptimizeFor,
};
pub use providers::{BookingHistoryProvider, LearningDataProvider, RetryPolicy};
