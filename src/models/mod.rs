//! Class-composition domain models.
//!
//! Core data types for one optimization run. All run-scoped entities
//! (`StudentState`, `CompatibilityMatrix`, candidate groups) are created
//! fresh per invocation and discarded once `ClassComposition` records are
//! handed to the caller; the engine holds no state between runs.
//!
//! # Lifecycle
//!
//! | Type | Owner | Lifetime |
//! |------|-------|----------|
//! | `ContentItem` | curriculum collaborator | reference data |
//! | `StudentState` | one run | gathered → discarded |
//! | `PairCompatibility` | one run | built once per unordered pair |
//! | `ClassComposition` | caller | run output |

mod compatibility;
mod composition;
mod content;
mod criteria;
mod student;

pub use compatibility::{CompatibilityMatrix, PairCompatibility};
pub use composition::{
    ClassComposition, ClassType, CompositionScore, SchedulingPriority, TeacherRequirement,
};
pub use content::{ContentGroup, ContentItem, ContentType, ContentUrgency};
pub use criteria::{CompositionCriteria, GroupingOptions, GroupingStrategy, OptimizeFor};
pub use student::{LearningAnalytics, LearningPace, LearningStyle, ProgressRecord, StudentState};
