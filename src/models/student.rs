//! Per-student state assembled for one optimization run.
//!
//! `StudentState` is built fresh at the start of each run from the data
//! collaborator and discarded afterwards; the engine never caches it.
//! A student whose provider calls fail is represented by an empty state —
//! downstream scoring treats that as "no constraints contributed".

use serde::{Deserialize, Serialize};

use super::{ContentGroup, ContentItem, ContentUrgency};

/// Learning pace category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LearningPace {
    Slow,
    Average,
    Fast,
}

/// Preferred learning style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearningStyle {
    Visual,
    Auditory,
    Kinesthetic,
    ReadingWriting,
    /// No single dominant style.
    Mixed,
}

/// Progress in one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Course identifier.
    pub course_id: String,
    /// Course type (for course-type filtering).
    pub course_type: String,
    /// Completion percentage (0-100).
    pub progress_percent: f64,
    /// Pace category in this course.
    pub pace: LearningPace,
}

impl ProgressRecord {
    /// Creates a progress record.
    pub fn new(course_id: impl Into<String>, progress_percent: f64, pace: LearningPace) -> Self {
        Self {
            course_id: course_id.into(),
            course_type: String::new(),
            progress_percent: progress_percent.clamp(0.0, 100.0),
            pace,
        }
    }

    /// Sets the course type.
    pub fn with_course_type(mut self, course_type: impl Into<String>) -> Self {
        self.course_type = course_type.into();
        self
    }
}

/// Learning analytics for one student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningAnalytics {
    /// Preferred learning style.
    pub preferred_style: LearningStyle,
    /// Time slots where the student performs best.
    pub best_time_slots: Vec<String>,
    /// Time slots where the student performs worst.
    pub worst_time_slots: Vec<String>,
}

impl LearningAnalytics {
    /// Creates analytics with the given preferred style.
    pub fn new(preferred_style: LearningStyle) -> Self {
        Self {
            preferred_style,
            best_time_slots: Vec::new(),
            worst_time_slots: Vec::new(),
        }
    }

    /// Adds a best-performing time slot.
    pub fn with_best_slot(mut self, slot: impl Into<String>) -> Self {
        self.best_time_slots.push(slot.into());
        self
    }

    /// Adds a worst-performing time slot.
    pub fn with_worst_slot(mut self, slot: impl Into<String>) -> Self {
        self.worst_time_slots.push(slot.into());
        self
    }
}

/// Everything the engine knows about one student for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentState {
    /// Student identifier.
    pub id: String,
    /// Progress records, one per course.
    pub progress: Vec<ProgressRecord>,
    /// Content the student still needs, grouped by course/urgency.
    pub unlearned: Vec<ContentGroup>,
    /// Learning analytics, if available.
    pub analytics: Option<LearningAnalytics>,
}

impl StudentState {
    /// Creates an empty state (no progress, no unlearned content, no analytics).
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            progress: Vec::new(),
            unlearned: Vec::new(),
            analytics: None,
        }
    }

    /// Whether this state carries no data at all.
    pub fn is_empty(&self) -> bool {
        self.progress.is_empty() && self.unlearned.is_empty() && self.analytics.is_none()
    }

    /// Average progress across all courses. `None` if no progress records.
    pub fn avg_progress(&self) -> Option<f64> {
        if self.progress.is_empty() {
            return None;
        }
        let sum: f64 = self.progress.iter().map(|p| p.progress_percent).sum();
        Some(sum / self.progress.len() as f64)
    }

    /// Dominant pace category across courses (most frequent; ties resolve
    /// to the faster category). `None` if no progress records.
    pub fn dominant_pace(&self) -> Option<LearningPace> {
        if self.progress.is_empty() {
            return None;
        }
        let mut counts = [(LearningPace::Slow, 0usize), (LearningPace::Average, 0), (LearningPace::Fast, 0)];
        for record in &self.progress {
            let idx = match record.pace {
                LearningPace::Slow => 0,
                LearningPace::Average => 1,
                LearningPace::Fast => 2,
            };
            counts[idx].1 += 1;
        }
        counts.iter().max_by_key(|(pace, n)| (*n, *pace)).map(|(pace, _)| *pace)
    }

    /// All unlearned items across content groups.
    pub fn unlearned_items(&self) -> impl Iterator<Item = &ContentItem> {
        self.unlearned.iter().flat_map(|g| g.items.iter())
    }

    /// Highest urgency across unlearned content groups. `None` if no
    /// unlearned content.
    pub fn max_urgency(&self) -> Option<ContentUrgency> {
        self.unlearned.iter().map(|g| g.urgency).max()
    }

    /// Whether any unlearned item sits in the tolerance band of `item`.
    pub fn needs_content(&self, item: &ContentItem) -> bool {
        self.unlearned_items().any(|i| i.within_tolerance(item))
    }

    /// Drops progress records and unlearned groups of other course types.
    pub fn retain_course_type(&mut self, course_type: &str) {
        self.progress.retain(|p| p.course_type == course_type);
        self.unlearned.retain(|g| g.course_type == course_type);
    }
}
