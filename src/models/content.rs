//! Curriculum content models.
//!
//! Content items are immutable reference data owned by the curriculum
//! collaborator. A content item is identified by its `unit-lesson` pair;
//! two items belong to the same neighborhood when their units match and
//! their lessons differ by at most one (the tolerance band used by
//! compatibility analysis and focus-content selection).

use serde::{Deserialize, Serialize};

/// Skill area a content item trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Speaking,
    Listening,
    Reading,
    Writing,
    Grammar,
    Vocabulary,
}

/// How soon a student needs to cover an unlearned content group.
///
/// Drives the `scheduling_priority` of the final composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentUrgency {
    Normal,
    High,
    Urgent,
}

/// A single piece of curriculum content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unit number (1-based).
    pub unit: u32,
    /// Lesson number within the unit (1-based).
    pub lesson: u32,
    /// Difficulty level (1-10).
    pub difficulty: u8,
    /// Skill area.
    pub content_type: ContentType,
    /// Estimated duration in minutes.
    pub duration_minutes: u32,
    /// Ordered learning objectives.
    pub objectives: Vec<String>,
}

impl ContentItem {
    /// Creates a content item for the given unit and lesson.
    pub fn new(unit: u32, lesson: u32) -> Self {
        Self {
            unit,
            lesson,
            difficulty: 5,
            content_type: ContentType::Vocabulary,
            duration_minutes: 30,
            objectives: Vec::new(),
        }
    }

    /// Sets the difficulty level (clamped to 1-10).
    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = difficulty.clamp(1, 10);
        self
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Sets the estimated duration in minutes.
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// Adds a learning objective.
    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objectives.push(objective.into());
        self
    }

    /// Content key: `unit-lesson`, e.g. `"3-2"`.
    pub fn content_key(&self) -> String {
        format!("{}-{}", self.unit, self.lesson)
    }

    /// Whether `other` falls in this item's tolerance band:
    /// same unit, lesson within ±1.
    pub fn within_tolerance(&self, other: &ContentItem) -> bool {
        self.unit == other.unit && self.lesson.abs_diff(other.lesson) <= 1
    }
}

/// A set of content items a student still needs, with an urgency level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentGroup {
    /// Course type this group belongs to (for course-type filtering).
    pub course_type: String,
    /// How urgently the student needs this content.
    pub urgency: ContentUrgency,
    /// The unlearned items.
    pub items: Vec<ContentItem>,
}

impl ContentGroup {
    /// Creates an empty content group for a course type.
    pub fn new(course_type: impl Into<String>) -> Self {
        Self {
            course_type: course_type.into(),
            urgency: ContentUrgency::Normal,
            items: Vec::new(),
        }
    }

    /// Sets the urgency.
    pub fn with_urgency(mut self, urgency: ContentUrgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Adds an item.
    pub fn with_item(mut self, item: ContentItem) -> Self {
        self.items.push(item);
        self
    }
}
