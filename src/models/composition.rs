//! Composition (solution) model.
//!
//! A `ClassComposition` is the finalized output record for one student
//! group, carrying the scheduling-relevant attributes derived from the
//! group's shared content. `CompositionScore` is the five-part quality
//! measure used both for final reporting and inside the optimizer.

use serde::{Deserialize, Serialize};

use super::ContentItem;

/// Individual session or group class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassType {
    /// Exactly one student.
    Individual,
    /// Two or more students.
    Group,
}

/// Scheduling priority derived from member content urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulingPriority {
    Urgent,
    High,
    Medium,
}

/// Teacher qualification tags derived from focus content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeacherRequirement {
    /// Focus difficulty above 8.
    AdvancedCertification,
    /// Focus difficulty above 6.
    IntermediateCertification,
    /// Focus content includes speaking.
    SpeakingSpecialist,
    /// Focus content includes writing.
    WritingSpecialist,
}

/// A finalized class composition.
///
/// Student id sets are disjoint across all compositions produced by one
/// run; together with the reported unplaced students they partition the
/// input pool exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassComposition {
    /// Composition identifier, unique within the run.
    pub id: String,
    /// Member student ids (non-empty).
    pub student_ids: Vec<String>,
    /// Most broadly shared content items (at most 3).
    pub content_focus: Vec<ContentItem>,
    /// Individual iff exactly one member.
    pub class_type: ClassType,
    /// Rounded mean difficulty of focus content (1-10, default 5).
    pub difficulty_level: u8,
    /// Derived teacher qualification tags.
    pub teacher_requirements: Vec<TeacherRequirement>,
    /// Derived scheduling priority.
    pub scheduling_priority: SchedulingPriority,
    /// Optimal class size (equals actual size at creation time).
    pub optimal_size: usize,
    /// Learning objectives flattened from focus content.
    pub learning_objectives: Vec<String>,
    /// Recommended duration in minutes (45-120).
    pub recommended_duration_minutes: u32,
}

impl ClassComposition {
    /// Number of members.
    pub fn size(&self) -> usize {
        self.student_ids.len()
    }

    /// Whether the given student belongs to this composition.
    pub fn contains(&self, student_id: &str) -> bool {
        self.student_ids.iter().any(|id| id == student_id)
    }
}

/// Five weighted sub-scores and their weighted total, all in 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositionScore {
    /// Weighted total (0-100).
    pub total: f64,
    /// How well focus content matches member needs.
    pub content_alignment: f64,
    /// Spread of focus-content difficulty.
    pub difficulty_balance: f64,
    /// Spread of member progress.
    pub progress_compatibility: f64,
    /// Mean pairwise member compatibility.
    pub social_compatibility: f64,
    /// Deviation of actual size from optimal size.
    pub size_optimization: f64,
}

impl CompositionScore {
    /// Sub-score weights: content, difficulty, progress, social, size.
    pub const WEIGHTS: [f64; 5] = [0.30, 0.25, 0.20, 0.15, 0.10];

    /// Combines sub-scores into a weighted total. Inputs are clamped to
    /// 0-100 first.
    pub fn from_parts(
        content_alignment: f64,
        difficulty_balance: f64,
        progress_compatibility: f64,
        social_compatibility: f64,
        size_optimization: f64,
    ) -> Self {
        let parts = [
            content_alignment.clamp(0.0, 100.0),
            difficulty_balance.clamp(0.0, 100.0),
            progress_compatibility.clamp(0.0, 100.0),
            social_compatibility.clamp(0.0, 100.0),
            size_optimization.clamp(0.0, 100.0),
        ];
        let total = parts
            .iter()
            .zip(Self::WEIGHTS.iter())
            .map(|(part, weight)| part * weight)
            .sum();
        Self {
            total,
            content_alignment: parts[0],
            difficulty_balance: parts[1],
            progress_compatibility: parts[2],
            social_compatibility: parts[3],
            size_optimization: parts[4],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let sum: f64 = CompositionScore::WEIGHTS.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_from_parts_weighting() {
        let score = CompositionScore::from_parts(100.0, 100.0, 100.0, 100.0, 100.0);
        assert!((score.total - 100.0).abs() < 1e-10);

        let score = CompositionScore::from_parts(100.0, 0.0, 0.0, 0.0, 0.0);
        assert!((score.total - 30.0).abs() < 1e-10);
    }

    #[test]
    fn test_from_parts_clamps() {
        let score = CompositionScore::from_parts(150.0, -20.0, 50.0, 50.0, 50.0);
        assert_eq!(score.content_alignment, 100.0);
        assert_eq!(score.difficulty_balance, 0.0);
        assert!(score.total >= 0.0 && score.total <= 100.0);
    }

    #[test]
    fn test_composition_contains() {
        let composition = ClassComposition {
            id: "class-001".into(),
            student_ids: vec!["s1".into(), "s2".into()],
            content_focus: Vec::new(),
            class_type: ClassType::Group,
            difficulty_level: 5,
            teacher_requirements: Vec::new(),
            scheduling_priority: SchedulingPriority::Medium,
            optimal_size: 2,
            learning_objectives: Vec::new(),
            recommended_duration_minutes: 60,
        };
        assert_eq!(composition.size(), 2);
        assert!(composition.contains("s1"));
        assert!(!composition.contains("s3"));
    }
}
