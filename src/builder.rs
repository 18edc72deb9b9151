//! Final partition → composition transform.
//!
//! Converts the optimized partition into `ClassComposition` records with
//! the attributes a scheduler needs: shared focus content, difficulty,
//! teacher requirements, priority, and recommended duration.

use std::collections::HashMap;

use crate::grouping::{focus_content, Partition, FOCUS_CAP};
use crate::models::{
    ClassComposition, ClassType, ContentType, ContentUrgency, SchedulingPriority, StudentState,
    TeacherRequirement,
};

/// Duration floor in minutes.
const MIN_DURATION_MINUTES: u32 = 45;
/// Duration ceiling in minutes.
const MAX_DURATION_MINUTES: u32 = 120;
/// Difficulty assigned when a group has no focus content.
const DEFAULT_DIFFICULTY: u8 = 5;

/// Builds output composition records from a final partition.
pub struct ClassCompositionBuilder<'a> {
    states: &'a HashMap<String, StudentState>,
}

impl<'a> ClassCompositionBuilder<'a> {
    /// Creates a builder over gathered student state.
    pub fn new(states: &'a HashMap<String, StudentState>) -> Self {
        Self { states }
    }

    /// Converts every group of the partition into a composition record.
    pub fn build(&self, partition: &Partition) -> Vec<ClassComposition> {
        partition
            .groups
            .iter()
            .enumerate()
            .map(|(index, group)| self.build_one(index, &group.members))
            .collect()
    }

    fn build_one(&self, index: usize, members: &[String]) -> ClassComposition {
        let focus = focus_content(members, self.states, FOCUS_CAP);

        let difficulty_level = if focus.is_empty() {
            DEFAULT_DIFFICULTY
        } else {
            let mean = focus.iter().map(|i| f64::from(i.difficulty)).sum::<f64>()
                / focus.len() as f64;
            (mean.round() as u8).clamp(1, 10)
        };

        let mut teacher_requirements = Vec::new();
        if let Some(max_difficulty) = focus.iter().map(|i| i.difficulty).max() {
            if max_difficulty > 8 {
                teacher_requirements.push(TeacherRequirement::AdvancedCertification);
            } else if max_difficulty > 6 {
                teacher_requirements.push(TeacherRequirement::IntermediateCertification);
            }
        }
        if focus.iter().any(|i| i.content_type == ContentType::Speaking) {
            teacher_requirements.push(TeacherRequirement::SpeakingSpecialist);
        }
        if focus.iter().any(|i| i.content_type == ContentType::Writing) {
            teacher_requirements.push(TeacherRequirement::WritingSpecialist);
        }

        let scheduling_priority = self.priority_for(members);

        let mut learning_objectives = Vec::new();
        for item in &focus {
            for objective in &item.objectives {
                if !learning_objectives.contains(objective) {
                    learning_objectives.push(objective.clone());
                }
            }
        }

        let base_minutes: u32 = focus.iter().map(|i| i.duration_minutes).sum();
        let multiplier = (members.len() as f64 / 4.0).max(1.0);
        let recommended_duration_minutes = (f64::from(base_minutes) * multiplier).round() as u32;
        let recommended_duration_minutes =
            recommended_duration_minutes.clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES);

        let class_type = if members.len() == 1 {
            ClassType::Individual
        } else {
            ClassType::Group
        };

        ClassComposition {
            id: format!("composition-{}", index + 1),
            student_ids: members.to_vec(),
            content_focus: focus,
            class_type,
            difficulty_level,
            teacher_requirements,
            scheduling_priority,
            optimal_size: members.len(),
            learning_objectives,
            recommended_duration_minutes,
        }
    }

    /// Urgent beats high beats medium, across all members' unlearned
    /// content.
    fn priority_for(&self, members: &[String]) -> SchedulingPriority {
        let max = members
            .iter()
            .filter_map(|id| self.states.get(id).and_then(StudentState::max_urgency))
            .max();
        match max {
            Some(ContentUrgency::Urgent) => SchedulingPriority::Urgent,
            Some(ContentUrgency::High) => SchedulingPriority::High,
            _ => SchedulingPriority::Medium,
        }
    }
}
