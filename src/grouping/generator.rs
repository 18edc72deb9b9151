//! Candidate partition generation.
//!
//! Produces an initial partition of the student pool from up to three
//! strategies, sharing one used-student set so no student is assigned
//! twice:
//!
//! 1. **Content**: consume content clusters largest-first, taking up to
//!    `max_students` unused members per cluster.
//! 2. **Social**: seed with the student ranked highest by total pairwise
//!    compatibility, then greedily add candidates whose pairwise score
//!    against every current member clears the social threshold.
//! 3. **Progress**: bucket remaining students by `floor(avg_progress/25)`
//!    combined with pace category.
//!
//! Single-objective runs lead with the named strategy and fall through to
//! the others; `Balanced` runs all three in sequence. Leftovers become
//! one-student groups when individual classes are allowed, otherwise they
//! are reported as unplaced.

use std::collections::{BTreeMap, HashSet};
use std::collections::HashMap;

use tracing::debug;

use crate::analysis::ContentCluster;
use crate::models::{
    CompatibilityMatrix, CompositionCriteria, GroupingOptions, GroupingStrategy, LearningPace,
    OptimizeFor, StudentState,
};

use super::{Partition, StudentGroup};

/// Avg-progress floor below which a student counts as struggling.
const STRUGGLING_PROGRESS_CUTOFF: f64 = 40.0;

/// Generator output: the initial partition plus any unplaced students.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedGroups {
    /// Disjoint candidate groups.
    pub partition: Partition,
    /// Students no strategy accepted (only when individual classes are
    /// disallowed); never silently dropped.
    pub unplaced: Vec<String>,
}

/// Builds initial candidate partitions.
pub struct CandidateGroupingGenerator<'a> {
    criteria: &'a CompositionCriteria,
    options: &'a GroupingOptions,
    states: &'a HashMap<String, StudentState>,
    matrix: &'a CompatibilityMatrix,
}

impl<'a> CandidateGroupingGenerator<'a> {
    /// Creates a generator over run state.
    pub fn new(
        criteria: &'a CompositionCriteria,
        options: &'a GroupingOptions,
        states: &'a HashMap<String, StudentState>,
        matrix: &'a CompatibilityMatrix,
    ) -> Self {
        Self {
            criteria,
            options,
            states,
            matrix,
        }
    }

    /// Generates the initial partition for the pool.
    ///
    /// `clusters` comes from the content analyzer; `pool` is the full
    /// student id list (duplicates ignored).
    pub fn generate(&self, pool: &[String], clusters: &[ContentCluster]) -> GeneratedGroups {
        let mut pool: Vec<String> = {
            let mut seen = HashSet::new();
            pool.iter()
                .filter(|id| seen.insert(id.as_str()))
                .cloned()
                .collect()
        };
        pool.sort_unstable();

        let mut used: HashSet<String> = HashSet::new();
        let mut groups: Vec<StudentGroup> = Vec::new();

        for strategy in strategy_order(self.options.optimize_for) {
            match strategy {
                OptimizeFor::Content => self.content_pass(clusters, &mut used, &mut groups),
                OptimizeFor::Social => self.social_pass(&pool, &mut used, &mut groups),
                OptimizeFor::Progress => self.progress_pass(&pool, &mut used, &mut groups),
                OptimizeFor::Balanced => unreachable!("balanced expands to the three strategies"),
            }
        }

        let leftovers: Vec<String> = pool
            .iter()
            .filter(|id| !used.contains(*id))
            .cloned()
            .collect();

        let unplaced = if self.options.allow_individual_classes {
            for id in leftovers {
                groups.push(StudentGroup::new(vec![id]));
            }
            Vec::new()
        } else {
            leftovers
        };

        debug!(
            groups = groups.len(),
            unplaced = unplaced.len(),
            "candidate generation complete"
        );
        GeneratedGroups {
            partition: Partition::new(groups),
            unplaced,
        }
    }

    /// Strategy 1: one group per content cluster, up to `max_students`
    /// unused members, kept only if it reaches `min_students`.
    fn content_pass(
        &self,
        clusters: &[ContentCluster],
        used: &mut HashSet<String>,
        groups: &mut Vec<StudentGroup>,
    ) {
        for cluster in clusters {
            let members: Vec<String> = cluster
                .student_ids
                .iter()
                .filter(|id| !used.contains(*id))
                .take(self.criteria.max_students)
                .cloned()
                .collect();
            if members.len() < self.criteria.min_students {
                continue;
            }
            used.extend(members.iter().cloned());
            groups.push(StudentGroup::new(members));
        }
    }

    /// Strategy 2: compatibility-ranked seeding with greedy growth.
    ///
    /// A candidate joins only if its pairwise score against every current
    /// member clears the social threshold; a group below `min_students`
    /// is discarded and its members stay in the pool.
    fn social_pass(
        &self,
        pool: &[String],
        used: &mut HashSet<String>,
        groups: &mut Vec<StudentGroup>,
    ) {
        let seeds = self.ranked_seeds(pool, used);

        for seed in seeds {
            if used.contains(&seed) {
                continue;
            }
            let mut members = vec![seed.clone()];

            while members.len() < self.criteria.max_students {
                let best = pool
                    .iter()
                    .filter(|id| !used.contains(*id) && !members.contains(*id))
                    .filter(|id| {
                        members.iter().all(|member| {
                            self.matrix.score_or(id, member, 0.0) >= self.criteria.social_threshold
                        })
                    })
                    .max_by(|a, b| {
                        let score_a = self.mean_score_against(a, &members);
                        let score_b = self.mean_score_against(b, &members);
                        score_a
                            .partial_cmp(&score_b)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            // Lexicographically smaller id wins ties.
                            .then_with(|| b.cmp(a))
                    });
                match best {
                    Some(candidate) => members.push(candidate.clone()),
                    None => break,
                }
            }

            if members.len() >= self.criteria.min_students {
                used.extend(members.iter().cloned());
                groups.push(StudentGroup::new(members));
            }
        }
    }

    /// Strategy 3: group by progress.
    ///
    /// Homogeneous and mixed runs bucket by progress quartile × pace;
    /// heterogeneous runs deal students across groups so each group spans
    /// the progress range.
    fn progress_pass(
        &self,
        pool: &[String],
        used: &mut HashSet<String>,
        groups: &mut Vec<StudentGroup>,
    ) {
        if self.options.strategy == GroupingStrategy::Heterogeneous {
            self.heterogeneous_progress_pass(pool, used, groups);
            return;
        }
        let mut buckets: BTreeMap<(u32, Option<LearningPace>), Vec<String>> = BTreeMap::new();

        for id in pool {
            if used.contains(id) {
                continue;
            }
            let state = match self.states.get(id) {
                Some(state) => state,
                None => continue,
            };
            let quartile = state
                .avg_progress()
                .map(|p| (p / 25.0).floor() as u32)
                .unwrap_or(0);
            buckets
                .entry((quartile, state.dominant_pace()))
                .or_default()
                .push(id.clone());
        }

        for (_, bucket) in buckets {
            if bucket.len() < self.criteria.min_students {
                continue;
            }
            let members: Vec<String> = bucket
                .into_iter()
                .take(self.criteria.max_students)
                .collect();
            used.extend(members.iter().cloned());
            groups.push(StudentGroup::new(members));
        }
    }

    /// Heterogeneous variant: sort remaining students by progress
    /// (descending, unknown last) and deal them round-robin across the
    /// fewest groups that respect `max_students`, so every group mixes
    /// progress levels.
    fn heterogeneous_progress_pass(
        &self,
        pool: &[String],
        used: &mut HashSet<String>,
        groups: &mut Vec<StudentGroup>,
    ) {
        let mut remaining: Vec<&String> = pool
            .iter()
            .filter(|id| !used.contains(*id) && self.states.contains_key(*id))
            .collect();
        if remaining.is_empty() || remaining.len() < self.criteria.min_students {
            return;
        }
        remaining.sort_by(|a, b| {
            let pa = self.states.get(*a).and_then(StudentState::avg_progress);
            let pb = self.states.get(*b).and_then(StudentState::avg_progress);
            pb.partial_cmp(&pa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cmp(b))
        });

        let group_count = remaining.len().div_ceil(self.criteria.max_students);
        let mut dealt: Vec<Vec<String>> = vec![Vec::new(); group_count];
        for (index, id) in remaining.into_iter().enumerate() {
            dealt[index % group_count].push(id.clone());
        }

        for members in dealt {
            if members.len() < self.criteria.min_students {
                continue;
            }
            used.extend(members.iter().cloned());
            groups.push(StudentGroup::new(members));
        }
    }

    /// Remaining students ranked as social seeds: struggling students
    /// first when the option is set, then by total pairwise compatibility
    /// against the rest of the remaining pool (descending), id ascending.
    fn ranked_seeds(&self, pool: &[String], used: &HashSet<String>) -> Vec<String> {
        let remaining: Vec<&String> = pool.iter().filter(|id| !used.contains(*id)).collect();

        let mut scored: Vec<(bool, f64, &String)> = remaining
            .iter()
            .map(|id| {
                let total: f64 = remaining
                    .iter()
                    .filter(|other| **other != *id)
                    .map(|other| self.matrix.score_or(id, other, 0.0))
                    .sum();
                let struggling = self.options.prioritize_struggling_students
                    && self
                        .states
                        .get(*id)
                        .and_then(StudentState::avg_progress)
                        .is_some_and(|p| p < STRUGGLING_PROGRESS_CUTOFF);
                (struggling, total, *id)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| a.2.cmp(b.2))
        });
        scored.into_iter().map(|(_, _, id)| id.clone()).collect()
    }

    fn mean_score_against(&self, id: &str, members: &[String]) -> f64 {
        if members.is_empty() {
            return 0.0;
        }
        let sum: f64 = members
            .iter()
            .map(|member| self.matrix.score_or(id, member, 0.0))
            .sum();
        sum / members.len() as f64
    }
}

/// Execution order of strategies for an objective.
fn strategy_order(optimize_for: OptimizeFor) -> Vec<OptimizeFor> {
    match optimize_for {
        OptimizeFor::Content | OptimizeFor::Balanced => {
            vec![OptimizeFor::Content, OptimizeFor::Social, OptimizeFor::Progress]
        }
        OptimizeFor::Social => {
            vec![OptimizeFor::Social, OptimizeFor::Content, OptimizeFor::Progress]
        }
        OptimizeFor::Progress => {
            vec![OptimizeFor::Progress, OptimizeFor::Content, OptimizeFor::Social]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentGroup, ContentItem, PairCompatibility, ProgressRecord};

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn bare_states(list: &[&str]) -> HashMap<String, StudentState> {
        list.iter()
            .map(|id| (id.to_string(), StudentState::empty(*id)))
            .collect()
    }

    fn pair(a: &str, b: &str, score: f64) -> PairCompatibility {
        let mut p = PairCompatibility::new(a, b);
        p.score = score;
        p
    }

    fn cluster(key: &str, students: &[&str]) -> ContentCluster {
        ContentCluster {
            content_key: key.into(),
            student_ids: ids(students),
        }
    }

    #[test]
    fn test_content_strategy_consumes_clusters() {
        let criteria = CompositionCriteria::with_size_bounds(2, 3);
        let options = GroupingOptions::default().with_objective(OptimizeFor::Content);
        let states = bare_states(&["s1", "s2", "s3", "s4"]);
        let matrix = CompatibilityMatrix::new();
        let generator = CandidateGroupingGenerator::new(&criteria, &options, &states, &matrix);

        let clusters = vec![cluster("1-1", &["s1", "s2", "s3"]), cluster("2-1", &["s3", "s4"])];
        let result = generator.generate(&ids(&["s1", "s2", "s3", "s4"]), &clusters);

        // First cluster takes s1-s3; second is left with s4 alone (< min).
        assert_eq!(result.partition.groups[0].members, ids(&["s1", "s2", "s3"]));
        // s4 falls through to an individual class.
        assert!(result
            .partition
            .groups
            .iter()
            .any(|g| g.members == ids(&["s4"])));
        assert!(result.unplaced.is_empty());
    }

    #[test]
    fn test_partition_disjoint_despite_overlapping_clusters() {
        let criteria = CompositionCriteria::with_size_bounds(2, 2);
        let options = GroupingOptions::default().with_objective(OptimizeFor::Content);
        let states = bare_states(&["s1", "s2", "s3"]);
        let matrix = CompatibilityMatrix::new();
        let generator = CandidateGroupingGenerator::new(&criteria, &options, &states, &matrix);

        let clusters = vec![cluster("1-1", &["s1", "s2"]), cluster("1-2", &["s1", "s2", "s3"])];
        let result = generator.generate(&ids(&["s1", "s2", "s3"]), &clusters);

        let mut all: Vec<&str> = result.partition.student_ids().collect();
        all.sort_unstable();
        assert_eq!(all, vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn test_social_strategy_respects_threshold() {
        // s1-s2 compatible (90), s3 incompatible with both (15).
        let criteria = CompositionCriteria::with_size_bounds(2, 4);
        let options = GroupingOptions::default().with_objective(OptimizeFor::Social);
        let states = bare_states(&["s1", "s2", "s3"]);
        let matrix = CompatibilityMatrix::from_pairs([
            pair("s1", "s2", 90.0),
            pair("s1", "s3", 15.0),
            pair("s2", "s3", 15.0),
        ]);
        let generator = CandidateGroupingGenerator::new(&criteria, &options, &states, &matrix);
        let result = generator.generate(&ids(&["s1", "s2", "s3"]), &[]);

        let social_group = result
            .partition
            .groups
            .iter()
            .find(|g| g.len() == 2)
            .expect("compatible pair grouped");
        assert!(social_group.members.contains(&"s1".to_string()));
        assert!(social_group.members.contains(&"s2".to_string()));
        // s3 must not join them.
        assert!(result
            .partition
            .groups
            .iter()
            .any(|g| g.members == ids(&["s3"])));
    }

    #[test]
    fn test_social_group_below_min_discarded() {
        let criteria = CompositionCriteria::with_size_bounds(3, 4);
        let options = GroupingOptions::default()
            .with_objective(OptimizeFor::Social)
            .with_individual_classes(false);
        let states = bare_states(&["s1", "s2"]);
        let matrix = CompatibilityMatrix::from_pairs([pair("s1", "s2", 95.0)]);
        let generator = CandidateGroupingGenerator::new(&criteria, &options, &states, &matrix);
        let result = generator.generate(&ids(&["s1", "s2"]), &[]);

        // Pair of 2 cannot satisfy min=3; both end up unplaced.
        assert!(result.partition.groups.is_empty());
        assert_eq!(result.unplaced, ids(&["s1", "s2"]));
    }

    #[test]
    fn test_progress_buckets() {
        let criteria = CompositionCriteria::with_size_bounds(2, 4);
        let options = GroupingOptions::default().with_objective(OptimizeFor::Progress);
        let mut states = HashMap::new();
        for (id, progress) in [("s1", 10.0), ("s2", 20.0), ("s3", 80.0), ("s4", 90.0)] {
            let mut state = StudentState::empty(id);
            state
                .progress
                .push(ProgressRecord::new("c1", progress, LearningPace::Average));
            states.insert(id.to_string(), state);
        }
        let matrix = CompatibilityMatrix::new();
        let generator = CandidateGroupingGenerator::new(&criteria, &options, &states, &matrix);
        let result = generator.generate(&ids(&["s1", "s2", "s3", "s4"]), &[]);

        // Quartile 0 bucket {s1,s2}; quartile 3 bucket {s3,s4}.
        assert_eq!(result.partition.groups.len(), 2);
        assert!(result.partition.groups.iter().any(|g| g.members == ids(&["s1", "s2"])));
        assert!(result.partition.groups.iter().any(|g| g.members == ids(&["s3", "s4"])));
    }

    #[test]
    fn test_heterogeneous_strategy_mixes_progress_levels() {
        let criteria = CompositionCriteria::with_size_bounds(2, 2);
        let options = GroupingOptions::default()
            .with_strategy(GroupingStrategy::Heterogeneous)
            .with_objective(OptimizeFor::Progress);
        let mut states = HashMap::new();
        for (id, progress) in [("s1", 90.0), ("s2", 80.0), ("s3", 20.0), ("s4", 10.0)] {
            let mut state = StudentState::empty(id);
            state
                .progress
                .push(ProgressRecord::new("c1", progress, LearningPace::Average));
            states.insert(id.to_string(), state);
        }
        let matrix = CompatibilityMatrix::new();
        let generator = CandidateGroupingGenerator::new(&criteria, &options, &states, &matrix);
        let result = generator.generate(&ids(&["s1", "s2", "s3", "s4"]), &[]);

        // Round-robin over descending progress pairs a high performer with
        // a low one in each group.
        assert_eq!(result.partition.groups.len(), 2);
        assert!(result.partition.groups.iter().any(|g| g.members == ids(&["s1", "s3"])));
        assert!(result.partition.groups.iter().any(|g| g.members == ids(&["s2", "s4"])));
    }

    #[test]
    fn test_unplaced_reported_when_individuals_disallowed() {
        let criteria = CompositionCriteria::with_size_bounds(2, 4);
        let options = GroupingOptions::default()
            .with_objective(OptimizeFor::Content)
            .with_individual_classes(false);
        let states = bare_states(&["s1", "s2", "s3"]);
        let matrix = CompatibilityMatrix::new();
        let generator = CandidateGroupingGenerator::new(&criteria, &options, &states, &matrix);

        let clusters = vec![cluster("1-1", &["s1", "s2"])];
        let result = generator.generate(&ids(&["s1", "s2", "s3"]), &clusters);

        assert_eq!(result.partition.groups.len(), 1);
        assert_eq!(result.unplaced, ids(&["s3"]));
    }

    #[test]
    fn test_struggling_students_seed_first() {
        let criteria = CompositionCriteria::with_size_bounds(2, 2);
        let options = GroupingOptions::default()
            .with_objective(OptimizeFor::Social)
            .with_struggling_priority(true);
        let mut states = bare_states(&["s1", "s2", "s3"]);
        states.get_mut("s3").unwrap().progress.push(ProgressRecord::new(
            "c1",
            10.0,
            LearningPace::Slow,
        ));
        // Everyone mutually compatible; s3 is struggling so it seeds first
        // and grabs its best partner before anyone else.
        let matrix = CompatibilityMatrix::from_pairs([
            pair("s1", "s2", 70.0),
            pair("s1", "s3", 65.0),
            pair("s2", "s3", 80.0),
        ]);
        let generator = CandidateGroupingGenerator::new(&criteria, &options, &states, &matrix);
        let result = generator.generate(&ids(&["s1", "s2", "s3"]), &[]);

        let first = &result.partition.groups[0];
        assert_eq!(first.members[0], "s3");
        assert!(first.members.contains(&"s2".to_string()));
    }

    #[test]
    fn test_generated_groups_have_optimal_size_equal_to_actual() {
        let criteria = CompositionCriteria::with_size_bounds(2, 4);
        let options = GroupingOptions::default();
        let states = bare_states(&["s1", "s2", "s3"]);
        let matrix = CompatibilityMatrix::new();
        let generator = CandidateGroupingGenerator::new(&criteria, &options, &states, &matrix);
        let result = generator.generate(&ids(&["s1", "s2", "s3"]), &[cluster("1-1", &["s1", "s2"])]);

        for group in &result.partition.groups {
            assert_eq!(group.optimal_size, group.len());
        }
    }
}
