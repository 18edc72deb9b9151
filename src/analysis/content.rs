//! Content-key clustering.
//!
//! Groups students by the curriculum units they still need. Each unlearned
//! item contributes its `unit-lesson` content key; a key's cluster is the
//! distinct set of students needing it. Keys with fewer than `min_students`
//! needers are dropped — they cannot seed a valid group.
//!
//! Clusters may overlap across keys; deduplication is the candidate
//! generator's job, not this pass's.

use std::collections::{BTreeMap, BTreeSet};
use std::collections::HashMap;

use tracing::debug;

use crate::models::StudentState;

/// Students needing one content key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCluster {
    /// Content key, `unit-lesson`.
    pub content_key: String,
    /// Distinct student ids needing this key, sorted.
    pub student_ids: Vec<String>,
}

impl ContentCluster {
    /// Number of students needing this key.
    pub fn len(&self) -> usize {
        self.student_ids.len()
    }

    /// Whether the cluster is empty.
    pub fn is_empty(&self) -> bool {
        self.student_ids.is_empty()
    }
}

/// Clusters students by shared unneeded content.
#[derive(Debug, Clone)]
pub struct ContentCompatibilityAnalyzer {
    min_students: usize,
}

impl ContentCompatibilityAnalyzer {
    /// Creates an analyzer with the minimum cluster size.
    pub fn new(min_students: usize) -> Self {
        Self { min_students }
    }

    /// Builds content clusters from gathered state.
    ///
    /// Output is ordered largest cluster first (key order breaks ties)
    /// so the content strategy consumes the broadest overlaps first.
    pub fn analyze(&self, states: &HashMap<String, StudentState>) -> Vec<ContentCluster> {
        // BTreeMap keeps key iteration stable across runs.
        let mut needers: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();

        for state in states.values() {
            for item in state.unlearned_items() {
                needers
                    .entry(item.content_key())
                    .or_default()
                    .insert(state.id.as_str());
            }
        }

        let mut clusters: Vec<ContentCluster> = needers
            .into_iter()
            .filter(|(_, students)| students.len() >= self.min_students)
            .map(|(content_key, students)| ContentCluster {
                content_key,
                student_ids: students.into_iter().map(str::to_string).collect(),
            })
            .collect();

        clusters.sort_by(|a, b| {
            b.len()
                .cmp(&a.len())
                .then_with(|| a.content_key.cmp(&b.content_key))
        });

        debug!(clusters = clusters.len(), "content clustering complete");
        clusters
    }
}
