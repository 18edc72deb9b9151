//! Pairwise compatibility model.
//!
//! A `PairCompatibility` is symmetric by construction: the pair key is the
//! two student ids in sorted order, so each unordered pair is computed and
//! stored exactly once. Lookup accepts the ids in either order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ContentItem;

/// Compatibility between one unordered pair of students.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairCompatibility {
    /// Lexicographically smaller student id.
    pub student_a: String,
    /// Lexicographically larger student id.
    pub student_b: String,
    /// Composite compatibility score (0-100).
    pub score: f64,
    /// Content both students still need (same unit, lesson within ±1).
    pub shared_content: Vec<ContentItem>,
    /// Learning-style match (0.0-1.0).
    pub style_match: f64,
    /// Pace compatibility (0.0-1.0).
    pub pace_compatibility: f64,
    /// Social history from shared past classes (0.0-1.0, capped).
    pub social_history: f64,
}

impl PairCompatibility {
    /// Creates a pair record; ids are stored in sorted order.
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        let (student_a, student_b) = sorted_pair(first.into(), second.into());
        Self {
            student_a,
            student_b,
            score: 0.0,
            shared_content: Vec::new(),
            style_match: 0.0,
            pace_compatibility: 0.0,
            social_history: 0.0,
        }
    }

    /// Whether this record describes the given unordered pair.
    pub fn involves(&self, first: &str, second: &str) -> bool {
        (self.student_a == first && self.student_b == second)
            || (self.student_a == second && self.student_b == first)
    }

    /// The other student of the pair, given one of the two ids.
    pub fn other(&self, id: &str) -> Option<&str> {
        if self.student_a == id {
            Some(&self.student_b)
        } else if self.student_b == id {
            Some(&self.student_a)
        } else {
            None
        }
    }
}

fn sorted_pair(first: String, second: String) -> (String, String) {
    if first <= second {
        (first, second)
    } else {
        (second, first)
    }
}

/// Symmetric lookup of pairwise compatibility, keyed by sorted id pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatibilityMatrix {
    pairs: HashMap<(String, String), PairCompatibility>,
}

impl CompatibilityMatrix {
    /// Creates an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a matrix from computed pair records.
    pub fn from_pairs(records: impl IntoIterator<Item = PairCompatibility>) -> Self {
        let mut matrix = Self::new();
        for record in records {
            matrix.insert(record);
        }
        matrix
    }

    /// Inserts a pair record (overwrites an existing entry for the pair).
    pub fn insert(&mut self, record: PairCompatibility) {
        let key = (record.student_a.clone(), record.student_b.clone());
        self.pairs.insert(key, record);
    }

    /// Looks up the pair in either id order.
    pub fn get(&self, first: &str, second: &str) -> Option<&PairCompatibility> {
        let key = if first <= second {
            (first.to_string(), second.to_string())
        } else {
            (second.to_string(), first.to_string())
        };
        self.pairs.get(&key)
    }

    /// Compatibility score for the pair, or `default` if not computed.
    pub fn score_or(&self, first: &str, second: &str, default: f64) -> f64 {
        self.get(first, second).map(|p| p.score).unwrap_or(default)
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the matrix holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over all stored pair records.
    pub fn iter(&self) -> impl Iterator<Item = &PairCompatibility> {
        self.pairs.values()
    }
}
