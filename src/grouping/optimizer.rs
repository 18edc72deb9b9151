//! Local-search partition improvement.
//!
//! Iterative first-improvement search over a candidate partition. Each
//! iteration enumerates three move families in a fixed order — swap, then
//! merge, then split — evaluates every resulting variation, and adopts
//! the first one that strictly improves the aggregate score. The search
//! terminates at a local optimum (no improving move) or when the
//! iteration budget runs out; both are valid outcomes.
//!
//! Variations are value-copies of the partition, so evaluating them in
//! parallel cannot alias; the selection scan stays sequential in move
//! discovery order, keeping results deterministic for identical input.
//!
//! # Reference
//! Hoos & Stützle (2005), "Stochastic Local Search", Ch. 2: Iterative
//! Improvement

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::models::CompositionCriteria;

use super::{CompositionScorer, Partition, StudentGroup};

/// Minimum score gain for a move to count as improving.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// How the optimizer finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerStatus {
    /// No improving move exists; a local optimum was reached.
    Converged,
    /// The iteration budget ran out before convergence.
    BudgetExhausted,
    /// Cancellation was requested; best partition so far returned.
    Cancelled,
}

/// Result of one optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    /// The improved partition.
    pub partition: Partition,
    /// Terminal state of the search.
    pub status: OptimizerStatus,
    /// Iterations performed (accepted moves).
    pub iterations: usize,
    /// Aggregate score of the returned partition.
    pub score: f64,
}

/// Cooperative cancellation handle.
///
/// Checked once per optimizer iteration; cancelling returns the best
/// partition found so far instead of failing.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// A structural move on a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    /// Exchange member `a` of group `i` with member `b` of group `j`.
    Swap { i: usize, a: usize, j: usize, b: usize },
    /// Combine groups `i` and `j` into one.
    Merge { i: usize, j: usize },
    /// Cut group `i` at its midpoint.
    Split { i: usize },
}

/// First-improvement local search over swap/merge/split moves.
pub struct LocalSearchOptimizer<'a> {
    criteria: &'a CompositionCriteria,
    scorer: &'a CompositionScorer<'a>,
    max_iterations: usize,
}

impl<'a> LocalSearchOptimizer<'a> {
    /// Creates an optimizer with the given iteration budget.
    pub fn new(
        criteria: &'a CompositionCriteria,
        scorer: &'a CompositionScorer<'a>,
        max_iterations: usize,
    ) -> Self {
        Self {
            criteria,
            scorer,
            max_iterations,
        }
    }

    /// Improves `initial` until a local optimum, the iteration budget, or
    /// cancellation.
    pub fn optimize(
        &self,
        initial: Partition,
        cancel: Option<&CancelToken>,
    ) -> OptimizationOutcome {
        let mut current = initial;
        let mut best_score = self.scorer.aggregate(&current);
        let mut iterations = 0;
        let mut status = OptimizerStatus::BudgetExhausted;

        while iterations < self.max_iterations {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                status = OptimizerStatus::Cancelled;
                break;
            }

            let moves = self.enumerate_moves(&current);
            if moves.is_empty() {
                status = OptimizerStatus::Converged;
                break;
            }

            // Variations are independent value-copies; score them in
            // parallel, then scan sequentially in discovery order.
            let scored: Vec<(Partition, f64)> = moves
                .par_iter()
                .map(|mv| {
                    let variation = apply_move(&current, mv);
                    let score = self.scorer.aggregate(&variation);
                    (variation, score)
                })
                .collect();

            let improving = scored
                .into_iter()
                .find(|(_, score)| *score > best_score + IMPROVEMENT_EPSILON);

            match improving {
                Some((variation, score)) => {
                    debug!(iteration = iterations, score, "improving move adopted");
                    current = variation;
                    best_score = score;
                    iterations += 1;
                }
                None => {
                    status = OptimizerStatus::Converged;
                    break;
                }
            }
        }

        info!(
            ?status,
            iterations,
            score = best_score,
            groups = current.groups.len(),
            "local search finished"
        );
        OptimizationOutcome {
            partition: current,
            status,
            iterations,
            score: best_score,
        }
    }

    /// Enumerates all legal moves: swaps first, then merges, then splits.
    fn enumerate_moves(&self, partition: &Partition) -> Vec<Move> {
        let groups = &partition.groups;
        let mut moves = Vec::new();

        for i in 0..groups.len() {
            for j in i + 1..groups.len() {
                if groups[i].len() > 1 && groups[j].len() > 1 {
                    for a in 0..groups[i].len() {
                        for b in 0..groups[j].len() {
                            moves.push(Move::Swap { i, a, j, b });
                        }
                    }
                }
            }
        }

        for i in 0..groups.len() {
            for j in i + 1..groups.len() {
                if groups[i].len() + groups[j].len() <= self.criteria.max_students {
                    moves.push(Move::Merge { i, j });
                }
            }
        }

        let min = self.criteria.min_students;
        for i in 0..groups.len() {
            let len = groups[i].len();
            if len >= 2 * min && len / 2 >= min && len - len / 2 >= min {
                moves.push(Move::Split { i });
            }
        }

        moves
    }
}

/// Applies a move to a value-copy of the partition.
///
/// Merge and split create new groups, so their optimal size resets to the
/// new member count.
fn apply_move(partition: &Partition, mv: &Move) -> Partition {
    let mut next = partition.clone();
    match *mv {
        Move::Swap { i, a, j, b } => {
            let member_a = next.groups[i].members[a].clone();
            let member_b = std::mem::replace(&mut next.groups[j].members[b], member_a);
            next.groups[i].members[a] = member_b;
        }
        Move::Merge { i, j } => {
            // j > i by enumeration order.
            let right = next.groups.remove(j);
            let left = next.groups.remove(i);
            let mut members = left.members;
            members.extend(right.members);
            next.groups.insert(i, StudentGroup::new(members));
        }
        Move::Split { i } => {
            let group = next.groups.remove(i);
            let mid = group.len() / 2;
            let mut front = group.members;
            let back = front.split_off(mid);
            next.groups.insert(i, StudentGroup::new(back));
            next.groups.insert(i, StudentGroup::new(front));
        }
    }
    next
}
