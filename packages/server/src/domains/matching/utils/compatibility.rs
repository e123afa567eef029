//! Pairwise compatibility scoring for two-way swaps.
//!
//! Everything here is pure: the same two requests always produce the same score.

use serde::{Deserialize, Serialize};

use super::geography::geographic_score;
use crate::domains::transfers::{TransferRequest, Urgency};

/// Minimum total for a pair to be proposed.
pub const TWO_WAY_THRESHOLD: i32 = 50;

/// Rank assumed when a preference carries no rank.
pub const DEFAULT_RANK: i32 = 5;

const MUTUAL_BASE: i32 = 40;
const MUTUAL_MAX: i32 = 60;
const SUBJECT_MAX: f64 = 15.0;
const URGENCY_EQUAL: i32 = 5;
const URGENCY_MIXED: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairBreakdown {
    pub mutual_preference: i32,
    pub geographic: i32,
    pub subject_overlap: i32,
    pub urgency: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairScore {
    pub total: i32,
    pub breakdown: PairBreakdown,
}

/// `(6 - rank)`: rank 1 is worth 5, rank 5 is worth 1.
pub(crate) fn rank_weight(rank: Option<i32>) -> i32 {
    6 - rank.unwrap_or(DEFAULT_RANK)
}

/// Mutual preference (0-60). Zero unless each side wants the other's position.
pub fn mutual_preference_score(a: &TransferRequest, b: &TransferRequest) -> i32 {
    let rank_of_b_in_a = a.rank_for(b.current_position_id);
    let rank_of_a_in_b = b.rank_for(a.current_position_id);

    if rank_of_b_in_a.is_none() || rank_of_a_in_b.is_none() {
        return 0;
    }

    let bonus = (rank_weight(rank_of_a_in_b) + rank_weight(rank_of_b_in_a)) * 2;
    (MUTUAL_BASE + bonus).clamp(0, MUTUAL_MAX)
}

/// Subject overlap (0-15), scaled by the larger subject set.
///
/// Zero covers both "no overlap" and "a side has no subjects"; both are rejected
/// by [`passes_pair_gates`] before the score matters.
pub fn subject_overlap_score(a: &TransferRequest, b: &TransferRequest) -> i32 {
    let shared = a.shared_subject_count(b);
    let largest = a.subjects.len().max(b.subjects.len());
    if shared == 0 || largest == 0 {
        return 0;
    }

    (SUBJECT_MAX * shared as f64 / largest as f64).round() as i32
}

/// Urgency (0-5).
pub fn urgency_score(a: &TransferRequest, b: &TransferRequest) -> i32 {
    match (a.urgency, b.urgency) {
        (x, y) if x == y => URGENCY_EQUAL,
        (Urgency::High, Urgency::Normal) | (Urgency::Normal, Urgency::High) => URGENCY_MIXED,
        _ => 0,
    }
}

/// Score a pair. Does not apply gates or the threshold, see [`evaluate_pair`].
pub fn score_pair(a: &TransferRequest, b: &TransferRequest) -> PairScore {
    let breakdown = PairBreakdown {
        mutual_preference: mutual_preference_score(a, b),
        geographic: geographic_score(a, b),
        subject_overlap: subject_overlap_score(a, b),
        urgency: urgency_score(a, b),
    };

    let total = (breakdown.mutual_preference
        + breakdown.geographic
        + breakdown.subject_overlap
        + breakdown.urgency)
        .clamp(0, 100);

    PairScore { total, breakdown }
}

/// Hard gates for a pair: distinct requests and owners, same category and
/// medium, and at least one shared subject.
pub fn passes_pair_gates(a: &TransferRequest, b: &TransferRequest) -> bool {
    a.id != b.id
        && a.user_id != b.user_id
        && a.same_segment(b)
        && a.shared_subject_count(b) > 0
}

/// Gates, score and threshold in one step. `Some` means the pair is a match
/// candidate.
pub fn evaluate_pair(a: &TransferRequest, b: &TransferRequest) -> Option<PairScore> {
    if !passes_pair_gates(a, b) {
        return None;
    }

    let score = score_pair(a, b);
    (score.total >= TWO_WAY_THRESHOLD).then_some(score)
}
