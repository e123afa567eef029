//! Three-way circular swap detection and scoring.
//!
//! A rotation `[a, b, c]` is a cycle when `a` wants `b`'s position, `b` wants
//! `c`'s and `c` wants `a`'s. Only preference membership is checked here; the
//! rank feeds the score, not feasibility.

use serde::{Deserialize, Serialize};

use super::compatibility::rank_weight;
use super::geography::geographic_score;
use crate::domains::transfers::TransferRequest;

/// Minimum total for a triple to be proposed. Lower than the two-way bar:
/// three-way cycles are rarer and each member's preference is only partly met.
pub const THREE_WAY_THRESHOLD: i32 = 40;

const RANK_MAX: i32 = 40;
const SUBJECT_MAX: i32 = 30;
const URGENCY_ALL_EQUAL: i32 = 10;
const URGENCY_MIXED: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleBreakdown {
    pub preference_rank: i32,
    pub subject_overlap: i32,
    pub geographic: i32,
    pub urgency: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleScore {
    pub total: i32,
    pub breakdown: CycleBreakdown,
}

/// A qualifying triple in rotation order.
#[derive(Debug, Clone, Copy)]
pub struct CycleCandidate<'a> {
    pub rotation: [&'a TransferRequest; 3],
    pub score: CycleScore,
}

/// Each member wants the next member's current position.
pub fn forms_cycle(a: &TransferRequest, b: &TransferRequest, c: &TransferRequest) -> bool {
    a.prefers(b.current_position_id)
        && b.prefers(c.current_position_id)
        && c.prefers(a.current_position_id)
}

/// Hard gates for a triple: three distinct owners, one category and medium,
/// and every adjacent pair shares at least one subject.
pub fn passes_cycle_gates(a: &TransferRequest, b: &TransferRequest, c: &TransferRequest) -> bool {
    let distinct_owners = a.user_id != b.user_id && b.user_id != c.user_id && c.user_id != a.user_id;
    let distinct_requests = a.id != b.id && b.id != c.id && c.id != a.id;

    distinct_owners
        && distinct_requests
        && a.same_segment(b)
        && b.same_segment(c)
        && a.shared_subject_count(b) > 0
        && b.shared_subject_count(c) > 0
        && c.shared_subject_count(a) > 0
}

/// Score a rotation. Does not check gates, feasibility or the threshold.
pub fn score_cycle(a: &TransferRequest, b: &TransferRequest, c: &TransferRequest) -> CycleScore {
    let preference_rank = ((rank_weight(a.rank_for(b.current_position_id))
        + rank_weight(b.rank_for(c.current_position_id))
        + rank_weight(c.rank_for(a.current_position_id)))
        * 2)
    .clamp(0, RANK_MAX);

    let shared_total =
        a.shared_subject_count(b) + b.shared_subject_count(c) + c.shared_subject_count(a);
    let subject_overlap =
        ((10.0 * shared_total as f64 / 3.0).round() as i32).min(SUBJECT_MAX);

    let geo_total = geographic_score(a, b) + geographic_score(b, c) + geographic_score(c, a);
    let geographic = (geo_total as f64 / 3.0).round() as i32;

    let urgency = if a.urgency == b.urgency && b.urgency == c.urgency {
        URGENCY_ALL_EQUAL
    } else {
        URGENCY_MIXED
    };

    let breakdown = CycleBreakdown {
        preference_rank,
        subject_overlap,
        geographic,
        urgency,
    };
    let total = (preference_rank + subject_overlap + geographic + urgency).clamp(0, 100);

    CycleScore { total, breakdown }
}

/// Evaluate one rotation: gates, cycle feasibility, score, threshold.
pub fn evaluate_rotation<'a>(
    a: &'a TransferRequest,
    b: &'a TransferRequest,
    c: &'a TransferRequest,
) -> Option<CycleCandidate<'a>> {
    if !passes_cycle_gates(a, b, c) || !forms_cycle(a, b, c) {
        return None;
    }

    let score = score_cycle(a, b, c);
    (score.total >= THREE_WAY_THRESHOLD).then_some(CycleCandidate {
        rotation: [a, b, c],
        score,
    })
}

/// Evaluate an unordered triple. The two rotation directions are tried in a
/// fixed order (`x -> y -> z` first, then `x -> z -> y`); the first that
/// qualifies wins.
pub fn evaluate_triple<'a>(
    x: &'a TransferRequest,
    y: &'a TransferRequest,
    z: &'a TransferRequest,
) -> Option<CycleCandidate<'a>> {
    evaluate_rotation(x, y, z).or_else(|| evaluate_rotation(x, z, y))
}

/// Index triples `i < j < k` in lexicographic order.
pub fn triple_indices(len: usize) -> impl Iterator<Item = (usize, usize, usize)> {
    (0..len).flat_map(move |i| {
        (i + 1..len).flat_map(move |j| (j + 1..len).map(move |k| (i, j, k)))
    })
}
