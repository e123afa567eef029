//! Greedy allocation of the eligible pool into swap groups.
//!
//! Allocation is first-fit over a fixed enumeration order, not an optimal
//! assignment: circular triples are claimed first, then pairs from whatever is
//! left. The set of already-allocated requests is passed explicitly from one
//! stage to the next; the pool itself is never mutated.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::compatibility::{evaluate_pair, PairBreakdown};
use super::cycle::{evaluate_triple, triple_indices, CycleBreakdown};
use crate::common::{RequestId, UserId};
use crate::domains::matching::models::MatchType;
use crate::domains::transfers::TransferRequest;

/// Recorded on every match this allocator produces.
pub const ALGORITHM_VERSION: &str = "greedy-v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreBreakdown {
    TwoWay(PairBreakdown),
    CircularThree(CycleBreakdown),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupMember {
    pub request_id: RequestId,
    pub user_id: UserId,
}

impl From<&TransferRequest> for GroupMember {
    fn from(request: &TransferRequest) -> Self {
        Self {
            request_id: request.id,
            user_id: request.user_id,
        }
    }
}

/// A group chosen for a match. `members` is in swap order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocatedGroup {
    pub match_type: MatchType,
    pub members: Vec<GroupMember>,
    pub score: i32,
    pub breakdown: ScoreBreakdown,
}

impl AllocatedGroup {
    pub fn request_ids(&self) -> impl Iterator<Item = RequestId> + '_ {
        self.members.iter().map(|member| member.request_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Allocation {
    pub groups: Vec<AllocatedGroup>,
    pub allocated: HashSet<RequestId>,
}

/// Split the pool by (category, medium), keeping pool order inside each segment
/// and ordering segments by first appearance.
///
/// Every gate requires equal category and medium, so no group can span two
/// segments and allocating segment by segment gives the same result as one
/// scan over the whole pool.
pub fn segments(pool: &[TransferRequest]) -> Vec<Vec<&TransferRequest>> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut segments: Vec<Vec<&TransferRequest>> = Vec::new();

    for request in pool {
        let key = (request.category.as_str(), request.medium.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            segments.push(Vec::new());
            segments.len() - 1
        });
        segments[slot].push(request);
    }

    segments
}

/// Allocate the whole pool.
pub fn allocate(pool: &[TransferRequest]) -> Allocation {
    segments(pool)
        .iter()
        .fold(Allocation::default(), |mut allocation, segment| {
            let (cycle_groups, allocated) = allocate_cycles(segment, allocation.allocated);
            let (pair_groups, allocated) = allocate_pairs(segment, allocated);

            allocation.groups.extend(cycle_groups);
            allocation.groups.extend(pair_groups);
            allocation.allocated = allocated;
            allocation
        })
}

/// Claim circular triples, first fit over `i < j < k`.
pub fn allocate_cycles(
    segment: &[&TransferRequest],
    mut allocated: HashSet<RequestId>,
) -> (Vec<AllocatedGroup>, HashSet<RequestId>) {
    let mut groups = Vec::new();

    for (i, j, k) in triple_indices(segment.len()) {
        let (x, y, z) = (segment[i], segment[j], segment[k]);
        if [x, y, z].iter().any(|r| allocated.contains(&r.id)) {
            continue;
        }

        let Some(candidate) = evaluate_triple(x, y, z) else {
            continue;
        };

        debug!(
            score = candidate.score.total,
            requests = ?candidate.rotation.map(|r| r.id),
            "Allocated circular triple"
        );

        allocated.extend(candidate.rotation.iter().map(|r| r.id));
        groups.push(AllocatedGroup {
            match_type: MatchType::CircularThree,
            members: candidate.rotation.iter().map(|r| GroupMember::from(*r)).collect(),
            score: candidate.score.total,
            breakdown: ScoreBreakdown::CircularThree(candidate.score.breakdown),
        });
    }

    (groups, allocated)
}

/// Claim pairs from what is left: each unallocated request takes the first
/// later partner that qualifies.
pub fn allocate_pairs(
    segment: &[&TransferRequest],
    mut allocated: HashSet<RequestId>,
) -> (Vec<AllocatedGroup>, HashSet<RequestId>) {
    let mut groups = Vec::new();

    for (i, a) in segment.iter().enumerate() {
        if allocated.contains(&a.id) {
            continue;
        }

        let partner = segment[i + 1..]
            .iter()
            .filter(|b| !allocated.contains(&b.id))
            .find_map(|b| evaluate_pair(a, b).map(|score| (*b, score)));

        if let Some((b, score)) = partner {
            debug!(score = score.total, a = %a.id, b = %b.id, "Allocated pair");

            allocated.insert(a.id);
            allocated.insert(b.id);
            groups.push(AllocatedGroup {
                match_type: MatchType::TwoWay,
                members: vec![GroupMember::from(*a), GroupMember::from(b)],
                score: score.total,
                breakdown: ScoreBreakdown::TwoWay(score.breakdown),
            });
        }
    }

    (groups, allocated)
}
