//! Pure matching logic: no I/O, no clocks, no shared state.

pub mod allocation;
pub mod compatibility;
pub mod cycle;
pub mod eligibility;
pub mod geography;

pub use allocation::{allocate, AllocatedGroup, Allocation, GroupMember, ScoreBreakdown, ALGORITHM_VERSION};
pub use compatibility::{evaluate_pair, score_pair, PairBreakdown, PairScore, TWO_WAY_THRESHOLD};
pub use cycle::{evaluate_triple, score_cycle, CycleBreakdown, CycleScore, THREE_WAY_THRESHOLD};
pub use eligibility::{filter_eligible, is_eligible};
pub use geography::geographic_score;
