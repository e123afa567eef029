//! Matching domain activities - entry-point business logic
//!
//! Called from the scheduler and the operator CLI. Activities take
//! `&ServerDeps`, talk to storage only through its traits, and return final
//! models or summaries.

pub mod create_match;
pub mod expire_matches;
pub mod respond;
pub mod run_matching;

pub use create_match::{create_match, MatchCreation};
pub use expire_matches::expire_old_matches;
pub use respond::{accept_match, reject_match};
pub use run_matching::{load_eligible_pool, run_matching_algorithm, MatchingRunSummary};
