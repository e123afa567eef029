//! The matching engine: finds two-way and circular three-way swaps among
//! submitted transfer requests and manages the proposals it creates.

pub mod activities;
pub mod error;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use activities::{
    accept_match, expire_old_matches, reject_match, run_matching_algorithm, MatchingRunSummary,
};
pub use error::MatchingError;
pub use models::{MatchStatus, MatchType, Participant, ResponseStatus, SwapMatch};
