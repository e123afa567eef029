use thiserror::Error;

use crate::common::{MatchId, UserId};
use crate::domains::matching::models::MatchStatus;

/// Errors a participant can get back when responding to a match.
#[derive(Error, Debug)]
pub enum MatchingError {
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),

    #[error("User {user_id} is not a participant of match {match_id}")]
    NotParticipant { match_id: MatchId, user_id: UserId },

    #[error("Match {match_id} is {status} and can no longer be answered")]
    StateConflict { match_id: MatchId, status: MatchStatus },

    #[error("User {user_id} already responded to match {match_id}")]
    AlreadyResponded { match_id: MatchId, user_id: UserId },

    #[error("Persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl MatchingError {
    /// True for errors caused by the caller's request rather than the backend.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, MatchingError::Persistence(_))
    }
}
