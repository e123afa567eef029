pub mod participant;
pub mod swap_match;
pub mod user_summary;

pub use participant::{NewParticipant, Participant, ResponseStatus};
pub use swap_match::{MatchStatus, MatchType, NewSwapMatch, SwapMatch};
pub use user_summary::UserSummary;
