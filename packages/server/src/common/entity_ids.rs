//! Typed ID definitions for the matching engine's entities.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for participants (the people who own transfer requests).
pub struct User;

/// Marker type for transfer requests.
pub struct TransferRequest;

/// Marker type for proposed swap matches.
pub struct SwapMatch;

/// Marker type for match participant rows.
pub struct MatchParticipant;

/// Marker type for positions (the places a participant can hold or want).
pub struct Position;

/// Marker type for subjects a participant is qualified in.
pub struct Subject;

/// Marker type for districts (the immediate locality of a position).
pub struct District;

/// Marker type for provinces (the region a district belongs to).
pub struct Province;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type UserId = Id<User>;
pub type RequestId = Id<TransferRequest>;
pub type MatchId = Id<SwapMatch>;
pub type ParticipantId = Id<MatchParticipant>;
pub type PositionId = Id<Position>;
pub type SubjectId = Id<Subject>;
pub type DistrictId = Id<District>;
pub type ProvinceId = Id<Province>;
