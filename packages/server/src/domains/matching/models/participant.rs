use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{MatchId, ParticipantId, RequestId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "participant_response", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ResponseStatus {
    pub fn can_transition_to(self, next: ResponseStatus) -> bool {
        matches!(
            (self, next),
            (ResponseStatus::Pending, ResponseStatus::Accepted)
                | (ResponseStatus::Pending, ResponseStatus::Rejected)
        )
    }
}

/// One request's seat in a match. `swap_position` (1-based) is the rotation
/// order: in a circular swap, position N moves to position N+1's current place,
/// and the last moves to the first's.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    pub id: ParticipantId,
    pub match_id: MatchId,
    pub request_id: RequestId,
    pub user_id: UserId,
    pub swap_position: i32,
    pub response_status: ResponseStatus,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewParticipant {
    pub request_id: RequestId,
    pub user_id: UserId,
    pub swap_position: i32,
}

// =============================================================================
// SQL Queries
// =============================================================================

impl Participant {
    /// Insert all participants of a match in one transaction: either every row
    /// lands or none does.
    pub async fn create_many(
        match_id: MatchId,
        participants: &[NewParticipant],
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(participants.len());

        for participant in participants {
            let row = sqlx::query_as::<_, Participant>(
                r#"
                INSERT INTO match_participants (
                    id,
                    match_id,
                    request_id,
                    user_id,
                    swap_position,
                    response_status
                )
                VALUES ($1, $2, $3, $4, $5, 'pending')
                RETURNING *
                "#,
            )
            .bind(ParticipantId::new())
            .bind(match_id)
            .bind(participant.request_id)
            .bind(participant.user_id)
            .bind(participant.swap_position)
            .fetch_one(&mut *tx)
            .await?;

            created.push(row);
        }

        tx.commit().await?;
        Ok(created)
    }

    pub async fn find_by_match(match_id: MatchId, pool: &PgPool) -> Result<Vec<Self>> {
        let participants = sqlx::query_as::<_, Participant>(
            "SELECT * FROM match_participants WHERE match_id = $1 ORDER BY swap_position",
        )
        .bind(match_id)
        .fetch_all(pool)
        .await?;

        Ok(participants)
    }

    /// Record a response. Only a still-pending participant row is updated;
    /// `None` means someone else got there first.
    pub async fn record_response(
        id: ParticipantId,
        response: ResponseStatus,
        responded_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        if !ResponseStatus::Pending.can_transition_to(response) {
            return Ok(None);
        }

        let participant = sqlx::query_as::<_, Participant>(
            r#"
            UPDATE match_participants
            SET response_status = $2, responded_at = $3
            WHERE id = $1 AND response_status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(response)
        .bind(responded_at)
        .fetch_optional(pool)
        .await?;

        Ok(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_response_is_final() {
        use ResponseStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Accepted));
        assert!(!Accepted.can_transition_to(Pending));
    }
}
