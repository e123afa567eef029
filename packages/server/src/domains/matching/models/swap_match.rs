use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{MatchId, RequestId};

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    TwoWay,
    CircularThree,
}

impl MatchType {
    pub fn participant_count(self) -> usize {
        match self {
            MatchType::TwoWay => 2,
            MatchType::CircularThree => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "match_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Expired,
}

impl MatchStatus {
    /// Only pending matches move, and only forward.
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        use MatchStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted) | (Pending, Rejected) | (Pending, Expired)
        )
    }

    /// Pending and accepted matches hold their requests out of the pool.
    pub fn is_active(self) -> bool {
        matches!(self, MatchStatus::Pending | MatchStatus::Accepted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Accepted => "accepted",
            MatchStatus::Rejected => "rejected",
            MatchStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Swap match
// ============================================================================

/// A proposed swap between two or three transfer requests.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SwapMatch {
    pub id: MatchId,
    pub match_type: MatchType,
    pub compatibility_score: i32,
    pub score_breakdown: serde_json::Value,
    pub algorithm_version: String,
    pub status: MatchStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new pending match.
#[derive(Debug, Clone, Serialize)]
pub struct NewSwapMatch {
    pub match_type: MatchType,
    pub compatibility_score: i32,
    pub score_breakdown: serde_json::Value,
    pub algorithm_version: String,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries
// =============================================================================

impl SwapMatch {
    pub async fn create(new: &NewSwapMatch, pool: &PgPool) -> Result<Self> {
        let swap_match = sqlx::query_as::<_, SwapMatch>(
            r#"
            INSERT INTO swap_matches (
                id,
                match_type,
                compatibility_score,
                score_breakdown,
                algorithm_version,
                status,
                expires_at
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', $6)
            RETURNING *
            "#,
        )
        .bind(MatchId::new())
        .bind(new.match_type)
        .bind(new.compatibility_score)
        .bind(&new.score_breakdown)
        .bind(&new.algorithm_version)
        .bind(new.expires_at)
        .fetch_one(pool)
        .await?;

        Ok(swap_match)
    }

    pub async fn find_by_id(id: MatchId, pool: &PgPool) -> Result<Option<Self>> {
        let swap_match = sqlx::query_as::<_, SwapMatch>("SELECT * FROM swap_matches WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(swap_match)
    }

    /// Hard delete. Participant rows go with it (`ON DELETE CASCADE`).
    pub async fn delete(id: MatchId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM swap_matches WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Conditional status change: only applies while the row is still in `from`.
    /// Returns `None` when the row was not in `from` (or the move is not allowed).
    pub async fn transition(
        id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        if !from.can_transition_to(to) {
            return Ok(None);
        }

        let swap_match = sqlx::query_as::<_, SwapMatch>(
            r#"
            UPDATE swap_matches
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(pool)
        .await?;

        Ok(swap_match)
    }

    /// Expire every pending match whose horizon has passed.
    pub async fn expire_overdue(now: DateTime<Utc>, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE swap_matches
            SET status = 'expired', updated_at = NOW()
            WHERE status = 'pending'
              AND expires_at < $1
            "#,
        )
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Requests currently held by a pending or accepted match.
    pub async fn active_request_ids(pool: &PgPool) -> Result<Vec<RequestId>> {
        let ids = sqlx::query_scalar::<_, RequestId>(
            r#"
            SELECT DISTINCT mp.request_id
            FROM match_participants mp
            JOIN swap_matches m ON m.id = mp.match_id
            WHERE m.status IN ('pending', 'accepted')
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }
}
