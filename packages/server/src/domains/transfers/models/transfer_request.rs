use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap};
use typed_builder::TypedBuilder;

use super::location::LocationChain;
use crate::common::{DistrictId, PositionId, ProvinceId, RequestId, SubjectId, UserId};

// ============================================================================
// Enums
// ============================================================================

/// Lifecycle of a transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transfer_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Draft,
    Submitted,
    Matched,
    Withdrawn,
    Deleted,
}

impl TransferStatus {
    pub const ALL: [TransferStatus; 5] = [
        TransferStatus::Draft,
        TransferStatus::Submitted,
        TransferStatus::Matched,
        TransferStatus::Withdrawn,
        TransferStatus::Deleted,
    ];

    /// Transition table for request status.
    ///
    /// `Submitted -> Submitted` is the re-entry a request makes when the match it
    /// was proposed in gets rejected.
    pub fn can_transition_to(self, next: TransferStatus) -> bool {
        use TransferStatus::*;
        matches!(
            (self, next),
            (Draft, Submitted)
                | (Draft, Deleted)
                | (Submitted, Submitted)
                | (Submitted, Matched)
                | (Submitted, Withdrawn)
        )
    }

    /// Every status that may move to `next`.
    pub fn predecessors_of(next: TransferStatus) -> Vec<TransferStatus> {
        Self::ALL
            .into_iter()
            .filter(|status| status.can_transition_to(next))
            .collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransferStatus::Draft => "draft",
            TransferStatus::Submitted => "submitted",
            TransferStatus::Matched => "matched",
            TransferStatus::Withdrawn => "withdrawn",
            TransferStatus::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "urgency_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Normal,
    High,
}

/// How far a participant is willing to move.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "geo_flexibility", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GeoFlexibility {
    #[default]
    Local,
    Regional,
    National,
}

impl GeoFlexibility {
    pub fn permits_regional(self) -> bool {
        self >= GeoFlexibility::Regional
    }

    pub fn permits_national(self) -> bool {
        self == GeoFlexibility::National
    }
}

// ============================================================================
// Transfer request
// ============================================================================

/// One ranked destination. Rank 1 is the most wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Preference {
    pub position_id: PositionId,
    pub rank: i32,
}

/// A submitted request enriched with everything the matcher reads: ranked
/// destinations, required subjects and the location chain of the current position.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct TransferRequest {
    #[builder(default = RequestId::new())]
    pub id: RequestId,
    #[builder(default = UserId::new())]
    pub user_id: UserId,
    pub current_position_id: PositionId,
    #[builder(default = "general".to_string())]
    pub category: String,
    #[builder(default = "english".to_string())]
    pub medium: String,
    #[builder(default)]
    pub preferences: Vec<Preference>,
    #[builder(default)]
    pub subjects: BTreeSet<SubjectId>,
    #[builder(default)]
    pub urgency: Urgency,
    #[builder(default)]
    pub flexibility: GeoFlexibility,
    #[builder(default = TransferStatus::Submitted)]
    pub status: TransferStatus,
    #[builder(default, setter(strip_option))]
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` when the current position has no complete district/province chain.
    #[builder(default, setter(strip_option))]
    pub location: Option<LocationChain>,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl TransferRequest {
    /// Rank this request gives to `position_id`, if it wants it at all.
    pub fn rank_for(&self, position_id: PositionId) -> Option<i32> {
        self.preferences
            .iter()
            .find(|preference| preference.position_id == position_id)
            .map(|preference| preference.rank)
    }

    pub fn prefers(&self, position_id: PositionId) -> bool {
        self.rank_for(position_id).is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Category and medium must agree across every member of a match.
    pub fn same_segment(&self, other: &Self) -> bool {
        self.category == other.category && self.medium == other.medium
    }

    pub fn shared_subject_count(&self, other: &Self) -> usize {
        self.subjects.intersection(&other.subjects).count()
    }
}

/// Flat row before enrichment.
#[derive(Debug, Clone, sqlx::FromRow)]
struct TransferRequestRow {
    id: RequestId,
    user_id: UserId,
    current_position_id: PositionId,
    category: String,
    medium: String,
    urgency: Urgency,
    flexibility: GeoFlexibility,
    status: TransferStatus,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    district_id: Option<DistrictId>,
    province_id: Option<ProvinceId>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PreferenceRow {
    request_id: RequestId,
    position_id: PositionId,
    rank: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SubjectRow {
    request_id: RequestId,
    subject_id: SubjectId,
}

// =============================================================================
// SQL Queries
// =============================================================================

impl TransferRequest {
    /// Load every submitted, unexpired request with preferences, subjects and
    /// location chain attached, oldest first.
    ///
    /// Ordering is `(created_at, id)` so repeated runs over the same data see the
    /// same pool order.
    pub async fn find_submitted_enriched(now: DateTime<Utc>, pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, TransferRequestRow>(
            r#"
            SELECT
                r.id,
                r.user_id,
                r.current_position_id,
                r.category,
                r.medium,
                r.urgency,
                r.flexibility,
                r.status,
                r.expires_at,
                r.created_at,
                p.district_id,
                d.province_id
            FROM transfer_requests r
            LEFT JOIN positions p ON p.id = r.current_position_id
            LEFT JOIN districts d ON d.id = p.district_id
            WHERE r.status = 'submitted'
              AND (r.expires_at IS NULL OR r.expires_at > $1)
            ORDER BY r.created_at, r.id
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<RequestId> = rows.iter().map(|row| row.id).collect();

        let preference_rows = sqlx::query_as::<_, PreferenceRow>(
            r#"
            SELECT request_id, position_id, rank
            FROM transfer_request_preferences
            WHERE request_id = ANY($1)
            ORDER BY request_id, rank
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let subject_rows = sqlx::query_as::<_, SubjectRow>(
            r#"
            SELECT request_id, subject_id
            FROM transfer_request_subjects
            WHERE request_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let mut preferences: HashMap<RequestId, Vec<Preference>> = HashMap::new();
        for row in preference_rows {
            preferences.entry(row.request_id).or_default().push(Preference {
                position_id: row.position_id,
                rank: row.rank,
            });
        }

        let mut subjects: HashMap<RequestId, BTreeSet<SubjectId>> = HashMap::new();
        for row in subject_rows {
            subjects.entry(row.request_id).or_default().insert(row.subject_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| TransferRequest {
                preferences: preferences.remove(&row.id).unwrap_or_default(),
                subjects: subjects.remove(&row.id).unwrap_or_default(),
                location: LocationChain::from_parts(row.district_id, row.province_id),
                id: row.id,
                user_id: row.user_id,
                current_position_id: row.current_position_id,
                category: row.category,
                medium: row.medium,
                urgency: row.urgency,
                flexibility: row.flexibility,
                status: row.status,
                expires_at: row.expires_at,
                created_at: row.created_at,
            })
            .collect())
    }

    /// Move requests to `next`, skipping any whose current status does not allow it.
    /// Returns the number of rows changed.
    pub async fn update_status_many(
        ids: &[RequestId],
        next: TransferStatus,
        pool: &PgPool,
    ) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let allowed: Vec<String> = TransferStatus::predecessors_of(next)
            .into_iter()
            .map(|status| status.as_str().to_string())
            .collect();

        let result = sqlx::query(
            r#"
            UPDATE transfer_requests
            SET status = $2, updated_at = NOW()
            WHERE id = ANY($1)
              AND status::text = ANY($3)
            "#,
        )
        .bind(ids)
        .bind(next)
        .bind(&allowed)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
