//! Test fixtures for building transfer request pools.
//!
//! Everything here is plain data; nothing touches a store until a test adds it.

use chrono::{DateTime, Duration, Utc};
use swap_core::common::{DistrictId, PositionId, ProvinceId, SubjectId, UserId};
use swap_core::domains::matching::models::UserSummary;
use swap_core::domains::transfers::{LocationChain, Preference, TransferRequest, Urgency};

/// A shared district, a shared subject and a clock that hands out strictly
/// increasing creation times so pool order is the order requests were built.
pub struct Scenario {
    pub location: LocationChain,
    pub math: SubjectId,
    base: DateTime<Utc>,
    built: i64,
}

impl Scenario {
    pub fn new() -> Self {
        Self {
            location: LocationChain::new(DistrictId::new(), ProvinceId::new()),
            math: SubjectId::new(),
            base: Utc::now() - Duration::hours(1),
            built: 0,
        }
    }

    /// A submitted request at `current` wanting `wants` in rank order,
    /// teaching math, in the shared district.
    pub fn request(&mut self, current: PositionId, wants: &[PositionId]) -> TransferRequest {
        self.built += 1;
        TransferRequest::builder()
            .current_position_id(current)
            .preferences(
                (1..)
                    .zip(wants)
                    .map(|(rank, position_id)| Preference {
                        position_id: *position_id,
                        rank,
                    })
                    .collect::<Vec<_>>(),
            )
            .subjects([self.math].into_iter().collect::<std::collections::BTreeSet<_>>())
            .urgency(Urgency::Normal)
            .location(self.location)
            .created_at(self.base + Duration::seconds(self.built))
            .build()
    }

    /// Two requests that each want the other's position, rank 1.
    pub fn mutual_pair(&mut self) -> (TransferRequest, TransferRequest) {
        let s1 = PositionId::new();
        let s2 = PositionId::new();
        (self.request(s1, &[s2]), self.request(s2, &[s1]))
    }

    /// Three requests where each wants the next one's position and no two
    /// want each other's.
    pub fn ring(&mut self) -> (TransferRequest, TransferRequest, TransferRequest) {
        let p1 = PositionId::new();
        let p2 = PositionId::new();
        let p3 = PositionId::new();
        (
            self.request(p1, &[p2]),
            self.request(p2, &[p3]),
            self.request(p3, &[p1]),
        )
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

pub fn user(id: UserId, push_token: Option<&str>) -> UserSummary {
    UserSummary {
        id,
        display_name: format!("user-{}", id),
        push_token: push_token.map(str::to_string),
    }
}
