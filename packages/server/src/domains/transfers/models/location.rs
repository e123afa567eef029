use serde::{Deserialize, Serialize};

use crate::common::{DistrictId, ProvinceId};

/// Administrative chain of a position: the district it sits in and the province
/// that district belongs to.
///
/// Only complete chains are represented. A position with no district, or a
/// district with no province, has no chain at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationChain {
    pub district_id: DistrictId,
    pub province_id: ProvinceId,
}

impl LocationChain {
    pub fn new(district_id: DistrictId, province_id: ProvinceId) -> Self {
        Self {
            district_id,
            province_id,
        }
    }

    /// Builds a chain from the nullable columns of a joined row.
    pub fn from_parts(district_id: Option<DistrictId>, province_id: Option<ProvinceId>) -> Option<Self> {
        match (district_id, province_id) {
            (Some(district_id), Some(province_id)) => Some(Self::new(district_id, province_id)),
            _ => None,
        }
    }

    pub fn same_district(&self, other: &Self) -> bool {
        self.district_id == other.district_id
    }

    pub fn same_province(&self, other: &Self) -> bool {
        self.province_id == other.province_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_chain_is_absent() {
        assert!(LocationChain::from_parts(Some(DistrictId::new()), None).is_none());
        assert!(LocationChain::from_parts(None, Some(ProvinceId::new())).is_none());
        assert!(LocationChain::from_parts(Some(DistrictId::new()), Some(ProvinceId::new())).is_some());
    }
}
