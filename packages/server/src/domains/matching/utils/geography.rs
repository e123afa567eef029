//! Pure geographic scoring.
//!
//! The rule table works on `LocationChain` values only; how districts and
//! provinces are stored is the persistence layer's business.

use crate::domains::transfers::{GeoFlexibility, LocationChain, TransferRequest};

pub const GEO_SAME_DISTRICT: i32 = 20;
pub const GEO_SAME_PROVINCE_FLEXIBLE: i32 = 15;
pub const GEO_CROSS_PROVINCE_NATIONAL: i32 = 10;
pub const GEO_SAME_PROVINCE_RIGID: i32 = 5;
pub const GEO_NONE: i32 = 0;

/// One side of a geographic comparison.
#[derive(Debug, Clone, Copy)]
pub struct GeoProfile<'a> {
    pub location: Option<&'a LocationChain>,
    pub flexibility: GeoFlexibility,
}

impl<'a> From<&'a TransferRequest> for GeoProfile<'a> {
    fn from(request: &'a TransferRequest) -> Self {
        Self {
            location: request.location.as_ref(),
            flexibility: request.flexibility,
        }
    }
}

/// Score how well two locations fit together (0-20).
///
/// | relation                    | flexibility (both sides)  | score |
/// |-----------------------------|---------------------------|-------|
/// | same district               | any                       | 20    |
/// | same province               | regional or national      | 15    |
/// | same province               | otherwise                 | 5     |
/// | different province          | national                  | 10    |
/// | different province          | otherwise                 | 0     |
/// | either chain missing        | -                         | 0     |
pub fn geo_rule(a: GeoProfile<'_>, b: GeoProfile<'_>) -> i32 {
    let (Some(loc_a), Some(loc_b)) = (a.location, b.location) else {
        return GEO_NONE;
    };

    if loc_a.same_district(loc_b) {
        return GEO_SAME_DISTRICT;
    }

    if loc_a.same_province(loc_b) {
        return if a.flexibility.permits_regional() && b.flexibility.permits_regional() {
            GEO_SAME_PROVINCE_FLEXIBLE
        } else {
            GEO_SAME_PROVINCE_RIGID
        };
    }

    if a.flexibility.permits_national() && b.flexibility.permits_national() {
        GEO_CROSS_PROVINCE_NATIONAL
    } else {
        GEO_NONE
    }
}

pub fn geographic_score(a: &TransferRequest, b: &TransferRequest) -> i32 {
    geo_rule(GeoProfile::from(a), GeoProfile::from(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{DistrictId, ProvinceId};
    use GeoFlexibility::*;

    fn profile(location: Option<&LocationChain>, flexibility: GeoFlexibility) -> GeoProfile<'_> {
        GeoProfile {
            location,
            flexibility,
        }
    }

    #[test]
    fn same_district_wins_regardless_of_flexibility() {
        let chain = LocationChain::new(DistrictId::new(), ProvinceId::new());
        assert_eq!(geo_rule(profile(Some(&chain), Local), profile(Some(&chain), Local)), 20);
    }

    #[test]
    fn same_province_depends_on_both_sides_being_flexible() {
        let province = ProvinceId::new();
        let a = LocationChain::new(DistrictId::new(), province);
        let b = LocationChain::new(DistrictId::new(), province);

        assert_eq!(geo_rule(profile(Some(&a), Regional), profile(Some(&b), National)), 15);
        assert_eq!(geo_rule(profile(Some(&a), Regional), profile(Some(&b), Local)), 5);
        assert_eq!(geo_rule(profile(Some(&a), Local), profile(Some(&b), Local)), 5);
    }

    #[test]
    fn cross_province_needs_national_reach_on_both_sides() {
        let a = LocationChain::new(DistrictId::new(), ProvinceId::new());
        let b = LocationChain::new(DistrictId::new(), ProvinceId::new());

        assert_eq!(geo_rule(profile(Some(&a), National), profile(Some(&b), National)), 10);
        assert_eq!(geo_rule(profile(Some(&a), National), profile(Some(&b), Regional)), 0);
    }

    #[test]
    fn missing_chain_scores_zero() {
        let chain = LocationChain::new(DistrictId::new(), ProvinceId::new());
        assert_eq!(geo_rule(profile(None, National), profile(Some(&chain), National)), 0);
        assert_eq!(geo_rule(profile(None, National), profile(None, National)), 0);
    }
}
