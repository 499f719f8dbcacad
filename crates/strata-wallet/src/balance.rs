use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use strata_core::types::{CommunityId, Magnitude, PurposeId};
use strata_core::unit::{Temporality, Unit};

/// A wallet's holdings, totalled and broken down per dimension. A unit in
/// two communities counts fully toward both locality rows, so dimension
/// rows do not sum to `total`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub total: Magnitude,
    pub by_temporality: BTreeMap<Temporality, Magnitude>,
    pub by_locality: BTreeMap<CommunityId, Magnitude>,
    pub by_purpose: BTreeMap<PurposeId, Magnitude>,
    /// Sum over units with no community membership.
    pub global: Magnitude,
    /// Sum over units with no purpose tags.
    pub unrestricted: Magnitude,
}

impl Balance {
    /// Fold one unit into the breakdown.
    pub fn absorb(&mut self, unit: &Unit) {
        self.total += unit.magnitude;
        *self.by_temporality.entry(unit.temporality).or_default() += unit.magnitude;
        for community in &unit.locality {
            *self.by_locality.entry(community.clone()).or_default() += unit.magnitude;
        }
        for purpose in &unit.purpose {
            *self.by_purpose.entry(purpose.clone()).or_default() += unit.magnitude;
        }
        if unit.is_global() {
            self.global += unit.magnitude;
        }
        if unit.is_unrestricted() {
            self.unrestricted += unit.magnitude;
        }
    }
}
