use serde::{Deserialize, Serialize};

use strata_core::types::{CommunityId, Magnitude, PurposeId};
use strata_core::unit::Temporality;

/// Community memberships to add and remove, applied in that order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalityChange {
    #[serde(default)]
    pub add: Vec<CommunityId>,
    #[serde(default)]
    pub remove: Vec<CommunityId>,
}

/// Purpose tags to add and remove, applied in that order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PurposeChange {
    #[serde(default)]
    pub add: Vec<PurposeId>,
    #[serde(default)]
    pub remove: Vec<PurposeId>,
}

/// What a conversion should change. Omitted dimensions are untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    #[serde(default)]
    pub target_temporality: Option<Temporality>,
    #[serde(default)]
    pub target_locality: Option<LocalityChange>,
    #[serde(default)]
    pub target_purpose: Option<PurposeChange>,
    /// Replace the provenance chain with a single fresh entry, for a fee.
    #[serde(default)]
    pub strip_reputation: bool,
}

impl ConversionRequest {
    /// A conversion that only moves the temporal stratum.
    pub fn to_temporality(target: Temporality) -> Self {
        Self {
            target_temporality: Some(target),
            ..Self::default()
        }
    }
}

/// Itemized fees taken by one conversion. `locality` includes both entry
/// fees (burned) and exit fees (routed to community funds); the per-
/// community exit map on the conversion result separates them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionFees {
    pub temporal: Magnitude,
    pub locality: Magnitude,
    pub purpose: Magnitude,
    pub reputation: Magnitude,
    pub total: Magnitude,
}
