use serde::{Deserialize, Serialize};

use crate::types::{CommunityId, Timestamp};

/// A community record. Units carrying this community in their locality set
/// pay the boundary fee when they leave; the fee is routed to the
/// community's fund rather than burned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
    pub created_at: Timestamp,
    /// Rate in [0, 1] charged on a unit's magnitude when it exits.
    pub boundary_fee: f64,
    /// Wallets that have joined this community.
    pub member_count: u32,
}

impl Community {
    pub fn new(name: impl Into<String>, boundary_fee: f64, created_at: Timestamp) -> Self {
        Self {
            id: CommunityId::generate(),
            name: name.into(),
            created_at,
            boundary_fee,
            member_count: 0,
        }
    }
}
