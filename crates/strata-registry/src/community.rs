use std::collections::BTreeMap;

use tracing::info;

use strata_core::community::Community;
use strata_core::error::LedgerError;
use strata_core::types::{CommunityId, Timestamp};

/// The community registry: id → record, ordered for deterministic
/// iteration and serialization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommunityRegistry {
    communities: BTreeMap<CommunityId, Community>,
}

impl CommunityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a community. The boundary fee must lie in [0, 1].
    pub fn create(
        &mut self,
        name: impl Into<String>,
        boundary_fee: f64,
        now: Timestamp,
    ) -> Result<Community, LedgerError> {
        if !(0.0..=1.0).contains(&boundary_fee) {
            return Err(LedgerError::RateOutOfRange {
                what: "boundary fee",
                value: boundary_fee,
            });
        }
        let community = Community::new(name, boundary_fee, now);
        info!(community = %community.id, name = %community.name, boundary_fee, "community created");
        self.communities
            .insert(community.id.clone(), community.clone());
        Ok(community)
    }

    pub fn get(&self, id: &CommunityId) -> Option<&Community> {
        self.communities.get(id)
    }

    pub fn require(&self, id: &CommunityId) -> Result<&Community, LedgerError> {
        self.communities
            .get(id)
            .ok_or_else(|| LedgerError::CommunityNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &CommunityId) -> bool {
        self.communities.contains_key(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Community> {
        self.communities.values().find(|c| c.name == name)
    }

    pub fn all(&self) -> impl Iterator<Item = &Community> {
        self.communities.values()
    }

    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// The raw map, for conversion contexts.
    pub fn map(&self) -> &BTreeMap<CommunityId, Community> {
        &self.communities
    }

    /// Bump the member count when a wallet joins.
    pub fn record_join(&mut self, id: &CommunityId) -> Result<(), LedgerError> {
        let community = self
            .communities
            .get_mut(id)
            .ok_or_else(|| LedgerError::CommunityNotFound(id.to_string()))?;
        community.member_count += 1;
        Ok(())
    }

    // ── Export / import ──────────────────────────────────────────────────────

    pub fn export(&self) -> Vec<Community> {
        self.communities.values().cloned().collect()
    }

    pub fn import(records: Vec<Community>) -> Self {
        Self {
            communities: records.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_resolve() {
        let mut reg = CommunityRegistry::new();
        let c = reg.create("riverside", 0.05, 0).expect("valid fee");
        assert!(reg.contains(&c.id));
        assert_eq!(reg.require(&c.id).unwrap().boundary_fee, 0.05);
        assert_eq!(reg.find_by_name("riverside").unwrap().id, c.id);
    }

    #[test]
    fn boundary_fee_must_be_a_rate() {
        let mut reg = CommunityRegistry::new();
        assert!(matches!(
            reg.create("bad", 1.5, 0),
            Err(LedgerError::RateOutOfRange { .. })
        ));
        assert!(matches!(
            reg.create("bad", -0.1, 0),
            Err(LedgerError::RateOutOfRange { .. })
        ));
    }

    #[test]
    fn unknown_community_is_an_error() {
        let reg = CommunityRegistry::new();
        assert!(matches!(
            reg.require(&CommunityId::generate()),
            Err(LedgerError::CommunityNotFound(_))
        ));
    }

    #[test]
    fn export_import_round_trips() {
        let mut reg = CommunityRegistry::new();
        reg.create("a", 0.01, 0).unwrap();
        reg.create("b", 0.10, 5).unwrap();
        let restored = CommunityRegistry::import(reg.export());
        assert_eq!(reg, restored);
    }

    #[test]
    fn join_bumps_member_count() {
        let mut reg = CommunityRegistry::new();
        let c = reg.create("a", 0.01, 0).unwrap();
        reg.record_join(&c.id).unwrap();
        reg.record_join(&c.id).unwrap();
        assert_eq!(reg.get(&c.id).unwrap().member_count, 2);
    }
}
