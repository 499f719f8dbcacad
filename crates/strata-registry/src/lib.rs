//! strata-registry
//!
//! The community and purpose registries: the authoritative maps every
//! locality and purpose id on a unit must resolve against. Registries are
//! read-only from the unit's perspective; only the ledger mutates them.

pub mod community;
pub mod purpose;

pub use community::CommunityRegistry;
pub use purpose::PurposeRegistry;
