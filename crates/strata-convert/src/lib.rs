//! strata-convert
//!
//! The conversion engine: computes and applies dimensional changes to a
//! unit — stratum moves, community entry/exit, purpose tagging, provenance
//! stripping — with fees compounding sequentially on the running
//! magnitude. The engine is pure: it reads registries through a context
//! and emits a successor unit plus an itemized fee bill; the ledger
//! routes and burns the fees.

pub mod engine;
pub mod request;

pub use engine::{
    temporal_conversion_fee, Conversion, ConversionContext, ConversionEngine, ConversionPreview,
};
pub use request::{ConversionFees, ConversionRequest, LocalityChange, PurposeChange};
