use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Magnitude of value carried by a unit. Non-negative by invariant.
pub type Magnitude = f64;

/// Milliseconds since the Unix epoch (UTC). The ledger clock is explicit
/// and only ever moves through `advance_time` / `set_time` / `tick`.
pub type Timestamp = i64;

/// Render a ledger timestamp for human-readable output (status, describe).
pub fn format_timestamp(ms: Timestamp) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{ms}ms"))
}

// ── Id derivation ────────────────────────────────────────────────────────────

/// Random salt mixed into every derived id so that ids generated after a
/// snapshot restore never collide with ids already in the snapshot.
static SESSION_SALT: Lazy<[u8; 16]> = Lazy::new(rand::random);

/// Monotonic sequence shared by all id kinds.
static ID_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn derive_id(kind: &[u8]) -> [u8; 32] {
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut hasher = blake3::Hasher::new();
    hasher.update(kind);
    hasher.update(SESSION_SALT.as_ref());
    hasher.update(&seq.to_le_bytes());
    *hasher.finalize().as_bytes()
}

fn hex_to_array(s: &str) -> Result<[u8; 32], hex::FromHexError> {
    let bytes = hex::decode(s)?;
    bytes
        .try_into()
        .map_err(|_| hex::FromHexError::InvalidStringLength)
}

// ── UnitId ───────────────────────────────────────────────────────────────────

/// 32-byte identifier of a value unit: BLAKE3(b"unit" || salt || sequence).
/// Serialized as a hex string so ids can key JSON maps.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct UnitId(pub [u8; 32]);

impl UnitId {
    pub fn generate() -> Self {
        Self(derive_id(b"unit"))
    }

    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex_to_array(s).map(Self)
    }
}

impl From<UnitId> for String {
    fn from(id: UnitId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for UnitId {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s).map_err(|e| e.to_string())
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({}…)", &self.to_hex()[..12])
    }
}

// ── WalletId ─────────────────────────────────────────────────────────────────

/// 32-byte wallet identifier, rendered base-58 like an address.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct WalletId(pub [u8; 32]);

impl WalletId {
    pub fn generate() -> Self {
        Self(derive_id(b"wallet"))
    }

    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, String> {
        let bytes = bs58::decode(s).into_vec().map_err(|e| e.to_string())?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| "wallet id must decode to 32 bytes".to_string())?;
        Ok(Self(arr))
    }
}

impl From<WalletId> for String {
    fn from(id: WalletId) -> Self {
        id.to_b58()
    }
}

impl TryFrom<String> for WalletId {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_b58(&s)
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletId({})", &self.to_b58()[..8])
    }
}

// ── CommunityId ──────────────────────────────────────────────────────────────

/// 32-byte community identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CommunityId(pub [u8; 32]);

impl CommunityId {
    pub fn generate() -> Self {
        Self(derive_id(b"community"))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex_to_array(s).map(Self)
    }
}

impl From<CommunityId> for String {
    fn from(id: CommunityId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for CommunityId {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s).map_err(|e| e.to_string())
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommunityId({}…)", &self.to_hex()[..12])
    }
}

// ── PurposeId ────────────────────────────────────────────────────────────────

/// 32-byte purpose-channel identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PurposeId(pub [u8; 32]);

impl PurposeId {
    pub fn generate() -> Self {
        Self(derive_id(b"purpose"))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex_to_array(s).map(Self)
    }
}

impl From<PurposeId> for String {
    fn from(id: PurposeId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for PurposeId {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s).map_err(|e| e.to_string())
    }
}

impl fmt::Display for PurposeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PurposeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PurposeId({}…)", &self.to_hex()[..12])
    }
}

// ── JobId ────────────────────────────────────────────────────────────────────

/// 32-byte compute-job identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct JobId(pub [u8; 32]);

impl JobId {
    pub fn generate() -> Self {
        Self(derive_id(b"job"))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex_to_array(s).map(Self)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for JobId {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s).map_err(|e| e.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({}…)", &self.to_hex()[..12])
    }
}

// ── TxId ─────────────────────────────────────────────────────────────────────

/// 32-byte transaction-log entry identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn generate() -> Self {
        Self(derive_id(b"tx"))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex_to_array(s).map(Self)
    }
}

impl From<TxId> for String {
    fn from(id: TxId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for TxId {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s).map_err(|e| e.to_string())
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}…)", &self.to_hex()[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = UnitId::generate();
        let b = UnitId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn unit_id_hex_round_trip() {
        let id = UnitId::generate();
        let back = UnitId::from_hex(&id.to_hex()).expect("valid hex");
        assert_eq!(id, back);
    }

    #[test]
    fn unit_id_rejects_short_hex() {
        assert!(UnitId::from_hex("abcd").is_err());
    }

    #[test]
    fn wallet_id_b58_round_trip() {
        let id = WalletId::generate();
        let back = WalletId::from_b58(&id.to_b58()).expect("valid b58");
        assert_eq!(id, back);
    }

    #[test]
    fn ids_serialize_as_strings() {
        let id = UnitId::generate();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let back: UnitId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, back);
    }

    #[test]
    fn format_timestamp_renders_epoch() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
    }
}
