//! Proof artifact types, the all-zero sentinel, and structural checks.
//!
//! The `Proof` struct serializes to the canonical wire format checked by
//! external verifiers; field names (including the historical
//! `studentAddress` for the holder) are frozen there and must not drift.

use serde::{Deserialize, Serialize};

use crate::error::{ClaimProofError, Result};
use crate::group::MERKLE_TREE_DEPTH;

/// All-zero 32-byte hash, used as the explicit invalid marker in sentinel
/// proofs and rejected outright by verification.
pub const ZERO_HASH: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";

/// All-zero 20-byte account address.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Encode bytes as a 0x-prefixed lowercase hex string.
pub fn hex_field(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub(crate) fn is_hex_field(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(body) if !body.is_empty() => body
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()),
        _ => false,
    }
}

/// The canonical three-part pairing-style proof shape: `a` and `c` are
/// pairs of field elements, `b` is a 2×2 block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPoints {
    pub a: [String; 2],
    pub b: [[String; 2]; 2],
    pub c: [String; 2],
}

impl ProofPoints {
    /// Points for the sentinel (invalid) proof.
    pub fn zeroed() -> Self {
        let z = || ZERO_HASH.to_string();
        ProofPoints {
            a: [z(), z()],
            b: [[z(), z()], [z(), z()]],
            c: [z(), z()],
        }
    }

    fn iter(&self) -> impl Iterator<Item = &String> {
        self.a
            .iter()
            .chain(self.b.iter().flatten())
            .chain(self.c.iter())
    }
}

/// The exported, self-contained proof artifact.
///
/// Immutable once constructed; it may be exported, re-imported, and
/// re-verified arbitrarily many times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    pub claim_type: String,
    #[serde(rename = "studentAddress")]
    pub holder_address: String,
    pub issuer_address: String,
    pub proof: ProofPoints,
    pub public_signals: Vec<String>,
    pub merkle_tree_depth: u32,
    pub nullifier: String,
    /// Unix seconds at generation time
    pub timestamp: u64,
    pub group_id: String,
}

impl Proof {
    /// The all-zero sentinel returned on every failure path: every hex
    /// field holds the zero constant so no verifier will ever accept it.
    /// The claim type is kept for caller-side correlation; it is public
    /// input anyway.
    pub fn sentinel(claim_type: &str) -> Self {
        Proof {
            claim_type: claim_type.to_string(),
            holder_address: ZERO_ADDRESS.to_string(),
            issuer_address: ZERO_ADDRESS.to_string(),
            proof: ProofPoints::zeroed(),
            public_signals: Vec::new(),
            merkle_tree_depth: MERKLE_TREE_DEPTH,
            nullifier: ZERO_HASH.to_string(),
            timestamp: 0,
            group_id: ZERO_HASH.to_string(),
        }
    }

    /// True when this proof carries the invalid marker: a zero nullifier
    /// or a zeroed `a` point.
    pub fn is_sentinel(&self) -> bool {
        self.nullifier == ZERO_HASH
            || self.proof.a[0] == ZERO_HASH
            || self.proof.a[1] == ZERO_HASH
    }

    /// Structural validation of a (claimed-valid) proof.
    ///
    /// Checks field well-formedness only: non-empty claim type, 20-byte
    /// hex addresses, 0x-prefixed lowercase hex in every point and signal,
    /// non-empty signals, and the fixed tree depth. Cryptographic validity
    /// is the backend's concern.
    ///
    /// # Errors
    /// Returns [`ClaimProofError::MalformedProof`] naming the first
    /// offending field.
    pub fn validate_structure(&self) -> Result<()> {
        if self.claim_type.trim().is_empty() {
            return Err(malformed("claimType is empty"));
        }

        for (name, addr) in [
            ("studentAddress", &self.holder_address),
            ("issuerAddress", &self.issuer_address),
        ] {
            if !is_hex_field(addr) || addr.len() != 42 {
                return Err(malformed(&format!(
                    "{name} is not a 0x-prefixed 20-byte hex address"
                )));
            }
        }

        for point in self.proof.iter() {
            if !is_hex_field(point) {
                return Err(malformed("proof points must be 0x-prefixed hex strings"));
            }
        }

        if self.public_signals.is_empty() {
            return Err(malformed("publicSignals is empty"));
        }
        for signal in &self.public_signals {
            if !is_hex_field(signal) {
                return Err(malformed("publicSignals must be 0x-prefixed hex strings"));
            }
        }

        if !is_hex_field(&self.nullifier) {
            return Err(malformed("nullifier is not a 0x-prefixed hex string"));
        }
        if !is_hex_field(&self.group_id) {
            return Err(malformed("groupId is not a 0x-prefixed hex string"));
        }
        if self.merkle_tree_depth != MERKLE_TREE_DEPTH {
            return Err(malformed(&format!(
                "merkleTreeDepth must be {MERKLE_TREE_DEPTH} (got {})",
                self.merkle_tree_depth
            )));
        }

        Ok(())
    }
}

fn malformed(msg: &str) -> ClaimProofError {
    ClaimProofError::MalformedProof(msg.to_string())
}

/// Outcome wrapper returned by generation and verification.
///
/// Failures are carried as values: `is_valid: false` plus a caller-facing
/// message, with the proof field holding the sentinel. Nothing in the
/// sentinel or the message reaches a third-party verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofResult {
    pub is_valid: bool,
    pub proof: Proof,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProofResult {
    pub fn success(proof: Proof) -> Self {
        ProofResult {
            is_valid: true,
            proof,
            error_message: None,
        }
    }

    pub fn failure(claim_type: &str, message: impl Into<String>) -> Self {
        ProofResult {
            is_valid: false,
            proof: Proof::sentinel(claim_type),
            error_message: Some(message.into()),
        }
    }
}
