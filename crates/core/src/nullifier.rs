//! Nullifier derivation for replay detection.
//!
//! A nullifier lets a verifier detect and reject reuse of a proof for the
//! same benefit without learning which group member produced it. The
//! verifier keeps the seen-nullifier set; this core only derives the value
//! and exposes it in the proof.

use sha2::{Digest, Sha256};

/// How the nullifier binds to a generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullifierScheme {
    /// Derive from (credential, claim type, holder) only.
    ///
    /// Asking twice for the "same" proof yields the same nullifier, so a
    /// verifier's seen-set gives real double-use protection. This is the
    /// default.
    #[default]
    Stable,

    /// Additionally salt with a per-attempt counter (wall-clock derived).
    ///
    /// Every generation call yields a fresh nullifier, so a verifier can
    /// only reject byte-identical resubmissions, not a re-request of the
    /// same claim. Replay protection is correspondingly weaker; intended
    /// for demos that want visibly distinct artifacts per attempt.
    PerAttempt,
}

impl NullifierScheme {
    pub fn name(&self) -> &'static str {
        match self {
            NullifierScheme::Stable => "stable",
            NullifierScheme::PerAttempt => "per-attempt",
        }
    }
}

/// Derive the nullifier hash for one generation attempt.
///
/// Deterministic one-way function of its inputs. `attempt` is only folded
/// in under [`NullifierScheme::PerAttempt`]; the caller supplies it (the
/// engine uses milliseconds since the epoch).
pub fn derive_nullifier(
    scheme: NullifierScheme,
    credential_id: &str,
    claim_type: &str,
    holder_address: &str,
    attempt: u64,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"claimproof.nullifier.v1:");
    hasher.update(credential_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(claim_type.as_bytes());
    hasher.update([0x1f]);
    hasher.update(holder_address.as_bytes());
    if scheme == NullifierScheme::PerAttempt {
        hasher.update([0x1f]);
        hasher.update(attempt.to_le_bytes());
    }
    hasher.finalize().into()
}
