//! Proving backends.
//!
//! The engine constructs proofs through one of two backends, fixed at
//! engine construction rather than probed per call:
//!
//! - [`ProverBackend::Real`] delegates to an injected [`ZkProver`]: the
//!   seam where an actual SNARK proving library plugs in.
//! - [`ProverBackend::Stub`] derives every proof field as a one-way hash
//!   of its semantic inputs. The artifact is well-formed, internally
//!   consistent, and reproducible, but carries no zero-knowledge soundness
//!   guarantee: a drop-in for development and test, not a security
//!   boundary. Its verification is structural only, necessary but not
//!   sufficient.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::proof::{hex_field, is_hex_field, ProofPoints, ZERO_HASH};

/// Semantic inputs every backend commits to when constructing a proof.
#[derive(Debug, Clone, Copy)]
pub struct ProveInput<'a> {
    pub claim_type: &'a str,
    /// The holder's identity commitment appended to the group
    pub identity_commitment: [u8; 32],
    /// Group root snapshot taken right after the append
    pub group_root: [u8; 32],
    pub nullifier: [u8; 32],
    /// One-way digest of (claim type, attribute data, timestamp)
    pub signal: [u8; 32],
    /// Holder address as a left-padded 32-byte field element
    pub holder_field: [u8; 32],
    /// Issuer address as a left-padded 32-byte field element
    pub issuer_field: [u8; 32],
}

/// Interface an external proving library must expose.
///
/// Implementations are expected to be deterministic per input for `verify`
/// and may suspend on I/O (e.g. a remote prover); the caller bounds that
/// with its own timeout and surfaces expiry as a generation failure.
pub trait ZkProver: Send + Sync {
    /// Construct proof points and the ordered public signals.
    fn prove(&self, input: &ProveInput<'_>) -> Result<(ProofPoints, Vec<String>)>;

    /// Cryptographically check proof points against public signals.
    fn verify(&self, points: &ProofPoints, public_signals: &[String]) -> Result<bool>;
}

/// Process-wide backend capability, decided once when the engine is built.
#[derive(Clone)]
pub enum ProverBackend {
    /// A real proving library was injected
    Real(Arc<dyn ZkProver>),
    /// Deterministic hash-derived stand-in
    Stub,
}

impl fmt::Debug for ProverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ProverBackend {
    pub fn name(&self) -> &'static str {
        match self {
            ProverBackend::Real(_) => "real",
            ProverBackend::Stub => "stub",
        }
    }

    /// Construct proof points and public signals for the input.
    pub fn prove(&self, input: &ProveInput<'_>) -> Result<(ProofPoints, Vec<String>)> {
        match self {
            ProverBackend::Real(prover) => prover.prove(input),
            ProverBackend::Stub => Ok(stub_prove(input)),
        }
    }

    /// Check a proof the way this backend can.
    ///
    /// The real backend recomputes cryptographic validity. The stub can
    /// only confirm the artifact is structurally well-formed and
    /// non-sentinel; callers must not treat a stub `true` as soundness.
    pub fn verify(&self, points: &ProofPoints, public_signals: &[String]) -> Result<bool> {
        match self {
            ProverBackend::Real(prover) => prover.verify(points, public_signals),
            ProverBackend::Stub => Ok(stub_verify(points, public_signals)),
        }
    }
}

fn stub_point(tag: &str, input: &ProveInput<'_>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"claimproof.stub.v1:");
    hasher.update(tag.as_bytes());
    hasher.update([0x1f]);
    hasher.update(input.claim_type.as_bytes());
    hasher.update(input.identity_commitment);
    hasher.update(input.group_root);
    hasher.update(input.nullifier);
    hasher.update(input.signal);
    hasher.update(input.holder_field);
    hasher.update(input.issuer_field);
    let digest: [u8; 32] = hasher.finalize().into();
    hex_field(&digest)
}

/// Derive the full a/b/c point set and public signals from the semantic
/// inputs. Same inputs reproduce the same artifact.
fn stub_prove(input: &ProveInput<'_>) -> (ProofPoints, Vec<String>) {
    let points = ProofPoints {
        a: [stub_point("a.0", input), stub_point("a.1", input)],
        b: [
            [stub_point("b.0.0", input), stub_point("b.0.1", input)],
            [stub_point("b.1.0", input), stub_point("b.1.1", input)],
        ],
        c: [stub_point("c.0", input), stub_point("c.1", input)],
    };

    // Signal order is part of the wire contract: root, nullifier,
    // predicate commitment, holder, issuer.
    let public_signals = vec![
        hex_field(&input.group_root),
        hex_field(&input.nullifier),
        hex_field(&input.signal),
        hex_field(&input.holder_field),
        hex_field(&input.issuer_field),
    ];

    (points, public_signals)
}

fn stub_verify(points: &ProofPoints, public_signals: &[String]) -> bool {
    if public_signals.is_empty() {
        return false;
    }

    let all_points = points
        .a
        .iter()
        .chain(points.b.iter().flatten())
        .chain(points.c.iter());
    for point in all_points {
        if point == ZERO_HASH || !is_hex_field(point) {
            return false;
        }
    }

    public_signals.iter().all(|s| is_hex_field(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProveInput<'static> {
        ProveInput {
            claim_type: "income-threshold",
            identity_commitment: [1; 32],
            group_root: [2; 32],
            nullifier: [3; 32],
            signal: [4; 32],
            holder_field: [5; 32],
            issuer_field: [6; 32],
        }
    }

    #[test]
    fn test_stub_is_deterministic() {
        let (points_a, signals_a) = stub_prove(&input());
        let (points_b, signals_b) = stub_prove(&input());
        assert_eq!(points_a, points_b);
        assert_eq!(signals_a, signals_b);
    }

    #[test]
    fn test_stub_point_slots_differ() {
        let (points, _) = stub_prove(&input());
        assert_ne!(points.a[0], points.a[1]);
        assert_ne!(points.a[0], points.c[0]);
        assert_ne!(points.b[0][0], points.b[1][1]);
    }

    #[test]
    fn test_stub_binds_inputs() {
        let (points_a, _) = stub_prove(&input());

        let mut changed = input();
        changed.group_root = [9; 32];
        let (points_b, _) = stub_prove(&changed);

        assert_ne!(points_a, points_b);
    }

    #[test]
    fn test_stub_signal_order() {
        let (_, signals) = stub_prove(&input());
        assert_eq!(signals.len(), 5);
        assert_eq!(signals[0], hex_field(&[2; 32])); // root
        assert_eq!(signals[1], hex_field(&[3; 32])); // nullifier
        assert_eq!(signals[2], hex_field(&[4; 32])); // predicate commitment
    }

    #[test]
    fn test_stub_verify_accepts_own_output() {
        let (points, signals) = stub_prove(&input());
        assert!(stub_verify(&points, &signals));
    }

    #[test]
    fn test_stub_verify_rejects_sentinel_and_empty() {
        let (points, signals) = stub_prove(&input());

        assert!(!stub_verify(&ProofPoints::zeroed(), &signals));
        assert!(!stub_verify(&points, &[]));

        let mut tampered = points.clone();
        tampered.a[0] = ZERO_HASH.to_string();
        assert!(!stub_verify(&tampered, &signals));
    }

    #[test]
    fn test_backend_dispatch() {
        let backend = ProverBackend::Stub;
        assert_eq!(backend.name(), "stub");

        let (points, signals) = backend.prove(&input()).unwrap();
        assert!(backend.verify(&points, &signals).unwrap());
    }

    struct RejectingProver;

    impl ZkProver for RejectingProver {
        fn prove(&self, input: &ProveInput<'_>) -> Result<(ProofPoints, Vec<String>)> {
            Ok(stub_prove(input))
        }

        fn verify(&self, _points: &ProofPoints, _signals: &[String]) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_injected_prover_controls_verification() {
        let backend = ProverBackend::Real(Arc::new(RejectingProver));
        assert_eq!(backend.name(), "real");

        let (points, signals) = backend.prove(&input()).unwrap();
        assert!(!backend.verify(&points, &signals).unwrap());
    }
}
