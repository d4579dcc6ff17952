//! Proof engine: the orchestrator behind `generateProof`/`verifyProof`.
//!
//! Each generation call runs strictly validate → integrity check → group
//! update → nullifier → construct. Failures short-circuit every later
//! step, with one deliberate exception: once the holder's commitment has
//! been appended to the group, it stays there even if a later step fails;
//! membership alone reveals nothing about the predicate.

use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::attribute::AttributeData;
use crate::backend::{ProveInput, ProverBackend};
use crate::claim::{address_to_field, normalize_address, ClaimRequest};
use crate::error::{ClaimProofError, Result};
use crate::group::{holder_commitment, GroupRegistry, MERKLE_TREE_DEPTH};
use crate::nullifier::{derive_nullifier, NullifierScheme};
use crate::proof::{hex_field, Proof, ProofResult};
use crate::validator::validate_claim;

/// Orchestrates claim validation, group membership, nullifier derivation,
/// and proof construction.
///
/// The engine owns its group registry; construct one per process (or per
/// test) and share it by reference. There is no ambient global state.
#[derive(Debug)]
pub struct ProofEngine {
    registry: GroupRegistry,
    backend: ProverBackend,
    nullifier_scheme: NullifierScheme,
}

impl Default for ProofEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofEngine {
    /// Engine with the deterministic stub backend and stable nullifiers.
    pub fn new() -> Self {
        Self::with_backend(ProverBackend::Stub)
    }

    /// Engine with an explicit backend, decided once here and never probed
    /// per call.
    pub fn with_backend(backend: ProverBackend) -> Self {
        log::info!("Proof engine initialized with {} backend", backend.name());
        ProofEngine {
            registry: GroupRegistry::new(),
            backend,
            nullifier_scheme: NullifierScheme::default(),
        }
    }

    /// Override the nullifier scheme (builder style).
    pub fn with_nullifier_scheme(mut self, scheme: NullifierScheme) -> Self {
        log::info!("Using {} nullifier derivation", scheme.name());
        self.nullifier_scheme = scheme;
        self
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Generate a proof for the request.
    ///
    /// All failures come back as `ProofResult { is_valid: false, .. }`
    /// with the all-zero sentinel proof; nothing is thrown across this
    /// boundary. The error message may name the holder's actual values for
    /// the caller, but the sentinel never carries them.
    pub fn generate_proof(&self, request: &ClaimRequest) -> ProofResult {
        log::info!("Generating proof for claim type '{}'", request.claim_type);

        match self.try_generate(request) {
            Ok(proof) => {
                log::info!("✓ Proof generated for '{}'", request.claim_type);
                ProofResult::success(proof)
            }
            Err(e) => {
                log::warn!("✗ Proof generation failed: {e}");
                ProofResult::failure(&request.claim_type, e.to_string())
            }
        }
    }

    fn try_generate(&self, request: &ClaimRequest) -> Result<Proof> {
        // Step 1: Input shape, before any state is touched
        request.validate()?;
        let holder = normalize_address(&request.holder_address)?;
        let issuer = normalize_address(&request.issuer_address)?;

        // Step 2: Integrity gate; a false predicate stops everything here
        validate_claim(&request.claim_type, &request.attribute_data)?;
        log::debug!("✓ Claim integrity verified");

        // Step 3: Group membership. Never rolled back after this point.
        let commitment = holder_commitment(&holder, &request.credential_id)?;
        let snapshot = self.registry.add_member(&request.claim_type, commitment)?;
        log::debug!(
            "✓ Joined group 0x{} ({} member(s))",
            hex::encode(snapshot.id),
            snapshot.member_count
        );

        // Step 4: Nullifier
        let (timestamp, attempt) = unix_time()?;
        let nullifier = derive_nullifier(
            self.nullifier_scheme,
            &request.credential_id,
            &request.claim_type,
            &holder,
            attempt,
        );

        // Step 5: Proof construction through the backend
        let signal = predicate_signal(&request.claim_type, &request.attribute_data, timestamp);
        let input = ProveInput {
            claim_type: &request.claim_type,
            identity_commitment: commitment,
            group_root: snapshot.root,
            nullifier,
            signal,
            holder_field: address_to_field(&holder)?,
            issuer_field: address_to_field(&issuer)?,
        };
        let (points, public_signals) = self.backend.prove(&input)?;

        Ok(Proof {
            claim_type: request.claim_type.clone(),
            holder_address: holder,
            issuer_address: issuer,
            proof: points,
            public_signals,
            merkle_tree_depth: MERKLE_TREE_DEPTH,
            nullifier: hex_field(&nullifier),
            timestamp,
            group_id: hex_field(&snapshot.id),
        })
    }

    /// Check a previously produced proof.
    ///
    /// Pure function of the proof's contents: sentinel fields, empty
    /// public signals, or structural damage reject immediately; otherwise
    /// the engine's backend decides. With the stub backend that decision
    /// is structural only: necessary but not sufficient.
    pub fn verify_proof(&self, proof: &Proof) -> bool {
        if proof.is_sentinel() {
            log::debug!("✗ Rejecting sentinel proof");
            return false;
        }
        if proof.public_signals.is_empty() {
            log::debug!("✗ Rejecting proof with empty publicSignals");
            return false;
        }
        if let Err(e) = proof.validate_structure() {
            log::debug!("✗ Rejecting structurally invalid proof: {e}");
            return false;
        }

        match self.backend.verify(&proof.proof, &proof.public_signals) {
            Ok(valid) => {
                if valid {
                    log::debug!("✓ Proof verified ({} backend)", self.backend.name());
                } else {
                    log::debug!("✗ Proof rejected by {} backend", self.backend.name());
                }
                valid
            }
            Err(e) => {
                log::warn!("✗ Verification could not complete: {e}");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Convenience wrappers for the well-known claim families. Each is a
    // thin parameter-shaping layer over `generate_proof`.
    // ------------------------------------------------------------------

    /// Prove income strictly below `threshold`.
    pub fn prove_income_below(
        &self,
        credential_id: &str,
        holder_address: &str,
        issuer_address: &str,
        income: f64,
        threshold: f64,
    ) -> ProofResult {
        self.generate_proof(&ClaimRequest {
            credential_id: credential_id.to_string(),
            claim_type: "income-threshold".to_string(),
            holder_address: holder_address.to_string(),
            issuer_address: issuer_address.to_string(),
            attribute_data: AttributeData::new()
                .with("income", income)
                .with("threshold", threshold),
        })
    }

    /// Prove marks at or above `threshold`.
    pub fn prove_marks_above(
        &self,
        credential_id: &str,
        holder_address: &str,
        issuer_address: &str,
        marks: f64,
        threshold: f64,
    ) -> ProofResult {
        self.generate_proof(&ClaimRequest {
            credential_id: credential_id.to_string(),
            claim_type: "marks-threshold".to_string(),
            holder_address: holder_address.to_string(),
            issuer_address: issuer_address.to_string(),
            attribute_data: AttributeData::new()
                .with("marks", marks)
                .with("threshold", threshold),
        })
    }

    /// Prove the holder's caste category equals `claimed_caste`.
    pub fn prove_caste_membership(
        &self,
        credential_id: &str,
        holder_address: &str,
        issuer_address: &str,
        caste: &str,
        claimed_caste: &str,
    ) -> ProofResult {
        self.generate_proof(&ClaimRequest {
            credential_id: credential_id.to_string(),
            claim_type: "caste-verification".to_string(),
            holder_address: holder_address.to_string(),
            issuer_address: issuer_address.to_string(),
            attribute_data: AttributeData::new()
                .with("caste", caste)
                .with("claimedCaste", claimed_caste),
        })
    }

    /// Prove the holder's disability flag equals `claimed`.
    pub fn prove_disability_status(
        &self,
        credential_id: &str,
        holder_address: &str,
        issuer_address: &str,
        disability: bool,
        claimed: bool,
    ) -> ProofResult {
        self.generate_proof(&ClaimRequest {
            credential_id: credential_id.to_string(),
            claim_type: "disability-status".to_string(),
            holder_address: holder_address.to_string(),
            issuer_address: issuer_address.to_string(),
            attribute_data: AttributeData::new()
                .with("disability", disability)
                .with("claimedDisability", claimed),
        })
    }
}

/// Commitment over (claim type, attribute digest, timestamp): the
/// predicate signal published with the proof. One-way: attribute values
/// never appear in it directly.
fn predicate_signal(claim_type: &str, data: &AttributeData, timestamp: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"claimproof.signal.v1:");
    hasher.update(claim_type.as_bytes());
    hasher.update(data.digest());
    hasher.update(timestamp.to_le_bytes());
    hasher.finalize().into()
}

/// Current Unix time as (seconds, milliseconds).
fn unix_time() -> Result<(u64, u64)> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ClaimProofError::Backend(format!("system clock unavailable: {e}")))?;
    Ok((now.as_secs(), now.as_millis() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLDER: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
    const ISSUER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    fn income_request(income: f64, threshold: f64) -> ClaimRequest {
        ClaimRequest {
            credential_id: "cred-income-001".to_string(),
            claim_type: "income-threshold".to_string(),
            holder_address: HOLDER.to_string(),
            issuer_address: ISSUER.to_string(),
            attribute_data: AttributeData::new()
                .with("income", income)
                .with("threshold", threshold),
        }
    }

    #[test]
    fn test_generate_and_verify_valid_income_proof() {
        env_logger::try_init().ok();

        let engine = ProofEngine::new();
        let result = engine.generate_proof(&income_request(80000.0, 100000.0));

        assert!(result.is_valid, "expected success: {:?}", result.error_message);
        assert!(!result.proof.is_sentinel());
        assert_eq!(result.proof.merkle_tree_depth, MERKLE_TREE_DEPTH);
        assert_eq!(result.proof.public_signals.len(), 5);
        assert!(engine.verify_proof(&result.proof));

        println!("✓ Income proof generated and verified");
    }

    #[test]
    fn test_false_income_claim_yields_sentinel() {
        let engine = ProofEngine::new();
        let result = engine.generate_proof(&income_request(80000.0, 50000.0));

        assert!(!result.is_valid);
        assert!(result.proof.is_sentinel());
        assert!(result.error_message.is_some());
        // The integrity failure skipped the group step entirely
        assert_eq!(engine.registry().member_count("income-threshold"), 0);
    }

    #[test]
    fn test_input_error_precedes_group_mutation() {
        let engine = ProofEngine::new();
        let mut request = income_request(80000.0, 100000.0);
        request.holder_address = "0xbad".to_string();

        let result = engine.generate_proof(&request);
        assert!(!result.is_valid);
        assert_eq!(engine.registry().member_count("income-threshold"), 0);
    }

    #[test]
    fn test_group_grows_once_per_successful_proof() {
        let engine = ProofEngine::new();
        for i in 0..4 {
            let mut request = income_request(80000.0, 100000.0);
            request.credential_id = format!("cred-{i}");
            let result = engine.generate_proof(&request);
            assert!(result.is_valid);
        }
        assert_eq!(engine.registry().member_count("income-threshold"), 4);
    }

    #[test]
    fn test_proof_snapshots_root_at_generation() {
        let engine = ProofEngine::new();

        let first = engine.generate_proof(&income_request(80000.0, 100000.0));
        assert!(first.is_valid);
        let root_at_first = first.proof.public_signals[0].clone();

        let mut second_req = income_request(80000.0, 100000.0);
        second_req.credential_id = "cred-income-002".to_string();
        let second = engine.generate_proof(&second_req);
        assert!(second.is_valid);

        // The group grew, so the snapshot roots differ, but the first
        // proof still verifies against its own snapshot.
        assert_ne!(root_at_first, second.proof.public_signals[0]);
        assert!(engine.verify_proof(&first.proof));
        assert!(engine.verify_proof(&second.proof));
    }

    #[test]
    fn test_stable_nullifier_reproduced_across_calls() {
        let engine = ProofEngine::new();

        let first = engine.generate_proof(&income_request(80000.0, 100000.0));
        let second = engine.generate_proof(&income_request(80000.0, 100000.0));

        assert!(first.is_valid && second.is_valid);
        assert_eq!(
            first.proof.nullifier, second.proof.nullifier,
            "stable scheme: same credential/claim/holder must collide"
        );
    }

    #[test]
    fn test_per_attempt_nullifier_varies() {
        let engine =
            ProofEngine::new().with_nullifier_scheme(NullifierScheme::PerAttempt);

        let first = engine.generate_proof(&income_request(80000.0, 100000.0));
        // Force a different attempt counter even on a fast machine
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = engine.generate_proof(&income_request(80000.0, 100000.0));

        assert!(first.is_valid && second.is_valid);
        assert_ne!(first.proof.nullifier, second.proof.nullifier);
    }

    #[test]
    fn test_verify_rejects_sentinel_and_tampering() {
        let engine = ProofEngine::new();

        assert!(!engine.verify_proof(&Proof::sentinel("income-threshold")));

        let result = engine.generate_proof(&income_request(80000.0, 100000.0));
        assert!(result.is_valid);

        let mut tampered = result.proof.clone();
        tampered.public_signals.clear();
        assert!(!engine.verify_proof(&tampered));

        let mut tampered = result.proof.clone();
        tampered.proof.a[0] = crate::proof::ZERO_HASH.to_string();
        assert!(!engine.verify_proof(&tampered));
    }

    #[test]
    fn test_engines_are_isolated() {
        let a = ProofEngine::new();
        let b = ProofEngine::new();

        assert!(a.generate_proof(&income_request(80000.0, 100000.0)).is_valid);
        assert_eq!(a.registry().member_count("income-threshold"), 1);
        assert_eq!(b.registry().member_count("income-threshold"), 0);
    }

    #[test]
    fn test_convenience_wrappers() {
        let engine = ProofEngine::new();

        assert!(
            engine
                .prove_income_below("cred-1", HOLDER, ISSUER, 80000.0, 100000.0)
                .is_valid
        );
        assert!(
            !engine
                .prove_income_below("cred-1", HOLDER, ISSUER, 80000.0, 50000.0)
                .is_valid
        );
        assert!(
            engine
                .prove_marks_above("cred-2", HOLDER, ISSUER, 85.0, 80.0)
                .is_valid
        );
        assert!(
            !engine
                .prove_marks_above("cred-2", HOLDER, ISSUER, 85.0, 90.0)
                .is_valid
        );
        assert!(
            engine
                .prove_caste_membership("cred-3", HOLDER, ISSUER, "SC", "SC")
                .is_valid
        );
        assert!(
            !engine
                .prove_caste_membership("cred-3", HOLDER, ISSUER, "SC", "ST")
                .is_valid
        );
        assert!(
            engine
                .prove_disability_status("cred-4", HOLDER, ISSUER, true, true)
                .is_valid
        );
    }

    struct FailingProver;

    impl crate::backend::ZkProver for FailingProver {
        fn prove(
            &self,
            _input: &ProveInput<'_>,
        ) -> crate::error::Result<(crate::proof::ProofPoints, Vec<String>)> {
            Err(ClaimProofError::Backend("prover timed out".to_string()))
        }

        fn verify(
            &self,
            _points: &crate::proof::ProofPoints,
            _signals: &[String],
        ) -> crate::error::Result<bool> {
            Err(ClaimProofError::Backend("prover timed out".to_string()))
        }
    }

    #[test]
    fn test_backend_failure_is_nonfatal_but_group_mutation_persists() {
        let engine =
            ProofEngine::with_backend(ProverBackend::Real(std::sync::Arc::new(FailingProver)));

        let result = engine.generate_proof(&income_request(80000.0, 100000.0));
        assert!(!result.is_valid);
        assert!(result.proof.is_sentinel());

        // The append happened before the backend ran and is not rolled back
        assert_eq!(engine.registry().member_count("income-threshold"), 1);
    }
}
