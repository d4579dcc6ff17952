//! Proof import/export and the on-chain verifier payload shape.
//!
//! Export is plain canonical JSON of the [`Proof`] artifact. Import parses
//! and then structurally validates, so a malformed or truncated artifact is
//! rejected at the boundary instead of surfacing later inside verification.

use serde::{Deserialize, Serialize};

use crate::error::{ClaimProofError, Result};
use crate::proof::Proof;

/// Serialize a proof to its canonical JSON wire form.
pub fn export_proof(proof: &Proof) -> Result<String> {
    Ok(serde_json::to_string(proof)?)
}

/// Parse a proof back from JSON and check its structure.
///
/// # Errors
/// Returns [`ClaimProofError::MalformedProof`] when the JSON does not parse
/// as a proof or when the parsed artifact fails structural validation.
pub fn import_proof(json: &str) -> Result<Proof> {
    let proof: Proof = serde_json::from_str(json)
        .map_err(|e| ClaimProofError::MalformedProof(format!("invalid proof JSON: {e}")))?;
    proof.validate_structure()?;
    Ok(proof)
}

/// Proof rearranged into the argument shape a typical on-chain pairing
/// verifier expects: `b` flattened row-major into four elements, signals
/// passed as the `input` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierPayload {
    pub claim_type: String,
    pub proof_a: [String; 2],
    pub proof_b: [String; 4],
    pub proof_c: [String; 2],
    pub input: Vec<String>,
    pub nullifier: String,
    pub group_id: String,
    pub merkle_tree_depth: u32,
}

/// Rearrange a proof for submission to an external verifier.
pub fn format_for_verifier(proof: &Proof) -> VerifierPayload {
    let b = &proof.proof.b;
    VerifierPayload {
        claim_type: proof.claim_type.clone(),
        proof_a: proof.proof.a.clone(),
        proof_b: [
            b[0][0].clone(),
            b[0][1].clone(),
            b[1][0].clone(),
            b[1][1].clone(),
        ],
        proof_c: proof.proof.c.clone(),
        input: proof.public_signals.clone(),
        nullifier: proof.nullifier.clone(),
        group_id: proof.group_id.clone(),
        merkle_tree_depth: proof.merkle_tree_depth,
    }
}
