//! Claim-Proof Core Library
//!
//! This library generates and verifies zero-knowledge claim proofs over
//! private credential attributes: a holder proves a predicate such as
//! "income below threshold" or "belongs to caste category" without
//! revealing the underlying values. Proofs are anchored in per-claim-type
//! Merkle anonymity groups and carry nullifiers for replay detection.

pub mod attribute;
pub mod backend;
pub mod claim;
pub mod codec;
pub mod engine;
pub mod error;
pub mod group;
pub mod nullifier;
pub mod proof;
pub mod validator;

pub use attribute::{AttributeData, AttributeValue};
pub use backend::{ProveInput, ProverBackend, ZkProver};
pub use claim::{ClaimFamily, ClaimRequest};
pub use codec::{export_proof, format_for_verifier, import_proof, VerifierPayload};
pub use engine::ProofEngine;
pub use error::{ClaimProofError, Result};
pub use group::{GroupRegistry, GroupSnapshot, MERKLE_TREE_DEPTH};
pub use nullifier::NullifierScheme;
pub use proof::{Proof, ProofPoints, ProofResult};
