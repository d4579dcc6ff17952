//! Error types for the claim-proof core library

use thiserror::Error;

/// Result type alias for claim-proof operations
pub type Result<T> = std::result::Result<T, ClaimProofError>;

/// Error types that can occur during claim-proof operations
#[derive(Error, Debug)]
pub enum ClaimProofError {
    /// Malformed request field (empty id, bad address, empty attribute map)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The claimed predicate is false for the holder's actual values.
    ///
    /// The message names actual vs. required values for the caller only;
    /// it is never embedded in an exported proof.
    #[error("Invalid claim: {0}")]
    ClaimIntegrity(String),

    /// Anonymity set reached its 2^depth member bound
    #[error("Group for claim type '{claim_type}' is full ({capacity} members)")]
    GroupCapacity { claim_type: String, capacity: usize },

    /// Proving backend could not produce or check a proof
    #[error("Proving backend failed: {0}")]
    Backend(String),

    /// Imported proof is structurally invalid
    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hex decode error
    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl ClaimProofError {
    /// True for failures of the integrity gate (predicate false).
    ///
    /// These are non-retryable: the same request will fail again until the
    /// underlying attribute values change.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, ClaimProofError::ClaimIntegrity(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClaimProofError::InvalidInput("holderAddress is empty".to_string());
        assert!(err.to_string().contains("holderAddress"));

        let err = ClaimProofError::GroupCapacity {
            claim_type: "income-threshold".to_string(),
            capacity: 1 << 20,
        };
        assert!(err.to_string().contains("income-threshold"));
        assert!(err.to_string().contains("1048576"));
    }

    #[test]
    fn test_integrity_failure_classification() {
        let err = ClaimProofError::ClaimIntegrity("income 80000 not below 50000".to_string());
        assert!(err.is_integrity_failure());

        let err = ClaimProofError::Backend("prover unavailable".to_string());
        assert!(!err.is_integrity_failure());
    }
}
