//! Claim requests, claim families, and account address validation.

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeData;
use crate::error::{ClaimProofError, Result};

/// Expected length of an account address in hex characters (excluding 0x prefix).
/// Addresses are 20 bytes = 40 hex characters.
pub const ADDRESS_HEX_LENGTH: usize = 40;

/// The predicate families this core knows how to validate.
///
/// The wire-level claim type stays a free string (it may embed a threshold,
/// e.g. "Income < 250000"); this enum is the internal dispatch key derived
/// from it. Anything that does not map to a family fails closed at the
/// integrity gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimFamily {
    /// Income strictly below a ceiling
    IncomeThreshold,
    /// Caste category equals the claimed category
    CasteVerification,
    /// Marks at or above a floor
    MarksThreshold,
    /// Disability flag equals the claimed flag
    DisabilityStatus,
    /// Region/state equals the claimed region
    RegionEligibility,
}

impl ClaimFamily {
    /// Map a raw claim-type string onto a known family.
    ///
    /// Matching is keyword-based so both canonical ids ("income-threshold")
    /// and scheme-style phrasings ("Income < 250000") resolve.
    pub fn detect(claim_type: &str) -> Option<Self> {
        let lowered = claim_type.to_ascii_lowercase();
        if lowered.contains("income") {
            Some(ClaimFamily::IncomeThreshold)
        } else if lowered.contains("caste") {
            Some(ClaimFamily::CasteVerification)
        } else if lowered.contains("marks") || lowered.contains("percentage") {
            Some(ClaimFamily::MarksThreshold)
        } else if lowered.contains("disability") || lowered.contains("disabled") {
            Some(ClaimFamily::DisabilityStatus)
        } else if lowered.contains("region") || lowered.contains("domicile") {
            Some(ClaimFamily::RegionEligibility)
        } else {
            None
        }
    }

    /// Stable name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ClaimFamily::IncomeThreshold => "income-threshold",
            ClaimFamily::CasteVerification => "caste-verification",
            ClaimFamily::MarksThreshold => "marks-threshold",
            ClaimFamily::DisabilityStatus => "disability-status",
            ClaimFamily::RegionEligibility => "region-eligibility",
        }
    }
}

/// Input to proof generation, constructed by the caller per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    /// Opaque credential identifier from the credential store
    pub credential_id: String,
    /// Predicate family being proven, possibly with an embedded threshold
    pub claim_type: String,
    /// Holder account address (0x + 40 hex chars)
    pub holder_address: String,
    /// Issuer account address (0x + 40 hex chars)
    pub issuer_address: String,
    /// Attribute values the predicate is evaluated against
    pub attribute_data: AttributeData,
}

impl ClaimRequest {
    /// Shape-check the request before any state is touched.
    ///
    /// # Errors
    /// Returns [`ClaimProofError::InvalidInput`] naming the offending field
    /// when an id is empty, an address is malformed, or the attribute map
    /// is empty.
    pub fn validate(&self) -> Result<()> {
        if self.credential_id.trim().is_empty() {
            return Err(ClaimProofError::InvalidInput(
                "credentialId must not be empty".to_string(),
            ));
        }
        if self.claim_type.trim().is_empty() {
            return Err(ClaimProofError::InvalidInput(
                "claimType must not be empty".to_string(),
            ));
        }
        normalize_address(&self.holder_address)
            .map_err(|e| ClaimProofError::InvalidInput(format!("holderAddress: {e}")))?;
        normalize_address(&self.issuer_address)
            .map_err(|e| ClaimProofError::InvalidInput(format!("issuerAddress: {e}")))?;
        if self.attribute_data.is_empty() {
            return Err(ClaimProofError::InvalidInput(
                "attributeData must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn strip_hex_prefix(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

/// Validate and normalize an account address to `0x` + 40 lowercase hex chars.
///
/// # Errors
/// Returns an error if the address is not exactly 20 bytes of hex, contains
/// non-hex characters, or is the all-zero address.
pub fn normalize_address(address: &str) -> Result<String> {
    let stripped = strip_hex_prefix(address);

    if stripped.len() != ADDRESS_HEX_LENGTH {
        return Err(ClaimProofError::InvalidInput(format!(
            "address must be {} hex characters (got {})",
            ADDRESS_HEX_LENGTH,
            stripped.len()
        )));
    }
    if !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ClaimProofError::InvalidInput(
            "address contains non-hex characters".to_string(),
        ));
    }
    if stripped.chars().all(|c| c == '0') {
        return Err(ClaimProofError::InvalidInput(
            "address must not be the zero address".to_string(),
        ));
    }

    Ok(format!("0x{}", stripped.to_ascii_lowercase()))
}

/// Quick shape check without normalization.
pub fn validate_address(address: &str) -> bool {
    normalize_address(address).is_ok()
}

/// Expand a 20-byte address into the 32-byte form used in public signals.
///
/// The address is right-aligned and zero-padded on the left, matching the
/// field-element packing an on-chain verifier expects.
pub fn address_to_field(address: &str) -> Result<[u8; 32]> {
    let normalized = normalize_address(address)?;
    let bytes = hex::decode(&normalized[2..])?;

    let mut field = [0u8; 32];
    field[12..].copy_from_slice(&bytes);
    Ok(field)
}
