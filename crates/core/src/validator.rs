//! Attribute integrity gate.
//!
//! Refuses to let the proof engine construct a proof for a predicate that
//! is false given the holder's actual attribute values. A zero-knowledge
//! proof everyone can verify is catastrophic if it encodes a false
//! statement, so this check runs before any group, nullifier, or
//! cryptographic work, and an unrecognized predicate family fails closed.
//!
//! Failure messages name actual vs. required values for the caller; they
//! never travel inside an exported proof.

use crate::attribute::{parse_numeric, AttributeData};
use crate::claim::ClaimFamily;
use crate::error::{ClaimProofError, Result};

/// Documented fallback ceiling for income claims that carry no explicit
/// threshold (₹2.5 lakh, the common scheme eligibility line).
pub const DEFAULT_INCOME_THRESHOLD: f64 = 250_000.0;

/// Recognized caste categories, compared after uppercase normalization.
const CASTE_CATEGORIES: [&str; 4] = ["SC", "ST", "OBC", "GENERAL"];

/// Check that the claimed predicate is actually true of the attribute data.
///
/// Pure read/compute; no side effects. The threshold for income and marks
/// claims is resolved in order from:
/// 1. an explicit `threshold` attribute,
/// 2. a numeric literal embedded in the claim type (e.g. "Income < 250000"),
/// 3. for income only, [`DEFAULT_INCOME_THRESHOLD`].
///
/// # Errors
/// Returns [`ClaimProofError::ClaimIntegrity`] when the predicate is false,
/// a required attribute is missing, or the claim family is unrecognized.
pub fn validate_claim(claim_type: &str, data: &AttributeData) -> Result<()> {
    let family = ClaimFamily::detect(claim_type).ok_or_else(|| {
        ClaimProofError::ClaimIntegrity(format!(
            "unrecognized claim family '{claim_type}'; refusing to prove"
        ))
    })?;

    log::debug!("Validating {} claim", family.name());

    match family {
        ClaimFamily::IncomeThreshold => validate_income(claim_type, data),
        ClaimFamily::MarksThreshold => validate_marks(claim_type, data),
        ClaimFamily::CasteVerification => validate_caste(data),
        ClaimFamily::DisabilityStatus => validate_disability(data),
        ClaimFamily::RegionEligibility => validate_region(data),
    }
}

fn integrity(msg: String) -> ClaimProofError {
    ClaimProofError::ClaimIntegrity(msg)
}

fn required_number(data: &AttributeData, names: &[&str], family: &str) -> Result<f64> {
    for name in names {
        if let Some(value) = data.number(name) {
            return Ok(value);
        }
    }
    Err(integrity(format!(
        "{family} claim is missing a numeric '{}' attribute",
        names[0]
    )))
}

fn resolve_threshold(claim_type: &str, data: &AttributeData, default: Option<f64>) -> Option<f64> {
    data.number("threshold")
        .or_else(|| parse_numeric(claim_type))
        .or(default)
}

/// Income predicate: actual strictly below the ceiling.
fn validate_income(claim_type: &str, data: &AttributeData) -> Result<()> {
    let actual = required_number(data, &["income", "actual"], "income")?;
    let threshold = resolve_threshold(claim_type, data, Some(DEFAULT_INCOME_THRESHOLD))
        .ok_or_else(|| integrity("income claim has no resolvable threshold".to_string()))?;

    if actual < threshold {
        log::debug!("✓ income predicate holds");
        Ok(())
    } else {
        Err(integrity(format!(
            "income {actual} is not below threshold {threshold}"
        )))
    }
}

/// Marks predicate: actual at or above the floor. Opposite direction from
/// income, and there is no documented default floor, so a missing threshold
/// fails closed.
fn validate_marks(claim_type: &str, data: &AttributeData) -> Result<()> {
    let actual = required_number(data, &["marks", "actual"], "marks")?;
    let threshold = resolve_threshold(claim_type, data, None)
        .ok_or_else(|| integrity("marks claim has no resolvable threshold".to_string()))?;

    if actual >= threshold {
        log::debug!("✓ marks predicate holds");
        Ok(())
    } else {
        Err(integrity(format!(
            "marks {actual} is below required threshold {threshold}"
        )))
    }
}

fn normalize_caste(raw: &str) -> Result<String> {
    let upper = raw.trim().to_ascii_uppercase();
    let canonical = if upper == "GEN" { "GENERAL".to_string() } else { upper };

    if CASTE_CATEGORIES.contains(&canonical.as_str()) {
        Ok(canonical)
    } else {
        Err(integrity(format!("unknown caste category '{raw}'")))
    }
}

/// Caste predicate: exact category match after normalization.
fn validate_caste(data: &AttributeData) -> Result<()> {
    let actual_raw = data
        .text("caste")
        .ok_or_else(|| integrity("caste claim is missing a 'caste' attribute".to_string()))?;
    let claimed_raw = data
        .text("claimedCaste")
        .or_else(|| data.text("claimed"))
        .ok_or_else(|| {
            integrity("caste claim is missing a 'claimedCaste' attribute".to_string())
        })?;

    let actual = normalize_caste(actual_raw)?;
    let claimed = normalize_caste(claimed_raw)?;

    if actual == claimed {
        log::debug!("✓ caste predicate holds");
        Ok(())
    } else {
        Err(integrity(format!(
            "caste '{actual}' does not match claimed '{claimed}'"
        )))
    }
}

/// Disability predicate: flag equality. A claim without an explicit
/// `claimedDisability` asserts the flag is set.
fn validate_disability(data: &AttributeData) -> Result<()> {
    let actual = data.flag("disability").ok_or_else(|| {
        integrity("disability claim is missing a boolean 'disability' attribute".to_string())
    })?;
    let claimed = data
        .flag("claimedDisability")
        .or_else(|| data.flag("claimed"))
        .unwrap_or(true);

    if actual == claimed {
        log::debug!("✓ disability predicate holds");
        Ok(())
    } else {
        Err(integrity(format!(
            "disability status {actual} does not match claimed {claimed}"
        )))
    }
}

/// Region predicate: trimmed, case-insensitive equality.
fn validate_region(data: &AttributeData) -> Result<()> {
    let actual_raw = data
        .text("region")
        .or_else(|| data.text("state"))
        .ok_or_else(|| integrity("region claim is missing a 'region' attribute".to_string()))?;
    let claimed_raw = data
        .text("claimedRegion")
        .or_else(|| data.text("claimed"))
        .ok_or_else(|| {
            integrity("region claim is missing a 'claimedRegion' attribute".to_string())
        })?;

    let actual = actual_raw.trim().to_ascii_uppercase();
    let claimed = claimed_raw.trim().to_ascii_uppercase();

    if actual == claimed {
        log::debug!("✓ region predicate holds");
        Ok(())
    } else {
        Err(integrity(format!(
            "region '{actual}' does not match claimed '{claimed}'"
        )))
    }
}
