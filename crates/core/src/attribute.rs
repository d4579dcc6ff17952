//! Typed attribute values and numeric normalization.
//!
//! Credential attributes arrive from the credential store as loosely typed
//! values (numbers, strings, booleans). This module gives them a small
//! tagged representation and one shared parser for the messy numeric forms
//! that show up on Indian documents: currency symbols, Western and Indian
//! digit grouping ("5,00,000" = 500000), and percent signs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single credential attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Numeric value (income, marks, thresholds)
    Number(f64),
    /// Boolean flag (disability status)
    Flag(bool),
    /// Free-form text (caste category, region, raw document strings)
    Text(String),
}

impl AttributeValue {
    /// Interpret this value as a number, normalizing text forms.
    ///
    /// `Text` values go through [`parse_numeric`], so `"₹5,00,000"` and
    /// `"500000"` both yield `500000.0`. `Flag` values have no numeric
    /// interpretation.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(s) => parse_numeric(s),
            AttributeValue::Flag(_) => None,
        }
    }

    /// Interpret this value as a boolean flag.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AttributeValue::Flag(b) => Some(*b),
            AttributeValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            AttributeValue::Number(_) => None,
        }
    }

    /// Interpret this value as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Flag(b)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

/// Ordered attribute name → value mapping carried by a claim request.
///
/// Insertion order is preserved so the digest is deterministic for a given
/// caller-supplied ordering. Re-inserting an existing name replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeData(Vec<(String, AttributeValue)>);

impl AttributeData {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an attribute, returning `self` for chaining.
    pub fn with(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an attribute.
    pub fn insert(&mut self, name: &str, value: impl Into<AttributeValue>) {
        let value = value.into();
        if let Some(entry) = self.0.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
        } else {
            self.0.push((name.to_string(), value));
        }
    }

    /// Look up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Numeric view of an attribute, if present and parseable.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttributeValue::as_number)
    }

    /// Boolean view of an attribute, if present.
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(AttributeValue::as_flag)
    }

    /// Text view of an attribute, if present.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttributeValue::as_text)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, AttributeValue)> {
        self.0.iter()
    }

    /// One-way digest over the ordered entries.
    ///
    /// Used to fold the private attribute values into the proof's signal
    /// without exposing them: only the SHA-256 digest ever leaves this
    /// module. Entries are separated and type-tagged so that distinct maps
    /// cannot collide through concatenation.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"claimproof.attributes.v1");
        for (name, value) in &self.0 {
            hasher.update([0x1e]);
            hasher.update(name.as_bytes());
            hasher.update([0x1f]);
            match value {
                AttributeValue::Number(n) => {
                    hasher.update([b'n']);
                    hasher.update(n.to_le_bytes());
                }
                AttributeValue::Flag(b) => {
                    hasher.update([b'f']);
                    hasher.update([*b as u8]);
                }
                AttributeValue::Text(s) => {
                    hasher.update([b't']);
                    hasher.update(s.as_bytes());
                }
            }
        }
        hasher.finalize().into()
    }
}

/// Extract the first number from a free-form string.
///
/// Tolerates currency symbols (₹, Rs., INR), thousands separators in both
/// Western ("500,000") and Indian ("5,00,000") grouping, surrounding text
/// ("Income < 250000"), and percent signs ("85%"). Returns `None` when the
/// string carries no digits.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let mut cleaned = String::new();
    let mut seen_digit = false;

    for c in raw.chars() {
        match c {
            '0'..='9' => {
                seen_digit = true;
                cleaned.push(c);
            }
            // Grouping separators are dropped wherever they appear
            ',' if seen_digit => {}
            '.' if seen_digit => cleaned.push('.'),
            '-' if !seen_digit && cleaned.is_empty() => cleaned.push('-'),
            // Any other character after the number ends it
            _ if seen_digit => break,
            // Still scanning past the prefix (currency symbol, label text).
            // A stray '-' collected before unrelated text is discarded.
            _ => cleaned.clear(),
        }
    }

    if !seen_digit {
        return None;
    }

    cleaned.parse::<f64>().ok()
}
