//! Idempotency key generation.
//!
//! A key is `{seed}-{timestamp_millis}-{suffix}`. The seed is derived from the
//! request content so keys for the same draft share a prefix; the timestamp and
//! random suffix keep every issued key unique.

use std::fmt;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Longest slug taken from prompt text.
const MAX_SLUG_LEN: usize = 24;

/// Hex digits of the field digest used as a seed.
const DIGEST_PREFIX_LEN: usize = 12;

/// A request idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Builds a key from its parts.
    #[must_use]
    pub fn from_parts(seed: &str, timestamp_millis: i64, suffix: u32) -> Self {
        Self(format!("{seed}-{timestamp_millis}-{suffix:08x}"))
    }

    /// Issues a fresh key for a seed using the current time and a random
    /// suffix.
    #[must_use]
    pub fn generate(seed: &str) -> Self {
        Self::from_parts(seed, Utc::now().timestamp_millis(), rand::random())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seed for a natural-language prompt: a lowercase ASCII slug of the text.
#[must_use]
pub fn prompt_seed(prompt: &str) -> String {
    let mut slug = String::new();
    for ch in prompt.chars() {
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "prompt".to_string()
    } else {
        slug.to_string()
    }
}

/// Seed for a structured field set: a digest prefix over the document type and
/// the fields in key order.
#[must_use]
pub fn fields_seed(doc_type: Option<&str>, fields: &Map<String, Value>) -> String {
    format!("doc-{}", digest_prefix(doc_type.unwrap_or_default(), &Value::Object(fields.clone())))
}

/// Seed for any serializable payload, under a label.
#[must_use]
pub fn payload_seed<T: Serialize>(label: &str, payload: &T) -> String {
    let value = serde_json::to_value(payload).unwrap_or(Value::Null);
    format!("{label}-{}", digest_prefix(label, &value))
}

fn digest_prefix(salt: &str, value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(value.to_string().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..DIGEST_PREFIX_LEN].to_string()
}
