//! Canonical serialization for proof messages and content digests.
//!
//! `CanonicalBytes` is the sole construction path for bytes that get signed
//! or hashed anywhere in the platform. The inner field is private; the only
//! constructor rejects floats and serializes with RFC 8785 (JSON
//! Canonicalization Scheme) semantics — sorted keys, compact separators,
//! deterministic output.
//!
//! ## Security Invariant
//!
//! A proof signature authorizes exactly the parameters the signer saw.
//! If two call sites could serialize the same operation differently, a
//! relayer could shift parameters without invalidating the signature.
//! Requiring `&CanonicalBytes` at every signing and hashing boundary makes
//! that split impossible at compile time.

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;

/// Bytes produced exclusively by JCS canonicalization with float rejection.
///
/// # Invariants
///
/// - The only constructor is [`CanonicalBytes::new()`].
/// - Input containing float numbers is rejected, not coerced.
/// - Output uses sorted keys and compact separators (RFC 8785).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FloatRejected`] if the value tree contains a
    /// float, or [`CoreError::Serialization`] if JCS serialization fails.
    pub fn new(value: &impl Serialize) -> Result<Self, CoreError> {
        let tree = serde_json::to_value(value)?;
        reject_floats(&tree)?;
        let text = serde_jcs::to_string(&tree)?;
        Ok(Self(text.into_bytes()))
    }

    /// Access the canonical bytes for signing or digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Walk the value tree and reject any number that is only representable as
/// a float. Integers (i64/u64 range) pass through.
fn reject_floats(value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Number(n) => {
            if n.is_f64() && !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CoreError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(reject_floats),
        Value::Object(map) => map.values().try_for_each(reject_floats),
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
    }
}
