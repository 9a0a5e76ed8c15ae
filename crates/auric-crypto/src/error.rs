//! Cryptographic error types.

use thiserror::Error;

/// Errors from key handling and signature verification.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// A signature did not verify against the given key and message.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// A key could not be parsed or is not a valid curve point.
    #[error("key error: {0}")]
    KeyError(String),
}
