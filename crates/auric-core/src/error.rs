//! Foundational error types.
//!
//! All errors in the workspace use `thiserror` derive enums; variants carry
//! the state a caller needs to act on the failure.

use thiserror::Error;

/// Errors produced by the foundational types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Float values are rejected from canonical input. Monetary amounts are
    /// integers (minor units) or strings, never floats, because float
    /// serialization is not byte-deterministic across implementations.
    #[error("float values are not permitted in canonical input; encode amounts as integers or strings: {0}")]
    FloatRejected(f64),

    /// Canonical JSON serialization failed.
    #[error("canonical serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A timestamp string could not be parsed or violated the UTC-only rule.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// An account identifier could not be parsed.
    #[error("invalid account id: {0}")]
    InvalidAccountId(String),

    /// A trade identifier was empty or over-long.
    #[error("invalid trade id: {0:?}")]
    InvalidTradeId(String),
}
