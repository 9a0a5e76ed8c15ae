//! Replay protection for proof tokens.

use dashmap::DashSet;

use crate::error::ProofError;
use crate::token::ProofToken;

/// The set of proof tokens already consumed by a service.
///
/// Each proof-consuming service owns its guard; cross-service replay is
/// already impossible because operation discriminators differ. Consumed
/// tokens are retained for the life of the ledger — a token is never
/// eligible for reuse.
#[derive(Debug, Default)]
pub struct ReplayGuard {
    consumed: DashSet<ProofToken>,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a token, failing if it was ever consumed before.
    ///
    /// The insert is atomic: of two calls racing on the same token, exactly
    /// one succeeds and the other observes [`ProofError::ProofReplayed`].
    pub fn consume(&self, token: &ProofToken) -> Result<(), ProofError> {
        if self.consumed.insert(*token) {
            Ok(())
        } else {
            Err(ProofError::ProofReplayed(*token))
        }
    }

    /// Whether a token has been consumed.
    pub fn is_consumed(&self, token: &ProofToken) -> bool {
        self.consumed.contains(token)
    }

    /// Number of consumed tokens.
    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }
}
