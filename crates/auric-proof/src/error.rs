//! Proof verification errors.

use thiserror::Error;

use auric_core::{AccountId, CoreError};

use crate::token::ProofToken;

/// Errors surfaced by the proof verification pipeline.
///
/// Each variant tells the off-chain caller what to do next: fix the
/// signature (`InvalidProof`), use an authorized key
/// (`UnauthorizedSigner`), or resubmit with a fresh token
/// (`ProofReplayed`).
#[derive(Error, Debug)]
pub enum ProofError {
    /// The signature does not verify against the parameters actually
    /// supplied — either it was forged or a parameter was substituted
    /// after signing.
    #[error("invalid proof: signature does not match the supplied parameters")]
    InvalidProof,

    /// The recovered signer does not satisfy the operation's requirement.
    #[error("unauthorized signer {signer}: requires {required}")]
    UnauthorizedSigner {
        signer: AccountId,
        required: String,
    },

    /// The proof token was already consumed.
    #[error("proof token already consumed: {0}")]
    ProofReplayed(ProofToken),

    /// The verifying service is not whitelisted for signature checks.
    #[error("service account {0} is not whitelisted for signature checks")]
    ServiceNotWhitelisted(AccountId),

    /// The operation payload could not be canonicalized.
    #[error(transparent)]
    Canonicalization(#[from] CoreError),
}
