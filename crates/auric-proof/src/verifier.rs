//! The proof verification pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use auric_access::{Role, RoleProvider};
use auric_core::AccountId;
use auric_crypto::{PublicKey, Signature, SigningKeyPair};

use crate::error::ProofError;
use crate::operation::Operation;
use crate::replay::ReplayGuard;

/// A signed proof: the signer's public key and the signature over the
/// operation's canonical payload.
///
/// The public key travels with the proof rather than being recovered from
/// the signature; the verifier derives the acting account from it after
/// the signature checks out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proof {
    pub signer: PublicKey,
    pub signature: Signature,
}

impl Proof {
    /// Sign an operation with a key pair. Client-side helper; the platform
    /// only ever verifies.
    pub fn sign(keys: &SigningKeyPair, operation: &Operation) -> Result<Self, ProofError> {
        let payload = operation.signing_payload()?;
        Ok(Self {
            signer: keys.public_key(),
            signature: keys.sign(&payload),
        })
    }
}

/// What the signer of an operation must be.
#[derive(Debug, Clone)]
pub enum SignerRequirement {
    /// Signer must hold this role.
    Role(Role),
    /// Signer must hold at least one of these roles.
    AnyRole(&'static [Role]),
    /// Signer must be exactly this account (party-specific actions).
    Account(AccountId),
    /// Any signer is acceptable: the signature itself identifies the acting
    /// account (delegated ledger operations on the signer's own funds).
    AnySigner,
}

impl SignerRequirement {
    fn is_satisfied_by(&self, signer: &AccountId, roles: &dyn RoleProvider) -> bool {
        match self {
            Self::Role(role) => roles.has_role(signer, *role),
            Self::AnyRole(options) => options.iter().any(|role| roles.has_role(signer, *role)),
            Self::Account(account) => signer == account,
            Self::AnySigner => true,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Role(role) => format!("role {role}"),
            Self::AnyRole(options) => {
                let names: Vec<_> = options.iter().map(|r| r.as_str()).collect();
                format!("one of roles [{}]", names.join(", "))
            }
            Self::Account(account) => format!("account {account}"),
            Self::AnySigner => "any signer".to_string(),
        }
    }
}

/// Verifies signed proofs for one service.
///
/// Owned by each proof-consuming service together with that service's
/// replay guard. Verification is a pure gate: its only side effect is
/// recording the consumed token, and that happens last — after the
/// signature and authorization checks — and before the caller moves any
/// value, so a reentrant or duplicate submission is rejected by the guard
/// rather than re-executing the effect.
pub struct ProofVerifier {
    roles: Arc<dyn RoleProvider>,
    replay: ReplayGuard,
    service_account: AccountId,
}

impl ProofVerifier {
    /// Create a verifier for the service operating under `service_account`.
    pub fn new(roles: Arc<dyn RoleProvider>, service_account: AccountId) -> Self {
        Self {
            roles,
            replay: ReplayGuard::new(),
            service_account,
        }
    }

    /// Authenticate a proof without consuming its token.
    ///
    /// Pipeline order:
    /// 1. the service itself must hold [`Role::SignatureWhitelisted`];
    /// 2. the signature must verify over the operation's canonical payload
    ///    (any substituted parameter fails here — [`ProofError::InvalidProof`]);
    /// 3. the signer account must satisfy `requirement`
    ///    ([`ProofError::UnauthorizedSigner`]);
    /// 4. the token must not already be consumed
    ///    ([`ProofError::ProofReplayed`]).
    ///
    /// Services with further fallible preconditions (balances, trade state)
    /// call this first, run their checks, then [`consume`](Self::consume) —
    /// so a rejected call leaves the token unburned, and the token is still
    /// consumed before any value moves.
    pub fn authenticate(
        &self,
        operation: &Operation,
        proof: &Proof,
        requirement: &SignerRequirement,
    ) -> Result<AccountId, ProofError> {
        if !self
            .roles
            .has_role(&self.service_account, Role::SignatureWhitelisted)
        {
            return Err(ProofError::ServiceNotWhitelisted(self.service_account));
        }

        let payload = operation.signing_payload()?;
        auric_crypto::verify(&payload, &proof.signature, &proof.signer)
            .map_err(|_| ProofError::InvalidProof)?;

        let signer = proof.signer.account_id();
        if !requirement.is_satisfied_by(&signer, self.roles.as_ref()) {
            return Err(ProofError::UnauthorizedSigner {
                signer,
                required: requirement.describe(),
            });
        }

        let token = operation.token();
        if self.replay.is_consumed(token) {
            return Err(ProofError::ProofReplayed(*token));
        }
        Ok(signer)
    }

    /// Consume an operation's token. Fails with
    /// [`ProofError::ProofReplayed`] if it was ever consumed.
    pub fn consume(&self, operation: &Operation) -> Result<(), ProofError> {
        self.replay.consume(operation.token())
    }

    /// Authenticate and immediately consume the token.
    ///
    /// The common path for operations with no further preconditions.
    /// Returns the signer's account id on success.
    pub fn verify(
        &self,
        operation: &Operation,
        proof: &Proof,
        requirement: &SignerRequirement,
    ) -> Result<AccountId, ProofError> {
        let signer = self.authenticate(operation, proof, requirement)?;
        self.replay.consume(operation.token())?;
        Ok(signer)
    }

    /// The replay guard, exposed for inspection.
    pub fn replay_guard(&self) -> &ReplayGuard {
        &self.replay
    }
}

impl std::fmt::Debug for ProofVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofVerifier")
            .field("service_account", &self.service_account)
            .field("consumed_tokens", &self.replay.len())
            .finish()
    }
}
