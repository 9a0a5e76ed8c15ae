//! Custody error types.

use thiserror::Error;

use auric_access::Role;
use auric_core::{AccountId, SaleRequestId};
use auric_ledger::LedgerError;
use auric_proof::ProofError;

use crate::sale::SaleStatus;

/// Errors from custody operations.
#[derive(Error, Debug)]
pub enum CustodyError {
    /// A direct (non-signature) operation exceeded its per-call cap.
    #[error("amount {amount} exceeds limit {limit}")]
    AmountExceedsLimit { amount: u64, limit: u64 },

    /// No sale request with this id.
    #[error("sale request not found: {0}")]
    RequestNotFound(SaleRequestId),

    /// A sale request with this id already exists.
    #[error("sale request already exists: {0}")]
    RequestAlreadyExists(SaleRequestId),

    /// The sale request was already approved or rejected.
    #[error("sale request {request_id} already processed: {status}")]
    RequestAlreadyProcessed {
        request_id: SaleRequestId,
        status: SaleStatus,
    },

    /// The caller does not hold the role the operation requires.
    #[error("account {account} requires role {role}")]
    RoleRequired { account: AccountId, role: Role },

    /// An entry point was handed an operation of the wrong kind.
    #[error("unexpected operation: expected {expected}, got {got}")]
    UnexpectedOperation {
        expected: &'static str,
        got: &'static str,
    },

    /// Proof verification failed.
    #[error(transparent)]
    Proof(#[from] ProofError),

    /// A ledger movement failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
