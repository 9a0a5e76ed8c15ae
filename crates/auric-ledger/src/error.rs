//! Ledger error types.

use thiserror::Error;

use auric_access::Role;
use auric_core::AccountId;
use auric_proof::ProofError;

/// Errors from ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The account does not hold enough balance for the operation.
    #[error("insufficient balance for {account}: has {balance}, needs {required}")]
    InsufficientBalance {
        account: AccountId,
        balance: u64,
        required: u64,
    },

    /// The spender's allowance does not cover the operation.
    #[error("insufficient allowance for {spender} on {owner}: has {allowance}, needs {required}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        allowance: u64,
        required: u64,
    },

    /// The commission rate is outside `[0, 10000]` basis points.
    #[error("commission out of range: {0} bps (max 10000)")]
    CommissionOutOfRange(u32),

    /// The caller does not hold the role the operation requires.
    #[error("account {account} requires role {role}")]
    RoleRequired { account: AccountId, role: Role },

    /// Minting would overflow the total supply.
    #[error("supply overflow: {supply} + {amount}")]
    SupplyOverflow { supply: u64, amount: u64 },

    /// A delegated entry point was handed an operation of the wrong kind.
    #[error("unexpected operation: expected {expected}, got {got}")]
    UnexpectedOperation {
        expected: &'static str,
        got: &'static str,
    },

    /// Proof verification failed.
    #[error(transparent)]
    Proof(#[from] ProofError),
}
