//! Escrow error types.

use thiserror::Error;

use auric_core::{AccountId, Timestamp, TradeId};
use auric_ledger::LedgerError;
use auric_proof::ProofError;

use crate::trade::{TradeAction, TradeStatus};

/// Errors from escrow operations.
#[derive(Error, Debug)]
pub enum EscrowError {
    /// Registration reused an existing trade id.
    #[error("trade already exists: {0}")]
    TradeAlreadyExists(TradeId),

    /// No trade with this id.
    #[error("trade not found: {0}")]
    TradeNotFound(TradeId),

    /// The transition is not legal from the trade's current status.
    #[error("invalid trade state: cannot {action} a trade in status {status}")]
    InvalidTradeState {
        status: TradeStatus,
        action: TradeAction,
    },

    /// Resolution attempted before the window elapsed.
    #[error("too early to resolve: window ends at {window_end}")]
    TooEarlyToResolve { window_end: Timestamp },

    /// The net seller amount exceeds the gross trade amount.
    #[error("sellers part {sellers_part} exceeds trade cap {trade_cap}")]
    SellersPartExceedsCap { sellers_part: u64, trade_cap: u64 },

    /// The operation names a different buyer than the trade record.
    #[error("buyer mismatch: operation names {operation_buyer}, trade has {trade_buyer}")]
    BuyerMismatch {
        operation_buyer: AccountId,
        trade_buyer: AccountId,
    },

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
