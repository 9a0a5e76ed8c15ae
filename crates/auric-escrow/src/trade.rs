// SPDX-License-Identifier: BUSL-1.1
//! Trade records and the lifecycle state machine.
//!
//! The legal transition graph lives in one place, [`next_status`], so it
//! can be audited and tested exhaustively. Service entry points ask it for
//! the successor status and never flip flags ad hoc.

use serde::{Deserialize, Serialize};

use auric_core::{AccountId, Timestamp, TradeId};

use crate::error::EscrowError;

/// Lifecycle status of a trade. Monotonic: once a status is reached it is
/// never unset, and the two bracketed terminals end the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeStatus {
    /// Created by a trade-desk proof; amounts and parties are fixed.
    Registered,
    /// Confirmed by an administrator.
    Valid,
    /// The trade cap is held in escrow custody.
    Paid,
    /// Ready for release. No funds moved by this step.
    Finished,
    /// Settled to the seller and fee recipient. Terminal.
    Released,
    /// Force-resolved by an administrator after the window. Terminal.
    Resolved,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Valid => "valid",
            Self::Paid => "paid",
            Self::Finished => "finished",
            Self::Released => "released",
            Self::Resolved => "resolved",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Resolved)
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested lifecycle transition. Registration creates the record and
/// is not a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Validate,
    Pay,
    Finish,
    Release,
    Resolve,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Pay => "pay",
            Self::Finish => "finish",
            Self::Release => "release",
            Self::Resolve => "resolve",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The successor status for a requested transition, or
/// [`EscrowError::InvalidTradeState`] if the graph does not permit it.
pub fn next_status(current: TradeStatus, action: TradeAction) -> Result<TradeStatus, EscrowError> {
    let next = match (current, action) {
        (TradeStatus::Registered, TradeAction::Validate) => TradeStatus::Valid,
        (TradeStatus::Valid, TradeAction::Pay) => TradeStatus::Paid,
        (TradeStatus::Paid, TradeAction::Finish) => TradeStatus::Finished,
        (TradeStatus::Finished, TradeAction::Release) => TradeStatus::Released,
        (TradeStatus::Paid | TradeStatus::Finished, TradeAction::Resolve) => TradeStatus::Resolved,
        (status, action) => return Err(EscrowError::InvalidTradeState { status, action }),
    };
    Ok(next)
}

/// Outcome of an administrative resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub favor_seller: bool,
    pub reason: String,
}

/// An escrow trade record. Created at registration, mutated through the
/// lifecycle, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub seller: AccountId,
    pub buyer: AccountId,
    /// Gross amount held in custody between pay and settlement.
    pub trade_cap: u64,
    /// Net amount owed to the seller at settlement.
    pub sellers_part: u64,
    /// Opaque document references bound into the registration proof.
    pub evidence_refs: Vec<String>,
    pub status: TradeStatus,
    pub registered_at: Timestamp,
    /// Earliest instant an administrator may force-resolve.
    pub resolution_window_end: Timestamp,
    pub resolution: Option<Resolution>,
    pub updated_at: Timestamp,
}

impl Trade {
    /// The settlement fee agreed at registration.
    pub fn settlement_fee(&self) -> u64 {
        self.trade_cap - self.sellers_part
    }
}

/// Events appended to the escrow log on every state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum TradeEvent {
    Registered {
        trade_id: TradeId,
        seller: AccountId,
        buyer: AccountId,
        trade_cap: u64,
        sellers_part: u64,
        resolution_window_end: Timestamp,
    },
    Validated {
        trade_id: TradeId,
    },
    Paid {
        trade_id: TradeId,
        buyer: AccountId,
        amount: u64,
    },
    Finished {
        trade_id: TradeId,
    },
    Released {
        trade_id: TradeId,
        seller_amount: u64,
        fee_amount: u64,
    },
    Resolved {
        trade_id: TradeId,
        favor_seller: bool,
        amount: u64,
        reason: String,
    },
    TradeDeskUpdated {
        user: AccountId,
        enabled: bool,
    },
}
