//! Sale request records.

use serde::{Deserialize, Serialize};

use auric_core::{AccountId, SaleRequestId, Timestamp};

/// Status of a sale request. `Approved` and `Rejected` are terminal; a
/// request resolves exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleStatus {
    Pending,
    Approved,
    Rejected,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delegated sale request. The custodied `amount` stays with the
/// custody account on approval and returns to the requester on rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRequest {
    pub id: SaleRequestId,
    pub requester: AccountId,
    pub amount: u64,
    /// Relayer compensation the requester signed for.
    pub network_fee: u64,
    pub status: SaleStatus,
    pub created_at: Timestamp,
    pub processed_at: Option<Timestamp>,
}

/// Events appended to the custody log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum CustodyEvent {
    Bought {
        recipient: AccountId,
        amount: u64,
        via_signature: bool,
    },
    Sold {
        seller: AccountId,
        amount: u64,
    },
    SaleRequested {
        request_id: SaleRequestId,
        requester: AccountId,
        amount: u64,
        network_fee: u64,
    },
    SaleApproved {
        request_id: SaleRequestId,
        amount: u64,
    },
    SaleRejected {
        request_id: SaleRequestId,
        requester: AccountId,
        amount: u64,
    },
}
