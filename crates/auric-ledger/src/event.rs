//! Ledger events.

use serde::{Deserialize, Serialize};

use auric_core::AccountId;

/// Events appended to the ledger's log on every state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    Minted {
        to: AccountId,
        amount: u64,
        evidence_refs: Vec<String>,
    },
    Burned {
        from: AccountId,
        amount: u64,
        evidence_refs: Vec<String>,
    },
    Transferred {
        from: AccountId,
        to: AccountId,
        amount: u64,
        fee: u64,
    },
    Approved {
        owner: AccountId,
        spender: AccountId,
        amount: u64,
    },
    DelegatedApproval {
        owner: AccountId,
        spender: AccountId,
        amount: u64,
        network_fee: u64,
        relayer: AccountId,
    },
    DelegatedTransfer {
        owner: AccountId,
        to: AccountId,
        amount: u64,
        fee: u64,
        network_fee: u64,
        relayer: AccountId,
    },
    CommissionChanged {
        bps: u32,
    },
    FeeExemptionChanged {
        account: AccountId,
        exempt: bool,
    },
    AllowedServiceChanged {
        account: AccountId,
        allowed: bool,
    },
}
