// SPDX-License-Identifier: BUSL-1.1
//! Typed operation payloads for proof signatures.
//!
//! Each privileged entry point has its own variant with its own parameter
//! set. The `kind` tag is serialized into the canonical payload, so the
//! operation discriminator is part of what gets signed — a signature over
//! a `ledger.approve.v1` payload can never be replayed against
//! `ledger.transfer.v1`, whatever the other fields are.
//!
//! Every field that affects a state change is part of the payload. Altering
//! any one of them after signing produces a different canonical byte
//! sequence and the signature no longer verifies.

use serde::{Deserialize, Serialize};

use auric_core::{
    sha256_digest, AccountId, CanonicalBytes, ContentDigest, SaleRequestId, TradeId,
};

use crate::error::ProofError;
use crate::token::ProofToken;

/// A privileged operation, exactly as its signer authorized it.
///
/// The `network_fee` fields carry the relayer compensation the signer
/// agreed to pay for submission; operations signed by platform operators
/// (buy, process-sale, trade administration) carry none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Operation {
    /// Set a spender allowance on the signer's ledger balance.
    #[serde(rename = "ledger.approve.v1")]
    DelegatedApprove {
        token: ProofToken,
        network_fee: u64,
        spender: AccountId,
        amount: u64,
    },

    /// Move the signer's funds to a recipient.
    #[serde(rename = "ledger.transfer.v1")]
    DelegatedTransfer {
        token: ProofToken,
        network_fee: u64,
        to: AccountId,
        amount: u64,
    },

    /// Create an escrow trade record.
    #[serde(rename = "escrow.register.v1")]
    RegisterTrade {
        token: ProofToken,
        trade_id: TradeId,
        evidence_refs: Vec<String>,
        seller: AccountId,
        buyer: AccountId,
        trade_cap: u64,
        sellers_part: u64,
        resolution_delay_secs: u64,
    },

    /// Mark a registered trade as validated.
    #[serde(rename = "escrow.validate.v1")]
    ValidateTrade {
        token: ProofToken,
        trade_id: TradeId,
        evidence_refs: Vec<String>,
    },

    /// Pull the trade cap from the buyer into escrow custody.
    #[serde(rename = "escrow.pay.v1")]
    PayTrade {
        token: ProofToken,
        trade_id: TradeId,
        evidence_refs: Vec<String>,
        buyer: AccountId,
    },

    /// Mark a paid trade as finished and ready for release.
    #[serde(rename = "escrow.finish.v1")]
    FinishTrade {
        token: ProofToken,
        trade_id: TradeId,
        evidence_refs: Vec<String>,
    },

    /// Release custodied funds to the seller and the fee recipient.
    #[serde(rename = "escrow.release.v1")]
    ReleaseTrade {
        token: ProofToken,
        trade_id: TradeId,
        evidence_refs: Vec<String>,
        buyer: AccountId,
    },

    /// Force-resolve a disputed trade after the resolution window.
    #[serde(rename = "escrow.resolve.v1")]
    ResolveTrade {
        token: ProofToken,
        trade_id: TradeId,
        evidence_refs: Vec<String>,
        favor_seller: bool,
        reason: String,
    },

    /// Grant or revoke the trade-desk role.
    #[serde(rename = "escrow.trade-desk.v1")]
    SetTradeDesk {
        token: ProofToken,
        user: AccountId,
        enabled: bool,
    },

    /// Pay out custody funds to a recipient, above the direct-path cap.
    #[serde(rename = "custody.buy.v1")]
    BuyWithSignature {
        token: ProofToken,
        recipient: AccountId,
        amount: u64,
    },

    /// Pre-authorize a delegated sell into custody.
    #[serde(rename = "custody.sale-request.v1")]
    RequestSale {
        token: ProofToken,
        network_fee: u64,
        requester: AccountId,
        amount: u64,
        request_id: SaleRequestId,
    },

    /// Approve or reject a pending sale request.
    #[serde(rename = "custody.sale-process.v1")]
    ProcessSale {
        token: ProofToken,
        request_id: SaleRequestId,
        approve: bool,
    },
}

impl Operation {
    /// The discriminator string serialized into the signed payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DelegatedApprove { .. } => "ledger.approve.v1",
            Self::DelegatedTransfer { .. } => "ledger.transfer.v1",
            Self::RegisterTrade { .. } => "escrow.register.v1",
            Self::ValidateTrade { .. } => "escrow.validate.v1",
            Self::PayTrade { .. } => "escrow.pay.v1",
            Self::FinishTrade { .. } => "escrow.finish.v1",
            Self::ReleaseTrade { .. } => "escrow.release.v1",
            Self::ResolveTrade { .. } => "escrow.resolve.v1",
            Self::SetTradeDesk { .. } => "escrow.trade-desk.v1",
            Self::BuyWithSignature { .. } => "custody.buy.v1",
            Self::RequestSale { .. } => "custody.sale-request.v1",
            Self::ProcessSale { .. } => "custody.sale-process.v1",
        }
    }

    /// The single-use token bound into this operation.
    pub fn token(&self) -> &ProofToken {
        match self {
            Self::DelegatedApprove { token, .. }
            | Self::DelegatedTransfer { token, .. }
            | Self::RegisterTrade { token, .. }
            | Self::ValidateTrade { token, .. }
            | Self::PayTrade { token, .. }
            | Self::FinishTrade { token, .. }
            | Self::ReleaseTrade { token, .. }
            | Self::ResolveTrade { token, .. }
            | Self::SetTradeDesk { token, .. }
            | Self::BuyWithSignature { token, .. }
            | Self::RequestSale { token, .. }
            | Self::ProcessSale { token, .. } => token,
        }
    }

    /// The exact bytes a client must sign for this operation.
    pub fn signing_payload(&self) -> Result<CanonicalBytes, ProofError> {
        Ok(CanonicalBytes::new(self)?)
    }

    /// SHA-256 digest of the signing payload, for logs and client display.
    pub fn digest(&self) -> Result<ContentDigest, ProofError> {
        Ok(sha256_digest(&self.signing_payload()?))
    }
}
