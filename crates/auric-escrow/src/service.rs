// SPDX-License-Identifier: BUSL-1.1
//! The escrow service.
//!
//! Holds the trade table, its proof verifier, and a handle to the ledger.
//! Custodied funds live on the ledger under the escrow's own account,
//! which deployment wiring registers as an allow-listed service so escrow
//! settlement moves exact amounts.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

use auric_access::{Role, RoleProvider, RoleStore};
use auric_core::{AccountId, Clock, TradeId};
use auric_ledger::{Ledger, LedgerError};
use auric_proof::{Operation, Proof, ProofToken, ProofVerifier, SignerRequirement};

use crate::error::EscrowError;
use crate::trade::{next_status, Resolution, Trade, TradeAction, TradeEvent, TradeStatus};

/// Signers accepted for registration and finish.
const DESK_OR_MANAGER: SignerRequirement =
    SignerRequirement::AnyRole(&[Role::TradeDesk, Role::Manager]);

/// Construction parameters for an [`EscrowService`].
#[derive(Debug, Clone)]
pub struct EscrowConfig {
    /// The account holding custodied trade caps; also the service account
    /// checked against the signature whitelist.
    pub escrow_account: AccountId,
    /// Recipient of the settlement fee (`trade_cap − sellers_part`).
    pub fee_recipient: AccountId,
}

/// Proof-gated escrow over the ledger.
pub struct EscrowService {
    roles: Arc<dyn RoleStore>,
    verifier: ProofVerifier,
    ledger: Arc<Ledger>,
    clock: Arc<dyn Clock>,
    escrow_account: AccountId,
    fee_recipient: AccountId,
    trades: DashMap<TradeId, Trade>,
    events: RwLock<Vec<TradeEvent>>,
}

impl EscrowService {
    pub fn new(
        roles: Arc<dyn RoleStore>,
        ledger: Arc<Ledger>,
        clock: Arc<dyn Clock>,
        config: EscrowConfig,
    ) -> Self {
        let provider: Arc<dyn RoleProvider> = Arc::new(roles.clone());
        Self {
            verifier: ProofVerifier::new(provider, config.escrow_account),
            roles,
            ledger,
            clock,
            escrow_account: config.escrow_account,
            fee_recipient: config.fee_recipient,
            trades: DashMap::new(),
            events: RwLock::new(Vec::new()),
        }
    }

    pub fn escrow_account(&self) -> AccountId {
        self.escrow_account
    }

    /// Read-only projection of a trade's current state.
    pub fn get_trade(&self, trade_id: &TradeId) -> Option<Trade> {
        self.trades.get(trade_id).map(|t| t.value().clone())
    }

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<TradeEvent> {
        self.events.read().clone()
    }

    // -- proof helpers (client side) ------------------------------------------

    /// The operation a trade-desk signer authorizes to register a trade.
    #[allow(clippy::too_many_arguments)]
    pub fn register_proof(
        token: ProofToken,
        trade_id: TradeId,
        evidence_refs: Vec<String>,
        seller: AccountId,
        buyer: AccountId,
        trade_cap: u64,
        sellers_part: u64,
        resolution_delay_secs: u64,
    ) -> Operation {
        Operation::RegisterTrade {
            token,
            trade_id,
            evidence_refs,
            seller,
            buyer,
            trade_cap,
            sellers_part,
            resolution_delay_secs,
        }
    }

    pub fn validate_proof(
        token: ProofToken,
        trade_id: TradeId,
        evidence_refs: Vec<String>,
    ) -> Operation {
        Operation::ValidateTrade {
            token,
            trade_id,
            evidence_refs,
        }
    }

    pub fn pay_proof(
        token: ProofToken,
        trade_id: TradeId,
        evidence_refs: Vec<String>,
        buyer: AccountId,
    ) -> Operation {
        Operation::PayTrade {
            token,
            trade_id,
            evidence_refs,
            buyer,
        }
    }

    pub fn finish_proof(
        token: ProofToken,
        trade_id: TradeId,
        evidence_refs: Vec<String>,
    ) -> Operation {
        Operation::FinishTrade {
            token,
            trade_id,
            evidence_refs,
        }
    }

    pub fn release_proof(
        token: ProofToken,
        trade_id: TradeId,
        evidence_refs: Vec<String>,
        buyer: AccountId,
    ) -> Operation {
        Operation::ReleaseTrade {
            token,
            trade_id,
            evidence_refs,
            buyer,
        }
    }

    pub fn resolve_proof(
        token: ProofToken,
        trade_id: TradeId,
        evidence_refs: Vec<String>,
        favor_seller: bool,
        reason: String,
    ) -> Operation {
        Operation::ResolveTrade {
            token,
            trade_id,
            evidence_refs,
            favor_seller,
            reason,
        }
    }

    /// The operation a manager authorizes to grant or revoke the
    /// trade-desk role.
    pub fn trade_desk_proof(token: ProofToken, user: AccountId, enabled: bool) -> Operation {
        Operation::SetTradeDesk {
            token,
            user,
            enabled,
        }
    }

    // -- lifecycle entry points -----------------------------------------------

    /// Register a trade from a trade-desk or manager proof.
    pub fn register_trade(
        &self,
        operation: &Operation,
        proof: &Proof,
    ) -> Result<Trade, EscrowError> {
        let Operation::RegisterTrade {
            trade_id,
            evidence_refs,
            seller,
            buyer,
            trade_cap,
            sellers_part,
            resolution_delay_secs,
            ..
        } = operation
        else {
            return Err(unexpected("escrow.register.v1", operation));
        };

        self.verifier
            .authenticate(operation, proof, &DESK_OR_MANAGER)?;
        if sellers_part > trade_cap {
            return Err(EscrowError::SellersPartExceedsCap {
                sellers_part: *sellers_part,
                trade_cap: *trade_cap,
            });
        }

        match self.trades.entry(trade_id.clone()) {
            Entry::Occupied(_) => Err(EscrowError::TradeAlreadyExists(trade_id.clone())),
            Entry::Vacant(slot) => {
                self.verifier.consume(operation)?;
                let now = self.clock.now();
                let trade = Trade {
                    id: trade_id.clone(),
                    seller: *seller,
                    buyer: *buyer,
                    trade_cap: *trade_cap,
                    sellers_part: *sellers_part,
                    evidence_refs: evidence_refs.clone(),
                    status: TradeStatus::Registered,
                    registered_at: now,
                    resolution_window_end: now.plus_secs(*resolution_delay_secs),
                    resolution: None,
                    updated_at: now,
                };
                slot.insert(trade.clone());
                tracing::info!(trade_id = %trade.id, trade_cap, sellers_part, "trade registered");
                self.record(TradeEvent::Registered {
                    trade_id: trade.id.clone(),
                    seller: trade.seller,
                    buyer: trade.buyer,
                    trade_cap: trade.trade_cap,
                    sellers_part: trade.sellers_part,
                    resolution_window_end: trade.resolution_window_end,
                });
                Ok(trade)
            }
        }
    }

    /// Validate a registered trade from a manager proof.
    pub fn validate_trade(
        &self,
        operation: &Operation,
        proof: &Proof,
    ) -> Result<Trade, EscrowError> {
        let Operation::ValidateTrade { trade_id, .. } = operation else {
            return Err(unexpected("escrow.validate.v1", operation));
        };

        let mut entry = self
            .trades
            .get_mut(trade_id)
            .ok_or_else(|| EscrowError::TradeNotFound(trade_id.clone()))?;
        let trade = entry.value_mut();

        self.verifier
            .authenticate(operation, proof, &SignerRequirement::Role(Role::Manager))?;
        let next = next_status(trade.status, TradeAction::Validate)?;
        self.verifier.consume(operation)?;

        trade.status = next;
        trade.updated_at = self.clock.now();
        self.record(TradeEvent::Validated {
            trade_id: trade.id.clone(),
        });
        Ok(trade.clone())
    }

    /// Pull the trade cap from the buyer into escrow custody.
    ///
    /// Requires the buyer's own proof and a pre-existing allowance of at
    /// least `trade_cap` for the escrow account.
    pub fn pay_trade(&self, operation: &Operation, proof: &Proof) -> Result<Trade, EscrowError> {
        let Operation::PayTrade {
            trade_id, buyer, ..
        } = operation
        else {
            return Err(unexpected("escrow.pay.v1", operation));
        };

        let mut entry = self
            .trades
            .get_mut(trade_id)
            .ok_or_else(|| EscrowError::TradeNotFound(trade_id.clone()))?;
        let trade = entry.value_mut();

        if buyer != &trade.buyer {
            return Err(EscrowError::BuyerMismatch {
                operation_buyer: *buyer,
                trade_buyer: trade.buyer,
            });
        }
        self.verifier.authenticate(
            operation,
            proof,
            &SignerRequirement::Account(trade.buyer),
        )?;
        let next = next_status(trade.status, TradeAction::Pay)?;

        // Surface fund problems before the token is consumed, so the buyer
        // can fix the allowance and resubmit the same proof.
        let allowance = self.ledger.allowance(&trade.buyer, &self.escrow_account);
        if allowance < trade.trade_cap {
            return Err(LedgerError::InsufficientAllowance {
                owner: trade.buyer,
                spender: self.escrow_account,
                allowance,
                required: trade.trade_cap,
            }
            .into());
        }
        let balance = self.ledger.balance_of(&trade.buyer);
        if balance < trade.trade_cap {
            return Err(LedgerError::InsufficientBalance {
                account: trade.buyer,
                balance,
                required: trade.trade_cap,
            }
            .into());
        }

        self.verifier.consume(operation)?;
        self.ledger.transfer_from(
            &self.escrow_account,
            &trade.buyer,
            &self.escrow_account,
            trade.trade_cap,
        )?;

        trade.status = next;
        trade.updated_at = self.clock.now();
        tracing::info!(trade_id = %trade.id, amount = trade.trade_cap, "trade paid into custody");
        self.record(TradeEvent::Paid {
            trade_id: trade.id.clone(),
            buyer: trade.buyer,
            amount: trade.trade_cap,
        });
        Ok(trade.clone())
    }

    /// Mark a paid trade finished from a trade-desk or manager proof.
    pub fn finish_trade(&self, operation: &Operation, proof: &Proof) -> Result<Trade, EscrowError> {
        let Operation::FinishTrade { trade_id, .. } = operation else {
            return Err(unexpected("escrow.finish.v1", operation));
        };

        let mut entry = self
            .trades
            .get_mut(trade_id)
            .ok_or_else(|| EscrowError::TradeNotFound(trade_id.clone()))?;
        let trade = entry.value_mut();

        self.verifier
            .authenticate(operation, proof, &DESK_OR_MANAGER)?;
        let next = next_status(trade.status, TradeAction::Finish)?;
        self.verifier.consume(operation)?;

        trade.status = next;
        trade.updated_at = self.clock.now();
        self.record(TradeEvent::Finished {
            trade_id: trade.id.clone(),
        });
        Ok(trade.clone())
    }

    /// Release custodied funds: `sellers_part` to the seller, the
    /// settlement fee to the fee recipient. Requires the buyer's proof.
    pub fn release_trade(
        &self,
        operation: &Operation,
        proof: &Proof,
    ) -> Result<Trade, EscrowError> {
        let Operation::ReleaseTrade {
            trade_id, buyer, ..
        } = operation
        else {
            return Err(unexpected("escrow.release.v1", operation));
        };

        let mut entry = self
            .trades
            .get_mut(trade_id)
            .ok_or_else(|| EscrowError::TradeNotFound(trade_id.clone()))?;
        let trade = entry.value_mut();

        if buyer != &trade.buyer {
            return Err(EscrowError::BuyerMismatch {
                operation_buyer: *buyer,
                trade_buyer: trade.buyer,
            });
        }
        self.verifier.authenticate(
            operation,
            proof,
            &SignerRequirement::Account(trade.buyer),
        )?;
        let next = next_status(trade.status, TradeAction::Release)?;
        self.verifier.consume(operation)?;

        self.settle_to_seller(trade)?;
        trade.status = next;
        trade.updated_at = self.clock.now();
        tracing::info!(
            trade_id = %trade.id,
            seller_amount = trade.sellers_part,
            fee_amount = trade.settlement_fee(),
            "trade released"
        );
        self.record(TradeEvent::Released {
            trade_id: trade.id.clone(),
            seller_amount: trade.sellers_part,
            fee_amount: trade.settlement_fee(),
        });
        Ok(trade.clone())
    }

    /// Force-resolve a disputed trade after the resolution window.
    ///
    /// Favoring the seller settles exactly like release; favoring the
    /// buyer refunds the full custodied `trade_cap`.
    pub fn resolve_trade(
        &self,
        operation: &Operation,
        proof: &Proof,
    ) -> Result<Trade, EscrowError> {
        let Operation::ResolveTrade {
            trade_id,
            favor_seller,
            reason,
            ..
        } = operation
        else {
            return Err(unexpected("escrow.resolve.v1", operation));
        };

        let mut entry = self
            .trades
            .get_mut(trade_id)
            .ok_or_else(|| EscrowError::TradeNotFound(trade_id.clone()))?;
        let trade = entry.value_mut();

        self.verifier
            .authenticate(operation, proof, &SignerRequirement::Role(Role::Manager))?;
        let next = next_status(trade.status, TradeAction::Resolve)?;
        let now = self.clock.now();
        if now < trade.resolution_window_end {
            return Err(EscrowError::TooEarlyToResolve {
                window_end: trade.resolution_window_end,
            });
        }
        self.verifier.consume(operation)?;

        let amount = if *favor_seller {
            self.settle_to_seller(trade)?;
            trade.sellers_part
        } else {
            self.ledger
                .transfer(&self.escrow_account, &trade.buyer, trade.trade_cap)?;
            trade.trade_cap
        };

        trade.status = next;
        trade.resolution = Some(Resolution {
            favor_seller: *favor_seller,
            reason: reason.clone(),
        });
        trade.updated_at = now;
        tracing::info!(trade_id = %trade.id, favor_seller, amount, "trade resolved");
        self.record(TradeEvent::Resolved {
            trade_id: trade.id.clone(),
            favor_seller: *favor_seller,
            amount,
            reason: reason.clone(),
        });
        Ok(trade.clone())
    }

    /// Grant or revoke the trade-desk role from a manager proof.
    pub fn set_trade_desk(&self, operation: &Operation, proof: &Proof) -> Result<(), EscrowError> {
        let Operation::SetTradeDesk { user, enabled, .. } = operation else {
            return Err(unexpected("escrow.trade-desk.v1", operation));
        };

        self.verifier
            .verify(operation, proof, &SignerRequirement::Role(Role::Manager))?;
        self.roles.set_role(user, Role::TradeDesk, *enabled);
        self.record(TradeEvent::TradeDeskUpdated {
            user: *user,
            enabled: *enabled,
        });
        Ok(())
    }

    /// Pay the seller's part and the settlement fee out of custody.
    fn settle_to_seller(&self, trade: &Trade) -> Result<(), EscrowError> {
        self.ledger
            .transfer(&self.escrow_account, &trade.seller, trade.sellers_part)?;
        let fee = trade.settlement_fee();
        if fee > 0 {
            self.ledger
                .transfer(&self.escrow_account, &self.fee_recipient, fee)?;
        }
        Ok(())
    }

    fn record(&self, event: TradeEvent) {
        self.events.write().push(event);
    }
}

impl std::fmt::Debug for EscrowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscrowService")
            .field("escrow_account", &self.escrow_account)
            .field("trades", &self.trades.len())
            .finish()
    }
}

fn unexpected(expected: &'static str, operation: &Operation) -> EscrowError {
    EscrowError::UnexpectedOperation {
        expected,
        got: operation.kind(),
    }
}
