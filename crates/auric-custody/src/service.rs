//! The custody service.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

use auric_access::{Role, RoleProvider};
use auric_core::{AccountId, Clock, SaleRequestId};
use auric_ledger::{Ledger, LedgerError};
use auric_proof::{Operation, Proof, ProofToken, ProofVerifier, SignerRequirement};

use crate::error::CustodyError;
use crate::sale::{CustodyEvent, SaleRequest, SaleStatus};

/// Construction parameters for a [`CustodyService`].
#[derive(Debug, Clone)]
pub struct CustodyConfig {
    /// The account holding the custody pool; also the service account
    /// checked against the signature whitelist.
    pub custody_account: AccountId,
    /// Per-call cap on the direct buy path.
    pub buy_limit: u64,
    /// Per-call cap on the direct sell path.
    pub sell_limit: u64,
}

/// Hot-wallet custody over the ledger.
pub struct CustodyService {
    roles: Arc<dyn RoleProvider>,
    verifier: ProofVerifier,
    ledger: Arc<Ledger>,
    clock: Arc<dyn Clock>,
    custody_account: AccountId,
    buy_limit: u64,
    sell_limit: u64,
    requests: DashMap<SaleRequestId, SaleRequest>,
    events: RwLock<Vec<CustodyEvent>>,
}

impl CustodyService {
    pub fn new(
        roles: Arc<dyn RoleProvider>,
        ledger: Arc<Ledger>,
        clock: Arc<dyn Clock>,
        config: CustodyConfig,
    ) -> Self {
        Self {
            verifier: ProofVerifier::new(roles.clone(), config.custody_account),
            roles,
            ledger,
            clock,
            custody_account: config.custody_account,
            buy_limit: config.buy_limit,
            sell_limit: config.sell_limit,
            requests: DashMap::new(),
            events: RwLock::new(Vec::new()),
        }
    }

    pub fn custody_account(&self) -> AccountId {
        self.custody_account
    }

    pub fn get_request(&self, request_id: &SaleRequestId) -> Option<SaleRequest> {
        self.requests.get(request_id).map(|r| r.value().clone())
    }

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<CustodyEvent> {
        self.events.read().clone()
    }

    // -- direct trusted paths -------------------------------------------------

    /// Pay out custody units to a recipient. Manager callers only, capped
    /// per call; no proof consulted.
    pub fn buy(
        &self,
        caller: &AccountId,
        recipient: &AccountId,
        amount: u64,
    ) -> Result<(), CustodyError> {
        self.require_role(caller, Role::Manager)?;
        if amount > self.buy_limit {
            return Err(CustodyError::AmountExceedsLimit {
                amount,
                limit: self.buy_limit,
            });
        }
        self.ledger
            .transfer(&self.custody_account, recipient, amount)?;
        self.record(CustodyEvent::Bought {
            recipient: *recipient,
            amount,
            via_signature: false,
        });
        Ok(())
    }

    /// Pull units from a seller into custody. Manager callers only, capped
    /// per call; requires the seller's pre-existing allowance.
    pub fn sell(
        &self,
        caller: &AccountId,
        seller: &AccountId,
        amount: u64,
    ) -> Result<(), CustodyError> {
        self.require_role(caller, Role::Manager)?;
        if amount > self.sell_limit {
            return Err(CustodyError::AmountExceedsLimit {
                amount,
                limit: self.sell_limit,
            });
        }
        self.ledger
            .transfer_from(&self.custody_account, seller, &self.custody_account, amount)?;
        self.record(CustodyEvent::Sold {
            seller: *seller,
            amount,
        });
        Ok(())
    }

    // -- proof helpers (client side) ------------------------------------------

    /// The operation a manager signs to authorize a buy above the cap.
    pub fn buy_proof(token: ProofToken, recipient: AccountId, amount: u64) -> Operation {
        Operation::BuyWithSignature {
            token,
            recipient,
            amount,
        }
    }

    /// The operation a requester signs to pre-authorize a delegated sell.
    pub fn sale_proof(
        token: ProofToken,
        network_fee: u64,
        requester: AccountId,
        amount: u64,
        request_id: SaleRequestId,
    ) -> Operation {
        Operation::RequestSale {
            token,
            network_fee,
            requester,
            amount,
            request_id,
        }
    }

    /// The operation a manager signs to approve or reject a sale request.
    pub fn sale_process_proof(
        token: ProofToken,
        request_id: SaleRequestId,
        approve: bool,
    ) -> Operation {
        Operation::ProcessSale {
            token,
            request_id,
            approve,
        }
    }

    // -- proof-gated paths ----------------------------------------------------

    /// Pay out custody units under a manager-signed proof. Uncapped: the
    /// signature is the authorization.
    pub fn buy_with_signature(
        &self,
        operation: &Operation,
        proof: &Proof,
    ) -> Result<(), CustodyError> {
        let Operation::BuyWithSignature {
            recipient, amount, ..
        } = operation
        else {
            return Err(unexpected("custody.buy.v1", operation));
        };

        self.verifier
            .authenticate(operation, proof, &SignerRequirement::Role(Role::Manager))?;
        let balance = self.ledger.balance_of(&self.custody_account);
        if balance < *amount {
            return Err(LedgerError::InsufficientBalance {
                account: self.custody_account,
                balance,
                required: *amount,
            }
            .into());
        }
        self.verifier.consume(operation)?;

        self.ledger
            .transfer(&self.custody_account, recipient, *amount)?;
        tracing::info!(recipient = %recipient, amount, "signature-gated buy executed");
        self.record(CustodyEvent::Bought {
            recipient: *recipient,
            amount: *amount,
            via_signature: true,
        });
        Ok(())
    }

    /// Create a pending sale request from the requester's own proof,
    /// pulling the amount (and the signed network fee) out of their
    /// balance via allowance.
    ///
    /// The submitting caller is the relayer: a backend signer or a
    /// manager.
    pub fn request_sale(
        &self,
        caller: &AccountId,
        operation: &Operation,
        proof: &Proof,
    ) -> Result<SaleRequest, CustodyError> {
        if !self.roles.has_role(caller, Role::Signer) {
            self.require_role(caller, Role::Manager)?;
        }
        let Operation::RequestSale {
            network_fee,
            requester,
            amount,
            request_id,
            ..
        } = operation
        else {
            return Err(unexpected("custody.sale-request.v1", operation));
        };

        self.verifier
            .authenticate(operation, proof, &SignerRequirement::Account(*requester))?;

        // Surface fund problems before the token is consumed.
        let required = amount.saturating_add(*network_fee);
        let allowance = self.ledger.allowance(requester, &self.custody_account);
        if allowance < required {
            return Err(LedgerError::InsufficientAllowance {
                owner: *requester,
                spender: self.custody_account,
                allowance,
                required,
            }
            .into());
        }
        let balance = self.ledger.balance_of(requester);
        if balance < required {
            return Err(LedgerError::InsufficientBalance {
                account: *requester,
                balance,
                required,
            }
            .into());
        }

        match self.requests.entry(*request_id) {
            Entry::Occupied(_) => Err(CustodyError::RequestAlreadyExists(*request_id)),
            Entry::Vacant(slot) => {
                self.verifier.consume(operation)?;
                self.ledger.transfer_from(
                    &self.custody_account,
                    requester,
                    &self.custody_account,
                    *amount,
                )?;
                if *network_fee > 0 {
                    let collector = self.ledger.fee_collector();
                    self.ledger.transfer_from(
                        &self.custody_account,
                        requester,
                        &collector,
                        *network_fee,
                    )?;
                }
                let request = SaleRequest {
                    id: *request_id,
                    requester: *requester,
                    amount: *amount,
                    network_fee: *network_fee,
                    status: SaleStatus::Pending,
                    created_at: self.clock.now(),
                    processed_at: None,
                };
                slot.insert(request.clone());
                tracing::info!(request_id = %request.id, amount, "sale request custodied");
                self.record(CustodyEvent::SaleRequested {
                    request_id: request.id,
                    requester: request.requester,
                    amount: request.amount,
                    network_fee: request.network_fee,
                });
                Ok(request)
            }
        }
    }

    /// Resolve a pending sale request under a manager-signed proof.
    ///
    /// Approval keeps the custodied funds with the custody pool; rejection
    /// returns the full amount to the requester. Either way the request is
    /// terminal afterwards.
    pub fn process_request(
        &self,
        operation: &Operation,
        proof: &Proof,
    ) -> Result<SaleRequest, CustodyError> {
        let Operation::ProcessSale {
            request_id,
            approve,
            ..
        } = operation
        else {
            return Err(unexpected("custody.sale-process.v1", operation));
        };

        let mut entry = self
            .requests
            .get_mut(request_id)
            .ok_or(CustodyError::RequestNotFound(*request_id))?;
        let request = entry.value_mut();

        self.verifier
            .authenticate(operation, proof, &SignerRequirement::Role(Role::Manager))?;
        if request.status.is_terminal() {
            return Err(CustodyError::RequestAlreadyProcessed {
                request_id: *request_id,
                status: request.status,
            });
        }
        self.verifier.consume(operation)?;

        if *approve {
            request.status = SaleStatus::Approved;
            self.record(CustodyEvent::SaleApproved {
                request_id: *request_id,
                amount: request.amount,
            });
        } else {
            self.ledger
                .transfer(&self.custody_account, &request.requester, request.amount)?;
            request.status = SaleStatus::Rejected;
            self.record(CustodyEvent::SaleRejected {
                request_id: *request_id,
                requester: request.requester,
                amount: request.amount,
            });
        }
        request.processed_at = Some(self.clock.now());
        tracing::info!(request_id = %request.id, status = %request.status, "sale request processed");
        Ok(request.clone())
    }

    fn require_role(&self, account: &AccountId, role: Role) -> Result<(), CustodyError> {
        if self.roles.has_role(account, role) {
            Ok(())
        } else {
            Err(CustodyError::RoleRequired {
                account: *account,
                role,
            })
        }
    }

    fn record(&self, event: CustodyEvent) {
        self.events.write().push(event);
    }
}

impl std::fmt::Debug for CustodyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustodyService")
            .field("custody_account", &self.custody_account)
            .field("requests", &self.requests.len())
            .finish()
    }
}

fn unexpected(expected: &'static str, operation: &Operation) -> CustodyError {
    CustodyError::UnexpectedOperation {
        expected,
        got: operation.kind(),
    }
}
