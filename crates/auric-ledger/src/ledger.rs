//! The balance ledger.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use auric_access::{Role, RoleProvider};
use auric_core::AccountId;
use auric_proof::{Operation, Proof, ProofToken, ProofVerifier, SignerRequirement};

use crate::error::LedgerError;
use crate::event::LedgerEvent;
use crate::fee::FeePolicy;

/// Construction parameters for a [`Ledger`].
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// The ledger's own service account, whitelisted for signature checks.
    pub service_account: AccountId,
    /// Recipient of transfer commissions and delegated network fees.
    pub fee_collector: AccountId,
    /// Initial transfer commission in basis points.
    pub commission_bps: u32,
}

/// Fee-bearing balance ledger.
///
/// All balances, allowances, and the fee policy live behind a single
/// `RwLock`, so every state-changing call is atomic: the loser of a race
/// observes post-transition balances, never a partial fee split.
pub struct Ledger {
    roles: Arc<dyn RoleProvider>,
    verifier: ProofVerifier,
    service_account: AccountId,
    inner: RwLock<LedgerInner>,
}

struct LedgerInner {
    balances: HashMap<AccountId, u64>,
    allowances: HashMap<(AccountId, AccountId), u64>,
    total_supply: u64,
    fees: FeePolicy,
    events: Vec<LedgerEvent>,
}

impl Ledger {
    pub fn new(roles: Arc<dyn RoleProvider>, config: LedgerConfig) -> Result<Self, LedgerError> {
        let fees = FeePolicy::new(config.fee_collector, config.commission_bps)?;
        Ok(Self {
            verifier: ProofVerifier::new(roles.clone(), config.service_account),
            roles,
            service_account: config.service_account,
            inner: RwLock::new(LedgerInner {
                balances: HashMap::new(),
                allowances: HashMap::new(),
                total_supply: 0,
                fees,
                events: Vec::new(),
            }),
        })
    }

    // -- views --------------------------------------------------------------

    pub fn service_account(&self) -> AccountId {
        self.service_account
    }

    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.inner.read().balance(account)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        self.inner
            .read()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_supply(&self) -> u64 {
        self.inner.read().total_supply
    }

    pub fn commission_bps(&self) -> u32 {
        self.inner.read().fees.commission_bps()
    }

    pub fn fee_collector(&self) -> AccountId {
        *self.inner.read().fees.fee_collector()
    }

    pub fn is_fee_exempt(&self, account: &AccountId) -> bool {
        self.inner.read().fees.is_exempt(account)
    }

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.inner.read().events.clone()
    }

    // -- supply (Minter role) -----------------------------------------------

    /// Mint new units to the caller, bound to custody evidence references.
    pub fn mint(
        &self,
        caller: &AccountId,
        amount: u64,
        evidence_refs: Vec<String>,
    ) -> Result<(), LedgerError> {
        self.require_role(caller, Role::Minter)?;
        let mut inner = self.inner.write();
        let supply = inner.total_supply;
        inner.total_supply = supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow { supply, amount })?;
        inner.credit(caller, amount);
        tracing::info!(to = %caller, amount, "minted against custody evidence");
        inner.events.push(LedgerEvent::Minted {
            to: *caller,
            amount,
            evidence_refs,
        });
        Ok(())
    }

    /// Burn units from the caller, bound to custody evidence references.
    pub fn burn(
        &self,
        caller: &AccountId,
        amount: u64,
        evidence_refs: Vec<String>,
    ) -> Result<(), LedgerError> {
        self.require_role(caller, Role::Minter)?;
        let mut inner = self.inner.write();
        inner.debit(caller, amount)?;
        inner.total_supply -= amount;
        tracing::info!(from = %caller, amount, "burned against custody evidence");
        inner.events.push(LedgerEvent::Burned {
            from: *caller,
            amount,
            evidence_refs,
        });
        Ok(())
    }

    // -- direct operations ---------------------------------------------------

    /// Transfer from the caller, applying the transfer commission.
    pub fn transfer(
        &self,
        caller: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        let fee = inner.move_with_commission(caller, to, amount)?;
        inner.events.push(LedgerEvent::Transferred {
            from: *caller,
            to: *to,
            amount,
            fee,
        });
        Ok(())
    }

    /// Set the caller's allowance for a spender.
    pub fn approve(
        &self,
        caller: &AccountId,
        spender: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        inner.allowances.insert((*caller, *spender), amount);
        inner.events.push(LedgerEvent::Approved {
            owner: *caller,
            spender: *spender,
            amount,
        });
        Ok(())
    }

    /// Transfer on behalf of `owner`, consuming the caller's allowance.
    pub fn transfer_from(
        &self,
        caller: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        inner.spend_allowance(owner, caller, amount)?;
        let fee = inner.move_with_commission(owner, to, amount)?;
        inner.events.push(LedgerEvent::Transferred {
            from: *owner,
            to: *to,
            amount,
            fee,
        });
        Ok(())
    }

    // -- fee administration (Manager role) ------------------------------------

    pub fn set_commission_bps(&self, caller: &AccountId, bps: u32) -> Result<(), LedgerError> {
        self.require_role(caller, Role::Manager)?;
        let mut inner = self.inner.write();
        inner.fees.set_commission_bps(bps)?;
        tracing::info!(bps, "transfer commission updated");
        inner.events.push(LedgerEvent::CommissionChanged { bps });
        Ok(())
    }

    pub fn set_fee_exempt(
        &self,
        caller: &AccountId,
        account: &AccountId,
        exempt: bool,
    ) -> Result<(), LedgerError> {
        self.require_role(caller, Role::Manager)?;
        let mut inner = self.inner.write();
        inner.fees.set_fee_exempt(account, exempt);
        inner.events.push(LedgerEvent::FeeExemptionChanged {
            account: *account,
            exempt,
        });
        Ok(())
    }

    pub fn set_allowed_service(
        &self,
        caller: &AccountId,
        account: &AccountId,
        allowed: bool,
    ) -> Result<(), LedgerError> {
        self.require_role(caller, Role::Manager)?;
        let mut inner = self.inner.write();
        inner.fees.set_allowed_service(account, allowed);
        inner.events.push(LedgerEvent::AllowedServiceChanged {
            account: *account,
            allowed,
        });
        Ok(())
    }

    // -- proof helpers (client side) ------------------------------------------

    /// The operation a fund owner signs to pre-authorize an allowance.
    pub fn approve_proof(
        token: ProofToken,
        network_fee: u64,
        spender: AccountId,
        amount: u64,
    ) -> Operation {
        Operation::DelegatedApprove {
            token,
            network_fee,
            spender,
            amount,
        }
    }

    /// The operation a fund owner signs to pre-authorize a transfer.
    pub fn transfer_proof(
        token: ProofToken,
        network_fee: u64,
        to: AccountId,
        amount: u64,
    ) -> Operation {
        Operation::DelegatedTransfer {
            token,
            network_fee,
            to,
            amount,
        }
    }

    // -- delegated operations (proof-gated) -----------------------------------

    /// Execute a signed approval on behalf of its signer.
    ///
    /// The caller is the relayer and must hold [`Role::Sender`]; the signed
    /// network fee moves from the signer to the fee collector. Returns the
    /// signer (the allowance owner).
    pub fn delegated_approve(
        &self,
        caller: &AccountId,
        operation: &Operation,
        proof: &Proof,
    ) -> Result<AccountId, LedgerError> {
        self.require_role(caller, Role::Sender)?;
        let (network_fee, spender, amount) = match operation {
            Operation::DelegatedApprove {
                network_fee,
                spender,
                amount,
                ..
            } => (*network_fee, *spender, *amount),
            other => {
                return Err(LedgerError::UnexpectedOperation {
                    expected: "ledger.approve.v1",
                    got: other.kind(),
                })
            }
        };

        let mut inner = self.inner.write();
        let owner = self
            .verifier
            .authenticate(operation, proof, &SignerRequirement::AnySigner)?;
        inner.require_balance(&owner, network_fee)?;
        self.verifier.consume(operation)?;

        inner.allowances.insert((owner, spender), amount);
        if network_fee > 0 {
            let collector = *inner.fees.fee_collector();
            inner.move_exact(&owner, collector, network_fee)?;
        }
        tracing::debug!(owner = %owner, spender = %spender, amount, "delegated approval executed");
        inner.events.push(LedgerEvent::DelegatedApproval {
            owner,
            spender,
            amount,
            network_fee,
            relayer: *caller,
        });
        Ok(owner)
    }

    /// Execute a signed transfer of the signer's own funds.
    ///
    /// The caller is the relayer and must hold [`Role::Sender`]. The
    /// transfer commission applies per the current policy; the signed
    /// network fee moves from the signer to the fee collector on top.
    pub fn delegated_transfer(
        &self,
        caller: &AccountId,
        operation: &Operation,
        proof: &Proof,
    ) -> Result<AccountId, LedgerError> {
        self.require_role(caller, Role::Sender)?;
        let (network_fee, to, amount) = match operation {
            Operation::DelegatedTransfer {
                network_fee,
                to,
                amount,
                ..
            } => (*network_fee, *to, *amount),
            other => {
                return Err(LedgerError::UnexpectedOperation {
                    expected: "ledger.transfer.v1",
                    got: other.kind(),
                })
            }
        };

        let mut inner = self.inner.write();
        let owner = self
            .verifier
            .authenticate(operation, proof, &SignerRequirement::AnySigner)?;
        let required = amount.saturating_add(network_fee);
        inner.require_balance(&owner, required)?;
        self.verifier.consume(operation)?;

        let fee = inner.move_with_commission(&owner, &to, amount)?;
        if network_fee > 0 {
            let collector = *inner.fees.fee_collector();
            inner.move_exact(&owner, collector, network_fee)?;
        }
        tracing::debug!(owner = %owner, to = %to, amount, fee, "delegated transfer executed");
        inner.events.push(LedgerEvent::DelegatedTransfer {
            owner,
            to,
            amount,
            fee,
            network_fee,
            relayer: *caller,
        });
        Ok(owner)
    }

    fn require_role(&self, account: &AccountId, role: Role) -> Result<(), LedgerError> {
        if self.roles.has_role(account, role) {
            Ok(())
        } else {
            Err(LedgerError::RoleRequired {
                account: *account,
                role,
            })
        }
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Ledger")
            .field("accounts", &inner.balances.len())
            .field("total_supply", &inner.total_supply)
            .field("commission_bps", &inner.fees.commission_bps())
            .finish()
    }
}

impl LedgerInner {
    fn balance(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn require_balance(&self, account: &AccountId, required: u64) -> Result<(), LedgerError> {
        let balance = self.balance(account);
        if balance < required {
            return Err(LedgerError::InsufficientBalance {
                account: *account,
                balance,
                required,
            });
        }
        Ok(())
    }

    fn credit(&mut self, account: &AccountId, amount: u64) {
        // Cannot overflow: the sum of all balances equals total_supply,
        // which is bounded at mint time.
        *self.balances.entry(*account).or_insert(0) += amount;
    }

    fn debit(&mut self, account: &AccountId, amount: u64) -> Result<(), LedgerError> {
        self.require_balance(account, amount)?;
        if let Some(balance) = self.balances.get_mut(account) {
            *balance -= amount;
        }
        Ok(())
    }

    /// Debit `from` the full amount; credit `to` the amount net of
    /// commission and the collector the commission. Returns the fee taken.
    fn move_with_commission(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        let fee = self.fees.commission_for(amount, from, to);
        self.debit(from, amount)?;
        self.credit(to, amount - fee);
        if fee > 0 {
            let collector = *self.fees.fee_collector();
            self.credit(&collector, fee);
        }
        Ok(fee)
    }

    /// Move an exact amount with no commission (network fees, refunds).
    fn move_exact(
        &mut self,
        from: &AccountId,
        to: AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.debit(from, amount)?;
        self.credit(&to, amount);
        Ok(())
    }

    fn spend_allowance(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let key = (*owner, *spender);
        let allowance = self.allowances.get(&key).copied().unwrap_or(0);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: *owner,
                spender: *spender,
                allowance,
                required: amount,
            });
        }
        self.allowances.insert(key, allowance - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auric_access::AccessRegistry;
    use auric_crypto::SigningKeyPair;

    struct Fixture {
        registry: Arc<AccessRegistry>,
        ledger: Ledger,
        admin: AccountId,
        collector: AccountId,
    }

    fn account(n: u8) -> AccountId {
        AccountId::from_bytes([n; 32])
    }

    fn fixture(commission_bps: u32) -> Fixture {
        let registry = Arc::new(AccessRegistry::new());
        let admin = account(1);
        let collector = account(2);
        let service = account(3);
        registry.grant(&admin, Role::Manager);
        registry.grant(&admin, Role::Minter);
        registry.grant(&service, Role::SignatureWhitelisted);
        let ledger = Ledger::new(
            registry.clone() as Arc<dyn RoleProvider>,
            LedgerConfig {
                service_account: service,
                fee_collector: collector,
                commission_bps,
            },
        )
        .unwrap();
        Fixture {
            registry,
            ledger,
            admin,
            collector,
        }
    }

    #[test]
    fn mint_requires_minter_role() {
        let fx = fixture(0);
        let outsider = account(9);
        assert!(matches!(
            fx.ledger.mint(&outsider, 100, vec![]),
            Err(LedgerError::RoleRequired { .. })
        ));
        fx.ledger
            .mint(&fx.admin, 100, vec!["vault-doc-1".into()])
            .unwrap();
        assert_eq!(fx.ledger.total_supply(), 100);
        assert_eq!(fx.ledger.balance_of(&fx.admin), 100);
    }

    #[test]
    fn burn_reduces_supply_and_balance() {
        let fx = fixture(0);
        fx.ledger.mint(&fx.admin, 100, vec![]).unwrap();
        fx.ledger.burn(&fx.admin, 40, vec![]).unwrap();
        assert_eq!(fx.ledger.total_supply(), 60);
        assert_eq!(fx.ledger.balance_of(&fx.admin), 60);
        assert!(matches!(
            fx.ledger.burn(&fx.admin, 61, vec![]),
            Err(LedgerError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn commission_scenario_one_percent() {
        let fx = fixture(100);
        fx.ledger.mint(&fx.admin, 10_000, vec![]).unwrap();
        let recipient = account(7);
        fx.ledger.transfer(&fx.admin, &recipient, 1_000).unwrap();

        assert_eq!(fx.ledger.balance_of(&recipient), 990);
        assert_eq!(fx.ledger.balance_of(&fx.collector), 10);
        assert_eq!(fx.ledger.balance_of(&fx.admin), 9_000);
        // Supply is conserved.
        assert_eq!(fx.ledger.total_supply(), 10_000);
    }

    #[test]
    fn exempt_sender_pays_no_commission() {
        let fx = fixture(100);
        fx.ledger.mint(&fx.admin, 10_000, vec![]).unwrap();
        fx.ledger
            .set_fee_exempt(&fx.admin, &fx.admin, true)
            .unwrap();
        let recipient = account(7);
        fx.ledger.transfer(&fx.admin, &recipient, 1_000).unwrap();
        assert_eq!(fx.ledger.balance_of(&recipient), 1_000);
        assert_eq!(fx.ledger.balance_of(&fx.collector), 0);
    }

    #[test]
    fn commission_change_applies_to_next_transfer_only() {
        let fx = fixture(100);
        fx.ledger.mint(&fx.admin, 10_000, vec![]).unwrap();
        let recipient = account(7);
        fx.ledger.transfer(&fx.admin, &recipient, 1_000).unwrap();
        assert_eq!(fx.ledger.balance_of(&recipient), 990);

        fx.ledger.set_commission_bps(&fx.admin, 0).unwrap();
        fx.ledger.transfer(&fx.admin, &recipient, 1_000).unwrap();
        assert_eq!(fx.ledger.balance_of(&recipient), 990 + 1_000);
    }

    #[test]
    fn transfer_without_balance_fails_atomically() {
        let fx = fixture(100);
        let poor = account(8);
        let recipient = account(7);
        assert!(matches!(
            fx.ledger.transfer(&poor, &recipient, 1),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(fx.ledger.balance_of(&recipient), 0);
        assert_eq!(fx.ledger.balance_of(&fx.collector), 0);
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let fx = fixture(0);
        fx.ledger.mint(&fx.admin, 1_000, vec![]).unwrap();
        let spender = account(5);
        let recipient = account(6);

        fx.ledger.approve(&fx.admin, &spender, 600).unwrap();
        fx.ledger
            .transfer_from(&spender, &fx.admin, &recipient, 400)
            .unwrap();
        assert_eq!(fx.ledger.allowance(&fx.admin, &spender), 200);
        assert_eq!(fx.ledger.balance_of(&recipient), 400);

        assert!(matches!(
            fx.ledger.transfer_from(&spender, &fx.admin, &recipient, 300),
            Err(LedgerError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn admin_knobs_require_manager_role() {
        let fx = fixture(0);
        let outsider = account(9);
        assert!(fx.ledger.set_commission_bps(&outsider, 50).is_err());
        assert!(fx
            .ledger
            .set_fee_exempt(&outsider, &account(4), true)
            .is_err());
        assert!(fx
            .ledger
            .set_allowed_service(&outsider, &account(4), true)
            .is_err());
    }

    // -- delegated operations ------------------------------------------------

    struct DelegatedFixture {
        fx: Fixture,
        owner_keys: SigningKeyPair,
        relayer: AccountId,
    }

    fn delegated_fixture() -> DelegatedFixture {
        let fx = fixture(0);
        let owner_keys = SigningKeyPair::generate();
        let owner = owner_keys.account_id();
        let relayer = account(10);
        fx.registry.grant(&relayer, Role::Sender);
        // Fund the owner.
        fx.ledger.mint(&fx.admin, 10_000, vec![]).unwrap();
        fx.ledger.transfer(&fx.admin, &owner, 5_000).unwrap();
        DelegatedFixture {
            fx,
            owner_keys,
            relayer,
        }
    }

    #[test]
    fn delegated_approve_sets_allowance_and_charges_network_fee() {
        let d = delegated_fixture();
        let owner = d.owner_keys.account_id();
        let spender = account(11);
        let op = Ledger::approve_proof(ProofToken::random(), 100, spender, 2_000);
        let proof = Proof::sign(&d.owner_keys, &op).unwrap();

        let signer = d
            .fx
            .ledger
            .delegated_approve(&d.relayer, &op, &proof)
            .unwrap();
        assert_eq!(signer, owner);
        assert_eq!(d.fx.ledger.allowance(&owner, &spender), 2_000);
        assert_eq!(d.fx.ledger.balance_of(&owner), 4_900);
        assert_eq!(d.fx.ledger.balance_of(&d.fx.collector), 100);
    }

    #[test]
    fn delegated_transfer_moves_signer_funds() {
        let d = delegated_fixture();
        let owner = d.owner_keys.account_id();
        let recipient = account(12);
        let op = Ledger::transfer_proof(ProofToken::random(), 100, recipient, 1_000);
        let proof = Proof::sign(&d.owner_keys, &op).unwrap();

        d.fx
            .ledger
            .delegated_transfer(&d.relayer, &op, &proof)
            .unwrap();
        assert_eq!(d.fx.ledger.balance_of(&recipient), 1_000);
        assert_eq!(d.fx.ledger.balance_of(&owner), 5_000 - 1_000 - 100);
        assert_eq!(d.fx.ledger.balance_of(&d.fx.collector), 100);
    }

    #[test]
    fn delegated_transfer_requires_sender_role_on_relayer() {
        let d = delegated_fixture();
        let op = Ledger::transfer_proof(ProofToken::random(), 0, account(12), 100);
        let proof = Proof::sign(&d.owner_keys, &op).unwrap();
        let stranger = account(13);
        assert!(matches!(
            d.fx.ledger.delegated_transfer(&stranger, &op, &proof),
            Err(LedgerError::RoleRequired { .. })
        ));
    }

    #[test]
    fn delegated_transfer_replay_rejected() {
        let d = delegated_fixture();
        let op = Ledger::transfer_proof(ProofToken::random(), 0, account(12), 100);
        let proof = Proof::sign(&d.owner_keys, &op).unwrap();

        d.fx
            .ledger
            .delegated_transfer(&d.relayer, &op, &proof)
            .unwrap();
        assert!(matches!(
            d.fx.ledger.delegated_transfer(&d.relayer, &op, &proof),
            Err(LedgerError::Proof(auric_proof::ProofError::ProofReplayed(_)))
        ));
        // First execution stands, second changed nothing.
        assert_eq!(d.fx.ledger.balance_of(&account(12)), 100);
    }

    #[test]
    fn delegated_transfer_with_altered_amount_rejected() {
        let d = delegated_fixture();
        let token = ProofToken::random();
        let signed = Ledger::transfer_proof(token, 0, account(12), 100);
        let proof = Proof::sign(&d.owner_keys, &signed).unwrap();
        let altered = Ledger::transfer_proof(token, 0, account(12), 200);

        assert!(matches!(
            d.fx.ledger.delegated_transfer(&d.relayer, &altered, &proof),
            Err(LedgerError::Proof(auric_proof::ProofError::InvalidProof))
        ));
    }

    #[test]
    fn insufficient_balance_does_not_burn_the_token() {
        let d = delegated_fixture();
        let op = Ledger::transfer_proof(ProofToken::random(), 0, account(12), 1_000_000);
        let proof = Proof::sign(&d.owner_keys, &op).unwrap();

        assert!(matches!(
            d.fx.ledger.delegated_transfer(&d.relayer, &op, &proof),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        // Retry after funding succeeds with the same token.
        d.fx.ledger.mint(&d.fx.admin, 2_000_000, vec![]).unwrap();
        d.fx.ledger
            .transfer(&d.fx.admin, &d.owner_keys.account_id(), 1_000_000)
            .unwrap();
        d.fx
            .ledger
            .delegated_transfer(&d.relayer, &op, &proof)
            .unwrap();
    }

    #[test]
    fn wrong_operation_kind_rejected() {
        let d = delegated_fixture();
        let op = Ledger::approve_proof(ProofToken::random(), 0, account(11), 100);
        let proof = Proof::sign(&d.owner_keys, &op).unwrap();
        assert!(matches!(
            d.fx.ledger.delegated_transfer(&d.relayer, &op, &proof),
            Err(LedgerError::UnexpectedOperation { .. })
        ));
    }
}
