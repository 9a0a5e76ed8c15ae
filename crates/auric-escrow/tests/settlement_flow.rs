//! End-to-end escrow scenarios over a live ledger and access registry.

use std::sync::Arc;

use auric_access::{AccessRegistry, Role, RoleProvider, RoleStore};
use auric_core::{AccountId, ManualClock, Timestamp, TradeId};
use auric_crypto::SigningKeyPair;
use auric_escrow::{EscrowConfig, EscrowError, EscrowService, TradeStatus};
use auric_ledger::{Ledger, LedgerConfig, LedgerError};
use auric_proof::{Proof, ProofError, ProofToken};

struct Harness {
    registry: Arc<AccessRegistry>,
    ledger: Arc<Ledger>,
    escrow: EscrowService,
    clock: Arc<ManualClock>,
    manager: SigningKeyPair,
    desk: SigningKeyPair,
    buyer: SigningKeyPair,
    seller: AccountId,
    fee_recipient: AccountId,
}

fn account(n: u8) -> AccountId {
    AccountId::from_bytes([n; 32])
}

/// Wire a registry, ledger, and escrow the way a deployment does: service
/// accounts whitelisted and allow-listed, operator roles granted, the
/// buyer funded and pre-approved.
fn harness() -> Harness {
    let registry = Arc::new(AccessRegistry::new());
    let manager = SigningKeyPair::generate();
    let desk = SigningKeyPair::generate();
    let buyer = SigningKeyPair::generate();
    let seller = account(40);
    let fee_recipient = account(41);
    let escrow_account = account(42);
    let ledger_account = account(43);
    let collector = account(44);

    registry.grant(&manager.account_id(), Role::Manager);
    registry.grant(&manager.account_id(), Role::Minter);
    registry.grant(&desk.account_id(), Role::TradeDesk);
    registry.grant(&escrow_account, Role::SignatureWhitelisted);
    registry.grant(&ledger_account, Role::SignatureWhitelisted);

    let ledger = Arc::new(
        Ledger::new(
            registry.clone() as Arc<dyn RoleProvider>,
            LedgerConfig {
                service_account: ledger_account,
                fee_collector: collector,
                commission_bps: 100,
            },
        )
        .unwrap(),
    );

    let admin = manager.account_id();
    ledger
        .set_allowed_service(&admin, &escrow_account, true)
        .unwrap();
    ledger.set_fee_exempt(&admin, &admin, true).unwrap();

    // Fund the buyer and pre-approve the escrow for plenty.
    ledger.mint(&admin, 1_000_000, vec!["vault-batch-1".into()]).unwrap();
    ledger
        .transfer(&admin, &buyer.account_id(), 500_000)
        .unwrap();
    ledger
        .approve(&buyer.account_id(), &escrow_account, 500_000)
        .unwrap();

    let clock = Arc::new(ManualClock::new(
        Timestamp::parse("2026-02-01T00:00:00Z").unwrap(),
    ));
    let escrow = EscrowService::new(
        registry.clone() as Arc<dyn RoleStore>,
        ledger.clone(),
        clock.clone(),
        EscrowConfig {
            escrow_account,
            fee_recipient,
        },
    );

    Harness {
        registry,
        ledger,
        escrow,
        clock,
        manager,
        desk,
        buyer,
        seller,
        fee_recipient,
    }
}

fn trade_id(s: &str) -> TradeId {
    TradeId::new(s).unwrap()
}

fn evidence() -> Vec<String> {
    vec!["https://files.example/trade-contract.pdf".into()]
}

/// Register a 1000/900 trade with a 60-second resolution window.
fn register_default(h: &Harness, id: &str) {
    let op = EscrowService::register_proof(
        ProofToken::random(),
        trade_id(id),
        evidence(),
        h.seller,
        h.buyer.account_id(),
        1_000,
        900,
        60,
    );
    let proof = Proof::sign(&h.desk, &op).unwrap();
    h.escrow.register_trade(&op, &proof).unwrap();
}

fn validate(h: &Harness, id: &str) {
    let op = EscrowService::validate_proof(ProofToken::random(), trade_id(id), evidence());
    let proof = Proof::sign(&h.manager, &op).unwrap();
    h.escrow.validate_trade(&op, &proof).unwrap();
}

fn pay(h: &Harness, id: &str) {
    let op = EscrowService::pay_proof(
        ProofToken::random(),
        trade_id(id),
        evidence(),
        h.buyer.account_id(),
    );
    let proof = Proof::sign(&h.buyer, &op).unwrap();
    h.escrow.pay_trade(&op, &proof).unwrap();
}

fn finish(h: &Harness, id: &str) {
    let op = EscrowService::finish_proof(ProofToken::random(), trade_id(id), evidence());
    let proof = Proof::sign(&h.desk, &op).unwrap();
    h.escrow.finish_trade(&op, &proof).unwrap();
}

#[test]
fn full_lifecycle_conserves_funds() {
    let h = harness();
    let supply_before = h.ledger.total_supply();
    register_default(&h, "trade-1");

    let trade = h.escrow.get_trade(&trade_id("trade-1")).unwrap();
    assert_eq!(trade.status, TradeStatus::Registered);
    assert_eq!(trade.trade_cap, 1_000);
    assert_eq!(trade.sellers_part, 900);

    validate(&h, "trade-1");
    assert_eq!(
        h.escrow.get_trade(&trade_id("trade-1")).unwrap().status,
        TradeStatus::Valid
    );

    let buyer_before = h.ledger.balance_of(&h.buyer.account_id());
    pay(&h, "trade-1");
    assert_eq!(
        h.ledger.balance_of(&h.buyer.account_id()),
        buyer_before - 1_000
    );
    assert_eq!(h.ledger.balance_of(&h.escrow.escrow_account()), 1_000);

    finish(&h, "trade-1");

    let op = EscrowService::release_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        h.buyer.account_id(),
    );
    let proof = Proof::sign(&h.buyer, &op).unwrap();
    h.escrow.release_trade(&op, &proof).unwrap();

    // Seller gets exactly 900, fee recipient exactly 100, supply unchanged.
    assert_eq!(h.ledger.balance_of(&h.seller), 900);
    assert_eq!(h.ledger.balance_of(&h.fee_recipient), 100);
    assert_eq!(h.ledger.balance_of(&h.escrow.escrow_account()), 0);
    assert_eq!(h.ledger.total_supply(), supply_before);

    let trade = h.escrow.get_trade(&trade_id("trade-1")).unwrap();
    assert_eq!(trade.status, TradeStatus::Released);
    assert!(trade.status.is_terminal());
}

#[test]
fn duplicate_registration_rejected() {
    let h = harness();
    register_default(&h, "trade-1");

    let op = EscrowService::register_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        h.seller,
        h.buyer.account_id(),
        2_000,
        1_800,
        60,
    );
    let proof = Proof::sign(&h.desk, &op).unwrap();
    assert!(matches!(
        h.escrow.register_trade(&op, &proof),
        Err(EscrowError::TradeAlreadyExists(_))
    ));
}

#[test]
fn transitions_out_of_order_rejected() {
    let h = harness();
    register_default(&h, "trade-1");

    // pay before validate
    let op = EscrowService::pay_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        h.buyer.account_id(),
    );
    let proof = Proof::sign(&h.buyer, &op).unwrap();
    assert!(matches!(
        h.escrow.pay_trade(&op, &proof),
        Err(EscrowError::InvalidTradeState { .. })
    ));

    // release before finish
    validate(&h, "trade-1");
    pay(&h, "trade-1");
    let op = EscrowService::release_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        h.buyer.account_id(),
    );
    let proof = Proof::sign(&h.buyer, &op).unwrap();
    assert!(matches!(
        h.escrow.release_trade(&op, &proof),
        Err(EscrowError::InvalidTradeState { .. })
    ));
}

#[test]
fn replayed_proof_rejected() {
    let h = harness();
    register_default(&h, "trade-1");

    let op = EscrowService::validate_proof(ProofToken::random(), trade_id("trade-1"), evidence());
    let proof = Proof::sign(&h.manager, &op).unwrap();
    h.escrow.validate_trade(&op, &proof).unwrap();
    assert!(matches!(
        h.escrow.validate_trade(&op, &proof),
        Err(EscrowError::Proof(ProofError::ProofReplayed(_)))
    ));
}

#[test]
fn altered_parameter_rejected_as_invalid_proof() {
    let h = harness();
    let token = ProofToken::random();
    let signed = EscrowService::register_proof(
        token,
        trade_id("trade-1"),
        evidence(),
        h.seller,
        h.buyer.account_id(),
        1_000,
        900,
        60,
    );
    let proof = Proof::sign(&h.desk, &signed).unwrap();

    // Same token and signature, sweeter terms.
    let altered = EscrowService::register_proof(
        token,
        trade_id("trade-1"),
        evidence(),
        h.seller,
        h.buyer.account_id(),
        1_000,
        1_000,
        60,
    );
    assert!(matches!(
        h.escrow.register_trade(&altered, &proof),
        Err(EscrowError::Proof(ProofError::InvalidProof))
    ));
    assert!(h.escrow.get_trade(&trade_id("trade-1")).is_none());
}

#[test]
fn unauthorized_signer_rejected_authorized_accepted() {
    let h = harness();
    let stranger = SigningKeyPair::generate();
    let op = EscrowService::register_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        h.seller,
        h.buyer.account_id(),
        1_000,
        900,
        60,
    );

    let bad = Proof::sign(&stranger, &op).unwrap();
    assert!(matches!(
        h.escrow.register_trade(&op, &bad),
        Err(EscrowError::Proof(ProofError::UnauthorizedSigner { .. }))
    ));

    // The identical operation signed by the trade desk goes through.
    let good = Proof::sign(&h.desk, &op).unwrap();
    h.escrow.register_trade(&op, &good).unwrap();
}

#[test]
fn pay_requires_the_buyers_own_signature() {
    let h = harness();
    register_default(&h, "trade-1");
    validate(&h, "trade-1");

    let op = EscrowService::pay_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        h.buyer.account_id(),
    );
    // Even a manager cannot sign the buyer's payment.
    let proof = Proof::sign(&h.manager, &op).unwrap();
    assert!(matches!(
        h.escrow.pay_trade(&op, &proof),
        Err(EscrowError::Proof(ProofError::UnauthorizedSigner { .. }))
    ));
}

#[test]
fn pay_without_allowance_surfaces_and_leaves_proof_reusable() {
    let h = harness();
    register_default(&h, "trade-1");
    validate(&h, "trade-1");

    // Drop the buyer's allowance below the cap.
    h.ledger
        .approve(&h.buyer.account_id(), &h.escrow.escrow_account(), 10)
        .unwrap();

    let op = EscrowService::pay_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        h.buyer.account_id(),
    );
    let proof = Proof::sign(&h.buyer, &op).unwrap();
    assert!(matches!(
        h.escrow.pay_trade(&op, &proof),
        Err(EscrowError::Ledger(LedgerError::InsufficientAllowance { .. }))
    ));

    // Fix the allowance; the same proof is still fresh and now succeeds.
    h.ledger
        .approve(&h.buyer.account_id(), &h.escrow.escrow_account(), 1_000)
        .unwrap();
    h.escrow.pay_trade(&op, &proof).unwrap();
    assert_eq!(
        h.escrow.get_trade(&trade_id("trade-1")).unwrap().status,
        TradeStatus::Paid
    );
}

#[test]
fn resolve_respects_the_window_then_pays_seller() {
    let h = harness();
    register_default(&h, "trade-1");
    validate(&h, "trade-1");
    pay(&h, "trade-1");

    let early = EscrowService::resolve_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        true,
        "seller shipped, buyer unresponsive".into(),
    );
    let proof = Proof::sign(&h.manager, &early).unwrap();
    assert!(matches!(
        h.escrow.resolve_trade(&early, &proof),
        Err(EscrowError::TooEarlyToResolve { .. })
    ));

    h.clock.advance_secs(61);

    // Same parameters, fresh token.
    let late = EscrowService::resolve_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        true,
        "seller shipped, buyer unresponsive".into(),
    );
    let proof = Proof::sign(&h.manager, &late).unwrap();
    let trade = h.escrow.resolve_trade(&late, &proof).unwrap();

    assert_eq!(trade.status, TradeStatus::Resolved);
    assert_eq!(h.ledger.balance_of(&h.seller), 900);
    assert_eq!(h.ledger.balance_of(&h.fee_recipient), 100);
    assert_eq!(
        trade.resolution.as_ref().map(|r| r.favor_seller),
        Some(true)
    );
}

#[test]
fn resolve_in_buyers_favor_refunds_the_full_cap() {
    let h = harness();
    register_default(&h, "trade-1");
    validate(&h, "trade-1");
    let buyer_before = h.ledger.balance_of(&h.buyer.account_id());
    pay(&h, "trade-1");

    h.clock.advance_secs(61);
    let op = EscrowService::resolve_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        false,
        "goods never shipped".into(),
    );
    let proof = Proof::sign(&h.manager, &op).unwrap();
    h.escrow.resolve_trade(&op, &proof).unwrap();

    assert_eq!(h.ledger.balance_of(&h.buyer.account_id()), buyer_before);
    assert_eq!(h.ledger.balance_of(&h.seller), 0);
    assert_eq!(h.ledger.balance_of(&h.escrow.escrow_account()), 0);
}

#[test]
fn resolve_requires_manager_even_after_window() {
    let h = harness();
    register_default(&h, "trade-1");
    validate(&h, "trade-1");
    pay(&h, "trade-1");
    h.clock.advance_secs(61);

    let op = EscrowService::resolve_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        true,
        "".into(),
    );
    let proof = Proof::sign(&h.desk, &op).unwrap();
    assert!(matches!(
        h.escrow.resolve_trade(&op, &proof),
        Err(EscrowError::Proof(ProofError::UnauthorizedSigner { .. }))
    ));
}

#[test]
fn sellers_part_above_cap_rejected() {
    let h = harness();
    let op = EscrowService::register_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        h.seller,
        h.buyer.account_id(),
        1_000,
        1_001,
        60,
    );
    let proof = Proof::sign(&h.desk, &op).unwrap();
    assert!(matches!(
        h.escrow.register_trade(&op, &proof),
        Err(EscrowError::SellersPartExceedsCap { .. })
    ));
}

#[test]
fn trade_desk_grant_via_manager_proof() {
    let h = harness();
    let recruit = SigningKeyPair::generate();

    let op = EscrowService::trade_desk_proof(ProofToken::random(), recruit.account_id(), true);
    let proof = Proof::sign(&h.manager, &op).unwrap();
    h.escrow.set_trade_desk(&op, &proof).unwrap();
    assert!(h
        .registry
        .has_role(&recruit.account_id(), Role::TradeDesk));

    // The recruit can now register trades.
    let op = EscrowService::register_proof(
        ProofToken::random(),
        trade_id("trade-2"),
        evidence(),
        h.seller,
        h.buyer.account_id(),
        500,
        450,
        60,
    );
    let proof = Proof::sign(&recruit, &op).unwrap();
    h.escrow.register_trade(&op, &proof).unwrap();
}

#[test]
fn events_track_each_transition_once() {
    let h = harness();
    register_default(&h, "trade-1");
    validate(&h, "trade-1");
    pay(&h, "trade-1");
    finish(&h, "trade-1");

    let op = EscrowService::release_proof(
        ProofToken::random(),
        trade_id("trade-1"),
        evidence(),
        h.buyer.account_id(),
    );
    let proof = Proof::sign(&h.buyer, &op).unwrap();
    h.escrow.release_trade(&op, &proof).unwrap();

    let events = h.escrow.events();
    assert_eq!(events.len(), 5);
}
