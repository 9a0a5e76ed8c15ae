//! # auric-custody — Hot-Wallet Custody Layer
//!
//! Executes buys and sells against a pool of ledger units held under the
//! custody account. Two trust tiers:
//!
//! - **Direct paths** ([`CustodyService::buy`] / [`CustodyService::sell`]):
//!   for trusted manager callers, capped per call — no proof consulted,
//!   the cap is the safety envelope.
//! - **Proof-gated paths**: a manager-signed buy above the cap, and the
//!   delegated sale-request workflow — a user pre-authorizes a sell with
//!   their own signature, funds move into custody, and a manager proof
//!   later approves (custody keeps the funds) or rejects (full refund).
//!
//! A sale request resolves exactly once; any second processing attempt
//! fails with [`CustodyError::RequestAlreadyProcessed`].

pub mod error;
pub mod sale;
pub mod service;

pub use error::CustodyError;
pub use sale::{CustodyEvent, SaleRequest, SaleStatus};
pub use service::{CustodyConfig, CustodyService};
