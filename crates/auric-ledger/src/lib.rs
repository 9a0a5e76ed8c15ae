//! # auric-ledger — Fee-Bearing Balance Ledger
//!
//! The platform's unit of account. Balances and allowances live behind one
//! lock so that a transfer — debit, fee split, credit — is a single atomic
//! step; concurrent submissions are serialized by lock order and the loser
//! observes post-transition balances, never a partial split.
//!
//! Three layers:
//!
//! - **Fee engine** ([`fee`]): transfer commission in basis points, with
//!   fee-exempt accounts and allow-listed service accounts (escrow and
//!   custody move funds commission-free).
//! - **Ledger proper** ([`ledger`]): transfer / approve / transfer_from,
//!   plus mint and burn bound to custody evidence references, gated by
//!   [`Role::Minter`](auric_access::Role).
//! - **Delegated operations**: a fund owner signs an approve or transfer
//!   proof off-chain; a relayer holding [`Role::Sender`](auric_access::Role)
//!   submits it and is compensated with the signed-in network fee.

pub mod error;
pub mod event;
pub mod fee;
pub mod ledger;

pub use error::LedgerError;
pub use event::LedgerEvent;
pub use fee::{FeePolicy, MAX_COMMISSION_BPS};
pub use ledger::{Ledger, LedgerConfig};
