//! # auric-escrow — Proof-Gated Trade Escrow
//!
//! Mediates two-party trades by holding the gross amount (`trade_cap`) in
//! custody between payment and settlement. Every lifecycle transition is
//! authorized by a signed proof; the funds themselves move on the
//! [`Ledger`](auric_ledger::Ledger) under the escrow's own account.
//!
//! ## Lifecycle
//!
//! ```text
//! register ──▶ Registered ──validate──▶ Valid ──pay──▶ Paid
//!                                                       │
//!                                  ┌────────finish──────┘
//!                                  ▼
//!                               Finished ──release──▶ [Released]
//!                                  │
//!                 Paid | Finished ─┴─resolve (after window)──▶ [Resolved]
//! ```
//!
//! Settlement pays `sellers_part` to the seller and `trade_cap −
//! sellers_part` to the fee recipient; a buyer-favoring resolution refunds
//! the full `trade_cap`. Funds move at release/resolve only — `finish`
//! marks readiness and nothing else. Trades are never deleted: a settled
//! record stays queryable as the audit trail.

pub mod error;
pub mod service;
pub mod trade;

pub use error::EscrowError;
pub use service::{EscrowConfig, EscrowService};
pub use trade::{next_status, Resolution, Trade, TradeAction, TradeEvent, TradeStatus};
