//! # auric-core — Foundational Types for the Auric Custody Platform
//!
//! The leaf crate of the workspace DAG. Everything else depends on it; it
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every signed or hashed message in the
//!    platform flows through `CanonicalBytes::new()`. There is no other way
//!    to produce bytes for a proof signature or a content digest, which
//!    removes the "two serializations of the same message" defect class by
//!    construction.
//!
//! 2. **Newtype wrappers for domain primitives.** `AccountId`,
//!    `ContentDigest`, `Timestamp` — no bare byte arrays or strings in
//!    public APIs.
//!
//! 3. **UTC-only timestamps.** `Timestamp` enforces UTC with seconds
//!    precision, so ledger time comparisons (the escrow resolution window)
//!    are deterministic. Wall-clock access goes through the [`Clock`] trait
//!    so time-dependent rules are testable.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `auric-*` crates.
//! - No `unsafe` code, no `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::CoreError;
pub use identity::{AccountId, SaleRequestId, TradeId};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
