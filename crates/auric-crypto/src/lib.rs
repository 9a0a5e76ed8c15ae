//! # auric-crypto — Signing Primitives for Proof Authorization
//!
//! Ed25519 key handling for the signed-proof framework:
//!
//! - [`SigningKeyPair`] — held by off-chain actors (buyers, sellers, trade
//!   desk, backend) to sign operation payloads.
//! - [`PublicKey`] / [`Signature`] — the verification half carried inside a
//!   submitted proof; both serialize as hex strings.
//! - Account identity: an actor's [`AccountId`](auric_core::AccountId) is
//!   its public key bytes, so a verified signature pins the acting account
//!   with no separate registration step.
//!
//! ## Security Invariants
//!
//! - Signing and verification accept only
//!   [`CanonicalBytes`](auric_core::CanonicalBytes) — raw byte slices have
//!   no entry point, so every signature covers a canonically serialized
//!   operation.
//! - Private keys are never serialized; `SigningKeyPair` implements neither
//!   `Serialize` nor `Debug`-with-contents.

pub mod error;
pub mod keys;

pub use error::CryptoError;
pub use keys::{verify, PublicKey, Signature, SigningKeyPair};
