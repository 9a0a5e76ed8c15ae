//! # auric-proof — Signed-Proof Authorization Framework
//!
//! Every privileged entry point in the platform is gated by an off-chain
//! signature over a typed operation payload, not by the submitting caller
//! alone. This crate is that gate:
//!
//! - [`Operation`] — a tagged union with one strongly-typed variant per
//!   privileged entry point. The serde tag doubles as the operation
//!   discriminator, so a signature for one operation can never authorize
//!   another even over identical raw parameters.
//! - [`ProofToken`] — the single-use 32-byte value bound into every signed
//!   payload. Tokens are chosen by the client; freshness is what the
//!   platform enforces.
//! - [`ReplayGuard`] — the set of consumed tokens. Insert-once semantics
//!   settle concurrent submissions of the same proof: exactly one wins,
//!   the rest observe [`ProofError::ProofReplayed`].
//! - [`ProofVerifier`] — the verification pipeline: service whitelist,
//!   signature over the recomputed canonical payload, signer requirement,
//!   then token consumption. It runs before any value movement; its only
//!   side effect is the replay-guard insertion.

pub mod error;
pub mod operation;
pub mod replay;
pub mod token;
pub mod verifier;

pub use error::ProofError;
pub use operation::Operation;
pub use replay::ReplayGuard;
pub use token::ProofToken;
pub use verifier::{Proof, ProofVerifier, SignerRequirement};
