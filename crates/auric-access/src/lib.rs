//! # auric-access — Role Lookups for Proof Authorization
//!
//! The platform's privileged operations are authorized by *who signed*, not
//! by who submitted. This crate defines the role vocabulary and the
//! capability traits through which the rest of the workspace asks "does
//! this account hold role X" — and, for the one in-scope mutation path
//! (trade-desk grants issued through a manager proof), "give/remove role X".
//!
//! Role storage itself is a collaborator, not core logic: services receive
//! an `Arc<dyn RoleProvider>` (or `RoleStore`), and tests supply an
//! [`AccessRegistry`] preloaded with fixed role sets.

pub mod registry;
pub mod role;

pub use registry::AccessRegistry;
pub use role::{Role, RoleProvider, RoleStore};
