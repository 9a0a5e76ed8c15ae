//! Role vocabulary and lookup capabilities.

use serde::{Deserialize, Serialize};

use auric_core::AccountId;

/// Roles an account may hold. An account can hold any number of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Administrative operators: validate/resolve trades, approve sale
    /// requests, tune ledger fees.
    Manager,
    /// Backend accounts allowed to sign operational proofs.
    Signer,
    /// Relayer accounts allowed to submit delegated ledger operations.
    Sender,
    /// Accounts allowed to mint against custody evidence.
    Minter,
    /// Trade-desk operators: register and finish escrow trades.
    TradeDesk,
    /// Service accounts cleared to consume signed proofs at all. A service
    /// whose account lacks this role rejects every proof it is handed.
    SignatureWhitelisted,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Signer => "signer",
            Self::Sender => "sender",
            Self::Minter => "minter",
            Self::TradeDesk => "trade_desk",
            Self::SignatureWhitelisted => "signature_whitelisted",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only role lookup, injected into the proof verifier and services.
pub trait RoleProvider: Send + Sync {
    fn has_role(&self, account: &AccountId, role: Role) -> bool;
}

/// Role lookup plus the mutation used by proof-gated grants.
pub trait RoleStore: RoleProvider {
    fn set_role(&self, account: &AccountId, role: Role, enabled: bool);
}

// Shared handles look up roles like the registry they wrap, so a service
// holding an `Arc<dyn RoleStore>` can hand out a provider view of it.
impl<T: RoleProvider + ?Sized> RoleProvider for std::sync::Arc<T> {
    fn has_role(&self, account: &AccountId, role: Role) -> bool {
        (**self).has_role(account, role)
    }
}
