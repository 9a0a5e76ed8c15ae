//! In-memory access registry.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use auric_core::AccountId;

use crate::role::{Role, RoleProvider, RoleStore};

/// In-memory role registry.
///
/// The production deployment may back this with durable storage; the
/// traits are what the rest of the workspace depends on. In tests this
/// doubles as the fixed-role stand-in.
#[derive(Default)]
pub struct AccessRegistry {
    grants: RwLock<HashMap<AccountId, HashSet<Role>>>,
}

impl AccessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a role to an account. Convenience for wiring and tests;
    /// equivalent to `set_role(account, role, true)`.
    pub fn grant(&self, account: &AccountId, role: Role) {
        self.set_role(account, role, true);
    }

    /// Remove a role from an account.
    pub fn revoke(&self, account: &AccountId, role: Role) {
        self.set_role(account, role, false);
    }

    /// All roles currently held by an account.
    pub fn roles_of(&self, account: &AccountId) -> Vec<Role> {
        self.grants
            .read()
            .get(account)
            .map(|roles| roles.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl RoleProvider for AccessRegistry {
    fn has_role(&self, account: &AccountId, role: Role) -> bool {
        self.grants
            .read()
            .get(account)
            .is_some_and(|roles| roles.contains(&role))
    }
}

impl RoleStore for AccessRegistry {
    fn set_role(&self, account: &AccountId, role: Role, enabled: bool) {
        let mut grants = self.grants.write();
        if enabled {
            grants.entry(*account).or_default().insert(role);
        } else if let Some(roles) = grants.get_mut(account) {
            roles.remove(&role);
            if roles.is_empty() {
                grants.remove(account);
            }
        }
    }
}

impl std::fmt::Debug for AccessRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessRegistry")
            .field("accounts", &self.grants.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(n: u8) -> AccountId {
        AccountId::from_bytes([n; 32])
    }

    #[test]
    fn grant_and_lookup() {
        let registry = AccessRegistry::new();
        let ops = account(1);
        assert!(!registry.has_role(&ops, Role::Manager));
        registry.grant(&ops, Role::Manager);
        assert!(registry.has_role(&ops, Role::Manager));
        assert!(!registry.has_role(&ops, Role::Minter));
    }

    #[test]
    fn revoke_removes_only_that_role() {
        let registry = AccessRegistry::new();
        let desk = account(2);
        registry.grant(&desk, Role::TradeDesk);
        registry.grant(&desk, Role::Signer);
        registry.revoke(&desk, Role::TradeDesk);
        assert!(!registry.has_role(&desk, Role::TradeDesk));
        assert!(registry.has_role(&desk, Role::Signer));
    }

    #[test]
    fn roles_of_lists_grants() {
        let registry = AccessRegistry::new();
        let acct = account(3);
        registry.grant(&acct, Role::Sender);
        registry.grant(&acct, Role::Signer);
        let mut roles = registry.roles_of(&acct);
        roles.sort_by_key(|r| r.as_str());
        assert_eq!(roles, vec![Role::Sender, Role::Signer]);
    }

    #[test]
    fn set_role_disable_on_unknown_account_is_noop() {
        let registry = AccessRegistry::new();
        registry.set_role(&account(9), Role::Manager, false);
        assert!(registry.roles_of(&account(9)).is_empty());
    }
}
