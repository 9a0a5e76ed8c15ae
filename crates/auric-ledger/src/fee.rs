//! Transfer commission policy.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use auric_core::AccountId;

use crate::error::LedgerError;

/// Upper bound of the commission rate: 10000 bps = 100%.
pub const MAX_COMMISSION_BPS: u32 = 10_000;

/// The ledger's fee configuration.
///
/// The commission applies per transfer, computed from the rate in effect
/// at execution time. Exemption is symmetric: a transfer is free when
/// either party is fee-exempt or an allow-listed service account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeePolicy {
    commission_bps: u32,
    fee_collector: AccountId,
    fee_exempt: HashSet<AccountId>,
    allowed_services: HashSet<AccountId>,
}

impl FeePolicy {
    /// Create a policy with the given collector and rate.
    pub fn new(fee_collector: AccountId, commission_bps: u32) -> Result<Self, LedgerError> {
        if commission_bps > MAX_COMMISSION_BPS {
            return Err(LedgerError::CommissionOutOfRange(commission_bps));
        }
        Ok(Self {
            commission_bps,
            fee_collector,
            fee_exempt: HashSet::new(),
            allowed_services: HashSet::new(),
        })
    }

    /// Commission for a transfer: `amount * bps / 10000`, rounded down;
    /// zero when either party is exempt.
    pub fn commission_for(&self, amount: u64, sender: &AccountId, recipient: &AccountId) -> u64 {
        if self.is_exempt(sender) || self.is_exempt(recipient) {
            return 0;
        }
        ((amount as u128 * self.commission_bps as u128) / MAX_COMMISSION_BPS as u128) as u64
    }

    pub fn commission_bps(&self) -> u32 {
        self.commission_bps
    }

    pub fn fee_collector(&self) -> &AccountId {
        &self.fee_collector
    }

    /// Change the commission rate. Takes effect on the next transfer.
    pub fn set_commission_bps(&mut self, bps: u32) -> Result<(), LedgerError> {
        if bps > MAX_COMMISSION_BPS {
            return Err(LedgerError::CommissionOutOfRange(bps));
        }
        self.commission_bps = bps;
        Ok(())
    }

    pub fn set_fee_exempt(&mut self, account: &AccountId, exempt: bool) {
        if exempt {
            self.fee_exempt.insert(*account);
        } else {
            self.fee_exempt.remove(account);
        }
    }

    pub fn set_allowed_service(&mut self, account: &AccountId, allowed: bool) {
        if allowed {
            self.allowed_services.insert(*account);
        } else {
            self.allowed_services.remove(account);
        }
    }

    pub fn is_exempt(&self, account: &AccountId) -> bool {
        self.fee_exempt.contains(account) || self.allowed_services.contains(account)
    }
}
