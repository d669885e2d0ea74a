// SPDX-License-Identifier: MIT
//! # Value Ledger
//!
//! Per-identity spendable balances backed by `DashMap`. The ledger is the
//! seam to the abstract external ledger: crediting increases an identity's
//! withdrawable balance; withdrawing drains the full balance in one atomic
//! step and hands back a [`Payout`] value representing funds leaving the
//! system. How funds physically move is the caller's concern.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use sigsale_core::Address;

use crate::error::EscrowError;

/// Funds leaving the system: the external payout produced by a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub to: Address,
    pub amount: u64,
}

/// Per-identity spendable balance ledger.
///
/// Thread-safe via `DashMap`; credit and withdraw each run under a single
/// entry lock, so concurrent operations on one identity serialize and
/// operations on distinct identities proceed independently.
#[derive(Debug, Default)]
pub struct ValueLedger {
    balances: DashMap<Address, u64>,
}

impl ValueLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }

    /// Atomically increase an identity's withdrawable balance.
    pub fn credit(&self, identity: &Address, amount: u64) {
        let mut entry = self.balances.entry(*identity).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Current withdrawable balance. Zero for unknown identities.
    pub fn balance(&self, identity: &Address) -> u64 {
        self.balances.get(identity).map(|b| *b).unwrap_or(0)
    }

    /// Pay out the identity's full balance and zero it, atomically.
    ///
    /// Fails `InsufficientBalance` if the balance is zero — a withdrawal
    /// with nothing to pay is a deterministic rejection, never a no-op.
    pub fn withdraw(&self, identity: &Address) -> Result<Payout, EscrowError> {
        let mut entry = self
            .balances
            .get_mut(identity)
            .ok_or(EscrowError::InsufficientBalance(*identity))?;
        let amount = *entry;
        if amount == 0 {
            return Err(EscrowError::InsufficientBalance(*identity));
        }
        *entry = 0;
        Ok(Payout {
            to: *identity,
            amount,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(fill: u8) -> Address {
        Address::from_bytes([fill; 20])
    }

    #[test]
    fn credit_accumulates() {
        let ledger = ValueLedger::new();
        ledger.credit(&addr(1), 5);
        ledger.credit(&addr(1), 7);
        assert_eq!(ledger.balance(&addr(1)), 12);
    }

    #[test]
    fn unknown_identity_has_zero_balance() {
        let ledger = ValueLedger::new();
        assert_eq!(ledger.balance(&addr(9)), 0);
    }

    #[test]
    fn withdraw_drains_full_balance() {
        let ledger = ValueLedger::new();
        ledger.credit(&addr(2), 11);
        let payout = ledger.withdraw(&addr(2)).unwrap();
        assert_eq!(payout, Payout { to: addr(2), amount: 11 });
        assert_eq!(ledger.balance(&addr(2)), 0);
    }

    #[test]
    fn withdraw_at_zero_fails() {
        let ledger = ValueLedger::new();
        assert!(matches!(
            ledger.withdraw(&addr(3)),
            Err(EscrowError::InsufficientBalance(_))
        ));
        ledger.credit(&addr(3), 4);
        ledger.withdraw(&addr(3)).unwrap();
        // Second withdrawal finds a zeroed balance and must also fail.
        assert!(matches!(
            ledger.withdraw(&addr(3)),
            Err(EscrowError::InsufficientBalance(_))
        ));
    }

    #[test]
    fn identities_are_independent() {
        let ledger = ValueLedger::new();
        ledger.credit(&addr(4), 3);
        ledger.credit(&addr(5), 8);
        assert_eq!(ledger.withdraw(&addr(4)).unwrap().amount, 3);
        assert_eq!(ledger.balance(&addr(5)), 8);
    }
}
