// SPDX-License-Identifier: MIT
//! # Anti-Griefing Bond Registry
//!
//! Per-identity bond lifecycle:
//!
//! ```text
//! NeverBonded ──post()──▶ CurrentlyBonded ──withdraw()──▶ Lapsed
//! ```
//!
//! `Lapsed` is permanent and one-shot: once an identity withdraws its
//! bond it can never again be the caller of `start` or `accept`, on any
//! deal. While `CurrentlyBonded`, one bond may back many concurrently
//! open deals.
//!
//! Whether an already-bonded identity must stake fresh funds on every
//! post is an explicit configuration choice ([`BondPolicy`]); the
//! protocol's observed behavior is reuse.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use sigsale_core::Address;

use crate::error::EscrowError;
use crate::ledger::Payout;

// ---------------------------------------------------------------------------
// Bond state and policy
// ---------------------------------------------------------------------------

/// Lifecycle state of an identity's bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BondState {
    /// Identity has never posted a bond.
    NeverBonded,
    /// Identity holds a live bond; it may back any number of open deals.
    CurrentlyBonded,
    /// Bond was withdrawn. Terminal: the identity may never bond again.
    Lapsed,
}

impl BondState {
    /// The canonical string name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeverBonded => "NEVER_BONDED",
            Self::CurrentlyBonded => "CURRENTLY_BONDED",
            Self::Lapsed => "LAPSED",
        }
    }
}

impl std::fmt::Display for BondState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a post by an already-bonded identity does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BondPolicy {
    /// The existing bond backs the new deal; no new funds required.
    /// This is the behavior the protocol's scenario evidence shows.
    #[default]
    ReuseWhileBonded,
    /// Fresh funds are consumed on every post; the posted amount
    /// accumulates on the record and pays out in full on withdrawal.
    FreshFundsPerDeal,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// One identity's bond record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondRecord {
    pub state: BondState,
    pub amount: u64,
}

/// Per-identity bond registry.
///
/// Thread-safe via `DashMap`; posts and withdrawals for one identity
/// serialize on the entry lock.
#[derive(Debug, Default)]
pub struct BondRegistry {
    bonds: DashMap<Address, BondRecord>,
    policy: BondPolicy,
}

impl BondRegistry {
    /// Create a registry with the given posting policy.
    pub fn new(policy: BondPolicy) -> Self {
        Self {
            bonds: DashMap::new(),
            policy,
        }
    }

    /// Current bond state. `NeverBonded` for unknown identities.
    pub fn state(&self, identity: &Address) -> BondState {
        self.bonds
            .get(identity)
            .map(|r| r.state)
            .unwrap_or(BondState::NeverBonded)
    }

    /// Currently bonded amount. Zero unless `CurrentlyBonded`.
    pub fn bonded_amount(&self, identity: &Address) -> u64 {
        self.bonds
            .get(identity)
            .filter(|r| r.state == BondState::CurrentlyBonded)
            .map(|r| r.amount)
            .unwrap_or(0)
    }

    /// Post a bond for an identity.
    ///
    /// Fails `BondLapsed` if the identity's bond has lapsed. A first post
    /// transitions `NeverBonded → CurrentlyBonded` and records the amount.
    /// A post while `CurrentlyBonded` follows the registry's [`BondPolicy`].
    pub fn post(&self, identity: &Address, amount: u64) -> Result<(), EscrowError> {
        let mut entry = self.bonds.entry(*identity).or_insert(BondRecord {
            state: BondState::NeverBonded,
            amount: 0,
        });
        match entry.state {
            BondState::Lapsed => Err(EscrowError::BondLapsed(*identity)),
            BondState::NeverBonded => {
                entry.state = BondState::CurrentlyBonded;
                entry.amount = amount;
                Ok(())
            }
            BondState::CurrentlyBonded => {
                if self.policy == BondPolicy::FreshFundsPerDeal {
                    entry.amount = entry.amount.saturating_add(amount);
                }
                Ok(())
            }
        }
    }

    /// Withdraw the bond: pay out the bonded amount and lapse permanently.
    ///
    /// Fails `NotBonded` unless the identity is `CurrentlyBonded`.
    pub fn withdraw(&self, identity: &Address) -> Result<Payout, EscrowError> {
        let mut entry = self
            .bonds
            .get_mut(identity)
            .ok_or(EscrowError::NotBonded(*identity))?;
        if entry.state != BondState::CurrentlyBonded {
            return Err(EscrowError::NotBonded(*identity));
        }
        let amount = entry.amount;
        entry.state = BondState::Lapsed;
        entry.amount = 0;
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
    fn unknown_identity_is_never_bonded() {
        let registry = BondRegistry::new(BondPolicy::default());
        assert_eq!(registry.state(&addr(1)), BondState::NeverBonded);
        assert_eq!(registry.bonded_amount(&addr(1)), 0);
    }

    #[test]
    fn first_post_bonds_and_records_amount() {
        let registry = BondRegistry::new(BondPolicy::default());
        registry.post(&addr(1), 2).unwrap();
        assert_eq!(registry.state(&addr(1)), BondState::CurrentlyBonded);
        assert_eq!(registry.bonded_amount(&addr(1)), 2);
    }

    #[test]
    fn repost_reuses_bond_under_default_policy() {
        let registry = BondRegistry::new(BondPolicy::ReuseWhileBonded);
        registry.post(&addr(1), 2).unwrap();
        registry.post(&addr(1), 2).unwrap();
        assert_eq!(registry.bonded_amount(&addr(1)), 2);
    }

    #[test]
    fn repost_accumulates_under_fresh_funds_policy() {
        let registry = BondRegistry::new(BondPolicy::FreshFundsPerDeal);
        registry.post(&addr(1), 2).unwrap();
        registry.post(&addr(1), 2).unwrap();
        assert_eq!(registry.bonded_amount(&addr(1)), 4);
    }

    #[test]
    fn withdraw_pays_out_and_lapses() {
        let registry = BondRegistry::new(BondPolicy::default());
        registry.post(&addr(1), 3).unwrap();
        let payout = registry.withdraw(&addr(1)).unwrap();
        assert_eq!(payout, Payout { to: addr(1), amount: 3 });
        assert_eq!(registry.state(&addr(1)), BondState::Lapsed);
    }

    #[test]
    fn lapsed_bond_is_permanent() {
        let registry = BondRegistry::new(BondPolicy::default());
        registry.post(&addr(1), 3).unwrap();
        registry.withdraw(&addr(1)).unwrap();
        assert!(matches!(
            registry.post(&addr(1), 3),
            Err(EscrowError::BondLapsed(_))
        ));
        assert!(matches!(
            registry.withdraw(&addr(1)),
            Err(EscrowError::NotBonded(_))
        ));
    }

    #[test]
    fn withdraw_without_bond_fails() {
        let registry = BondRegistry::new(BondPolicy::default());
        assert!(matches!(
            registry.withdraw(&addr(2)),
            Err(EscrowError::NotBonded(_))
        ));
    }
}
