// SPDX-License-Identifier: MIT
//! # Deal Store
//!
//! Create-once deal storage backed by `DashMap`. The `mutate` pattern
//! keeps state transitions TOCTOU-free and whole-or-nothing: the closure
//! runs against a staged copy under a single entry lock and the copy is
//! committed only on `Ok`, so a failing precondition leaves the stored
//! deal byte-for-byte untouched.

use dashmap::DashMap;

use sigsale_core::DealId;

use crate::deal::Deal;
use crate::error::EscrowError;

/// In-memory deal storage, keyed by [`DealId`].
#[derive(Debug, Default)]
pub struct DealStore {
    deals: DashMap<DealId, Deal>,
}

impl DealStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            deals: DashMap::new(),
        }
    }

    /// Insert a new deal. Fails `AlreadyExists` if the id is taken —
    /// deal ids are create-once, regardless of the other arguments.
    pub fn create(&self, deal: Deal) -> Result<(), EscrowError> {
        match self.deals.entry(deal.deal_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(EscrowError::AlreadyExists(deal.deal_id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(deal);
                Ok(())
            }
        }
    }

    /// Clone out a deal. Fails `NotFound` if absent.
    pub fn get(&self, deal_id: &DealId) -> Result<Deal, EscrowError> {
        self.deals
            .get(deal_id)
            .map(|entry| entry.value().clone())
            .ok_or(EscrowError::NotFound(*deal_id))
    }

    /// Atomically mutate a deal under its entry lock.
    ///
    /// The closure receives a staged copy; the copy replaces the stored
    /// deal only if the closure returns `Ok`. On `Err` nothing is
    /// committed.
    pub fn mutate<T>(
        &self,
        deal_id: &DealId,
        f: impl FnOnce(&mut Deal) -> Result<T, EscrowError>,
    ) -> Result<T, EscrowError> {
        let mut entry = self
            .deals
            .get_mut(deal_id)
            .ok_or(EscrowError::NotFound(*deal_id))?;
        let mut staged = entry.value().clone();
        let out = f(&mut staged)?;
        staged.updated_at = chrono::Utc::now();
        *entry.value_mut() = staged;
        Ok(out)
    }

    /// Number of deals ever created.
    pub fn len(&self) -> usize {
        self.deals.len()
    }

    /// Whether the store holds no deals.
    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    /// Snapshot of all deals.
    pub fn list(&self) -> Vec<Deal> {
        self.deals.iter().map(|entry| entry.value().clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::DealState;
    use sigsale_core::Address;

    fn sample_deal(id_fill: u8) -> Deal {
        Deal::started(
            DealId::from_bytes([id_fill; 32]),
            Address::from_bytes([0xb0; 20]),
            Address::from_bytes([0x5e; 20]),
            5,
        )
    }

    #[test]
    fn create_then_get() {
        let store = DealStore::new();
        let deal = sample_deal(1);
        store.create(deal.clone()).unwrap();
        assert_eq!(store.get(&deal.deal_id).unwrap(), deal);
    }

    #[test]
    fn create_is_once_per_id() {
        let store = DealStore::new();
        store.create(sample_deal(1)).unwrap();
        assert!(matches!(
            store.create(sample_deal(1)),
            Err(EscrowError::AlreadyExists(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_missing_fails_not_found() {
        let store = DealStore::new();
        assert!(matches!(
            store.get(&DealId::from_bytes([9; 32])),
            Err(EscrowError::NotFound(_))
        ));
    }

    #[test]
    fn mutate_commits_on_ok() {
        let store = DealStore::new();
        let deal = sample_deal(1);
        store.create(deal.clone()).unwrap();
        store
            .mutate(&deal.deal_id, |d| {
                d.state = DealState::Canceled;
                Ok(())
            })
            .unwrap();
        assert_eq!(store.get(&deal.deal_id).unwrap().state, DealState::Canceled);
    }

    #[test]
    fn mutate_discards_on_err() {
        let store = DealStore::new();
        let deal = sample_deal(1);
        store.create(deal.clone()).unwrap();
        let result: Result<(), _> = store.mutate(&deal.deal_id, |d| {
            // Mutate first, then fail: the staged copy must be discarded.
            d.state = DealState::Canceled;
            d.buyer.balance = 999;
            Err(EscrowError::InvalidAmount("forced".into()))
        });
        assert!(result.is_err());
        let stored = store.get(&deal.deal_id).unwrap();
        assert_eq!(stored.state, DealState::Started);
        assert_eq!(stored.buyer.balance, 0);
    }

    #[test]
    fn mutate_missing_fails_not_found() {
        let store = DealStore::new();
        let result = store.mutate(&DealId::from_bytes([7; 32]), |_| Ok(()));
        assert!(matches!(result, Err(EscrowError::NotFound(_))));
    }
}
