// SPDX-License-Identifier: MIT
//! # Deal Records and Lifecycle State
//!
//! The deal record, its two participant accounts, and the lifecycle state
//! machine the engine enforces:
//!
//! ```text
//! (absent) ──start()──▶ Started ──accept()──▶ Accepted ──finalize()──▶ Finalized
//!                          │                                               │
//!                      cancel()                                    seller_signals()
//!                          │                                               │
//!                          ▼                                               ▼
//!                       Canceled                                        Signaled
//! ```
//!
//! `Canceled` is terminal. `Signaled` is the terminal *operating* state:
//! reveals and withdrawals settle funds without any further state change.
//! No transition is reversible.
//!
//! ## Design Choice: Validated Enum over Typestate
//!
//! The state machine is a runtime-checked enum rather than typestate.
//! Deals are stored in a map and projected over a serialization boundary
//! where the state is not known at compile time, and each transition has
//! a dedicated engine method accepting operation-specific arguments, which
//! already gives every call site a typed surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sigsale_core::{Address, DealId, Secret, SignalCommitment};

// ---------------------------------------------------------------------------
// Lifecycle state
// ---------------------------------------------------------------------------

/// The lifecycle state of a deal.
///
/// States are strictly monotonic per the transition graph above. A deal
/// that is absent from the store is "not started"; `start` is the only
/// way a record comes into being.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealState {
    /// Buyer has escrowed the payment and named the seller.
    Started,
    /// Seller has matched the deposit; the offer is live.
    Accepted,
    /// Buyer has committed a signal hash.
    Finalized,
    /// Seller has committed a signal hash. Terminal operating state:
    /// reveals and withdrawals happen here without further transitions.
    Signaled,
    /// Buyer backed out of a started deal. Terminal state.
    Canceled,
}

impl DealState {
    /// The canonical string name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Accepted => "ACCEPTED",
            Self::Finalized => "FINALIZED",
            Self::Signaled => "SIGNALED",
            Self::Canceled => "CANCELED",
        }
    }

    /// Whether this state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Signaled | Self::Canceled)
    }
}

impl std::fmt::Display for DealState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// The two participant roles of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Buyer,
    Seller,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buyer => write!(f, "buyer"),
            Self::Seller => write!(f, "seller"),
        }
    }
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// One party's account within a deal.
///
/// `balance` is the deal-local settlement account in ledger units. It may
/// go transiently negative between the two reveals (a revealer burns its
/// signal before its counterpart's principal release lands) and is
/// non-negative once both sides have settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Opaque identity handle.
    pub address: Address,
    /// Deal-local settlement balance, credit owed to this participant.
    pub balance: i64,
    /// Satisfaction declaration; defaults to true at role creation and is
    /// mutated only by this participant's reveal.
    pub happy: bool,
    /// Whether this participant has revealed.
    pub revealed: bool,
    /// Committed signal hash. Immutable between commit and the matching
    /// reveal.
    pub signal_hash: Option<SignalCommitment>,
    /// Revealed signal value; set only on reveal.
    pub signal_value: Option<u64>,
    /// Revealed nonce; recorded for observation only.
    pub secret: Option<Secret>,
}

impl Participant {
    /// Fresh participant account for a newly created role.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balance: 0,
            happy: true,
            revealed: false,
            signal_hash: None,
            signal_value: None,
            secret: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Deal
// ---------------------------------------------------------------------------

/// One escrow transaction instance, keyed by its caller-assigned id.
///
/// Created by `start`, mutated by the lifecycle operations, never deleted.
/// `offer` is fixed at creation by the exact-split law: each side's
/// deposit equals the offer, so `offer == deposit == (payment − bond) / 2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub deal_id: DealId,
    pub state: DealState,
    pub offer: u64,
    pub buyer: Participant,
    pub seller: Participant,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    /// Create a deal in `Started` with fresh participant accounts.
    pub fn started(deal_id: DealId, buyer: Address, seller: Address, offer: u64) -> Self {
        let now = Utc::now();
        Self {
            deal_id,
            state: DealState::Started,
            offer,
            buyer: Participant::new(buyer),
            seller: Participant::new(seller),
            created_at: now,
            updated_at: now,
        }
    }

    /// The deposit each side escrows. Equal to the offer by construction.
    pub fn deposit(&self) -> u64 {
        self.offer
    }

    /// The role the given identity holds on this deal, if any.
    pub fn role_of(&self, address: &Address) -> Option<Role> {
        if *address == self.buyer.address {
            Some(Role::Buyer)
        } else if *address == self.seller.address {
            Some(Role::Seller)
        } else {
            None
        }
    }

    /// The participant account for a role.
    pub fn participant(&self, role: Role) -> &Participant {
        match role {
            Role::Buyer => &self.buyer,
            Role::Seller => &self.seller,
        }
    }

    /// Mutable participant account for a role.
    pub fn participant_mut(&mut self, role: Role) -> &mut Participant {
        match role {
            Role::Buyer => &mut self.buyer,
            Role::Seller => &mut self.seller,
        }
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// Read-only projection of a participant account.
///
/// Field order is part of the protocol surface:
/// `address, revealed, signal, happy, signal_hash, secret, balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub address: Address,
    pub revealed: bool,
    pub signal: Option<u64>,
    pub happy: bool,
    pub signal_hash: Option<SignalCommitment>,
    pub secret: Option<Secret>,
    pub balance: i64,
}

impl From<&Participant> for ParticipantView {
    fn from(p: &Participant) -> Self {
        Self {
            address: p.address,
            revealed: p.revealed,
            signal: p.signal_value,
            happy: p.happy,
            signal_hash: p.signal_hash,
            secret: p.secret,
            balance: p.balance,
        }
    }
}

/// Read-only projection of a deal, as returned by every engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealView {
    pub deal_id: DealId,
    pub offer: u64,
    pub state: DealState,
    pub buyer: ParticipantView,
    pub seller: ParticipantView,
}

impl From<&Deal> for DealView {
    fn from(deal: &Deal) -> Self {
        Self {
            deal_id: deal.deal_id,
            offer: deal.offer,
            state: deal.state,
            buyer: ParticipantView::from(&deal.buyer),
            seller: ParticipantView::from(&deal.seller),
        }
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

    fn sample_deal() -> Deal {
        Deal::started(DealId::from_bytes([0x01; 32]), addr(0xb0), addr(0x5e), 5)
    }

    #[test]
    fn started_deal_has_fresh_participants() {
        let deal = sample_deal();
        assert_eq!(deal.state, DealState::Started);
        assert_eq!(deal.offer, 5);
        assert_eq!(deal.deposit(), 5);
        for p in [&deal.buyer, &deal.seller] {
            assert_eq!(p.balance, 0);
            assert!(p.happy);
            assert!(!p.revealed);
            assert!(p.signal_hash.is_none());
            assert!(p.signal_value.is_none());
            assert!(p.secret.is_none());
        }
    }

    #[test]
    fn role_of_distinguishes_parties() {
        let deal = sample_deal();
        assert_eq!(deal.role_of(&addr(0xb0)), Some(Role::Buyer));
        assert_eq!(deal.role_of(&addr(0x5e)), Some(Role::Seller));
        assert_eq!(deal.role_of(&addr(0x99)), None);
    }

    #[test]
    fn terminal_states() {
        assert!(DealState::Signaled.is_terminal());
        assert!(DealState::Canceled.is_terminal());
        assert!(!DealState::Started.is_terminal());
        assert!(!DealState::Accepted.is_terminal());
        assert!(!DealState::Finalized.is_terminal());
    }

    #[test]
    fn state_display_is_canonical() {
        assert_eq!(DealState::Started.to_string(), "STARTED");
        assert_eq!(DealState::Signaled.to_string(), "SIGNALED");
    }

    #[test]
    fn participant_view_field_order_is_fixed() {
        let deal = sample_deal();
        let view = ParticipantView::from(&deal.buyer);
        let json = serde_json::to_string(&view).unwrap();
        let order = [
            "\"address\"",
            "\"revealed\"",
            "\"signal\"",
            "\"happy\"",
            "\"signal_hash\"",
            "\"secret\"",
            "\"balance\"",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|key| json.find(key).expect("field present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "field order drifted: {json}");
    }

    #[test]
    fn deal_view_projects_both_parties() {
        let deal = sample_deal();
        let view = DealView::from(&deal);
        assert_eq!(view.offer, 5);
        assert_eq!(view.buyer.address, addr(0xb0));
        assert_eq!(view.seller.address, addr(0x5e));
    }
}
