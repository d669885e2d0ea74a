// SPDX-License-Identifier: MIT
//! # Escrow Engine
//!
//! The eight-operation orchestrator over [`DealStore`], [`BondRegistry`],
//! and [`ValueLedger`]. Owns the deal state machine and all arithmetic
//! rules:
//!
//! - **Exact split**: `start(payment)` succeeds iff `(payment − bond)` is
//!   even, and then `offer == deposit == (payment − bond) / 2`.
//! - **Commit-reveal**: a reveal is accepted iff
//!   `commitment_digest(secret, signal, happy)` equals the stored hash,
//!   bit-for-bit. Any mismatch rejects with no mutation.
//! - **Independent reveals**: each reveal settles on its own, using only
//!   the revealing party's committed values, and releases that party's
//!   previously posted principal to the counterpart. Either side may
//!   reveal first; the mechanism deliberately does not require
//!   simultaneity, and a revealer's bonus depends only on its *own*
//!   happy flag. That asymmetry is a confirmed protocol decision.
//!
//! Every operation validates its preconditions before touching state and
//! aborts with a typed [`EscrowError`] and zero side effects otherwise.

use tracing::debug;

use sigsale_core::{commitment_digest, Address, DealId, Secret, SignalCommitment};

use crate::bond::{BondPolicy, BondRegistry, BondState};
use crate::deal::{Deal, DealState, DealView, Role};
use crate::error::EscrowError;
use crate::ledger::{Payout, ValueLedger};
use crate::store::DealStore;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Engine configuration, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// The one-shot anti-griefing bond each participant posts before it
    /// may transact. May be zero (the protocol's v1 scenarios run
    /// bondless).
    pub bond_amount: u64,
    /// What a bond post by an already-bonded identity does.
    pub bond_policy: BondPolicy,
}

impl EngineConfig {
    /// Config with the given bond amount and the default reuse policy.
    pub fn with_bond(bond_amount: u64) -> Self {
        Self {
            bond_amount,
            bond_policy: BondPolicy::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_bond(0)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The escrow engine.
///
/// All methods take `&self`; the backing stores serialize per deal id and
/// per identity on their entry locks, and deals with distinct ids proceed
/// concurrently without coordination.
#[derive(Debug, Default)]
pub struct EscrowEngine {
    config: EngineConfig,
    deals: DealStore,
    bonds: BondRegistry,
    ledger: ValueLedger,
}

impl EscrowEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            deals: DealStore::new(),
            bonds: BondRegistry::new(config.bond_policy),
            ledger: ValueLedger::new(),
        }
    }

    /// The configured bond amount.
    pub fn bond_amount(&self) -> u64 {
        self.config.bond_amount
    }

    /// Current bond state for an identity.
    pub fn bond_state(&self, identity: &Address) -> BondState {
        self.bonds.state(identity)
    }

    // -- start --------------------------------------------------------------

    /// Open a deal: the buyer escrows `payment` and names the seller.
    ///
    /// `payment` covers the bond plus an even remainder split into the
    /// offer and the buyer's deposit: `offer = deposit = (payment − bond)/2`.
    /// Fails `AlreadyExists` for a taken id regardless of the other
    /// arguments, `InvalidAmount` if the split is not exact, and
    /// `BondLapsed` if the buyer's bond has lapsed.
    pub fn start(
        &self,
        deal_id: DealId,
        buyer: Address,
        seller: Address,
        payment: u64,
    ) -> Result<DealView, EscrowError> {
        if self.deals.get(&deal_id).is_ok() {
            return Err(EscrowError::AlreadyExists(deal_id));
        }
        if buyer == seller {
            return Err(EscrowError::Unauthorized {
                caller: buyer,
                operation: "start",
            });
        }
        let offer = self.split_payment(payment)?;
        if self.bonds.state(&buyer) == BondState::Lapsed {
            return Err(EscrowError::BondLapsed(buyer));
        }

        // Create first: the id is the commit point, so a start that loses
        // a race on the id fails before any bond is posted. The post after
        // it cannot fail; a lapsed bond was ruled out above.
        let deal = Deal::started(deal_id, buyer, seller, offer);
        let view = DealView::from(&deal);
        self.deals.create(deal)?;
        self.bonds.post(&buyer, self.config.bond_amount)?;

        debug!(deal = %deal_id, %buyer, %seller, payment, offer, "deal started");
        Ok(view)
    }

    // -- cancel -------------------------------------------------------------

    /// Buyer backs out of a started deal and is made whole.
    ///
    /// Only valid in `Started`, only for the buyer. Credits the buyer
    /// with `offer + deposit` and moves the deal to `Canceled` (terminal).
    pub fn cancel(&self, deal_id: DealId, caller: Address) -> Result<DealView, EscrowError> {
        let view = self.deals.mutate(&deal_id, |deal| {
            require_state(deal, DealState::Started, "cancel")?;
            require_role(deal, &caller, Role::Buyer, "cancel")?;
            let refund = to_i64(deal.offer, "offer")? + to_i64(deal.deposit(), "deposit")?;
            deal.buyer.balance += refund;
            deal.state = DealState::Canceled;
            Ok(DealView::from(&*deal))
        })?;
        debug!(deal = %deal_id, %caller, "deal canceled");
        Ok(view)
    }

    // -- accept -------------------------------------------------------------

    /// Seller matches the deposit and commits to the deal.
    ///
    /// Only valid in `Started`, only for the seller, and only with a
    /// payment of exactly `deposit + bond`. Posts the seller's bond and
    /// moves the deal to `Accepted`.
    pub fn accept(
        &self,
        deal_id: DealId,
        caller: Address,
        payment: u64,
    ) -> Result<DealView, EscrowError> {
        let bond = self.config.bond_amount;
        let view = self.deals.mutate(&deal_id, |deal| {
            require_state(deal, DealState::Started, "accept")?;
            require_role(deal, &caller, Role::Seller, "accept")?;
            let expected = deal.deposit() + bond;
            if payment != expected {
                return Err(EscrowError::InvalidAmount(format!(
                    "accept requires deposit + bond = {expected}, got {payment}"
                )));
            }
            if self.bonds.state(&caller) == BondState::Lapsed {
                return Err(EscrowError::BondLapsed(caller));
            }
            self.bonds.post(&caller, bond)?;
            deal.state = DealState::Accepted;
            Ok(DealView::from(&*deal))
        })?;
        debug!(deal = %deal_id, %caller, payment, "deal accepted");
        Ok(view)
    }

    // -- finalize -----------------------------------------------------------

    /// Buyer commits its signal hash.
    ///
    /// Only valid in `Accepted`, only for the buyer. The hash is
    /// immutable until the buyer's reveal.
    pub fn finalize(
        &self,
        deal_id: DealId,
        caller: Address,
        hash: SignalCommitment,
    ) -> Result<DealView, EscrowError> {
        let view = self.deals.mutate(&deal_id, |deal| {
            require_state(deal, DealState::Accepted, "finalize")?;
            require_role(deal, &caller, Role::Buyer, "finalize")?;
            deal.buyer.signal_hash = Some(hash);
            deal.state = DealState::Finalized;
            Ok(DealView::from(&*deal))
        })?;
        debug!(deal = %deal_id, %caller, "buyer signal committed");
        Ok(view)
    }

    // -- seller_signals -----------------------------------------------------

    /// Seller commits its signal hash.
    ///
    /// Only valid in `Finalized`, only for the seller. Moves the deal to
    /// `Signaled`, the terminal operating state.
    pub fn seller_signals(
        &self,
        deal_id: DealId,
        caller: Address,
        hash: SignalCommitment,
    ) -> Result<DealView, EscrowError> {
        let view = self.deals.mutate(&deal_id, |deal| {
            require_state(deal, DealState::Finalized, "seller_signals")?;
            require_role(deal, &caller, Role::Seller, "seller_signals")?;
            deal.seller.signal_hash = Some(hash);
            deal.state = DealState::Signaled;
            Ok(DealView::from(&*deal))
        })?;
        debug!(deal = %deal_id, %caller, "seller signal committed");
        Ok(view)
    }

    // -- reveal -------------------------------------------------------------

    /// Reveal a committed signal and settle that side of the deal.
    ///
    /// Only valid in `Signaled`, once per participant. The preimage must
    /// reproduce the stored commitment exactly; any mismatch fails
    /// `InvalidReveal` and leaves every balance unchanged.
    ///
    /// Settlement per side:
    /// - seller reveals: `seller −= signal`;
    ///   `buyer += deposit + (signal if seller.happy)`.
    /// - buyer reveals: `buyer −= signal`;
    ///   `seller += offer + deposit + (signal if buyer.happy)`.
    pub fn reveal(
        &self,
        deal_id: DealId,
        caller: Address,
        secret: Secret,
        signal: u64,
        happy: bool,
    ) -> Result<DealView, EscrowError> {
        let view = self.deals.mutate(&deal_id, |deal| {
            require_state(deal, DealState::Signaled, "reveal")?;
            let role = deal.role_of(&caller).ok_or(EscrowError::Unauthorized {
                caller,
                operation: "reveal",
            })?;
            if deal.participant(role).revealed {
                return Err(EscrowError::AlreadyRevealed(caller));
            }
            let committed = deal
                .participant(role)
                .signal_hash
                .ok_or(EscrowError::InvalidReveal(caller))?;
            if commitment_digest(&secret, signal, happy) != committed {
                return Err(EscrowError::InvalidReveal(caller));
            }

            let signal_i = to_i64(signal, "signal")?;
            let offer = to_i64(deal.offer, "offer")?;
            let deposit = to_i64(deal.deposit(), "deposit")?;
            let bonus = if happy { signal_i } else { 0 };
            match role {
                Role::Seller => {
                    deal.seller.balance -= signal_i;
                    deal.buyer.balance += deposit + bonus;
                }
                Role::Buyer => {
                    deal.buyer.balance -= signal_i;
                    deal.seller.balance += offer + deposit + bonus;
                }
            }

            let revealer = deal.participant_mut(role);
            revealer.revealed = true;
            revealer.happy = happy;
            revealer.signal_value = Some(signal);
            revealer.secret = Some(secret);
            Ok(DealView::from(&*deal))
        })?;
        debug!(deal = %deal_id, %caller, signal, happy, "signal revealed");
        Ok(view)
    }

    // -- withdraw -----------------------------------------------------------

    /// Pay out the caller's settled deal balance.
    ///
    /// Requires a positive balance — a zero balance is a deterministic
    /// `InsufficientBalance` rejection, never a silent no-op. The balance
    /// is credited to the ledger and the full ledger balance pays out in
    /// the same call; the deal-local account zeroes.
    pub fn withdraw(&self, deal_id: DealId, caller: Address) -> Result<Payout, EscrowError> {
        let payout = self.deals.mutate(&deal_id, |deal| {
            let role = deal.role_of(&caller).ok_or(EscrowError::Unauthorized {
                caller,
                operation: "withdraw",
            })?;
            let balance = deal.participant(role).balance;
            if balance <= 0 {
                return Err(EscrowError::InsufficientBalance(caller));
            }
            // Balance is positive, so the conversion and the ledger
            // withdrawal below cannot fail after the credit lands.
            self.ledger.credit(&caller, balance as u64);
            let payout = self.ledger.withdraw(&caller)?;
            deal.participant_mut(role).balance = 0;
            Ok(payout)
        })?;
        debug!(deal = %deal_id, %caller, amount = payout.amount, "balance withdrawn");
        Ok(payout)
    }

    // -- withdraw_bond ------------------------------------------------------

    /// Pay out the caller's bond and lapse it permanently.
    ///
    /// One-shot: after this succeeds, every later `start` or `accept` by
    /// this identity fails `BondLapsed`, on any deal.
    pub fn withdraw_bond(&self, caller: Address) -> Result<Payout, EscrowError> {
        let payout = self.bonds.withdraw(&caller)?;
        debug!(%caller, amount = payout.amount, "bond withdrawn");
        Ok(payout)
    }

    // -- projections --------------------------------------------------------

    /// Read-only projection of a deal.
    pub fn get_deal(&self, deal_id: &DealId) -> Result<DealView, EscrowError> {
        self.deals.get(deal_id).map(|deal| DealView::from(&deal))
    }

    /// Snapshot projections of every deal.
    pub fn list_deals(&self) -> Vec<DealView> {
        self.deals.list().iter().map(DealView::from).collect()
    }

    /// Number of deals ever created.
    pub fn deal_count(&self) -> usize {
        self.deals.len()
    }

    // -- helpers ------------------------------------------------------------

    /// Apply the exact-split law: `(payment − bond)` must be non-negative
    /// and even; the offer is half the remainder and must fit settlement
    /// arithmetic.
    fn split_payment(&self, payment: u64) -> Result<u64, EscrowError> {
        let bond = self.config.bond_amount;
        let remainder = payment.checked_sub(bond).ok_or_else(|| {
            EscrowError::InvalidAmount(format!(
                "payment {payment} does not cover the bond {bond}"
            ))
        })?;
        if remainder % 2 != 0 {
            return Err(EscrowError::InvalidAmount(format!(
                "payment minus bond must split evenly, got remainder {remainder}"
            )));
        }
        let offer = remainder / 2;
        to_i64(offer, "offer")?;
        Ok(offer)
    }
}

/// Fail `InvalidState` unless the deal is in `expected`.
fn require_state(
    deal: &Deal,
    expected: DealState,
    operation: &'static str,
) -> Result<(), EscrowError> {
    if deal.state != expected {
        return Err(EscrowError::InvalidState {
            operation,
            expected,
            actual: deal.state,
        });
    }
    Ok(())
}

/// Fail `Unauthorized` unless the caller holds `role` on the deal.
fn require_role(
    deal: &Deal,
    caller: &Address,
    role: Role,
    operation: &'static str,
) -> Result<(), EscrowError> {
    if deal.role_of(caller) != Some(role) {
        return Err(EscrowError::Unauthorized {
            caller: *caller,
            operation,
        });
    }
    Ok(())
}

/// Convert a protocol amount into settlement arithmetic, rejecting values
/// that cannot be represented.
fn to_i64(value: u64, what: &str) -> Result<i64, EscrowError> {
    i64::try_from(value)
        .map_err(|_| EscrowError::InvalidAmount(format!("{what} {value} exceeds settlement range")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
