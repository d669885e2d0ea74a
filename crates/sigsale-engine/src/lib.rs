// SPDX-License-Identifier: MIT
//! # sigsale-engine — Escrow Core
//!
//! The conditional-payment escrow engine: a buyer and seller escrow funds
//! under a neutral engine, exchange a private offer, and later each make a
//! private, hash-committed satisfaction signal that is revealed and settled
//! under fixed accounting rules.
//!
//! - **Error** ([`error`]): Structured error hierarchy for the escrow
//!   subsystem. Every precondition failure is a typed rejection with zero
//!   side effects.
//!
//! - **Deal** ([`deal`]): The deal record, participant accounts, lifecycle
//!   state enum, and read-only projections.
//!
//! - **Store** ([`store`]): Create-once deal storage with atomic
//!   read-validate-commit mutation.
//!
//! - **Bond** ([`bond`]): One-shot anti-griefing bond lifecycle
//!   (`NeverBonded → CurrentlyBonded → Lapsed`).
//!
//! - **Ledger** ([`ledger`]): Per-identity spendable balances with
//!   atomic credit and full-balance payout.
//!
//! - **Engine** ([`engine`]): The eight-operation orchestrator owning the
//!   state machine and all arithmetic rules.
//!
//! ## Execution Model
//!
//! Each operation is a single whole-or-nothing transaction: preconditions
//! are read, then state mutates, with no observable intermediate state.
//! Deals with different identifiers are fully independent; operations on
//! the same deal or the same identity serialize on the entry lock. No
//! operation blocks, retries, or defers — every payout happens
//! synchronously inside the triggering call.

pub mod bond;
pub mod deal;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod store;

// Re-export primary types for ergonomic imports.
pub use bond::{BondPolicy, BondRecord, BondRegistry, BondState};
pub use deal::{Deal, DealState, DealView, Participant, ParticipantView, Role};
pub use engine::{EngineConfig, EscrowEngine};
pub use error::EscrowError;
pub use ledger::{Payout, ValueLedger};
pub use store::DealStore;
