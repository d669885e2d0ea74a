//! # Reveal Settlement Matrix
//!
//! Commit-reveal verification and the fixed accounting rules, including
//! the deliberately order-free, asymmetric settlement: each reveal is
//! evaluated independently against the revealer's own committed values,
//! and a revealer's bonus depends only on its own happy flag.

use sigsale_core::{commitment_digest, Address, DealId, Secret};
use sigsale_engine::{DealState, EngineConfig, EscrowEngine, EscrowError};

const BUYER: Address = Address::from_bytes([0xb0; 20]);
const SELLER: Address = Address::from_bytes([0x5e; 20]);

fn deal_id(fill: u8) -> DealId {
    DealId::from_bytes([fill; 32])
}

fn secret(fill: u8) -> Secret {
    Secret::from_bytes([fill; 32])
}

/// Bondless engine with one deal (offer = deposit = 5) driven to
/// `Signaled` under the given committed tuples.
fn signaled(
    buyer_tuple: (Secret, u64, bool),
    seller_tuple: (Secret, u64, bool),
) -> (EscrowEngine, DealId) {
    let engine = EscrowEngine::new(EngineConfig::default());
    let id = deal_id(1);
    engine.start(id, BUYER, SELLER, 10).unwrap();
    engine.accept(id, SELLER, 5).unwrap();
    let (bs, bsig, bh) = buyer_tuple;
    engine
        .finalize(id, BUYER, commitment_digest(&bs, bsig, bh))
        .unwrap();
    let (ss, ssig, sh) = seller_tuple;
    engine
        .seller_signals(id, SELLER, commitment_digest(&ss, ssig, sh))
        .unwrap();
    (engine, id)
}

#[test]
fn seller_first_then_buyer_matches_reference_numbers() {
    let s1 = secret(0xa1);
    let s2 = secret(0xa2);
    let (engine, id) = signaled((s2, 1, true), (s1, 1, false));

    let view = engine.reveal(id, SELLER, s1, 1, false).unwrap();
    assert_eq!(view.seller.balance, -1);
    assert_eq!(view.buyer.balance, 5);

    let view = engine.reveal(id, BUYER, s2, 1, true).unwrap();
    assert_eq!(view.seller.balance, 10);
    assert_eq!(view.buyer.balance, 4);
    assert_eq!(view.state, DealState::Signaled);
}

#[test]
fn bonus_follows_the_revealer_own_happy_flag_only() {
    // Four quadrants of (buyer_happy, seller_happy). The seller's reveal
    // bonus to the buyer depends only on the seller's flag, and vice
    // versa — the counterpart's satisfaction never enters.
    for buyer_happy in [true, false] {
        for seller_happy in [true, false] {
            let bs = secret(0x11);
            let ss = secret(0x22);
            let (engine, id) = signaled((bs, 2, buyer_happy), (ss, 3, seller_happy));

            engine.reveal(id, SELLER, ss, 3, seller_happy).unwrap();
            engine.reveal(id, BUYER, bs, 2, buyer_happy).unwrap();
            let view = engine.get_deal(&id).unwrap();

            let seller_bonus: i64 = if seller_happy { 3 } else { 0 };
            let buyer_bonus: i64 = if buyer_happy { 2 } else { 0 };
            // buyer: +deposit +seller_bonus −own_signal
            assert_eq!(view.buyer.balance, 5 + seller_bonus - 2);
            // seller: −own_signal +offer +deposit +buyer_bonus
            assert_eq!(view.seller.balance, -3 + 5 + 5 + buyer_bonus);
        }
    }
}

#[test]
fn settlement_is_order_independent() {
    let bs = secret(0x11);
    let ss = secret(0x22);
    let balances = |buyer_first: bool| {
        let (engine, id) = signaled((bs, 2, false), (ss, 3, true));
        if buyer_first {
            engine.reveal(id, BUYER, bs, 2, false).unwrap();
            engine.reveal(id, SELLER, ss, 3, true).unwrap();
        } else {
            engine.reveal(id, SELLER, ss, 3, true).unwrap();
            engine.reveal(id, BUYER, bs, 2, false).unwrap();
        }
        let view = engine.get_deal(&id).unwrap();
        (view.buyer.balance, view.seller.balance)
    };
    assert_eq!(balances(true), balances(false));
}

#[test]
fn mismatched_preimage_leaves_every_balance_unchanged() {
    let bs = secret(0x11);
    let ss = secret(0x22);
    let (engine, id) = signaled((bs, 2, true), (ss, 3, true));
    let before = engine.get_deal(&id).unwrap();

    // A grid of near-miss preimages: one coordinate off at a time.
    let attempts = [
        (secret(0x12), 2u64, true),
        (bs, 3, true),
        (bs, 2, false),
        (ss, 3, true), // the counterpart's valid tuple against the buyer's hash
    ];
    for (sec, sig, happy) in attempts {
        assert!(matches!(
            engine.reveal(id, BUYER, sec, sig, happy),
            Err(EscrowError::InvalidReveal(_))
        ));
    }
    assert_eq!(engine.get_deal(&id).unwrap(), before);
}

#[test]
fn oversized_signal_is_rejected_not_wrapped() {
    // A committed signal beyond i64::MAX passes the hash check but cannot
    // enter settlement arithmetic; the reveal must fail typed, with every
    // balance untouched, rather than wrap.
    let bs = secret(0x11);
    let ss = secret(0x22);
    let (engine, id) = signaled((bs, u64::MAX, true), (ss, 0, true));
    let before = engine.get_deal(&id).unwrap();
    assert!(matches!(
        engine.reveal(id, BUYER, bs, u64::MAX, true),
        Err(EscrowError::InvalidAmount(_))
    ));
    assert_eq!(engine.get_deal(&id).unwrap(), before);
}

#[test]
fn each_side_reveals_at_most_once() {
    let bs = secret(0x11);
    let ss = secret(0x22);
    let (engine, id) = signaled((bs, 0, true), (ss, 0, true));
    engine.reveal(id, SELLER, ss, 0, true).unwrap();
    assert!(matches!(
        engine.reveal(id, SELLER, ss, 0, true),
        Err(EscrowError::AlreadyRevealed(_))
    ));
    // The buyer's side is untouched by the seller's exhaustion.
    engine.reveal(id, BUYER, bs, 0, true).unwrap();
}

#[test]
fn full_settlement_then_both_withdraw() {
    let bs = secret(0x11);
    let ss = secret(0x22);
    let (engine, id) = signaled((bs, 1, true), (ss, 1, true));
    engine.reveal(id, SELLER, ss, 1, true).unwrap();
    engine.reveal(id, BUYER, bs, 1, true).unwrap();

    let view = engine.get_deal(&id).unwrap();
    // buyer: deposit 5 + seller bonus 1 − own signal 1 = 5
    // seller: −1 + offer 5 + deposit 5 + buyer bonus 1 = 10
    assert_eq!(view.buyer.balance, 5);
    assert_eq!(view.seller.balance, 10);

    assert_eq!(engine.withdraw(id, BUYER).unwrap().amount, 5);
    assert_eq!(engine.withdraw(id, SELLER).unwrap().amount, 10);
    for caller in [BUYER, SELLER] {
        assert!(matches!(
            engine.withdraw(id, caller),
            Err(EscrowError::InsufficientBalance(_))
        ));
    }
}

#[test]
fn withdraw_by_stranger_fails_unauthorized() {
    let bs = secret(0x11);
    let (engine, id) = signaled((bs, 0, true), (bs, 0, true));
    assert!(matches!(
        engine.withdraw(id, Address::from_bytes([0x99; 20])),
        Err(EscrowError::Unauthorized { .. })
    ));
}

#[test]
fn zero_signal_reveals_move_principal_only() {
    let bs = secret(0x11);
    let ss = secret(0x22);
    let (engine, id) = signaled((bs, 0, true), (ss, 0, false));
    engine.reveal(id, BUYER, bs, 0, true).unwrap();
    engine.reveal(id, SELLER, ss, 0, false).unwrap();
    let view = engine.get_deal(&id).unwrap();
    assert_eq!(view.buyer.balance, 5);
    assert_eq!(view.seller.balance, 10);
}
