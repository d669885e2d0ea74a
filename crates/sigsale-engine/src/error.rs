// SPDX-License-Identifier: MIT
//! # Escrow Error Types
//!
//! Structured errors for the escrow subsystem. Uses `thiserror` for
//! ergonomic error definitions with diagnostic context.
//!
//! All rejections are local, synchronous, and non-retryable: the engine
//! has no internal recovery layer, and a failing operation never leaves
//! partial mutation visible. A caller must resubmit with corrected
//! arguments.

use thiserror::Error;

use sigsale_core::{Address, DealId};

use crate::deal::DealState;

/// Errors from escrow engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// A deal with this identifier already exists; deal ids are create-once.
    #[error("deal already exists: {0}")]
    AlreadyExists(DealId),

    /// No deal with this identifier.
    #[error("deal not found: {0}")]
    NotFound(DealId),

    /// Operation is not valid in the deal's current state.
    #[error("invalid state for '{operation}': expected {expected}, deal is {actual}")]
    InvalidState {
        operation: &'static str,
        expected: DealState,
        actual: DealState,
    },

    /// Caller is not the participant this operation is reserved for.
    #[error("unauthorized: {caller} may not call '{operation}' on this deal")]
    Unauthorized {
        caller: Address,
        operation: &'static str,
    },

    /// Amount violates an arithmetic rule of the protocol.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The identity's bond has lapsed; it may never transact again.
    #[error("bond lapsed for {0}")]
    BondLapsed(Address),

    /// The identity holds no current bond to withdraw.
    #[error("no current bond for {0}")]
    NotBonded(Address),

    /// Reveal preimage does not match the stored commitment.
    #[error("reveal does not match commitment for {0}")]
    InvalidReveal(Address),

    /// The participant has already revealed on this deal.
    #[error("already revealed: {0}")]
    AlreadyRevealed(Address),

    /// No positive balance to withdraw.
    #[error("insufficient balance for {0}")]
    InsufficientBalance(Address),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_display_names_operation_and_states() {
        let err = EscrowError::InvalidState {
            operation: "accept",
            expected: DealState::Started,
            actual: DealState::Canceled,
        };
        let msg = format!("{err}");
        assert!(msg.contains("accept"));
        assert!(msg.contains("STARTED"));
        assert!(msg.contains("CANCELED"));
    }

    #[test]
    fn unauthorized_display_names_caller() {
        let caller = Address::from_bytes([0xcc; 20]);
        let err = EscrowError::Unauthorized {
            caller,
            operation: "cancel",
        };
        let msg = format!("{err}");
        assert!(msg.contains(&caller.to_string()));
        assert!(msg.contains("cancel"));
    }
}
