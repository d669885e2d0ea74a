//! # sigsale-dispatch — Command Dispatch
//!
//! A typed command layer over the escrow engine, for callers that speak
//! in `(command name, argument map)` pairs rather than Rust method calls.
//!
//! The dispatcher is a static table: each command name maps to an
//! explicit argument schema and a typed handler. Argument presence is
//! checked against the schema before any parsing, parsing failures name
//! the offending key, and engine rejections pass through as typed
//! [`EscrowError`]s. There is no pattern matching or matcher synthesis at
//! runtime, and no interactive surface — this crate is a library consumed
//! by whatever front end drives it.

pub mod command;
pub mod error;

pub use command::{dispatch, ArgKind, ArgSpec, CommandRequest, CommandSpec, DispatchOutcome, COMMANDS};
pub use error::DispatchError;
