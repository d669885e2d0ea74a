//! # Command Table and Handlers
//!
//! The static command table: each entry names a command and its argument
//! schema, and [`dispatch`] routes a [`CommandRequest`] through schema
//! validation into the matching typed engine call.
//!
//! The table replaces an earlier design that compiled human-readable
//! command templates into matchers at runtime; here the schema is data
//! and the handlers are ordinary functions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use sigsale_core::{Address, DealId, Secret, SignalCommitment};
use sigsale_engine::{DealView, EscrowEngine, Payout};

use crate::error::DispatchError;

// ---------------------------------------------------------------------------
// Request / outcome types
// ---------------------------------------------------------------------------

/// A command invocation: a name plus a string-keyed argument map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub name: String,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl CommandRequest {
    /// Build a request from a name and `(key, value)` pairs.
    pub fn new(name: &str, args: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            args: args
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// What a successfully dispatched command produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// A projection of the touched deal.
    Deal(DealView),
    /// Funds left the system.
    Payout(Payout),
}

// ---------------------------------------------------------------------------
// Argument schema
// ---------------------------------------------------------------------------

/// The type an argument value must parse as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// 32-byte hex deal identifier.
    DealId,
    /// 20-byte hex identity handle.
    Address,
    /// Unsigned ledger amount.
    Amount,
    /// 32-byte hex commitment digest.
    Commitment,
    /// 32-byte hex reveal nonce.
    Secret,
    /// Unsigned signal value.
    Signal,
    /// Boolean flag (`true`/`false`).
    Flag,
}

/// One required argument of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub key: &'static str,
    pub kind: ArgKind,
}

const fn arg(key: &'static str, kind: ArgKind) -> ArgSpec {
    ArgSpec { key, kind }
}

/// One entry of the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub args: &'static [ArgSpec],
}

/// The full command table. Every engine operation of the protocol surface
/// appears exactly once.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "start",
        args: &[
            arg("deal", ArgKind::DealId),
            arg("buyer", ArgKind::Address),
            arg("seller", ArgKind::Address),
            arg("payment", ArgKind::Amount),
        ],
    },
    CommandSpec {
        name: "cancel",
        args: &[arg("deal", ArgKind::DealId), arg("caller", ArgKind::Address)],
    },
    CommandSpec {
        name: "accept",
        args: &[
            arg("deal", ArgKind::DealId),
            arg("caller", ArgKind::Address),
            arg("payment", ArgKind::Amount),
        ],
    },
    CommandSpec {
        name: "finalize",
        args: &[
            arg("deal", ArgKind::DealId),
            arg("caller", ArgKind::Address),
            arg("hash", ArgKind::Commitment),
        ],
    },
    CommandSpec {
        name: "seller-signals",
        args: &[
            arg("deal", ArgKind::DealId),
            arg("caller", ArgKind::Address),
            arg("hash", ArgKind::Commitment),
        ],
    },
    CommandSpec {
        name: "reveal",
        args: &[
            arg("deal", ArgKind::DealId),
            arg("caller", ArgKind::Address),
            arg("secret", ArgKind::Secret),
            arg("signal", ArgKind::Signal),
            arg("happy", ArgKind::Flag),
        ],
    },
    CommandSpec {
        name: "withdraw",
        args: &[arg("deal", ArgKind::DealId), arg("caller", ArgKind::Address)],
    },
    CommandSpec {
        name: "withdraw-bond",
        args: &[arg("caller", ArgKind::Address)],
    },
    CommandSpec {
        name: "get-deal",
        args: &[arg("deal", ArgKind::DealId)],
    },
];

/// Look up a command by name.
fn spec_for(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

// ---------------------------------------------------------------------------
// Typed argument access
// ---------------------------------------------------------------------------

/// Schema-validated argument view over a request.
struct Args<'a> {
    command: &'static str,
    values: &'a BTreeMap<String, String>,
}

impl<'a> Args<'a> {
    fn raw(&self, key: &'static str) -> Result<&'a str, DispatchError> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or(DispatchError::MissingArgument {
                command: self.command,
                key,
            })
    }

    fn deal_id(&self, key: &'static str) -> Result<DealId, DispatchError> {
        DealId::from_hex(self.raw(key)?).map_err(|e| DispatchError::InvalidArgument {
            key,
            reason: e.to_string(),
        })
    }

    fn address(&self, key: &'static str) -> Result<Address, DispatchError> {
        Address::from_hex(self.raw(key)?).map_err(|e| DispatchError::InvalidArgument {
            key,
            reason: e.to_string(),
        })
    }

    fn amount(&self, key: &'static str) -> Result<u64, DispatchError> {
        self.raw(key)?
            .parse::<u64>()
            .map_err(|e| DispatchError::InvalidArgument {
                key,
                reason: e.to_string(),
            })
    }

    fn signal(&self, key: &'static str) -> Result<u64, DispatchError> {
        self.raw(key)?
            .parse::<u64>()
            .map_err(|e| DispatchError::InvalidArgument {
                key,
                reason: e.to_string(),
            })
    }

    fn commitment(&self, key: &'static str) -> Result<SignalCommitment, DispatchError> {
        SignalCommitment::from_hex(self.raw(key)?).map_err(|e| DispatchError::InvalidArgument {
            key,
            reason: e.to_string(),
        })
    }

    fn secret(&self, key: &'static str) -> Result<Secret, DispatchError> {
        Secret::from_hex(self.raw(key)?).map_err(|e| DispatchError::InvalidArgument {
            key,
            reason: e.to_string(),
        })
    }

    fn flag(&self, key: &'static str) -> Result<bool, DispatchError> {
        match self.raw(key)? {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(DispatchError::InvalidArgument {
                key,
                reason: format!("expected 'true' or 'false', got '{other}'"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Route a request to the engine.
///
/// Validates the name against the table and the argument keys against the
/// command's schema before parsing a single value, so a request missing a
/// required key is rejected by schema, not by a handler side effect.
pub fn dispatch(
    engine: &EscrowEngine,
    request: &CommandRequest,
) -> Result<DispatchOutcome, DispatchError> {
    let spec = spec_for(&request.name)
        .ok_or_else(|| DispatchError::UnknownCommand(request.name.clone()))?;
    for required in spec.args {
        if !request.args.contains_key(required.key) {
            return Err(DispatchError::MissingArgument {
                command: spec.name,
                key: required.key,
            });
        }
    }
    let args = Args {
        command: spec.name,
        values: &request.args,
    };
    debug!(command = spec.name, "dispatching");

    let outcome = match spec.name {
        "start" => DispatchOutcome::Deal(engine.start(
            args.deal_id("deal")?,
            args.address("buyer")?,
            args.address("seller")?,
            args.amount("payment")?,
        )?),
        "cancel" => {
            DispatchOutcome::Deal(engine.cancel(args.deal_id("deal")?, args.address("caller")?)?)
        }
        "accept" => DispatchOutcome::Deal(engine.accept(
            args.deal_id("deal")?,
            args.address("caller")?,
            args.amount("payment")?,
        )?),
        "finalize" => DispatchOutcome::Deal(engine.finalize(
            args.deal_id("deal")?,
            args.address("caller")?,
            args.commitment("hash")?,
        )?),
        "seller-signals" => DispatchOutcome::Deal(engine.seller_signals(
            args.deal_id("deal")?,
            args.address("caller")?,
            args.commitment("hash")?,
        )?),
        "reveal" => DispatchOutcome::Deal(engine.reveal(
            args.deal_id("deal")?,
            args.address("caller")?,
            args.secret("secret")?,
            args.signal("signal")?,
            args.flag("happy")?,
        )?),
        "withdraw" => DispatchOutcome::Payout(
            engine.withdraw(args.deal_id("deal")?, args.address("caller")?)?,
        ),
        "withdraw-bond" => DispatchOutcome::Payout(engine.withdraw_bond(args.address("caller")?)?),
        "get-deal" => DispatchOutcome::Deal(engine.get_deal(&args.deal_id("deal")?)?),
        // The table and this match are maintained together; spec_for only
        // returns names present in both.
        other => return Err(DispatchError::UnknownCommand(other.to_string())),
    };
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
