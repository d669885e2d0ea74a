//! # Dispatch Error Types
//!
//! Structured errors for the command layer. Engine rejections convert
//! via `#[from]` so callers see one error surface.

use thiserror::Error;

use sigsale_engine::EscrowError;

/// Errors from parsing and dispatching a command request.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No command with this name in the table.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The schema requires an argument the request did not carry.
    #[error("command '{command}' requires argument '{key}'")]
    MissingArgument {
        command: &'static str,
        key: &'static str,
    },

    /// An argument value failed to parse as its schema type.
    #[error("invalid value for '{key}': {reason}")]
    InvalidArgument { key: &'static str, reason: String },

    /// The engine rejected the operation.
    #[error(transparent)]
    Engine(#[from] EscrowError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_argument_display_names_command_and_key() {
        let err = DispatchError::MissingArgument {
            command: "start",
            key: "payment",
        };
        let msg = format!("{err}");
        assert!(msg.contains("start"));
        assert!(msg.contains("payment"));
    }

    #[test]
    fn engine_error_passes_through_transparently() {
        let inner = EscrowError::NotBonded(sigsale_core::Address::from_bytes([1; 20]));
        let err = DispatchError::from(inner.clone());
        assert_eq!(format!("{err}"), format!("{inner}"));
    }
}
