//! Error types
//!
//! Construction problems are [`ConfigError`], tree mutations fail with
//! [`TreeError`], and `run` fails with [`DispatchError`]. Flag violations
//! are not errors; they travel on the invocation context.

use crate::node::NodeId;
use thiserror::Error;

/// A command configuration record was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid command configuration. Expected an object.")]
    NotAnObject,

    #[error("Invalid command configuration. A \"name\" attribute is required.")]
    MissingName,

    #[error("Invalid command configuration. A \"handler\" function is required.")]
    InvalidHandler,

    #[error("Invalid flag configuration (expected an object, received {found}).")]
    InvalidFlags { found: String },

    #[error("Invalid configuration for flag '{flag}': {reason}")]
    InvalidFlagDecl { flag: String, reason: String },

    #[error("Invalid command configuration. \"{field}\" {reason}.")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid command configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    pub(crate) fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// A tree mutation was rejected
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Unknown command node: {0:?}")]
    UnknownNode(NodeId),

    #[error("Command '{name}' is already attached to another command.")]
    AlreadyAttached { name: String },

    #[error("Command '{name}' cannot be attached below itself.")]
    Cycle { name: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Dispatch failed
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown command node: {0:?}")]
    UnknownNode(NodeId),

    /// A subcommand token resolved to an identity with no live node
    #[error("{node} '{token}' command not found.")]
    CommandNotFound { node: String, token: String },

    /// The handler failed. Passed through as-is.
    #[error(transparent)]
    Handler(anyhow::Error),
}

impl DispatchError {
    /// Exit code for embedders that terminate on failure
    /// (1 = user-fixable, 101 = everything else).
    pub fn exit_code(&self) -> i32 {
        match self {
            DispatchError::CommandNotFound { .. } => 1,
            DispatchError::UnknownNode(_) | DispatchError::Handler(_) => 101,
        }
    }

    /// The handler's own error, if this is a handler failure
    pub fn handler_error(&self) -> Option<&anyhow::Error> {
        match self {
            DispatchError::Handler(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_not_found_message() {
        let err = DispatchError::CommandNotFound {
            node: "account".into(),
            token: "create".into(),
        };
        assert_eq!(err.to_string(), "account 'create' command not found.");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_handler_error_is_transparent() {
        let err = DispatchError::Handler(anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(err.exit_code(), 101);
        assert!(err.handler_error().is_some());
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::InvalidFlags {
                found: "string".into()
            }
            .to_string(),
            "Invalid flag configuration (expected an object, received string)."
        );
        assert_eq!(
            ConfigError::invalid_field("tabWidth", "must be a non-negative integer").to_string(),
            "Invalid command configuration. \"tabWidth\" must be a non-negative integer."
        );
    }
}
