//! # sen-command: tree-structured command dispatch
//!
//! Build a tree of named commands, then hand it lines of text. Each line is
//! split into a leading subcommand token and a remainder; matching tokens
//! descend the tree, and the deepest matched command runs its handler with
//! the parsed flags.
//!
//! ## Core Principles
//!
//! - **Arena-owned tree**: nodes refer to each other by [`NodeId`], never by pointer
//! - **Pluggable flag parsing**: any [`FlagParser`](sen_flags::FlagParser) can validate flags
//! - **Help for free**: usage and help text are generated from the tree
//!
//! ## Quick Start
//!
//! ```
//! use sen_command::{CommandConfig, CommandTree, FlagDecl, Invocation, Output};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let tree = CommandTree::new(
//!     CommandConfig::new("account")
//!         .description("Perform operations on a user account.")
//!         .subcommand(
//!             CommandConfig::new("create")
//!                 .alias("new")
//!                 .flag("name", FlagDecl::string().alias("n"))
//!                 .handler(|ctx: Invocation| async move {
//!                     let name = ctx.flag("name").and_then(|v| v.as_str()).unwrap_or("anonymous");
//!                     format!("created {name}")
//!                 }),
//!         ),
//! )
//! .unwrap();
//!
//! let out = tree.run("new -n Bob").await.unwrap();
//! assert_eq!(out, Output::Text("created Bob".into()));
//!
//! let help = tree.run("create --help").await.unwrap();
//! assert!(help.to_string().starts_with("account create <new>  [OPTIONS]"));
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod help;
pub mod node;
pub mod resolver;
pub mod tokenizer;
pub mod tracing_support;
pub mod tree;

pub use adapter::{Evaluation, FlagAdapter, HELP_FLAG};
pub use config::{CommandConfig, TreeDefaults};
pub use error::{ConfigError, DispatchError, TreeError};
pub use handler::{
    Completion, Flags, Handler, HandlerResult, HelpRequest, Invocation, SyncHandler,
};
pub use node::{CommandNode, NodeId, TextSource};
pub use resolver::Resolution;
pub use tree::CommandTree;

pub use sen_flags::{
    ArgParser, FlagDecl, FlagParser, FlagSpec, FlagType, FlagValue, ParseOutcome, Violation,
};

pub use tracing_support::{
    init_subscriber, init_subscriber_with_config, TracingConfig, TracingFormat,
};

use serde::Serialize;
use serde_json::Value;

// ============================================================================
// Output Types
// ============================================================================

/// What a dispatch produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Output {
    /// No output
    Silent,

    /// Text produced by a handler
    Text(String),

    /// Machine-readable output produced by a handler
    Json(Value),

    /// Rendered help, produced by autohelp or the built-in default handler
    Help(String),
}

impl Output {
    pub fn is_empty(&self) -> bool {
        matches!(self, Output::Silent)
    }

    pub fn is_help(&self) -> bool {
        matches!(self, Output::Help(_))
    }

    /// The text of a `Text` or `Help` output
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Output::Text(s) | Output::Help(s) => Some(s),
            Output::Silent | Output::Json(_) => None,
        }
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::Silent => Ok(()),
            Output::Text(s) | Output::Help(s) => write!(f, "{}", s),
            Output::Json(v) => write!(f, "{}", v),
        }
    }
}

// ============================================================================
// Output Conversion Trait
// ============================================================================

/// Conversion of handler return values into an [`Output`]
///
/// Implemented for `Output`, `String`, `&'static str`, `()`,
/// `serde_json::Value` and `Result<T, E>` for any of those.
pub trait IntoOutput {
    fn into_output(self) -> HandlerResult;
}

impl IntoOutput for Output {
    fn into_output(self) -> HandlerResult {
        Ok(self)
    }
}

impl IntoOutput for String {
    fn into_output(self) -> HandlerResult {
        Ok(Output::Text(self))
    }
}

impl IntoOutput for &'static str {
    fn into_output(self) -> HandlerResult {
        Ok(Output::Text(self.to_string()))
    }
}

impl IntoOutput for () {
    fn into_output(self) -> HandlerResult {
        Ok(Output::Silent)
    }
}

impl IntoOutput for Value {
    fn into_output(self) -> HandlerResult {
        Ok(Output::Json(self))
    }
}

impl<T, E> IntoOutput for Result<T, E>
where
    T: IntoOutput,
    E: Into<anyhow::Error>,
{
    fn into_output(self) -> HandlerResult {
        self.map_err(Into::into).and_then(IntoOutput::into_output)
    }
}

// ============================================================================
// Tests
// ============================================================================
