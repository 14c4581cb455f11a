//! Handlers and the invocation context they receive
//!
//! Any `Fn(Invocation) -> impl Future<Output = impl IntoOutput>` is a
//! [`Handler`], so most handlers are async closures:
//!
//! ```
//! use sen_command::{CommandConfig, Invocation};
//!
//! let create = CommandConfig::new("create").handler(|ctx: Invocation| async move {
//!     format!("creating {}", ctx.input)
//! });
//! # let _ = create;
//! ```

use crate::adapter::Evaluation;
use crate::{IntoOutput, Output};
use async_trait::async_trait;
use sen_flags::{FlagValue, Violation};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

/// Result every handler resolves to
pub type HandlerResult = Result<Output, anyhow::Error>;

/// Code attached to a command node
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, invocation: Invocation) -> HandlerResult;
}

#[async_trait]
impl<F, Fut, R> Handler for F
where
    F: Fn(Invocation) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send,
    R: IntoOutput + Send,
{
    async fn call(&self, invocation: Invocation) -> HandlerResult {
        (self)(invocation).await.into_output()
    }
}

/// Adapts a synchronous function into a [`Handler`]
pub struct SyncHandler<F>(pub F);

#[async_trait]
impl<F, R> Handler for SyncHandler<F>
where
    F: Fn(Invocation) -> R + Send + Sync,
    R: IntoOutput,
{
    async fn call(&self, invocation: Invocation) -> HandlerResult {
        (self.0)(invocation).into_output()
    }
}

/// Recognized and unrecognized flags of one invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Flags {
    /// Declared flags by declared name
    pub recognized: BTreeMap<String, FlagValue>,

    /// Positional tokens and undeclared flag names
    pub unrecognized: Vec<String>,
}

impl Flags {
    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.recognized.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.recognized.contains_key(name)
    }
}

/// Whether help was asked for, and the rendered help when it was
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HelpRequest {
    pub requested: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Callback handed to the handler that finally runs
pub struct Completion {
    callback: Box<dyn FnOnce() + Send>,
}

impl Completion {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// A completion paired with a receiver that resolves once it is called
    ///
    /// If the completion is dropped without being called (for example when
    /// autohelp answers the input) the receiver resolves with an error.
    pub fn channel() -> (Self, tokio::sync::oneshot::Receiver<()>) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let completion = Self::new(move || {
            let _ = tx.send(());
        });
        (completion, rx)
    }

    pub fn complete(self) {
        (self.callback)()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion(..)")
    }
}

/// Everything a handler learns about one dispatch
#[derive(Debug, Serialize)]
pub struct Invocation {
    /// Name of the node whose handler runs
    pub command: String,

    /// The input at this level, trimmed (subcommand tokens already consumed)
    pub input: String,

    pub flags: Flags,

    /// `false` when the flag parser reported violations
    pub valid: bool,

    pub violations: Vec<Violation>,

    pub help: HelpRequest,

    #[serde(skip)]
    completion: Option<Completion>,
}

impl Invocation {
    pub(crate) fn new(command: &str, input: &str, evaluation: Evaluation) -> Self {
        Self {
            command: command.to_string(),
            input: input.trim().to_string(),
            flags: evaluation.flags,
            valid: evaluation.valid,
            violations: evaluation.violations,
            help: HelpRequest {
                requested: evaluation.help_requested,
                message: None,
            },
            completion: None,
        }
    }

    pub(crate) fn set_completion(&mut self, completion: Option<Completion>) {
        self.completion = completion;
    }

    /// Shortcut for `flags.get(name)`
    pub fn flag(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    pub fn has_completion(&self) -> bool {
        self.completion.is_some()
    }

    /// Take the completion callback to call it later
    pub fn take_completion(&mut self) -> Option<Completion> {
        self.completion.take()
    }

    /// Call the completion callback now. Returns `false` if there was none.
    pub fn complete(&mut self) -> bool {
        match self.completion.take() {
            Some(completion) => {
                completion.complete();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn invocation() -> Invocation {
        Invocation::new("create", "  me@domain.com  ", Evaluation::default())
    }

    #[test]
    fn test_input_is_trimmed() {
        assert_eq!(invocation().input, "me@domain.com");
        assert_eq!(invocation().command, "create");
    }

    #[test]
    fn test_complete_runs_callback_once() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();

        let mut ctx = invocation();
        ctx.set_completion(Some(Completion::new(move || {
            flag.store(true, Ordering::SeqCst)
        })));

        assert!(ctx.has_completion());
        assert!(ctx.complete());
        assert!(called.load(Ordering::SeqCst));
        assert!(!ctx.complete());
    }

    #[test]
    fn test_serialize_skips_completion() {
        let mut ctx = invocation();
        ctx.set_completion(Some(Completion::new(|| {})));

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["command"], "create");
        assert_eq!(json["help"]["requested"], false);
        assert!(json.get("completion").is_none());
        assert!(json["help"].get("message").is_none());
    }

    #[tokio::test]
    async fn test_closure_is_a_handler() {
        let handler = |ctx: Invocation| async move { ctx.input };
        let out = handler.call(invocation()).await.unwrap();
        assert_eq!(out, Output::Text("me@domain.com".into()));
    }

    #[tokio::test]
    async fn test_sync_handler() {
        let handler = SyncHandler(|ctx: Invocation| -> anyhow::Result<String> {
            anyhow::ensure!(!ctx.input.is_empty(), "no input");
            Ok(ctx.input.to_uppercase())
        });
        let out = handler.call(invocation()).await.unwrap();
        assert_eq!(out, Output::Text("ME@DOMAIN.COM".into()));
    }

    #[tokio::test]
    async fn test_channel_completion() {
        let (completion, rx) = Completion::channel();
        completion.complete();
        assert!(rx.await.is_ok());

        let (completion, rx) = Completion::channel();
        drop(completion);
        assert!(rx.await.is_err());
    }
}
