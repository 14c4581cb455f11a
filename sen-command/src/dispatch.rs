//! Dispatch
//!
//! At each level the input is evaluated against the node's flags, then its
//! first word is tried as a subcommand. A match descends with the rest of
//! the line; otherwise the node itself runs.
//!
//! ```text
//! "account create -n Bob"
//!   cli      : token "account" matches, descend with "create -n Bob"
//!   account  : token "create" matches, descend with "-n Bob"
//!   create   : no token, run handler with name = "Bob"
//! ```

use crate::error::DispatchError;
use crate::handler::{Completion, Invocation};
use crate::node::NodeId;
use crate::resolver::Resolution;
use crate::tokenizer::{split_subcommand, tokenize};
use crate::tree::CommandTree;
use crate::Output;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::Instrument;

impl CommandTree {
    /// Dispatch `input` from the root
    pub async fn run(&self, input: &str) -> Result<Output, DispatchError> {
        self.dispatch(self.root(), input.to_string(), None).await
    }

    /// Dispatch `input` from the root, handing `completion` to the handler
    /// that finally runs
    pub async fn run_with_callback(
        &self,
        input: &str,
        completion: Completion,
    ) -> Result<Output, DispatchError> {
        self.dispatch(self.root(), input.to_string(), Some(completion))
            .await
    }

    /// Dispatch `input` starting at `id` instead of the root
    pub async fn run_at(&self, id: NodeId, input: &str) -> Result<Output, DispatchError> {
        self.dispatch(id, input.to_string(), None).await
    }

    /// One dispatch step at `id`
    pub fn dispatch(
        &self,
        id: NodeId,
        input: String,
        completion: Option<Completion>,
    ) -> BoxFuture<'_, Result<Output, DispatchError>> {
        let span = match self.node(id) {
            Some(node) => tracing::info_span!("dispatch", command = %node.name()),
            None => tracing::info_span!("dispatch", command = tracing::field::Empty),
        };

        async move {
            let node = self.node(id).ok_or(DispatchError::UnknownNode(id))?;

            let tokens = tokenize(&input);
            let evaluation =
                self.adapter
                    .evaluate(&tokens, node.flags(), node.name(), node.implicit_help());
            let mut invocation = Invocation::new(node.name(), &input, evaluation);
            if invocation.help.requested {
                invocation.help.message = Some(self.help(id));
            }
            let autohelp = self.autohelp(id);

            if let Some(split) = split_subcommand(&input) {
                match self.resolve(id, split.token) {
                    Resolution::Matched(child) => {
                        if autohelp && invocation.help.requested {
                            let text = if self.contains(child) {
                                self.help(child)
                            } else {
                                self.help(id)
                            };
                            tracing::debug!(
                                token = %split.token,
                                "Help requested for subcommand"
                            );
                            return Ok(Output::Help(text));
                        }
                        if !self.contains(child) {
                            return Err(DispatchError::CommandNotFound {
                                node: node.name().to_string(),
                                token: split.token.to_string(),
                            });
                        }

                        tracing::debug!(
                            token = %split.token,
                            remainder = %split.remainder,
                            "Descending into subcommand"
                        );
                        let remainder = split.remainder.to_string();
                        return self.dispatch(child, remainder, completion).await;
                    }
                    Resolution::NoMatch => {
                        tracing::debug!(token = %split.token, "No matching subcommand");
                    }
                }
            }

            if autohelp && invocation.help.requested {
                let text = invocation
                    .help
                    .message
                    .take()
                    .unwrap_or_else(|| self.help(id));
                return Ok(Output::Help(text));
            }

            invocation.set_completion(completion);

            let handler = node
                .handler
                .clone()
                .or_else(|| self.default_handler(id));
            match handler {
                Some(handler) => {
                    tracing::debug!(valid = invocation.valid, "Running handler");
                    handler
                        .call(invocation)
                        .await
                        .map_err(DispatchError::Handler)
                }
                None => {
                    tracing::debug!("No handler, rendering help");
                    Ok(Output::Help(self.help(id)))
                }
            }
        }
        .instrument(span)
        .boxed()
    }
}
