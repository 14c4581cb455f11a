//! Command nodes
//!
//! Nodes live in a [`CommandTree`](crate::CommandTree) arena and refer to
//! each other by [`NodeId`]. A node never owns its parent; it records the
//! parent's identity and the tree walks upward when it needs inherited
//! presentation settings.

use crate::config::CommandConfig;
use crate::error::ConfigError;
use crate::handler::Handler;
use generational_arena::Index;
use sen_flags::FlagSpec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Process-unique identity of a command node
///
/// Identities are never reused: a removed node's identity stays dead even if
/// its arena slot is recycled, and identities from one tree never resolve in
/// another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) tree: u64,
    pub(crate) index: Index,
}

/// Text that is either fixed or computed each time it is read
#[derive(Clone)]
pub enum TextSource {
    Static(String),
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl TextSource {
    /// Text computed on every read
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        TextSource::Dynamic(Arc::new(f))
    }

    /// Produce the current text
    pub fn resolve(&self) -> String {
        match self {
            TextSource::Static(text) => text.clone(),
            TextSource::Dynamic(f) => f(),
        }
    }
}

impl fmt::Debug for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSource::Static(text) => f.debug_tuple("Static").field(text).finish(),
            TextSource::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<String> for TextSource {
    fn from(text: String) -> Self {
        TextSource::Static(text)
    }
}

impl From<&str> for TextSource {
    fn from(text: &str) -> Self {
        TextSource::Static(text.to_string())
    }
}

/// One command in the tree
pub struct CommandNode {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: Option<String>,
    pub(crate) usage: Option<TextSource>,
    pub(crate) help: Option<TextSource>,
    pub(crate) flags: FlagSpec,
    pub(crate) implicit_help: bool,
    pub(crate) handler: Option<Arc<dyn Handler>>,
    pub(crate) default_handler: Option<Arc<dyn Handler>>,
    pub(crate) autohelp: Option<bool>,
    pub(crate) tab_width: Option<usize>,
    pub(crate) table_width: Option<usize>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Name and alias of every child to its identity
    pub(crate) routes: HashMap<String, NodeId>,
}

impl CommandNode {
    /// Split a configuration into a bare node and its subcommand configurations
    pub(crate) fn from_config(
        config: CommandConfig,
    ) -> Result<(CommandNode, Vec<CommandConfig>), ConfigError> {
        let name = first_word(&config.name).ok_or(ConfigError::MissingName)?;

        let node = CommandNode {
            name,
            aliases: dedup(config.aliases),
            description: config.description,
            usage: config.usage,
            help: config.help,
            flags: config.flags,
            implicit_help: config.implicit_help,
            handler: config.handler,
            default_handler: config.default_handler,
            autohelp: config.autohelp,
            tab_width: config.tab_width,
            table_width: config.table_width,
            parent: None,
            children: Vec::new(),
            routes: HashMap::new(),
        };
        Ok((node, config.subcommands))
    }

    /// Command name (a single word)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternative names, in declaration order
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn has_alias(&self, name: &str) -> bool {
        self.aliases.iter().any(|a| a == name)
    }

    /// The description as configured, without the usage fallback
    pub fn raw_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared flags
    pub fn flags(&self) -> &FlagSpec {
        &self.flags
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Direct subcommands in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Whether this node sets its own default handler rather than inheriting one
    pub fn has_custom_default_handler(&self) -> bool {
        self.default_handler.is_some()
    }

    /// Whether the built-in `help` flag is added at dispatch time
    pub fn implicit_help(&self) -> bool {
        self.implicit_help
    }

    pub fn has_custom_usage(&self) -> bool {
        self.usage.is_some()
    }

    pub fn has_custom_help(&self) -> bool {
        self.help.is_some()
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("description", &self.description)
            .field("flags", &self.flags.names().collect::<Vec<_>>())
            .field("has_handler", &self.handler.is_some())
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// First whitespace-delimited word of `text`
pub(crate) fn first_word(text: &str) -> Option<String> {
    text.split_whitespace().next().map(str::to_string)
}

pub(crate) fn dedup(names: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !name.is_empty() && !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}
