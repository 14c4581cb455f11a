//! Command tree
//!
//! Owns every node in a generational arena. All structural changes go
//! through the tree so parent links, child lists and route maps stay in
//! step:
//!
//! - every identity in a route map is also in that node's child list
//! - a child's parent is the node whose child list holds it
//! - there are no cycles
//!
//! Presentation settings (`autohelp`, tab and table width) and the default
//! handler are inherited: a node without its own value uses its nearest
//! ancestor's, then the tree defaults. Changing a node's value therefore
//! reaches every descendant that has no value of its own, including ones
//! attached later.

use crate::adapter::FlagAdapter;
use crate::config::{CommandConfig, TreeDefaults};
use crate::error::{ConfigError, TreeError};
use crate::handler::{Handler, SyncHandler};
use crate::node::{dedup, CommandNode, NodeId, TextSource};
use crate::IntoOutput;
use generational_arena::{Arena, Index};
use sen_flags::{FlagDecl, FlagParser};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// A tree of commands rooted at one node
pub struct CommandTree {
    id: u64,
    arena: Arena<CommandNode>,
    root: NodeId,
    defaults: TreeDefaults,
    pub(crate) adapter: FlagAdapter,
}

impl CommandTree {
    /// Build a tree from its root configuration
    pub fn new(config: CommandConfig) -> Result<Self, ConfigError> {
        Self::with_defaults(config, TreeDefaults::default())
    }

    /// Build a tree whose uninherited settings fall back to `defaults`
    pub fn with_defaults(
        config: CommandConfig,
        defaults: TreeDefaults,
    ) -> Result<Self, ConfigError> {
        let id = NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed);
        let mut tree = Self {
            id,
            arena: Arena::new(),
            // Replaced as soon as the root node exists
            root: NodeId {
                tree: id,
                index: Index::from_raw_parts(0, 0),
            },
            defaults,
            adapter: FlagAdapter::default(),
        };
        tree.root = tree.create(config)?;

        tracing::debug!(root = %node_name(&tree, tree.root), "Command tree built");
        Ok(tree)
    }

    /// Use `parser` instead of the stock [`ArgParser`](sen_flags::ArgParser)
    pub fn with_parser(mut self, parser: impl FlagParser + 'static) -> Self {
        self.adapter = FlagAdapter::new(parser);
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn defaults(&self) -> TreeDefaults {
        self.defaults
    }

    pub fn node(&self, id: NodeId) -> Option<&CommandNode> {
        if id.tree != self.id {
            return None;
        }
        self.arena.get(id.index)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut CommandNode> {
        if id.tree != self.id {
            return None;
        }
        self.arena.get_mut(id.index)
    }

    fn existing_mut(&mut self, id: NodeId) -> Result<&mut CommandNode, TreeError> {
        self.node_mut(id).ok_or(TreeError::UnknownNode(id))
    }

    #[cfg(test)]
    pub(crate) fn arena_mut(&mut self) -> &mut Arena<CommandNode> {
        &mut self.arena
    }

    /// Whether `id` names a live node of this tree
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes, attached or not
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Build a detached node (and its configured subcommands)
    ///
    /// Nothing is created if any configuration in the subtree is invalid.
    pub fn create(&mut self, config: CommandConfig) -> Result<NodeId, ConfigError> {
        let mut created = Vec::new();
        match self.build(config, &mut created) {
            Ok(id) => Ok(id),
            Err(e) => {
                for id in created {
                    self.arena.remove(id.index);
                }
                Err(e)
            }
        }
    }

    fn build(
        &mut self,
        config: CommandConfig,
        created: &mut Vec<NodeId>,
    ) -> Result<NodeId, ConfigError> {
        let (node, children) = CommandNode::from_config(config)?;
        let id = NodeId {
            tree: self.id,
            index: self.arena.insert(node),
        };
        created.push(id);

        for child in children {
            let child = self.build(child, created)?;
            self.link(id, child);
        }
        Ok(id)
    }

    /// Create a node from `config` and attach it under `parent`
    pub fn add(&mut self, parent: NodeId, config: CommandConfig) -> Result<NodeId, TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::UnknownNode(parent));
        }
        let child = self.create(config)?;
        self.link(parent, child);
        self.log_attached(parent, child);
        Ok(child)
    }

    /// Attach a detached node under `parent`
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::UnknownNode(parent));
        }
        let node = self.node(child).ok_or(TreeError::UnknownNode(child))?;
        if node.parent.is_some() {
            return Err(TreeError::AlreadyAttached {
                name: node.name.clone(),
            });
        }
        if self.ancestors(parent).any(|ancestor| ancestor == child) {
            return Err(TreeError::Cycle {
                name: node.name.clone(),
            });
        }

        self.link(parent, child);
        self.log_attached(parent, child);
        Ok(())
    }

    fn log_attached(&self, parent: NodeId, child: NodeId) {
        tracing::info!(
            parent = %node_name(self, parent),
            command = %node_name(self, child),
            "Subcommand attached"
        );
    }

    /// Record `child` under `parent`. Both must exist and `child` must be detached.
    fn link(&mut self, parent: NodeId, child: NodeId) {
        let Some(node) = self.node_mut(child) else {
            return;
        };
        node.parent = Some(parent);
        let keys: Vec<String> = std::iter::once(node.name.clone())
            .chain(node.aliases.iter().cloned())
            .collect();

        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.push(child);
            for key in keys {
                register_route(parent_node, key, child);
            }
        }
    }

    /// Remove a direct child of `parent`
    ///
    /// The child is destroyed; its own children are detached and keep their
    /// identities. Returns `false` if `child` is not a child of `parent`.
    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(parent_node) = self.node_mut(parent) else {
            return false;
        };
        let Some(position) = parent_node.children.iter().position(|&c| c == child) else {
            return false;
        };
        parent_node.children.remove(position);
        parent_node.routes.retain(|_, id| *id != child);
        self.restore_routes(parent);

        let Some(removed) = self.arena.remove(child.index) else {
            return true;
        };
        for grandchild in &removed.children {
            if let Some(node) = self.node_mut(*grandchild) {
                node.parent = None;
            }
        }

        tracing::info!(
            parent = %node_name(self, parent),
            command = %removed.name,
            "Subcommand removed"
        );
        true
    }

    /// Remove the child of `parent` that `name` routes to
    pub fn remove_named(&mut self, parent: NodeId, name: &str) -> bool {
        let child = self.node(parent).and_then(|node| node.routes.get(name).copied());
        match child {
            Some(child) => self.remove(parent, child),
            None => false,
        }
    }

    /// Direct subcommands of `id` in insertion order
    pub fn subcommands(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// `id` and then each ancestor up to its root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).map(|_| id), move |&current| {
            self.parent(current)
        })
    }

    /// Full command path of `id`, e.g. `account create`
    pub fn command_root(&self, id: NodeId) -> String {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .filter_map(|ancestor| self.node(ancestor).map(CommandNode::name))
            .collect();
        names.reverse();
        names.join(" ")
    }

    /// The node's description, or its usage when it has none
    pub fn description(&self, id: NodeId) -> String {
        match self.node(id).and_then(CommandNode::raw_description) {
            Some(description) if !description.is_empty() => description.to_string(),
            _ => self.usage(id),
        }
    }

    // ========================================================================
    // Inherited settings
    // ========================================================================

    fn inherited<T>(&self, id: NodeId, pick: impl Fn(&CommandNode) -> Option<T>) -> Option<T> {
        self.ancestors(id)
            .find_map(|ancestor| self.node(ancestor).and_then(&pick))
    }

    pub fn autohelp(&self, id: NodeId) -> bool {
        self.inherited(id, |node| node.autohelp)
            .unwrap_or(self.defaults.autohelp)
    }

    pub fn tab_width(&self, id: NodeId) -> usize {
        self.inherited(id, |node| node.tab_width)
            .unwrap_or(self.defaults.tab_width)
    }

    pub fn table_width(&self, id: NodeId) -> usize {
        self.inherited(id, |node| node.table_width)
            .unwrap_or(self.defaults.table_width)
    }

    /// The nearest default handler at or above `id`
    pub fn default_handler(&self, id: NodeId) -> Option<Arc<dyn Handler>> {
        self.inherited(id, |node| node.default_handler.clone())
    }

    // ========================================================================
    // Node mutation
    // ========================================================================

    pub fn set_autohelp(&mut self, id: NodeId, enabled: bool) -> Result<(), TreeError> {
        self.existing_mut(id)?.autohelp = Some(enabled);
        Ok(())
    }

    pub fn set_tab_width(&mut self, id: NodeId, width: usize) -> Result<(), TreeError> {
        self.existing_mut(id)?.tab_width = Some(width);
        Ok(())
    }

    pub fn set_table_width(&mut self, id: NodeId, width: usize) -> Result<(), TreeError> {
        self.existing_mut(id)?.table_width = Some(width);
        Ok(())
    }

    pub fn set_description(
        &mut self,
        id: NodeId,
        description: impl Into<String>,
    ) -> Result<(), TreeError> {
        self.existing_mut(id)?.description = Some(description.into());
        Ok(())
    }

    /// Replace the generated usage text, or restore it with `None`
    pub fn set_usage(&mut self, id: NodeId, usage: Option<TextSource>) -> Result<(), TreeError> {
        self.existing_mut(id)?.usage = usage;
        Ok(())
    }

    /// Replace the generated help text, or restore it with `None`
    pub fn set_help(&mut self, id: NodeId, help: Option<TextSource>) -> Result<(), TreeError> {
        self.existing_mut(id)?.help = help;
        Ok(())
    }

    pub fn set_handler<F, Fut, R>(&mut self, id: NodeId, f: F) -> Result<(), TreeError>
    where
        F: Fn(crate::Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoOutput + Send + 'static,
    {
        self.set_handler_with(id, f)
    }

    pub fn set_sync_handler<F, R>(&mut self, id: NodeId, f: F) -> Result<(), TreeError>
    where
        F: Fn(crate::Invocation) -> R + Send + Sync + 'static,
        R: IntoOutput + 'static,
    {
        self.set_handler_with(id, SyncHandler(f))
    }

    pub fn set_handler_with(
        &mut self,
        id: NodeId,
        handler: impl Handler + 'static,
    ) -> Result<(), TreeError> {
        self.existing_mut(id)?.handler = Some(Arc::new(handler));
        Ok(())
    }

    /// Set the default handler for `id` and every descendant without its own
    pub fn set_default_handler<F, Fut, R>(&mut self, id: NodeId, f: F) -> Result<(), TreeError>
    where
        F: Fn(crate::Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoOutput + Send + 'static,
    {
        self.set_default_handler_with(id, f)
    }

    pub fn set_default_handler_with(
        &mut self,
        id: NodeId,
        handler: impl Handler + 'static,
    ) -> Result<(), TreeError> {
        self.existing_mut(id)?.default_handler = Some(Arc::new(handler));
        Ok(())
    }

    /// Replace a node's aliases and refresh its parent's routes
    pub fn set_aliases<I, S>(&mut self, id: NodeId, aliases: I) -> Result<(), TreeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let node = self.existing_mut(id)?;
        node.aliases = dedup(aliases.into_iter().map(Into::into).collect());
        let name = node.name.clone();
        let aliases = node.aliases.clone();
        let parent = node.parent;

        if let Some(parent_node) = parent.and_then(|p| self.node_mut(p)) {
            parent_node
                .routes
                .retain(|key, target| *target != id || *key == name);
            for alias in aliases {
                register_route(parent_node, alias, id);
            }
        }
        if let Some(parent) = parent {
            self.restore_routes(parent);
        }
        Ok(())
    }

    /// Give vacant route keys back to the remaining children of `parent`
    ///
    /// Names are restored before aliases. Among siblings the latest one wins,
    /// as it would have when the routes were first registered.
    fn restore_routes(&mut self, parent: NodeId) {
        let Some(node) = self.node(parent) else {
            return;
        };
        let children: Vec<(NodeId, String, Vec<String>)> = node
            .children
            .iter()
            .rev()
            .filter_map(|&child| {
                self.node(child)
                    .map(|c| (child, c.name.clone(), c.aliases.clone()))
            })
            .collect();

        let Some(parent_node) = self.node_mut(parent) else {
            return;
        };
        for (child, name, _) in &children {
            parent_node.routes.entry(name.clone()).or_insert(*child);
        }
        for (child, _, aliases) in &children {
            for alias in aliases {
                parent_node.routes.entry(alias.clone()).or_insert(*child);
            }
        }
    }

    /// Declare (or replace) a flag
    pub fn add_flag(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        decl: FlagDecl,
    ) -> Result<Option<FlagDecl>, TreeError> {
        Ok(self.existing_mut(id)?.flags.insert(name, decl))
    }

    pub fn remove_flag(&mut self, id: NodeId, name: &str) -> Result<Option<FlagDecl>, TreeError> {
        Ok(self.existing_mut(id)?.flags.remove(name))
    }

    /// Whether `id` declares a flag under this exact name
    pub fn supports_flag(&self, id: NodeId, name: &str) -> bool {
        self.node(id).is_some_and(|node| node.flags.contains(name))
    }
}

impl std::fmt::Debug for CommandTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTree")
            .field("root", &self.root)
            .field("nodes", &self.arena.len())
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

fn node_name(tree: &CommandTree, id: NodeId) -> String {
    tree.node(id)
        .map(|node| node.name.clone())
        .unwrap_or_default()
}

/// Route `key` to `child`; a later registration wins
fn register_route(parent: &mut CommandNode, key: String, child: NodeId) {
    if let Some(previous) = parent.routes.insert(key.clone(), child) {
        if previous != child {
            tracing::warn!(
                parent = %parent.name,
                route = %key,
                "Subcommand route overwritten"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandConfig;

    fn account_tree() -> CommandTree {
        CommandTree::new(
            CommandConfig::new("account")
                .subcommand(CommandConfig::new("create").alias("new"))
                .subcommand(CommandConfig::new("delete").aliases(["rm", "del"])),
        )
        .unwrap()
    }

    fn child(tree: &CommandTree, name: &str) -> NodeId {
        tree.node(tree.root()).unwrap().routes[name]
    }

    #[test]
    fn test_routes_cover_names_and_aliases() {
        let tree = account_tree();
        let routes = &tree.node(tree.root()).unwrap().routes;

        assert_eq!(routes.len(), 5);
        assert_eq!(routes["new"], routes["create"]);
        assert_eq!(routes["rm"], routes["delete"]);
        assert_eq!(tree.subcommands(tree.root()).len(), 2);
    }

    #[test]
    fn test_parent_links() {
        let tree = account_tree();
        let create = child(&tree, "create");

        assert_eq!(tree.parent(create), Some(tree.root()));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.command_root(create), "account create");
    }

    #[test]
    fn test_failed_create_leaves_nothing_behind() {
        let mut tree = account_tree();
        let before = tree.len();

        let err = tree
            .create(
                CommandConfig::new("user")
                    .subcommand(CommandConfig::new("ok"))
                    .subcommand(CommandConfig::new(" ")),
            )
            .unwrap_err();

        assert_eq!(err, ConfigError::MissingName);
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn test_attach_rejects_attached_node() {
        let mut tree = account_tree();
        let create = child(&tree, "create");
        let delete = child(&tree, "delete");

        let err = tree.attach(delete, create).unwrap_err();
        assert!(matches!(err, TreeError::AlreadyAttached { name } if name == "create"));
    }

    #[test]
    fn test_attach_rejects_cycles() {
        let mut tree = account_tree();
        let user = tree.create(CommandConfig::new("user")).unwrap();
        let profile = tree.add(user, CommandConfig::new("profile")).unwrap();

        // user is detached, but profile sits below it
        let err = tree.attach(profile, user).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { name } if name == "user"));

        let err = tree.attach(user, user).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
    }

    #[test]
    fn test_remove_detaches_grandchildren() {
        let mut tree = account_tree();
        let create = child(&tree, "create");
        let step = tree.add(create, CommandConfig::new("step")).unwrap();

        assert!(tree.remove(tree.root(), create));
        assert!(!tree.contains(create));
        assert!(tree.contains(step));
        assert_eq!(tree.parent(step), None);

        let routes = &tree.node(tree.root()).unwrap().routes;
        assert!(!routes.contains_key("create"));
        assert!(!routes.contains_key("new"));
        assert!(!tree.remove(tree.root(), create));
    }

    #[test]
    fn test_remove_named() {
        let mut tree = account_tree();
        assert!(tree.remove_named(tree.root(), "rm"));
        assert_eq!(tree.subcommands(tree.root()).len(), 1);
        assert!(!tree.remove_named(tree.root(), "delete"));
    }

    #[test]
    fn test_set_aliases_refreshes_routes() {
        let mut tree = account_tree();
        let delete = child(&tree, "delete");

        tree.set_aliases(delete, ["erase"]).unwrap();
        let routes = &tree.node(tree.root()).unwrap().routes;

        assert_eq!(routes.get("erase"), Some(&delete));
        assert_eq!(routes.get("delete"), Some(&delete));
        assert!(!routes.contains_key("rm"));
        assert!(!routes.contains_key("del"));
    }

    #[test]
    fn test_inherited_settings() {
        let mut tree = account_tree();
        let create = child(&tree, "create");

        assert_eq!(tree.tab_width(create), 4);
        assert_eq!(tree.table_width(create), 70);
        assert!(tree.autohelp(create));

        tree.set_tab_width(tree.root(), 2).unwrap();
        tree.set_autohelp(tree.root(), false).unwrap();
        assert_eq!(tree.tab_width(create), 2);
        assert!(!tree.autohelp(create));

        tree.set_tab_width(create, 8).unwrap();
        tree.set_tab_width(tree.root(), 3).unwrap();
        assert_eq!(tree.tab_width(create), 8);
        assert_eq!(tree.tab_width(tree.root()), 3);
    }

    #[test]
    fn test_custom_defaults() {
        let tree = CommandTree::with_defaults(
            CommandConfig::new("cli"),
            TreeDefaults {
                tab_width: 2,
                table_width: 40,
                autohelp: false,
            },
        )
        .unwrap();

        assert_eq!(tree.tab_width(tree.root()), 2);
        assert_eq!(tree.table_width(tree.root()), 40);
        assert!(!tree.autohelp(tree.root()));
    }

    #[test]
    fn test_ids_from_another_tree_are_unknown() {
        let one = account_tree();
        let other = account_tree();

        assert!(!other.contains(one.root()));
        assert!(other.node(one.root()).is_none());
    }

    #[test]
    fn test_flag_mutation() {
        let mut tree = account_tree();
        let create = child(&tree, "create");

        assert!(!tree.supports_flag(create, "name"));
        tree.add_flag(create, "name", FlagDecl::string().alias("n")).unwrap();
        assert!(tree.supports_flag(create, "name"));
        assert!(!tree.supports_flag(create, "n"));

        assert!(tree.remove_flag(create, "name").unwrap().is_some());
        assert!(!tree.supports_flag(create, "name"));
    }

    #[test]
    fn test_mutating_removed_node_fails() {
        let mut tree = account_tree();
        let create = child(&tree, "create");
        tree.remove(tree.root(), create);

        assert!(matches!(
            tree.set_tab_width(create, 2),
            Err(TreeError::UnknownNode(id)) if id == create
        ));
    }
}
