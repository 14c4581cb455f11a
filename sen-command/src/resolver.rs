//! Subcommand resolution

use crate::node::NodeId;
use crate::tree::CommandTree;

/// Result of looking up a subcommand token under one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The token names a child. The identity may be dead if the child was
    /// destroyed behind the route map's back.
    Matched(NodeId),
    NoMatch,
}

impl Resolution {
    pub fn matched(self) -> Option<NodeId> {
        match self {
            Resolution::Matched(id) => Some(id),
            Resolution::NoMatch => None,
        }
    }
}

impl CommandTree {
    /// Find the child of `parent` that `token` names
    ///
    /// The route map (names and aliases) is consulted first; failing that,
    /// children are scanned in insertion order for one named `token`, then
    /// for one whose aliases contain it.
    pub fn resolve(&self, parent: NodeId, token: &str) -> Resolution {
        let Some(node) = self.node(parent) else {
            return Resolution::NoMatch;
        };

        if let Some(&id) = node.routes.get(token) {
            return Resolution::Matched(id);
        }

        let live = || {
            node.children
                .iter()
                .filter_map(|&child| self.node(child).map(|c| (child, c)))
        };
        live()
            .find(|(_, c)| c.name() == token)
            .or_else(|| live().find(|(_, c)| c.has_alias(token)))
            .map_or(Resolution::NoMatch, |(child, _)| Resolution::Matched(child))
    }

    /// Shortcut for `resolve(parent, token).matched()`, limited to live nodes
    pub fn find(&self, parent: NodeId, token: &str) -> Option<NodeId> {
        self.resolve(parent, token)
            .matched()
            .filter(|&id| self.contains(id))
    }
}
