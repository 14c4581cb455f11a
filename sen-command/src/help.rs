//! Usage and help rendering
//!
//! Layout of generated help:
//!
//! ```text
//! account create <new>  [OPTIONS]
//!
//!   Create a user account.
//!
//! Options:
//!
//!   -name [-n]     : Account display name
//!   -phone [-p]     : Account phone number
//! ```
//!
//! Flag descriptions wrap to the node's table width and continuation lines
//! are indented to line up under the first chunk. Subcommands are listed
//! after flags, one per line.

use crate::adapter::HELP_FLAG;
use crate::node::NodeId;
use crate::tree::CommandTree;
use sen_flags::FlagDecl;

impl CommandTree {
    /// Usage line of `id`, followed by its description when it has one
    pub fn usage(&self, id: NodeId) -> String {
        let Some(node) = self.node(id) else {
            return String::new();
        };
        if let Some(custom) = &node.usage {
            return custom.resolve();
        }

        let aliases = if node.aliases.is_empty() {
            String::new()
        } else {
            format!(" <{}> ", node.aliases.join(", "))
        };
        let mut text = format!("{}{} [OPTIONS]", self.command_root(id), aliases)
            .trim()
            .to_string();

        let description = node.description.as_deref().unwrap_or("").trim();
        if !description.is_empty() {
            text.push_str("\n\n  ");
            text.push_str(description);
        }
        text
    }

    /// Full help text of `id`
    pub fn help(&self, id: NodeId) -> String {
        let Some(node) = self.node(id) else {
            return String::new();
        };
        if let Some(custom) = &node.help {
            return custom.resolve();
        }

        let tab_width = self.tab_width(id);
        let table_width = self.table_width(id);

        let mut sections = vec![format!("{}\n", self.usage(id))];

        let flags: Vec<_> = node
            .flags
            .iter()
            .filter(|(name, _)| name.as_str() != HELP_FLAG)
            .collect();
        if !flags.is_empty() || !node.children.is_empty() {
            sections.push("Options:\n".to_string());
        }
        for (name, decl) in flags {
            sections.push(flag_line(name, decl, tab_width, table_width));
        }

        for &child in &node.children {
            let Some(child_node) = self.node(child) else {
                continue;
            };
            let mut line = format!("  {}: \t  {} ", child_node.name, self.description(child));
            if !child_node.aliases.is_empty() {
                line.push_str(&format!(" Aliases: {}.", child_node.aliases.join(", ")));
            }
            sections.push(line);
        }

        tidy(&(sections.join("\n") + "\n"), tab_width)
    }
}

fn flag_line(name: &str, decl: &FlagDecl, tab_width: usize, table_width: usize) -> String {
    let mut line = format!("  -{name}");
    if !decl.aliases.is_empty() {
        let aliases: Vec<String> = decl.aliases.iter().map(|a| format!("-{a}")).collect();
        line.push_str(&format!(" [{}]", aliases.join(", ")));
    }
    line.push('\t');

    let tabs = line.matches('\t').count();
    let prefix = line.chars().count() + 2 + tab_width * tabs;
    let width = table_width.saturating_sub(prefix);

    let mut chunks = wrap(decl.description.as_deref().unwrap_or(""), width).into_iter();
    line.push_str(" : ");
    line.push_str(&chunks.next().unwrap_or_default());

    let indent = " ".repeat(prefix);
    for chunk in chunks {
        line.push('\n');
        line.push_str(&indent);
        line.push_str(&chunk);
    }
    line
}

/// Break `text` into chunks of at most `width + 1` characters, each ending in
/// whitespace
///
/// A chunk never runs past a newline. A word longer than `width` becomes its
/// own (long) chunk. The last chunk is merged back into the one before it
/// while the two together stay under `width`. Chunks are trimmed.
///
/// Widths count `char`s, not display columns, so wide characters take up
/// more room than they are charged for.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut chunks: Vec<String> = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let Some(end) = chunk_end(&chars, start, width) else {
            break;
        };
        chunks.push(chars[start..=end].iter().collect());
        start = end + 1;
    }
    chunks.push(chars[start..].iter().collect());

    while chunks.len() > 1 {
        let n = chunks.len();
        if chunks[n - 1].chars().count() + chunks[n - 2].chars().count() >= width {
            break;
        }
        if let Some(last) = chunks.pop() {
            chunks[n - 2].push_str(&last);
        }
    }

    chunks.iter().map(|chunk| chunk.trim().to_string()).collect()
}

/// Index of the whitespace that ends the chunk starting at `start`
fn chunk_end(chars: &[char], start: usize, width: usize) -> Option<usize> {
    let limit = (start + width).min(chars.len() - 1);
    let mut end = None;
    for (i, &c) in chars.iter().enumerate().take(limit + 1).skip(start) {
        if c.is_whitespace() {
            end = Some(i);
        }
        if c == '\n' {
            break;
        }
    }
    end.or_else(|| {
        chars[start..]
            .iter()
            .position(|c| c.is_whitespace())
            .map(|offset| start + offset)
    })
}

/// Collapse blank-line runs, end with exactly one newline, expand tabs
fn tidy(text: &str, tab_width: usize) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in text.split('\n') {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        previous_blank = blank;
        lines.push(line);
    }
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out.replace('\t', &" ".repeat(tab_width))
}
