//! Command configuration
//!
//! A [`CommandConfig`] describes one command and, recursively, its
//! subcommands. It is a plain builder; validation happens when the tree
//! turns it into nodes.

use crate::error::ConfigError;
use crate::handler::{Handler, SyncHandler};
use crate::node::TextSource;
use crate::IntoOutput;
use sen_flags::{FlagDecl, FlagSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Presentation settings used when neither a node nor any ancestor sets one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeDefaults {
    /// Spaces per tab stop in help output
    pub tab_width: usize,

    /// Line width used to wrap flag descriptions
    pub table_width: usize,

    /// Answer help requests with rendered help instead of running a handler
    pub autohelp: bool,
}

impl Default for TreeDefaults {
    fn default() -> Self {
        Self {
            tab_width: 4,
            table_width: 70,
            autohelp: true,
        }
    }
}

/// Configuration of one command
#[derive(Clone)]
pub struct CommandConfig {
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
    pub(crate) subcommands: Vec<CommandConfig>,
}

impl CommandConfig {
    /// Start a configuration. Only the first word of `name` is kept.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            usage: None,
            help: None,
            flags: FlagSpec::new(),
            implicit_help: true,
            handler: None,
            default_handler: None,
            autohelp: None,
            tab_width: None,
            table_width: None,
            subcommands: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the generated usage text
    pub fn usage(mut self, usage: impl Into<TextSource>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    /// Replace the generated help text
    pub fn help(mut self, help: impl Into<TextSource>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Declare a flag. Declaring the same name again replaces it.
    pub fn flag(mut self, name: impl Into<String>, decl: FlagDecl) -> Self {
        self.flags.insert(name, decl);
        self
    }

    pub fn flags(mut self, flags: FlagSpec) -> Self {
        self.flags = flags;
        self
    }

    /// Do not add the built-in `help` flag to this command
    pub fn without_help_flag(mut self) -> Self {
        self.implicit_help = false;
        self
    }

    pub fn handler<F, Fut, R>(self, f: F) -> Self
    where
        F: Fn(crate::Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoOutput + Send + 'static,
    {
        self.handler_with(f)
    }

    pub fn handler_with(mut self, handler: impl Handler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn sync_handler<F, R>(self, f: F) -> Self
    where
        F: Fn(crate::Invocation) -> R + Send + Sync + 'static,
        R: IntoOutput + 'static,
    {
        self.handler_with(SyncHandler(f))
    }

    /// Handler used by this command and its descendants when they have no
    /// handler of their own
    pub fn default_handler<F, Fut, R>(self, f: F) -> Self
    where
        F: Fn(crate::Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoOutput + Send + 'static,
    {
        self.default_handler_with(f)
    }

    pub fn default_handler_with(mut self, handler: impl Handler + 'static) -> Self {
        self.default_handler = Some(Arc::new(handler));
        self
    }

    pub fn autohelp(mut self, enabled: bool) -> Self {
        self.autohelp = Some(enabled);
        self
    }

    pub fn tab_width(mut self, width: usize) -> Self {
        self.tab_width = Some(width);
        self
    }

    pub fn table_width(mut self, width: usize) -> Self {
        self.table_width = Some(width);
        self
    }

    pub fn subcommand(mut self, config: CommandConfig) -> Self {
        self.subcommands.push(config);
        self
    }

    pub fn subcommands(mut self, configs: impl IntoIterator<Item = CommandConfig>) -> Self {
        self.subcommands.extend(configs);
        self
    }

    /// Read a configuration from JSON
    ///
    /// Recognized keys: `name`, `alias`/`aliases`, `description`, `usage`,
    /// `help`, `flags`, `helpFlag`, `autohelp`, `tabWidth`, `tableWidth`,
    /// `commands`/`subcommands`. Handlers cannot be expressed in JSON, so a
    /// `handler` key is rejected; attach handlers with the tree's setters.
    ///
    /// ```
    /// use sen_command::CommandConfig;
    /// use serde_json::json;
    ///
    /// let config = CommandConfig::from_json(&json!({
    ///     "name": "account",
    ///     "commands": [{ "name": "create", "flags": { "name": { "alias": "n" } } }]
    /// }))
    /// .unwrap();
    /// assert_eq!(config.name(), "account");
    /// ```
    pub fn from_json(value: &Value) -> Result<Self, ConfigError> {
        let object = value.as_object().ok_or(ConfigError::NotAnObject)?;

        if object.contains_key("handler") {
            return Err(ConfigError::InvalidHandler);
        }

        let name = object
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .ok_or(ConfigError::MissingName)?;

        let mut config = CommandConfig::new(name);

        for key in ["aliases", "alias"] {
            if let Some(value) = object.get(key) {
                config.aliases.extend(alias_list(key, value)?);
            }
        }

        config.description = optional_string(object, "description")?;
        config.usage = optional_string(object, "usage")?.map(TextSource::Static);
        config.help = optional_string(object, "help")?.map(TextSource::Static);

        if let Some(flags) = object.get("flags") {
            config.flags = flag_spec(flags)?;
        }

        if let Some(enabled) = object.get("helpFlag").and_then(Value::as_bool) {
            config.implicit_help = enabled;
        }

        // Non-boolean values are ignored, like an unset autohelp
        config.autohelp = object.get("autohelp").and_then(Value::as_bool);
        config.tab_width = optional_width(object, "tabWidth")?;
        config.table_width = optional_width(object, "tableWidth")?;

        for key in ["commands", "subcommands"] {
            let Some(children) = object.get(key) else {
                continue;
            };
            let children = children
                .as_array()
                .ok_or_else(|| ConfigError::invalid_field(key, "must be an array of commands"))?;
            for child in children {
                config.subcommands.push(CommandConfig::from_json(child)?);
            }
        }

        Ok(config)
    }

    /// Parse JSON text and read it with [`from_json`](Self::from_json)
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Name as given (trimmed to its first word when the node is built)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_subcommands(&self) -> &[CommandConfig] {
        &self.subcommands
    }

    pub fn get_flags(&self) -> &FlagSpec {
        &self.flags
    }
}

impl fmt::Debug for CommandConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandConfig")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("description", &self.description)
            .field("flags", &self.flags.names().collect::<Vec<_>>())
            .field("has_handler", &self.handler.is_some())
            .field("subcommands", &self.subcommands)
            .finish_non_exhaustive()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Aliases may be a string (its first word), a list, or an object whose keys
/// are the aliases
fn alias_list(key: &'static str, value: &Value) -> Result<Vec<String>, ConfigError> {
    match value {
        Value::String(s) => Ok(s
            .split_whitespace()
            .next()
            .map(str::to_string)
            .into_iter()
            .collect()),
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()),
        Value::Object(map) => Ok(map.keys().cloned().collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(ConfigError::invalid_field(
            key,
            format!("must be a string or a list, received {}", json_kind(other)),
        )),
    }
}

fn optional_string(
    object: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, ConfigError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ConfigError::invalid_field(
            key,
            format!("must be a string, received {}", json_kind(other)),
        )),
    }
}

fn optional_width(
    object: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<usize>, ConfigError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| ConfigError::invalid_field(key, "must be a non-negative integer")),
    }
}

fn flag_spec(value: &Value) -> Result<FlagSpec, ConfigError> {
    let entries = value.as_object().ok_or_else(|| ConfigError::InvalidFlags {
        found: json_kind(value).to_string(),
    })?;

    let mut spec = FlagSpec::new();
    for (name, decl) in entries {
        let decl: FlagDecl =
            serde_json::from_value(decl.clone()).map_err(|e| ConfigError::InvalidFlagDecl {
                flag: name.clone(),
                reason: e.to_string(),
            })?;
        spec.insert(name.clone(), decl);
    }
    Ok(spec)
}
