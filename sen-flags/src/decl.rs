//! Flag declarations
//!
//! A [`FlagSpec`] is the ordered set of flags a command understands. Order is
//! kept so help output lists flags the way they were declared.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Value type of a declared flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagType {
    /// Takes the next token verbatim
    #[default]
    String,
    /// Takes no value (an explicit `true`/`false` token is accepted)
    #[serde(alias = "bool")]
    Boolean,
    /// Takes the next token and parses it as a number
    Number,
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagType::String => write!(f, "string"),
            FlagType::Boolean => write!(f, "boolean"),
            FlagType::Number => write!(f, "number"),
        }
    }
}

/// Declaration of one flag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFlagDecl")]
pub struct FlagDecl {
    /// Alternative names (without leading dashes), deduplicated, declaration order
    pub aliases: Vec<String>,

    /// Help text for this flag
    pub description: Option<String>,

    /// Value type
    #[serde(rename = "type")]
    pub kind: FlagType,

    /// Value used when the flag does not appear in the input
    pub default: Option<Value>,

    /// Whether the flag must appear (or have a default)
    pub required: bool,

    /// Allowed values, if restricted
    pub options: Option<Vec<String>>,
}

impl FlagDecl {
    /// Create a declaration of the given type
    pub fn new(kind: FlagType) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Create a string flag
    pub fn string() -> Self {
        Self::new(FlagType::String)
    }

    /// Create a boolean flag
    pub fn boolean() -> Self {
        Self::new(FlagType::Boolean)
    }

    /// Create a number flag
    pub fn number() -> Self {
        Self::new(FlagType::Number)
    }

    /// Add an alias; duplicates are ignored
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
        self
    }

    /// Set help text
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set default value
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict the accepted values
    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Check whether `name` is one of this flag's aliases
    pub fn has_alias(&self, name: &str) -> bool {
        self.aliases.iter().any(|a| a == name)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Wire shape of a declaration: `alias` may be a string or a list, and is
/// merged with `aliases`.
#[derive(Deserialize)]
struct RawFlagDecl {
    #[serde(default)]
    alias: Option<OneOrMany>,
    #[serde(default)]
    aliases: Option<OneOrMany>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<FlagType>,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    options: Option<Vec<String>>,
}

impl From<RawFlagDecl> for FlagDecl {
    fn from(raw: RawFlagDecl) -> Self {
        // Untyped flags take their type from the default value
        let kind = raw.kind.unwrap_or(match &raw.default {
            Some(Value::Bool(_)) => FlagType::Boolean,
            Some(Value::Number(_)) => FlagType::Number,
            _ => FlagType::String,
        });

        let mut decl = FlagDecl {
            kind,
            description: raw.description,
            default: raw.default,
            required: raw.required,
            options: raw.options,
            ..FlagDecl::default()
        };

        let names = raw
            .alias
            .into_iter()
            .chain(raw.aliases)
            .flat_map(OneOrMany::into_vec);
        for name in names {
            decl = decl.alias(name);
        }
        decl
    }
}

/// Ordered mapping of flag name to declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagSpec {
    entries: Vec<(String, FlagDecl)>,
}

impl FlagSpec {
    /// Create an empty flag table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flag (builder style)
    pub fn with(mut self, name: impl Into<String>, decl: FlagDecl) -> Self {
        self.insert(name, decl);
        self
    }

    /// Insert or replace a flag. A replaced flag keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, decl: FlagDecl) -> Option<FlagDecl> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, decl)),
            None => {
                self.entries.push((name, decl));
                None
            }
        }
    }

    /// Remove a flag by name
    pub fn remove(&mut self, name: &str) -> Option<FlagDecl> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Get a declaration by exact name
    pub fn get(&self, name: &str) -> Option<&FlagDecl> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, decl)| decl)
    }

    /// Check whether a flag is declared under this exact name
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolve a name or alias to the declared name and its declaration
    pub fn resolve(&self, name: &str) -> Option<(&str, &FlagDecl)> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .or_else(|| self.entries.iter().find(|(_, decl)| decl.has_alias(name)))
            .map(|(n, decl)| (n.as_str(), decl))
    }

    /// Iterate over declarations in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FlagDecl)> {
        self.entries.iter().map(|(n, decl)| (n, decl))
    }

    /// Declared names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, FlagDecl)> for FlagSpec {
    fn from_iter<I: IntoIterator<Item = (N, FlagDecl)>>(iter: I) -> Self {
        let mut spec = FlagSpec::new();
        for (name, decl) in iter {
            spec.insert(name, decl);
        }
        spec
    }
}

impl Serialize for FlagSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, decl) in &self.entries {
            map.serialize_entry(name, decl)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FlagSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SpecVisitor;

        impl<'de> Visitor<'de> for SpecVisitor {
            type Value = FlagSpec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an object mapping flag names to declarations")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FlagSpec, A::Error> {
                let mut spec = FlagSpec::new();
                while let Some((name, decl)) = access.next_entry::<String, FlagDecl>()? {
                    spec.insert(name, decl);
                }
                Ok(spec)
            }
        }

        deserializer.deserialize_map(SpecVisitor)
    }
}
