//! Flag parsing
//!
//! [`FlagParser`] is the seam the dispatcher calls through. [`ArgParser`] is
//! the stock implementation.

use crate::decl::{FlagDecl, FlagSpec, FlagType};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Value of a recognized flag
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    /// The flag appeared once (or came from its default)
    Single(Value),

    /// The flag appeared more than once, in occurrence order
    Multiple(Vec<Value>),
}

impl FlagValue {
    /// Append another occurrence
    pub fn push(&mut self, value: Value) {
        match self {
            FlagValue::Multiple(values) => values.push(value),
            FlagValue::Single(first) => {
                let first = first.take();
                *self = FlagValue::Multiple(vec![first, value]);
            }
        }
    }

    /// Loose truthiness: `false`, `null`, `0`, `""` are false, anything else true
    pub fn is_truthy(&self) -> bool {
        match self {
            FlagValue::Single(value) => truthy(value),
            FlagValue::Multiple(values) => !values.is_empty(),
        }
    }

    /// The value, when the flag appeared once
    pub fn single(&self) -> Option<&Value> {
        match self {
            FlagValue::Single(value) => Some(value),
            FlagValue::Multiple(_) => None,
        }
    }

    /// The string value, when the flag appeared once with a string
    pub fn as_str(&self) -> Option<&str> {
        self.single().and_then(Value::as_str)
    }

    /// The boolean value, when the flag appeared once with a boolean
    pub fn as_bool(&self) -> Option<bool> {
        self.single().and_then(Value::as_bool)
    }

    /// Every occurrence, in order
    pub fn values(&self) -> Vec<&Value> {
        match self {
            FlagValue::Single(value) => vec![value],
            FlagValue::Multiple(values) => values.iter().collect(),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A mismatch between the supplied tokens and a flag's declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    #[error("Flag '{flag}' expects a value.")]
    MissingValue { flag: String },

    #[error("Flag '{flag}' expects a {expected} value (received \"{received}\").")]
    InvalidType {
        flag: String,
        expected: FlagType,
        received: String,
    },

    #[error("Flag '{flag}' must be one of [{}] (received \"{received}\").", join(.allowed))]
    InvalidOption {
        flag: String,
        received: String,
        allowed: Vec<String>,
    },

    #[error("Flag '{flag}' is required.")]
    MissingRequired { flag: String },
}

fn join(list: &[String]) -> String {
    list.join(", ")
}

impl Violation {
    /// Name of the flag the violation is about
    pub fn flag(&self) -> &str {
        match self {
            Violation::MissingValue { flag }
            | Violation::InvalidType { flag, .. }
            | Violation::InvalidOption { flag, .. }
            | Violation::MissingRequired { flag } => flag,
        }
    }
}

/// Everything a parser reports about one token sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseOutcome {
    /// Flag name to value. May include entries for unrecognized flags.
    pub data: BTreeMap<String, FlagValue>,

    /// Tokens that could not be associated with any declaration
    pub unrecognized_flags: Vec<String>,

    /// `true` when there are no violations
    pub valid: bool,

    /// Declaration mismatches
    pub violations: Vec<Violation>,
}

/// Validates tokens against a [`FlagSpec`]
///
/// # Example
///
/// ```
/// use sen_flags::{ArgParser, FlagDecl, FlagParser, FlagSpec};
///
/// struct NoFlags;
///
/// impl FlagParser for NoFlags {
///     fn parse(&self, tokens: &[String], _spec: &FlagSpec) -> sen_flags::ParseOutcome {
///         sen_flags::ParseOutcome {
///             unrecognized_flags: tokens.to_vec(),
///             valid: true,
///             ..Default::default()
///         }
///     }
/// }
///
/// let spec = FlagSpec::new().with("verbose", FlagDecl::boolean().alias("v"));
/// let tokens = vec!["-v".to_string()];
///
/// assert_eq!(ArgParser.parse(&tokens, &spec).data["verbose"].as_bool(), Some(true));
/// assert!(NoFlags.parse(&tokens, &spec).data.is_empty());
/// ```
pub trait FlagParser: Send + Sync {
    /// Parse `tokens` against `spec`
    fn parse(&self, tokens: &[String], spec: &FlagSpec) -> ParseOutcome;
}

/// Stock flag parser
///
/// - `-x` and `--x` are flags (`-5` is a value); names resolve by exact
///   name first, then by alias
/// - `boolean` flags take no value but accept a following `true`/`false`
/// - `string` and `number` flags take the next non-flag token
/// - unknown flags are recorded as `true` and listed as unrecognized
/// - tokens that are not consumed as values are listed as unrecognized
/// - repeated flags accumulate in occurrence order
/// - defaults fill in missing flags; missing `required` flags are violations
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgParser;

impl FlagParser for ArgParser {
    fn parse(&self, tokens: &[String], spec: &FlagSpec) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();
        let mut index = 0;

        while index < tokens.len() {
            let token = &tokens[index];
            index += 1;

            let Some(name) = flag_name(token) else {
                outcome.unrecognized_flags.push(token.clone());
                continue;
            };

            let Some((key, decl)) = spec.resolve(name) else {
                record(&mut outcome.data, name, Value::Bool(true));
                outcome.unrecognized_flags.push(name.to_string());
                continue;
            };

            let next = tokens.get(index).filter(|t| flag_name(t).is_none());
            let value = match decl.kind {
                FlagType::Boolean => match next.map(String::as_str) {
                    Some("true") => {
                        index += 1;
                        Value::Bool(true)
                    }
                    Some("false") => {
                        index += 1;
                        Value::Bool(false)
                    }
                    _ => Value::Bool(true),
                },
                FlagType::String => match next {
                    Some(raw) => {
                        index += 1;
                        Value::String(raw.clone())
                    }
                    None => {
                        outcome.violations.push(Violation::MissingValue {
                            flag: key.to_string(),
                        });
                        continue;
                    }
                },
                FlagType::Number => match next {
                    Some(raw) => {
                        index += 1;
                        parse_number(raw).unwrap_or_else(|| {
                            outcome.violations.push(Violation::InvalidType {
                                flag: key.to_string(),
                                expected: FlagType::Number,
                                received: raw.clone(),
                            });
                            Value::String(raw.clone())
                        })
                    }
                    None => {
                        outcome.violations.push(Violation::MissingValue {
                            flag: key.to_string(),
                        });
                        continue;
                    }
                },
            };

            if let Some(violation) = check_options(key, decl, &value) {
                outcome.violations.push(violation);
            }
            record(&mut outcome.data, key, value);
        }

        for (name, decl) in spec.iter() {
            if outcome.data.contains_key(name) {
                continue;
            }
            if let Some(default) = &decl.default {
                outcome
                    .data
                    .insert(name.clone(), FlagValue::Single(default.clone()));
            } else if decl.required {
                outcome
                    .violations
                    .push(Violation::MissingRequired { flag: name.clone() });
            }
        }

        outcome.valid = outcome.violations.is_empty();
        outcome
    }
}

/// Name of a flag token with its dashes removed, or `None` for values
fn flag_name(token: &str) -> Option<&str> {
    let name = token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))?;
    match name.chars().next() {
        Some(c) if !c.is_ascii_digit() && c != '.' => Some(name),
        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(Value::from(n));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn check_options(flag: &str, decl: &FlagDecl, value: &Value) -> Option<Violation> {
    let allowed = decl.options.as_ref()?;
    let received = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if allowed.contains(&received) {
        return None;
    }
    Some(Violation::InvalidOption {
        flag: flag.to_string(),
        received,
        allowed: allowed.clone(),
    })
}

fn record(data: &mut BTreeMap<String, FlagValue>, name: &str, value: Value) {
    match data.get_mut(name) {
        Some(existing) => existing.push(value),
        None => {
            data.insert(name.to_string(), FlagValue::Single(value));
        }
    }
}
