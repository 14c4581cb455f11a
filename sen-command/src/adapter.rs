//! Bridge between a command node and the flag parser
//!
//! The adapter adds the built-in `help` flag, runs the parser, and reshapes
//! its outcome into the recognized/unrecognized split handlers see.

use crate::handler::Flags;
use sen_flags::{ArgParser, FlagDecl, FlagParser, FlagSpec, Violation};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Name of the built-in help flag
pub const HELP_FLAG: &str = "help";

/// Parsed flags of one node, ready for an [`Invocation`](crate::Invocation)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub flags: Flags,
    pub valid: bool,
    pub violations: Vec<Violation>,
    pub help_requested: bool,
}

/// Runs a [`FlagParser`] on behalf of the dispatcher
#[derive(Clone)]
pub struct FlagAdapter {
    parser: Arc<dyn FlagParser>,
}

impl FlagAdapter {
    pub fn new(parser: impl FlagParser + 'static) -> Self {
        Self {
            parser: Arc::new(parser),
        }
    }

    /// Declaration of the built-in help flag for `command`
    pub fn help_decl(command: &str) -> FlagDecl {
        FlagDecl::boolean()
            .alias("h")
            .default_value(false)
            .description(format!("Display {command} help."))
    }

    /// The flag table the parser actually sees
    ///
    /// An author-declared `help` flag is left alone.
    pub fn effective_spec<'a>(
        spec: &'a FlagSpec,
        command: &str,
        implicit_help: bool,
    ) -> Cow<'a, FlagSpec> {
        if !implicit_help || spec.contains(HELP_FLAG) {
            return Cow::Borrowed(spec);
        }
        let mut spec = spec.clone();
        spec.insert(HELP_FLAG, Self::help_decl(command));
        Cow::Owned(spec)
    }

    /// Parse `tokens` against a node's flags
    pub fn evaluate(
        &self,
        tokens: &[String],
        spec: &FlagSpec,
        command: &str,
        implicit_help: bool,
    ) -> Evaluation {
        let spec = Self::effective_spec(spec, command, implicit_help);
        let outcome = self.parser.parse(tokens, &spec);

        let mut recognized = outcome.data;
        // Taken before stripping, so a positional "help" word cannot hide -h
        let help_requested = spec.contains(HELP_FLAG)
            && recognized
                .remove(HELP_FLAG)
                .is_some_and(|value| value.is_truthy());
        for name in &outcome.unrecognized_flags {
            recognized.remove(name);
        }

        tracing::debug!(
            command = %command,
            recognized = recognized.len(),
            unrecognized = outcome.unrecognized_flags.len(),
            valid = outcome.valid,
            "Flags evaluated"
        );

        Evaluation {
            flags: Flags {
                recognized,
                unrecognized: outcome.unrecognized_flags,
            },
            valid: outcome.valid,
            violations: outcome.violations,
            help_requested,
        }
    }
}

impl Default for FlagAdapter {
    fn default() -> Self {
        Self::new(ArgParser)
    }
}

impl fmt::Debug for FlagAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FlagAdapter(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sen_flags::{FlagValue, ParseOutcome};
    use serde_json::json;

    fn tokens(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    fn account_flags() -> FlagSpec {
        FlagSpec::new()
            .with("name", FlagDecl::string().alias("n"))
            .with("phone", FlagDecl::string().alias("p"))
    }

    #[test]
    fn test_help_flag_is_injected_and_removed() {
        let adapter = FlagAdapter::default();
        let eval = adapter.evaluate(&tokens(&["-h"]), &account_flags(), "create", true);

        assert!(eval.help_requested);
        assert!(!eval.flags.contains(HELP_FLAG));
        assert!(eval.valid);
    }

    #[test]
    fn test_help_not_requested_by_default() {
        let adapter = FlagAdapter::default();
        let eval = adapter.evaluate(&tokens(&["-n", "Bob"]), &account_flags(), "create", true);

        assert!(!eval.help_requested);
        assert_eq!(eval.flags.get("name"), Some(&FlagValue::Single(json!("Bob"))));
        assert!(!eval.flags.contains(HELP_FLAG));
    }

    #[test]
    fn test_without_implicit_help_flag() {
        let adapter = FlagAdapter::default();
        let eval = adapter.evaluate(&tokens(&["--help"]), &account_flags(), "create", false);

        assert!(!eval.help_requested);
        assert_eq!(eval.flags.unrecognized, vec!["help"]);
        assert!(eval.flags.recognized.is_empty());
    }

    #[test]
    fn test_unrecognized_are_stripped_from_recognized() {
        let adapter = FlagAdapter::default();
        let eval = adapter.evaluate(
            &tokens(&["me@domain.com", "--color", "-p", "555"]),
            &account_flags(),
            "create",
            true,
        );

        assert_eq!(eval.flags.unrecognized, vec!["me@domain.com", "color"]);
        assert_eq!(
            eval.flags.recognized.keys().collect::<Vec<_>>(),
            vec!["phone"]
        );
    }

    #[test]
    fn test_declared_help_flag_is_kept() {
        let spec = FlagSpec::new().with("help", FlagDecl::boolean().alias("?"));
        let effective = FlagAdapter::effective_spec(&spec, "create", true);

        assert!(matches!(effective, Cow::Borrowed(_)));
        assert_eq!(effective.get("help").map(|d| d.aliases.clone()), Some(vec!["?".to_string()]));
    }

    #[test]
    fn test_help_decl_description() {
        let decl = FlagAdapter::help_decl("create");
        assert_eq!(decl.description.as_deref(), Some("Display create help."));
        assert!(decl.has_alias("h"));
    }

    #[test]
    fn test_custom_parser() {
        struct Everything;

        impl FlagParser for Everything {
            fn parse(&self, tokens: &[String], _spec: &FlagSpec) -> ParseOutcome {
                ParseOutcome {
                    data: tokens
                        .iter()
                        .map(|t| (t.clone(), FlagValue::Single(json!(true))))
                        .collect(),
                    valid: true,
                    ..Default::default()
                }
            }
        }

        let adapter = FlagAdapter::new(Everything);
        let eval = adapter.evaluate(&tokens(&["help", "x"]), &FlagSpec::new(), "root", true);

        assert!(eval.help_requested);
        assert!(eval.flags.contains("x"));
    }
}
