//! sen-flags: flag declarations and parsing for sen-command
//!
//! This crate defines the contract between the dispatcher and whatever
//! validates flags: a [`FlagSpec`] describes what a command accepts, a
//! [`FlagParser`] turns tokens into a [`ParseOutcome`].
//!
//! ```
//! use sen_flags::{ArgParser, FlagDecl, FlagParser, FlagSpec};
//!
//! let spec = FlagSpec::new()
//!     .with("name", FlagDecl::string().alias("n").description("Display name"))
//!     .with("admin", FlagDecl::boolean().default_value(false));
//!
//! let tokens: Vec<String> = ["-n", "John Doe"].iter().map(|s| s.to_string()).collect();
//! let outcome = ArgParser.parse(&tokens, &spec);
//!
//! assert!(outcome.valid);
//! assert_eq!(outcome.data["name"].as_str(), Some("John Doe"));
//! assert_eq!(outcome.data["admin"].as_bool(), Some(false));
//! ```

pub mod decl;
pub mod parser;

pub use decl::{FlagDecl, FlagSpec, FlagType};
pub use parser::{ArgParser, FlagParser, FlagValue, ParseOutcome, Violation};
