//! Input line scanning
//!
//! Three small scanners work on one line of input:
//!
//! - [`split_subcommand`] peels off a leading subcommand token
//! - [`strip_equal_signs`] turns `--name=value` into `--name value`
//! - [`tokenize`] splits a line into flag tokens, honoring quotes,
//!   `/regex/` literals and backslash-escaped whitespace
//!
//! Quoted spans (`"..."`, `'...'`) and regex literals (`/.../flags`
//! followed by whitespace or the end of the line) are atomic everywhere.
//! An unterminated quote or slash is an ordinary character.

/// A subcommand candidate and the text after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubcommandSplit<'a> {
    pub token: &'a str,
    pub remainder: &'a str,
}

/// Split `line` into its first word and the rest
///
/// Returns `None` when there is no candidate: the line is blank, or its
/// first word starts with `-` (a flag) or a quote.
///
/// ```
/// use sen_command::tokenizer::split_subcommand;
///
/// let split = split_subcommand("  create me@domain.com  pwd").unwrap();
/// assert_eq!(split.token, "create");
/// assert_eq!(split.remainder, "me@domain.com  pwd");
///
/// assert!(split_subcommand("--help").is_none());
/// ```
pub fn split_subcommand(line: &str) -> Option<SubcommandSplit<'_>> {
    let line = line.trim_start();
    let end = line.find(char::is_whitespace).unwrap_or(line.len());
    let token = &line[..end];

    match token.chars().next() {
        None | Some('-' | '"' | '\'') => None,
        Some(_) => Some(SubcommandSplit {
            token,
            remainder: line[end..].trim_start(),
        }),
    }
}

/// Replace each run of `=` outside quoted spans and regex literals with a
/// single space
///
/// A backslash protects the character after it, so `a\=b` keeps its
/// escaped equal sign.
pub fn strip_equal_signs(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let atomic = match c {
            '"' | '\'' => quoted_span(&chars, i),
            '/' => regex_span(&chars, i),
            _ => None,
        };
        if let Some(len) = atomic {
            out.extend(&chars[i..i + len]);
            i += len;
            continue;
        }

        match c {
            '\\' => {
                out.push('\\');
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                }
                i += 2;
            }
            '=' => {
                while chars.get(i) == Some(&'=') {
                    i += 1;
                }
                out.push(' ');
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Split `line` into flag tokens
///
/// Equal signs are stripped first. A token runs until unescaped whitespace
/// and may be built from several pieces; enclosing quotes are removed from
/// quoted pieces, everything else is kept verbatim.
///
/// Quoting does not mark a token as a value: `-n "--weird"` yields the
/// tokens `-n` and `--weird`, and the flag parser sees two flags.
///
/// ```
/// use sen_command::tokenizer::tokenize;
///
/// assert_eq!(
///     tokenize(r#"-name="John Doe" --pattern /a b/i path\ with\ spaces"#),
///     vec!["-name", "John Doe", "--pattern", "/a b/i", r"path\ with\ spaces"]
/// );
/// ```
pub fn tokenize(line: &str) -> Vec<String> {
    let source = format!("{} ", strip_equal_signs(line).trim());
    let chars: Vec<char> = source.chars().collect();

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            if in_token {
                tokens.push(std::mem::take(&mut current));
                in_token = false;
            }
            i += 1;
            continue;
        }
        in_token = true;

        match c {
            '"' | '\'' => {
                if let Some(len) = quoted_span(&chars, i) {
                    current.extend(&chars[i + 1..i + len - 1]);
                    i += len;
                    continue;
                }
            }
            '/' => {
                if let Some(len) = regex_span(&chars, i) {
                    current.extend(&chars[i..i + len]);
                    i += len;
                    continue;
                }
            }
            '\\' => {
                if let Some(&next) = chars.get(i + 1).filter(|n| n.is_whitespace()) {
                    current.push('\\');
                    current.push(next);
                    i += 2;
                    continue;
                }
            }
            _ => {}
        }

        current.push(c);
        i += 1;
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Length of the closed quoted span opening at `start`
fn quoted_span(chars: &[char], start: usize) -> Option<usize> {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return Some(i + 1 - start),
            _ => i += 1,
        }
    }
    None
}

/// Length of the regex literal opening at `start`, including trailing flags
fn regex_span(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    loop {
        match chars.get(i)? {
            '\\' => i += 2,
            '/' => break,
            _ => i += 1,
        }
    }
    i += 1;
    while matches!(chars.get(i), Some('g' | 'i' | 'm' | 'y')) {
        i += 1;
    }
    match chars.get(i) {
        None => Some(i - start),
        Some(c) if c.is_whitespace() => Some(i - start),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_subcommand() {
        let split = split_subcommand("create").unwrap();
        assert_eq!(split.token, "create");
        assert_eq!(split.remainder, "");

        let split = split_subcommand("account create -n Bob").unwrap();
        assert_eq!(split.token, "account");
        assert_eq!(split.remainder, "create -n Bob");
    }

    #[test]
    fn test_split_subcommand_without_candidate() {
        assert!(split_subcommand("").is_none());
        assert!(split_subcommand("   ").is_none());
        assert!(split_subcommand("-n Bob").is_none());
        assert!(split_subcommand("\"quoted\" rest").is_none());
        assert!(split_subcommand("'quoted' rest").is_none());
    }

    #[test]
    fn test_strip_equal_signs() {
        assert_eq!(strip_equal_signs("--name=Bob"), "--name Bob");
        assert_eq!(strip_equal_signs("--name==Bob"), "--name Bob");
        assert_eq!(strip_equal_signs("-x=\"a=b\""), "-x \"a=b\"");
        assert_eq!(strip_equal_signs("-x='a=b'"), "-x 'a=b'");
        assert_eq!(strip_equal_signs("-r=/a=b/g -y"), "-r /a=b/g -y");
        assert_eq!(strip_equal_signs(r"-x=a\=b"), r"-x a\=b");
    }

    #[test]
    fn test_escaped_equal_sign_is_kept() {
        assert_eq!(strip_equal_signs(r"a\=b"), r"a\=b");
        assert_eq!(strip_equal_signs(r"--expr a\==b"), r"--expr a\= b");
        assert_eq!(tokenize(r"--expr=a\=b"), vec!["--expr", r"a\=b"]);
    }

    #[test]
    fn test_strip_equal_signs_unterminated_quote() {
        assert_eq!(strip_equal_signs("-x=\"a=b"), "-x \"a b");
    }

    #[test]
    fn test_tokenize_plain() {
        assert_eq!(tokenize("  a   b c "), vec!["a", "b", "c"]);
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_tokenize_positional_arguments() {
        assert_eq!(
            tokenize(r#"create me@domain.com "John Doe""#),
            vec!["create", "me@domain.com", "John Doe"]
        );
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize(r#"-n "John Doe" -p '555 1234'"#),
            vec!["-n", "John Doe", "-p", "555 1234"]
        );
        assert_eq!(tokenize(r#"""#), vec!["\""]);
        assert_eq!(tokenize(r#"-n "a \" b""#), vec!["-n", r#"a \" b"#]);
        assert_eq!(tokenize(r#"pre"mid dle"post"#), vec!["premid dlepost"]);
        assert_eq!(tokenize(r#"-x """#), vec!["-x", ""]);
    }

    #[test]
    fn test_tokenize_quoted_flag_lookalike() {
        assert_eq!(tokenize(r#"-n "--weird""#), vec!["-n", "--weird"]);
    }

    #[test]
    fn test_tokenize_regex_literal() {
        assert_eq!(tokenize("-r /a b/gi x"), vec!["-r", "/a b/gi", "x"]);
        // Not followed by whitespace, so not a literal
        assert_eq!(tokenize("/a b/c"), vec!["/a", "b/c"]);
        assert_eq!(tokenize("path/to/file"), vec!["path/to/file"]);
    }

    #[test]
    fn test_tokenize_escaped_whitespace() {
        assert_eq!(tokenize(r"my\ file.txt -v"), vec![r"my\ file.txt", "-v"]);
    }

    #[test]
    fn test_tokenize_strips_equals() {
        assert_eq!(tokenize("--name=Bob --phone=555"), vec!["--name", "Bob", "--phone", "555"]);
        assert_eq!(tokenize(r#"--name="Bob = Jr""#), vec!["--name", "Bob = Jr"]);
    }
}
