//! Command-line parsing and dispatch to definitions.

use conshell_types::error::{ConsoleError, Result};
use conshell_types::input::TextStyle;

use crate::session::{Completion, Session};

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// First word, as typed.
    pub name: String,
    /// Everything after the first whitespace run, untouched.
    pub arg_string: String,
    /// Arguments split on whitespace with quote handling.
    pub args: Vec<String>,
}

/// Split a command line into name and arguments.
pub fn parse_command(command: &str) -> ParsedCommand {
    let trimmed = command.trim();
    let (name, rest) = match trimmed.find(char::is_whitespace) {
        Some(i) => (&trimmed[..i], trimmed[i..].trim_start()),
        None => (trimmed, ""),
    };
    let args = tokenize(rest).unwrap_or_else(|e| {
        log::debug!("{e}; falling back to whitespace split");
        rest.split_whitespace().map(str::to_string).collect()
    });
    ParsedCommand {
        name: name.to_string(),
        arg_string: rest.to_string(),
        args,
    }
}

/// Tokenize an argument string with single/double quote and backslash
/// handling.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;
    let mut quoted = false;

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            match ch {
                '"' => in_double = false,
                '\\' if matches!(chars.peek(), Some('"' | '\\')) => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                },
                _ => current.push(ch),
            }
        } else {
            match ch {
                '\'' => {
                    in_single = true;
                    quoted = true;
                },
                '"' => {
                    in_double = true;
                    quoted = true;
                },
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                },
                c if c.is_whitespace() => {
                    if !current.is_empty() || quoted {
                        tokens.push(std::mem::take(&mut current));
                        quoted = false;
                    }
                },
                _ => current.push(ch),
            }
        }
    }

    if in_single {
        return Err(ConsoleError::InvalidSubmission(
            "unterminated single quote".to_string(),
        ));
    }
    if in_double {
        return Err(ConsoleError::InvalidSubmission(
            "unterminated double quote".to_string(),
        ));
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Turns a raw command line into a handler invocation.
pub trait CommandHandler {
    /// Execute `command` within `session`. The returned completion decides
    /// when the command is finished; soft failures are written to the
    /// session and reported as [`Completion::Done`].
    fn execute(&self, session: &mut Session<'_>, command: &str) -> Result<Completion>;
}

/// Resolves the first word through the definition provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCommandHandler;

impl DefaultCommandHandler {
    pub fn new() -> Self {
        Self
    }
}

impl CommandHandler for DefaultCommandHandler {
    fn execute(&self, session: &mut Session<'_>, command: &str) -> Result<Completion> {
        let parsed = parse_command(command);
        session
            .context_mut()
            .set_parsed(&parsed.name, &parsed.arg_string, parsed.args);

        let matches = session.resolve(&parsed.name).unwrap_or_default();
        match matches.as_slice() {
            [] => {
                let err = ConsoleError::CommandNotFound(parsed.name);
                log::debug!("{err}");
                session.write_line_styled(&err.to_string(), &TextStyle::Error);
                Ok(Completion::Done)
            },
            [definition] => {
                log::debug!("Dispatching {}", definition.name());
                definition.handler().invoke(session)
            },
            candidates => {
                let err = ConsoleError::AmbiguousCommand {
                    name: parsed.name,
                    matches: candidates.iter().map(|d| d.name().to_string()).collect(),
                };
                log::debug!("{err}");
                session.write_line_styled("Ambiguous command", &TextStyle::Error);
                session.write_line("");
                for definition in candidates {
                    session.write_pad(definition.name(), ' ', 10);
                    session.write_line(definition.description());
                }
                session.write_line("");
                Ok(Completion::Done)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_first_whitespace_run() {
        let p = parse_command("echo   hello   world");
        assert_eq!(p.name, "echo");
        assert_eq!(p.arg_string, "hello   world");
        assert_eq!(p.args, vec!["hello", "world"]);
    }

    #[test]
    fn parse_name_only() {
        let p = parse_command("  cls  ");
        assert_eq!(p.name, "cls");
        assert_eq!(p.arg_string, "");
        assert!(p.args.is_empty());
    }

    #[test]
    fn parse_tab_separator() {
        let p = parse_command("echo\thi");
        assert_eq!(p.name, "echo");
        assert_eq!(p.arg_string, "hi");
    }

    #[test]
    fn parse_unterminated_quote_falls_back() {
        let p = parse_command("say \"oops here");
        assert_eq!(p.arg_string, "\"oops here");
        assert_eq!(p.args, vec!["\"oops", "here"]);
    }

    #[test]
    fn tokenize_simple() {
        assert_eq!(tokenize("hello world").unwrap(), vec!["hello", "world"]);
    }

    #[test]
    fn tokenize_single_quotes() {
        assert_eq!(
            tokenize("say 'hello world'").unwrap(),
            vec!["say", "hello world"]
        );
    }

    #[test]
    fn tokenize_double_quotes_with_escape() {
        assert_eq!(
            tokenize(r#""a \"b\" c" d"#).unwrap(),
            vec![r#"a "b" c"#, "d"]
        );
    }

    #[test]
    fn tokenize_keeps_empty_quoted_argument() {
        assert_eq!(tokenize(r#"a "" b"#).unwrap(), vec!["a", "", "b"]);
    }

    #[test]
    fn tokenize_backslash_escapes_space() {
        assert_eq!(tokenize(r"a\ b c").unwrap(), vec!["a b", "c"]);
    }

    #[test]
    fn tokenize_unterminated_errors() {
        assert!(tokenize("'abc").is_err());
        assert!(tokenize("\"abc").is_err());
    }

    #[test]
    fn tokenize_empty() {
        assert!(tokenize("   ").unwrap().is_empty());
    }
}
