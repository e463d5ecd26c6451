//! Built-in command handlers (`HELP`, `ECHO`, `CLS`).

use conshell_types::error::{ConsoleError, Result};
use conshell_types::input::TextStyle;

use crate::session::{Completion, Session};

pub(crate) fn help(session: &mut Session<'_>) -> Result<Completion> {
    if let Some(name) = session.argv().first().cloned() {
        let found = session.resolve(&name).unwrap_or_default();
        return match found.as_slice() {
            [definition] => {
                session.write_line(definition.name());
                if !definition.description().is_empty() {
                    session.write_line(&format!("  {}", definition.description()));
                }
                if let Some(usage) = definition.usage() {
                    session.write_line(&format!("  Usage: {usage}"));
                }
                Ok(Completion::Done)
            },
            _ => {
                let err = ConsoleError::CommandNotFound(name);
                session.write_line_styled(&err.to_string(), &TextStyle::Error);
                Ok(Completion::Done)
            },
        };
    }

    session.write_line("The following commands are available:");
    session.write_line("");
    let rows: Vec<Vec<String>> = session
        .available_definitions()
        .iter()
        .map(|d| vec![d.name().to_string(), d.description().to_string()])
        .collect();
    session.write_table(&["name:10", "description:40"], &rows, false);
    session.write_line("");
    Ok(Completion::Done)
}

pub(crate) fn echo(session: &mut Session<'_>) -> Result<Completion> {
    let toggle = session.args().to_uppercase();
    match toggle.as_str() {
        "ON" => session.set_echo(true),
        "OFF" => session.set_echo(false),
        _ => {
            let text = session.args().to_string();
            session.write_line(&text);
        },
    }
    Ok(Completion::Done)
}

pub(crate) fn clear(session: &mut Session<'_>) -> Result<Completion> {
    session.clear();
    Ok(Completion::Done)
}
