//! Line-oriented surface over a byte writer (stdout in the binary).
//!
//! The terminal already echoes what the user typed, so the engine's flush of
//! a typed line (prefix followed by the same text) is swallowed instead of
//! being printed a second time. Output written while the prompt sits on the
//! last line goes above it and the prompt is printed again underneath.

use std::io::Write;

use conshell_terminal::TerminalSurface;
use conshell_types::input::TextStyle;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const ERASE_LINE: &str = "\r\x1b[K";

pub struct StdioSurface<W: Write> {
    out: W,
    color: bool,
    prefix: String,
    /// The line the user just typed, as echoed by the terminal.
    typed: Option<String>,
    /// A prefix write held back until we know whether it is part of an echo.
    held: Option<String>,
    /// The prefix is already on screen as unterminated output.
    lifted: bool,
    /// The prompt is the unterminated last line on screen.
    prompt_shown: bool,
    input_visible: bool,
}

impl<W: Write> StdioSurface<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            prefix: String::new(),
            typed: None,
            held: None,
            lifted: false,
            prompt_shown: false,
            input_visible: false,
        }
    }

    /// Record the line the terminal echoed before it is submitted.
    pub fn mark_typed(&mut self, line: &str) {
        self.typed = Some(line.to_string());
        self.prompt_shown = false;
    }

    #[cfg(test)]
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn emit(&mut self, text: &str, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        let result = match style {
            TextStyle::Error if self.color => write!(self.out, "\x1b[31m{text}\x1b[0m"),
            _ => self.out.write_all(text.as_bytes()),
        };
        if let Err(e) = result.and_then(|()| self.out.flush()) {
            log::warn!("Console write failed: {e}");
        }
    }

    fn release_held(&mut self) {
        if let Some(held) = self.held.take() {
            self.emit(&held, &TextStyle::Plain);
        }
    }

    /// Move off the prompt line so output does not land after it. Without
    /// ANSI support the prompt stays and the output starts on a new line.
    fn leave_prompt(&mut self) {
        if !self.prompt_shown {
            return;
        }
        self.prompt_shown = false;
        let erase = if self.color { ERASE_LINE } else { "\n" };
        self.emit(erase, &TextStyle::Plain);
    }

    fn show_prompt(&mut self) {
        let prefix = self.prefix.clone();
        self.emit(&prefix, &TextStyle::Plain);
        self.prompt_shown = true;
    }
}

impl<W: Write> TerminalSurface for StdioSurface<W> {
    fn write_output(&mut self, text: &str, style: &TextStyle) {
        if self.typed.is_some() && self.held.is_none() && text == self.prefix {
            self.held = Some(text.to_string());
            return;
        }
        self.leave_prompt();
        self.release_held();
        self.emit(text, style);
    }

    fn write_line(&mut self, text: &str, style: &TextStyle) {
        if self.held.is_some() && self.typed.as_deref() == Some(text) {
            self.held = None;
            self.typed = None;
            return;
        }
        let reprompt = self.prompt_shown && self.input_visible;
        self.leave_prompt();
        self.release_held();
        self.emit(text, style);
        self.emit("\n", &TextStyle::Plain);
        if reprompt {
            self.show_prompt();
        }
    }

    fn clear_output(&mut self) {
        self.emit(CLEAR_SCREEN, &TextStyle::Plain);
        self.prompt_shown = false;
    }

    fn set_input_visible(&mut self, visible: bool) {
        self.input_visible = visible;
        if !visible {
            return;
        }
        if self.lifted {
            self.lifted = false;
            self.prompt_shown = true;
        } else if !self.prompt_shown {
            self.show_prompt();
        }
    }

    fn set_prefix_text(&mut self, text: &str) {
        self.prefix = text.to_string();
    }

    fn set_input_text(&mut self, text: &str) {
        if text.is_empty() {
            self.typed = None;
            self.held = None;
        }
    }

    fn take_partial_line(&mut self) {
        self.lifted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conshell_terminal::{Completion, Console, DefinitionSpec, Handler, ReadFlow};
    use conshell_types::config::ConsoleConfig;
    use conshell_types::input::SurfaceEvent;

    fn console() -> Console<StdioSurface<Vec<u8>>> {
        Console::new(StdioSurface::new(Vec::new(), false), ConsoleConfig::default())
    }

    fn type_line(console: &mut Console<StdioSurface<Vec<u8>>>, line: &str) {
        console.surface_mut().mark_typed(line);
        console.handle_event(SurfaceEvent::LineSubmit(line.to_string()));
    }

    fn printed(console: &Console<StdioSurface<Vec<u8>>>) -> String {
        String::from_utf8_lossy(console.surface().get_ref()).into_owned()
    }

    #[test]
    fn typed_command_is_not_echoed_twice() {
        let mut c = console();
        type_line(&mut c, "ECHO hi");
        assert_eq!(printed(&c), ">hi\n>");
    }

    #[test]
    fn inline_prompt_is_not_reprinted() {
        let mut c = console();
        c.define(DefinitionSpec::new(
            "ASK",
            Handler::custom(|s| {
                s.write("Name: ");
                s.read_line(|line, s| {
                    s.write_line(&format!("Hello, {line}"));
                    Ok(ReadFlow::Done)
                })?;
                Ok(Completion::Done)
            }),
        ))
        .unwrap();
        type_line(&mut c, "ASK");
        assert_eq!(printed(&c), ">Name: ");
        type_line(&mut c, "bob");
        assert_eq!(printed(&c), ">Name: Hello, bob\n>");
    }

    #[test]
    fn host_writes_go_above_the_prompt() {
        let mut c = console();
        c.write_line("banner", &TextStyle::Plain);
        assert_eq!(printed(&c), ">\nbanner\n>");
    }

    #[test]
    fn host_writes_erase_the_prompt_on_a_terminal() {
        let mut c = Console::new(StdioSurface::new(Vec::new(), true), ConsoleConfig::default());
        c.write_line("banner", &TextStyle::Plain);
        c.write_line("more", &TextStyle::Plain);
        assert_eq!(
            printed(&c),
            format!(">{ERASE_LINE}banner\n>{ERASE_LINE}more\n>")
        );
    }

    #[test]
    fn banner_then_command_reads_cleanly() {
        let mut c = console();
        c.write_line("banner", &TextStyle::Plain);
        type_line(&mut c, "ECHO hi");
        assert_eq!(printed(&c), ">\nbanner\n>hi\n>");
    }

    #[test]
    fn error_lines_are_colored_when_enabled() {
        let mut s = StdioSurface::new(Vec::new(), true);
        s.write_line("bad", &TextStyle::Error);
        assert_eq!(
            String::from_utf8_lossy(s.get_ref()),
            "\x1b[31mbad\x1b[0m\n"
        );
    }

    #[test]
    fn clear_emits_escape_sequence() {
        let mut s = StdioSurface::new(Vec::new(), false);
        s.clear_output();
        assert_eq!(String::from_utf8_lossy(s.get_ref()), CLEAR_SCREEN);
    }
}
