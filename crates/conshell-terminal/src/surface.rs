//! Terminal surface contract and an in-memory implementation.
//!
//! The engine only ever pushes effects through [`TerminalSurface`]; it never
//! reads rendering state back. Front ends (a DOM overlay, a TUI, stdio)
//! implement the trait, and [`MemorySurface`] records everything for tests
//! and headless embedding.

use conshell_types::input::TextStyle;

/// Outbound effects the console engine drives.
pub trait TerminalSurface {
    /// Append text to the current output line.
    fn write_output(&mut self, text: &str, style: &TextStyle);

    /// Append text and terminate the current output line.
    fn write_line(&mut self, text: &str, style: &TextStyle);

    /// Remove all output.
    fn clear_output(&mut self);

    /// Show or hide the input region.
    fn set_input_visible(&mut self, visible: bool);

    /// Replace the text shown in front of the input.
    fn set_prefix_text(&mut self, text: &str);

    /// Replace the contents of the input.
    fn set_input_text(&mut self, text: &str);

    /// Drop the unterminated output line; the engine is about to show it as
    /// the input prefix instead.
    fn take_partial_line(&mut self) {}

    fn focus_input(&mut self) {}

    fn blur_input(&mut self) {}

    /// Show or hide the whole console (overlay front ends).
    fn set_visible(&mut self, _visible: bool) {}
}

/// A surface that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemorySurface {
    lines: Vec<(String, TextStyle)>,
    partial: String,
    partial_style: TextStyle,
    prefix: String,
    input: String,
    input_visible: bool,
    visible: bool,
    focused: bool,
    clear_count: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed output lines, without styles.
    pub fn lines(&self) -> Vec<&str> {
        self.lines.iter().map(|(l, _)| l.as_str()).collect()
    }

    /// Completed output lines that were written with [`TextStyle::Error`].
    pub fn error_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(_, s)| *s == TextStyle::Error)
            .map(|(l, _)| l.as_str())
            .collect()
    }

    /// Text written since the last line break.
    pub fn partial_line(&self) -> &str {
        &self.partial
    }

    /// All output as one string, lines joined with `\n`.
    pub fn transcript(&self) -> String {
        let mut out = self.lines().join("\n");
        if !self.partial.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&self.partial);
        }
        out
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_input_visible(&self) -> bool {
        self.input_visible
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Number of times the output was cleared.
    pub fn clear_count(&self) -> usize {
        self.clear_count
    }

    fn push_text(&mut self, text: &str, style: &TextStyle) {
        let mut segments = text.split('\n').peekable();
        while let Some(segment) = segments.next() {
            self.partial.push_str(segment);
            self.partial_style = style.clone();
            if segments.peek().is_some() {
                let line = std::mem::take(&mut self.partial);
                self.lines.push((line, style.clone()));
            }
        }
    }
}

impl TerminalSurface for MemorySurface {
    fn write_output(&mut self, text: &str, style: &TextStyle) {
        self.push_text(text, style);
    }

    fn write_line(&mut self, text: &str, style: &TextStyle) {
        self.push_text(text, style);
        let line = std::mem::take(&mut self.partial);
        self.lines.push((line, style.clone()));
    }

    fn clear_output(&mut self) {
        self.lines.clear();
        self.partial.clear();
        self.clear_count += 1;
    }

    fn set_input_visible(&mut self, visible: bool) {
        self.input_visible = visible;
    }

    fn set_prefix_text(&mut self, text: &str) {
        self.prefix = text.to_string();
    }

    fn set_input_text(&mut self, text: &str) {
        self.input = text.to_string();
    }

    fn take_partial_line(&mut self) {
        self.partial.clear();
        self.partial_style = TextStyle::Plain;
    }

    fn focus_input(&mut self) {
        self.focused = true;
    }

    fn blur_input(&mut self) {
        self.focused = false;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
