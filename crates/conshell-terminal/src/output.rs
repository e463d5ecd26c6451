//! Output and input-region bookkeeping shared by the engine and sessions.
//!
//! The engine mirrors what it has pushed to the surface (prefix, input text,
//! the unterminated output line) so it can flush the input into the output
//! without reading anything back.

use conshell_types::input::TextStyle;

use crate::surface::TerminalSurface;

/// Display state owned by the console.
#[derive(Debug, Clone)]
pub(crate) struct DisplayState {
    pub(crate) echo: bool,
    pub(crate) prompt_prefix: String,
    partial_line: String,
    prefix_text: String,
    input_text: String,
    input_inline: bool,
}

impl DisplayState {
    pub(crate) fn new(echo: bool, prompt_prefix: &str) -> Self {
        Self {
            echo,
            prompt_prefix: prompt_prefix.to_string(),
            partial_line: String::new(),
            prefix_text: String::new(),
            input_text: String::new(),
            input_inline: false,
        }
    }
}

/// Width of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnWidth {
    /// Pad to this many characters. Negative widths right-align.
    Fixed(i32),
    /// Write the cell as-is.
    Fill,
}

/// A column in [`Output::write_table`], parsed from `name[:width[:header]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub name: String,
    pub width: ColumnWidth,
    pub header: String,
}

impl TableColumn {
    /// Parse a column spec such as `"name:10"`, `"description:*"` or
    /// `"name:12:Command"`. A missing or invalid width defaults to 10.
    pub fn parse(spec: &str) -> Self {
        let mut parts = spec.splitn(3, ':');
        let name = parts.next().unwrap_or_default().to_string();
        let width = match parts.next() {
            Some("*") => ColumnWidth::Fill,
            Some(w) => ColumnWidth::Fixed(w.trim().parse().unwrap_or(10)),
            None => ColumnWidth::Fixed(10),
        };
        let header = parts.next().map(str::to_string).unwrap_or_else(|| name.clone());
        Self {
            name,
            width,
            header,
        }
    }
}

/// Pad `value` with `padding` to `width` characters. Positive widths pad on
/// the right, negative widths on the left. Longer values are left untouched.
pub fn pad(value: &str, padding: char, width: i32) -> String {
    let target = width.unsigned_abs() as usize;
    let len = value.chars().count();
    if len >= target {
        return value.to_string();
    }
    let fill: String = std::iter::repeat_n(padding, target - len).collect();
    if width >= 0 {
        format!("{value}{fill}")
    } else {
        format!("{fill}{value}")
    }
}

/// A borrowed view over the surface plus the display mirror.
pub(crate) struct Output<'a> {
    surface: &'a mut dyn TerminalSurface,
    display: &'a mut DisplayState,
}

impl<'a> Output<'a> {
    pub(crate) fn new(surface: &'a mut dyn TerminalSurface, display: &'a mut DisplayState) -> Self {
        Self { surface, display }
    }

    pub(crate) fn display(&self) -> &DisplayState {
        self.display
    }

    pub(crate) fn display_mut(&mut self) -> &mut DisplayState {
        self.display
    }

    pub(crate) fn surface_mut(&mut self) -> &mut dyn TerminalSurface {
        &mut *self.surface
    }

    pub(crate) fn write(&mut self, value: &str, style: &TextStyle) {
        self.surface.write_output(value, style);
        match value.rfind('\n') {
            Some(i) => self.display.partial_line = value[i + 1..].to_string(),
            None => self.display.partial_line.push_str(value),
        }
    }

    pub(crate) fn write_line(&mut self, value: &str, style: &TextStyle) {
        self.surface.write_line(value, style);
        self.display.partial_line.clear();
    }

    pub(crate) fn write_pad(&mut self, value: &str, padding: char, width: i32, style: &TextStyle) {
        self.write(&pad(value, padding, width), style);
    }

    /// Write rows as aligned columns. Cells map to columns by position.
    pub(crate) fn write_table(
        &mut self,
        columns: &[TableColumn],
        rows: &[Vec<String>],
        show_headers: bool,
        style: &TextStyle,
    ) {
        if show_headers {
            for column in columns {
                self.write_cell(&column.header, column.width, style);
            }
            self.write_line("", style);
            for column in columns {
                let rule = "-".repeat(column.header.chars().count());
                self.write_cell(&rule, column.width, style);
            }
            self.write_line("", style);
        }
        for row in rows {
            for (i, column) in columns.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or_default();
                self.write_cell(cell, column.width, style);
            }
            self.write_line("", style);
        }
    }

    fn write_cell(&mut self, value: &str, width: ColumnWidth, style: &TextStyle) {
        match width {
            ColumnWidth::Fill => self.write(value, style),
            ColumnWidth::Fixed(w) => self.write_pad(value, ' ', w, style),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.surface.clear_output();
        self.display.partial_line.clear();
    }

    pub(crate) fn set_input(&mut self, text: &str) {
        self.display.input_text = text.to_string();
        self.surface.set_input_text(text);
    }

    fn set_prefix(&mut self, text: &str) {
        self.display.prefix_text = text.to_string();
        self.surface.set_prefix_text(text);
    }

    pub(crate) fn set_prompt_prefix(&mut self, prefix: &str) {
        self.display.prompt_prefix = prefix.to_string();
        if !self.display.input_inline {
            self.set_prefix(prefix);
        }
    }

    /// Show the input. Inline input (a pending read) lifts the unterminated
    /// output line into the prefix; otherwise the prompt prefix is shown.
    pub(crate) fn activate_input(&mut self, inline: bool) {
        if inline {
            if !self.display.partial_line.is_empty() {
                let lifted = std::mem::take(&mut self.display.partial_line);
                self.surface.take_partial_line();
                self.set_prefix(&lifted);
            }
            self.display.input_inline = true;
        } else {
            let prefix = self.display.prompt_prefix.clone();
            self.set_prefix(&prefix);
            self.display.input_inline = false;
        }
        self.surface.set_input_visible(true);
        self.surface.focus_input();
    }

    pub(crate) fn deactivate_input(&mut self) {
        self.surface.set_input_visible(false);
    }

    /// Move prefix and input text into the output (unless `prevent_write`)
    /// and empty both.
    pub(crate) fn flush_input(&mut self, prevent_write: bool) {
        if !prevent_write {
            let prefix = self.display.prefix_text.clone();
            let input = self.display.input_text.clone();
            self.write(&prefix, &TextStyle::Plain);
            self.write_line(&input, &TextStyle::Plain);
        }
        self.set_prefix("");
        self.set_input("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    #[test]
    fn pad_right_and_left() {
        assert_eq!(pad("ab", ' ', 5), "ab   ");
        assert_eq!(pad("ab", '.', -5), "...ab");
        assert_eq!(pad("abcdef", ' ', 3), "abcdef");
        assert_eq!(pad("", '-', 2), "--");
    }

    #[test]
    fn column_spec_parsing() {
        let c = TableColumn::parse("name:10");
        assert_eq!(c.name, "name");
        assert_eq!(c.width, ColumnWidth::Fixed(10));
        assert_eq!(c.header, "name");

        let c = TableColumn::parse("description:*:About");
        assert_eq!(c.width, ColumnWidth::Fill);
        assert_eq!(c.header, "About");

        let c = TableColumn::parse("x");
        assert_eq!(c.width, ColumnWidth::Fixed(10));

        let c = TableColumn::parse("x:abc");
        assert_eq!(c.width, ColumnWidth::Fixed(10));
    }

    #[test]
    fn write_tracks_partial_line() {
        let mut surface = MemorySurface::new();
        let mut display = DisplayState::new(true, ">");
        let mut out = Output::new(&mut surface, &mut display);
        out.write("abc\nde", &TextStyle::Plain);
        out.write("f", &TextStyle::Plain);
        assert_eq!(out.display().partial_line, "def");
        out.write_line("", &TextStyle::Plain);
        assert_eq!(out.display().partial_line, "");
    }

    #[test]
    fn table_with_headers() {
        let mut surface = MemorySurface::new();
        let mut display = DisplayState::new(true, ">");
        {
            let mut out = Output::new(&mut surface, &mut display);
            let cols = [TableColumn::parse("name:6"), TableColumn::parse("desc:*")];
            let rows = vec![vec!["CLS".to_string(), "Clears".to_string()]];
            out.write_table(&cols, &rows, true, &TextStyle::Plain);
        }
        assert_eq!(surface.lines(), vec!["name  desc", "----  ----", "CLS   Clears"]);
    }

    #[test]
    fn inline_activation_lifts_partial_line() {
        let mut surface = MemorySurface::new();
        let mut display = DisplayState::new(true, ">");
        {
            let mut out = Output::new(&mut surface, &mut display);
            out.write("Name: ", &TextStyle::Plain);
            out.activate_input(true);
        }
        assert_eq!(surface.prefix(), "Name: ");
        assert_eq!(surface.partial_line(), "");
        assert!(surface.is_input_visible());
    }

    #[test]
    fn flush_writes_prefix_and_input() {
        let mut surface = MemorySurface::new();
        let mut display = DisplayState::new(true, ">");
        {
            let mut out = Output::new(&mut surface, &mut display);
            out.activate_input(false);
            out.set_input("help");
            out.flush_input(false);
        }
        assert_eq!(surface.lines(), vec![">help"]);
        assert_eq!(surface.prefix(), "");
        assert_eq!(surface.input(), "");
    }

    #[test]
    fn prompt_prefix_not_shown_while_inline() {
        let mut surface = MemorySurface::new();
        let mut display = DisplayState::new(true, ">");
        {
            let mut out = Output::new(&mut surface, &mut display);
            out.write("Password: ", &TextStyle::Plain);
            out.activate_input(true);
            out.set_prompt_prefix("$");
        }
        assert_eq!(surface.prefix(), "Password: ");
        assert_eq!(display.prompt_prefix, "$");
    }
}
