//! Rendering-agnostic surface events and output styles.
//!
//! Every front end maps its native input to these enums. The console engine
//! never sees raw key codes.

use serde::{Deserialize, Serialize};

/// A notification reported by the terminal surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The user submitted the input line (Enter).
    LineSubmit(String),
    /// A single printable character was typed.
    Char(char),
    /// History navigation key. `forward` moves toward newer entries.
    HistoryCycle { forward: bool },
    /// Autocomplete key, with the current input text and cursor position
    /// (in characters).
    AutocompleteCycle {
        forward: bool,
        input: String,
        cursor: usize,
    },
    /// A block of text was pasted into the input.
    Paste(String),
    /// Any other key. Moves the user off the autocomplete target.
    Edit,
}

/// Keys the overlay wrapper cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Other,
}

/// Style hint attached to a piece of output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextStyle {
    #[default]
    Plain,
    /// Failure output (handler errors, unknown commands).
    Error,
    /// Front-end specific style class.
    Class(String),
}

impl TextStyle {
    /// The style class name a front end should apply, if any.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Plain => None,
            Self::Error => Some("error"),
            Self::Class(name) => Some(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autocomplete_event_carries_input() {
        let e = SurfaceEvent::AutocompleteCycle {
            forward: true,
            input: "ec".into(),
            cursor: 2,
        };
        if let SurfaceEvent::AutocompleteCycle { input, cursor, .. } = e {
            assert_eq!(input, "ec");
            assert_eq!(cursor, 2);
        } else {
            panic!("wrong variant");
        }
    }

    #[test]
    fn history_event_equality() {
        assert_eq!(
            SurfaceEvent::HistoryCycle { forward: false },
            SurfaceEvent::HistoryCycle { forward: false }
        );
        assert_ne!(
            SurfaceEvent::HistoryCycle { forward: false },
            SurfaceEvent::HistoryCycle { forward: true }
        );
    }

    #[test]
    fn style_class_names() {
        assert_eq!(TextStyle::Plain.class_name(), None);
        assert_eq!(TextStyle::Error.class_name(), Some("error"));
        assert_eq!(TextStyle::Class("muted".into()).class_name(), Some("muted"));
    }

    #[test]
    fn style_default_is_plain() {
        assert_eq!(TextStyle::default(), TextStyle::Plain);
    }

    #[test]
    fn style_serde_roundtrip() {
        let json = serde_json::to_string(&TextStyle::Error).unwrap();
        let back: TextStyle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TextStyle::Error);
    }
}
