//! A console that lives in a hideable overlay.
//!
//! The wrapper owns its [`Console`]; there is no shared surface between
//! instances. Key routing is up to the host: forward global key presses to
//! [`OverlayConsole::handle_key`] and surface events to
//! [`OverlayConsole::handle_event`].

use std::cell::Cell;
use std::rc::Rc;

use conshell_types::config::ConsoleConfig;
use conshell_types::error::Result;
use conshell_types::input::{Key, SurfaceEvent};

use crate::console::Console;
use crate::definition::{DefinitionSpec, Handler};
use crate::session::Completion;
use crate::surface::TerminalSurface;

pub struct OverlayConsole<S: TerminalSurface> {
    console: Console<S>,
    open: bool,
    close_requested: Rc<Cell<bool>>,
}

impl<S: TerminalSurface> OverlayConsole<S> {
    pub fn new(surface: S, config: ConsoleConfig) -> Self {
        let mut overlay = Self {
            console: Console::new(surface, config),
            open: false,
            close_requested: Rc::new(Cell::new(false)),
        };
        overlay.define_close();
        overlay.close();
        if overlay.console.config().overlay.auto_open {
            overlay.open();
        }
        overlay
    }

    fn define_close(&mut self) {
        let flag = Rc::clone(&self.close_requested);
        let spec = DefinitionSpec::new(
            "CLOSE",
            Handler::custom(move |_| {
                flag.set(true);
                Ok(Completion::Done)
            }),
        )
        .alias("EXIT")
        .description("Closes the command prompt");
        if let Err(e) = self.console.define(spec) {
            log::warn!("CLOSE command not registered: {e}");
        }
    }

    pub fn console(&self) -> &Console<S> {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console<S> {
        &mut self.console
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
        self.console.surface_mut().set_visible(true);
        self.console.focus();
        log::debug!("Overlay opened");
    }

    pub fn close(&mut self) {
        self.open = false;
        self.console.surface_mut().set_visible(false);
        self.console.blur();
        log::debug!("Overlay closed");
    }

    pub fn toggle(&mut self) {
        if self.open {
            self.close();
        } else {
            self.open();
        }
    }

    /// Route a global key press. The open key is ignored while an editable
    /// element has focus. Returns `true` if the key was consumed.
    pub fn handle_key(&mut self, key: Key, in_editable_target: bool) -> bool {
        let open_key = self.console.config().overlay.open_key;
        match key {
            Key::Char(c) if !self.open && !in_editable_target && c == open_key => {
                self.open();
                true
            },
            Key::Escape if self.open => {
                self.close();
                true
            },
            _ => false,
        }
    }

    pub fn handle_event(&mut self, event: SurfaceEvent) {
        self.console.handle_event(event);
        self.apply_close_request();
    }

    pub fn submit(&mut self, command: &str) -> Result<()> {
        let result = self.console.submit(command);
        self.apply_close_request();
        result
    }

    pub fn poll(&mut self) {
        self.console.poll();
        self.apply_close_request();
    }

    fn apply_close_request(&mut self) {
        if self.close_requested.replace(false) {
            self.close();
        }
    }

    pub fn init(&mut self) {
        if self.console.is_initialized() {
            return;
        }
        self.console.init();
        self.define_close();
        if self.console.config().overlay.auto_open {
            self.open();
        }
    }

    pub fn dispose(&mut self) {
        if !self.console.is_initialized() {
            return;
        }
        self.close();
        self.console.dispose();
    }

    pub fn reset(&mut self) {
        self.dispose();
        self.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DefinitionProvider;
    use crate::surface::MemorySurface;

    fn overlay() -> OverlayConsole<MemorySurface> {
        OverlayConsole::new(MemorySurface::new(), ConsoleConfig::default())
    }

    #[test]
    fn starts_closed() {
        let o = overlay();
        assert!(!o.is_open());
        assert!(!o.console().surface().is_visible());
        assert!(!o.console().surface().is_focused());
    }

    #[test]
    fn auto_open_from_config() {
        let mut config = ConsoleConfig::default();
        config.overlay.auto_open = true;
        let o = OverlayConsole::new(MemorySurface::new(), config);
        assert!(o.is_open());
        assert!(o.console().surface().is_visible());
        assert!(o.console().surface().is_focused());
    }

    #[test]
    fn open_key_opens_and_escape_closes() {
        let mut o = overlay();
        assert!(o.handle_key(Key::Char('`'), false));
        assert!(o.is_open());
        assert!(!o.handle_key(Key::Char('`'), false));
        assert!(o.handle_key(Key::Escape, false));
        assert!(!o.is_open());
        assert!(!o.handle_key(Key::Escape, false));
    }

    #[test]
    fn open_key_ignored_in_editable_target() {
        let mut o = overlay();
        assert!(!o.handle_key(Key::Char('`'), true));
        assert!(!o.is_open());
    }

    #[test]
    fn custom_open_key() {
        let mut config = ConsoleConfig::default();
        config.overlay.open_key = '~';
        let mut o = OverlayConsole::new(MemorySurface::new(), config);
        assert!(!o.handle_key(Key::Char('`'), false));
        assert!(o.handle_key(Key::Char('~'), false));
    }

    #[test]
    fn toggle_flips_state() {
        let mut o = overlay();
        o.toggle();
        assert!(o.is_open());
        o.toggle();
        assert!(!o.is_open());
    }

    #[test]
    fn close_command_closes_overlay() {
        let mut o = overlay();
        o.open();
        o.submit("CLOSE").unwrap();
        assert!(!o.is_open());

        o.open();
        o.handle_event(SurfaceEvent::LineSubmit("exit".into()));
        assert!(!o.is_open());
    }

    #[test]
    fn reset_keeps_close_command() {
        let mut o = overlay();
        o.reset();
        let names = o.console().definitions().unwrap().names();
        assert!(names.contains(&"CLOSE".to_string()));
        assert!(names.contains(&"EXIT".to_string()));
    }

    #[test]
    fn dispose_hides_overlay() {
        let mut o = overlay();
        o.open();
        o.dispose();
        assert!(!o.is_open());
        assert!(!o.console().is_initialized());
    }
}
