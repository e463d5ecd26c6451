//! The console engine.
//!
//! Owns the single live [`ExecutionContext`], the pending-command queue,
//! echo/prefix state and the provider slots. All transitions happen inside
//! [`Console::submit`], [`Console::handle_event`] and [`Console::poll`];
//! nothing runs concurrently. States:
//!
//! - `Idle`: no command is live. A submission starts executing.
//! - `Executing`: a command is live. Submissions are queued.
//! - `AwaitingChar` / `AwaitingLine`: the live command armed a read. Input
//!   from the surface resumes it; a queued entry present when the read is
//!   armed satisfies it immediately.
//!
//! A command finishes once its [`Completion`] has settled and no read is
//! armed. The queue then drains one command at a time.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use conshell_types::config::ConsoleConfig;
use conshell_types::error::{ConsoleError, Result};
use conshell_types::input::{SurfaceEvent, TextStyle};

use crate::autocomplete::{AutocompleteProvider, CommandAutocomplete};
use crate::capability::{Capabilities, Capability};
use crate::definition::DefinitionSpec;
use crate::handler::{CommandHandler, DefaultCommandHandler};
use crate::history::{HistoryProvider, MemoryHistory};
use crate::output::{DisplayState, Output, TableColumn};
use crate::provider::{DefinitionProvider, DefinitionRegistry};
use crate::session::{Completion, ExecutionContext, PendingRead, ReadFlow, Session, Settlement};
use crate::surface::TerminalSurface;


/// Message written when a handler fails.
pub const FAILURE_MESSAGE: &str = "Unhandled exception. See log for details.";

/// Observable engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleState {
    Idle,
    Executing,
    AwaitingChar,
    AwaitingLine,
}

/// Execution lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleEvent {
    /// A command is about to start. Carries the raw command line.
    PreExecute,
    /// A command has finished. Carries the trimmed command line.
    Execute,
}

/// Handle returned by [`Console::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&str)>;

/// An embeddable command console driving a [`TerminalSurface`].
pub struct Console<S: TerminalSurface> {
    surface: S,
    config: ConsoleConfig,
    display: DisplayState,
    current: Option<ExecutionContext>,
    queue: VecDeque<String>,
    autocomplete_value: Option<String>,
    definitions: Option<Box<dyn DefinitionProvider>>,
    history: Option<Box<dyn HistoryProvider>>,
    autocomplete: Option<Box<dyn AutocompleteProvider>>,
    command_handler: Option<Box<dyn CommandHandler>>,
    capabilities: Capabilities,
    listeners: Vec<(ListenerId, ConsoleEvent, Listener)>,
    next_listener: u64,
    initialized: bool,
}

impl<S: TerminalSurface> Console<S> {
    /// Create and initialize a console with the default providers.
    pub fn new(surface: S, config: ConsoleConfig) -> Self {
        let display = DisplayState::new(config.echo, &config.prompt_prefix);
        let mut console = Self {
            surface,
            config,
            display,
            current: None,
            queue: VecDeque::new(),
            autocomplete_value: None,
            definitions: None,
            history: None,
            autocomplete: None,
            command_handler: None,
            capabilities: Capabilities::new(),
            listeners: Vec::new(),
            next_listener: 0,
            initialized: false,
        };
        console.init();
        console
    }

    /// Install default providers into empty slots and show the prompt.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.display = DisplayState::new(self.config.echo, &self.config.prompt_prefix);

        let definitions = self
            .definitions
            .take()
            .unwrap_or_else(|| Box::new(DefinitionRegistry::new(&self.config.definitions)));
        definitions.bind(&mut self.capabilities);
        self.definitions = Some(definitions);

        let history = self
            .history
            .take()
            .unwrap_or_else(|| Box::new(MemoryHistory::new(&self.config.history)));
        history.bind(&mut self.capabilities);
        self.history = Some(history);

        let autocomplete = self
            .autocomplete
            .take()
            .unwrap_or_else(|| Box::new(CommandAutocomplete::new()));
        autocomplete.bind(&mut self.capabilities);
        self.autocomplete = Some(autocomplete);

        if self.command_handler.is_none() {
            self.command_handler = Some(Box::new(DefaultCommandHandler::new()));
        }

        self.output().activate_input(false);
        self.initialized = true;
        log::debug!("Console initialized");
    }

    /// Drop all execution state, listeners and providers.
    pub fn dispose(&mut self) {
        if !self.initialized {
            return;
        }
        if let Some(ctx) = self.current.take() {
            log::warn!("Discarding in-flight command '{}'", ctx.command());
        }
        self.queue.clear();
        self.autocomplete_value = None;
        self.listeners.clear();

        if let Some(p) = self.definitions.take() {
            p.unbind(&mut self.capabilities);
        }
        if let Some(p) = self.history.take() {
            p.unbind(&mut self.capabilities);
        }
        if let Some(p) = self.autocomplete.take() {
            p.unbind(&mut self.capabilities);
        }
        self.command_handler = None;

        self.display = DisplayState::new(self.config.echo, &self.config.prompt_prefix);
        self.surface.set_input_visible(false);
        self.surface.blur_input();
        self.initialized = false;
        log::debug!("Console disposed");
    }

    /// Dispose and re-initialize with fresh default providers.
    pub fn reset(&mut self) {
        self.dispose();
        self.init();
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn state(&self) -> ConsoleState {
        match &self.current {
            None => ConsoleState::Idle,
            Some(ctx) if ctx.is_awaiting_char() => ConsoleState::AwaitingChar,
            Some(ctx) if ctx.is_awaiting_line() => ConsoleState::AwaitingLine,
            Some(_) => ConsoleState::Executing,
        }
    }

    /// The live command, if any.
    pub fn current(&self) -> Option<&ExecutionContext> {
        self.current.as_ref()
    }

    /// Commands waiting behind the live one, oldest first.
    pub fn queued(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    pub fn echo(&self) -> bool {
        self.display.echo
    }

    pub fn set_echo(&mut self, echo: bool) {
        self.display.echo = echo;
    }

    pub fn prompt_prefix(&self) -> &str {
        &self.display.prompt_prefix
    }

    pub fn set_prompt_prefix(&mut self, prefix: &str) {
        self.output().set_prompt_prefix(prefix);
    }

    // -- Providers --

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn capabilities_mut(&mut self) -> &mut Capabilities {
        &mut self.capabilities
    }

    pub fn definitions(&self) -> Option<&dyn DefinitionProvider> {
        self.definitions.as_deref()
    }

    pub fn definitions_mut(&mut self) -> Option<&mut (dyn DefinitionProvider + 'static)> {
        self.definitions.as_deref_mut()
    }

    /// Swap the definition provider. The old one is unbound first.
    pub fn set_definition_provider(
        &mut self,
        provider: Option<Box<dyn DefinitionProvider>>,
    ) -> Option<Box<dyn DefinitionProvider>> {
        let old = self.definitions.take();
        if let Some(p) = &old {
            p.unbind(&mut self.capabilities);
        }
        if let Some(p) = &provider {
            p.bind(&mut self.capabilities);
            log::info!("Definition provider replaced");
        }
        self.definitions = provider;
        old
    }

    pub fn history_provider(&self) -> Option<&dyn HistoryProvider> {
        self.history.as_deref()
    }

    /// Swap the history provider. The old one is unbound first.
    pub fn set_history_provider(
        &mut self,
        provider: Option<Box<dyn HistoryProvider>>,
    ) -> Option<Box<dyn HistoryProvider>> {
        let old = self.history.take();
        if let Some(p) = &old {
            p.unbind(&mut self.capabilities);
        }
        if let Some(p) = &provider {
            p.bind(&mut self.capabilities);
            log::info!("History provider replaced");
        }
        self.history = provider;
        old
    }

    /// Swap the autocomplete provider. The old one is unbound first.
    pub fn set_autocomplete_provider(
        &mut self,
        provider: Option<Box<dyn AutocompleteProvider>>,
    ) -> Option<Box<dyn AutocompleteProvider>> {
        let old = self.autocomplete.take();
        if let Some(p) = &old {
            p.unbind(&mut self.capabilities);
        }
        if let Some(p) = &provider {
            p.bind(&mut self.capabilities);
            log::info!("Autocomplete provider replaced");
        }
        self.autocomplete = provider;
        self.autocomplete_value = None;
        old
    }

    pub fn set_command_handler(
        &mut self,
        handler: Option<Box<dyn CommandHandler>>,
    ) -> Option<Box<dyn CommandHandler>> {
        std::mem::replace(&mut self.command_handler, handler)
    }

    /// Register a command through the `define` capability.
    pub fn define(&mut self, spec: DefinitionSpec) -> Result<()> {
        match self.definitions.as_mut() {
            Some(p) if self.capabilities.is_held_by(Capability::Define, p.provider_id()) => {
                p.define(spec)
            },
            _ => Err(ConsoleError::CapabilityMissing(Capability::Define.name())),
        }
    }

    // -- Events --

    /// Subscribe to an execution event.
    pub fn on<F>(&mut self, event: ConsoleEvent, listener: F) -> ListenerId
    where
        F: FnMut(&str) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, event, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: ConsoleEvent, command: &str) {
        for (_, ev, listener) in &mut self.listeners {
            if *ev == event {
                listener(command);
            }
        }
    }

    // -- Output --

    pub fn write(&mut self, value: &str, style: &TextStyle) {
        self.output().write(value, style);
    }

    pub fn write_line(&mut self, value: &str, style: &TextStyle) {
        self.output().write_line(value, style);
    }

    pub fn write_pad(&mut self, value: &str, padding: char, width: i32, style: &TextStyle) {
        self.output().write_pad(value, padding, width, style);
    }

    /// Write `rows` under `columns` specs such as `"name:10"`.
    pub fn write_table(&mut self, columns: &[&str], rows: &[Vec<String>], show_headers: bool) {
        let columns: Vec<TableColumn> = columns.iter().map(|c| TableColumn::parse(c)).collect();
        self.output()
            .write_table(&columns, rows, show_headers, &TextStyle::Plain);
    }

    pub fn clear(&mut self) {
        self.output().clear();
    }

    pub fn focus(&mut self) {
        self.surface.focus_input();
    }

    pub fn blur(&mut self) {
        self.surface.blur_input();
    }

    fn output(&mut self) -> Output<'_> {
        Output::new(&mut self.surface, &mut self.display)
    }

    // -- Submission --

    /// Execute a command, or queue it behind the live one.
    pub fn submit(&mut self, command: &str) -> Result<()> {
        if !self.initialized {
            return Err(ConsoleError::InvalidSubmission(
                "console is not initialized".to_string(),
            ));
        }
        if command.trim().is_empty() {
            return Err(ConsoleError::InvalidSubmission(
                "command must not be empty".to_string(),
            ));
        }
        if self.current.is_some() {
            self.enqueue(command);
            return Ok(());
        }
        self.begin(command);
        self.settle();
        Ok(())
    }

    /// Re-check a deferred completion after it was settled outside of a
    /// surface event.
    pub fn poll(&mut self) {
        self.settle();
    }

    /// Process one notification from the terminal surface.
    pub fn handle_event(&mut self, event: SurfaceEvent) {
        if !self.initialized {
            log::debug!("Ignoring {event:?}: console not initialized");
            return;
        }
        match event {
            SurfaceEvent::LineSubmit(text) => self.on_line_submit(&text),
            SurfaceEvent::Char(ch) => self.on_char(ch),
            SurfaceEvent::HistoryCycle { forward } => self.history_cycle(forward),
            SurfaceEvent::AutocompleteCycle {
                forward,
                input,
                cursor,
            } => self.autocomplete_cycle(forward, &input, cursor),
            SurfaceEvent::Paste(text) => self.on_paste(&text),
            SurfaceEvent::Edit => {
                if self.current.is_none() {
                    self.autocomplete_reset();
                }
            },
        }
        self.settle();
    }

    fn enqueue(&mut self, command: &str) {
        log::debug!(
            "Queued '{command}' ({} pending)",
            self.queue.len() + 1
        );
        self.queue.push_back(command.to_string());
    }

    fn on_line_submit(&mut self, text: &str) {
        match self.state() {
            ConsoleState::Idle => {
                self.autocomplete_reset();
                if text.trim().is_empty() {
                    return;
                }
                self.begin(text);
            },
            ConsoleState::AwaitingLine | ConsoleState::AwaitingChar => {
                self.resume(text);
                self.suspend_if_reading();
            },
            ConsoleState::Executing => {
                if !text.trim().is_empty() {
                    self.enqueue(text);
                }
            },
        }
    }

    fn on_char(&mut self, ch: char) {
        match self.state() {
            ConsoleState::Idle => self.autocomplete_reset(),
            ConsoleState::AwaitingChar => {
                let mut buf = [0u8; 4];
                self.resume(ch.encode_utf8(&mut buf));
                self.suspend_if_reading();
            },
            ConsoleState::Executing | ConsoleState::AwaitingLine => {},
        }
    }

    /// The first pasted line is used as-is; later empty lines are dropped.
    fn on_paste(&mut self, text: &str) {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<&str> = normalized.split('\n').collect();
        let Some((first, rest)) = lines.split_first() else {
            return;
        };
        if rest.is_empty() {
            return;
        }

        let state = self.state();
        if state == ConsoleState::Executing && !first.is_empty() {
            self.enqueue(first);
        }
        for line in rest.iter().filter(|l| !l.is_empty()) {
            self.enqueue(line);
        }

        match state {
            ConsoleState::Idle => {
                self.autocomplete_reset();
                if !first.trim().is_empty() {
                    self.begin(first);
                }
            },
            ConsoleState::AwaitingLine | ConsoleState::AwaitingChar => {
                self.resume(first);
                self.suspend_if_reading();
            },
            ConsoleState::Executing => {},
        }
    }

    // -- Navigation --

    fn history_cycle(&mut self, forward: bool) {
        if self.current.is_some() {
            return;
        }
        self.autocomplete_reset();
        let Some(history) = self.history.as_mut() else {
            return;
        };
        if !self
            .capabilities
            .is_held_by(Capability::History, history.provider_id())
        {
            return;
        }
        let value = history.next_value(forward);
        self.output().set_input(value.as_deref().unwrap_or_default());
    }

    fn autocomplete_cycle(&mut self, forward: bool, input: &str, cursor: usize) {
        if self.current.is_some() {
            return;
        }
        let mut input = input.to_string();
        if input.ends_with(|c: char| c.is_whitespace() && c != ' ') {
            input.pop();
            input.push(' ');
        }

        // Token boundaries around the cursor (a character index).
        let cursor_byte = input
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(input.len());
        let search_end = input[cursor_byte..]
            .chars()
            .next()
            .map(|c| cursor_byte + c.len_utf8())
            .unwrap_or(input.len());
        let start = input[..search_end].rfind(' ').map(|i| i + 1).unwrap_or(0);

        if self.autocomplete_value.is_none() {
            let end = input[start..]
                .find(' ')
                .map(|i| start + i)
                .unwrap_or(input.len());
            self.autocomplete_value = Some(input[start..end].to_string());
        }
        let partial = self.autocomplete_value.clone().unwrap_or_default();

        let candidates = self
            .definitions
            .as_deref()
            .map(|p| p.names())
            .unwrap_or_default();
        let Some(provider) = self.autocomplete.as_mut() else {
            return;
        };
        if !self
            .capabilities
            .is_held_by(Capability::Autocomplete, provider.provider_id())
        {
            return;
        }
        if let Some(value) = provider.next_value(forward, &partial, &candidates) {
            let completed = format!("{}{}", &input[..start], value);
            self.output().set_input(&completed);
        }
    }

    fn autocomplete_reset(&mut self) {
        self.autocomplete_value = None;
        if let Some(provider) = self.autocomplete.as_mut() {
            provider.reset();
        }
    }

    // -- Execution --

    fn session_parts(&mut self) -> Option<(Session<'_>, Option<&dyn CommandHandler>)> {
        let Self {
            surface,
            display,
            current,
            definitions,
            capabilities,
            command_handler,
            queue,
            ..
        } = self;
        let context = current.as_mut()?;
        let output = Output::new(surface, display);
        let session = Session::new(
            output,
            context,
            definitions.as_deref_mut(),
            capabilities,
            queue,
        );
        Some((session, command_handler.as_deref()))
    }

    /// Start executing `command`. Requires that no command is live.
    fn begin(&mut self, command: &str) {
        debug_assert!(self.current.is_none());
        self.emit(ConsoleEvent::PreExecute, command);
        self.record_history(command);

        let echo = self.display.echo;
        {
            let mut out = self.output();
            out.set_input(command);
            out.flush_input(!echo);
            out.deactivate_input();
        }

        let command = command.trim();
        log::debug!("Executing '{command}'");
        self.current = Some(ExecutionContext::new(command));

        let outcome = match self.session_parts() {
            Some((mut session, Some(handler))) => {
                guarded(|| handler.execute(&mut session, command))
            },
            Some((_, None)) => Err(ConsoleError::CapabilityMissing("command handler")),
            None => return,
        };

        if let Some(ctx) = self.current.as_mut() {
            match outcome {
                Ok(completion) => ctx.completion = Some(completion),
                Err(e) => {
                    ctx.pending = None;
                    ctx.completion = Some(Completion::Done);
                    self.report_failure(&e);
                },
            }
        }
        self.suspend_if_reading();
    }

    fn record_history(&mut self, command: &str) {
        if let Some(history) = self.history.as_mut()
            && self
                .capabilities
                .is_held_by(Capability::History, history.provider_id())
        {
            history.record(command);
        }
    }

    /// Show the inline input for an armed read, feeding queued entries to it
    /// until the queue runs dry or the command stops reading.
    fn suspend_if_reading(&mut self) {
        while self.current.as_ref().is_some_and(ExecutionContext::is_reading) {
            self.output().activate_input(true);
            let Some(entry) = self.queue.pop_front() else {
                return;
            };
            log::debug!("Feeding queued '{entry}' to pending read");
            self.resume(&entry);
        }
    }

    /// Hand `input` to the armed read. Char reads take its first character.
    /// Returns `false` if nothing was consumed.
    fn resume(&mut self, input: &str) -> bool {
        let Some(pending) = self.current.as_mut().and_then(|ctx| ctx.pending.take()) else {
            return false;
        };

        match pending {
            PendingRead::Char {
                mut callback,
                capture,
            } => {
                let Some(ch) = input.chars().next() else {
                    self.rearm(PendingRead::Char { callback, capture });
                    return false;
                };
                {
                    let mut out = self.output();
                    if !capture {
                        let mut buf = [0u8; 4];
                        out.set_input(ch.encode_utf8(&mut buf));
                    }
                    out.deactivate_input();
                }
                let Some((mut session, _)) = self.session_parts() else {
                    return false;
                };
                match guarded(|| callback(ch, &mut session)) {
                    Ok(ReadFlow::Continue) => self.rearm(PendingRead::Char { callback, capture }),
                    Ok(ReadFlow::Done) => self.output().flush_input(false),
                    Err(e) => self.read_failed(&e),
                }
            },
            PendingRead::Line { mut callback } => {
                {
                    let mut out = self.output();
                    out.set_input(input);
                    out.deactivate_input();
                    out.flush_input(false);
                }
                let Some((mut session, _)) = self.session_parts() else {
                    return false;
                };
                match guarded(|| callback(input, &mut session)) {
                    Ok(ReadFlow::Continue) => self.rearm(PendingRead::Line { callback }),
                    Ok(ReadFlow::Done) => {},
                    Err(e) => self.read_failed(&e),
                }
            },
        }
        true
    }

    /// Re-arm a read unless its callback already armed a new one.
    fn rearm(&mut self, pending: PendingRead) {
        if let Some(ctx) = self.current.as_mut()
            && ctx.pending.is_none()
        {
            ctx.pending = Some(pending);
        }
    }

    fn read_failed(&mut self, err: &ConsoleError) {
        if let Some(ctx) = self.current.as_mut() {
            ctx.pending = None;
        }
        self.report_failure(err);
    }

    fn report_failure(&mut self, err: &ConsoleError) {
        let command = self
            .current
            .as_ref()
            .map(|c| c.command().to_string())
            .unwrap_or_default();
        if err.is_soft() {
            log::warn!("Command '{command}' failed: {err}");
        } else {
            log::error!("Command '{command}' misused the console: {err}");
        }
        self.output().write_line(FAILURE_MESSAGE, &TextStyle::Error);
    }

    /// Finish the live command once it is complete, then start queued ones.
    fn settle(&mut self) {
        loop {
            let Some(ctx) = self.current.as_ref() else {
                match self.queue.pop_front() {
                    Some(next) if next.trim().is_empty() => continue,
                    Some(next) => {
                        self.begin(&next);
                        continue;
                    },
                    None => return,
                }
            };
            if ctx.is_reading() {
                return;
            }
            let settlement = ctx.completion.as_ref().and_then(Completion::settlement);
            match settlement {
                None => return,
                Some(Settlement::Resolved) => {},
                Some(Settlement::Rejected(reason)) => {
                    self.report_failure(&ConsoleError::Handler(reason));
                },
            }
            self.finish();
        }
    }

    fn finish(&mut self) {
        let Some(ctx) = self.current.take() else {
            return;
        };
        log::debug!("Finished '{}'", ctx.command());
        self.emit(ConsoleEvent::Execute, ctx.command());
        self.output().activate_input(false);
    }
}

/// Run handler code, turning a panic into a handler error so the engine
/// can report it and move on.
fn guarded<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(ConsoleError::Handler(format!("panicked: {message}")))
    })
}
