//! Execution context, suspension primitives, and the handler-facing session.
//!
//! A running command is represented by an [`ExecutionContext`]. Handlers
//! suspend by arming a [`PendingRead`] (through [`Session::read`] or
//! [`Session::read_line`]) or by returning a [`Completion::Deferred`] that is
//! settled later through its [`Resolver`]. The console resumes the
//! continuation on the next matching input.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use conshell_types::error::{ConsoleError, Result};
use conshell_types::input::TextStyle;

use crate::capability::{Capabilities, Capability};
use crate::definition::{Definition, DefinitionSpec};
use crate::output::{Output, TableColumn};
use crate::provider::DefinitionProvider;

/// What a read callback wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFlow {
    /// Re-issue the same read.
    Continue,
    /// The read is finished.
    Done,
}

/// Callback for a single-character read.
pub type CharCallback = Box<dyn FnMut(char, &mut Session<'_>) -> Result<ReadFlow>>;

/// Callback for a line read.
pub type LineCallback = Box<dyn FnMut(&str, &mut Session<'_>) -> Result<ReadFlow>>;

/// A suspended read waiting for input.
pub(crate) enum PendingRead {
    Char {
        callback: CharCallback,
        capture: bool,
    },
    Line {
        callback: LineCallback,
    },
}

impl fmt::Debug for PendingRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char { capture, .. } => write!(f, "Char {{ capture: {capture} }}"),
            Self::Line { .. } => f.write_str("Line"),
        }
    }
}

#[derive(Debug)]
enum DeferredState {
    Pending,
    Resolved,
    Rejected(String),
}

/// Outcome of a settled [`Deferred`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Resolved,
    Rejected(String),
}

/// Completion that settles after the handler has returned.
#[derive(Debug, Clone)]
pub struct Deferred {
    state: Rc<RefCell<DeferredState>>,
}

/// The settling half of a [`Deferred`].
#[derive(Debug)]
pub struct Resolver {
    state: Rc<RefCell<DeferredState>>,
}

impl Deferred {
    /// Create a pending completion and its resolver.
    pub fn new() -> (Self, Resolver) {
        let state = Rc::new(RefCell::new(DeferredState::Pending));
        (
            Self {
                state: Rc::clone(&state),
            },
            Resolver { state },
        )
    }

    /// `None` while pending.
    pub fn settlement(&self) -> Option<Settlement> {
        match &*self.state.borrow() {
            DeferredState::Pending => None,
            DeferredState::Resolved => Some(Settlement::Resolved),
            DeferredState::Rejected(reason) => Some(Settlement::Rejected(reason.clone())),
        }
    }
}

impl Resolver {
    pub fn resolve(self) {
        self.settle(DeferredState::Resolved);
    }

    pub fn reject(self, reason: &str) {
        self.settle(DeferredState::Rejected(reason.to_string()));
    }

    fn settle(self, outcome: DeferredState) {
        let mut state = self.state.borrow_mut();
        if matches!(*state, DeferredState::Pending) {
            *state = outcome;
        }
    }
}

/// How a handler reports that it is finished.
#[derive(Debug, Clone)]
pub enum Completion {
    /// Finished when the handler returned (and any read it armed is done).
    Done,
    /// Finished once the deferred settles.
    Deferred(Deferred),
}

impl Completion {
    pub(crate) fn settlement(&self) -> Option<Settlement> {
        match self {
            Self::Done => Some(Settlement::Resolved),
            Self::Deferred(d) => d.settlement(),
        }
    }
}

/// State of the one command currently executing.
#[derive(Debug)]
pub struct ExecutionContext {
    command: String,
    name: String,
    args: String,
    argv: Vec<String>,
    pub(crate) pending: Option<PendingRead>,
    pub(crate) completion: Option<Completion>,
}

impl ExecutionContext {
    pub(crate) fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            name: String::new(),
            args: String::new(),
            argv: Vec::new(),
            pending: None,
            completion: None,
        }
    }

    /// The trimmed command line.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Record the parsed command name and arguments.
    pub fn set_parsed(&mut self, name: &str, args: &str, argv: Vec<String>) {
        self.name = name.to_string();
        self.args = args.to_string();
        self.argv = argv;
    }

    pub fn is_awaiting_char(&self) -> bool {
        matches!(self.pending, Some(PendingRead::Char { .. }))
    }

    pub fn is_awaiting_line(&self) -> bool {
        matches!(self.pending, Some(PendingRead::Line { .. }))
    }

    pub fn is_reading(&self) -> bool {
        self.pending.is_some()
    }
}

/// The view a handler (and its read callbacks) gets of the console.
pub struct Session<'a> {
    output: Output<'a>,
    context: &'a mut ExecutionContext,
    definitions: Option<&'a mut (dyn DefinitionProvider + 'static)>,
    capabilities: &'a Capabilities,
    queue: &'a mut VecDeque<String>,
}

impl<'a> Session<'a> {
    pub(crate) fn new(
        output: Output<'a>,
        context: &'a mut ExecutionContext,
        definitions: Option<&'a mut (dyn DefinitionProvider + 'static)>,
        capabilities: &'a Capabilities,
        queue: &'a mut VecDeque<String>,
    ) -> Self {
        Self {
            output,
            context,
            definitions,
            capabilities,
            queue,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        self.context
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        self.context
    }

    /// Parsed command name, as typed.
    pub fn name(&self) -> &str {
        self.context.name()
    }

    /// Everything after the command name.
    pub fn args(&self) -> &str {
        self.context.args()
    }

    /// Arguments split with quote handling.
    pub fn argv(&self) -> &[String] {
        self.context.argv()
    }

    // -- Output --

    pub fn write(&mut self, value: &str) {
        self.output.write(value, &TextStyle::Plain);
    }

    pub fn write_styled(&mut self, value: &str, style: &TextStyle) {
        self.output.write(value, style);
    }

    pub fn write_line(&mut self, value: &str) {
        self.output.write_line(value, &TextStyle::Plain);
    }

    pub fn write_line_styled(&mut self, value: &str, style: &TextStyle) {
        self.output.write_line(value, style);
    }

    pub fn write_pad(&mut self, value: &str, padding: char, width: i32) {
        self.output
            .write_pad(value, padding, width, &TextStyle::Plain);
    }

    /// Write `rows` under `columns` specs such as `"name:10"`.
    pub fn write_table(&mut self, columns: &[&str], rows: &[Vec<String>], show_headers: bool) {
        let columns: Vec<TableColumn> = columns.iter().map(|c| TableColumn::parse(c)).collect();
        self.output
            .write_table(&columns, rows, show_headers, &TextStyle::Plain);
    }

    pub fn clear(&mut self) {
        self.output.clear();
    }

    // -- Console state --

    pub fn echo(&self) -> bool {
        self.output.display().echo
    }

    pub fn set_echo(&mut self, echo: bool) {
        self.output.display_mut().echo = echo;
    }

    pub fn prompt_prefix(&self) -> &str {
        &self.output.display().prompt_prefix
    }

    pub fn set_prompt_prefix(&mut self, prefix: &str) {
        self.output.set_prompt_prefix(prefix);
    }

    pub fn focus(&mut self) {
        self.output.surface_mut().focus_input();
    }

    pub fn blur(&mut self) {
        self.output.surface_mut().blur_input();
    }

    // -- Definitions --

    /// Resolve a command token against the bound definition provider.
    /// Without a provider nothing resolves.
    pub fn resolve(&self, token: &str) -> Option<Vec<Definition>> {
        match &self.definitions {
            Some(provider) => provider.resolve(token),
            None => Some(Vec::new()),
        }
    }

    /// Available definitions, sorted by name.
    pub fn available_definitions(&self) -> Vec<Definition> {
        self.definitions
            .as_ref()
            .map(|p| p.available().into_iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Register a command through the console's `define` capability.
    pub fn define(&mut self, spec: DefinitionSpec) -> Result<()> {
        let caps = self.capabilities;
        match self.definitions.as_deref_mut() {
            Some(provider) if caps.is_held_by(Capability::Define, provider.provider_id()) => {
                provider.define(spec)
            },
            _ => Err(ConsoleError::CapabilityMissing(Capability::Define.name())),
        }
    }

    /// Queue a command to run once the live one finishes. A read armed
    /// after this call takes the queued line as its input instead.
    pub fn submit(&mut self, command: &str) -> Result<()> {
        if command.trim().is_empty() {
            return Err(ConsoleError::InvalidSubmission(
                "command must not be empty".to_string(),
            ));
        }
        log::debug!(
            "Queued '{command}' ({} pending)",
            self.queue.len() + 1
        );
        self.queue.push_back(command.to_string());
        Ok(())
    }

    // -- Reads --

    /// Suspend until a single character arrives. With `capture` the
    /// character is not shown in the input.
    pub fn read<F>(&mut self, capture: bool, callback: F) -> Result<()>
    where
        F: FnMut(char, &mut Session<'_>) -> Result<ReadFlow> + 'static,
    {
        if self.context.pending.is_some() {
            return Err(ConsoleError::ReadPending);
        }
        self.context.pending = Some(PendingRead::Char {
            callback: Box::new(callback),
            capture,
        });
        Ok(())
    }

    /// Suspend until a full line arrives.
    pub fn read_line<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(&str, &mut Session<'_>) -> Result<ReadFlow> + 'static,
    {
        if self.context.pending.is_some() {
            return Err(ConsoleError::ReadPending);
        }
        self.context.pending = Some(PendingRead::Line {
            callback: Box::new(callback),
        });
        Ok(())
    }
}
