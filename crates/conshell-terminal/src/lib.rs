//! Embeddable command console engine.
//!
//! A [`Console`] turns submitted lines into handler invocations. Handlers are
//! registered as [`Definition`]s on a [`DefinitionProvider`] and may suspend
//! on single-character or line reads; later submissions queue behind the
//! live command and run in order. History and autocomplete are pluggable
//! providers that gain access to the engine through [`Capabilities`].
//!
//! The engine drives a [`TerminalSurface`] and never inspects its rendering;
//! [`MemorySurface`] records output for tests and headless hosts.

pub mod autocomplete;
mod builtins;
pub mod capability;
pub mod console;
pub mod definition;
pub mod handler;
pub mod history;
pub mod output;
pub mod overlay;
pub mod provider;
pub mod session;
pub mod surface;

/// Prefix-matching autocomplete over command names.
pub use autocomplete::{AutocompleteProvider, CommandAutocomplete};
/// Capability slots and provider identities.
pub use capability::{Capabilities, Capability, ProviderId};
/// The console engine.
pub use console::{Console, ConsoleEvent, ConsoleState, ListenerId};
/// Command definitions and their handlers.
pub use definition::{Definition, DefinitionSpec, Handler};
/// Command-line parsing and dispatch.
pub use handler::{CommandHandler, DefaultCommandHandler};
/// Bounded command history.
pub use history::{HistoryProvider, MemoryHistory};
/// Table column specs for `write_table`.
pub use output::{ColumnWidth, TableColumn};
/// Overlay wrapper with open/close state.
pub use overlay::OverlayConsole;
/// Definition lookup and the default in-memory registry.
pub use provider::{DefinitionProvider, DefinitionRegistry};
/// Handler-facing session and suspension primitives.
pub use session::{Completion, Deferred, ExecutionContext, ReadFlow, Resolver, Session, Settlement};
/// Terminal surface contract.
pub use surface::{MemorySurface, TerminalSurface};
