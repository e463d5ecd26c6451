//! Command definitions.
//!
//! A [`Definition`] is the immutable record the provider stores per command
//! name. Built-in commands are tagged [`Handler`] variants registered through
//! the same [`DefinitionSpec`] path as user commands.

use std::fmt;
use std::rc::Rc;

use conshell_types::error::{ConsoleError, Result};

use crate::session::{Completion, Session};

/// Signature of a user command handler.
pub type HandlerFn = dyn Fn(&mut Session<'_>) -> Result<Completion>;

/// Availability predicate.
pub type AvailabilityFn = dyn Fn() -> bool;

/// The code a definition runs.
#[derive(Clone)]
pub enum Handler {
    /// Lists available commands, or details for one.
    Help,
    /// `ON`/`OFF` toggles echo, anything else is printed.
    Echo,
    /// Clears the output.
    Clear,
    /// A caller-supplied handler.
    Custom(Rc<HandlerFn>),
}

impl Handler {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&mut Session<'_>) -> Result<Completion> + 'static,
    {
        Self::Custom(Rc::new(f))
    }

    /// Run the handler against a session.
    pub fn invoke(&self, session: &mut Session<'_>) -> Result<Completion> {
        match self {
            Self::Help => crate::builtins::help(session),
            Self::Echo => crate::builtins::echo(session),
            Self::Clear => crate::builtins::clear(session),
            Self::Custom(f) => f(session),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => f.write_str("Help"),
            Self::Echo => f.write_str("Echo"),
            Self::Clear => f.write_str("Clear"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A registered command.
#[derive(Clone)]
pub struct Definition {
    name: String,
    handler: Handler,
    description: String,
    usage: Option<String>,
    available: Option<Rc<AvailabilityFn>>,
}

impl Definition {
    /// Uppercased command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    /// Evaluate the availability predicate. Definitions without one are
    /// always available.
    pub fn is_available(&self) -> bool {
        self.available.as_ref().is_none_or(|f| f())
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("handler", &self.handler)
            .field("description", &self.description)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Builder describing a command to register.
#[derive(Clone)]
pub struct DefinitionSpec {
    name: String,
    aliases: Vec<String>,
    handler: Handler,
    description: String,
    usage: Option<String>,
    available: Option<Rc<AvailabilityFn>>,
}

impl DefinitionSpec {
    pub fn new(name: &str, handler: Handler) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            handler,
            description: String::new(),
            usage: None,
            available: None,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn usage(mut self, usage: &str) -> Self {
        self.usage = Some(usage.to_string());
        self
    }

    /// Register an additional name resolving to the same handler.
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn available<F>(mut self, predicate: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        self.available = Some(Rc::new(predicate));
        self
    }

    /// Validate and expand into one definition per name (canonical first,
    /// then aliases in the order given).
    pub fn build(self) -> Result<Vec<Definition>> {
        let canonical = normalize_name(&self.name)?;
        let mut names = vec![canonical];
        for alias in &self.aliases {
            let alias = normalize_name(alias)?;
            if !names.contains(&alias) {
                names.push(alias);
            }
        }
        Ok(names
            .into_iter()
            .map(|name| Definition {
                name,
                handler: self.handler.clone(),
                description: self.description.clone(),
                usage: self.usage.clone(),
                available: self.available.clone(),
            })
            .collect())
    }
}

fn normalize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ConsoleError::InvalidDefinition(
            "name is required".to_string(),
        ));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(ConsoleError::InvalidDefinition(format!(
            "name must be a single word: {trimmed}"
        )));
    }
    Ok(trimmed.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn noop() -> Handler {
        Handler::custom(|_| Ok(Completion::Done))
    }

    #[test]
    fn build_uppercases_name() {
        let defs = DefinitionSpec::new("greet", noop())
            .description("Says hello")
            .build()
            .unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name(), "GREET");
        assert_eq!(defs[0].description(), "Says hello");
        assert!(defs[0].usage().is_none());
    }

    #[test]
    fn empty_name_rejected() {
        let err = DefinitionSpec::new("", noop()).build().unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidDefinition(_)));
        let err = DefinitionSpec::new("   ", noop()).build().unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidDefinition(_)));
    }

    #[test]
    fn multi_word_name_rejected() {
        let err = DefinitionSpec::new("two words", noop()).build().unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidDefinition(_)));
    }

    #[test]
    fn empty_alias_rejected() {
        let err = DefinitionSpec::new("LIST", noop())
            .alias("")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidDefinition(_)));
    }

    #[test]
    fn aliases_share_handler_and_description() {
        let defs = DefinitionSpec::new("cls", Handler::Clear)
            .alias("clear")
            .alias("CLEAR")
            .description("Clears the output")
            .build()
            .unwrap();
        let names: Vec<&str> = defs.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["CLS", "CLEAR"]);
        assert!(defs.iter().all(|d| d.description() == "Clears the output"));
        assert!(defs.iter().all(|d| matches!(d.handler(), Handler::Clear)));
    }

    #[test]
    fn availability_predicate_is_evaluated_each_time() {
        let flag = Rc::new(Cell::new(true));
        let f = Rc::clone(&flag);
        let defs = DefinitionSpec::new("x", noop())
            .available(move || f.get())
            .build()
            .unwrap();
        assert!(defs[0].is_available());
        flag.set(false);
        assert!(!defs[0].is_available());
    }

    #[test]
    fn default_availability_is_true() {
        let defs = DefinitionSpec::new("x", noop()).build().unwrap();
        assert!(defs[0].is_available());
    }

    #[test]
    fn debug_hides_closures() {
        let defs = DefinitionSpec::new("x", noop()).usage("x [arg]").build().unwrap();
        let dbg = format!("{:?}", defs[0]);
        assert!(dbg.contains("Custom(..)"));
        assert!(dbg.contains("x [arg]"));
    }
}
