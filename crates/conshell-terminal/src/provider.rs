//! Definition lookup with abbreviation matching and built-in commands.

use std::collections::HashMap;

use conshell_types::config::DefinitionsConfig;
use conshell_types::error::Result;

use crate::capability::{Capabilities, Capability, ProviderId};
use crate::definition::{Definition, DefinitionSpec, Handler};

/// Owns the command definitions the console dispatches to.
pub trait DefinitionProvider {
    fn provider_id(&self) -> ProviderId;

    /// Register a command (and its aliases). Re-registering a name replaces
    /// the previous definition.
    fn define(&mut self, spec: DefinitionSpec) -> Result<()>;

    /// Remove a definition by name (case-insensitive).
    fn remove(&mut self, name: &str) -> Option<Definition>;

    /// Look up a command token.
    ///
    /// An exact match yields one definition, or `None` if it exists but is
    /// unavailable. Otherwise every available definition the token
    /// abbreviates is returned, sorted by name; empty means not found.
    fn resolve(&self, token: &str) -> Option<Vec<Definition>>;

    /// Every available definition, sorted by name.
    fn available(&self) -> Vec<&Definition>;

    /// Names of every available definition, sorted.
    fn names(&self) -> Vec<String> {
        self.available()
            .into_iter()
            .map(|d| d.name().to_string())
            .collect()
    }

    /// Install this provider as the console's `define` capability.
    fn bind(&self, caps: &mut Capabilities) -> bool {
        caps.install(Capability::Define, self.provider_id())
    }

    fn unbind(&self, caps: &mut Capabilities) -> bool {
        caps.remove(Capability::Define, self.provider_id())
    }
}

/// In-memory registry keyed by uppercased command name.
pub struct DefinitionRegistry {
    id: ProviderId,
    definitions: HashMap<String, Definition>,
    allow_abbreviations: bool,
}

impl DefinitionRegistry {
    /// Create a registry holding the configured built-ins.
    pub fn new(config: &DefinitionsConfig) -> Self {
        let mut registry = Self::empty(config.allow_abbreviations);
        registry.predefine(config);
        registry
    }

    /// Create a registry with no definitions at all.
    pub fn empty(allow_abbreviations: bool) -> Self {
        Self {
            id: ProviderId::next(),
            definitions: HashMap::new(),
            allow_abbreviations,
        }
    }

    pub fn add_definition(&mut self, definition: Definition) {
        if let Some(prev) = self
            .definitions
            .insert(definition.name().to_string(), definition)
        {
            log::debug!("Replaced definition {}", prev.name());
        }
    }

    fn predefine(&mut self, config: &DefinitionsConfig) {
        let builtins = [
            DefinitionSpec::new("HELP", Handler::Help)
                .description("Lists the available commands")
                .usage("HELP [command]"),
            DefinitionSpec::new("ECHO", Handler::Echo)
                .description("Displays provided text or toggles command echoing")
                .usage("ECHO [ON|OFF|text]"),
            DefinitionSpec::new("CLS", Handler::Clear)
                .description("Clears the command prompt")
                .usage("CLS"),
        ];
        for spec in builtins {
            let defs = match spec.build() {
                Ok(defs) => defs,
                Err(e) => {
                    log::error!("Built-in definition rejected: {e}");
                    continue;
                },
            };
            for def in defs {
                if config.is_predefined(def.name()) {
                    self.add_definition(def);
                }
            }
        }
    }
}

impl DefinitionProvider for DefinitionRegistry {
    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn define(&mut self, spec: DefinitionSpec) -> Result<()> {
        for definition in spec.build()? {
            self.add_definition(definition);
        }
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Option<Definition> {
        self.definitions.remove(&name.to_uppercase())
    }

    fn resolve(&self, token: &str) -> Option<Vec<Definition>> {
        let token = token.to_uppercase();

        if let Some(definition) = self.definitions.get(&token) {
            if definition.is_available() {
                return Some(vec![definition.clone()]);
            }
            return None;
        }

        let mut matches = Vec::new();
        if self.allow_abbreviations {
            matches.extend(
                self.definitions
                    .values()
                    .filter(|d| d.name().starts_with(&token) && d.is_available())
                    .cloned(),
            );
            matches.sort_by(|a, b| a.name().cmp(b.name()));
        }
        Some(matches)
    }

    fn available(&self) -> Vec<&Definition> {
        let mut defs: Vec<&Definition> = self
            .definitions
            .values()
            .filter(|d| d.is_available())
            .collect();
        defs.sort_by(|a, b| a.name().cmp(b.name()));
        defs
    }
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new(&DefinitionsConfig::default())
    }
}
