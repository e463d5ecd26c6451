//! Command-name completion with wrap-around cycling.

use crate::capability::{Capabilities, Capability, ProviderId};

/// Suggests command names for a partial token.
pub trait AutocompleteProvider {
    fn provider_id(&self) -> ProviderId;

    /// Next suggestion for `partial` among `candidates` (`forward` = next,
    /// otherwise previous). `None` when nothing matches.
    fn next_value(&mut self, forward: bool, partial: &str, candidates: &[String])
    -> Option<String>;

    /// Forget the current token; the next call starts a fresh cycle.
    fn reset(&mut self) {}

    fn bind(&self, caps: &mut Capabilities) -> bool {
        caps.install(Capability::Autocomplete, self.provider_id())
    }

    fn unbind(&self, caps: &mut Capabilities) -> bool {
        caps.remove(Capability::Autocomplete, self.provider_id())
    }
}

/// Prefix matcher over command names.
#[derive(Debug)]
pub struct CommandAutocomplete {
    id: ProviderId,
    token: Option<String>,
    index: usize,
}

impl CommandAutocomplete {
    pub fn new() -> Self {
        Self {
            id: ProviderId::next(),
            token: None,
            index: 0,
        }
    }
}

impl Default for CommandAutocomplete {
    fn default() -> Self {
        Self::new()
    }
}

/// Candidates starting with `partial` (case-insensitive), sorted.
pub fn matching(partial: &str, candidates: &[String]) -> Vec<String> {
    let prefix = partial.to_uppercase();
    let mut found: Vec<String> = candidates
        .iter()
        .filter(|c| c.to_uppercase().starts_with(&prefix))
        .cloned()
        .collect();
    found.sort();
    found.dedup();
    found
}

impl AutocompleteProvider for CommandAutocomplete {
    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn next_value(
        &mut self,
        forward: bool,
        partial: &str,
        candidates: &[String],
    ) -> Option<String> {
        let found = matching(partial, candidates);
        if found.is_empty() {
            self.token = None;
            return None;
        }

        let same_token = self
            .token
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(partial));

        self.index = if !same_token {
            if forward { 0 } else { found.len() - 1 }
        } else if forward {
            (self.index + 1) % found.len()
        } else {
            (self.index + found.len() - 1) % found.len()
        };
        // The candidate set may have shrunk since the last call.
        self.index %= found.len();
        self.token = Some(partial.to_string());

        Some(found[self.index].clone())
    }

    fn reset(&mut self) {
        self.token = None;
        self.index = 0;
    }
}
