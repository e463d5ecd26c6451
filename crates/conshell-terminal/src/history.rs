//! Command history with clamped cursor navigation.

use conshell_types::config::HistoryConfig;

use crate::capability::{Capabilities, Capability, ProviderId};

/// Remembers executed commands and cycles through them.
pub trait HistoryProvider {
    fn provider_id(&self) -> ProviderId;

    /// Remember a command. Resets the cursor to one past the newest entry.
    fn record(&mut self, command: &str);

    /// Move the cursor one step (`forward` = newer) and return the entry
    /// under it, or `None` once it moves past the newest entry.
    fn next_value(&mut self, forward: bool) -> Option<String>;

    fn bind(&self, caps: &mut Capabilities) -> bool {
        caps.install(Capability::History, self.provider_id())
    }

    fn unbind(&self, caps: &mut Capabilities) -> bool {
        caps.remove(Capability::History, self.provider_id())
    }
}

/// In-memory history, lost when the console is dropped.
#[derive(Debug)]
pub struct MemoryHistory {
    id: ProviderId,
    entries: Vec<String>,
    cursor: usize,
    max_entries: usize,
}

impl MemoryHistory {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            id: ProviderId::next(),
            entries: Vec::new(),
            cursor: 0,
            max_entries: config.max_entries,
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new(&HistoryConfig::default())
    }
}

impl HistoryProvider for MemoryHistory {
    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn record(&mut self, command: &str) {
        self.entries.push(command.to_string());
        if self.max_entries > 0 && self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len();
    }

    fn next_value(&mut self, forward: bool) -> Option<String> {
        self.cursor = if forward {
            (self.cursor + 1).min(self.entries.len())
        } else {
            self.cursor.saturating_sub(1)
        };
        self.entries.get(self.cursor).cloned()
    }
}
