//! Named capability slots that providers install on a console.
//!
//! Each provider owns exactly one slot. Binding is idempotent and refuses to
//! displace a different holder, so swapping providers at runtime never leaves
//! two of them registered for the same job.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a provider instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(u64);

impl ProviderId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// The capabilities a console exposes to providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `define`: registering new command definitions.
    Define,
    /// Recording executed commands and cycling through them.
    History,
    /// Cycling through command-name completions.
    Autocomplete,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Self::Define => "define",
            Self::History => "history",
            Self::Autocomplete => "autocomplete",
        }
    }
}

/// Current holder of each capability slot.
#[derive(Debug, Default, Clone)]
pub struct Capabilities {
    define: Option<ProviderId>,
    history: Option<ProviderId>,
    autocomplete: Option<ProviderId>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, cap: Capability) -> Option<ProviderId> {
        match cap {
            Capability::Define => self.define,
            Capability::History => self.history,
            Capability::Autocomplete => self.autocomplete,
        }
    }

    fn slot_mut(&mut self, cap: Capability) -> &mut Option<ProviderId> {
        match cap {
            Capability::Define => &mut self.define,
            Capability::History => &mut self.history,
            Capability::Autocomplete => &mut self.autocomplete,
        }
    }

    /// Provider currently holding `cap`.
    pub fn holder(&self, cap: Capability) -> Option<ProviderId> {
        self.slot(cap)
    }

    /// Whether `id` holds `cap`.
    pub fn is_held_by(&self, cap: Capability, id: ProviderId) -> bool {
        self.slot(cap) == Some(id)
    }

    /// Install `id` into the `cap` slot. Returns `false` (and changes
    /// nothing) if another provider already holds it.
    pub fn install(&mut self, cap: Capability, id: ProviderId) -> bool {
        let slot = self.slot_mut(cap);
        match *slot {
            Some(holder) if holder != id => {
                log::warn!(
                    "capability '{}' already installed by another provider",
                    cap.name()
                );
                false
            },
            _ => {
                *slot = Some(id);
                true
            },
        }
    }

    /// Remove `id` from the `cap` slot. A no-op unless `id` is the holder.
    pub fn remove(&mut self, cap: Capability, id: ProviderId) -> bool {
        let slot = self.slot_mut(cap);
        if *slot == Some(id) {
            *slot = None;
            true
        } else {
            false
        }
    }

    /// Empty every slot.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
