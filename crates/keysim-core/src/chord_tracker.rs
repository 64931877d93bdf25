use crate::key_catalog::KeyDescriptor;
use crate::types::{Modifier, Modifiers};
use tracing::debug;

/// Modifiers currently held within one sequence, in acquisition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierState {
    held: Vec<Modifier>,
}

impl ModifierState {
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.held.contains(&modifier)
    }

    pub fn held(&self) -> &[Modifier] {
        &self.held
    }

    pub fn snapshot(&self) -> Modifiers {
        let mut mods = Modifiers::none();
        for m in &self.held {
            mods.set(*m, true);
        }
        mods
    }

    fn acquire(&mut self, modifier: Modifier) {
        if !self.contains(modifier) {
            self.held.push(modifier);
        }
    }

    fn release(&mut self, modifier: Modifier) -> bool {
        let before = self.held.len();
        self.held.retain(|m| *m != modifier);
        before != self.held.len()
    }
}

/// Outcome of feeding one key to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chord {
    /// Modifier is now held; emit its key-down with `held`.
    Hold { modifier: Modifier, held: Modifiers },
    /// Modifier was released; emit its key-up with the remaining `held`.
    Release { modifier: Modifier, held: Modifiers },
    /// Not a modifier; synthesize the keystroke under `held`.
    Forward { held: Modifiers },
}

/// Forced release produced by a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    pub modifier: Modifier,
    /// Modifiers still held after this release.
    pub remaining: Modifiers,
}

#[derive(Debug, Default)]
pub struct ChordTracker {
    state: ModifierState,
}

impl ChordTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ModifierState {
        &self.state
    }

    pub fn snapshot(&self) -> Modifiers {
        self.state.snapshot()
    }

    /// Toggles modifiers; forwards everything else with the current holds.
    pub fn press(&mut self, descriptor: &KeyDescriptor) -> Chord {
        let Some(modifier) = descriptor.modifier else {
            return Chord::Forward {
                held: self.snapshot(),
            };
        };

        if self.state.release(modifier) {
            Chord::Release {
                modifier,
                held: self.snapshot(),
            }
        } else {
            self.state.acquire(modifier);
            Chord::Hold {
                modifier,
                held: self.snapshot(),
            }
        }
    }

    /// Releases every held modifier, latest first.
    pub fn release_all(&mut self) -> Vec<Release> {
        let mut out = Vec::with_capacity(self.state.held.len());
        while let Some(modifier) = self.state.held.pop() {
            out.push(Release {
                modifier,
                remaining: self.snapshot(),
            });
        }
        out
    }

    /// Key-ups owed for modifiers left held when the sequence ends.
    pub fn flush_at_sequence_end(&mut self) -> Vec<Release> {
        let out = self.release_all();
        if !out.is_empty() {
            debug!("Releasing {} modifier(s) held at sequence end", out.len());
        }
        out
    }
}
