use crate::key_catalog::KeyDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys that can be held as part of a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Shift,
    Control,
    Alt,
    Meta,
}

/// Modifier keys applied to a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const fn none() -> Self {
        Self {
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    pub const fn is_empty(self) -> bool {
        !(self.ctrl || self.shift || self.alt || self.meta)
    }

    pub const fn contains(self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Shift => self.shift,
            Modifier::Control => self.ctrl,
            Modifier::Alt => self.alt,
            Modifier::Meta => self.meta,
        }
    }

    pub fn set(&mut self, modifier: Modifier, held: bool) {
        match modifier {
            Modifier::Shift => self.shift = held,
            Modifier::Control => self.ctrl = held,
            Modifier::Alt => self.alt = held,
            Modifier::Meta => self.meta = held,
        }
    }

    /// Any held modifier other than Shift turns a character key into a shortcut,
    /// so no character reaches the surface.
    pub const fn suppresses_press(self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// Host convention used for Home/End equivalents and the primary shortcut modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
}

impl Platform {
    /// Platform of the build target. Only used as a default; callers pass the
    /// platform explicitly through `Profile`.
    pub const fn host() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    pub const fn is_mac(self) -> bool {
        matches!(self, Self::MacOs)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::host()
    }
}

/// One element of a logical key sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum KeyInput {
    /// A character typed as-is.
    Literal(char),
    /// A named key from the catalog (e.g. "ArrowLeft", "F8").
    /// Modifier names given here toggle the modifier as well.
    Named(String),
    /// Explicit hold/release of a modifier.
    ModifierToggle(String),
}

impl KeyInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn toggle(name: impl Into<String>) -> Self {
        Self::ModifierToggle(name.into())
    }

    /// Expands plain text into literal inputs.
    pub fn literals(text: &str) -> impl Iterator<Item = KeyInput> + '_ {
        text.chars().map(KeyInput::Literal)
    }
}

pub type KeySequence = Vec<KeyInput>;

/// Phase of a synthesized low-level key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyPhase {
    Down,
    Press,
    Up,
}

impl KeyPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Press => "press",
            Self::Up => "up",
        }
    }
}

/// Event to be dispatched to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub phase: KeyPhase,
    pub key: KeyDescriptor,
    /// Modifiers held at emission time.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub const fn new(phase: KeyPhase, key: KeyDescriptor, modifiers: Modifiers) -> Self {
        Self {
            phase,
            key,
            modifiers,
        }
    }

    /// Listener-style line, e.g. `down: 37`.
    pub fn describe(&self) -> String {
        format!("{}: {}", self.phase.as_str(), self.key.key_code)
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.phase.as_str(), self.key)
    }
}

/// Events dispatched by one typing call, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingReport {
    pub events: Vec<KeyEvent>,
}

impl TypingReport {
    pub fn count(&self, phase: KeyPhase) -> usize {
        self.events.iter().filter(|e| e.phase == phase).count()
    }

    /// Counts events of `phase` whose key displays as `name`.
    pub fn count_key(&self, phase: KeyPhase, name: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.phase == phase && e.key.to_string() == name)
            .count()
    }

    pub fn modifier_balanced(&self, modifier: Modifier) -> bool {
        let of = |phase| {
            self.events
                .iter()
                .filter(|e| e.phase == phase && e.key.modifier == Some(modifier))
                .count()
        };
        of(KeyPhase::Down) == of(KeyPhase::Up)
    }

    pub fn describe(&self) -> Vec<String> {
        self.events.iter().map(KeyEvent::describe).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_suppress_press() {
        let mut mods = Modifiers::none();
        assert!(mods.is_empty());
        mods.set(Modifier::Shift, true);
        assert!(!mods.suppresses_press());
        mods.set(Modifier::Control, true);
        assert!(mods.suppresses_press());
        assert!(mods.contains(Modifier::Control));
        mods.set(Modifier::Control, false);
        mods.set(Modifier::Shift, false);
        assert!(mods.is_empty());
    }

    #[test]
    fn test_key_input_serde_shape() {
        let seq = vec![
            KeyInput::Literal('a'),
            KeyInput::named("ArrowLeft"),
            KeyInput::toggle("Shift"),
        ];
        let json = serde_json::to_string(&seq).expect("serialize");
        assert_eq!(
            json,
            r#"[{"kind":"Literal","value":"a"},{"kind":"Named","value":"ArrowLeft"},{"kind":"ModifierToggle","value":"Shift"}]"#
        );
        let back: KeySequence = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, seq);
    }
}
