use crate::error::TypeError;
use crate::types::{Modifier, Platform};
use std::fmt;

/// Named (non-character) keys known to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Null,
    Cancel,
    Help,
    Backspace,
    Tab,
    Clear,
    Return,
    Enter,
    Shift,
    Control,
    Alt,
    Pause,
    Escape,
    Space,
    PageUp,
    PageDown,
    End,
    Home,
    ArrowLeft,
    ArrowUp,
    ArrowRight,
    ArrowDown,
    Insert,
    Delete,
    Semicolon,
    Equal,
    NumberPad(u8),
    Multiply,
    Add,
    Separator,
    Subtract,
    Decimal,
    Divide,
    F(u8),
    Meta,
}

/// Name -> key table. The first entry for a key is its canonical name.
pub const NAMED_KEYS: &[(&str, NamedKey)] = &[
    ("Null", NamedKey::Null),
    ("Cancel", NamedKey::Cancel),
    ("Help", NamedKey::Help),
    ("Backspace", NamedKey::Backspace),
    ("BackSpace", NamedKey::Backspace),
    ("Tab", NamedKey::Tab),
    ("Clear", NamedKey::Clear),
    ("Return", NamedKey::Return),
    ("Enter", NamedKey::Enter),
    ("Shift", NamedKey::Shift),
    ("LeftShift", NamedKey::Shift),
    ("Control", NamedKey::Control),
    ("LeftControl", NamedKey::Control),
    ("Ctrl", NamedKey::Control),
    ("Alt", NamedKey::Alt),
    ("LeftAlt", NamedKey::Alt),
    ("Pause", NamedKey::Pause),
    ("Escape", NamedKey::Escape),
    ("Space", NamedKey::Space),
    ("PageUp", NamedKey::PageUp),
    ("PageDown", NamedKey::PageDown),
    ("End", NamedKey::End),
    ("Home", NamedKey::Home),
    ("ArrowLeft", NamedKey::ArrowLeft),
    ("Left", NamedKey::ArrowLeft),
    ("ArrowUp", NamedKey::ArrowUp),
    ("Up", NamedKey::ArrowUp),
    ("ArrowRight", NamedKey::ArrowRight),
    ("Right", NamedKey::ArrowRight),
    ("ArrowDown", NamedKey::ArrowDown),
    ("Down", NamedKey::ArrowDown),
    ("Insert", NamedKey::Insert),
    ("Delete", NamedKey::Delete),
    ("Semicolon", NamedKey::Semicolon),
    ("Equal", NamedKey::Equal),
    ("NumberPad0", NamedKey::NumberPad(0)),
    ("NumberPad1", NamedKey::NumberPad(1)),
    ("NumberPad2", NamedKey::NumberPad(2)),
    ("NumberPad3", NamedKey::NumberPad(3)),
    ("NumberPad4", NamedKey::NumberPad(4)),
    ("NumberPad5", NamedKey::NumberPad(5)),
    ("NumberPad6", NamedKey::NumberPad(6)),
    ("NumberPad7", NamedKey::NumberPad(7)),
    ("NumberPad8", NamedKey::NumberPad(8)),
    ("NumberPad9", NamedKey::NumberPad(9)),
    ("Multiply", NamedKey::Multiply),
    ("Add", NamedKey::Add),
    ("Separator", NamedKey::Separator),
    ("Subtract", NamedKey::Subtract),
    ("Decimal", NamedKey::Decimal),
    ("Divide", NamedKey::Divide),
    ("F1", NamedKey::F(1)),
    ("F2", NamedKey::F(2)),
    ("F3", NamedKey::F(3)),
    ("F4", NamedKey::F(4)),
    ("F5", NamedKey::F(5)),
    ("F6", NamedKey::F(6)),
    ("F7", NamedKey::F(7)),
    ("F8", NamedKey::F(8)),
    ("F9", NamedKey::F(9)),
    ("F10", NamedKey::F(10)),
    ("F11", NamedKey::F(11)),
    ("F12", NamedKey::F(12)),
    ("Meta", NamedKey::Meta),
    ("Command", NamedKey::Meta),
];

/// US layout pairs: (unshifted, shifted).
const US_SHIFT_PAIRS: &[(char, char)] = &[
    ('`', '~'),
    ('1', '!'),
    ('2', '@'),
    ('3', '#'),
    ('4', '$'),
    ('5', '%'),
    ('6', '^'),
    ('7', '&'),
    ('8', '*'),
    ('9', '('),
    ('0', ')'),
    ('-', '_'),
    ('=', '+'),
    ('[', '{'),
    (']', '}'),
    ('\\', '|'),
    (';', ':'),
    ('\'', '"'),
    (',', '<'),
    ('.', '>'),
    ('/', '?'),
];

impl NamedKey {
    pub fn from_name(name: &str) -> Option<Self> {
        NAMED_KEYS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, key)| *key)
    }

    pub fn name(self) -> &'static str {
        NAMED_KEYS
            .iter()
            .find(|(_, key)| *key == self)
            .map(|(n, _)| *n)
            .unwrap_or("Unidentified")
    }

    /// DOM-style key code.
    pub const fn key_code(self) -> u16 {
        match self {
            NamedKey::Null => 0,
            NamedKey::Cancel => 3,
            NamedKey::Help => 6,
            NamedKey::Backspace => 8,
            NamedKey::Tab => 9,
            NamedKey::Clear => 12,
            NamedKey::Return | NamedKey::Enter => 13,
            NamedKey::Shift => 16,
            NamedKey::Control => 17,
            NamedKey::Alt => 18,
            NamedKey::Pause => 19,
            NamedKey::Escape => 27,
            NamedKey::Space => 32,
            NamedKey::PageUp => 33,
            NamedKey::PageDown => 34,
            NamedKey::End => 35,
            NamedKey::Home => 36,
            NamedKey::ArrowLeft => 37,
            NamedKey::ArrowUp => 38,
            NamedKey::ArrowRight => 39,
            NamedKey::ArrowDown => 40,
            NamedKey::Insert => 45,
            NamedKey::Delete => 46,
            NamedKey::Meta => 91,
            NamedKey::NumberPad(n) => 96 + n as u16,
            NamedKey::Multiply => 106,
            NamedKey::Add => 107,
            NamedKey::Separator => 108,
            NamedKey::Subtract => 109,
            NamedKey::Decimal => 110,
            NamedKey::Divide => 111,
            NamedKey::F(n) => 111 + n as u16,
            NamedKey::Semicolon => 186,
            NamedKey::Equal => 187,
        }
    }

    pub const fn code_point(self) -> Option<char> {
        match self {
            NamedKey::Return | NamedKey::Enter => Some('\n'),
            NamedKey::Space => Some(' '),
            NamedKey::Semicolon => Some(';'),
            NamedKey::Equal => Some('='),
            NamedKey::NumberPad(n) => Some((b'0' + n) as char),
            NamedKey::Multiply => Some('*'),
            NamedKey::Add => Some('+'),
            NamedKey::Separator => Some(','),
            NamedKey::Subtract => Some('-'),
            NamedKey::Decimal => Some('.'),
            NamedKey::Divide => Some('/'),
            _ => None,
        }
    }

    pub const fn modifier(self) -> Option<Modifier> {
        match self {
            NamedKey::Shift => Some(Modifier::Shift),
            NamedKey::Control => Some(Modifier::Control),
            NamedKey::Alt => Some(Modifier::Alt),
            NamedKey::Meta => Some(Modifier::Meta),
            _ => None,
        }
    }
}

impl Modifier {
    pub const fn key(self) -> NamedKey {
        match self {
            Modifier::Shift => NamedKey::Shift,
            Modifier::Control => NamedKey::Control,
            Modifier::Alt => NamedKey::Alt,
            Modifier::Meta => NamedKey::Meta,
        }
    }
}

/// Identity of a resolved key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Named(NamedKey),
    Char(char),
}

/// Immutable description of one physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyDescriptor {
    pub key: Key,
    /// Character produced by a press, if any.
    pub code_point: Option<char>,
    pub key_code: u16,
    pub modifier: Option<Modifier>,
    /// Requires Shift on the US layout.
    pub shifted: bool,
}

impl KeyDescriptor {
    pub const fn named(key: NamedKey) -> Self {
        Self {
            key: Key::Named(key),
            code_point: key.code_point(),
            key_code: key.key_code(),
            modifier: key.modifier(),
            shifted: false,
        }
    }

    pub const fn is_modifier(&self) -> bool {
        self.modifier.is_some()
    }

    pub const fn is_printable(&self) -> bool {
        self.code_point.is_some()
    }

    pub fn named_key(&self) -> Option<NamedKey> {
        match self.key {
            Key::Named(k) => Some(k),
            Key::Char(_) => None,
        }
    }
}

impl fmt::Display for KeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            Key::Named(k) => f.write_str(k.name()),
            Key::Char(c) => write!(f, "{}", c),
        }
    }
}

/// Static key lookup, resolved against a configured platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCatalog {
    platform: Platform,
}

impl KeyCatalog {
    pub const fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolves a key name. Single-character names resolve as that character.
    pub fn resolve(&self, name: &str) -> Result<KeyDescriptor, TypeError> {
        if let Some(key) = NamedKey::from_name(name) {
            return Ok(KeyDescriptor::named(key));
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(self.resolve_char(c)),
            _ => Err(TypeError::UnknownKey(name.to_string())),
        }
    }

    pub fn resolve_char(&self, c: char) -> KeyDescriptor {
        match c {
            '\n' | '\r' => return KeyDescriptor::named(NamedKey::Enter),
            '\t' => return KeyDescriptor::named(NamedKey::Tab),
            _ => {}
        }

        let (key_code, shifted) = if c.is_ascii_lowercase() {
            (c.to_ascii_uppercase() as u16, false)
        } else if c.is_ascii_uppercase() {
            (c as u16, true)
        } else if c.is_ascii_digit() || c == ' ' {
            (c as u16, false)
        } else if let Some((base, _)) = US_SHIFT_PAIRS.iter().find(|(base, _)| *base == c) {
            (punctuation_key_code(*base), false)
        } else if let Some((base, _)) = US_SHIFT_PAIRS.iter().find(|(_, up)| *up == c) {
            (punctuation_key_code(*base), true)
        } else {
            // Outside the US layout: typed directly, no implicit Shift.
            (0, false)
        };

        KeyDescriptor {
            key: Key::Char(c),
            code_point: Some(c),
            key_code,
            modifier: None,
            shifted,
        }
    }

    /// The glyph a character key produces while Shift is held.
    pub fn shifted(&self, descriptor: KeyDescriptor) -> KeyDescriptor {
        let Key::Char(c) = descriptor.key else {
            return descriptor;
        };
        let up = if c.is_ascii_lowercase() {
            c.to_ascii_uppercase()
        } else if let Some((_, up)) = US_SHIFT_PAIRS.iter().find(|(base, _)| *base == c) {
            *up
        } else {
            return descriptor;
        };
        self.resolve_char(up)
    }

    pub fn modifier(&self, modifier: Modifier) -> KeyDescriptor {
        KeyDescriptor::named(modifier.key())
    }

    pub fn home_equivalent(&self) -> KeyDescriptor {
        if self.platform.is_mac() {
            KeyDescriptor::named(NamedKey::ArrowUp)
        } else {
            KeyDescriptor::named(NamedKey::Home)
        }
    }

    pub fn end_equivalent(&self) -> KeyDescriptor {
        if self.platform.is_mac() {
            KeyDescriptor::named(NamedKey::ArrowDown)
        } else {
            KeyDescriptor::named(NamedKey::End)
        }
    }

    pub fn primary_modifier(&self) -> KeyDescriptor {
        self.modifier(self.primary_modifier_kind())
    }

    pub const fn primary_modifier_kind(&self) -> Modifier {
        if self.platform.is_mac() {
            Modifier::Meta
        } else {
            Modifier::Control
        }
    }
}

fn punctuation_key_code(base: char) -> u16 {
    match base {
        ';' => 186,
        '=' => 187,
        ',' => 188,
        '-' => 189,
        '.' => 190,
        '/' => 191,
        '`' => 192,
        '[' => 219,
        '\\' => 220,
        ']' => 221,
        '\'' => 222,
        // Digits share the number row codes.
        d => d as u16,
    }
}
