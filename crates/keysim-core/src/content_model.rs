//! Text buffer snapshots and the transitions key events drive through them.
//!
//! Transitions are pure: each takes the current [`TextBuffer`] and returns the
//! next one. The only side channel is the clipboard, touched by cut, copy and
//! paste shortcuts.

use crate::clipboard::Clipboard;
use crate::key_catalog::{Key, KeyCatalog, NamedKey};
use crate::surface::SurfaceKind;
use crate::types::{KeyEvent, KeyPhase, Modifier, Modifiers};
use std::ops::Range;

/// Content, caret and optional selection anchor of one surface.
///
/// Indices count characters. `caret <= len()` always holds, and a set anchor
/// selects `min(anchor, caret)..max(anchor, caret)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    content: Vec<char>,
    caret: usize,
    anchor: Option<usize>,
}

impl TextBuffer {
    /// Buffer with the caret at the end.
    pub fn new(text: &str) -> Self {
        let content: Vec<char> = text.chars().collect();
        let caret = content.len();
        Self {
            content,
            caret,
            anchor: None,
        }
    }

    /// Buffer with an explicit caret; positions are clamped to the content.
    pub fn with_caret(text: &str, caret: usize, anchor: Option<usize>) -> Self {
        let content: Vec<char> = text.chars().collect();
        let len = content.len();
        Self {
            content,
            caret: caret.min(len),
            anchor: anchor.map(|a| a.min(len)),
        }
    }

    pub fn text(&self) -> String {
        self.content.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// Non-empty selected range, if any.
    pub fn selection(&self) -> Option<Range<usize>> {
        let anchor = self.anchor?;
        if anchor == self.caret {
            return None;
        }
        Some(anchor.min(self.caret)..anchor.max(self.caret))
    }

    pub fn selected_text(&self) -> Option<String> {
        self.selection().map(|r| self.content[r].iter().collect())
    }

    /// Replaces the selection (or inserts at the caret) and collapses.
    fn insert(&self, text: &[char]) -> Self {
        let range = self.selection().unwrap_or(self.caret..self.caret);
        self.splice(range, text)
    }

    fn splice(&self, range: Range<usize>, text: &[char]) -> Self {
        let mut content = Vec::with_capacity(self.content.len() + text.len());
        content.extend_from_slice(&self.content[..range.start]);
        content.extend_from_slice(text);
        content.extend_from_slice(&self.content[range.end..]);
        Self {
            content,
            caret: range.start + text.len(),
            anchor: None,
        }
    }

    fn move_to(&self, target: usize, extend: bool) -> Self {
        let anchor = if extend {
            Some(self.anchor.unwrap_or(self.caret))
        } else {
            None
        };
        Self {
            content: self.content.clone(),
            caret: target.min(self.content.len()),
            anchor,
        }
    }

    fn step_left(&self, extend: bool) -> Self {
        match self.selection() {
            Some(range) if !extend => self.move_to(range.start, false),
            _ => self.move_to(self.caret.saturating_sub(1), extend),
        }
    }

    fn step_right(&self, extend: bool) -> Self {
        match self.selection() {
            Some(range) if !extend => self.move_to(range.end, false),
            _ => self.move_to(self.caret + 1, extend),
        }
    }

    fn delete_forward(&self) -> Self {
        match self.selection() {
            Some(range) => self.splice(range, &[]),
            None if self.caret < self.content.len() => {
                let mut next = self.splice(self.caret..self.caret + 1, &[]);
                next.caret = self.caret;
                next
            }
            None => self.collapsed(),
        }
    }

    fn delete_backward(&self) -> Self {
        match self.selection() {
            Some(range) => self.splice(range, &[]),
            None if self.caret > 0 => self.splice(self.caret - 1..self.caret, &[]),
            None => self.collapsed(),
        }
    }

    fn collapsed(&self) -> Self {
        self.move_to(self.caret, false)
    }

    fn line_start(&self, index: usize) -> usize {
        self.content[..index]
            .iter()
            .rposition(|c| *c == '\n')
            .map_or(0, |nl| nl + 1)
    }

    fn line_end(&self, index: usize) -> usize {
        self.content[index..]
            .iter()
            .position(|c| *c == '\n')
            .map_or(self.content.len(), |nl| index + nl)
    }

    fn line_up(&self, extend: bool) -> Self {
        let start = self.line_start(self.caret);
        if start == 0 {
            return self.move_to(0, extend);
        }
        let column = self.caret - start;
        let prev_start = self.line_start(start - 1);
        let prev_len = (start - 1) - prev_start;
        self.move_to(prev_start + column.min(prev_len), extend)
    }

    fn line_down(&self, extend: bool) -> Self {
        let end = self.line_end(self.caret);
        if end == self.content.len() {
            return self.move_to(end, extend);
        }
        let column = self.caret - self.line_start(self.caret);
        let next_start = end + 1;
        let next_len = self.line_end(next_start) - next_start;
        self.move_to(next_start + column.min(next_len), extend)
    }
}

/// Applies key events to a [`TextBuffer`] the way a focused surface of one
/// kind would.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentModel {
    multiline: bool,
    primary: Modifier,
    /// ArrowUp/ArrowDown act as Home/End (Mac convention).
    vertical_home_end: bool,
}

impl ContentModel {
    pub fn new(catalog: &KeyCatalog, kind: SurfaceKind) -> Self {
        Self {
            multiline: kind.is_multiline(),
            primary: catalog.primary_modifier_kind(),
            vertical_home_end: catalog.platform().is_mac(),
        }
    }

    /// Next buffer after `event`. Presses insert characters; key-downs drive
    /// navigation, deletion and shortcuts. Key-ups never change content.
    pub fn apply(
        &self,
        buffer: &TextBuffer,
        event: &KeyEvent,
        clipboard: &mut dyn Clipboard,
    ) -> TextBuffer {
        match (event.phase, event.key.key) {
            (KeyPhase::Press, _) => match event.key.code_point {
                Some('\n') if !self.multiline => buffer.clone(),
                Some(c) => buffer.insert(&[c]),
                None => buffer.clone(),
            },
            (KeyPhase::Down, Key::Named(key)) => self.navigate(buffer, key, event.modifiers),
            (KeyPhase::Down, Key::Char(c)) if event.modifiers.contains(self.primary) => {
                self.shortcut(buffer, c, clipboard)
            }
            _ => buffer.clone(),
        }
    }

    fn navigate(&self, buffer: &TextBuffer, key: NamedKey, mods: Modifiers) -> TextBuffer {
        let extend = mods.shift;
        match key {
            NamedKey::ArrowLeft => buffer.step_left(extend),
            NamedKey::ArrowRight => buffer.step_right(extend),
            NamedKey::Home => buffer.move_to(0, extend),
            NamedKey::End => buffer.move_to(buffer.len(), extend),
            NamedKey::ArrowUp if self.vertical_home_end => buffer.move_to(0, extend),
            NamedKey::ArrowDown if self.vertical_home_end => buffer.move_to(buffer.len(), extend),
            NamedKey::ArrowUp if self.multiline => buffer.line_up(extend),
            NamedKey::ArrowDown if self.multiline => buffer.line_down(extend),
            NamedKey::Delete => buffer.delete_forward(),
            NamedKey::Backspace => buffer.delete_backward(),
            // PageUp/PageDown, single-line ArrowUp/ArrowDown, function and
            // control keys leave the buffer alone.
            _ => buffer.clone(),
        }
    }

    fn shortcut(&self, buffer: &TextBuffer, c: char, clipboard: &mut dyn Clipboard) -> TextBuffer {
        match c.to_ascii_lowercase() {
            'x' => match (buffer.selection(), buffer.selected_text()) {
                (Some(range), Some(text)) => {
                    clipboard.write(text);
                    buffer.splice(range, &[])
                }
                _ => buffer.clone(),
            },
            'c' => {
                if let Some(text) = buffer.selected_text() {
                    clipboard.write(text);
                }
                buffer.clone()
            }
            'v' => {
                let pasted: Vec<char> = clipboard.read().chars().collect();
                buffer.insert(&pasted)
            }
            'a' if !buffer.is_empty() => TextBuffer {
                content: buffer.content.clone(),
                caret: buffer.len(),
                anchor: Some(0),
            },
            _ => buffer.clone(),
        }
    }
}
