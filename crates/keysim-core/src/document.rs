//! In-memory stand-in for the browser side: elements, frames and key listeners.

use crate::error::SurfaceError;
use crate::surface::{Caret, Driver, Surface, SurfaceKind};
use crate::types::{KeyEvent, KeyPhase};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

/// Which default action an element vetoes from its key listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuppressPolicy {
    #[default]
    None,
    /// `preventDefault()` on key-down: no press, no content change.
    KeyDown,
    /// `preventDefault()` on key-press: the press fires but inserts nothing.
    KeyPress,
}

/// Notification delivered to element subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchRecord {
    Focus { element: String },
    Key { element: String, event: KeyEvent },
}

/// Rich content kept as text runs; edits touch only the runs they overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichText {
    runs: Vec<String>,
}

impl Default for RichText {
    fn default() -> Self {
        Self {
            runs: vec![String::new()],
        }
    }
}

impl RichText {
    pub fn from_runs<I, S>(runs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut text = Self {
            runs: runs.into_iter().map(Into::into).collect(),
        };
        if text.runs.is_empty() {
            text.runs.push(String::new());
        }
        text
    }

    pub fn runs(&self) -> &[String] {
        &self.runs
    }

    pub fn text(&self) -> String {
        self.runs.concat()
    }

    /// Replaces the flattened text, splicing only the changed span.
    pub fn set_text(&mut self, text: &str) {
        let old: Vec<char> = self.text().chars().collect();
        let new: Vec<char> = text.chars().collect();

        let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
        let max_suffix = old.len().min(new.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        let (del_start, del_end) = (prefix, old.len() - suffix);
        let inserted: String = new[prefix..new.len() - suffix].iter().collect();

        let mut offset = 0;
        let mut placed = false;
        for run in self.runs.iter_mut() {
            let chars: Vec<char> = run.chars().collect();
            let (start, end) = (offset, offset + chars.len());
            offset = end;

            let lo = del_start.clamp(start, end) - start;
            let hi = del_end.clamp(start, end) - start;
            let owns_insert = !placed && (start..=end).contains(&del_start);
            if lo == hi && !owns_insert {
                continue;
            }

            let mut next: String = chars[..lo].iter().collect();
            if owns_insert {
                next.push_str(&inserted);
                placed = true;
            }
            next.extend(&chars[hi..]);
            *run = next;
        }

        self.runs.retain(|r| !r.is_empty());
        if self.runs.is_empty() {
            self.runs.push(String::new());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Plain(String),
    Rich(RichText),
}

/// One editable element with a key listener log.
#[derive(Debug)]
pub struct Element {
    id: String,
    kind: SurfaceKind,
    value: Value,
    caret: Caret,
    focused: bool,
    detached: bool,
    suppress: SuppressPolicy,
    remove_on_press: Option<char>,
    log: Vec<String>,
    listeners: Vec<Sender<DispatchRecord>>,
}

impl Element {
    fn new(id: &str, kind: SurfaceKind, value: Value) -> Self {
        Self {
            id: id.to_string(),
            kind,
            value,
            caret: Caret::default(),
            focused: false,
            detached: false,
            suppress: SuppressPolicy::None,
            remove_on_press: None,
            log: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn plain_field(id: &str) -> Self {
        Self::new(id, SurfaceKind::PlainField, Value::Plain(String::new()))
    }

    pub fn text_area(id: &str) -> Self {
        Self::new(id, SurfaceKind::TextArea, Value::Plain(String::new()))
    }

    pub fn content_editable<I, S>(id: &str, runs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            id,
            SurfaceKind::ContentEditable,
            Value::Rich(RichText::from_runs(runs)),
        )
    }

    /// Editable body of a nested frame.
    pub fn frame_body<I, S>(id: &str, runs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            id,
            SurfaceKind::CrossFrameActiveElement,
            Value::Rich(RichText::from_runs(runs)),
        )
    }

    pub fn with_value(mut self, text: &str) -> Self {
        self.write_value(text);
        self
    }

    pub fn with_suppress(mut self, policy: SuppressPolicy) -> Self {
        self.suppress = policy;
        self
    }

    /// Detaches the element once a press of `c` has been delivered.
    pub fn with_remove_on_press(mut self, c: char) -> Self {
        self.remove_on_press = Some(c);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current value (flattened for rich content).
    pub fn value(&self) -> String {
        match &self.value {
            Value::Plain(s) => s.clone(),
            Value::Rich(rich) => rich.text(),
        }
    }

    pub fn runs(&self) -> Option<&[String]> {
        match &self.value {
            Value::Plain(_) => None,
            Value::Rich(rich) => Some(rich.runs()),
        }
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn subscribe(&mut self) -> Receiver<DispatchRecord> {
        let (tx, rx) = unbounded();
        self.listeners.push(tx);
        rx
    }

    /// Empties the value and drops focus.
    pub fn clear(&mut self) {
        self.write_value("");
        self.caret = Caret::default();
        self.focused = false;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    fn write_value(&mut self, text: &str) {
        match &mut self.value {
            Value::Plain(s) => *s = text.to_string(),
            Value::Rich(rich) => rich.set_text(text),
        }
    }

    fn notify(&mut self, record: DispatchRecord) {
        self.listeners.retain(|tx| tx.send(record.clone()).is_ok());
    }

    fn attached(&self) -> Result<(), SurfaceError> {
        if self.detached {
            Err(SurfaceError::Detached)
        } else {
            Ok(())
        }
    }
}

impl Surface for Element {
    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn focus(&mut self) -> Result<(), SurfaceError> {
        self.attached()?;
        if !self.focused {
            self.focused = true;
            let end = self.value().chars().count();
            self.caret = Caret {
                index: end,
                anchor: None,
            };
            self.log.push("focus".to_string());
            self.notify(DispatchRecord::Focus {
                element: self.id.clone(),
            });
        }
        Ok(())
    }

    fn text(&self) -> Result<String, SurfaceError> {
        self.attached()?;
        Ok(self.value())
    }

    fn set_text(&mut self, text: &str) -> Result<(), SurfaceError> {
        self.attached()?;
        self.write_value(text);
        Ok(())
    }

    fn caret(&self) -> Result<Caret, SurfaceError> {
        self.attached()?;
        Ok(self.caret)
    }

    fn set_caret(&mut self, caret: Caret) -> Result<(), SurfaceError> {
        self.attached()?;
        self.caret = caret;
        Ok(())
    }

    fn suppresses_default(&self, event: &KeyEvent) -> bool {
        match self.suppress {
            SuppressPolicy::None => false,
            SuppressPolicy::KeyDown => event.phase == KeyPhase::Down,
            SuppressPolicy::KeyPress => event.phase == KeyPhase::Press,
        }
    }

    fn dispatch(&mut self, event: &KeyEvent) -> Result<bool, SurfaceError> {
        self.attached()?;
        self.log.push(event.describe());
        self.notify(DispatchRecord::Key {
            element: self.id.clone(),
            event: *event,
        });

        if event.phase == KeyPhase::Press {
            if let (Some(c), Some(trigger)) = (event.key.code_point, self.remove_on_press) {
                if c == trigger {
                    self.log.push(format!("{} pressed; removing", c));
                    self.detached = true;
                    debug!("Element {} removed by its press listener", self.id);
                }
            }
        }

        Ok(!self.suppresses_default(event))
    }
}

/// Nested browsing context with its own elements and focus.
#[derive(Debug)]
pub struct Frame {
    name: String,
    elements: Vec<Element>,
    active: Option<String>,
}

impl Frame {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            elements: Vec::new(),
            active: None,
        }
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// Adds `element` and makes it the frame's focused element.
    pub fn with_active(mut self, element: Element) -> Self {
        self.active = Some(element.id.clone());
        self.elements.push(element);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }
}

/// Top-level document implementing the driver capability.
#[derive(Debug, Default)]
pub struct Document {
    elements: Vec<Element>,
    frames: Vec<Frame>,
    current_frame: Option<usize>,
    active: Option<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    /// Marks `id` as the focused element of the top-level document.
    pub fn set_active(&mut self, id: &str) {
        self.active = Some(id.to_string());
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn frame(&self, name: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.name == name)
    }

    pub fn current_frame(&self) -> Option<&str> {
        self.current_frame.map(|i| self.frames[i].name.as_str())
    }

    fn context(&mut self) -> (&mut Vec<Element>, Option<&str>) {
        match self.current_frame {
            Some(i) => {
                let frame = &mut self.frames[i];
                (&mut frame.elements, frame.active.as_deref())
            }
            None => (&mut self.elements, self.active.as_deref()),
        }
    }
}

impl Driver for Document {
    fn locate(&mut self, selector: &str) -> Result<&mut dyn Surface, SurfaceError> {
        let id = selector.trim_start_matches('#');
        let (elements, _) = self.context();
        elements
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| e as &mut dyn Surface)
            .ok_or_else(|| SurfaceError::NoSuchElement(id.to_string()))
    }

    fn switch_to_frame(&mut self, name: &str) -> Result<(), SurfaceError> {
        match self.frames.iter().position(|f| f.name == name) {
            Some(i) => {
                self.current_frame = Some(i);
                Ok(())
            }
            None => {
                warn!("Frame {} not found", name);
                Err(SurfaceError::NoSuchFrame(name.to_string()))
            }
        }
    }

    fn switch_to_default_content(&mut self) {
        self.current_frame = None;
    }

    fn active_element(&mut self) -> Result<&mut dyn Surface, SurfaceError> {
        let (elements, active) = self.context();
        let id = active.ok_or(SurfaceError::NoActiveElement)?.to_string();
        elements
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| e as &mut dyn Surface)
            .ok_or(SurfaceError::NoActiveElement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_catalog::KeyDescriptor;
    use crate::types::Modifiers;

    #[test]
    fn test_rich_text_edit_keeps_untouched_runs() {
        let mut rich = RichText::from_runs(["Hello ", "brave ", "world"]);
        rich.set_text("Hello brave new world");
        assert_eq!(rich.runs(), &["Hello ", "brave new ", "world"]);
        rich.set_text("Hello world");
        assert_eq!(rich.runs(), &["Hello ", "world"]);
    }

    #[test]
    fn test_rich_text_deletion_across_runs() {
        let mut rich = RichText::from_runs(["ab", "cd", "ef"]);
        rich.set_text("af");
        assert_eq!(rich.text(), "af");
        assert_eq!(rich.runs(), &["a", "f"]);
        rich.set_text("");
        assert_eq!(rich.runs(), &[""]);
    }

    #[test]
    fn test_focus_places_caret_at_end_once() {
        let mut el = Element::plain_field("name").with_value("abc");
        el.focus().expect("focus");
        assert_eq!(el.caret().expect("caret").index, 3);
        el.set_caret(Caret {
            index: 1,
            anchor: None,
        })
        .expect("set caret");
        el.focus().expect("refocus");
        assert_eq!(el.caret().expect("caret").index, 1);
        assert_eq!(el.log(), &["focus"]);
    }

    #[test]
    fn test_dispatch_streams_to_subscribers() {
        let mut el = Element::plain_field("keyReporter");
        let rx = el.subscribe();
        el.focus().expect("focus");
        let down = KeyEvent::new(
            KeyPhase::Down,
            KeyDescriptor::named(crate::key_catalog::NamedKey::ArrowLeft),
            Modifiers::none(),
        );
        assert_eq!(el.dispatch(&down), Ok(true));
        let records: Vec<DispatchRecord> = rx.try_iter().collect();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0], DispatchRecord::Focus { .. }));
        assert!(matches!(
            records[1],
            DispatchRecord::Key { ref event, .. } if event.phase == KeyPhase::Down
        ));
    }

    #[test]
    fn test_detached_element_rejects_io() {
        let mut el = Element::plain_field("target").with_remove_on_press('a');
        let press = KeyEvent::new(
            KeyPhase::Press,
            crate::key_catalog::KeyCatalog::new(crate::types::Platform::Linux).resolve_char('a'),
            Modifiers::none(),
        );
        assert_eq!(el.dispatch(&press), Ok(true));
        assert!(el.is_detached());
        assert_eq!(el.dispatch(&press), Err(SurfaceError::Detached));
        assert_eq!(el.set_text("x"), Err(SurfaceError::Detached));
        assert_eq!(el.log().last().map(String::as_str), Some("a pressed; removing"));
    }

    #[test]
    fn test_frame_switch_and_active_element() {
        let mut doc = Document::new()
            .with_element(Element::plain_field("outside"))
            .with_frame(Frame::new("editFrame").with_active(Element::frame_body("theBody", [""])));

        assert!(doc.active_element().is_err());
        assert_eq!(
            doc.switch_to_frame("missing"),
            Err(SurfaceError::NoSuchFrame("missing".into()))
        );
        doc.switch_to_frame("editFrame").expect("switch");
        let active = doc.active_element().expect("active");
        assert_eq!(active.kind(), SurfaceKind::CrossFrameActiveElement);
        assert!(doc.locate("outside").is_err());

        doc.switch_to_default_content();
        assert!(doc.locate("#outside").is_ok());
    }
}
