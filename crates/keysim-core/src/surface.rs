use crate::content_model::TextBuffer;
use crate::error::SurfaceError;
use crate::types::KeyEvent;
use serde::{Deserialize, Serialize};

/// Editable surface variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceKind {
    PlainField,
    TextArea,
    ContentEditable,
    /// Focused element of a nested frame, reached through a frame switch.
    CrossFrameActiveElement,
}

impl SurfaceKind {
    pub const fn is_multiline(self) -> bool {
        !matches!(self, Self::PlainField)
    }

    /// Backed by a tree of text runs rather than a flat value.
    pub const fn is_rich(self) -> bool {
        matches!(self, Self::ContentEditable | Self::CrossFrameActiveElement)
    }
}

/// Caret position and selection anchor, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Caret {
    pub index: usize,
    pub anchor: Option<usize>,
}

/// Narrow view of one external editable element.
///
/// Implementations own all impure I/O; the typing core only reads and writes
/// through these methods and assumes exclusive access for one call.
pub trait Surface {
    fn kind(&self) -> SurfaceKind;

    /// Gives the surface keyboard focus before the first event of a sequence.
    fn focus(&mut self) -> Result<(), SurfaceError>;

    fn text(&self) -> Result<String, SurfaceError>;
    fn set_text(&mut self, text: &str) -> Result<(), SurfaceError>;
    fn caret(&self) -> Result<Caret, SurfaceError>;
    fn set_caret(&mut self, caret: Caret) -> Result<(), SurfaceError>;

    /// Whether the surface vetoes the default action of `event`.
    fn suppresses_default(&self, event: &KeyEvent) -> bool;

    /// Delivers one event. Returns whether its default action proceeded.
    fn dispatch(&mut self, event: &KeyEvent) -> Result<bool, SurfaceError>;

    fn read_buffer(&self) -> Result<TextBuffer, SurfaceError> {
        let text = self.text()?;
        let caret = self.caret()?;
        Ok(TextBuffer::with_caret(&text, caret.index, caret.anchor))
    }

    /// Renders the `before` -> `after` transition onto the surface.
    fn apply_transition(
        &mut self,
        before: &TextBuffer,
        after: &TextBuffer,
    ) -> Result<(), SurfaceError> {
        if before.text() != after.text() {
            self.set_text(&after.text())?;
        }
        if before.caret() != after.caret() || before.anchor() != after.anchor() {
            self.set_caret(Caret {
                index: after.caret(),
                anchor: after.anchor(),
            })?;
        }
        Ok(())
    }
}

/// Element lookup and frame switching provided by the browser driver layer.
pub trait Driver {
    fn locate(&mut self, selector: &str) -> Result<&mut dyn Surface, SurfaceError>;
    fn switch_to_frame(&mut self, name: &str) -> Result<(), SurfaceError>;
    fn switch_to_default_content(&mut self);
    fn active_element(&mut self) -> Result<&mut dyn Surface, SurfaceError>;
}
