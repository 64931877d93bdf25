pub mod chord_tracker;
pub mod clipboard;
pub mod content_model;
pub mod document;
pub mod engine;
pub mod error;
pub mod key_catalog;
pub mod parser;
pub mod profile;
pub mod surface;
pub mod synthesizer;
pub mod types;

pub use clipboard::{Clipboard, LocalClipboard, SystemClipboard};
pub use engine::{TypeRequest, Typist};
pub use error::{SurfaceError, TypeError};
pub use key_catalog::{KeyCatalog, KeyDescriptor, NamedKey};
pub use profile::Profile;
pub use surface::{Driver, Surface, SurfaceKind};
pub use types::{
    KeyEvent, KeyInput, KeyPhase, KeySequence, Modifier, Modifiers, Platform, TypingReport,
};
