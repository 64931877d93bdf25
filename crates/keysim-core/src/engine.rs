use crate::chord_tracker::{Chord, ChordTracker, Release};
use crate::clipboard::Clipboard;
use crate::content_model::{ContentModel, TextBuffer};
use crate::error::{SurfaceError, TypeError};
use crate::key_catalog::{KeyCatalog, KeyDescriptor, NamedKey};
use crate::profile::Profile;
use crate::surface::{Driver, Surface};
use crate::synthesizer::EventSynthesizer;
use crate::types::{KeyEvent, KeyInput, KeyPhase, TypingReport};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A typing command as received from a caller over JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRequest {
    /// Element selector in the top-level document.
    #[serde(default)]
    pub target: Option<String>,
    /// Type into the focused element of this frame instead of `target`.
    #[serde(default)]
    pub frame: Option<String>,
    #[serde(default)]
    pub keys: Option<Vec<KeyInput>>,
}

impl TypeRequest {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("invalid type request JSON")
    }
}

/// Resolved form of one logical input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Toggle(KeyDescriptor),
    ReleaseAll,
    Key(KeyDescriptor),
}

/// Translates key sequences into dispatched events and content changes.
#[derive(Debug, Clone)]
pub struct Typist {
    catalog: KeyCatalog,
    profile: Profile,
}

impl Default for Typist {
    fn default() -> Self {
        Self::new(Profile::default())
    }
}

impl Typist {
    pub fn new(profile: Profile) -> Self {
        Self {
            catalog: KeyCatalog::new(profile.platform),
            profile,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn catalog(&self) -> &KeyCatalog {
        &self.catalog
    }

    /// Types `keys` into `surface`.
    ///
    /// `None` is rejected as an invalid argument. Every key name is resolved
    /// before the first event, so resolution failures leave the surface
    /// untouched. No modifier is left held when this returns.
    pub fn type_keys(
        &self,
        surface: &mut dyn Surface,
        clipboard: &mut dyn Clipboard,
        keys: Option<&[KeyInput]>,
    ) -> Result<TypingReport, TypeError> {
        let steps = self.plan(require_keys(keys)?)?;
        debug!("Typing {} step(s) into {:?}", steps.len(), surface.kind());

        surface.focus()?;
        let model = ContentModel::new(&self.catalog, surface.kind());
        let buffer = surface.read_buffer()?;
        let mut run = Run {
            surface,
            clipboard,
            model,
            buffer,
            report: TypingReport::default(),
        };

        let synth = EventSynthesizer::new(&self.catalog, &self.profile);
        let mut tracker = ChordTracker::new();

        for step in steps {
            let events = match step {
                Step::Toggle(key) => match tracker.press(&key) {
                    Chord::Hold { modifier, held } => vec![synth.modifier_down(modifier, held)],
                    Chord::Release { modifier, held } => vec![synth.modifier_up(modifier, held)],
                    Chord::Forward { .. } => Vec::new(),
                },
                Step::ReleaseAll => release_events(&synth, tracker.release_all()),
                Step::Key(key) => {
                    let held = tracker.snapshot();
                    let target = &*run.surface;
                    synth.keystroke(key, held, |e| target.suppresses_default(e))
                }
            };

            if let Err(interrupted) = run.emit_all(&events) {
                return Err(self.abandon(&mut run, &mut tracker, &synth, interrupted));
            }
        }

        let trailing = release_events(&synth, tracker.flush_at_sequence_end());
        if let Err(interrupted) = run.emit_all(&trailing) {
            return Err(self.abandon(&mut run, &mut tracker, &synth, interrupted));
        }

        debug!(
            "Sequence done: {} event(s), value now {:?}",
            run.report.events.len(),
            run.buffer.text()
        );
        Ok(run.report)
    }

    /// Locates `selector` through the driver and types into it.
    pub fn type_into(
        &self,
        driver: &mut dyn Driver,
        selector: &str,
        clipboard: &mut dyn Clipboard,
        keys: Option<&[KeyInput]>,
    ) -> Result<TypingReport, TypeError> {
        let surface = driver.locate(selector)?;
        self.type_keys(surface, clipboard, keys)
    }

    /// Switches into `frame` and types into its focused element. The driver
    /// stays switched into the frame afterwards, unless the keys are rejected,
    /// in which case no switch happens.
    pub fn type_into_frame(
        &self,
        driver: &mut dyn Driver,
        frame: &str,
        clipboard: &mut dyn Clipboard,
        keys: Option<&[KeyInput]>,
    ) -> Result<TypingReport, TypeError> {
        self.plan(require_keys(keys)?)?;
        driver.switch_to_frame(frame)?;
        let surface = driver.active_element()?;
        self.type_keys(surface, clipboard, keys)
    }

    pub fn execute(
        &self,
        driver: &mut dyn Driver,
        clipboard: &mut dyn Clipboard,
        request: &TypeRequest,
    ) -> Result<TypingReport, TypeError> {
        let keys = require_keys(request.keys.as_deref())?;
        match (&request.frame, &request.target) {
            (Some(frame), _) => self.type_into_frame(driver, frame, clipboard, Some(keys)),
            (None, Some(target)) => self.type_into(driver, target, clipboard, Some(keys)),
            (None, None) => Err(TypeError::InvalidArgument(
                "request names neither a target nor a frame".to_string(),
            )),
        }
    }

    /// Resolves every input up front. A literal `\r\n` pair is one Enter.
    fn plan(&self, keys: &[KeyInput]) -> Result<Vec<Step>, TypeError> {
        let mut steps = Vec::with_capacity(keys.len());
        let mut inputs = keys.iter().peekable();
        while let Some(input) = inputs.next() {
            if *input == KeyInput::Literal('\r')
                && inputs.peek() == Some(&&KeyInput::Literal('\n'))
            {
                continue;
            }
            steps.push(self.resolve_step(input)?);
        }
        Ok(steps)
    }

    fn resolve_step(&self, input: &KeyInput) -> Result<Step, TypeError> {
        match input {
            KeyInput::Literal(c) => Ok(Step::Key(self.catalog.resolve_char(*c))),
            KeyInput::Named(name) => {
                let key = self.catalog.resolve(name)?;
                Ok(match key.named_key() {
                    Some(NamedKey::Null) => Step::ReleaseAll,
                    _ if key.is_modifier() => Step::Toggle(key),
                    _ => Step::Key(key),
                })
            }
            KeyInput::ModifierToggle(name) => {
                let key = self.catalog.resolve(name)?;
                if key.is_modifier() {
                    Ok(Step::Toggle(key))
                } else {
                    Err(TypeError::InvalidArgument(format!(
                        "{} is not a modifier key",
                        name
                    )))
                }
            }
        }
    }

    /// Ends a sequence the surface interrupted. Trailing key-ups are sent on a
    /// best-effort basis and held modifiers are cleared either way.
    fn abandon(
        &self,
        run: &mut Run<'_>,
        tracker: &mut ChordTracker,
        synth: &EventSynthesizer<'_>,
        interrupted: Interrupted,
    ) -> TypeError {
        let key = interrupted.key.to_string();
        let releases = release_events(synth, tracker.flush_at_sequence_end());
        match interrupted.error {
            SurfaceError::Detached => {
                warn!("Surface detached while typing {}; abandoning sequence", key);
                run.best_effort(interrupted.pending.into_iter().chain(releases));
                TypeError::SurfaceDetached { key }
            }
            other => {
                warn!("Surface failed while typing {}: {}", key, other);
                run.best_effort(releases);
                TypeError::Surface(other)
            }
        }
    }
}

fn require_keys(keys: Option<&[KeyInput]>) -> Result<&[KeyInput], TypeError> {
    keys.ok_or_else(|| TypeError::InvalidArgument("key sequence must not be null".to_string()))
}

fn release_events(synth: &EventSynthesizer<'_>, releases: Vec<Release>) -> Vec<KeyEvent> {
    releases
        .into_iter()
        .map(|r| synth.modifier_up(r.modifier, r.remaining))
        .collect()
}

/// Dispatch failure plus the key-ups still owed for the key in flight.
struct Interrupted {
    key: KeyDescriptor,
    error: SurfaceError,
    pending: Vec<KeyEvent>,
}

/// Per-call state: the surface, its buffer snapshot and the report so far.
struct Run<'a> {
    surface: &'a mut dyn Surface,
    clipboard: &'a mut dyn Clipboard,
    model: ContentModel,
    buffer: TextBuffer,
    report: TypingReport,
}

impl Run<'_> {
    fn emit(&mut self, event: KeyEvent) -> Result<bool, SurfaceError> {
        let proceeded = self.surface.dispatch(&event)?;
        self.report.events.push(event);
        if proceeded {
            let next = self.model.apply(&self.buffer, &event, &mut *self.clipboard);
            if next != self.buffer {
                self.surface.apply_transition(&self.buffer, &next)?;
                self.buffer = next;
            }
        }
        Ok(proceeded)
    }

    fn emit_all(&mut self, events: &[KeyEvent]) -> Result<(), Interrupted> {
        let mut vetoed: Option<KeyDescriptor> = None;
        for (i, event) in events.iter().enumerate() {
            if event.phase == KeyPhase::Press && vetoed == Some(event.key) {
                continue;
            }
            match self.emit(*event) {
                Ok(true) => {}
                Ok(false) => {
                    if event.phase == KeyPhase::Down && !event.key.is_modifier() {
                        debug!("Default action of {} vetoed by surface", event.key);
                        vetoed = Some(event.key);
                    }
                }
                Err(error) => {
                    let pending = events[i + 1..]
                        .iter()
                        .filter(|e| e.phase == KeyPhase::Up)
                        .copied()
                        .collect();
                    return Err(Interrupted {
                        key: event.key,
                        error,
                        pending,
                    });
                }
            }
        }
        Ok(())
    }

    fn best_effort<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = KeyEvent>,
    {
        for event in events {
            match self.surface.dispatch(&event) {
                Ok(_) => self.report.events.push(event),
                Err(err) => debug!("Dropped trailing {}: {}", event, err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::LocalClipboard;
    use crate::document::{Element, SuppressPolicy};
    use crate::types::{Modifier, Platform};

    fn typist() -> Typist {
        Typist::new(Profile::for_platform(Platform::Windows))
    }

    fn text(s: &str) -> Vec<KeyInput> {
        KeyInput::literals(s).collect()
    }

    #[test]
    fn test_null_sequence_is_invalid_argument() {
        let mut el = Element::plain_field("age");
        let mut clip = LocalClipboard::default();
        let res = typist().type_keys(&mut el, &mut clip, None);
        assert!(matches!(res, Err(TypeError::InvalidArgument(_))));
        assert!(el.log().is_empty());
    }

    #[test]
    fn test_unknown_key_aborts_before_any_event() {
        let mut el = Element::plain_field("name");
        let mut clip = LocalClipboard::default();
        let keys = vec![KeyInput::Literal('a'), KeyInput::named("NoSuchKey")];
        let res = typist().type_keys(&mut el, &mut clip, Some(&keys));
        assert_eq!(res, Err(TypeError::UnknownKey("NoSuchKey".to_string())));
        assert!(el.log().is_empty());
        assert_eq!(el.value(), "");
    }

    #[test]
    fn test_toggle_of_non_modifier_is_rejected() {
        let mut el = Element::plain_field("name");
        let mut clip = LocalClipboard::default();
        let keys = vec![KeyInput::toggle("ArrowLeft")];
        let res = typist().type_keys(&mut el, &mut clip, Some(&keys));
        assert!(matches!(res, Err(TypeError::InvalidArgument(_))));
    }

    #[test]
    fn test_trailing_modifier_gets_one_keyup() {
        let mut el = Element::plain_field("name");
        let mut clip = LocalClipboard::default();
        let keys = vec![KeyInput::Literal('a'), KeyInput::named("Shift")];
        let report = typist()
            .type_keys(&mut el, &mut clip, Some(&keys))
            .expect("type");
        assert_eq!(report.count_key(KeyPhase::Down, "Shift"), 1);
        assert_eq!(report.count_key(KeyPhase::Up, "Shift"), 1);
        assert_eq!(report.describe().last().map(String::as_str), Some("up: 16"));
    }

    #[test]
    fn test_null_key_releases_mid_sequence() {
        let mut el = Element::plain_field("name");
        let mut clip = LocalClipboard::default();
        let keys = vec![
            KeyInput::named("Control"),
            KeyInput::named("Shift"),
            KeyInput::named("Null"),
            KeyInput::Literal('b'),
        ];
        let report = typist()
            .type_keys(&mut el, &mut clip, Some(&keys))
            .expect("type");
        assert_eq!(el.value(), "b");
        let names: Vec<String> = report.events.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "down Control",
                "down Shift",
                "up Shift",
                "up Control",
                "down b",
                "press b",
                "up b"
            ]
        );
        assert!(report.modifier_balanced(Modifier::Control));
    }

    #[test]
    fn test_keydown_veto_keeps_down_up_pairs() {
        let mut el = Element::plain_field("suppress").with_suppress(SuppressPolicy::KeyDown);
        let mut clip = LocalClipboard::default();
        let keys = text("sAy");
        let report = typist()
            .type_keys(&mut el, &mut clip, Some(&keys))
            .expect("type");
        assert_eq!(el.value(), "");
        assert_eq!(report.count(KeyPhase::Press), 0);
        assert_eq!(report.count_key(KeyPhase::Down, "s"), 1);
        assert_eq!(report.count_key(KeyPhase::Up, "s"), 1);
        assert_eq!(report.count(KeyPhase::Down), report.count(KeyPhase::Up));
    }

    #[test]
    fn test_keypress_veto_fires_press_without_insertion() {
        let mut el = Element::plain_field("silent").with_suppress(SuppressPolicy::KeyPress);
        let mut clip = LocalClipboard::default();
        let keys = text("s");
        let report = typist()
            .type_keys(&mut el, &mut clip, Some(&keys))
            .expect("type");
        assert_eq!(el.value(), "");
        assert_eq!(report.count(KeyPhase::Press), 1);
    }

    #[test]
    fn test_execute_request_from_json() {
        use crate::document::Document;
        let mut doc = Document::new().with_element(Element::plain_field("email"));
        let mut clip = LocalClipboard::default();
        let request = TypeRequest::from_json(
            r#"{ "target": "email", "keys": [{"kind":"Literal","value":"x"}] }"#,
        )
        .expect("request");
        typist()
            .execute(&mut doc, &mut clip, &request)
            .expect("execute");
        assert_eq!(doc.element("email").map(Element::value).as_deref(), Some("x"));

        let null_keys = TypeRequest::from_json(r#"{ "target": "email", "keys": null }"#)
            .expect("request");
        assert!(matches!(
            typist().execute(&mut doc, &mut clip, &null_keys),
            Err(TypeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_crlf_literal_is_one_enter() {
        let mut area = Element::text_area("notes");
        let mut clip = LocalClipboard::default();
        let report = typist()
            .type_keys(&mut area, &mut clip, Some(&text("a\r\nb\rc")))
            .expect("type");
        assert_eq!(area.value(), "a\nb\nc");
        assert_eq!(report.count_key(KeyPhase::Down, "Enter"), 2);
    }

    #[test]
    fn test_rejected_keys_leave_frame_unswitched() {
        use crate::document::{Document, Frame};
        use crate::surface::Driver;
        let mut doc = Document::new()
            .with_frame(Frame::new("f").with_active(Element::frame_body("body", [""])));
        let mut clip = LocalClipboard::default();

        let res = typist().type_into_frame(&mut doc, "f", &mut clip, None);
        assert!(matches!(res, Err(TypeError::InvalidArgument(_))));
        assert_eq!(doc.current_frame(), None);

        let unknown = vec![KeyInput::named("Hyper")];
        let res = typist().type_into_frame(&mut doc, "f", &mut clip, Some(&unknown));
        assert_eq!(res, Err(TypeError::UnknownKey("Hyper".to_string())));
        assert_eq!(doc.current_frame(), None);

        typist()
            .type_into_frame(&mut doc, "f", &mut clip, Some(&text("ok")))
            .expect("type");
        assert_eq!(doc.current_frame(), Some("f"));
        doc.switch_to_default_content();
        assert_eq!(doc.current_frame(), None);
    }
}
