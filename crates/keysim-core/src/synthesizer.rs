use crate::key_catalog::{KeyCatalog, KeyDescriptor};
use crate::profile::Profile;
use crate::types::{KeyEvent, KeyPhase, Modifier, Modifiers};

/// Turns resolved keys into ordered low-level events.
pub struct EventSynthesizer<'a> {
    catalog: &'a KeyCatalog,
    profile: &'a Profile,
}

impl<'a> EventSynthesizer<'a> {
    pub fn new(catalog: &'a KeyCatalog, profile: &'a Profile) -> Self {
        Self { catalog, profile }
    }

    pub fn modifier_down(&self, modifier: Modifier, held: Modifiers) -> KeyEvent {
        KeyEvent::new(KeyPhase::Down, self.catalog.modifier(modifier), held)
    }

    pub fn modifier_up(&self, modifier: Modifier, held: Modifiers) -> KeyEvent {
        KeyEvent::new(KeyPhase::Up, self.catalog.modifier(modifier), held)
    }

    /// Events for one non-modifier key: `[shift down] down [press] up [shift up]`.
    ///
    /// `suppresses` is the surface veto consulted with the key-down; a vetoed
    /// key-down loses its press.
    pub fn keystroke<F>(
        &self,
        descriptor: KeyDescriptor,
        held: Modifiers,
        suppresses: F,
    ) -> Vec<KeyEvent>
    where
        F: Fn(&KeyEvent) -> bool,
    {
        let mut key = descriptor;
        if held.shift && self.profile.shift_transforms_glyphs {
            key = self.catalog.shifted(key);
        }

        let implicit_shift = self.profile.implicit_shift && key.shifted && !held.shift;
        let mut mods = held;
        let mut events = Vec::with_capacity(5);

        if implicit_shift {
            mods.shift = true;
            events.push(self.modifier_down(Modifier::Shift, mods));
        }

        let down = KeyEvent::new(KeyPhase::Down, key, mods);
        let press = key.is_printable() && !mods.suppresses_press() && !suppresses(&down);
        events.push(down);
        if press {
            events.push(KeyEvent::new(KeyPhase::Press, key, mods));
        }
        events.push(KeyEvent::new(KeyPhase::Up, key, mods));

        if implicit_shift {
            events.push(self.modifier_up(Modifier::Shift, held));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_catalog::NamedKey;
    use crate::types::Platform;

    fn phases(events: &[KeyEvent]) -> Vec<(KeyPhase, String)> {
        events
            .iter()
            .map(|e| (e.phase, e.key.to_string()))
            .collect()
    }

    fn never(_: &KeyEvent) -> bool {
        false
    }

    #[test]
    fn test_printable_key_gets_press() {
        let catalog = KeyCatalog::new(Platform::Linux);
        let profile = Profile::for_platform(Platform::Linux);
        let synth = EventSynthesizer::new(&catalog, &profile);

        let events = synth.keystroke(catalog.resolve_char('a'), Modifiers::none(), never);
        assert_eq!(
            phases(&events),
            vec![
                (KeyPhase::Down, "a".to_string()),
                (KeyPhase::Press, "a".to_string()),
                (KeyPhase::Up, "a".to_string()),
            ]
        );
    }

    #[test]
    fn test_navigation_key_has_no_press() {
        let catalog = KeyCatalog::new(Platform::Linux);
        let profile = Profile::for_platform(Platform::Linux);
        let synth = EventSynthesizer::new(&catalog, &profile);

        let events = synth.keystroke(
            KeyDescriptor::named(NamedKey::ArrowLeft),
            Modifiers::none(),
            never,
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].describe(), "down: 37");
        assert_eq!(events[1].describe(), "up: 37");
    }

    #[test]
    fn test_uppercase_wraps_implicit_shift() {
        let catalog = KeyCatalog::new(Platform::Linux);
        let profile = Profile::for_platform(Platform::Linux);
        let synth = EventSynthesizer::new(&catalog, &profile);

        let events = synth.keystroke(catalog.resolve_char('A'), Modifiers::none(), never);
        let lines: Vec<String> = events.iter().map(KeyEvent::describe).collect();
        assert_eq!(lines, vec!["down: 16", "down: 65", "press: 65", "up: 65", "up: 16"]);
        assert!(events[2].modifiers.shift);
        assert!(events[4].modifiers.is_empty());
    }

    #[test]
    fn test_explicit_shift_transforms_without_implicit_chord() {
        let catalog = KeyCatalog::new(Platform::Linux);
        let profile = Profile::for_platform(Platform::Linux);
        let synth = EventSynthesizer::new(&catalog, &profile);
        let held = Modifiers {
            shift: true,
            ..Modifiers::none()
        };

        let events = synth.keystroke(catalog.resolve_char('a'), held, never);
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].key.code_point, Some('A'));
    }

    #[test]
    fn test_control_chord_suppresses_press() {
        let catalog = KeyCatalog::new(Platform::Windows);
        let profile = Profile::for_platform(Platform::Windows);
        let synth = EventSynthesizer::new(&catalog, &profile);
        let held = Modifiers {
            ctrl: true,
            ..Modifiers::none()
        };

        let events = synth.keystroke(catalog.resolve_char('x'), held, never);
        assert_eq!(
            events.iter().map(|e| e.phase).collect::<Vec<_>>(),
            vec![KeyPhase::Down, KeyPhase::Up]
        );
    }

    #[test]
    fn test_surface_veto_drops_press_only() {
        let catalog = KeyCatalog::new(Platform::Linux);
        let profile = Profile::for_platform(Platform::Linux);
        let synth = EventSynthesizer::new(&catalog, &profile);

        let events = synth.keystroke(catalog.resolve_char('s'), Modifiers::none(), |e| {
            e.phase == KeyPhase::Down
        });
        assert_eq!(
            events.iter().map(|e| e.phase).collect::<Vec<_>>(),
            vec![KeyPhase::Down, KeyPhase::Up]
        );
    }
}
