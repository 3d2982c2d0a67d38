//! Key bindings (arrows and vim-style) and held-key tracking.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::HashSet;

/// Keys the game loop polls every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKey {
    Rotate,
    MoveLeft,
    MoveRight,
    FastForward,
    HardDrop,
}

/// What a terminal key maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Game(GameKey),
    Quit,
    None,
}

/// Map a key event to a binding. Supports both normal (arrows, space) and vim (hjkl).
///
/// Releases ignore modifiers and letter case: a key pressed bare must still be let go
/// when Shift, Ctrl or Alt went down in the meantime.
pub fn key_binding(key: &KeyEvent) -> Binding {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = *key;
    if kind == KeyEventKind::Release {
        return code_binding(lowercase(code));
    }
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c' | 'C') => Binding::Quit,
            _ => Binding::None,
        };
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Binding::None;
    }
    code_binding(code)
}

fn lowercase(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

fn code_binding(code: KeyCode) -> Binding {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Binding::Quit,
        KeyCode::Up | KeyCode::Char('k') => Binding::Game(GameKey::Rotate),
        KeyCode::Left | KeyCode::Char('h') => Binding::Game(GameKey::MoveLeft),
        KeyCode::Right | KeyCode::Char('l') => Binding::Game(GameKey::MoveRight),
        KeyCode::Down | KeyCode::Char('j') => Binding::Game(GameKey::FastForward),
        KeyCode::Enter | KeyCode::Char(' ') => Binding::Game(GameKey::HardDrop),
        _ => Binding::None,
    }
}

/// Which game keys are down.
///
/// Terminals that report release events give true held state. Everywhere else a key
/// counts as held for the tick in which a press or auto-repeat arrived.
#[derive(Debug, Default)]
pub struct HeldKeys {
    down: HashSet<GameKey>,
    pulsed: HashSet<GameKey>,
    tracks_release: bool,
}

impl HeldKeys {
    pub fn new(tracks_release: bool) -> Self {
        Self {
            tracks_release,
            ..Self::default()
        }
    }

    pub fn handle(&mut self, key: GameKey, kind: KeyEventKind) {
        match kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                self.pulsed.insert(key);
                if self.tracks_release {
                    self.down.insert(key);
                }
            }
            KeyEventKind::Release => {
                self.down.remove(&key);
            }
        }
    }

    pub fn is_held(&self, key: GameKey) -> bool {
        self.down.contains(&key) || self.pulsed.contains(&key)
    }

    /// Forget presses seen during the previous tick. Keys still down stay held.
    pub fn next_tick(&mut self) {
        self.pulsed.clear();
    }

    /// Let go of everything, e.g. when the terminal loses focus and releases go elsewhere.
    pub fn release_all(&mut self) {
        self.down.clear();
        self.pulsed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_and_vim_keys_match() {
        assert_eq!(key_binding(&press(KeyCode::Up)), Binding::Game(GameKey::Rotate));
        assert_eq!(key_binding(&press(KeyCode::Char('k'))), Binding::Game(GameKey::Rotate));
        assert_eq!(key_binding(&press(KeyCode::Left)), Binding::Game(GameKey::MoveLeft));
        assert_eq!(key_binding(&press(KeyCode::Char('l'))), Binding::Game(GameKey::MoveRight));
        assert_eq!(key_binding(&press(KeyCode::Down)), Binding::Game(GameKey::FastForward));
        assert_eq!(key_binding(&press(KeyCode::Char(' '))), Binding::Game(GameKey::HardDrop));
        assert_eq!(key_binding(&press(KeyCode::Char('x'))), Binding::None);
    }

    #[test]
    fn quit_keys() {
        assert_eq!(key_binding(&press(KeyCode::Esc)), Binding::Quit);
        assert_eq!(key_binding(&press(KeyCode::Char('q'))), Binding::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_binding(&ctrl_c), Binding::Quit);
        let alt_h = KeyEvent::new(KeyCode::Char('h'), KeyModifiers::ALT);
        assert_eq!(key_binding(&alt_h), Binding::None);
    }

    #[test]
    fn press_without_release_reporting_lasts_one_tick() {
        let mut keys = HeldKeys::new(false);
        keys.handle(GameKey::Rotate, KeyEventKind::Press);
        assert!(keys.is_held(GameKey::Rotate));
        keys.next_tick();
        assert!(!keys.is_held(GameKey::Rotate));
        keys.handle(GameKey::Rotate, KeyEventKind::Repeat);
        assert!(keys.is_held(GameKey::Rotate));
    }

    #[test]
    fn release_reporting_keeps_key_down_until_release() {
        let mut keys = HeldKeys::new(true);
        keys.handle(GameKey::MoveLeft, KeyEventKind::Press);
        keys.next_tick();
        keys.next_tick();
        assert!(keys.is_held(GameKey::MoveLeft));
        keys.handle(GameKey::MoveLeft, KeyEventKind::Release);
        assert!(!keys.is_held(GameKey::MoveLeft));
    }

    /// Route an event the way the terminal host does.
    fn feed(keys: &mut HeldKeys, event: &KeyEvent) {
        if let Binding::Game(key) = key_binding(event) {
            keys.handle(key, event.kind);
        }
    }

    #[test]
    fn release_with_modifier_still_lets_go() {
        let mut keys = HeldKeys::new(true);
        feed(&mut keys, &press(KeyCode::Left));
        keys.next_tick();
        assert!(keys.is_held(GameKey::MoveLeft));

        let release = KeyEvent::new_with_kind(KeyCode::Left, KeyModifiers::ALT, KeyEventKind::Release);
        assert_eq!(key_binding(&release), Binding::Game(GameKey::MoveLeft));
        feed(&mut keys, &release);
        assert!(!keys.is_held(GameKey::MoveLeft));
    }

    #[test]
    fn shifted_release_matches_lowercase_press() {
        let mut keys = HeldKeys::new(true);
        feed(&mut keys, &press(KeyCode::Char('j')));
        keys.next_tick();
        assert!(keys.is_held(GameKey::FastForward));

        let release =
            KeyEvent::new_with_kind(KeyCode::Char('J'), KeyModifiers::SHIFT, KeyEventKind::Release);
        feed(&mut keys, &release);
        assert!(!keys.is_held(GameKey::FastForward));
    }

    #[test]
    fn modified_press_is_still_ignored() {
        let alt_left = KeyEvent::new_with_kind(KeyCode::Left, KeyModifiers::ALT, KeyEventKind::Press);
        assert_eq!(key_binding(&alt_left), Binding::None);
    }

    #[test]
    fn release_all_clears_held_keys() {
        let mut keys = HeldKeys::new(true);
        keys.handle(GameKey::MoveRight, KeyEventKind::Press);
        keys.handle(GameKey::FastForward, KeyEventKind::Press);
        keys.release_all();
        assert!(!keys.is_held(GameKey::MoveRight));
        assert!(!keys.is_held(GameKey::FastForward));
    }

    #[test]
    fn tap_inside_one_tick_still_counts() {
        let mut keys = HeldKeys::new(true);
        keys.handle(GameKey::HardDrop, KeyEventKind::Press);
        keys.handle(GameKey::HardDrop, KeyEventKind::Release);
        assert!(keys.is_held(GameKey::HardDrop));
        keys.next_tick();
        assert!(!keys.is_held(GameKey::HardDrop));
    }
}
