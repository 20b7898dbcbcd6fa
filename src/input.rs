//! Key and mouse bindings: cursor movement, rotation, menu navigation.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Rotate-intent button bitmask: bit 0 = counter-clockwise, bit 1 = clockwise.
pub const BUTTON_CCW: u8 = 1 << 0;
pub const BUTTON_CW: u8 = 1 << 1;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    RotateCw,
    RotateCcw,
    Confirm,
    Pause,
    Quit,
    None,
}

/// Map key event to game action. Arrows/hjkl move the cell cursor,
/// z/x rotate the pipe under it.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Char('x') => Action::RotateCw,
        KeyCode::Char('z') => Action::RotateCcw,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Confirm,
        _ => Action::None,
    }
}

/// Button bitmask from a mouse press; scroll and motion carry no intent.
pub fn mouse_to_buttons(event: &MouseEvent) -> u8 {
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => BUTTON_CCW,
        MouseEventKind::Down(MouseButton::Right) => BUTTON_CW,
        _ => 0,
    }
}
