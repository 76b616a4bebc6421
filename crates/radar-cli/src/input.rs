//! Keyboard controls for the live radar.
//!
//! Polled once per tick from the radar loop; never blocks.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    ZoomIn,
    ZoomOut,
    ToggleInfo,
    Quit,
}

/// Terminal events gathered during one tick
#[derive(Debug, Default)]
pub struct PolledInput {
    pub actions: Vec<InputAction>,
    /// Latest terminal size, if it changed
    pub resized: Option<(u16, u16)>,
}

/// Drain pending terminal events without blocking.
pub fn poll() -> Result<PolledInput> {
    let mut input = PolledInput::default();

    while event::poll(Duration::ZERO)? {
        match event::read()? {
            Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
                if let Some(action) = map_key(&key_event) {
                    debug!("Key {:?} -> {:?}", key_event.code, action);
                    input.actions.push(action);
                }
            }
            Event::Resize(cols, rows) => input.resized = Some((cols, rows)),
            _ => {}
        }
    }

    Ok(input)
}

/// Map a key event to a radar action.
fn map_key(event: &KeyEvent) -> Option<InputAction> {
    match event.code {
        KeyCode::Esc => Some(InputAction::Quit),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(InputAction::Quit),
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputAction::Quit)
        }
        KeyCode::Char('+') | KeyCode::Char('=') => Some(InputAction::ZoomIn),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(InputAction::ZoomOut),
        KeyCode::Char('i') | KeyCode::Char('I') => Some(InputAction::ToggleInfo),
        _ => None,
    }
}
