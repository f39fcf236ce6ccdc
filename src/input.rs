use crate::display::HUD_ROWS;
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Duration;

const FEED_STEP: f32 = 0.0005;
const FEED_STEP_BIG: f32 = 0.002;
const TIME_STEP_STEP: f32 = 0.1;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum InputEvent {
    Key { key: KeyCode, mods: KeyModifiers },
    Mouse(MouseEvent),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Action {
    Quit,
    TogglePause,
    Reset,
    NextPattern,
    NextMode,
    NextPalette,
    ToggleHorizontal,
    ToggleVertical,
    ToggleRadial,
    Feed(f32),
    Kill(f32),
    TimeStep(f32),
    Complexity(i32),
    StepsPerFrame(i32),
    TogglePulse,
    Randomize,
    Export,
    /// Pointer held at display pixel coordinates.
    Pointer { x: f32, y: f32 },
    PointerUp,
}

pub(crate) fn collect_input_nonblocking(
    max_frame_time: Duration,
) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
                out.push(InputEvent::Key {
                    key: k.code,
                    mods: k.modifiers,
                });
            }
            Event::Mouse(m) => out.push(InputEvent::Mouse(m)),
            _ => {}
        }
        if out.len() >= 32 {
            break;
        }
    }
    Ok(out)
}

/// Maps a terminal cell to the display pixel it shows on top. `None` over the HUD.
pub(crate) fn cell_to_pixel(column: u16, row: u16) -> Option<(f32, f32)> {
    let fy = row.checked_sub(HUD_ROWS)?;
    Some((column as f32, fy as f32 * 2.0))
}

pub(crate) fn map_event_to_action(ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Key { key, mods } => map_key(key, mods),
        InputEvent::Mouse(m) => match m.kind {
            MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left) => {
                match cell_to_pixel(m.column, m.row) {
                    Some((x, y)) => Some(Action::Pointer { x, y }),
                    None => Some(Action::PointerUp),
                }
            }
            MouseEventKind::Up(MouseButton::Left) => Some(Action::PointerUp),
            _ => None,
        },
    }
}

fn map_key(key: KeyCode, mods: KeyModifiers) -> Option<Action> {
    let rate = if mods.contains(KeyModifiers::SHIFT) {
        FEED_STEP_BIG
    } else {
        FEED_STEP
    };
    let action = match key {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('c') | KeyCode::Char('C') if mods.contains(KeyModifiers::CONTROL) => {
            Action::Quit
        }
        KeyCode::Char(' ') => Action::TogglePause,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::Reset,
        KeyCode::Char('p') | KeyCode::Char('P') => Action::NextPattern,
        KeyCode::Char('m') | KeyCode::Char('M') => Action::NextMode,
        KeyCode::Char('c') | KeyCode::Char('C') => Action::NextPalette,
        KeyCode::Char('h') | KeyCode::Char('H') => Action::ToggleHorizontal,
        KeyCode::Char('v') | KeyCode::Char('V') => Action::ToggleVertical,
        KeyCode::Char('o') | KeyCode::Char('O') => Action::ToggleRadial,
        KeyCode::Up => Action::Feed(rate),
        KeyCode::Down => Action::Feed(-rate),
        KeyCode::Right => Action::Kill(rate),
        KeyCode::Left => Action::Kill(-rate),
        KeyCode::Char('[') => Action::TimeStep(-TIME_STEP_STEP),
        KeyCode::Char(']') => Action::TimeStep(TIME_STEP_STEP),
        KeyCode::Char(',') | KeyCode::Char('<') => Action::Complexity(-1),
        KeyCode::Char('.') | KeyCode::Char('>') => Action::Complexity(1),
        KeyCode::Char('-') | KeyCode::Char('_') => Action::StepsPerFrame(-1),
        KeyCode::Char('=') | KeyCode::Char('+') => Action::StepsPerFrame(1),
        KeyCode::Char('a') | KeyCode::Char('A') => Action::TogglePulse,
        KeyCode::Char('x') | KeyCode::Char('X') => Action::Randomize,
        KeyCode::Char('s') | KeyCode::Char('S') => Action::Export,
        _ => return None,
    };
    Some(action)
}
