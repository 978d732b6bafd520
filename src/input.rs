//! Key bindings: normal and vim-style, plus mouse → board cell mapping.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;

/// Terminal columns per chip.
pub const CHIP_COLS: u16 = 4;
/// Terminal rows per chip.
pub const CHIP_ROWS: u16 = 2;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    /// Pick up the chip under the cursor, or let go of it.
    Grab,
    Pause,
    Restart,
    Quit,
    None,
}

impl Action {
    /// Unit step in cells for the cursor keys.
    pub fn direction(self) -> Option<(i32, i32)> {
        match self {
            Self::Left => Some((-1, 0)),
            Self::Right => Some((1, 0)),
            Self::Up => Some((0, -1)),
            Self::Down => Some((0, 1)),
            _ => None,
        }
    }
}

/// Map key event to game action. Supports both normal (arrows, space) and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Grab,
        _ => Action::None,
    }
}

/// Board cell under terminal position (col, row), if any.
pub fn cell_at(board: Rect, col: u16, row: u16) -> Option<(usize, usize)> {
    if !board.contains(ratatui::layout::Position::new(col, row)) {
        return None;
    }
    let x = (col - board.x) / CHIP_COLS;
    let y = (row - board.y) / CHIP_ROWS;
    Some((x as usize, y as usize))
}

/// Pointer travel between two terminal positions, in cells.
pub fn displacement(from: (u16, u16), to: (u16, u16)) -> (f32, f32) {
    let dx = (to.0 as f32 - from.0 as f32) / CHIP_COLS as f32;
    let dy = (to.1 as f32 - from.1 as f32) / CHIP_ROWS as f32;
    (dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn vim_and_arrow_keys_agree() {
        assert_eq!(key_to_action(key(KeyCode::Char('h'))), key_to_action(key(KeyCode::Left)));
        assert_eq!(key_to_action(key(KeyCode::Char('j'))), Action::Down);
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Grab);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)),
            Action::None
        );
    }

    #[test]
    fn cells_are_four_by_two() {
        let board = Rect::new(10, 5, 32, 16);
        assert_eq!(cell_at(board, 10, 5), Some((0, 0)));
        assert_eq!(cell_at(board, 13, 6), Some((0, 0)));
        assert_eq!(cell_at(board, 14, 7), Some((1, 1)));
        assert_eq!(cell_at(board, 41, 20), Some((7, 7)));
        assert_eq!(cell_at(board, 42, 20), None);
        assert_eq!(cell_at(board, 9, 5), None);
    }

    #[test]
    fn displacement_is_in_cells() {
        assert_eq!(displacement((10, 10), (13, 10)), (0.75, 0.0));
        assert_eq!(displacement((10, 10), (10, 8)), (0.0, -1.0));
    }
}
