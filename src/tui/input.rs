//! Keyboard helpers for board navigation.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use shakmaty::{Color, File, Rank, Role, Square};

/// Moves the cursor one square. The board is drawn from `perspective`'s
/// side, so "up" always points at the opponent. Edges clamp.
pub fn move_cursor(cursor: Square, key: KeyCode, perspective: Color) -> Square {
    let sign = match perspective {
        Color::White => 1,
        Color::Black => -1,
    };
    let (df, dr) = match key {
        KeyCode::Up => (0, sign),
        KeyCode::Down => (0, -sign),
        KeyCode::Right => (sign, 0),
        KeyCode::Left => (-sign, 0),
        _ => return cursor,
    };
    let file = (cursor.file() as i32 + df).clamp(0, 7);
    let rank = (cursor.rank() as i32 + dr).clamp(0, 7);
    Square::from_coords(File::new(file as u32), Rank::new(rank as u32))
}

/// Promotion piece for a picker key.
pub fn promotion_choice(key: KeyCode) -> Option<Role> {
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Role::Queen),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Role::Rook),
        KeyCode::Char('b') | KeyCode::Char('B') => Some(Role::Bishop),
        KeyCode::Char('n') | KeyCode::Char('N') => Some(Role::Knight),
        _ => None,
    }
}

/// Ctrl-C, which quits from every screen and picker.
pub fn is_force_quit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Square the cursor starts on: the king's pawn of the human's side.
pub fn home_square(perspective: Color) -> Square {
    match perspective {
        Color::White => Square::E2,
        Color::Black => Square::E7,
    }
}
