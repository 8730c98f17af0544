// src/controls.rs
use std::fmt;

use crate::board::{Board, Cell};
use crate::piece::Side;

/// A decoded player input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action { Up, Down, Left, Right, Select, Jump, Cancel }

impl Action {
    pub fn from_name(name: &str) -> Option<Action> {
        match name.to_ascii_lowercase().as_str() {
            "up" | "u" => Some(Action::Up),
            "down" | "d" => Some(Action::Down),
            "left" | "l" => Some(Action::Left),
            "right" | "r" => Some(Action::Right),
            "select" | "enter" | "s" => Some(Action::Select),
            "jump" | "j" => Some(Action::Jump),
            "cancel" | "esc" => Some(Action::Cancel),
            _ => None,
        }
    }

    /// Cursor step for the four direction actions.
    fn delta(&self) -> Option<(i32, i32)> {
        match self {
            Action::Up => Some((-1, 0)),
            Action::Down => Some((1, 0)),
            Action::Left => Some((0, -1)),
            Action::Right => Some((0, 1)),
            _ => None,
        }
    }
}

/// Cursor and selection of one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerControl {
    side: Side,
    cursor: Cell,
    selected: Option<String>, // piece id
}

impl PlayerControl {
    /// Black starts in the top-left corner, white in the bottom-left.
    pub fn new(side: Side, board: &Board) -> Self {
        let cursor = match side {
            Side::Black => (0, 0),
            Side::White => (board.rows - 1, 0),
        };
        PlayerControl { side, cursor, selected: None }
    }

    pub fn side(&self) -> Side { self.side }
    pub fn cursor(&self) -> Cell { self.cursor }
    pub fn selected(&self) -> Option<&str> { self.selected.as_deref() }

    /// Moves the cursor for a direction action, clamped to the board.
    /// Returns false for non-direction actions.
    pub fn step(&mut self, action: Action, board: &Board) -> bool {
        let Some((dr, dc)) = action.delta() else { return false };
        self.cursor = board.clamp((self.cursor.0 + dr, self.cursor.1 + dc));
        true
    }

    pub fn select(&mut self, piece_id: impl Into<String>) {
        self.selected = Some(piece_id.into());
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }
}

impl fmt::Display for PlayerControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} cursor: {:?}", self.side, self.cursor)?;
        match &self.selected {
            Some(id) => write!(f, ", selected: {}", id),
            None => write!(f, ", selected: -"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursors_start_on_each_home_row_and_stay_on_board() {
        let board = Board::default();
        let mut black = PlayerControl::new(Side::Black, &board);
        let mut white = PlayerControl::new(Side::White, &board);
        assert_eq!(black.cursor(), (0, 0));
        assert_eq!(white.cursor(), (7, 0));

        assert!(black.step(Action::Up, &board));
        assert!(black.step(Action::Left, &board));
        assert_eq!(black.cursor(), (0, 0));
        assert!(white.step(Action::Up, &board));
        assert!(white.step(Action::Right, &board));
        assert_eq!(white.cursor(), (6, 1));
        assert!(!white.step(Action::Select, &board));
    }

    #[test]
    fn action_names() {
        assert_eq!(Action::from_name("UP"), Some(Action::Up));
        assert_eq!(Action::from_name("enter"), Some(Action::Select));
        assert_eq!(Action::from_name("esc"), Some(Action::Cancel));
        assert_eq!(Action::from_name("fly"), None);
    }
}
