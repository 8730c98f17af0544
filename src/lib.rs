//! Real-time chess without turns: every piece runs its own state machine
//! (idle, move, jump, rest) and any idle piece may be commanded at any time.
//!
//! Piece types are data: a directory per type holding `moves.txt` and one
//! `states/<name>/config.json` per state. [`PieceTemplateFactory`] builds a
//! template per type once and spawns independent pieces from it; [`Game`]
//! enforces the board-level rules (ownership, blocked paths, pawn moves,
//! captures) on top of each piece's own admissibility gate.

pub mod animation;
pub mod board;
pub mod command;
pub mod config;
pub mod controls;
pub mod error;
pub mod factory;
pub mod game;
pub mod layout;
pub mod motion;
pub mod moves;
pub mod piece;
pub mod state;

pub use board::{Board, Cell};
pub use command::{Command, CommandKind};
pub use config::{GameConfig, StateConfig};
pub use controls::{Action, PlayerControl};
pub use error::{ConfigError, MoveError};
pub use factory::{PieceTemplate, PieceTemplateFactory};
pub use game::{Game, GameEvent};
pub use piece::{CommandOutcome, Piece, PieceKind, Side};
