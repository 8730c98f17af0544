// src/error.rs
use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::piece::CommandOutcome;

// --- Configuration Errors ---

/// Fatal problems found while loading piece types, layouts or the game config.
#[derive(Debug)]
pub enum ConfigError {
    MissingPieceDir(PathBuf),
    MissingMoveFile(PathBuf),
    MissingStatesDir(PathBuf),
    MissingIdleState(String), // piece type
    UnknownPieceKind(String),
    InvalidLayout { row: usize, col: usize, token: String },
    Io(PathBuf, io::Error),
    Json(PathBuf, serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingPieceDir(p) => write!(f, "Missing piece directory: {}", p.display()),
            ConfigError::MissingMoveFile(p) => write!(f, "Missing moves file: {}", p.display()),
            ConfigError::MissingStatesDir(p) => write!(f, "Missing states directory: {}", p.display()),
            ConfigError::MissingIdleState(t) => write!(f, "Piece type '{}' has no 'idle' state", t),
            ConfigError::UnknownPieceKind(t) => write!(f, "Cannot tell the kind of piece type '{}'", t),
            ConfigError::InvalidLayout { row, col, token } =>
                write!(f, "Unknown piece token '{}' in layout at row {}, col {}", token, row, col),
            ConfigError::Io(p, e) => write!(f, "I/O error with '{}': {}", p.display(), e),
            ConfigError::Json(p, e) => write!(f, "Invalid JSON in '{}': {}", p.display(), e),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
            ConfigError::Json(_, e) => Some(e),
            _ => None,
        }
    }
}

// --- Move Legality Errors ---

/// Why the orchestrator refused a move or jump. Rejections leave every piece untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    GameOver,
    UnknownPiece(String),
    NotOwner(String),
    PathBlocked { from: (i32, i32), to: (i32, i32) },
    PawnRule(&'static str),
    OccupiedByOwnSide((i32, i32)),
    TargetNotIdle(String),
    Rejected(CommandOutcome), // piece-level admissibility gate said no
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::GameOver => write!(f, "The game is already over."),
            MoveError::UnknownPiece(id) => write!(f, "No piece with id '{}' is in play", id),
            MoveError::NotOwner(id) => write!(f, "Piece '{}' belongs to the other side", id),
            MoveError::PathBlocked { from, to } =>
                write!(f, "Path from {:?} to {:?} is blocked", from, to),
            MoveError::PawnRule(reason) => write!(f, "Illegal pawn move: {}", reason),
            MoveError::OccupiedByOwnSide(cell) => write!(f, "Cell {:?} is occupied by your own piece", cell),
            MoveError::TargetNotIdle(id) => write!(f, "Piece '{}' is in motion and cannot be captured", id),
            MoveError::Rejected(outcome) => write!(f, "Command rejected: {}", outcome),
        }
    }
}

impl Error for MoveError {}

impl From<CommandOutcome> for MoveError {
    fn from(outcome: CommandOutcome) -> Self { MoveError::Rejected(outcome) }
}
