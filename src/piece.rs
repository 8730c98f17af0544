// src/piece.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use tracing::debug;

use crate::board::{round_cell, Board, Cell};
use crate::command::{Command, CommandKind};
use crate::motion::IDLE_STATE;
use crate::state::StateMachine;

// --- Sides and Kinds ---

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Side { White, Black }

impl Side {
    pub fn opponent(&self) -> Side {
        match self { Side::White => Side::Black, Side::Black => Side::White }
    }

    pub fn from_char(c: char) -> Option<Side> {
        match c.to_ascii_uppercase() {
            'W' => Some(Side::White),
            'B' => Some(Side::Black),
            _ => None,
        }
    }

    /// Row direction pawns of this side advance in.
    pub fn forward(&self) -> i32 {
        match self { Side::White => -1, Side::Black => 1 }
    }

    /// Row a pawn of this side starts on, for a board with `rows` rows.
    pub fn pawn_start_row(&self, rows: i32) -> i32 {
        match self { Side::White => rows - 2, Side::Black => 1 }
    }
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PieceKind { Pawn, Knight, Bishop, Rook, Queen, King }

impl PieceKind {
    pub fn from_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_uppercase() {
            'P' => Some(PieceKind::Pawn), 'N' => Some(PieceKind::Knight), 'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook), 'Q' => Some(PieceKind::Queen), 'K' => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Kinds whose moves need every cell along the way to be empty.
    pub fn is_sliding(&self) -> bool {
        matches!(self, PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)
    }

    pub fn symbol(&self) -> char {
        match self {
            PieceKind::Pawn => 'p', PieceKind::Knight => 'n', PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r', PieceKind::Queen => 'q', PieceKind::King => 'k',
        }
    }
}

// --- Command Admissibility ---

/// Verdict of the piece-level admissibility gate.
#[derive(Debug, Serialize, Copy, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Accepted,
    RejectedNotIdle,
    RejectedNoTransition,
    RejectedMalformed,
    RejectedOutOfBounds,
    RejectedIllegalDestination,
}

impl CommandOutcome {
    pub fn is_accepted(&self) -> bool { *self == CommandOutcome::Accepted }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CommandOutcome::Accepted => "accepted",
            CommandOutcome::RejectedNotIdle => "piece is busy",
            CommandOutcome::RejectedNoTransition => "no transition for this command in the current state",
            CommandOutcome::RejectedMalformed => "destination must be two integers",
            CommandOutcome::RejectedOutOfBounds => "destination is off the board",
            CommandOutcome::RejectedIllegalDestination => "destination is not in the piece's move table",
        };
        f.write_str(text)
    }
}

// --- Piece ---

/// A live piece: identity plus its own state machine.
#[derive(Debug, Clone)]
pub struct Piece {
    id: String,
    piece_type: String,
    kind: PieceKind,
    side: Side,
    board: Board,
    machine: StateMachine,
}

impl Piece {
    pub fn new(id: String, piece_type: String, kind: PieceKind, side: Side, board: Board, machine: StateMachine) -> Self {
        Piece { id, piece_type, kind, side, board, machine }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn piece_type(&self) -> &str { &self.piece_type }
    pub fn kind(&self) -> PieceKind { self.kind }
    pub fn side(&self) -> Side { self.side }
    pub fn machine(&self) -> &StateMachine { &self.machine }
    pub fn state_name(&self) -> &str { self.machine.current().name() }

    /// Runs the admissibility gate without touching any state.
    pub fn check_command(&self, cmd: &Command) -> CommandOutcome {
        let state = self.machine.current();
        if matches!(cmd.kind(), CommandKind::Move | CommandKind::Jump) && !self.is_idle() {
            return CommandOutcome::RejectedNotIdle;
        }
        if !state.transitions().contains_key(cmd.kind().name()) {
            return CommandOutcome::RejectedNoTransition;
        }
        if cmd.kind() == CommandKind::Move {
            let Some(dest) = cmd.cell_param() else {
                return CommandOutcome::RejectedMalformed;
            };
            if !self.board.contains(dest) {
                return CommandOutcome::RejectedOutOfBounds;
            }
            if !state.moves().allows(self.current_cell(), dest, self.board.rows, self.board.cols) {
                return CommandOutcome::RejectedIllegalDestination;
            }
        }
        CommandOutcome::Accepted
    }

    pub fn is_command_possible(&self, cmd: &Command) -> bool {
        self.check_command(cmd).is_accepted()
    }

    /// Applies `cmd` if the gate accepts it. A rejection changes nothing.
    pub fn on_command(&mut self, cmd: &Command, now: u64) -> CommandOutcome {
        let outcome = self.check_command(cmd);
        if outcome.is_accepted() {
            let from = self.state_name().to_string();
            self.machine.process_command(cmd, now);
            debug!(piece = %self.id, cmd = %cmd.kind(), from = %from, to = %self.state_name(), "command accepted");
        } else {
            debug!(piece = %self.id, cmd = %cmd.kind(), reason = %outcome, "command rejected");
        }
        outcome
    }

    /// Advances the state machine. Returns the new state's name when it changed.
    pub fn update(&mut self, now: u64) -> Option<&str> {
        self.machine.update(now)?;
        Some(self.machine.current().name())
    }

    /// Restarts the current state's clocks (used once at game start).
    pub fn reset(&mut self, cmd: &Command) {
        self.machine.reset(cmd);
    }

    /// At rest and commandable: stationary, looping animation, completes into idle.
    pub fn is_idle(&self) -> bool {
        let state = self.machine.current();
        state.motion().speed() == 0.0
            && state.animation().is_looping()
            && state.motion().on_finish() == IDLE_STATE
    }

    /// Nearest grid cell; the only position used for rule checks.
    pub fn current_cell(&self) -> Cell {
        round_cell(self.machine.current().motion().current_cell())
    }

    /// Continuous physical position, for the renderer.
    pub fn position(&self) -> (f64, f64) {
        self.machine.current().motion().position()
    }

    /// Position on the board image, in pixels.
    pub fn pixel_position(&self) -> (i64, i64) {
        self.board.metres_to_pixels(self.position())
    }

    pub fn current_frame(&self) -> usize {
        self.machine.current().animation().current_frame()
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.kind.symbol();
        let symbol = match self.side {
            Side::White => symbol.to_ascii_uppercase(),
            Side::Black => symbol,
        };
        write!(f, "{}", symbol)
    }
}
