// src/game.rs
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::board::{Board, Cell};
use crate::command::Command;
use crate::config::GameConfig;
use crate::controls::{Action, PlayerControl};
use crate::error::{ConfigError, MoveError};
use crate::factory::PieceTemplateFactory;
use crate::layout::load_layout;
use crate::piece::{CommandOutcome, Piece, PieceKind, Side};

/// How long a finished match stays on screen before the host should close it.
pub const GAME_OVER_LINGER_MS: u64 = 1500;

// --- Events ---

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum WinReason { KingCaptured }

/// Something the host may want to show or log. Drained with `drain_events`.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum GameEvent {
    GameStarted { pieces: usize },
    PieceMoved { side: Side, piece_id: String, from: Cell, to: Cell, captured: Option<String> },
    PieceJumped { side: Side, piece_id: String, cell: Cell },
    PieceCaptured { piece_id: String, by: String, cell: Cell },
    GameOver { winner: Side, loser: Side, reason: WinReason },
}

// --- Game ---

/// One match: the pieces in play, each side's controls, and the legality rules
/// that sit above the per-piece admissibility gate.
#[derive(Debug)]
pub struct Game {
    board: Board,
    pieces: BTreeMap<String, Piece>, // id -> piece; iteration order is not relied upon
    white: PlayerControl,
    black: PlayerControl,
    events: Vec<GameEvent>,
    game_over: Option<(Side, u64)>, // winner, time of the winning move
}

impl Game {
    pub fn new(board: Board, pieces: impl IntoIterator<Item = Piece>) -> Self {
        Game {
            board,
            pieces: pieces.into_iter().map(|p| (p.id().to_string(), p)).collect(),
            white: PlayerControl::new(Side::White, &board),
            black: PlayerControl::new(Side::Black, &board),
            events: Vec::new(),
            game_over: None,
        }
    }

    /// Builds a match from the layout and piece set named in `config`.
    /// The layout must load; a piece that fails to spawn is left out.
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        let spawns = load_layout(&config.layout)?;
        let mut factory = PieceTemplateFactory::new(config.board, &config.pieces_root);
        let mut pieces = Vec::with_capacity(spawns.len());
        for spawn in spawns {
            if !config.board.contains(spawn.cell) {
                warn!(piece_type = %spawn.piece_type, cell = ?spawn.cell, "layout cell is off the board");
                continue;
            }
            match factory.create_piece(&spawn.piece_type, spawn.side, spawn.cell) {
                Ok(piece) => pieces.push(piece),
                Err(e) => warn!(piece_type = %spawn.piece_type, cell = ?spawn.cell, error = %e, "skipping piece"),
            }
        }
        info!(pieces = pieces.len(), rows = config.board.rows, cols = config.board.cols, "game assembled");
        Ok(Game::new(config.board, pieces))
    }

    // --- Accessors ---

    pub fn board(&self) -> &Board { &self.board }
    pub fn piece(&self, id: &str) -> Option<&Piece> { self.pieces.get(id) }
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> { self.pieces.values() }
    pub fn is_over(&self) -> bool { self.game_over.is_some() }
    pub fn winner(&self) -> Option<Side> { self.game_over.map(|(winner, _)| winner) }

    pub fn control(&self, side: Side) -> &PlayerControl {
        match side { Side::White => &self.white, Side::Black => &self.black }
    }

    fn control_mut(&mut self, side: Side) -> &mut PlayerControl {
        match side { Side::White => &mut self.white, Side::Black => &mut self.black }
    }

    /// True once the post-game linger has elapsed.
    pub fn is_finished(&self, now: u64) -> bool {
        self.game_over.is_some_and(|(_, at)| now >= at + GAME_OVER_LINGER_MS)
    }

    /// Piece whose rounded position is `cell`, if any.
    pub fn piece_at(&self, cell: Cell) -> Option<&Piece> {
        self.occupant(cell, None)
    }

    fn occupant(&self, cell: Cell, except: Option<&str>) -> Option<&Piece> {
        self.pieces.values()
            .filter(|p| Some(p.id()) != except)
            .find(|p| p.current_cell() == cell)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Lifecycle ---

    /// Starts every piece's clocks at `now`.
    pub fn start(&mut self, now: u64) {
        for (id, piece) in self.pieces.iter_mut() {
            piece.reset(&Command::idle(now, id.as_str()));
        }
        info!(pieces = self.pieces.len(), "game started");
        self.events.push(GameEvent::GameStarted { pieces: self.pieces.len() });
    }

    /// Advances every piece to `now`.
    pub fn tick(&mut self, now: u64) {
        for (id, piece) in self.pieces.iter_mut() {
            if let Some(state) = piece.update(now) {
                debug!(piece = %id, state = %state, now = now, "state changed");
            }
        }
    }

    // --- Move Legality ---

    /// Checks whether `side` may move piece `id` to `dest` right now.
    /// Returns the id of the piece that would be captured. Changes nothing.
    pub fn check_move(&self, side: Side, id: &str, dest: Cell) -> Result<Option<String>, MoveError> {
        if self.game_over.is_some() {
            return Err(MoveError::GameOver);
        }
        let piece = self.pieces.get(id).ok_or_else(|| MoveError::UnknownPiece(id.to_string()))?;
        if piece.side() != side {
            return Err(MoveError::NotOwner(id.to_string()));
        }
        if !self.board.contains(dest) {
            return Err(CommandOutcome::RejectedOutOfBounds.into());
        }

        let from = piece.current_cell();
        let target = self.occupant(dest, Some(id));

        if piece.kind().is_sliding() {
            if let Some(blocker) = self.first_blocker(from, dest) {
                debug!(piece = %id, ?from, ?dest, ?blocker, "path blocked");
                return Err(MoveError::PathBlocked { from, to: dest });
            }
        }

        if piece.kind() == PieceKind::Pawn {
            self.check_pawn(piece, from, dest, target)?;
        } else if target.is_some_and(|t| t.side() == side) {
            return Err(MoveError::OccupiedByOwnSide(dest));
        }

        let outcome = piece.check_command(&Command::move_to(0, id, dest));
        if !outcome.is_accepted() {
            return Err(outcome.into());
        }

        match target {
            Some(t) if !t.is_idle() => Err(MoveError::TargetNotIdle(t.id().to_string())),
            Some(t) => Ok(Some(t.id().to_string())),
            None => Ok(None),
        }
    }

    /// First occupied cell strictly between `from` and `dest` on a straight or
    /// diagonal line. Other shapes have no path.
    fn first_blocker(&self, from: Cell, dest: Cell) -> Option<Cell> {
        let (dr, dc) = (dest.0 - from.0, dest.1 - from.1);
        let straight = dr == 0 || dc == 0;
        let diagonal = dr.abs() == dc.abs();
        if (dr, dc) == (0, 0) || !(straight || diagonal) {
            return None;
        }
        let steps = dr.abs().max(dc.abs());
        let (sr, sc) = (dr.signum(), dc.signum());
        (1..steps)
            .map(|i| (from.0 + sr * i, from.1 + sc * i))
            .find(|&cell| self.piece_at(cell).is_some())
    }

    fn check_pawn(&self, pawn: &Piece, from: Cell, dest: Cell, target: Option<&Piece>) -> Result<(), MoveError> {
        let forward = pawn.side().forward();
        let (dr, dc) = (dest.0 - from.0, dest.1 - from.1);

        match (dr, dc.abs()) {
            (r, 0) if r == forward => {
                if target.is_some() {
                    return Err(MoveError::PawnRule("a pawn cannot capture straight ahead"));
                }
            }
            (r, 0) if r == 2 * forward => {
                if from.0 != pawn.side().pawn_start_row(self.board.rows) {
                    return Err(MoveError::PawnRule("double step is only allowed from the starting rank"));
                }
                if self.piece_at((from.0 + forward, from.1)).is_some() {
                    return Err(MoveError::PawnRule("double step is blocked"));
                }
                if target.is_some() {
                    return Err(MoveError::PawnRule("a pawn cannot capture straight ahead"));
                }
            }
            (r, 1) if r == forward => {
                if !target.is_some_and(|t| t.side() != pawn.side()) {
                    return Err(MoveError::PawnRule("diagonal moves must capture an enemy piece"));
                }
            }
            _ => return Err(MoveError::PawnRule("pawns only move forward")),
        }
        Ok(())
    }

    /// Validates and starts a move. A captured piece leaves the board as the
    /// move starts. Returns the captured piece's id.
    pub fn try_move(&mut self, side: Side, id: &str, dest: Cell, now: u64) -> Result<Option<String>, MoveError> {
        let captured = match self.check_move(side, id, dest) {
            Ok(captured) => captured,
            Err(e) => {
                debug!(?side, piece = %id, ?dest, error = %e, "move refused");
                return Err(e);
            }
        };
        let piece = self.pieces.get_mut(id).ok_or_else(|| MoveError::UnknownPiece(id.to_string()))?;
        let from = piece.current_cell();
        let outcome = piece.on_command(&Command::move_to(now, id, dest), now);
        if !outcome.is_accepted() {
            return Err(outcome.into());
        }

        info!(?side, piece = %id, ?from, to = ?dest, captured = ?captured, "piece moved");
        self.events.push(GameEvent::PieceMoved {
            side,
            piece_id: id.to_string(),
            from,
            to: dest,
            captured: captured.clone(),
        });

        if let Some(victim_id) = &captured {
            if let Some(victim) = self.pieces.remove(victim_id) {
                self.events.push(GameEvent::PieceCaptured {
                    piece_id: victim_id.clone(),
                    by: id.to_string(),
                    cell: dest,
                });
                if victim.kind() == PieceKind::King {
                    self.finish(side, now);
                }
            }
        }
        Ok(captured)
    }

    /// Puts piece `id` into its jump state in place.
    pub fn try_jump(&mut self, side: Side, id: &str, now: u64) -> Result<(), MoveError> {
        if self.game_over.is_some() {
            return Err(MoveError::GameOver);
        }
        let piece = self.pieces.get_mut(id).ok_or_else(|| MoveError::UnknownPiece(id.to_string()))?;
        if piece.side() != side {
            return Err(MoveError::NotOwner(id.to_string()));
        }
        let outcome = piece.on_command(&Command::jump(now, id), now);
        if !outcome.is_accepted() {
            return Err(outcome.into());
        }
        let cell = piece.current_cell();
        info!(?side, piece = %id, ?cell, "piece jumped");
        self.events.push(GameEvent::PieceJumped { side, piece_id: id.to_string(), cell });
        Ok(())
    }

    fn finish(&mut self, winner: Side, now: u64) {
        if self.game_over.is_some() {
            return;
        }
        self.game_over = Some((winner, now));
        info!(?winner, "king captured, game over");
        self.events.push(GameEvent::GameOver {
            winner,
            loser: winner.opponent(),
            reason: WinReason::KingCaptured,
        });
    }

    // --- Player Controls ---

    /// Applies one player input. Errors are the refusals of the move or jump
    /// the input asked for; the selection is kept after a refused move.
    pub fn handle_action(&mut self, side: Side, action: Action, now: u64) -> Result<(), MoveError> {
        let board = self.board;
        if self.control_mut(side).step(action, &board) {
            return Ok(());
        }
        match action {
            Action::Select => self.handle_select(side, now),
            Action::Jump => self.handle_jump(side, now),
            Action::Cancel => {
                self.control_mut(side).clear();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn handle_select(&mut self, side: Side, now: u64) -> Result<(), MoveError> {
        let cursor = self.control(side).cursor();
        let selected = self.control(side).selected()
            .and_then(|id| self.pieces.get(id))
            .map(|p| (p.id().to_string(), p.current_cell()));

        match selected {
            Some((_, cell)) if cell == cursor => {
                self.control_mut(side).clear();
                Ok(())
            }
            Some((id, _)) => {
                self.try_move(side, &id, cursor, now)?;
                self.control_mut(side).clear();
                Ok(())
            }
            None => {
                // the previous selection may have been captured
                self.control_mut(side).clear();
                let pick = self.piece_at(cursor)
                    .filter(|p| p.side() == side && p.is_idle())
                    .map(|p| p.id().to_string());
                if let Some(id) = pick {
                    debug!(?side, piece = %id, "piece selected");
                    self.control_mut(side).select(id);
                }
                Ok(())
            }
        }
    }

    fn handle_jump(&mut self, side: Side, now: u64) -> Result<(), MoveError> {
        let cursor = self.control(side).cursor();
        let selected = self.control(side).selected()
            .filter(|id| self.pieces.contains_key(*id))
            .map(str::to_string);
        let target = selected.or_else(|| {
            self.piece_at(cursor).filter(|p| p.side() == side).map(|p| p.id().to_string())
        });
        let Some(id) = target else { return Ok(()) };
        self.try_jump(side, &id, now)?;
        self.control_mut(side).clear();
        Ok(())
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cols = self.board.cols;
        write!(f, "    ")?;
        for col in 0..cols { write!(f, "{} ", col % 10)?; }
        writeln!(f)?;
        writeln!(f, "  +{}+", "-".repeat(cols as usize * 2 + 1))?;
        for row in 0..self.board.rows {
            write!(f, "{} | ", row % 10)?;
            for col in 0..cols {
                match self.piece_at((row, col)) {
                    Some(piece) => write!(f, "{} ", piece)?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "  +{}+", "-".repeat(cols as usize * 2 + 1))?;

        writeln!(f, "{}", self.white)?;
        writeln!(f, "{}", self.black)?;
        let busy: Vec<String> = self.pieces.values()
            .filter(|p| !p.is_idle())
            .map(|p| {
                let (x, y) = p.pixel_position();
                format!("{} ({}) at {},{} px", p.id(), p.state_name(), x, y)
            })
            .collect();
        if !busy.is_empty() {
            writeln!(f, "Busy: {}", busy.join(", "))?;
        }
        if let Some((winner, _)) = self.game_over {
            writeln!(f, "=== GAME OVER: {:?} wins by capturing the king. ===", winner)?;
        }
        Ok(())
    }
}
