// src/motion.rs
use crate::board::{Board, Cell, Point};

/// Completion target that marks the resting, commandable state.
pub const IDLE_STATE: &str = "idle";

/// Rest length for a stationary state that hands off to something other than idle
/// and does not configure its own duration.
pub const DEFAULT_REST_MS: u64 = 2000;

/// Continuous movement between two grid cells at constant speed.
///
/// Cell coordinates are kept in cell space (`(row, col)` as floats); the board
/// converts them to physical units for distances and for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    board: Board,
    start_cell: Point,
    current_cell: Point,
    target_cell: Point,
    speed: f64, // metres per second
    total_distance: f64,
    traveled_distance: f64,
    is_moving: bool,
    start_time: Option<u64>,
    on_finish: String,
    rest_ms: Option<u64>,
}

impl Motion {
    /// `rest_ms` only matters when `speed` is zero; see [`Motion::resolve_rest`].
    pub fn new(start: Cell, board: Board, speed: f64, on_finish: impl Into<String>, rest_ms: Option<u64>) -> Self {
        let start = (start.0 as f64, start.1 as f64);
        Motion {
            board,
            start_cell: start,
            current_cell: start,
            target_cell: start,
            speed,
            total_distance: 0.0,
            traveled_distance: 0.0,
            is_moving: false,
            start_time: None,
            on_finish: on_finish.into(),
            rest_ms,
        }
    }

    /// Effective rest duration for a state: the configured one, else the default
    /// for stationary states that do not hand back to idle, else none (idle hold).
    pub fn resolve_rest(speed: f64, on_finish: &str, configured: Option<u64>) -> Option<u64> {
        configured.or_else(|| {
            (speed == 0.0 && on_finish != IDLE_STATE).then_some(DEFAULT_REST_MS)
        })
    }

    /// A fresh motion with the same parameters, parked at `start`.
    pub fn rooted_at(&self, start: Cell) -> Self {
        Motion::new(start, self.board, self.speed, self.on_finish.clone(), self.rest_ms)
    }

    pub fn set_target(&mut self, target: Cell) {
        self.start_cell = self.current_cell;
        self.target_cell = (target.0 as f64, target.1 as f64);
        self.total_distance = self.board.distance_m(self.current_cell, self.target_cell);
        self.traveled_distance = 0.0;
        self.is_moving = true;
    }

    /// Rebinds the clock. Start and target are left alone.
    pub fn reset(&mut self, start_time: u64) {
        self.start_time = Some(start_time);
        self.traveled_distance = 0.0;
    }

    /// Parks the motion at `point` with nothing left to travel.
    pub fn pin_to(&mut self, point: Point) {
        self.start_cell = point;
        self.current_cell = point;
        self.target_cell = point;
        self.total_distance = 0.0;
        self.traveled_distance = 0.0;
        self.is_moving = false;
    }

    /// Advances to `now` and returns the completion target once the move or rest is done.
    pub fn update(&mut self, now: u64) -> Option<String> {
        let start = self.start_time?;
        let elapsed_ms = now.saturating_sub(start);

        if self.speed == 0.0 {
            // Stationary: either an indefinite hold or a timed rest.
            let rest = self.rest_ms?;
            return (elapsed_ms >= rest).then(|| self.on_finish.clone());
        }

        if !self.is_moving {
            return None;
        }

        self.traveled_distance = self.speed * (elapsed_ms as f64 / 1000.0);
        if self.traveled_distance >= self.total_distance {
            self.traveled_distance = self.total_distance;
            self.current_cell = self.target_cell;
            self.start_cell = self.target_cell;
            self.is_moving = false;
            return Some(self.on_finish.clone());
        }

        // total_distance > 0 here, otherwise the branch above would have fired
        let progress = self.traveled_distance / self.total_distance;
        let (sr, sc) = self.start_cell;
        let (tr, tc) = self.target_cell;
        self.current_cell = (sr + (tr - sr) * progress, sc + (tc - sc) * progress);
        None
    }

    /// Current position in physical units, `(x, y)`.
    pub fn position(&self) -> (f64, f64) {
        self.board.to_metres(self.current_cell)
    }

    pub fn current_cell(&self) -> Point { self.current_cell }
    pub fn start_cell(&self) -> Point { self.start_cell }
    pub fn target_cell(&self) -> Point { self.target_cell }
    pub fn speed(&self) -> f64 { self.speed }
    pub fn on_finish(&self) -> &str { &self.on_finish }
    pub fn rest_ms(&self) -> Option<u64> { self.rest_ms }
    pub fn is_moving(&self) -> bool { self.is_moving }
    pub fn total_distance(&self) -> f64 { self.total_distance }
    pub fn traveled_distance(&self) -> f64 { self.traveled_distance }
    pub fn start_time(&self) -> Option<u64> { self.start_time }
}
