// src/moves.rs
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;

use crate::board::Cell;
use crate::error::ConfigError;

lazy_static! {
    // "d_row,d_col", each number optionally tagged ("1:capture, 0")
    static ref OFFSET_LINE: Regex = Regex::new(
        r"^\s*(-?\d+)(?::\w*)?\s*,\s*(-?\d+)(?::\w*)?\s*$"
    ).unwrap();
}

/// Relative destinations one piece type may reach, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveTable {
    offsets: Vec<(i32, i32)>,
}

impl MoveTable {
    pub fn new(offsets: impl IntoIterator<Item = (i32, i32)>) -> Self {
        let mut table = MoveTable::default();
        for off in offsets { table.push(off); }
        table
    }

    fn push(&mut self, off: (i32, i32)) {
        if !self.offsets.contains(&off) { self.offsets.push(off); }
    }

    /// Parses rule-file text. Blank lines, `#` comments and malformed lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut table = MoveTable::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') { continue; }
            let Some(caps) = OFFSET_LINE.captures(line) else { continue };
            // Both groups matched `-?\d+`; parsing only fails on overflow.
            let (Ok(dr), Ok(dc)) = (caps[1].parse::<i32>(), caps[2].parse::<i32>()) else { continue };
            if dr.checked_abs().is_some() && dc.checked_abs().is_some() {
                table.push((dr, dc));
            }
        }
        table
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::MissingMoveFile(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Ok(MoveTable::parse(&text))
    }

    pub fn offsets(&self) -> &[(i32, i32)] { &self.offsets }

    pub fn is_empty(&self) -> bool { self.offsets.is_empty() }

    /// Largest absolute row or column offset in the table.
    pub fn reach(&self) -> i32 {
        self.offsets.iter().map(|&(dr, dc)| dr.saturating_abs().max(dc.saturating_abs())).max().unwrap_or(0)
    }

    /// Destinations reachable from `(row, col)` that stay on a `rows` x `cols` board.
    pub fn legal_destinations(&self, row: i32, col: i32, rows: i32, cols: i32) -> Vec<Cell> {
        self.offsets.iter()
            .filter_map(|&(dr, dc)| Some((row.checked_add(dr)?, col.checked_add(dc)?)))
            .filter(|&(r, c)| (0..rows).contains(&r) && (0..cols).contains(&c))
            .collect()
    }

    /// Same as `legal_destinations(..).contains(&dest)` without allocating.
    pub fn allows(&self, from: Cell, dest: Cell, rows: i32, cols: i32) -> bool {
        if !(0..rows).contains(&dest.0) || !(0..cols).contains(&dest.1) {
            return false;
        }
        match (dest.0.checked_sub(from.0), dest.1.checked_sub(from.1)) {
            (Some(dr), Some(dc)) => self.offsets.contains(&(dr, dc)),
            _ => false,
        }
    }
}
