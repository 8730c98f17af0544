// src/layout.rs
use std::fs;
use std::path::Path;

use crate::board::Cell;
use crate::error::ConfigError;
use crate::piece::{PieceKind, Side};

/// One piece to place at game start, parsed from a `board.csv` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawn {
    pub piece_type: String, // also the piece directory name, e.g. "PW"
    pub side: Side,
    pub cell: Cell,
}

/// Parses a row-major CSV grid of `<Kind><Side>` tokens. Empty cells are skipped.
pub fn parse_layout(text: &str) -> Result<Vec<Spawn>, ConfigError> {
    let mut spawns = Vec::new();
    let rows = text.lines().filter(|l| !l.trim().is_empty());
    for (row, line) in rows.enumerate() {
        for (col, token) in line.split(',').enumerate() {
            let token = token.trim();
            if token.is_empty() { continue; }
            let side = parse_token(token).ok_or_else(|| ConfigError::InvalidLayout {
                row,
                col,
                token: token.to_string(),
            })?;
            spawns.push(Spawn {
                piece_type: token.to_ascii_uppercase(),
                side,
                cell: (row as i32, col as i32),
            });
        }
    }
    Ok(spawns)
}

fn parse_token(token: &str) -> Option<Side> {
    let mut chars = token.chars();
    let (kind, side) = (chars.next()?, chars.next()?);
    if chars.next().is_some() { return None; }
    PieceKind::from_char(kind)?;
    Side::from_char(side)
}

pub fn load_layout(path: &Path) -> Result<Vec<Spawn>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    parse_layout(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_become_spawns_in_row_major_order() {
        let spawns = parse_layout("RB,,KB\n,,\nPW, ,kw\n").unwrap();
        assert_eq!(spawns.len(), 4);
        assert_eq!(spawns[0], Spawn { piece_type: "RB".into(), side: Side::Black, cell: (0, 0) });
        assert_eq!(spawns[1].cell, (0, 2));
        assert_eq!(spawns[2], Spawn { piece_type: "PW".into(), side: Side::White, cell: (2, 0) });
        assert_eq!(spawns[3].piece_type, "KW");
    }

    #[test]
    fn unknown_token_reports_its_cell() {
        match parse_layout("PW,PW\nPW,XW\n") {
            Err(ConfigError::InvalidLayout { row, col, token }) => {
                assert_eq!((row, col), (1, 1));
                assert_eq!(token, "XW");
            }
            other => panic!("expected InvalidLayout, got {:?}", other),
        }
        assert!(parse_layout("PWX").is_err());
        assert!(parse_layout("PG").is_err());
    }
}
