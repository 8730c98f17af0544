// src/command.rs
use serde::Serialize;
use std::fmt;

/// The kind of action a command asks a piece to perform.
#[derive(Debug, Serialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CommandKind { Move, Jump, Idle, Reset }

impl CommandKind {
    /// Event name used as the key in a state's transition table.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Move => "Move",
            CommandKind::Jump => "Jump",
            CommandKind::Idle => "Idle",
            CommandKind::Reset => "Reset",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "move" => Some(CommandKind::Move),
            "jump" => Some(CommandKind::Jump),
            "idle" => Some(CommandKind::Idle),
            "reset" => Some(CommandKind::Reset),
            _ => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A request addressed to one piece. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    timestamp: u64, // ms of game time
    target_id: String,
    kind: CommandKind,
    params: Vec<String>,
}

impl Command {
    pub fn new(timestamp: u64, target_id: impl Into<String>, kind: CommandKind, params: Vec<String>) -> Self {
        Command { timestamp, target_id: target_id.into(), kind, params }
    }

    /// Move command towards `(row, col)`; params are the stringified coordinates.
    pub fn move_to(timestamp: u64, target_id: impl Into<String>, dest: (i32, i32)) -> Self {
        Command::new(timestamp, target_id, CommandKind::Move, vec![dest.0.to_string(), dest.1.to_string()])
    }

    pub fn jump(timestamp: u64, target_id: impl Into<String>) -> Self {
        Command::new(timestamp, target_id, CommandKind::Jump, Vec::new())
    }

    pub fn idle(timestamp: u64, target_id: impl Into<String>) -> Self {
        Command::new(timestamp, target_id, CommandKind::Idle, Vec::new())
    }

    pub fn timestamp(&self) -> u64 { self.timestamp }
    pub fn target_id(&self) -> &str { &self.target_id }
    pub fn kind(&self) -> CommandKind { self.kind }
    pub fn params(&self) -> &[String] { &self.params }

    /// Parses the params as a `(row, col)` cell. `None` unless there are
    /// exactly two integer params.
    pub fn cell_param(&self) -> Option<(i32, i32)> {
        match self.params.as_slice() {
            [row, col] => Some((row.trim().parse().ok()?, col.trim().parse().ok()?)),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}ms] {} {}", self.timestamp, self.target_id, self.kind)?;
        for p in &self.params { write!(f, " {}", p)?; }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_param_needs_exactly_two_integers() {
        assert_eq!(Command::move_to(5, "RW_0", (3, -1)).cell_param(), Some((3, -1)));
        let bad = Command::new(5, "RW_0", CommandKind::Move, vec!["3".into(), "x".into()]);
        assert_eq!(bad.cell_param(), None);
        let short = Command::new(5, "RW_0", CommandKind::Move, vec!["3".into()]);
        assert_eq!(short.cell_param(), None);
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!(CommandKind::from_name("JUMP"), Some(CommandKind::Jump));
        assert_eq!(CommandKind::from_name("castle"), None);
        assert_eq!(Command::jump(10, "NB_1").to_string(), "[10ms] NB_1 Jump");
    }
}
