// src/config.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::board::Board;
use crate::error::ConfigError;

// --- Defaults ---
const DEFAULT_PIECES_ROOT: &str = "assets/pieces";
const DEFAULT_LAYOUT: &str = "assets/board.csv";
const DEFAULT_TICK_MS: u64 = 16; // ~60 Hz
const DEFAULT_FPS: f64 = 6.0;

/// Top-level game settings. Every field falls back to a default when absent.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub board: Board,
    pub pieces_root: PathBuf,
    pub layout: PathBuf,
    pub tick_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            board: Board::default(),
            pieces_root: PathBuf::from(DEFAULT_PIECES_ROOT),
            layout: PathBuf::from(DEFAULT_LAYOUT),
            tick_ms: DEFAULT_TICK_MS,
        }
    }
}

impl GameConfig {
    /// Loads a config file. Relative asset paths are resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let mut config: GameConfig = serde_json::from_str(&text)
            .map_err(|e| ConfigError::Json(path.to_path_buf(), e))?;
        if let Some(base) = path.parent() {
            if config.pieces_root.is_relative() { config.pieces_root = base.join(&config.pieces_root); }
            if config.layout.is_relative() { config.layout = base.join(&config.layout); }
        }
        config.tick_ms = config.tick_ms.max(1);
        Ok(config)
    }
}

/// Declarative settings of one piece state (`states/<name>/config.json`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StateConfig {
    /// Travel speed in metres per second; zero for stationary states.
    #[serde(default, alias = "speed_m_per_sec")]
    pub speed: f64,
    #[serde(default, alias = "next_state_when_finished")]
    pub completion_target_state: Option<String>,
    #[serde(default = "default_fps", alias = "frames_per_sec")]
    pub animation_fps: f64,
    #[serde(default = "default_loop", alias = "is_loop")]
    pub animation_loop: bool,
    #[serde(default)]
    pub rest_ms: Option<u64>,
}

fn default_fps() -> f64 { DEFAULT_FPS }
fn default_loop() -> bool { true }

impl StateConfig {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
