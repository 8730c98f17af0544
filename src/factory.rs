// src/factory.rs
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::animation::Animation;
use crate::board::{Board, Cell};
use crate::command::CommandKind;
use crate::config::StateConfig;
use crate::error::ConfigError;
use crate::motion::{Motion, IDLE_STATE};
use crate::moves::MoveTable;
use crate::piece::{Piece, PieceKind, Side};
use crate::state::{StateId, StateMachine, StateNode};

const MOVES_FILE: &str = "moves.txt";
const STATES_DIR: &str = "states";
const STATE_CONFIG_FILE: &str = "config.json";
const SPRITES_DIR: &str = "sprites";
const MOVE_STATE: &str = "move";
const JUMP_STATE: &str = "jump";

// --- Templates ---

/// Read-only state graph of one piece type, built once and cloned per piece.
#[derive(Debug, Clone)]
pub struct PieceTemplate {
    piece_type: String,
    nodes: Vec<StateNode>,
    idle: StateId,
}

impl PieceTemplate {
    /// Builds and wires the graph from already-parsed states.
    ///
    /// A state naming a completion target gets `auto_next` to it when that state
    /// exists; `idle` gets `Move`/`Jump` edges to `move`/`jump` when present.
    pub fn from_states(
        piece_type: &str,
        board: Board,
        moves: MoveTable,
        states: Vec<(String, StateConfig, Animation)>,
    ) -> Result<Self, ConfigError> {
        let moves = Arc::new(moves);
        let mut nodes = Vec::with_capacity(states.len());
        let mut targets = Vec::with_capacity(states.len());

        for (name, cfg, animation) in states {
            let on_finish = cfg.completion_target_state.clone().unwrap_or_else(|| IDLE_STATE.to_string());
            let rest = Motion::resolve_rest(cfg.speed, &on_finish, cfg.rest_ms);
            let motion = Motion::new((0, 0), board, cfg.speed, on_finish, rest);
            nodes.push(StateNode::new(name, Arc::clone(&moves), motion, animation));
            targets.push(cfg.completion_target_state);
        }

        let index_of = |name: &str| nodes.iter().position(|n: &StateNode| n.name() == name).map(StateId);
        let idle = index_of(IDLE_STATE).ok_or_else(|| ConfigError::MissingIdleState(piece_type.to_string()))?;
        let auto: Vec<Option<StateId>> = targets.iter()
            .map(|t| t.as_deref().and_then(index_of))
            .collect();
        let move_state = index_of(MOVE_STATE);
        let jump_state = index_of(JUMP_STATE);

        for (node, next) in nodes.iter_mut().zip(auto) {
            if let Some(next) = next { node.set_auto_next(next); }
        }
        if let Some(id) = move_state { nodes[idle.0].set_transition(CommandKind::Move.name(), id); }
        if let Some(id) = jump_state { nodes[idle.0].set_transition(CommandKind::Jump.name(), id); }

        Ok(PieceTemplate { piece_type: piece_type.to_string(), nodes, idle })
    }

    /// Loads `<dir>/moves.txt` and every `<dir>/states/<name>/config.json`.
    ///
    /// Missing moves file or states directory is fatal; a state with a missing
    /// or unreadable config is skipped.
    pub fn load(dir: &Path, piece_type: &str, board: Board) -> Result<Self, ConfigError> {
        if !dir.is_dir() {
            return Err(ConfigError::MissingPieceDir(dir.to_path_buf()));
        }
        let moves = MoveTable::load(&dir.join(MOVES_FILE))?;
        if moves.is_empty() {
            warn!(piece_type = %piece_type, "move table is empty, the piece can only jump");
        }
        let states_dir = dir.join(STATES_DIR);
        if !states_dir.is_dir() {
            return Err(ConfigError::MissingStatesDir(states_dir));
        }

        let mut state_dirs: Vec<PathBuf> = fs::read_dir(&states_dir)
            .map_err(|e| ConfigError::Io(states_dir.clone(), e))?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        state_dirs.sort(); // read_dir order is platform dependent

        let mut states = Vec::new();
        for state_dir in state_dirs {
            let Some(name) = state_dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else { continue };
            match load_state_config(&state_dir) {
                Ok(cfg) => {
                    let animation = Animation::from_sprites_dir(&state_dir.join(SPRITES_DIR), cfg.animation_fps, cfg.animation_loop);
                    debug!(piece_type = %piece_type, state = %name, frames = animation.frame_count(),
                        fps = animation.fps(), sprites = ?animation.sprites_dir(), "state loaded");
                    states.push((name, cfg, animation));
                }
                Err(e) => warn!(piece_type = %piece_type, state = %name, error = %e, "skipping state"),
            }
        }

        let template = PieceTemplate::from_states(piece_type, board, moves, states)?;
        info!(piece_type = %piece_type, states = template.nodes.len(), offsets = template.moves().offsets().len(), "piece template built");
        Ok(template)
    }

    /// Fresh, independent state machine rooted at `start`, beginning in idle.
    ///
    /// Nodes are copied in order, so every edge id keeps meaning the same state
    /// and lands in the new arena. Motion and animation are rebuilt; only the
    /// move table is shared.
    pub fn instantiate(&self, start: Cell) -> StateMachine {
        let nodes = self.nodes.iter().map(|n| n.instantiate(start)).collect();
        StateMachine::from_parts(nodes, self.idle) // idle was looked up in from_states
    }

    pub fn piece_type(&self) -> &str { &self.piece_type }
    pub fn idle(&self) -> StateId { self.idle }
    pub fn nodes(&self) -> &[StateNode] { &self.nodes }
    pub fn moves(&self) -> &Arc<MoveTable> { self.nodes[self.idle.0].moves() }

    pub fn state_names(&self) -> Vec<&str> {
        self.nodes.iter().map(StateNode::name).collect()
    }
}

fn load_state_config(state_dir: &Path) -> Result<StateConfig, ConfigError> {
    let path = state_dir.join(STATE_CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
    StateConfig::parse(&text).map_err(|e| ConfigError::Json(path, e))
}

// --- Factory ---

/// Spawns pieces from per-type templates. One factory per game session.
#[derive(Debug)]
pub struct PieceTemplateFactory {
    board: Board,
    pieces_root: PathBuf,
    counters: HashMap<String, u32>,
    templates: HashMap<String, PieceTemplate>,
}

impl PieceTemplateFactory {
    pub fn new(board: Board, pieces_root: impl Into<PathBuf>) -> Self {
        PieceTemplateFactory {
            board,
            pieces_root: pieces_root.into(),
            counters: HashMap::new(),
            templates: HashMap::new(),
        }
    }

    pub fn board(&self) -> Board { self.board }

    /// Registers a template built elsewhere; later spawns of that type use it.
    pub fn insert_template(&mut self, template: PieceTemplate) {
        self.templates.insert(template.piece_type.clone(), template);
    }

    /// Cached template for `piece_type`, loading it from disk on first use.
    pub fn template(&mut self, piece_type: &str) -> Result<&PieceTemplate, ConfigError> {
        if !self.templates.contains_key(piece_type) {
            let template = PieceTemplate::load(&self.pieces_root.join(piece_type), piece_type, self.board)?;
            self.templates.insert(piece_type.to_string(), template);
        }
        Ok(&self.templates[piece_type])
    }

    /// Spawns a piece of `piece_type` for `side` at `cell`, with id `"{type}_{n}"`.
    /// The kind comes from the type name's first letter.
    pub fn create_piece(&mut self, piece_type: &str, side: Side, cell: Cell) -> Result<Piece, ConfigError> {
        let kind = piece_type.chars().next()
            .and_then(PieceKind::from_char)
            .ok_or_else(|| ConfigError::UnknownPieceKind(piece_type.to_string()))?;
        let machine = self.template(piece_type)?.instantiate(cell);

        let counter = self.counters.entry(piece_type.to_string()).or_insert(0);
        let id = format!("{}_{}", piece_type, counter);
        *counter += 1;

        debug!(piece = %id, ?side, ?cell, "piece spawned");
        Ok(Piece::new(id, piece_type.to_string(), kind, side, self.board, machine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static SCRATCH: AtomicUsize = AtomicUsize::new(0);

    /// Throwaway pieces root under the system temp dir.
    struct Scratch(PathBuf);

    impl Scratch {
        fn new() -> Self {
            let n = SCRATCH.fetch_add(1, Ordering::SeqCst);
            let dir = std::env::temp_dir().join(format!("kungfu_chess_factory_{}_{}", std::process::id(), n));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Scratch(dir)
        }

        fn state(&self, piece: &str, state: &str, config: &str) {
            let dir = self.0.join(piece).join(STATES_DIR).join(state);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(STATE_CONFIG_FILE), config).unwrap();
        }

        fn moves(&self, piece: &str, text: &str) {
            fs::create_dir_all(self.0.join(piece)).unwrap();
            fs::write(self.0.join(piece).join(MOVES_FILE), text).unwrap();
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) { let _ = fs::remove_dir_all(&self.0); }
    }

    const IDLE: &str = r#"{"speed": 0.0, "completion_target_state": "idle", "animation_fps": 6, "animation_loop": true}"#;
    const MOVE: &str = r#"{"speed": 2.0, "completion_target_state": "idle", "animation_fps": 8, "animation_loop": true}"#;

    fn knight_root() -> Scratch {
        let s = Scratch::new();
        s.moves("NW", "1,2\n2,1\n-1,2\n-2,1\n1,-2\n2,-1\n-1,-2\n-2,-1\n");
        s.state("NW", "idle", IDLE);
        s.state("NW", "move", MOVE);
        s
    }

    #[test]
    fn ids_count_per_type() {
        let root = knight_root();
        let mut factory = PieceTemplateFactory::new(Board::default(), &root.0);
        let a = factory.create_piece("NW", Side::White, (7, 1)).unwrap();
        let b = factory.create_piece("NW", Side::White, (7, 6)).unwrap();
        assert_eq!(a.id(), "NW_0");
        assert_eq!(b.id(), "NW_1");
        assert_eq!(a.kind(), PieceKind::Knight);
        assert_eq!(b.current_cell(), (7, 6));
        assert!(b.is_idle());
    }

    #[test]
    fn template_is_wired_and_shares_its_move_table() {
        let root = knight_root();
        let mut factory = PieceTemplateFactory::new(Board::default(), &root.0);
        let template = factory.template("NW").unwrap();
        assert_eq!(template.state_names(), vec!["idle", "move"]);
        let idle = &template.nodes()[template.idle().0];
        assert_eq!(idle.transitions().get("Move"), Some(&StateId(1)));
        assert!(idle.transitions().get("Jump").is_none());
        assert_eq!(template.nodes()[1].auto_next(), Some(template.idle()));

        let a = template.instantiate((0, 0));
        let b = template.instantiate((3, 3));
        assert!(Arc::ptr_eq(a.current().moves(), b.current().moves()));
        assert!(Arc::ptr_eq(a.current().moves(), template.moves()));
    }

    #[test]
    fn clones_never_share_motion() {
        let root = knight_root();
        let mut factory = PieceTemplateFactory::new(Board::default(), &root.0);
        let mut a = factory.create_piece("NW", Side::White, (4, 4)).unwrap();
        let b = factory.create_piece("NW", Side::White, (4, 4)).unwrap();
        assert!(a.on_command(&Command::move_to(0, a.id().to_string(), (6, 5)), 0).is_accepted());
        a.update(500);
        assert_eq!(a.state_name(), "move");
        assert_eq!(b.state_name(), "idle");
        assert_eq!(b.current_cell(), (4, 4));
        for node in b.machine().nodes() {
            assert_eq!(node.motion().current_cell(), (4.0, 4.0));
            assert_eq!(node.motion().start_time(), None);
        }
        // the template itself is untouched too
        let template = factory.template("NW").unwrap();
        assert!(template.nodes().iter().all(|n| n.motion().start_time().is_none()));
    }

    #[test]
    fn malformed_state_is_skipped() {
        let root = knight_root();
        root.state("NW", "jump", "{ not json");
        fs::create_dir_all(root.0.join("NW").join(STATES_DIR).join("short_rest")).unwrap(); // no config
        let mut factory = PieceTemplateFactory::new(Board::default(), &root.0);
        let template = factory.template("NW").unwrap();
        assert_eq!(template.state_names(), vec!["idle", "move"]);
    }

    #[test]
    fn load_failures_are_fatal() {
        let root = Scratch::new();
        let mut factory = PieceTemplateFactory::new(Board::default(), &root.0);
        assert!(matches!(factory.create_piece("QW", Side::White, (0, 0)), Err(ConfigError::MissingPieceDir(_))));

        fs::create_dir_all(root.0.join("QW")).unwrap();
        assert!(matches!(factory.create_piece("QW", Side::White, (0, 0)), Err(ConfigError::MissingMoveFile(_))));

        root.moves("QW", "0,1\n");
        assert!(matches!(factory.create_piece("QW", Side::White, (0, 0)), Err(ConfigError::MissingStatesDir(_))));

        root.state("QW", "move", MOVE);
        assert!(matches!(factory.create_piece("QW", Side::White, (0, 0)), Err(ConfigError::MissingIdleState(_))));

        assert!(matches!(factory.create_piece("XW", Side::White, (0, 0)), Err(ConfigError::UnknownPieceKind(_))));
    }

    #[test]
    fn in_memory_templates_skip_the_filesystem() {
        let states = vec![
            (IDLE_STATE.to_string(), StateConfig::parse(IDLE).unwrap(), Animation::new(1, 6.0, true)),
            ("jump".to_string(), StateConfig::parse(r#"{"completion_target_state": "short_rest"}"#).unwrap(), Animation::new(1, 6.0, true)),
        ];
        let template = PieceTemplate::from_states("KB", Board::default(), MoveTable::new([(0, 1)]), states).unwrap();
        // jump names a missing successor: no auto edge, default rest applies
        assert_eq!(template.nodes()[1].auto_next(), None);
        assert_eq!(template.nodes()[1].motion().rest_ms(), Some(crate::motion::DEFAULT_REST_MS));

        let mut factory = PieceTemplateFactory::new(Board::default(), "/nonexistent");
        factory.insert_template(template);
        let king = factory.create_piece("KB", Side::Black, (0, 4)).unwrap();
        assert_eq!(king.kind(), PieceKind::King);
        assert_eq!(king.side(), Side::Black);
    }
}
