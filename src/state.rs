// src/state.rs
use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::animation::Animation;
use crate::command::{Command, CommandKind};
use crate::motion::Motion;
use crate::moves::MoveTable;

/// Handle of a node inside one state machine's arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub usize);

/// One behaviour of a piece (idle, move, jump, rest...).
#[derive(Debug, Clone)]
pub struct StateNode {
    name: String,
    moves: Arc<MoveTable>, // shared by every piece of the type, never mutated
    motion: Motion,
    animation: Animation,
    transitions: HashMap<String, StateId>, // event name -> node
    auto_next: Option<StateId>,
}

impl StateNode {
    pub fn new(name: impl Into<String>, moves: Arc<MoveTable>, motion: Motion, animation: Animation) -> Self {
        StateNode {
            name: name.into(),
            moves,
            motion,
            animation,
            transitions: HashMap::new(),
            auto_next: None,
        }
    }

    pub fn set_transition(&mut self, event: impl Into<String>, target: StateId) {
        self.transitions.insert(event.into(), target);
    }

    pub fn set_auto_next(&mut self, target: StateId) {
        self.auto_next = Some(target);
    }

    /// Starts this state for `cmd`. A `Move` with a malformed destination keeps the
    /// old target; the clocks are reset regardless.
    pub fn reset(&mut self, cmd: &Command) {
        if cmd.kind() == CommandKind::Move {
            if let Some(dest) = cmd.cell_param() {
                self.motion.set_target(dest);
            }
        }
        self.animation.reset(cmd.timestamp());
        self.motion.reset(cmd.timestamp());
    }

    /// Advances clocks and returns the completion signal, if any.
    fn advance(&mut self, now: u64) -> Option<String> {
        self.animation.update(now);
        let signal = self.motion.update(now);
        if signal.is_none() && !self.animation.is_looping() && self.animation.is_finished() {
            return Some(self.motion.on_finish().to_string());
        }
        signal
    }

    /// Copy of this node with fresh motion/animation rooted at `start`; edges kept.
    pub fn instantiate(&self, start: (i32, i32)) -> Self {
        StateNode {
            name: self.name.clone(),
            moves: Arc::clone(&self.moves),
            motion: self.motion.rooted_at(start),
            animation: self.animation.fresh_copy(),
            transitions: self.transitions.clone(),
            auto_next: self.auto_next,
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn moves(&self) -> &Arc<MoveTable> { &self.moves }
    pub fn motion(&self) -> &Motion { &self.motion }
    pub fn motion_mut(&mut self) -> &mut Motion { &mut self.motion }
    pub fn animation(&self) -> &Animation { &self.animation }
    pub fn transitions(&self) -> &HashMap<String, StateId> { &self.transitions }
    pub fn auto_next(&self) -> Option<StateId> { self.auto_next }
}

/// A piece's state graph: an arena of nodes plus the current node.
///
/// Edges are ids into `nodes`, so cycles (idle -> move -> rest -> idle) need no
/// shared ownership, and a cloned arena only ever points at its own nodes.
#[derive(Debug, Clone)]
pub struct StateMachine {
    nodes: Vec<StateNode>,
    current: StateId,
}

impl StateMachine {
    /// Returns `None` if `current` is not a node of `nodes`.
    pub fn new(nodes: Vec<StateNode>, current: StateId) -> Option<Self> {
        (current.0 < nodes.len()).then_some(StateMachine { nodes, current })
    }

    /// Caller guarantees `current` indexes `nodes`.
    pub(crate) fn from_parts(nodes: Vec<StateNode>, current: StateId) -> Self {
        debug_assert!(current.0 < nodes.len());
        StateMachine { nodes, current }
    }

    pub fn current_id(&self) -> StateId { self.current }
    pub fn current(&self) -> &StateNode { &self.nodes[self.current.0] }
    pub fn node(&self, id: StateId) -> Option<&StateNode> { self.nodes.get(id.0) }
    pub fn nodes(&self) -> &[StateNode] { &self.nodes }

    pub fn find(&self, name: &str) -> Option<StateId> {
        self.nodes.iter().position(|n| n.name == name).map(StateId)
    }

    /// Resets the current node with `cmd` without changing state.
    pub fn reset(&mut self, cmd: &Command) {
        let cur = self.current.0;
        self.nodes[cur].reset(cmd);
    }

    /// Advances the current node. Returns the id entered when an autonomous
    /// transition was taken.
    pub fn update(&mut self, now: u64) -> Option<StateId> {
        let cur = self.current;
        let signal = self.nodes[cur.0].advance(now)?;
        let node = &self.nodes[cur.0];
        let target = node.auto_next.or_else(|| node.transitions.get(&signal).copied())?;

        self.hand_over(cur, target);
        let next = &mut self.nodes[target.0];
        next.animation.reset(now);
        next.motion.reset(now);
        trace!(from = %self.nodes[cur.0].name, to = %self.nodes[target.0].name, signal = %signal, "state finished");
        self.current = target;
        Some(target)
    }

    /// Dispatches `cmd`; returns the id entered, or `None` when the current state
    /// has no transition for the command.
    pub fn process_command(&mut self, cmd: &Command, _now: u64) -> Option<StateId> {
        let cur = self.current;
        let target = *self.nodes[cur.0].transitions.get(cmd.kind().name())?;
        // Jump pins the target in place; Move starts its travel from here too.
        self.hand_over(cur, target);
        self.nodes[target.0].reset(cmd);
        self.current = target;
        Some(target)
    }

    /// Carries the position and transition table from `from` into `to`.
    fn hand_over(&mut self, from: StateId, to: StateId) {
        let pos = self.nodes[from.0].motion.current_cell();
        let table = self.nodes[from.0].transitions.clone();
        let next = &mut self.nodes[to.0];
        next.motion.pin_to(pos);
        next.transitions = table;
    }
}
