//! Per-vehicle state.

use std::fmt;

use agv_core::{AgentId, NodeId, Tick};

/// Why a vehicle did not make progress this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    /// The next node is occupied by another vehicle.
    NodeOccupied { node: NodeId, by: AgentId },
    /// Moving on would bring the vehicle within its collision radius of
    /// another vehicle.
    Collision { with: AgentId },
}

/// Bookkeeping for a blocked vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    pub reason: WaitReason,
    /// Tick on which the current blocking spell began.
    pub since: Tick,
    /// Consecutive ticks spent blocked.
    pub ticks: u32,
}

/// A route being followed.
///
/// `route[cursor]` is always the vehicle's current node.  `target`, when
/// set, is the committed next hop `route[cursor + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    pub route: Vec<NodeId>,
    pub cursor: usize,
    pub target: Option<NodeId>,
}

impl Journey {
    /// Next hop after the current node, if the route continues.
    #[inline]
    pub fn next_hop(&self) -> Option<NodeId> {
        self.route.get(self.cursor + 1).copied()
    }

    /// Final node of the route.
    #[inline]
    pub fn goal(&self) -> Option<NodeId> {
        self.route.last().copied()
    }

    /// Nodes not yet reached, starting at the current one.
    pub fn remaining(&self) -> &[NodeId] {
        &self.route[self.cursor.min(self.route.len())..]
    }
}

/// Explicit vehicle state.  Waiting only exists on top of a journey, so a
/// vehicle can never be "waiting while idle".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AgentState {
    /// No route and no committed hop.
    #[default]
    Idle,
    /// Following a route, possibly mid-hop.
    Following(Journey),
    /// Following a route but blocked this tick.
    Waiting(Journey, Wait),
    /// Halted by an explicit stop.  Accepts new routes like `Idle`.
    Stopped,
}

impl AgentState {
    pub fn journey(&self) -> Option<&Journey> {
        match self {
            AgentState::Following(j) | AgentState::Waiting(j, _) => Some(j),
            AgentState::Idle | AgentState::Stopped => None,
        }
    }

    pub fn journey_mut(&mut self) -> Option<&mut Journey> {
        match self {
            AgentState::Following(j) | AgentState::Waiting(j, _) => Some(j),
            AgentState::Idle | AgentState::Stopped => None,
        }
    }

    pub fn wait(&self) -> Option<&Wait> {
        match self {
            AgentState::Waiting(_, w) => Some(w),
            _ => None,
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentState::Idle => f.write_str("idle"),
            AgentState::Stopped => f.write_str("stopped"),
            AgentState::Following(j) => match (j.target, j.goal()) {
                (Some(t), _) => write!(f, "moving to {t}"),
                (None, Some(g)) => write!(f, "en route to {g}"),
                (None, None) => f.write_str("en route"),
            },
            AgentState::Waiting(_, w) => match w.reason {
                WaitReason::NodeOccupied { node, .. } => write!(f, "waiting for {node}"),
                WaitReason::Collision { with } => write!(f, "yielding to {with}"),
            },
        }
    }
}

/// What a call to [`Agent::advance`](crate::Agent::advance) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    /// Nothing to do.
    Idle,
    /// Committed to the next hop `to` (reserved, heading set).
    Departed { to: NodeId },
    /// Turned towards the target heading without translating.
    Rotating,
    /// Translated one step towards the target.
    Moved,
    /// Reached `node`; `finished` if it was the end of the route.
    Arrived { node: NodeId, finished: bool },
    /// Made no progress.
    Blocked(WaitReason),
}
