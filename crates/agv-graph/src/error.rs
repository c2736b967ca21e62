//! Graph-subsystem error type.

use thiserror::Error;

use agv_core::{AgentId, NodeId};

/// Errors produced by `agv-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {0} not found in graph")]
    NodeNotFound(NodeId),

    #[error("unknown node key `{0}`")]
    UnknownNodeKey(String),

    #[error("node key `{0}` declared twice")]
    DuplicateNodeKey(String),

    /// Raised by an occupancy claim on a node another agent holds.  The
    /// motion protocol checks before claiming, so seeing this means the
    /// at-most-one-occupant invariant was about to break.
    #[error("node {node} is occupied by {by}")]
    NodeOccupied { node: NodeId, by: AgentId },
}

pub type GraphResult<T> = Result<T, GraphError>;
