use agv_core::{AgentId, NodeId};
use agv_graph::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("node {node} is occupied by {by}")]
    NodeOccupied { node: NodeId, by: AgentId },

    #[error("{to} is not connected to {from}")]
    NotAdjacent { from: NodeId, to: NodeId },

    #[error("route of {0} node(s) needs no movement")]
    RouteTooShort(usize),

    #[error("route expected {expected} but has {got}")]
    RouteMismatch { expected: NodeId, got: NodeId },

    #[error("agent {0} is already committed to a hop")]
    InFlight(AgentId),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type MotionResult<T> = Result<T, MotionError>;
