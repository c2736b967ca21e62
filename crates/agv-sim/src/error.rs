use agv_core::{AgentId, CoreError};
use agv_graph::GraphError;
use agv_motion::MotionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("the graph has no nodes")]
    EmptyGraph,

    #[error("every node is occupied")]
    NoFreeNode,

    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("occupancy invariant violated: {0}")]
    InvariantViolation(String),

    #[error("motion error: {0}")]
    Motion(#[from] MotionError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;
