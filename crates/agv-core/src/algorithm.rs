//! Shortest-path algorithm selector shared by the planner and the control
//! surface.

use std::str::FromStr;

use crate::CoreError;

/// Which search the planner runs for a routing request.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlanAlgorithm {
    /// Uniform-cost search.
    #[default]
    Dijkstra,
    /// Uniform-cost search guided by the straight-line distance to the goal.
    AStar,
}

impl PlanAlgorithm {
    /// Every variant, in declaration order.
    pub const ALL: [PlanAlgorithm; 2] = [PlanAlgorithm::Dijkstra, PlanAlgorithm::AStar];

    /// Canonical lower-case name, as accepted by the control surface.
    pub fn as_str(self) -> &'static str {
        match self {
            PlanAlgorithm::Dijkstra => "dijkstra",
            PlanAlgorithm::AStar    => "a_star",
        }
    }
}

impl std::fmt::Display for PlanAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dijkstra" => Ok(PlanAlgorithm::Dijkstra),
            "a_star" | "astar" | "a*" | "a-star" => Ok(PlanAlgorithm::AStar),
            other => Err(CoreError::Parse(format!("unknown planning algorithm `{other}`"))),
        }
    }
}
