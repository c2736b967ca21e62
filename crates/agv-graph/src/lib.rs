//! `agv-graph` — the shared node graph, its mutual-exclusion state, routing
//! and static zones.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`network`]   | `GraphModel` (CSR + R-tree), `GraphBuilder`, records      |
//! | [`occupancy`] | `NodeState`, occupancy and reservation operations         |
//! | [`planner`]   | `Planner` trait, `Route`, `DijkstraPlanner`, `AStarPlanner` |
//! | [`zones`]     | `ZoneManager`                                             |
//! | [`error`]     | `GraphError`, `GraphResult<T>`                            |
//!
//! # Concurrency
//!
//! Nothing here locks.  The simulation mutates occupancy from a single thread
//! and every claimant checks before claiming; concurrent external mutation of
//! a `GraphModel` is outside the contract.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public record types.    |

pub mod error;
pub mod network;
pub mod occupancy;
pub mod planner;
pub mod zones;

#[cfg(test)]
mod tests;

pub use error::{GraphError, GraphResult};
pub use network::{EdgeRecord, GraphBuilder, GraphModel, NodeRecord};
pub use occupancy::NodeState;
pub use planner::{AStarPlanner, CostModel, DijkstraPlanner, Planner, Route, plan};
pub use zones::ZoneManager;
