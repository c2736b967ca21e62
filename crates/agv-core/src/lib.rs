//! `agv-core` — foundational types for the AGV fleet simulator.
//!
//! This crate is a dependency of every other `agv-*` crate.  It has no
//! `agv-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `NodeId`, `EdgeId`                         |
//! | [`geo`]         | `Point`, heading and angle helpers                    |
//! | [`time`]        | `Tick`, `SimClock`                                    |
//! | [`config`]      | `SimConfig`, `MotionConfig`                           |
//! | [`rng`]         | `SimRng` (seeded, simulation-level)                   |
//! | [`algorithm`]   | `PlanAlgorithm` enum                                  |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod algorithm;
pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use algorithm::PlanAlgorithm;
pub use config::{MotionConfig, SimConfig};
pub use error::{CoreError, CoreResult};
pub use geo::Point;
pub use ids::{AgentId, EdgeId, NodeId};
pub use rng::SimRng;
pub use time::{SimClock, Tick};
