//! `agv-sim` — fleet registry, control surface and fixed-timestep tick loop.
//!
//! # Tick
//!
//! ```text
//! every tick:
//!   ① Reservations — every countdown drops by one; zero releases the node.
//!   ② Motion       — each agent advances once, in insertion order, seeing
//!                    the positions earlier agents reached this tick.
//!   ③ Highlights   — active edges (current → committed hop) and planned
//!                    edges (rest of each route) are rebuilt.
//! ```
//!
//! The tick is count-based: `SimConfig::tick_rate_hz` only maps ticks to
//! seconds for display.  A fixed seed and the fixed agent order make runs
//! reproducible.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use agv_core::PlanAlgorithm;
//! use agv_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(graph).config(config).build()?;
//! let agv = sim.add_agent(None)?;
//! sim.assign_target(agv, goal, PlanAlgorithm::AStar)?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::{AgentSummary, EdgeClass, MapSummary, Simulation, TickReport};
