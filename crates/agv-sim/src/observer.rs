//! Simulation observer trait for progress reporting and data collection.

use agv_core::{AgentId, Tick};
use agv_motion::MotionEvent;

use crate::TickReport;

/// Callbacks invoked by [`Simulation::step`][crate::Simulation::step] at key
/// points in the tick.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: arrival logger
///
/// ```rust,ignore
/// struct Arrivals(Vec<(Tick, AgentId, NodeId)>);
///
/// impl SimObserver for Arrivals {
///     fn on_agent_event(&mut self, tick: Tick, agent: AgentId, event: &MotionEvent) {
///         if let MotionEvent::Arrived { node, .. } = event {
///             self.0.push((tick, agent, *node));
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before reservations decay.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called once per agent per tick, right after it moved.
    fn on_agent_event(&mut self, _tick: Tick, _agent: AgentId, _event: &MotionEvent) {}

    /// Called at the end of each tick, after the edge highlights are rebuilt.
    fn on_tick_end(&mut self, _report: &TickReport) {}

    /// Called once after [`Simulation::run`][crate::Simulation::run] finishes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
