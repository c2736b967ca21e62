//! The `Simulation` struct: fleet registry, control surface and tick loop.

use agv_core::{AgentId, EdgeId, NodeId, PlanAlgorithm, Point, SimClock, SimConfig, SimRng, Tick};
use agv_graph::{CostModel, GraphError, GraphModel, Route, ZoneManager, plan};
use agv_motion::{Agent, MotionEvent, StepOutcome};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::{NoopObserver, SimError, SimObserver, SimResult};

// ── Reports & summaries ───────────────────────────────────────────────────────

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub tick: Tick,
    /// Agents that made progress without reaching a node (departed, turned
    /// or translated).
    pub moved: usize,
    /// Agents blocked this tick.
    pub waiting: usize,
    /// Agents that reached a node this tick.
    pub arrived: usize,
    /// Reservations that ran out this tick.
    pub expired_reservations: usize,
}

/// How an edge should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeClass {
    #[default]
    Normal,
    /// Part of some agent's remaining route.
    Planned,
    /// Some agent is currently travelling along it.
    Active,
}

/// One row of the fleet listing.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSummary {
    pub id:      AgentId,
    pub node:    NodeId,
    pub pos:     Point,
    pub status:  String,
    pub waiting: bool,
}

/// Map statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSummary {
    pub node_count:            usize,
    pub edge_count:            usize,
    pub agent_count:           usize,
    pub zone_count:            usize,
    pub controlled_node_count: usize,
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// Owns the graph, the zones and every agent, and drives the tick:
///
/// 1. **Reservations**: every countdown drops by one; expired reservations
///    are released.
/// 2. **Motion**: each agent advances exactly once, in the order agents were
///    added.  Earlier agents win contested nodes within a tick.
/// 3. **Highlights**: the active and planned edge sets are rebuilt.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Simulation {
    pub config: SimConfig,

    pub clock: SimClock,

    pub(crate) graph: GraphModel,

    pub(crate) zones: ZoneManager,

    pub(crate) agents: FxHashMap<AgentId, Agent>,

    /// Insertion order; the per-tick processing order.
    pub(crate) order: Vec<AgentId>,

    pub(crate) next_id: u32,

    pub(crate) rng: SimRng,

    pub(crate) collision_enabled: bool,

    pub(crate) active: Vec<EdgeId>,

    pub(crate) planned: Vec<(EdgeId, AgentId)>,
}

impl Simulation {
    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Advance one tick without callbacks.
    pub fn tick(&mut self) -> SimResult<TickReport> {
        self.step(&mut NoopObserver)
    }

    /// Advance one tick, reporting to `observer`.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<TickReport> {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);
        let report = self.process_tick(now, observer)?;
        observer.on_tick_end(&report);
        self.clock.advance();
        Ok(report)
    }

    /// Run exactly `n` ticks from the current position (ignores
    /// `config.total_ticks`).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// Run until the clock reaches `config.total_ticks`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.clock.current_tick.0 < self.config.total_ticks {
            self.step(observer)?;
        }
        observer.on_sim_end(self.clock.current_tick);
        Ok(())
    }

    fn process_tick<O: SimObserver>(&mut self, now: Tick, observer: &mut O) -> SimResult<TickReport> {
        let mut report = TickReport { tick: now, ..TickReport::default() };

        // ── Phase 1: reservation decay ────────────────────────────────────
        report.expired_reservations = self.graph.tick_reservations();

        // ── Phase 2: motion ───────────────────────────────────────────────
        //
        // Positions are refreshed as each agent moves, so later agents see
        // where earlier ones ended up this tick.
        let mut positions: Vec<(AgentId, Point)> = self
            .order
            .iter()
            .filter_map(|id| self.agents.get(id).map(|a| (*id, a.pos)))
            .collect();

        for (i, id) in self.order.iter().enumerate() {
            let Some(agent) = self.agents.get_mut(id) else { continue };
            let event = agent.advance(&mut self.graph, &positions, now)?;
            if let Some(slot) = positions.get_mut(i) {
                slot.1 = agent.pos;
            }
            match event {
                MotionEvent::Idle => {}
                MotionEvent::Departed { .. } | MotionEvent::Rotating | MotionEvent::Moved => {
                    report.moved += 1;
                }
                MotionEvent::Arrived { .. } => report.arrived += 1,
                MotionEvent::Blocked(_) => report.waiting += 1,
            }
            observer.on_agent_event(now, *id, &event);
        }

        // ── Phase 3: highlights ───────────────────────────────────────────
        self.refresh_edges();

        Ok(report)
    }

    /// Rebuild the active and planned edge sets from the agents' state.
    fn refresh_edges(&mut self) {
        self.active.clear();
        self.planned.clear();
        for id in &self.order {
            let Some(agent) = self.agents.get(id) else { continue };
            let Some(journey) = agent.state().journey() else { continue };

            let remaining = journey.remaining();
            let mut hops = remaining.windows(2);
            if let Some(t) = journey.target {
                if let Some(e) = self.graph.find_edge(agent.current(), t) {
                    self.active.push(e);
                }
                hops.next();
            }
            for w in hops {
                if let Some(e) = self.graph.find_edge(w[0], w[1]) {
                    self.planned.push((e, *id));
                }
            }
        }
        self.active.sort_unstable();
        self.active.dedup();
    }

    // ── Fleet management ──────────────────────────────────────────────────

    /// Add an agent on `start`, or on a random free node when `None`.
    pub fn add_agent(&mut self, start: Option<NodeId>) -> SimResult<AgentId> {
        if self.graph.is_empty() {
            return Err(SimError::EmptyGraph);
        }
        let node = match start {
            Some(n) => n,
            None => {
                let free = self.graph.free_nodes();
                *self.rng.choose(&free).ok_or(SimError::NoFreeNode)?
            }
        };

        let id = AgentId(self.next_id);
        let mut agent = Agent::spawn(id, node, &mut self.graph, &self.config)?;
        if !self.collision_enabled {
            agent.set_collision_radius(0.0);
        }
        self.next_id += 1;
        self.agents.insert(id, agent);
        self.order.push(id);
        info!(agent = %id, node = %node, "agent added");
        Ok(id)
    }

    /// Add up to `n` agents on random free nodes.  Stops early once the map
    /// is full.
    pub fn add_agents(&mut self, n: usize) -> SimResult<Vec<AgentId>> {
        let mut added = Vec::with_capacity(n);
        for _ in 0..n {
            match self.add_agent(None) {
                Ok(id) => added.push(id),
                Err(SimError::NoFreeNode) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }

    /// Remove an agent, releasing its node and reservation.
    pub fn remove_agent(&mut self, id: AgentId) -> SimResult<()> {
        let agent = self.agents.remove(&id).ok_or(SimError::AgentNotFound(id))?;
        self.order.retain(|&a| a != id);
        agent.destroy(&mut self.graph);
        self.refresh_edges();
        info!(agent = %id, "agent removed");
        Ok(())
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Plan a route to `goal` and hand it to the agent.
    ///
    /// An agent in the middle of a hop keeps it: the new route is planned
    /// from the committed node and prefixed with the current one.  The
    /// returned [`Route`] is the route actually assigned.
    pub fn assign_target(
        &mut self,
        id:        AgentId,
        goal:      NodeId,
        algorithm: PlanAlgorithm,
    ) -> SimResult<Route> {
        let agent = self.agents.get_mut(&id).ok_or(SimError::AgentNotFound(id))?;
        let cost = CostModel { busy_penalty: self.config.busy_node_penalty };

        let route = match agent.target() {
            None => plan(algorithm, &self.graph, agent.current(), goal, Some(id), cost)?,
            Some(committed) => {
                let tail = plan(algorithm, &self.graph, committed, goal, Some(id), cost)?;
                let hop = self
                    .graph
                    .find_edge(agent.current(), committed)
                    .map_or(0.0, |e| cost.edge_cost(&self.graph, e, Some(id)));
                let mut nodes = Vec::with_capacity(tail.len() + 1);
                nodes.push(agent.current());
                nodes.extend(tail.nodes);
                Route { nodes, cost: hop + tail.cost }
            }
        };

        agent.assign_route(route.nodes.clone(), &self.graph)?;
        info!(agent = %id, goal = %goal, %algorithm, hops = route.len() - 1, "route assigned");
        self.refresh_edges();
        Ok(route)
    }

    /// [`assign_target`](Self::assign_target) with the goal given by node key
    /// and the algorithm by name.
    pub fn assign_target_named(
        &mut self,
        id:        AgentId,
        goal:      &str,
        algorithm: &str,
    ) -> SimResult<Route> {
        let node = self
            .graph
            .lookup(goal)
            .ok_or_else(|| GraphError::UnknownNodeKey(goal.to_owned()))?;
        let algorithm: PlanAlgorithm = algorithm.parse()?;
        self.assign_target(id, node, algorithm)
    }

    /// Move an agent one hop onto a neighbouring node.
    pub fn step_agent(&mut self, id: AgentId, node: NodeId) -> SimResult<StepOutcome> {
        let now = self.clock.current_tick;
        let agent = self.agents.get_mut(&id).ok_or(SimError::AgentNotFound(id))?;
        let outcome = agent.request_step(node, &mut self.graph, now)?;
        self.refresh_edges();
        Ok(outcome)
    }

    /// Halt one agent on the nearest node it can claim.
    pub fn stop_agent(&mut self, id: AgentId) -> SimResult<()> {
        let agent = self.agents.get_mut(&id).ok_or(SimError::AgentNotFound(id))?;
        agent.stop(&mut self.graph)?;
        self.refresh_edges();
        Ok(())
    }

    pub fn stop_all(&mut self) -> SimResult<()> {
        for id in &self.order {
            if let Some(agent) = self.agents.get_mut(id) {
                agent.stop(&mut self.graph)?;
            }
        }
        self.refresh_edges();
        Ok(())
    }

    /// Turn collision avoidance on or off for every agent, present and future.
    pub fn set_collision_enabled(&mut self, enabled: bool) {
        self.collision_enabled = enabled;
        let radius = if enabled { self.config.motion.collision_radius } else { 0.0 };
        for agent in self.agents.values_mut() {
            agent.set_collision_radius(radius);
        }
        debug!(enabled, radius, "collision detection toggled");
    }

    pub fn collision_enabled(&self) -> bool {
        self.collision_enabled
    }

    /// Give every idle or stopped agent a random goal and a random
    /// algorithm.  An empty fleet is first seeded with three agents.
    ///
    /// Agents whose goal turns out unreachable are skipped.  Returns the
    /// number of agents that received a route.
    pub fn dispatch_random_tasks(&mut self) -> SimResult<usize> {
        if self.agents.is_empty() {
            self.add_agents(3)?;
        }

        let nodes: Vec<NodeId> = self.graph.nodes().collect();
        let idle: Vec<(AgentId, NodeId)> = self
            .order
            .iter()
            .filter_map(|id| self.agents.get(id))
            .filter(|a| a.is_available())
            .map(|a| (a.id, a.current()))
            .collect();

        let mut dispatched = 0;
        for (id, current) in idle {
            let candidates: Vec<NodeId> = nodes.iter().copied().filter(|&n| n != current).collect();
            let Some(&goal) = self.rng.choose(&candidates) else { continue };
            let Some(&algorithm) = self.rng.choose(&PlanAlgorithm::ALL) else { continue };
            match self.assign_target(id, goal, algorithm) {
                Ok(_) => dispatched += 1,
                Err(SimError::Graph(GraphError::NoRoute { .. })) => {
                    debug!(agent = %id, goal = %goal, "random goal unreachable");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(dispatched)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn now(&self) -> Tick {
        self.clock.current_tick
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn zones(&self) -> &ZoneManager {
        &self.zones
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Every agent, in insertion order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.order.iter().filter_map(|id| self.agents.get(id))
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn agent_summaries(&self) -> Vec<AgentSummary> {
        self.agents()
            .map(|a| AgentSummary {
                id:      a.id,
                node:    a.current(),
                pos:     a.pos,
                status:  a.status(),
                waiting: a.is_waiting(),
            })
            .collect()
    }

    pub fn map_summary(&self) -> MapSummary {
        MapSummary {
            node_count:            self.graph.node_count(),
            edge_count:            self.graph.edge_count(),
            agent_count:           self.agents.len(),
            zone_count:            self.zones.zone_count(),
            controlled_node_count: self.zones.controlled_node_count(),
        }
    }

    /// Edges some agent is currently travelling along, sorted.
    pub fn active_edges(&self) -> &[EdgeId] {
        &self.active
    }

    /// Edges on agents' remaining routes beyond the current hop, with the
    /// owning agent.
    pub fn planned_edges(&self) -> &[(EdgeId, AgentId)] {
        &self.planned
    }

    pub fn edge_class(&self, edge: EdgeId) -> EdgeClass {
        if self.active.binary_search(&edge).is_ok() {
            EdgeClass::Active
        } else if self.planned.iter().any(|(e, _)| *e == edge) {
            EdgeClass::Planned
        } else {
            EdgeClass::Normal
        }
    }

    /// Audit occupancy: every agent holds exactly its current node and every
    /// occupied node is held by the live agent standing on it.
    pub fn check_invariants(&self) -> SimResult<()> {
        for agent in self.agents() {
            match self.graph.occupant(agent.current()) {
                Some(by) if by == agent.id => {}
                other => {
                    return Err(SimError::InvariantViolation(format!(
                        "{} stands on {} but the node is held by {:?}",
                        agent.id,
                        agent.current(),
                        other
                    )));
                }
            }
        }
        let mut held = 0;
        for (node, by) in self.graph.occupants() {
            held += 1;
            match self.agents.get(&by) {
                Some(a) if a.current() == node => {}
                Some(a) => {
                    return Err(SimError::InvariantViolation(format!(
                        "{node} is held by {by}, which stands on {}",
                        a.current()
                    )));
                }
                None => {
                    return Err(SimError::InvariantViolation(format!(
                        "{node} is held by unknown agent {by}"
                    )));
                }
            }
        }
        if held != self.agents.len() {
            return Err(SimError::InvariantViolation(format!(
                "{held} nodes held by {} agents",
                self.agents.len()
            )));
        }
        Ok(())
    }
}
