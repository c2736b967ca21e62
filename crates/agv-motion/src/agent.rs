//! A single vehicle: route following, turning, straight-line travel and the
//! occupancy hand-off between nodes.

use agv_core::geo::{normalize_deg, shortest_turn_deg};
use agv_core::{AgentId, MotionConfig, NodeId, Point, SimConfig, Tick};
use agv_graph::GraphModel;
use tracing::{debug, trace};

use crate::{AgentState, Journey, MotionError, MotionEvent, MotionResult, Wait, WaitReason};

/// Placeholder priority.  Carried for callers that display it; nothing
/// compares priorities.
pub const DEFAULT_PRIORITY: u8 = 5;

/// Result of [`Agent::request_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The hop is reserved and the vehicle is moving towards it.
    Committed,
    /// The node is held by someone else; the vehicle is waiting.
    Blocked(WaitReason),
}

/// One vehicle.
///
/// The vehicle always occupies exactly one node, `current`, and
/// `graph.occupant(current) == Some(id)` holds between ticks.  Its continuous
/// `pos` coincides with `current`'s coordinate except while a hop is in
/// progress.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,

    current: NodeId,

    /// Continuous position, decoupled from `current` while moving.
    pub pos: Point,

    /// Heading in degrees, `[0, 360)`.
    pub heading: f32,

    /// Heading towards the committed hop.
    pub target_heading: f32,

    /// Clearance kept to other vehicles; zero disables avoidance.
    pub collision_radius: f32,

    pub priority: u8,

    motion: MotionConfig,

    reservation_ticks: u32,

    state: AgentState,
}

impl Agent {
    /// Place a new vehicle on `node` and claim it.
    ///
    /// # Errors
    ///
    /// [`MotionError::NodeNotFound`] if `node` is not in the graph,
    /// [`MotionError::NodeOccupied`] if another vehicle holds it.
    pub fn spawn(
        id:     AgentId,
        node:   NodeId,
        graph:  &mut GraphModel,
        config: &SimConfig,
    ) -> MotionResult<Self> {
        if !graph.contains(node) {
            return Err(MotionError::NodeNotFound(node));
        }
        if let Some(by) = graph.occupant(node) {
            return Err(MotionError::NodeOccupied { node, by });
        }
        graph.occupy(node, id)?;
        Ok(Self {
            id,
            current: node,
            pos: graph.pos(node),
            heading: 0.0,
            target_heading: 0.0,
            collision_radius: config.motion.collision_radius,
            priority: DEFAULT_PRIORITY,
            motion: config.motion.clone(),
            reservation_ticks: config.reservation_ticks,
            state: AgentState::Idle,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// The node this vehicle occupies.
    #[inline]
    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// The committed next hop, if moving.
    pub fn target(&self) -> Option<NodeId> {
        self.state.journey().and_then(|j| j.target)
    }

    /// The final node of the current route.
    pub fn task_target(&self) -> Option<NodeId> {
        self.state.journey().and_then(Journey::goal)
    }

    pub fn route(&self) -> Option<&[NodeId]> {
        self.state.journey().map(|j| j.route.as_slice())
    }

    /// `true` while a hop is committed (including while blocked on it).
    pub fn is_moving(&self) -> bool {
        self.target().is_some()
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.state, AgentState::Waiting(..))
    }

    /// `true` if the vehicle has no route (idle or stopped).
    pub fn is_available(&self) -> bool {
        self.state.journey().is_none()
    }

    /// Consecutive ticks blocked; zero when not waiting.
    pub fn wait_ticks(&self) -> u32 {
        self.state.wait().map_or(0, |w| w.ticks)
    }

    /// Human-readable status line.
    pub fn status(&self) -> String {
        self.state.to_string()
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Start following `route`.
    ///
    /// `route[0]` must be the current node and consecutive nodes must be
    /// connected.  If a hop is already committed, `route[1]` must be that
    /// hop; it is kept rather than abandoned mid-edge.
    pub fn assign_route(&mut self, route: Vec<NodeId>, graph: &GraphModel) -> MotionResult<()> {
        if route.len() <= 1 {
            return Err(MotionError::RouteTooShort(route.len()));
        }
        if route[0] != self.current {
            return Err(MotionError::RouteMismatch { expected: self.current, got: route[0] });
        }
        let target = self.target();
        if let Some(t) = target
            && route[1] != t
        {
            return Err(MotionError::RouteMismatch { expected: t, got: route[1] });
        }
        for w in route.windows(2) {
            if !graph.is_connected(w[0], w[1]) {
                return Err(MotionError::NotAdjacent { from: w[0], to: w[1] });
            }
        }
        self.state = AgentState::Following(Journey { route, cursor: 0, target });
        Ok(())
    }

    /// Commit to moving onto the neighbouring `node`.
    ///
    /// An idle or stopped vehicle gets a single-hop journey.  A vehicle on a
    /// route may only request its next hop.  If `node` is held by another
    /// vehicle the request fails softly: the vehicle enters `Waiting` and the
    /// per-tick driver tries again.
    pub fn request_step(
        &mut self,
        node:  NodeId,
        graph: &mut GraphModel,
        now:   Tick,
    ) -> MotionResult<StepOutcome> {
        if !graph.is_connected(self.current, node) {
            return Err(MotionError::NotAdjacent { from: self.current, to: node });
        }
        match self.state.journey() {
            None => {
                self.state = AgentState::Following(Journey {
                    route:  vec![self.current, node],
                    cursor: 0,
                    target: None,
                });
            }
            Some(j) if j.target.is_some() => return Err(MotionError::InFlight(self.id)),
            Some(j) => {
                if let Some(next) = j.next_hop()
                    && next != node
                {
                    return Err(MotionError::RouteMismatch { expected: next, got: node });
                }
            }
        }

        if let Some(by) = graph.occupant(node).filter(|&o| o != self.id) {
            let reason = WaitReason::NodeOccupied { node, by };
            self.block(reason, now);
            return Ok(StepOutcome::Blocked(reason));
        }

        graph.reserve(node, self.id, self.reservation_ticks)?;
        self.target_heading = self.pos.heading_deg_to(graph.pos(node));
        if let Some(j) = self.state.journey_mut() {
            j.target = Some(node);
        }
        self.unblock();
        debug!(agent = %self.id, from = %self.current, to = %node, "hop committed");
        Ok(StepOutcome::Committed)
    }

    /// Advance one tick.
    ///
    /// `others` holds the positions of every vehicle as of this point in the
    /// tick (entries for `self.id` are ignored).  Returns what happened;
    /// blocking is reported as [`MotionEvent::Blocked`], not as an error.
    pub fn advance(
        &mut self,
        graph:  &mut GraphModel,
        others: &[(AgentId, Point)],
        now:    Tick,
    ) -> MotionResult<MotionEvent> {
        let Some(journey) = self.state.journey() else {
            return Ok(MotionEvent::Idle);
        };

        let target = match journey.target {
            Some(t) => t,
            None => {
                let Some(next) = journey.next_hop() else {
                    // Route exhausted without arrival bookkeeping; settle.
                    self.state = AgentState::Idle;
                    return Ok(MotionEvent::Idle);
                };
                return Ok(match self.request_step(next, graph, now)? {
                    StepOutcome::Committed => MotionEvent::Departed { to: next },
                    StepOutcome::Blocked(r) => MotionEvent::Blocked(r),
                });
            }
        };

        // Someone may have taken the committed node since we reserved it.
        if let Some(by) = graph.occupant(target).filter(|&o| o != self.id) {
            let reason = WaitReason::NodeOccupied { node: target, by };
            self.block(reason, now);
            return Ok(MotionEvent::Blocked(reason));
        }

        if !self.rotate() {
            self.unblock();
            return Ok(MotionEvent::Rotating);
        }

        let goal = graph.pos(target);
        if self.pos.distance(goal) < self.motion.speed {
            return self.arrive(target, graph);
        }

        let next = self.pos.step_toward(goal, self.motion.speed);
        if let Some(with) = self.collision_at(next, others) {
            let reason = WaitReason::Collision { with };
            self.block(reason, now);
            return Ok(MotionEvent::Blocked(reason));
        }

        self.pos = next;
        self.unblock();
        Ok(MotionEvent::Moved)
    }

    /// Halt immediately: snap to the nearest node this vehicle can claim,
    /// move occupancy there and drop the route.
    ///
    /// A vehicle without a route keeps its state, so stopping an idle vehicle
    /// is a no-op.
    pub fn stop(&mut self, graph: &mut GraphModel) -> MotionResult<()> {
        if self.state.journey().is_none() {
            return Ok(());
        }
        if let Some(t) = self.target() {
            graph.release_reservation(t, self.id);
        }
        if let Some(node) = graph.nearest_claimable(self.pos, self.id) {
            if node != self.current {
                graph.occupy(node, self.id)?;
                graph.vacate(self.current, self.id);
                self.current = node;
            }
            self.pos = graph.pos(node);
        }
        self.target_heading = self.heading;
        self.state = AgentState::Stopped;
        debug!(agent = %self.id, node = %self.current, "stopped");
        Ok(())
    }

    /// Release every claim this vehicle holds.  Consumes the vehicle.
    pub fn destroy(self, graph: &mut GraphModel) {
        graph.vacate(self.current, self.id);
        if let Some(t) = self.target() {
            graph.release_reservation(t, self.id);
        }
    }

    pub fn set_collision_radius(&mut self, radius: f32) {
        self.collision_radius = radius.max(0.0);
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Turn towards `target_heading` by at most one step.  Returns `true`
    /// once aligned.
    fn rotate(&mut self) -> bool {
        let diff = shortest_turn_deg(self.heading, self.target_heading);
        if diff.abs() <= self.motion.rotation_snap_deg {
            self.heading = normalize_deg(self.target_heading);
            return true;
        }
        let step = self.motion.rotation_step_deg.copysign(diff);
        self.heading = normalize_deg(self.heading + step);
        false
    }

    fn arrive(&mut self, target: NodeId, graph: &mut GraphModel) -> MotionResult<MotionEvent> {
        graph.occupy(target, self.id)?;
        graph.vacate(self.current, self.id);
        self.current = target;
        self.pos = graph.pos(target);
        graph.release_reservation(target, self.id);

        let state = std::mem::take(&mut self.state);
        let mut journey = match state {
            AgentState::Following(j) | AgentState::Waiting(j, _) => j,
            other => {
                self.state = other;
                return Ok(MotionEvent::Arrived { node: target, finished: true });
            }
        };
        journey.cursor += 1;
        journey.target = None;
        let finished = journey.cursor + 1 >= journey.route.len();
        self.state = if finished { AgentState::Idle } else { AgentState::Following(journey) };

        debug!(agent = %self.id, node = %target, finished, "arrived");
        Ok(MotionEvent::Arrived { node: target, finished })
    }

    fn collision_at(&self, p: Point, others: &[(AgentId, Point)]) -> Option<AgentId> {
        others
            .iter()
            .filter(|(id, _)| *id != self.id)
            .find(|(_, q)| p.distance(*q) < self.collision_radius)
            .map(|(id, _)| *id)
    }

    fn block(&mut self, reason: WaitReason, now: Tick) {
        trace!(agent = %self.id, ?reason, "blocked");
        self.state = match std::mem::take(&mut self.state) {
            AgentState::Following(j) => {
                AgentState::Waiting(j, Wait { reason, since: now, ticks: 1 })
            }
            AgentState::Waiting(j, w) => AgentState::Waiting(
                j,
                Wait { reason, since: w.since, ticks: w.ticks.saturating_add(1) },
            ),
            other => other,
        };
    }

    fn unblock(&mut self) {
        if matches!(self.state, AgentState::Waiting(..)) {
            self.state = match std::mem::take(&mut self.state) {
                AgentState::Waiting(j, _) => AgentState::Following(j),
                other => other,
            };
        }
    }
}
