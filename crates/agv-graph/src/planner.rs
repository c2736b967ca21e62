//! Shortest-path planning: Dijkstra and A*.
//!
//! # Cost model
//!
//! Traversing edge `u → v` costs its Euclidean length, plus
//! [`CostModel::busy_penalty`] when `v` is currently occupied by an agent
//! other than the one being routed.  The penalty only discourages routing
//! through busy nodes; planning reserves nothing, and the vehicle re-checks
//! occupancy when it actually moves.
//!
//! Because every edge costs at least the straight-line distance between its
//! endpoints, the Euclidean heuristic used by A* is admissible and
//! consistent, so both searches return routes of equal cost.
//!
//! # Pluggability
//!
//! Callers that want a fixed algorithm hold a [`Planner`] implementation;
//! the control surface selects one per request through [`plan`].

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use agv_core::{AgentId, EdgeId, NodeId, PlanAlgorithm};

use crate::{GraphError, GraphModel, GraphResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a planning query: node identities from start to goal,
/// inclusive, and the total cost under the [`CostModel`] at planning time.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub nodes: Vec<NodeId>,
    pub cost: f32,
}

impl Route {
    /// Number of nodes, including start and goal.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `true` if no movement is needed (start and goal coincide).
    pub fn is_trivial(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn start(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn goal(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// The edges the route traverses, in order.
    pub fn edges(&self, graph: &GraphModel) -> Vec<EdgeId> {
        self.nodes
            .windows(2)
            .filter_map(|w| graph.find_edge(w[0], w[1]))
            .collect()
    }
}

// ── Cost model ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CostModel {
    /// Added to an edge whose destination is held by another agent.
    pub busy_penalty: f32,
}

impl Default for CostModel {
    fn default() -> Self {
        Self { busy_penalty: 100.0 }
    }
}

impl CostModel {
    /// Cost of traversing `edge` on behalf of `agent` (`None` treats every
    /// occupant as foreign).
    #[inline]
    pub fn edge_cost(&self, graph: &GraphModel, edge: EdgeId, agent: Option<AgentId>) -> f32 {
        let to = graph.edge_to[edge.index()];
        let busy = matches!(graph.occupant(to), Some(o) if Some(o) != agent);
        graph.edge_length[edge.index()] + if busy { self.busy_penalty } else { 0.0 }
    }
}

// ── Planner trait ─────────────────────────────────────────────────────────────

/// Pluggable routing engine.
pub trait Planner {
    /// Compute a route from `from` to `to` for `agent`.
    ///
    /// `from == to` yields a trivial single-node route rather than an error;
    /// callers decide whether that means "nothing to do".
    fn plan(
        &self,
        graph: &GraphModel,
        from: NodeId,
        to: NodeId,
        agent: Option<AgentId>,
    ) -> GraphResult<Route>;
}

/// Uniform-cost search.
#[derive(Clone, Copy, Debug, Default)]
pub struct DijkstraPlanner {
    pub cost: CostModel,
}

impl Planner for DijkstraPlanner {
    fn plan(&self, graph: &GraphModel, from: NodeId, to: NodeId, agent: Option<AgentId>) -> GraphResult<Route> {
        search(graph, from, to, agent, self.cost, |_| 0.0)
    }
}

/// Uniform-cost search ordered by `g + straight-line distance to goal`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AStarPlanner {
    pub cost: CostModel,
}

impl Planner for AStarPlanner {
    fn plan(&self, graph: &GraphModel, from: NodeId, to: NodeId, agent: Option<AgentId>) -> GraphResult<Route> {
        if !graph.contains(to) {
            return Err(GraphError::NodeNotFound(to));
        }
        let goal = graph.pos(to);
        search(graph, from, to, agent, self.cost, |n| graph.pos(n).distance(goal))
    }
}

/// Plan with the algorithm chosen at run time.
pub fn plan(
    algorithm: PlanAlgorithm,
    graph: &GraphModel,
    from: NodeId,
    to: NodeId,
    agent: Option<AgentId>,
    cost: CostModel,
) -> GraphResult<Route> {
    match algorithm {
        PlanAlgorithm::Dijkstra => DijkstraPlanner { cost }.plan(graph, from, to, agent),
        PlanAlgorithm::AStar => AStarPlanner { cost }.plan(graph, from, to, agent),
    }
}

// ── Search internals ──────────────────────────────────────────────────────────

/// Frontier entry.  Ordered by priority, then by discovery sequence so equal
/// priorities pop first-in first-out.
#[derive(Copy, Clone, Debug)]
struct Frontier {
    priority: f32,
    seq: u64,
    node: NodeId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

fn search(
    graph: &GraphModel,
    from: NodeId,
    to: NodeId,
    agent: Option<AgentId>,
    cost: CostModel,
    heuristic: impl Fn(NodeId) -> f32,
) -> GraphResult<Route> {
    if !graph.contains(from) {
        return Err(GraphError::NodeNotFound(from));
    }
    if !graph.contains(to) {
        return Err(GraphError::NodeNotFound(to));
    }
    if from == to {
        return Ok(Route { nodes: vec![from], cost: 0.0 });
    }

    let n = graph.node_count();
    // dist[v] = best known accumulated cost to reach v.
    let mut dist     = vec![f32::INFINITY; n];
    let mut prev     = vec![NodeId::INVALID; n];
    let mut explored = vec![false; n];

    dist[from.index()] = 0.0;

    // Reverse turns BinaryHeap (max) into a min-heap.
    let mut heap: BinaryHeap<Reverse<Frontier>> = BinaryHeap::new();
    let mut seq = 0u64;
    heap.push(Reverse(Frontier { priority: heuristic(from), seq, node: from }));

    while let Some(Reverse(Frontier { node, .. })) = heap.pop() {
        if explored[node.index()] {
            continue;
        }
        explored[node.index()] = true;

        if node == to {
            return Ok(reconstruct(prev, from, to, dist[to.index()]));
        }

        let base = dist[node.index()];
        for edge in graph.out_edges(node) {
            let next = graph.edge_to[edge.index()];
            if explored[next.index()] {
                continue;
            }
            let new_cost = base + cost.edge_cost(graph, edge, agent);
            if new_cost < dist[next.index()] {
                dist[next.index()] = new_cost;
                prev[next.index()] = node;
                seq += 1;
                heap.push(Reverse(Frontier { priority: new_cost + heuristic(next), seq, node: next }));
            }
        }
    }

    Err(GraphError::NoRoute { from, to })
}

fn reconstruct(prev: Vec<NodeId>, from: NodeId, to: NodeId, cost: f32) -> Route {
    let mut nodes = vec![to];
    let mut cur = to;
    while cur != from {
        cur = prev[cur.index()];
        nodes.push(cur);
    }
    nodes.reverse();
    Route { nodes, cost }
}
