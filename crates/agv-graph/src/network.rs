//! Graph representation, builder and record ingestion.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! Edge arrays are sorted by source node and indexed by `EdgeId`.  The
//! out-edge list doubles as the `connections` set of a node: it is what the
//! planner expands and what a vehicle may legally step along.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over node coordinates answers nearest-node queries,
//! used when a stopped vehicle snaps to the closest node it can claim.

use std::collections::HashMap;

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use agv_core::{EdgeId, NodeId, Point};

use crate::occupancy::NodeState;
use crate::{GraphError, GraphResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub(crate) struct NodeEntry {
    point: [f32; 2], // [x, y]
    pub(crate) id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance.
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── Ingestion records ─────────────────────────────────────────────────────────

/// One node as delivered by the external map loader.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeRecord {
    /// Stable external identity (e.g. the map's node number as text).
    pub key: String,
    pub pos: Point,
    /// Keys of the nodes reachable in one step from this one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub connections: Vec<String>,
}

/// One drawn path segment as delivered by the external map loader.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeRecord {
    pub start: String,
    pub end: String,
}

// ── GraphModel ────────────────────────────────────────────────────────────────

/// Directed node graph in CSR format plus per-node occupancy state and a
/// spatial index.
///
/// Topology fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`GraphBuilder`] or [`GraphModel::from_records`].
pub struct GraphModel {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Coordinate of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<Point>,

    /// External key of each node.  Indexed by `NodeId`.
    pub node_key: Vec<String>,

    key_index: HashMap<String, NodeId>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    pub edge_from: Vec<NodeId>,

    pub edge_to: Vec<NodeId>,

    /// Euclidean length of each edge in map units.
    pub edge_length: Vec<f32>,

    // ── Mutable mutual-exclusion state ────────────────────────────────────
    pub(crate) node_state: Vec<NodeState>,

    // ── Spatial index ─────────────────────────────────────────────────────
    pub(crate) spatial_idx: RTree<NodeEntry>,
}

impl GraphModel {
    /// Construct an empty graph with no nodes or edges.
    pub fn empty() -> Self {
        GraphBuilder::new().build()
    }

    /// Build a graph from loader records.
    ///
    /// Adjacency is the union of every node's `connections` and every edge
    /// record (both taken as directed `start → end`).  Duplicates collapse.
    pub fn from_records(nodes: &[NodeRecord], edges: &[EdgeRecord]) -> GraphResult<Self> {
        let mut b = GraphBuilder::with_capacity(nodes.len(), edges.len());
        for rec in nodes {
            b.add_node(rec.key.clone(), rec.pos)?;
        }
        for rec in nodes {
            let from = b.resolve(&rec.key)?;
            for key in &rec.connections {
                let to = b.resolve(key)?;
                b.add_directed_edge(from, to);
            }
        }
        for rec in edges {
            let from = b.resolve(&rec.start)?;
            let to = b.resolve(&rec.end)?;
            b.add_directed_edge(from, to);
        }
        Ok(b.build())
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_pos.len()
    }

    /// Iterator over every `NodeId` in the graph.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.node_pos.len()).map(|i| NodeId(i as u32))
    }

    /// Iterator over every `EdgeId` in the graph.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edge_to.len()).map(|i| EdgeId(i as u32))
    }

    // ── Node lookups ──────────────────────────────────────────────────────

    /// Coordinate of `node`.
    ///
    /// # Panics
    /// Panics if `node` is not in the graph; check with [`contains`](Self::contains).
    #[inline]
    pub fn pos(&self, node: NodeId) -> Point {
        self.node_pos[node.index()]
    }

    /// External key of `node`, or `None` if it is not in the graph.
    pub fn key(&self, node: NodeId) -> Option<&str> {
        self.node_key.get(node.index()).map(String::as_str)
    }

    /// Resolve an external key to its `NodeId`.
    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.key_index.get(key).copied()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    /// Empty for a node outside the graph.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let i = node.index();
        let (start, end) = match (self.node_out_start.get(i), self.node_out_start.get(i + 1)) {
            (Some(&s), Some(&e)) => (s as usize, e as usize),
            _ => (0, 0),
        };
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// The connection set of `node`: every node one legal step away.
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out_edges(node).map(|e| self.edge_to[e.index()])
    }

    /// The edge `from → to`, if `to` is in `from`'s connections.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.out_edges(from).find(|e| self.edge_to[e.index()] == to)
    }

    /// `true` if a single step `from → to` is legal.
    #[inline]
    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        self.find_edge(from, to).is_some()
    }

    /// `(start, end)` of `edge`.
    ///
    /// # Panics
    ///
    /// Panics if `edge` is not an edge of this graph.
    #[inline]
    pub fn edge_endpoints(&self, edge: EdgeId) -> (NodeId, NodeId) {
        (self.edge_from[edge.index()], self.edge_to[edge.index()])
    }
}

// ── GraphBuilder ──────────────────────────────────────────────────────────────

/// Construct a [`GraphModel`] incrementally, then call [`build`](Self::build).
///
/// Edge lengths are derived from node coordinates, so the Euclidean
/// straight-line distance is always a lower bound on any path cost.
///
/// # Example
///
/// ```
/// use agv_core::Point;
/// use agv_graph::GraphBuilder;
///
/// let mut b = GraphBuilder::new();
/// let a = b.add_node("A", Point::new(0.0, 0.0)).unwrap();
/// let c = b.add_node("C", Point::new(100.0, 0.0)).unwrap();
/// b.add_edge(a, c);
/// let g = b.build();
/// assert_eq!(g.node_count(), 2);
/// assert_eq!(g.edge_count(), 2); // both directions
/// ```
pub struct GraphBuilder {
    nodes:     Vec<Point>,
    keys:      Vec<String>,
    key_index: HashMap<String, NodeId>,
    raw_edges: Vec<(NodeId, NodeId)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            keys:      Vec::with_capacity(nodes),
            key_index: HashMap::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, key: impl Into<String>, pos: Point) -> GraphResult<NodeId> {
        let key = key.into();
        if self.key_index.contains_key(&key) {
            return Err(GraphError::DuplicateNodeKey(key));
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        self.key_index.insert(key.clone(), id);
        self.keys.push(key);
        Ok(id)
    }

    /// Look up a node added earlier by its key.
    pub fn resolve(&self, key: &str) -> GraphResult<NodeId> {
        self.key_index
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::UnknownNodeKey(key.to_owned()))
    }

    /// Add a **directed** edge.  Self-loops are ignored.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId) {
        if from != to {
            self.raw_edges.push((from, to));
        }
    }

    /// Add edges in **both directions**.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) {
        self.add_directed_edge(a, b);
        self.add_directed_edge(b, a);
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }

    /// Consume the builder and produce a [`GraphModel`] with every node free.
    ///
    /// Time complexity: O(E log E) for edge sort + O(N log N) for R-tree bulk
    /// load.
    pub fn build(self) -> GraphModel {
        let node_count = self.nodes.len();

        let mut raw = self.raw_edges;
        raw.retain(|(f, t)| f.index() < node_count && t.index() < node_count);
        raw.sort_unstable_by_key(|&(f, t)| (f.0, t.0));
        raw.dedup();

        let edge_from: Vec<NodeId> = raw.iter().map(|&(f, _)| f).collect();
        let edge_to:   Vec<NodeId> = raw.iter().map(|&(_, t)| t).collect();
        let edge_length: Vec<f32> = raw
            .iter()
            .map(|&(f, t)| self.nodes[f.index()].distance(self.nodes[t.index()]))
            .collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for &(f, _) in &raw {
            node_out_start[f.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, raw.len());

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry { point: [pos.x, pos.y], id: NodeId(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        GraphModel {
            node_state: vec![NodeState::default(); node_count],
            node_pos: self.nodes,
            node_key: self.keys,
            key_index: self.key_index,
            node_out_start,
            edge_from,
            edge_to,
            edge_length,
            spatial_idx,
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
