//! Per-node mutual-exclusion state.
//!
//! Two kinds of claim exist on a node:
//!
//! - **Occupancy**: exclusive physical presence.  At most one agent holds a
//!   node; [`GraphModel::occupy`] refuses a node held by someone else.
//! - **Reservation**: a soft, time-limited claim on the node an agent is
//!   about to enter.  It carries a tick countdown and lapses on its own.  A
//!   node can be reserved by one agent while another still occupies it (the
//!   hand-off window).
//!
//! The protocol is cooperative: every agent checks [`GraphModel::occupant`]
//! before claiming.  It is only sound because the simulation mutates this
//! state from one thread; a parallel driver would need a lock per node or a
//! single arbiter.

use agv_core::{AgentId, NodeId, Point};

use crate::{GraphError, GraphModel, GraphResult};

/// Occupancy and reservation of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeState {
    pub occupied_by: Option<AgentId>,
    pub reserved_by: Option<AgentId>,
    /// Ticks until `reserved_by` lapses.  Meaningless while unreserved.
    pub reservation_ticks: u32,
}

impl GraphModel {
    /// Full state of `node`, or `None` if it is not in the graph.
    pub fn node_state(&self, node: NodeId) -> Option<&NodeState> {
        self.node_state.get(node.index())
    }

    /// The agent physically at `node`, if any.
    #[inline]
    pub fn occupant(&self, node: NodeId) -> Option<AgentId> {
        self.node_state.get(node.index()).and_then(|s| s.occupied_by)
    }

    /// `true` if `agent` may claim `node`: it is free or already held by
    /// `agent`.  Unknown nodes are never claimable.
    #[inline]
    pub fn is_free_for(&self, node: NodeId, agent: AgentId) -> bool {
        match self.node_state.get(node.index()) {
            Some(s) => s.occupied_by.is_none_or(|a| a == agent),
            None => false,
        }
    }

    /// Claim `node` for `agent`.  Re-claiming an already held node is a no-op.
    pub fn occupy(&mut self, node: NodeId, agent: AgentId) -> GraphResult<()> {
        let state = self
            .node_state
            .get_mut(node.index())
            .ok_or(GraphError::NodeNotFound(node))?;
        match state.occupied_by {
            Some(other) if other != agent => Err(GraphError::NodeOccupied { node, by: other }),
            _ => {
                state.occupied_by = Some(agent);
                Ok(())
            }
        }
    }

    /// Release `node` if, and only if, `agent` holds it.  Returns whether
    /// anything was released.
    pub fn vacate(&mut self, node: NodeId, agent: AgentId) -> bool {
        match self.node_state.get_mut(node.index()) {
            Some(s) if s.occupied_by == Some(agent) => {
                s.occupied_by = None;
                true
            }
            _ => false,
        }
    }

    /// Place (or replace) a reservation on `node` lasting `ticks` ticks.
    pub fn reserve(&mut self, node: NodeId, agent: AgentId, ticks: u32) -> GraphResult<()> {
        let state = self
            .node_state
            .get_mut(node.index())
            .ok_or(GraphError::NodeNotFound(node))?;
        state.reserved_by = Some(agent);
        state.reservation_ticks = ticks;
        Ok(())
    }

    /// Current reservation holder and remaining countdown.
    pub fn reservation(&self, node: NodeId) -> Option<(AgentId, u32)> {
        let s = self.node_state.get(node.index())?;
        s.reserved_by.map(|a| (a, s.reservation_ticks))
    }

    /// Drop `agent`'s reservation on `node`.  Another agent's reservation is
    /// left alone.
    pub fn release_reservation(&mut self, node: NodeId, agent: AgentId) -> bool {
        match self.node_state.get_mut(node.index()) {
            Some(s) if s.reserved_by == Some(agent) => {
                s.reserved_by = None;
                s.reservation_ticks = 0;
                true
            }
            _ => false,
        }
    }

    /// Count every reservation down by one tick.  A reservation whose
    /// countdown reaches zero is released.  Returns the number released.
    pub fn tick_reservations(&mut self) -> usize {
        let mut expired = 0;
        for s in self.node_state.iter_mut().filter(|s| s.reserved_by.is_some()) {
            s.reservation_ticks = s.reservation_ticks.saturating_sub(1);
            if s.reservation_ticks == 0 {
                s.reserved_by = None;
                expired += 1;
            }
        }
        expired
    }

    /// Every node nobody occupies, in `NodeId` order.
    pub fn free_nodes(&self) -> Vec<NodeId> {
        self.node_state
            .iter()
            .enumerate()
            .filter(|(_, s)| s.occupied_by.is_none())
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    /// `(node, agent)` for every occupied node, in `NodeId` order.
    pub fn occupants(&self) -> impl Iterator<Item = (NodeId, AgentId)> + '_ {
        self.node_state
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.occupied_by.map(|a| (NodeId(i as u32), a)))
    }

    /// The node closest to `pos` (squared Euclidean distance) that `agent`
    /// could claim, or `None` if every node is held by someone else.
    pub fn nearest_claimable(&self, pos: Point, agent: AgentId) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor_iter(&[pos.x, pos.y])
            .map(|e| e.id)
            .find(|&n| self.is_free_for(n, agent))
    }
}
