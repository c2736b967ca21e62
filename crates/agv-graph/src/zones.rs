//! Static control zones: named groupings of nodes.
//!
//! Zones are descriptive only.  They are loaded once, never change during a
//! run and have no effect on planning or motion.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use agv_core::NodeId;

use crate::{GraphError, GraphModel, GraphResult};

/// Zone name → member nodes, plus the union of all members for O(1)
/// "is this node controlled" queries.
#[derive(Clone, Debug, Default)]
pub struct ZoneManager {
    zones:      BTreeMap<String, BTreeSet<NodeId>>,
    controlled: HashSet<NodeId>,
}

impl ZoneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a zone → node-key mapping against `graph`.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownNodeKey`] if any key is not a node of `graph`.
    pub fn from_keys<I, K>(graph: &GraphModel, mapping: I) -> GraphResult<Self>
    where
        I: IntoIterator<Item = (String, Vec<K>)>,
        K: AsRef<str>,
    {
        let mut zones = Self::new();
        for (name, keys) in mapping {
            let nodes = keys
                .iter()
                .map(|k| {
                    graph
                        .lookup(k.as_ref())
                        .ok_or_else(|| GraphError::UnknownNodeKey(k.as_ref().to_owned()))
                })
                .collect::<GraphResult<Vec<_>>>()?;
            zones.add_zone(name, nodes);
        }
        Ok(zones)
    }

    /// Add `nodes` to zone `name`, creating it if needed.
    pub fn add_zone(&mut self, name: impl Into<String>, nodes: impl IntoIterator<Item = NodeId>) {
        let members = self.zones.entry(name.into()).or_default();
        for n in nodes {
            members.insert(n);
            self.controlled.insert(n);
        }
    }

    /// `true` if `node` belongs to at least one zone.
    #[inline]
    pub fn in_any_zone(&self, node: NodeId) -> bool {
        self.controlled.contains(&node)
    }

    /// Members of zone `name`, or `None` if there is no such zone.
    pub fn zone_nodes(&self, name: &str) -> Option<&BTreeSet<NodeId>> {
        self.zones.get(name)
    }

    /// Names of every zone containing `node`, in name order.
    pub fn zones_of(&self, node: NodeId) -> Vec<&str> {
        self.zones
            .iter()
            .filter(|(_, members)| members.contains(&node))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn zone_names(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Distinct nodes that belong to any zone.
    pub fn controlled_node_count(&self) -> usize {
        self.controlled.len()
    }
}
