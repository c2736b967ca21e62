//! Warehouse floor map: the built-in layout and the JSON map file format.
//!
//! ```text
//!   C1
//!   │
//!   C0── T0 ── T1 ── T2 ── T3 ── T4 ── T5 ── T6        top corridor
//!               │           │           │
//!             A0-1        A1-1        A2-1
//!               ⋮           ⋮           ⋮               three aisles
//!             A0-4        A1-4        A2-4
//!               │           │           │
//!        B0 ── B1 ── B2 ── B3 ── B4 ── B5 ── B6        bottom corridor
//!               │           │           │
//!              D0          D1          D2              loading docks
//! ```
//!
//! Corridors are listed as node connections, the aisle, dock and charger
//! links as edge records, the way a drawn map delivers them.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use agv_core::Point;
use agv_graph::{EdgeRecord, GraphModel, NodeRecord, ZoneManager};

const SPACING: f32 = 100.0;
const CORRIDOR_LEN: u32 = 7;
const AISLES: u32 = 3;
const AISLE_DEPTH: u32 = 4;

/// A map as stored on disk.
#[derive(Debug, Deserialize)]
pub struct MapFile {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    /// Zone name → node keys.
    #[serde(default)]
    pub zones: BTreeMap<String, Vec<String>>,
}

impl MapFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading map {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing map {}", path.display()))
    }

    /// Resolve into a graph and its zones.
    pub fn into_model(self) -> Result<(GraphModel, ZoneManager)> {
        let graph = GraphModel::from_records(&self.nodes, &self.edges)?;
        let zones = ZoneManager::from_keys(&graph, self.zones)?;
        Ok((graph, zones))
    }
}

fn node(key: String, x: f32, y: f32) -> NodeRecord {
    NodeRecord { key, pos: Point::new(x * SPACING, y * SPACING), connections: Vec::new() }
}

fn link(edges: &mut Vec<EdgeRecord>, a: &str, b: &str) {
    edges.push(EdgeRecord { start: a.to_owned(), end: b.to_owned() });
    edges.push(EdgeRecord { start: b.to_owned(), end: a.to_owned() });
}

/// The built-in three-aisle warehouse.
pub fn built_in() -> MapFile {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut zones: BTreeMap<String, Vec<String>> = BTreeMap::new();

    // Corridors: each node lists its horizontal neighbours.
    for (row, y) in [("T", 0.0), ("B", (AISLE_DEPTH + 1) as f32)] {
        for i in 0..CORRIDOR_LEN {
            let mut rec = node(format!("{row}{i}"), i as f32, y);
            if i > 0 {
                rec.connections.push(format!("{row}{}", i - 1));
            }
            if i + 1 < CORRIDOR_LEN {
                rec.connections.push(format!("{row}{}", i + 1));
            }
            nodes.push(rec);
        }
    }

    // Aisles hang between T(2a+1) and B(2a+1); docks sit below the bottom row.
    for a in 0..AISLES {
        let col = 2 * a + 1;
        let mut prev = format!("T{col}");
        let aisle = zones.entry(format!("aisle-{a}")).or_default();
        for d in 1..=AISLE_DEPTH {
            let key = format!("A{a}-{d}");
            nodes.push(node(key.clone(), col as f32, d as f32));
            link(&mut edges, &prev, &key);
            aisle.push(key.clone());
            prev = key;
        }
        link(&mut edges, &prev, &format!("B{col}"));

        let dock = format!("D{a}");
        nodes.push(node(dock.clone(), col as f32, (AISLE_DEPTH + 2) as f32));
        link(&mut edges, &format!("B{col}"), &dock);
        zones.entry("docks".into()).or_default().push(dock);
    }

    // Charging bay off the top-left corner.
    nodes.push(node("C0".into(), -1.0, 0.0));
    nodes.push(node("C1".into(), -1.0, -1.0));
    link(&mut edges, "C0", "T0");
    link(&mut edges, "C0", "C1");
    zones.insert("charging".into(), vec!["C0".into(), "C1".into()]);

    MapFile { nodes, edges, zones }
}
