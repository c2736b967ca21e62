//! Unit tests for agv-graph.
//!
//! All tests use hand-crafted graphs; no map files are involved.

#[cfg(test)]
mod helpers {
    use agv_core::{NodeId, Point};
    use crate::{GraphBuilder, GraphModel};

    /// Three nodes in a line, 100 units apart: A ↔ B ↔ C.
    pub fn line_graph() -> (GraphModel, [NodeId; 3]) {
        let mut b = GraphBuilder::new();
        let a = b.add_node("A", Point::new(0.0, 0.0)).unwrap();
        let m = b.add_node("B", Point::new(100.0, 0.0)).unwrap();
        let c = b.add_node("C", Point::new(200.0, 0.0)).unwrap();
        b.add_edge(a, m);
        b.add_edge(m, c);
        (b.build(), [a, m, c])
    }

    /// Small loop plus one isolated node.
    ///
    /// ```text
    ///   n0(0,0) ── n1(100,0) ── n2(200,0)
    ///    │                        │
    ///   n3(0,150) ──────────── n4(200,100)      n5(500,500) isolated
    /// ```
    ///
    /// n0 → n4: via n1,n2 = 300; via n3 = 150 + 206.2 = 356.2.
    pub fn loop_graph() -> (GraphModel, [NodeId; 6]) {
        let mut b = GraphBuilder::new();
        let n0 = b.add_node("0", Point::new(0.0, 0.0)).unwrap();
        let n1 = b.add_node("1", Point::new(100.0, 0.0)).unwrap();
        let n2 = b.add_node("2", Point::new(200.0, 0.0)).unwrap();
        let n3 = b.add_node("3", Point::new(0.0, 150.0)).unwrap();
        let n4 = b.add_node("4", Point::new(200.0, 100.0)).unwrap();
        let n5 = b.add_node("5", Point::new(500.0, 500.0)).unwrap();
        b.add_edge(n0, n1);
        b.add_edge(n1, n2);
        b.add_edge(n2, n4);
        b.add_edge(n0, n3);
        b.add_edge(n3, n4);
        (b.build(), [n0, n1, n2, n3, n4, n5])
    }

    /// `w × h` lattice with 50-unit spacing and a few missing links, so
    /// several equal-length and unequal-length alternatives exist.
    pub fn lattice(w: u32, h: u32) -> GraphModel {
        let mut b = GraphBuilder::new();
        let id = |x: u32, y: u32| NodeId(y * w + x);
        for y in 0..h {
            for x in 0..w {
                b.add_node(format!("{x},{y}"), Point::new(x as f32 * 50.0, y as f32 * 50.0))
                    .unwrap();
            }
        }
        for y in 0..h {
            for x in 0..w {
                if x + 1 < w && (x + y) % 5 != 3 {
                    b.add_edge(id(x, y), id(x + 1, y));
                }
                if y + 1 < h && (x * 3 + y) % 7 != 2 {
                    b.add_edge(id(x, y), id(x, y + 1));
                }
            }
        }
        b.build()
    }
}

// ── Builder & structure ───────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use agv_core::{NodeId, Point};
    use crate::{GraphBuilder, GraphError};

    #[test]
    fn empty_build() {
        let g = GraphBuilder::new().build();
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(g.is_empty());
        assert!(g.nearest_claimable(Point::new(0.0, 0.0), agv_core::AgentId(1)).is_none());
    }

    #[test]
    fn edge_length_is_euclidean() {
        let mut b = GraphBuilder::new();
        let a = b.add_node("a", Point::new(0.0, 0.0)).unwrap();
        let c = b.add_node("c", Point::new(30.0, 40.0)).unwrap();
        b.add_directed_edge(a, c);
        let g = b.build();
        let e = g.find_edge(a, c).unwrap();
        assert!((g.edge_length[e.index()] - 50.0).abs() < 1e-4);
        assert!(g.find_edge(c, a).is_none(), "directed edge has no return");
    }

    #[test]
    fn duplicates_and_self_loops_collapse() {
        let mut b = GraphBuilder::new();
        let a = b.add_node("a", Point::new(0.0, 0.0)).unwrap();
        let c = b.add_node("c", Point::new(1.0, 0.0)).unwrap();
        b.add_edge(a, c);
        b.add_edge(c, a);
        b.add_directed_edge(a, a);
        let g = b.build();
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.out_edges(a).count(), 1);
    }

    #[test]
    fn duplicate_key_rejected() {
        let mut b = GraphBuilder::new();
        b.add_node("x", Point::new(0.0, 0.0)).unwrap();
        let err = b.add_node("x", Point::new(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNodeKey(k) if k == "x"));
    }

    #[test]
    fn csr_neighbors() {
        let (g, [n0, n1, n2, n3, n4, n5]) = super::helpers::loop_graph();
        let mut nb: Vec<_> = g.neighbors(n0).collect();
        nb.sort();
        assert_eq!(nb, vec![n1, n3]);
        assert!(g.is_connected(n2, n4));
        assert!(!g.is_connected(n0, n4));
        assert_eq!(g.out_edges(n5).count(), 0);
        for e in g.out_edges(n1) {
            assert_eq!(g.edge_endpoints(e).0, n1);
        }
    }

    #[test]
    fn traversal_of_unknown_node_is_empty() {
        let (g, [a, ..]) = super::helpers::line_graph();
        let ghost = NodeId(99);
        assert_eq!(g.out_edges(ghost).count(), 0);
        assert_eq!(g.neighbors(ghost).count(), 0);
        assert_eq!(g.neighbors(NodeId::INVALID).count(), 0);
        assert!(g.find_edge(ghost, a).is_none());
        assert!(!g.is_connected(a, ghost));
    }

    #[test]
    fn keys_resolve_both_ways() {
        let (g, [a, _, c]) = super::helpers::line_graph();
        assert_eq!(g.lookup("A"), Some(a));
        assert_eq!(g.key(c), Some("C"));
        assert_eq!(g.lookup("Z"), None);
    }
}

// ── Record ingestion ──────────────────────────────────────────────────────────

#[cfg(test)]
mod records {
    use agv_core::Point;
    use crate::{EdgeRecord, GraphError, GraphModel, NodeRecord};

    fn node(key: &str, x: f32, y: f32, conn: &[&str]) -> NodeRecord {
        NodeRecord {
            key: key.into(),
            pos: Point::new(x, y),
            connections: conn.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn adjacency_is_union_of_connections_and_edges() {
        let nodes = vec![
            node("1", 0.0, 0.0, &["2"]),
            node("2", 10.0, 0.0, &["1"]),
            node("3", 20.0, 0.0, &[]),
        ];
        let edges = vec![
            EdgeRecord { start: "2".into(), end: "3".into() },
            EdgeRecord { start: "1".into(), end: "2".into() }, // duplicate of a connection
        ];
        let g = GraphModel::from_records(&nodes, &edges).unwrap();
        let (n1, n2, n3) = (g.lookup("1").unwrap(), g.lookup("2").unwrap(), g.lookup("3").unwrap());
        assert_eq!(g.edge_count(), 3);
        assert!(g.is_connected(n1, n2));
        assert!(g.is_connected(n2, n1));
        assert!(g.is_connected(n2, n3));
        assert!(!g.is_connected(n3, n2));
    }

    #[test]
    fn unknown_connection_key_fails() {
        let nodes = vec![node("1", 0.0, 0.0, &["9"])];
        let err = GraphModel::from_records(&nodes, &[]).err().unwrap();
        assert!(matches!(err, GraphError::UnknownNodeKey(k) if k == "9"));
    }

    #[test]
    fn unknown_edge_endpoint_fails() {
        let nodes = vec![node("1", 0.0, 0.0, &[])];
        let edges = vec![EdgeRecord { start: "1".into(), end: "2".into() }];
        assert!(GraphModel::from_records(&nodes, &edges).is_err());
    }
}

// ── Occupancy & reservations ──────────────────────────────────────────────────

#[cfg(test)]
mod occupancy {
    use agv_core::{AgentId, NodeId, Point};
    use crate::GraphError;

    #[test]
    fn occupy_is_exclusive() {
        let (mut g, [a, b, _]) = super::helpers::line_graph();
        g.occupy(a, AgentId(1)).unwrap();
        g.occupy(a, AgentId(1)).unwrap(); // re-claim by holder is fine
        let err = g.occupy(a, AgentId(2)).unwrap_err();
        assert!(matches!(err, GraphError::NodeOccupied { node, by } if node == a && by == AgentId(1)));
        assert_eq!(g.occupant(a), Some(AgentId(1)));
        assert!(g.is_free_for(a, AgentId(1)));
        assert!(!g.is_free_for(a, AgentId(2)));
        assert!(g.is_free_for(b, AgentId(2)));
    }

    #[test]
    fn vacate_only_by_holder() {
        let (mut g, [a, _, _]) = super::helpers::line_graph();
        g.occupy(a, AgentId(1)).unwrap();
        assert!(!g.vacate(a, AgentId(2)));
        assert_eq!(g.occupant(a), Some(AgentId(1)));
        assert!(g.vacate(a, AgentId(1)));
        assert_eq!(g.occupant(a), None);
    }

    #[test]
    fn unknown_node_cannot_be_claimed() {
        let (mut g, _) = super::helpers::line_graph();
        assert!(matches!(g.occupy(NodeId(99), AgentId(1)), Err(GraphError::NodeNotFound(_))));
        assert!(g.reserve(NodeId(99), AgentId(1), 5).is_err());
        assert!(!g.is_free_for(NodeId(99), AgentId(1)));
    }

    #[test]
    fn reservation_expires_after_countdown() {
        let (mut g, [_, b, _]) = super::helpers::line_graph();
        g.reserve(b, AgentId(3), 5).unwrap();
        for remaining in (1..5).rev() {
            assert_eq!(g.tick_reservations(), 0);
            assert_eq!(g.reservation(b), Some((AgentId(3), remaining)));
        }
        assert_eq!(g.tick_reservations(), 1);
        assert_eq!(g.reservation(b), None);
        assert_eq!(g.node_state(b).unwrap().reserved_by, None);
    }

    #[test]
    fn reservation_coexists_with_foreign_occupant() {
        let (mut g, [_, b, _]) = super::helpers::line_graph();
        g.occupy(b, AgentId(1)).unwrap();
        g.reserve(b, AgentId(2), 10).unwrap();
        let s = g.node_state(b).unwrap();
        assert_eq!(s.occupied_by, Some(AgentId(1)));
        assert_eq!(s.reserved_by, Some(AgentId(2)));
        assert!(!g.release_reservation(b, AgentId(1)));
        assert!(g.release_reservation(b, AgentId(2)));
        assert_eq!(g.reservation(b), None);
    }

    #[test]
    fn free_nodes_and_occupants() {
        let (mut g, [a, b, c]) = super::helpers::line_graph();
        g.occupy(b, AgentId(4)).unwrap();
        assert_eq!(g.free_nodes(), vec![a, c]);
        assert_eq!(g.occupants().collect::<Vec<_>>(), vec![(b, AgentId(4))]);
    }

    #[test]
    fn nearest_claimable_skips_foreign_nodes() {
        let (mut g, [a, b, c]) = super::helpers::line_graph();
        let near_b = Point::new(90.0, 5.0);
        assert_eq!(g.nearest_claimable(near_b, AgentId(1)), Some(b));
        g.occupy(b, AgentId(2)).unwrap();
        assert_eq!(g.nearest_claimable(near_b, AgentId(1)), Some(a));
        assert_eq!(g.nearest_claimable(near_b, AgentId(2)), Some(b));
        g.occupy(a, AgentId(3)).unwrap();
        assert_eq!(g.nearest_claimable(near_b, AgentId(1)), Some(c));
        g.occupy(c, AgentId(4)).unwrap();
        assert_eq!(g.nearest_claimable(near_b, AgentId(1)), None);
    }
}

// ── Planning ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod planning {
    use agv_core::{AgentId, NodeId, PlanAlgorithm};
    use crate::{AStarPlanner, CostModel, DijkstraPlanner, GraphError, GraphModel, Planner, Route, plan};

    fn assert_valid(g: &GraphModel, route: &Route, from: NodeId, to: NodeId) {
        assert_eq!(route.start(), Some(from));
        assert_eq!(route.goal(), Some(to));
        for w in route.nodes.windows(2) {
            assert!(g.is_connected(w[0], w[1]), "{} → {} is not an edge", w[0], w[1]);
        }
    }

    #[test]
    fn line_route() {
        let (g, [a, b, c]) = super::helpers::line_graph();
        let route = DijkstraPlanner::default().plan(&g, a, c, None).unwrap();
        assert_eq!(route.nodes, vec![a, b, c]);
        assert!((route.cost - 200.0).abs() < 1e-3);
        assert_eq!(route.edges(&g).len(), 2);
    }

    #[test]
    fn shortest_of_two_alternatives() {
        let (g, [n0, n1, n2, _, n4, _]) = super::helpers::loop_graph();
        for alg in PlanAlgorithm::ALL {
            let route = plan(alg, &g, n0, n4, None, CostModel::default()).unwrap();
            assert_eq!(route.nodes, vec![n0, n1, n2, n4], "{alg}");
            assert!((route.cost - 300.0).abs() < 1e-3);
        }
    }

    #[test]
    fn busy_node_penalty_diverts_route() {
        let (mut g, [n0, _, _, n3, n4, _]) = super::helpers::loop_graph();
        g.occupy(NodeId(1), AgentId(9)).unwrap();
        let cost = CostModel { busy_penalty: 100.0 };
        for alg in PlanAlgorithm::ALL {
            let route = plan(alg, &g, n0, n4, Some(AgentId(1)), cost).unwrap();
            assert_eq!(route.nodes, vec![n0, n3, n4], "{alg}");
        }
    }

    #[test]
    fn own_occupancy_is_not_penalised() {
        let (mut g, [n0, n1, n2, _, n4, _]) = super::helpers::loop_graph();
        g.occupy(n1, AgentId(9)).unwrap();
        let route = DijkstraPlanner::default().plan(&g, n0, n4, Some(AgentId(9))).unwrap();
        assert_eq!(route.nodes, vec![n0, n1, n2, n4]);
    }

    #[test]
    fn penalty_does_not_forbid() {
        // The only path runs through a busy node; it is still returned.
        let (mut g, [a, b, c]) = super::helpers::line_graph();
        g.occupy(b, AgentId(2)).unwrap();
        let route = AStarPlanner::default().plan(&g, a, c, Some(AgentId(1))).unwrap();
        assert_eq!(route.nodes, vec![a, b, c]);
        assert!((route.cost - 300.0).abs() < 1e-3);
    }

    #[test]
    fn disconnected_returns_no_route() {
        let (g, [n0, _, _, _, _, n5]) = super::helpers::loop_graph();
        for alg in PlanAlgorithm::ALL {
            let err = plan(alg, &g, n0, n5, None, CostModel::default()).unwrap_err();
            assert!(matches!(err, GraphError::NoRoute { from, to } if from == n0 && to == n5));
        }
    }

    #[test]
    fn directed_edges_respected() {
        let mut b = crate::GraphBuilder::new();
        let x = b.add_node("x", agv_core::Point::new(0.0, 0.0)).unwrap();
        let y = b.add_node("y", agv_core::Point::new(10.0, 0.0)).unwrap();
        b.add_directed_edge(x, y);
        let g = b.build();
        assert!(DijkstraPlanner::default().plan(&g, x, y, None).is_ok());
        assert!(DijkstraPlanner::default().plan(&g, y, x, None).is_err());
    }

    #[test]
    fn missing_endpoints_rejected() {
        let (g, [a, _, _]) = super::helpers::line_graph();
        for alg in PlanAlgorithm::ALL {
            let err = plan(alg, &g, a, NodeId(42), None, CostModel::default()).unwrap_err();
            assert!(matches!(err, GraphError::NodeNotFound(n) if n == NodeId(42)));
            let err = plan(alg, &g, NodeId(42), a, None, CostModel::default()).unwrap_err();
            assert!(matches!(err, GraphError::NodeNotFound(_)));
        }
    }

    #[test]
    fn same_node_is_trivial() {
        let (g, [a, _, _]) = super::helpers::line_graph();
        let route = AStarPlanner::default().plan(&g, a, a, None).unwrap();
        assert!(route.is_trivial());
        assert_eq!(route.nodes, vec![a]);
        assert_eq!(route.cost, 0.0);
    }

    #[test]
    fn astar_matches_dijkstra_cost() {
        let mut g = super::helpers::lattice(7, 6);
        // A few busy nodes so the penalty participates.
        g.occupy(NodeId(8), AgentId(50)).unwrap();
        g.occupy(NodeId(20), AgentId(51)).unwrap();
        let cost = CostModel::default();
        let n = g.node_count() as u32;
        for (s, t) in [(0, n - 1), (3, 38), (6, 35), (12, 29), (41, 0)] {
            let (s, t) = (NodeId(s), NodeId(t));
            let d = DijkstraPlanner { cost }.plan(&g, s, t, Some(AgentId(1)));
            let a = AStarPlanner { cost }.plan(&g, s, t, Some(AgentId(1)));
            match (d, a) {
                (Ok(d), Ok(a)) => {
                    assert_valid(&g, &d, s, t);
                    assert_valid(&g, &a, s, t);
                    assert!((d.cost - a.cost).abs() < 1e-2, "{s}→{t}: {} vs {}", d.cost, a.cost);
                }
                (Err(_), Err(_)) => {}
                (d, a) => panic!("{s}→{t}: algorithms disagree on reachability: {d:?} / {a:?}"),
            }
        }
    }
}

// ── Zones ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod zones {
    use agv_core::NodeId;
    use crate::{GraphError, ZoneManager};

    #[test]
    fn membership_queries() {
        let mut z = ZoneManager::new();
        z.add_zone("dock", [NodeId(0), NodeId(1)]);
        z.add_zone("aisle", [NodeId(1), NodeId(2)]);
        assert_eq!(z.zone_count(), 2);
        assert_eq!(z.controlled_node_count(), 3);
        assert!(z.in_any_zone(NodeId(1)));
        assert!(!z.in_any_zone(NodeId(7)));
        assert_eq!(z.zones_of(NodeId(1)), vec!["aisle", "dock"]);
        assert_eq!(z.zone_nodes("dock").unwrap().len(), 2);
        assert!(z.zone_nodes("yard").is_none());
    }

    #[test]
    fn from_keys_resolves_against_graph() {
        let (g, [a, _, c]) = super::helpers::line_graph();
        let z = ZoneManager::from_keys(&g, vec![("ends".to_string(), vec!["A", "C"])]).unwrap();
        assert!(z.in_any_zone(a));
        assert!(z.in_any_zone(c));
        assert_eq!(z.zone_names().collect::<Vec<_>>(), vec!["ends"]);
    }

    #[test]
    fn from_keys_unknown_key_fails() {
        let (g, _) = super::helpers::line_graph();
        let err = ZoneManager::from_keys(&g, vec![("z".to_string(), vec!["Q"])]).unwrap_err();
        assert!(matches!(err, GraphError::UnknownNodeKey(k) if k == "Q"));
    }
}
