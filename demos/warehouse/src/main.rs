//! warehouse — AGV fleet demo on a three-aisle warehouse floor.
//!
//! Seeds a small fleet, keeps every idle vehicle busy with random tasks and
//! prints the fleet state at the end.
//!
//! ```text
//! warehouse [CONFIG.json] [MAP.json]
//! ```
//!
//! Both files are optional; the defaults are `SimConfig::default()` and the
//! built-in map.  Set `RUST_LOG=debug` (or `trace`) for per-agent detail.

mod network;

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use agv_core::{AgentId, NodeId, SimConfig, Tick};
use agv_motion::MotionEvent;
use agv_sim::{SimBuilder, SimObserver, TickReport};

use network::MapFile;

// ── Constants ─────────────────────────────────────────────────────────────────

const AGENT_COUNT:       usize = 6;
const DISPATCH_INTERVAL: u64   = 30;
const REPORT_INTERVAL:   u64   = 600;

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct FleetStats {
    arrivals:     usize,
    deliveries:   usize,
    wait_ticks:   usize,
    window_moved: usize,
}

impl SimObserver for FleetStats {
    fn on_agent_event(&mut self, _tick: Tick, _agent: AgentId, event: &MotionEvent) {
        if let MotionEvent::Arrived { finished, .. } = event {
            self.arrivals += 1;
            if *finished {
                self.deliveries += 1;
            }
        }
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        self.wait_ticks += report.waiting;
        self.window_moved += report.moved + report.arrived;
        if report.tick.0 > 0 && report.tick.0.is_multiple_of(REPORT_INTERVAL) {
            info!(
                tick = %report.tick,
                moving = self.window_moved,
                arrivals = self.arrivals,
                deliveries = self.deliveries,
                "progress"
            );
            self.window_moved = 0;
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn load_config(path: &Path) -> Result<SimConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(p) => load_config(Path::new(&p))?,
        None => SimConfig::default(),
    };
    let map = match args.next() {
        Some(p) => MapFile::load(Path::new(&p))?,
        None => network::built_in(),
    };

    // 1. Map and zones.
    let (graph, zones) = map.into_model()?;

    // 2. Simulation.
    let mut sim = SimBuilder::new(graph).config(config.clone()).zones(zones).build()?;
    let m = sim.map_summary();
    info!(
        nodes = m.node_count,
        edges = m.edge_count,
        zones = m.zone_count,
        controlled = m.controlled_node_count,
        "map loaded"
    );

    // 3. Fleet.
    let added = sim.add_agents(AGENT_COUNT)?;
    info!(agents = added.len(), seed = config.seed, ticks = config.total_ticks, "fleet ready");

    // 4. Run, topping up tasks as vehicles fall idle.
    let mut stats = FleetStats::default();
    let t0 = Instant::now();
    while sim.now().0 < config.total_ticks {
        sim.dispatch_random_tasks()?;
        let left = config.total_ticks - sim.now().0;
        sim.run_ticks(DISPATCH_INTERVAL.min(left), &mut stats)?;
    }
    sim.check_invariants()?;
    let elapsed = t0.elapsed();

    // 5. Summary.
    println!();
    println!(
        "Simulated {} ({} ticks) in {:.3} s",
        sim.clock,
        sim.now().0,
        elapsed.as_secs_f64()
    );
    println!(
        "  arrivals: {}  deliveries: {}  agent-ticks waiting: {}",
        stats.arrivals, stats.deliveries, stats.wait_ticks
    );
    println!();

    println!("{:<12} {:<8} {:<18} {:<24} {}", "Agent", "Node", "Position", "Status", "Zones");
    println!("{}", "-".repeat(80));
    for s in sim.agent_summaries() {
        let zones = sim.zones().zones_of(s.node).join(",");
        println!(
            "{:<12} {:<8} {:<18} {:<24} {}",
            s.id.to_string(),
            node_key(&sim, s.node),
            s.pos.to_string(),
            s.status,
            zones
        );
    }

    let hops: Vec<String> = sim
        .active_edges()
        .iter()
        .map(|&e| {
            let (from, to) = sim.graph().edge_endpoints(e);
            format!("{}→{}", node_key(&sim, from), node_key(&sim, to))
        })
        .collect();
    println!();
    println!("Active hops ({}): {}", hops.len(), hops.join("  "));

    Ok(())
}

fn node_key(sim: &agv_sim::Simulation, node: NodeId) -> &str {
    sim.graph().key(node).unwrap_or("?")
}
