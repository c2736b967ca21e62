//! Fluent builder for constructing a [`Simulation`].

use agv_core::{CoreError, SimConfig, SimRng};
use agv_graph::{GraphModel, ZoneManager};
use rustc_hash::FxHashMap;

use crate::{SimError, SimResult, Simulation};

/// Fluent builder for [`Simulation`].
///
/// # Required inputs
///
/// - [`GraphModel`]: the facility map, built once by the loader
///
/// # Optional inputs (have defaults)
///
/// | Method            | Default                   |
/// |-------------------|---------------------------|
/// | `.config(c)`      | `SimConfig::default()`    |
/// | `.zones(z)`       | No zones                  |
/// | `.collision(b)`   | Enabled                   |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(graph)
///     .config(config)
///     .zones(zones)
///     .build()?;
/// sim.add_agents(3)?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    graph:     GraphModel,
    config:    SimConfig,
    zones:     ZoneManager,
    collision: bool,
}

impl SimBuilder {
    pub fn new(graph: GraphModel) -> Self {
        Self {
            graph,
            config:    SimConfig::default(),
            zones:     ZoneManager::new(),
            collision: true,
        }
    }

    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Static control zones.  Purely descriptive; they never affect motion.
    pub fn zones(mut self, zones: ZoneManager) -> Self {
        self.zones = zones;
        self
    }

    /// Start with collision avoidance on or off.
    pub fn collision(mut self, enabled: bool) -> Self {
        self.collision = enabled;
        self
    }

    /// Validate the configuration and return an empty, ready-to-run
    /// [`Simulation`] positioned at tick 0.
    pub fn build(self) -> SimResult<Simulation> {
        self.config.validate().map_err(|e| match e {
            CoreError::Config(msg) => SimError::Config(msg),
            other => other.into(),
        })?;

        Ok(Simulation {
            clock:             self.config.make_clock(),
            rng:               SimRng::new(self.config.seed),
            config:            self.config,
            graph:             self.graph,
            zones:             self.zones,
            agents:            FxHashMap::default(),
            order:             Vec::new(),
            next_id:           1,
            collision_enabled: self.collision,
            active:            Vec::new(),
            planned:           Vec::new(),
        })
    }
}
