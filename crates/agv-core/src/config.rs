//! Simulation configuration.
//!
//! Typically built in code or loaded from JSON by the application crate
//! (with the `serde` feature) and handed to `SimBuilder`.

use crate::{CoreError, CoreResult, SimClock};

/// Per-vehicle kinematics.  All quantities are per tick.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionConfig {
    /// Linear speed in map units per tick.
    pub speed: f32,
    /// Maximum heading change per tick, in degrees.
    pub rotation_step_deg: f32,
    /// Once the remaining turn is within this many degrees the heading snaps
    /// to the target.
    pub rotation_snap_deg: f32,
    /// Minimum clearance to other vehicles.  Applied while collision checking
    /// is enabled; zero disables avoidance.
    pub collision_radius: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed:             2.0,
            rotation_step_deg: 3.0,
            rotation_snap_deg: 3.0,
            collision_radius:  25.0,
        }
    }
}

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Nominal tick rate, used only to map ticks to seconds.  Default: 60.
    pub tick_rate_hz: u32,

    /// Ticks executed by `Simulation::run`.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Countdown placed on a node when a vehicle commits to entering it.
    pub reservation_ticks: u32,

    /// Planner cost added for entering a node occupied by another vehicle.
    pub busy_node_penalty: f32,

    pub motion: MotionConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz:      60,
            total_ticks:       3_600,
            seed:              42,
            reservation_ticks: 50,
            busy_node_penalty: 100.0,
            motion:            MotionConfig::default(),
        }
    }
}

impl SimConfig {
    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_rate_hz)
    }

    /// Reject values that would stall or break the kinematics.
    pub fn validate(&self) -> CoreResult<()> {
        let m = &self.motion;
        if self.tick_rate_hz == 0 {
            return Err(CoreError::Config("tick_rate_hz must be positive".into()));
        }
        if m.speed.is_nan() || m.speed <= 0.0 {
            return Err(CoreError::Config(format!("speed must be positive, got {}", m.speed)));
        }
        if m.rotation_step_deg.is_nan() || m.rotation_step_deg <= 0.0 {
            return Err(CoreError::Config(format!(
                "rotation_step_deg must be positive, got {}",
                m.rotation_step_deg
            )));
        }
        // A snap window narrower than half a step can be jumped over forever.
        if m.rotation_snap_deg.is_nan() || m.rotation_snap_deg < m.rotation_step_deg / 2.0 {
            return Err(CoreError::Config(format!(
                "rotation_snap_deg must be at least half of rotation_step_deg ({}), got {}",
                m.rotation_step_deg / 2.0,
                m.rotation_snap_deg
            )));
        }
        if m.collision_radius.is_nan() || m.collision_radius < 0.0 {
            return Err(CoreError::Config(format!(
                "collision_radius must not be negative, got {}",
                m.collision_radius
            )));
        }
        if self.busy_node_penalty.is_nan() || self.busy_node_penalty < 0.0 {
            return Err(CoreError::Config(format!(
                "busy_node_penalty must not be negative, got {}",
                self.busy_node_penalty
            )));
        }
        Ok(())
    }
}
