//! `agv-motion` — vehicle state machine, kinematics and node hand-off.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                       |
//! |-------------|----------------------------------------------------------------|
//! | [`state`]   | `AgentState`, `Journey`, `Wait`, `WaitReason`, `MotionEvent`   |
//! | [`agent`]   | `Agent`: one vehicle and its per-tick `advance`                |
//! | [`error`]   | `MotionError`, `MotionResult<T>`                               |
//!
//! # Movement model (continuous, tick-stepped)
//!
//! 1. A route is assigned; the next hop is committed with
//!    [`Agent::request_step`], which reserves the node and sets a heading.
//! 2. Every tick [`Agent::advance`] re-checks the committed node, turns by a
//!    bounded step until aligned, then translates at a fixed speed.
//! 3. Closer than one tick's travel, the vehicle snaps onto the node, moves
//!    its occupancy there and drops its reservation.
//!
//! Blocking (target occupied, another vehicle within the collision radius)
//! is never an error: the vehicle enters [`AgentState::Waiting`] and the
//! next tick tries again.  Nothing detects or breaks deadlock.

pub mod agent;
pub mod error;
pub mod state;


pub use agent::{Agent, StepOutcome};
pub use error::{MotionError, MotionResult};
pub use state::{AgentState, Journey, MotionEvent, Wait, WaitReason};
