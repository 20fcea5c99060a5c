//! Cosmos Sandbox - A real-time particle-and-field universe
//!
//! Core modules:
//! - `sim`: Simulation core (field, entities, effects, cosmos progression)
//! - `engine`: Frame loop, lifecycle, input routing and observers
//! - `tuning`: Data-driven game balance
//! - `platform`: Browser/native platform facades

pub mod engine;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use engine::{CosmosEngine, CosmosSnapshot, Observer};
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Side length of a field cell in world units
    pub const CELL_SIZE: f32 = 10.0;
    /// Largest frame delta accepted by the loop (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Field diffusion blend toward the neighbour mean
    pub const DIFFUSION_BLEND: f32 = 0.1;
    /// Spatial frequency of the disturbance ripple
    pub const DISTURB_WAVE: f32 = 0.2;

    /// Gravity well field painting scale (`k`)
    pub const WELL_FIELD_SCALE: f32 = 0.5;
    /// Gravity well steering gain
    pub const WELL_STEER: f32 = 2.0;
    /// Gravity well speed gain (units/s² at full strength)
    pub const WELL_ACCEL: f32 = 60.0;
    /// Smallest/largest well radius a drag can produce
    pub const WELL_MIN_RADIUS: f32 = 30.0;
    pub const WELL_MAX_RADIUS: f32 = 250.0;

    /// Streams shorter than this are ignored
    pub const STREAM_MIN_LENGTH: f32 = 20.0;
    /// Spacing of field samples painted along a stream
    pub const STREAM_SAMPLE_SPACING: f32 = 20.0;
    /// Radius painted at each stream sample
    pub const STREAM_PAINT_RADIUS: f32 = 20.0;
    /// Particles closer than this to a stream get swept along
    pub const STREAM_CAPTURE_DISTANCE: f32 = 25.0;
    /// Base speed of stream-emitted particles
    pub const STREAM_PARTICLE_SPEED: f32 = 120.0;

    /// Particles emitted by a completed fusion (plus one per participant)
    pub const FUSION_RING_BASE: usize = 8;
    /// Energy multiplier applied to fused participant energy
    pub const FUSION_ENERGY_GAIN: f32 = 1.5;
    /// Score per fusion participant
    pub const FUSION_SCORE_PER_PARTICIPANT: u64 = 50;
    /// Fusions with more participants than this can go unstable
    pub const FUSION_STABLE_LIMIT: usize = 7;

    /// Particle pick radius for fusion selection
    pub const SELECT_RADIUS: f32 = 20.0;
    /// Pointer travel that turns a click into a drag
    pub const DRAG_THRESHOLD: f32 = 8.0;
    /// Distance travelled per trail particle in create mode
    pub const CREATE_TRAIL_SPACING: f32 = 25.0;
    /// Extra pick margin around a body in explore mode
    pub const EXPLORE_PICK_MARGIN: f32 = 10.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector for a heading in radians
#[inline]
pub fn heading_vector(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Heading (radians) pointing from `from` to `to`
#[inline]
pub fn heading_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Shortest distance from `p` to the segment `a..b`
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
