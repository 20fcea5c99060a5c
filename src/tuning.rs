//! Game balance tuning
//!
//! Every balance knob of the sandbox lives here so hosts can ship a JSON
//! override without touching the simulation code. Missing keys fall back to
//! the defaults below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a tuning table
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, TuningError>;

/// Balance constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Energy & score ===
    /// Energy pool ceiling
    pub max_energy: f32,
    /// Energy regenerated per second
    pub energy_regen: f32,
    /// Score needed per level
    pub level_threshold: u64,
    /// Seconds without growth before the combo resets
    pub combo_timeout: f32,
    /// Combo multiplier ceiling
    pub combo_max: u32,
    /// Score for each newly discovered element
    pub discovery_score: u64,

    // === Big Bang ===
    pub big_bang_cost: f32,
    pub big_bang_score: u64,
    /// Delay before the follow-up phase advance (seconds)
    pub big_bang_followup: f32,

    // === Action costs ===
    pub create_burst_cost: f32,
    pub create_burst_size: usize,
    pub create_trail_cost: f32,
    pub gravity_base_cost: f32,
    pub stream_base_cost: f32,
    pub fusion_cost: f32,
    pub explore_cost: f32,

    // === Population ===
    pub max_particles: usize,
    pub max_bodies: usize,
    pub particle_lifespan_min: f32,
    pub particle_lifespan_max: f32,
    pub max_particle_speed: f32,
    /// Particles slower than this count as idle for emergent growth
    pub idle_speed: f32,
    /// Fractional speed loss per second
    pub drag: f32,
    /// Heading change per second per unit of field offset
    pub field_steer: f32,

    // === Chances ===
    /// Per-tick chance that an idle, isolated particle becomes a body
    pub growth_chance: f32,
    /// An idle particle needs this much clearance from bodies to grow
    pub growth_clearance: f32,
    pub entangle_chance: f32,
    pub fusion_failure_chance: f32,
    /// Share of selected particles lost to an unstable fusion
    pub fusion_failure_fraction: f32,
    pub fusion_body_chance: f32,
    /// Bounce (vs wrap) probability when a particle leaves the world
    pub bounce_chance: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_energy: 100.0,
            energy_regen: 5.0,
            level_threshold: 1000,
            combo_timeout: 5.0,
            combo_max: 10,
            discovery_score: 100,

            big_bang_cost: 50.0,
            big_bang_score: 300,
            big_bang_followup: 3.0,

            create_burst_cost: 5.0,
            create_burst_size: 5,
            create_trail_cost: 1.0,
            gravity_base_cost: 20.0,
            stream_base_cost: 15.0,
            fusion_cost: 15.0,
            explore_cost: 20.0,

            max_particles: 600,
            max_bodies: 120,
            particle_lifespan_min: 20.0,
            particle_lifespan_max: 40.0,
            max_particle_speed: 300.0,
            idle_speed: 15.0,
            drag: 0.15,
            field_steer: 0.8,

            growth_chance: 0.002,
            growth_clearance: 80.0,
            entangle_chance: 0.3,
            fusion_failure_chance: 0.3,
            fusion_failure_fraction: 0.7,
            fusion_body_chance: 0.4,
            bounce_chance: 0.5,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning table
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning table");
        Ok(tuning)
    }

    /// Serialize to pretty JSON (for hosts that want to ship an override file)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject tables the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        positive("max_energy", self.max_energy)?;
        positive("max_particle_speed", self.max_particle_speed)?;
        positive("particle_lifespan_min", self.particle_lifespan_min)?;
        positive("combo_timeout", self.combo_timeout)?;
        positive("idle_speed", self.idle_speed)?;
        if self.particle_lifespan_max < self.particle_lifespan_min {
            return Err(TuningError::InvalidParameter {
                name: "particle_lifespan_max",
                reason: format!(
                    "{} is below particle_lifespan_min {}",
                    self.particle_lifespan_max, self.particle_lifespan_min
                ),
            });
        }
        if self.level_threshold == 0 {
            return Err(TuningError::InvalidParameter {
                name: "level_threshold",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.combo_max == 0 {
            return Err(TuningError::InvalidParameter {
                name: "combo_max",
                reason: "must be at least 1".to_string(),
            });
        }
        for (name, value) in [
            ("growth_chance", self.growth_chance),
            ("entangle_chance", self.entangle_chance),
            ("fusion_failure_chance", self.fusion_failure_chance),
            ("fusion_failure_fraction", self.fusion_failure_fraction),
            ("fusion_body_chance", self.fusion_body_chance),
            ("bounce_chance", self.bounce_chance),
        ] {
            probability(name, value)?;
        }
        for (name, value) in [
            ("big_bang_cost", self.big_bang_cost),
            ("create_burst_cost", self.create_burst_cost),
            ("create_trail_cost", self.create_trail_cost),
            ("gravity_base_cost", self.gravity_base_cost),
            ("stream_base_cost", self.stream_base_cost),
            ("fusion_cost", self.fusion_cost),
            ("explore_cost", self.explore_cost),
            ("energy_regen", self.energy_regen),
            ("big_bang_followup", self.big_bang_followup),
            ("drag", self.drag),
            ("field_steer", self.field_steer),
            ("growth_clearance", self.growth_clearance),
        ] {
            non_negative(name, value)?;
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::InvalidParameter {
            name,
            reason: format!("{value} must be positive"),
        })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::InvalidParameter {
            name,
            reason: format!("{value} must not be negative"),
        })
    }
}

fn probability(name: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::InvalidParameter {
            name,
            reason: format!("{value} is outside [0, 1]"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "max_energy": 250.0 }"#).unwrap();
        assert_eq!(tuning.max_energy, 250.0);
        assert_eq!(tuning.gravity_base_cost, Tuning::default().gravity_base_cost);
    }

    #[test]
    fn test_rejects_bad_probability() {
        let err = Tuning::from_json(r#"{ "bounce_chance": 1.5 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::InvalidParameter { name: "bounce_chance", .. }
        ));
    }

    #[test]
    fn test_rejects_non_finite_motion_knobs() {
        let tuning = Tuning {
            drag: f32::NAN,
            ..Tuning::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::InvalidParameter { name: "drag", .. })
        ));

        let tuning = Tuning {
            combo_timeout: 0.0,
            ..Tuning::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::InvalidParameter { name: "combo_timeout", .. })
        ));

        let tuning = Tuning {
            growth_clearance: f32::INFINITY,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_err());

        let tuning = Tuning {
            big_bang_followup: -1.0,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_level_threshold() {
        let err = Tuning::from_json(r#"{ "level_threshold": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::InvalidParameter { name: "level_threshold", .. }
        ));
    }

    #[test]
    fn test_io_error_converts() {
        fn read(path: &str) -> Result<Tuning> {
            let json = std::fs::read_to_string(path)?;
            Tuning::from_json(&json)
        }
        let err = read("/nonexistent/cosmos-tuning.json").unwrap_err();
        assert!(matches!(err, TuningError::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Json(_)));
    }

    #[test]
    fn test_json_roundtrip_preserves_table() {
        let mut tuning = Tuning::default();
        tuning.fusion_cost = 42.0;
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }
}
