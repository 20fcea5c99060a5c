//! Time-limited interaction effects
//!
//! Gravity wells, particle streams and fusion events. Each paints into the
//! scalar field through `apply_radial_effect` and nudges particles; the world
//! removes them once their lifetime runs out.

use glam::Vec2;
use serde::Serialize;

use super::entity::{EntityId, Particle};
use super::field::ScalarField;
use crate::consts::*;
use crate::{distance_to_segment, heading_to, normalize_angle};

/// Gravity well size class, chosen by drag radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WellTier {
    Micro,
    Standard,
    Massive,
    BlackHole,
}

impl WellTier {
    pub fn for_radius(radius: f32) -> Self {
        if radius < 60.0 {
            WellTier::Micro
        } else if radius < 120.0 {
            WellTier::Standard
        } else if radius < 180.0 {
            WellTier::Massive
        } else {
            WellTier::BlackHole
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WellTier::Micro => "micro",
            WellTier::Standard => "standard",
            WellTier::Massive => "massive",
            WellTier::BlackHole => "black_hole",
        }
    }

    /// Energy cost given the tuning base cost
    pub fn cost(&self, base: f32) -> f32 {
        match self {
            WellTier::Micro => (base * 0.5).floor(),
            WellTier::Standard => base,
            WellTier::Massive => (base * 1.25).floor(),
            WellTier::BlackHole => (base * 1.5).floor(),
        }
    }

    pub fn strength(&self) -> f32 {
        match self {
            WellTier::Micro => 0.5,
            WellTier::Standard => 1.0,
            WellTier::Massive => 1.6,
            WellTier::BlackHole => 2.5,
        }
    }

    /// Lifetime in seconds
    pub fn lifespan(&self) -> f32 {
        match self {
            WellTier::Micro => 8.0,
            WellTier::Standard => 12.0,
            WellTier::Massive => 18.0,
            WellTier::BlackHole => 25.0,
        }
    }

    /// Chance of a bonus element discovery when created
    pub fn bonus_discovery_chance(&self) -> f32 {
        match self {
            WellTier::Massive => 0.25,
            WellTier::BlackHole => 0.5,
            _ => 0.0,
        }
    }
}

/// Attracts particles and deepens the field around a point
#[derive(Debug, Clone, Serialize)]
pub struct GravityWell {
    pub id: EntityId,
    pub pos: Vec2,
    pub strength: f32,
    pub radius: f32,
    /// Seconds left
    pub life: f32,
    pub tier: WellTier,
}

impl GravityWell {
    pub fn new(id: EntityId, pos: Vec2, radius: f32) -> Self {
        let radius = radius.clamp(WELL_MIN_RADIUS, WELL_MAX_RADIUS);
        let tier = WellTier::for_radius(radius);
        Self {
            id,
            pos,
            strength: tier.strength(),
            radius,
            life: tier.lifespan(),
            tier,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.life <= 0.0
    }

    /// Advance one tick
    pub fn update(&mut self, dt: f32, field: &mut ScalarField, particles: &mut [Particle], max_speed: f32) {
        let strength = self.strength;
        field.apply_radial_effect(self.pos.x, self.pos.y, self.radius, |factor| {
            strength * factor * dt * WELL_FIELD_SCALE
        });

        for p in particles.iter_mut() {
            let dist = p.pos.distance(self.pos);
            if dist >= self.radius {
                continue;
            }
            let factor = 1.0 - dist / self.radius;
            let toward = heading_to(p.pos, self.pos);
            let delta = normalize_angle(toward - p.direction);
            p.direction += delta * (factor * strength * dt * WELL_STEER).min(1.0);
            p.speed = (p.speed + strength * factor * WELL_ACCEL * dt).min(max_speed);
        }

        self.life -= dt;
    }
}

/// Stream size class, chosen by drag length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamTier {
    Trickle,
    Current,
    Torrent,
}

impl StreamTier {
    pub fn for_length(length: f32) -> Self {
        if length < 150.0 {
            StreamTier::Trickle
        } else if length < 300.0 {
            StreamTier::Current
        } else {
            StreamTier::Torrent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamTier::Trickle => "trickle",
            StreamTier::Current => "current",
            StreamTier::Torrent => "torrent",
        }
    }

    pub fn cost(&self, base: f32) -> f32 {
        match self {
            StreamTier::Trickle => (base * 0.75).floor(),
            StreamTier::Current => base,
            StreamTier::Torrent => (base * 1.5).floor(),
        }
    }

    pub fn strength(&self) -> f32 {
        match self {
            StreamTier::Trickle => 0.6,
            StreamTier::Current => 1.0,
            StreamTier::Torrent => 1.5,
        }
    }

    pub fn duration(&self) -> f32 {
        match self {
            StreamTier::Trickle => 6.0,
            StreamTier::Current => 8.0,
            StreamTier::Torrent => 10.0,
        }
    }

    /// Particles emitted per second
    pub fn particle_rate(&self) -> f32 {
        match self {
            StreamTier::Trickle => 3.0,
            StreamTier::Current => 5.0,
            StreamTier::Torrent => 8.0,
        }
    }
}

/// Launch parameters for a particle emitted by an effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    pub pos: Vec2,
    pub direction: f32,
    pub speed: f32,
    pub energy: f32,
}

/// Directed flow between two points
#[derive(Debug, Clone, Serialize)]
pub struct ParticleStream {
    pub id: EntityId,
    pub start: Vec2,
    pub end: Vec2,
    pub strength: f32,
    /// Seconds left
    pub duration: f32,
    pub particle_rate: f32,
    /// Seconds until the next emission
    pub cooldown: f32,
    pub tier: StreamTier,
}

impl ParticleStream {
    pub fn new(id: EntityId, start: Vec2, end: Vec2) -> Self {
        let tier = StreamTier::for_length(start.distance(end));
        Self {
            id,
            start,
            end,
            strength: tier.strength(),
            duration: tier.duration(),
            particle_rate: tier.particle_rate(),
            cooldown: 0.0,
            tier,
        }
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    pub fn heading(&self) -> f32 {
        heading_to(self.start, self.end)
    }

    pub fn is_expired(&self) -> bool {
        self.duration <= 0.0
    }

    /// Advance one tick; returns a particle to emit when the cooldown lapses
    pub fn update(
        &mut self,
        dt: f32,
        field: &mut ScalarField,
        particles: &mut [Particle],
        max_speed: f32,
    ) -> Option<Emission> {
        self.duration -= dt;
        self.cooldown -= dt;

        let strength = self.strength;
        let samples = (self.length() / STREAM_SAMPLE_SPACING).ceil().max(1.0) as usize;
        for i in 0..=samples {
            let point = self.start.lerp(self.end, i as f32 / samples as f32);
            field.apply_radial_effect(point.x, point.y, STREAM_PAINT_RADIUS, |factor| {
                strength * factor * dt * 0.3
            });
        }

        let heading = self.heading();
        for p in particles.iter_mut() {
            let dist = distance_to_segment(p.pos, self.start, self.end);
            if dist >= STREAM_CAPTURE_DISTANCE {
                continue;
            }
            let factor = 1.0 - dist / STREAM_CAPTURE_DISTANCE;
            let delta = normalize_angle(heading - p.direction);
            p.direction += delta * (factor * strength * dt * 3.0).min(1.0);
            p.speed = (p.speed + factor * strength * 40.0 * dt).min(max_speed);
        }

        if self.cooldown <= 0.0 && !self.is_expired() {
            self.cooldown = 1.0 / self.particle_rate;
            return Some(Emission {
                pos: self.start,
                direction: heading,
                speed: (STREAM_PARTICLE_SPEED * strength).min(max_speed),
                energy: 10.0 * strength,
            });
        }
        None
    }
}

/// Particles being fused at a point
#[derive(Debug, Clone, Serialize)]
pub struct FusionEvent {
    pub id: EntityId,
    pub center: Vec2,
    pub participant_count: usize,
    /// Summed energy of the consumed participants
    pub participant_energy: f32,
    pub progress: f32,
    pub max_progress: f32,
    pub radius: f32,
}

impl FusionEvent {
    /// Build from the consumed participants
    pub fn from_participants(id: EntityId, participants: &[Particle]) -> Self {
        let count = participants.len().max(1);
        let center = participants.iter().map(|p| p.pos).sum::<Vec2>() / count as f32;
        let spread = participants
            .iter()
            .map(|p| p.pos.distance(center))
            .fold(0.0, f32::max);
        Self {
            id,
            center,
            participant_count: participants.len(),
            participant_energy: participants.iter().map(|p| p.energy).sum(),
            progress: 0.0,
            max_progress: 2.0 + 0.2 * participants.len() as f32,
            radius: (spread + 20.0).max(30.0),
        }
    }

    /// Completion ratio in [0, 1]
    pub fn ratio(&self) -> f32 {
        (self.progress / self.max_progress).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.max_progress
    }

    /// Number of particles released on completion
    pub fn ring_size(&self) -> usize {
        FUSION_RING_BASE + self.participant_count
    }

    /// Advance one tick
    pub fn update(&mut self, dt: f32, field: &mut ScalarField, particles: &mut [Particle]) {
        self.progress += dt;
        let ratio = self.ratio();
        let pull_radius = self.radius * 2.0;

        for p in particles.iter_mut() {
            let dist = p.pos.distance(self.center);
            if dist >= pull_radius || dist < 1.0 {
                continue;
            }
            let factor = 1.0 - dist / pull_radius;
            let toward = heading_to(p.pos, self.center);
            let delta = normalize_angle(toward - p.direction);
            p.direction += delta * (factor * ratio * dt * 4.0).min(1.0);
        }

        field.apply_radial_effect(self.center.x, self.center.y, self.radius, |factor| {
            factor * ratio * dt * 0.5
        });
    }

    /// Ring of particles released on completion, sharing the fused energy
    pub fn emissions(&self) -> Vec<Emission> {
        let n = self.ring_size();
        let energy = self.participant_energy * FUSION_ENERGY_GAIN / n as f32;
        (0..n)
            .map(|i| {
                let direction = i as f32 / n as f32 * std::f32::consts::TAU;
                Emission {
                    pos: self.center + crate::heading_vector(direction) * 5.0,
                    direction,
                    speed: 80.0,
                    energy,
                }
            })
            .collect()
    }
}
