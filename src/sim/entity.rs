//! Particles and cosmic bodies
//!
//! Entities carry their own per-tick update rules. Ownership of entanglement
//! lives outside the particle (see [`Entanglements`]).

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::field::ScalarField;
use super::rng::SimRng;
use crate::heading_vector;
use crate::tuning::Tuning;

/// Stable entity identifier (unique across particles, bodies and effects)
pub type EntityId = u32;

/// Hands out entity ids in increasing order
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: EntityId,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// A free particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: EntityId,
    pub pos: Vec2,
    /// Heading in radians
    pub direction: f32,
    pub speed: f32,
    pub energy: f32,
    pub age: f32,
    pub lifespan: f32,
    /// Quantum visual state: wavelength (render units) and phase (radians)
    pub wavelength: f32,
    pub phase: f32,
}

impl Particle {
    pub fn new(id: EntityId, pos: Vec2, direction: f32, speed: f32, energy: f32, lifespan: f32) -> Self {
        Self {
            id,
            pos,
            direction,
            speed,
            energy,
            age: 0.0,
            lifespan,
            wavelength: 20.0,
            phase: 0.0,
        }
    }

    /// Particle with randomized lifespan and quantum state
    pub fn spawn(
        id: EntityId,
        pos: Vec2,
        direction: f32,
        speed: f32,
        energy: f32,
        tuning: &Tuning,
        rng: &mut SimRng,
    ) -> Self {
        let lifespan = rng.range(tuning.particle_lifespan_min, tuning.particle_lifespan_max);
        let mut particle = Self::new(
            id,
            pos,
            direction,
            speed.min(tuning.max_particle_speed),
            energy,
            lifespan,
        );
        particle.wavelength = rng.range(10.0, 40.0);
        particle.phase = rng.angle();
        particle
    }

    pub fn is_alive(&self) -> bool {
        self.age < self.lifespan
    }

    pub fn is_idle(&self, tuning: &Tuning) -> bool {
        self.speed < tuning.idle_speed
    }

    /// Velocity vector
    pub fn velocity(&self) -> Vec2 {
        heading_vector(self.direction) * self.speed
    }

    /// Advance one tick
    pub fn update(&mut self, dt: f32, field: &ScalarField, tuning: &Tuning, rng: &mut SimRng) {
        // Field-following: high potential bends left, low potential bends right
        let local = field.sample(self.pos.x, self.pos.y);
        self.direction += (local - 0.5) * tuning.field_steer * dt;

        self.speed *= (1.0 - tuning.drag * dt).max(0.0);
        self.speed = self.speed.clamp(0.0, tuning.max_particle_speed);

        self.pos += heading_vector(self.direction) * self.speed * dt;

        self.phase = (self.phase + TAU * dt * 60.0 / self.wavelength.max(1.0)).rem_euclid(TAU);
        self.age += dt;

        self.resolve_bounds(field.width(), field.height(), tuning.bounce_chance, rng);
    }

    /// Bounce or wrap at the world edges (coin flip per out-of-bounds event)
    pub fn resolve_bounds(&mut self, width: f32, height: f32, bounce_chance: f32, rng: &mut SimRng) {
        use std::f32::consts::PI;

        if self.pos.x < 0.0 || self.pos.x > width {
            if rng.chance(bounce_chance) {
                self.direction = PI - self.direction;
                self.pos.x = self.pos.x.clamp(0.0, width);
            } else {
                self.pos.x = wrap(self.pos.x, width);
            }
        }
        if self.pos.y < 0.0 || self.pos.y > height {
            if rng.chance(bounce_chance) {
                self.direction = -self.direction;
                self.pos.y = self.pos.y.clamp(0.0, height);
            } else {
                self.pos.y = wrap(self.pos.y, height);
            }
        }
        self.direction = crate::normalize_angle(self.direction);
    }
}

fn wrap(v: f32, extent: f32) -> f32 {
    if extent <= 0.0 { 0.0 } else { v.rem_euclid(extent) }
}

/// Kinds of cosmic body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Generic life node
    Life,
    Star,
    Planet,
    Galaxy,
    BlackHole,
    Nebula,
}

impl BodyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyKind::Life => "life",
            BodyKind::Star => "star",
            BodyKind::Planet => "planet",
            BodyKind::Galaxy => "galaxy",
            BodyKind::BlackHole => "black_hole",
            BodyKind::Nebula => "nebula",
        }
    }

    /// Field contribution per unit size (black holes drain)
    pub fn base_strength(&self) -> f32 {
        match self {
            BodyKind::Life => 0.3,
            BodyKind::Star => 1.0,
            BodyKind::Planet => 0.4,
            BodyKind::Galaxy => 1.5,
            BodyKind::BlackHole => -2.0,
            BodyKind::Nebula => 0.6,
        }
    }

    /// First phase in which bodies of this kind can be explored
    pub fn explorable_from_phase(&self) -> Option<usize> {
        match self {
            BodyKind::Nebula => Some(3),
            BodyKind::Star | BodyKind::Planet => Some(4),
            BodyKind::Galaxy => Some(5),
            BodyKind::Life => Some(6),
            BodyKind::BlackHole => None,
        }
    }

    /// Base hue (degrees) for the presentation layer
    fn base_hue(&self) -> f32 {
        match self {
            BodyKind::Life => 120.0,
            BodyKind::Star => 45.0,
            BodyKind::Planet => 200.0,
            BodyKind::Galaxy => 270.0,
            BodyKind::BlackHole => 0.0,
            BodyKind::Nebula => 310.0,
        }
    }

    /// Pick a kind appropriate to the current phase
    pub fn for_phase(phase: usize, energy: f32, rng: &mut SimRng) -> Self {
        let roll = rng.unit();
        match phase {
            0..=2 => BodyKind::Nebula,
            3 => {
                if energy > 60.0 && roll < 0.5 {
                    BodyKind::Star
                } else {
                    BodyKind::Nebula
                }
            }
            4 => {
                if roll < 0.5 {
                    BodyKind::Star
                } else if roll < 0.85 {
                    BodyKind::Planet
                } else {
                    BodyKind::Nebula
                }
            }
            5 => {
                if energy > 150.0 && roll < 0.15 {
                    BodyKind::BlackHole
                } else if roll < 0.4 {
                    BodyKind::Galaxy
                } else if roll < 0.7 {
                    BodyKind::Star
                } else {
                    BodyKind::Planet
                }
            }
            _ => {
                if roll < 0.35 {
                    BodyKind::Life
                } else if roll < 0.6 {
                    BodyKind::Planet
                } else if roll < 0.8 {
                    BodyKind::Star
                } else if roll < 0.95 {
                    BodyKind::Galaxy
                } else {
                    BodyKind::BlackHole
                }
            }
        }
    }
}

/// A persistent cosmic object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    pub pos: Vec2,
    pub size: f32,
    pub energy: f32,
    pub kind: BodyKind,
    pub age: f32,
    /// Display hue in degrees
    pub hue: f32,
    /// Pulse animation phase (radians)
    pub pulse: f32,
    /// Phase index the body was formed in
    pub formed_in_phase: usize,
    /// Parent body (interior bodies only)
    pub parent: Option<EntityId>,
    /// Children, generated on first exploration
    pub interior: Option<Vec<Body>>,
}

impl Body {
    pub fn new(id: EntityId, pos: Vec2, energy: f32, kind: BodyKind, phase: usize) -> Self {
        let size = Self::size_for_energy(kind, energy);
        Self {
            id,
            pos,
            size,
            energy,
            kind,
            age: 0.0,
            hue: (kind.base_hue() + phase as f32 * 12.0) % 360.0,
            pulse: 0.0,
            formed_in_phase: phase,
            parent: None,
            interior: None,
        }
    }

    /// Radius derived from accumulated energy
    pub fn size_for_energy(kind: BodyKind, energy: f32) -> f32 {
        let scale = match kind {
            BodyKind::Galaxy => 1.6,
            BodyKind::Nebula => 1.4,
            BodyKind::Star => 1.0,
            BodyKind::BlackHole => 0.8,
            BodyKind::Planet => 0.7,
            BodyKind::Life => 0.5,
        };
        (5.0 + energy.max(0.0).sqrt() * scale).min(60.0)
    }

    /// Field contribution of this body
    pub fn field_strength(&self) -> f32 {
        self.kind.base_strength() * self.size * 0.01
    }

    /// Absorb energy and grow
    pub fn absorb(&mut self, energy: f32) {
        self.energy += energy;
        self.size = Self::size_for_energy(self.kind, self.energy);
    }

    /// Advance one tick; bodies feed (or drain) the field around them
    pub fn update(&mut self, dt: f32, field: &mut ScalarField) {
        self.age += dt;
        self.pulse = (self.pulse + dt * 2.0).rem_euclid(TAU);
        let strength = self.field_strength();
        field.apply_radial_effect(self.pos.x, self.pos.y, self.size * 3.0, |factor| {
            strength * factor * dt
        });
    }

    pub fn contains_point(&self, point: Vec2, margin: f32) -> bool {
        self.pos.distance(point) <= self.size + margin
    }
}

/// Symmetric entanglement relation keyed by particle id
#[derive(Debug, Clone, Default)]
pub struct Entanglements {
    partners: HashMap<EntityId, EntityId>,
}

impl Entanglements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair two particles. Fails if either is already paired.
    pub fn entangle(&mut self, a: EntityId, b: EntityId) -> bool {
        if a == b || self.partners.contains_key(&a) || self.partners.contains_key(&b) {
            return false;
        }
        self.partners.insert(a, b);
        self.partners.insert(b, a);
        true
    }

    pub fn partner(&self, id: EntityId) -> Option<EntityId> {
        self.partners.get(&id).copied()
    }

    /// Break the pair containing `id` (both sides)
    pub fn release(&mut self, id: EntityId) {
        if let Some(other) = self.partners.remove(&id) {
            self.partners.remove(&other);
        }
    }

    /// Drop every pair where either side fails `alive`
    pub fn retain_alive<F>(&mut self, alive: F)
    where
        F: Fn(EntityId) -> bool,
    {
        let dead: Vec<EntityId> = self
            .partners
            .keys()
            .copied()
            .filter(|id| !alive(*id))
            .collect();
        for id in dead {
            self.release(id);
        }
    }

    /// Number of entangled pairs
    pub fn pair_count(&self) -> usize {
        self.partners.len() / 2
    }

    /// Each pair once, lower id first
    pub fn pairs(&self) -> Vec<(EntityId, EntityId)> {
        let mut pairs: Vec<_> = self
            .partners
            .iter()
            .filter(|(a, b)| a < b)
            .map(|(a, b)| (*a, *b))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    pub fn clear(&mut self) {
        self.partners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::testing::Fixed;

    #[test]
    fn test_particle_moves_along_heading() {
        let field = ScalarField::new(500.0, 500.0);
        let tuning = Tuning {
            drag: 0.0,
            field_steer: 0.0,
            ..Tuning::default()
        };
        let mut rng = SimRng::seeded(1);
        let mut p = Particle::new(1, Vec2::new(100.0, 100.0), 0.0, 50.0, 10.0, 30.0);
        p.update(1.0, &field, &tuning, &mut rng);
        assert!((p.pos.x - 150.0).abs() < 1e-3);
        assert!((p.pos.y - 100.0).abs() < 1e-3);
        assert_eq!(p.age, 1.0);
    }

    #[test]
    fn test_speed_is_capped() {
        let field = ScalarField::new(500.0, 500.0);
        let tuning = Tuning::default();
        let mut rng = SimRng::seeded(1);
        let mut p = Particle::new(1, Vec2::new(250.0, 250.0), 0.0, 10_000.0, 1.0, 30.0);
        p.update(0.001, &field, &tuning, &mut rng);
        assert!(p.speed <= tuning.max_particle_speed);
    }

    #[test]
    fn test_bounce_reflects_heading() {
        let mut rng = SimRng::from_rng(Fixed(0)); // always bounce
        let mut p = Particle::new(1, Vec2::new(-5.0, 50.0), std::f32::consts::PI, 10.0, 1.0, 10.0);
        p.resolve_bounds(100.0, 100.0, 0.5, &mut rng);
        assert_eq!(p.pos.x, 0.0);
        assert!(p.direction.abs() < 1e-5);
    }

    #[test]
    fn test_wrap_moves_to_opposite_edge() {
        let mut rng = SimRng::from_rng(Fixed(u32::MAX)); // always wrap
        let mut p = Particle::new(1, Vec2::new(50.0, 105.0), 1.0, 10.0, 1.0, 10.0);
        p.resolve_bounds(100.0, 100.0, 0.5, &mut rng);
        assert!((p.pos.y - 5.0).abs() < 1e-4);
        assert_eq!(p.direction, 1.0);
    }

    #[test]
    fn test_particle_dies_at_lifespan() {
        let field = ScalarField::new(100.0, 100.0);
        let tuning = Tuning::default();
        let mut rng = SimRng::seeded(3);
        let mut p = Particle::new(1, Vec2::new(50.0, 50.0), 0.0, 0.0, 1.0, 0.5);
        p.update(0.25, &field, &tuning, &mut rng);
        assert!(p.is_alive());
        p.update(0.25, &field, &tuning, &mut rng);
        assert!(!p.is_alive());
    }

    #[test]
    fn test_body_feeds_field() {
        let mut field = ScalarField::new(200.0, 200.0);
        let mut star = Body::new(1, Vec2::new(100.0, 100.0), 100.0, BodyKind::Star, 4);
        star.update(0.5, &mut field);
        assert!(field.sample(100.0, 100.0) > 0.0);

        let mut hole = Body::new(2, Vec2::new(100.0, 100.0), 100.0, BodyKind::BlackHole, 5);
        for _ in 0..200 {
            hole.update(0.5, &mut field);
        }
        assert_eq!(field.sample(100.0, 100.0), 0.0);
    }

    #[test]
    fn test_entanglement_is_symmetric_and_cleaned() {
        let mut table = Entanglements::new();
        assert!(table.entangle(1, 2));
        assert!(!table.entangle(2, 3));
        assert!(!table.entangle(4, 4));
        assert_eq!(table.partner(1), Some(2));
        assert_eq!(table.partner(2), Some(1));

        table.retain_alive(|id| id != 2);
        assert_eq!(table.partner(1), None);
        assert_eq!(table.pair_count(), 0);
    }

    #[test]
    fn test_early_phases_grow_nebulae() {
        let mut rng = SimRng::seeded(11);
        for _ in 0..20 {
            assert_eq!(BodyKind::for_phase(1, 500.0, &mut rng), BodyKind::Nebula);
        }
    }
}
