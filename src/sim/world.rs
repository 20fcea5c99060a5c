//! Simulation world
//!
//! Owns the field, every entity and effect, the cosmos bookkeeping and the
//! random source. All paid actions go through `CosmosState::use_energy`.

use glam::Vec2;
use serde::Serialize;

use super::catalog::Stat;
use super::cosmos::{CosmosEvent, CosmosState};
use super::effects::{FusionEvent, GravityWell, ParticleStream, StreamTier, WellTier};
use super::entity::{Body, BodyKind, Entanglements, EntityId, IdAllocator, Particle};
use super::explore::Explorer;
use super::field::ScalarField;
use super::rng::SimRng;
use crate::consts::*;
use crate::tuning::Tuning;

/// Result of a fusion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FusionOutcome {
    /// Fewer than two live particles selected
    TooFew,
    /// Not enough energy to pay for the fusion
    InsufficientEnergy,
    /// Large fusion collapsed; `consumed` particles were lost
    Unstable { consumed: usize },
    /// Fusion event started
    Started { id: EntityId },
}

/// Complete simulation state
#[derive(Debug)]
pub struct World {
    pub tuning: Tuning,
    pub field: ScalarField,
    /// Live particles (insertion order = id order)
    pub particles: Vec<Particle>,
    /// Top-level bodies
    pub bodies: Vec<Body>,
    pub wells: Vec<GravityWell>,
    pub streams: Vec<ParticleStream>,
    pub fusions: Vec<FusionEvent>,
    pub cosmos: CosmosState,
    pub entanglements: Entanglements,
    pub explorer: Explorer,
    pub rng: SimRng,
    ids: IdAllocator,
}

impl World {
    pub fn new(tuning: Tuning, width: f32, height: f32, rng: SimRng) -> Self {
        Self {
            field: ScalarField::new(width, height),
            particles: Vec::new(),
            bodies: Vec::new(),
            wells: Vec::new(),
            streams: Vec::new(),
            fusions: Vec::new(),
            cosmos: CosmosState::new(tuning.clone()),
            entanglements: Entanglements::new(),
            explorer: Explorer::new(),
            rng,
            ids: IdAllocator::default(),
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        self.ids.next_id()
    }

    pub fn width(&self) -> f32 {
        self.field.width()
    }

    pub fn height(&self) -> f32 {
        self.field.height()
    }

    /// Rebuild the field for a new viewport and pull entities inside it
    pub fn resize(&mut self, width: f32, height: f32) {
        self.field = ScalarField::new(width, height);
        let (w, h) = (self.field.width(), self.field.height());
        for p in &mut self.particles {
            p.pos = p.pos.clamp(Vec2::ZERO, Vec2::new(w, h));
        }
        for b in &mut self.bodies {
            b.pos = b.pos.clamp(Vec2::ZERO, Vec2::new(w, h));
        }
    }

    /// Clear every entity and effect and restart progression
    pub fn reset(&mut self) {
        self.field = ScalarField::new(self.field.width(), self.field.height());
        self.particles.clear();
        self.bodies.clear();
        self.wells.clear();
        self.streams.clear();
        self.fusions.clear();
        self.entanglements.clear();
        self.explorer.clear();
        self.cosmos.reset();
    }

    pub fn particle(&self, id: EntityId) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id == id)
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Nearest particle within `radius` of `pos`
    pub fn particle_at(&self, pos: Vec2, radius: f32) -> Option<EntityId> {
        self.particles
            .iter()
            .map(|p| (p.id, p.pos.distance(pos)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id)
    }

    /// Every particle within `radius` of `pos`
    pub fn particles_within(&self, pos: Vec2, radius: f32) -> Vec<EntityId> {
        self.particles
            .iter()
            .filter(|p| p.pos.distance(pos) <= radius)
            .map(|p| p.id)
            .collect()
    }

    /// Add a particle (free of charge). Returns None at the population cap.
    pub fn spawn_particle(&mut self, pos: Vec2, direction: f32, speed: f32, energy: f32) -> Option<EntityId> {
        if self.particles.len() >= self.tuning.max_particles {
            return None;
        }
        Some(self.push_particle(pos, direction, speed, energy))
    }

    /// Add a particle ignoring the population cap
    fn push_particle(&mut self, pos: Vec2, direction: f32, speed: f32, energy: f32) -> EntityId {
        let id = self.next_entity_id();
        let particle = Particle::spawn(id, pos, direction, speed, energy, &self.tuning, &mut self.rng);
        self.particles.push(particle);
        self.cosmos.record(Stat::ParticlesCreated, 1);
        id
    }

    /// Paid burst of particles around `pos`; may entangle the first pair
    pub fn create_burst(&mut self, pos: Vec2) -> Vec<EntityId> {
        if !self.cosmos.use_energy(self.tuning.create_burst_cost) {
            return Vec::new();
        }
        self.field.disturb(pos.x, pos.y, 40.0, 0.3);

        let mut spawned = Vec::with_capacity(self.tuning.create_burst_size);
        for _ in 0..self.tuning.create_burst_size {
            let direction = self.rng.angle();
            let speed = self.rng.range(30.0, 80.0);
            let energy = self.rng.range(5.0, 15.0);
            let offset = crate::heading_vector(direction) * self.rng.range(0.0, 6.0);
            match self.spawn_particle(pos + offset, direction, speed, energy) {
                Some(id) => spawned.push(id),
                None => break,
            }
        }

        if spawned.len() >= 2
            && self.rng.chance(self.tuning.entangle_chance)
            && self.entanglements.entangle(spawned[0], spawned[1])
        {
            self.cosmos.record(Stat::EntanglementsFormed, 1);
        }
        spawned
    }

    /// Paid single particle (create-mode drag trail)
    pub fn create_trail_particle(&mut self, pos: Vec2) -> Option<EntityId> {
        if self.particles.len() >= self.tuning.max_particles {
            return None;
        }
        if !self.cosmos.use_energy(self.tuning.create_trail_cost) {
            return None;
        }
        let direction = self.rng.angle();
        let speed = self.rng.range(20.0, 50.0);
        let energy = self.rng.range(5.0, 10.0);
        self.spawn_particle(pos, direction, speed, energy)
    }

    /// Paid gravity well; tier (cost, strength, lifetime) follows the radius
    pub fn create_gravity_well(&mut self, pos: Vec2, radius: f32) -> Option<EntityId> {
        let tier = WellTier::for_radius(radius.clamp(WELL_MIN_RADIUS, WELL_MAX_RADIUS));
        let cost = tier.cost(self.tuning.gravity_base_cost);
        if !self.cosmos.use_energy(cost) {
            return None;
        }
        let id = self.next_entity_id();
        let well = GravityWell::new(id, pos, radius);
        log::debug!(
            "Gravity well {} ({}) r={:.0} cost={}",
            id,
            well.tier.as_str(),
            well.radius,
            cost
        );
        let bonus = well.tier.bonus_discovery_chance();
        self.wells.push(well);
        self.cosmos.record(Stat::WellsCreated, 1);
        if bonus > 0.0 && self.rng.chance(bonus) {
            self.discover_random_element();
        }
        Some(id)
    }

    /// Paid stream from `start` toward `end`; too-short drags are ignored
    pub fn create_stream(&mut self, start: Vec2, end: Vec2) -> Option<EntityId> {
        let length = start.distance(end);
        if length < STREAM_MIN_LENGTH {
            return None;
        }
        let cost = StreamTier::for_length(length).cost(self.tuning.stream_base_cost);
        if !self.cosmos.use_energy(cost) {
            return None;
        }
        let id = self.next_entity_id();
        let stream = ParticleStream::new(id, start, end);
        log::debug!("Stream {} ({}) len={:.0} cost={}", id, stream.tier.as_str(), stream.length(), cost);
        self.streams.push(stream);
        self.cosmos.record(Stat::StreamsCreated, 1);
        Some(id)
    }

    /// Try to fuse the given particles
    pub fn attempt_fusion(&mut self, selected: &[EntityId]) -> FusionOutcome {
        let mut live: Vec<EntityId> = Vec::with_capacity(selected.len());
        for &id in selected {
            if !live.contains(&id) && self.particle(id).is_some() {
                live.push(id);
            }
        }
        if live.len() < 2 {
            return FusionOutcome::TooFew;
        }
        if !self.cosmos.use_energy(self.tuning.fusion_cost) {
            return FusionOutcome::InsufficientEnergy;
        }

        let n = live.len();
        if n > FUSION_STABLE_LIMIT && self.rng.chance(self.tuning.fusion_failure_chance) {
            let consumed = unstable_consumption(n, self.tuning.fusion_failure_fraction);
            self.take_particles(&live[..consumed]);
            log::debug!("Fusion of {} went unstable, lost {}", n, consumed);
            self.cosmos.push_event(CosmosEvent::FusionFailed { consumed });
            return FusionOutcome::Unstable { consumed };
        }

        let participants = self.take_particles(&live);
        let id = self.next_entity_id();
        let fusion = FusionEvent::from_participants(id, &participants);
        log::debug!(
            "Fusion {} started with {} particles (energy {:.1})",
            id,
            n,
            fusion.participant_energy
        );
        self.fusions.push(fusion);
        self.cosmos.push_event(CosmosEvent::FusionStarted { id, participants: n });
        FusionOutcome::Started { id }
    }

    /// Terminal action of a finished fusion
    pub(crate) fn complete_fusion(&mut self, fusion: FusionEvent) {
        // The ring always emits in full, even at the population cap
        let ring = fusion.emissions();
        let emitted = ring.len();
        for e in ring {
            self.push_particle(e.pos, e.direction, e.speed, e.energy);
        }
        let combo = self.cosmos.combo_multiplier() as u64;
        self.cosmos
            .add_score(FUSION_SCORE_PER_PARTICIPANT * fusion.participant_count as u64 * combo);

        let body = if self.rng.chance(self.tuning.fusion_body_chance) {
            self.form_body(fusion.center, fusion.participant_energy)
        } else {
            None
        };

        self.cosmos.record(Stat::FusionsCompleted, 1);
        self.cosmos.push_event(CosmosEvent::FusionCompleted {
            participants: fusion.participant_count,
            emitted,
            body,
        });
    }

    /// Create a phase-appropriate body (respects the body cap)
    pub fn form_body(&mut self, pos: Vec2, energy: f32) -> Option<EntityId> {
        if self.bodies.len() >= self.tuning.max_bodies {
            return None;
        }
        let phase = self.cosmos.current_phase();
        let kind = BodyKind::for_phase(phase, energy, &mut self.rng);
        let id = self.next_entity_id();
        self.bodies.push(Body::new(id, pos, energy, kind, phase));
        self.cosmos.record(Stat::BodiesFormed, 1);
        self.cosmos.push_event(CosmosEvent::BodyFormed { id, kind });
        Some(id)
    }

    /// Idle particles far from any body may condense into new bodies
    pub(crate) fn grow_idle_particles(&mut self) {
        let clearance = self.tuning.growth_clearance;
        let room = self.tuning.max_bodies.saturating_sub(self.bodies.len());
        let mut grown: Vec<(EntityId, Vec2, f32)> = Vec::new();

        for p in &self.particles {
            if grown.len() >= room {
                break;
            }
            if !p.is_idle(&self.tuning) {
                continue;
            }
            let isolated = self.bodies.iter().all(|b| b.pos.distance(p.pos) > clearance)
                && grown.iter().all(|(_, pos, _)| pos.distance(p.pos) > clearance);
            if isolated && self.rng.chance(self.tuning.growth_chance) {
                grown.push((p.id, p.pos, p.energy));
            }
        }

        for (id, pos, energy) in grown {
            self.take_particles(&[id]);
            if self.form_body(pos, energy).is_some() {
                let combo = self.cosmos.register_growth();
                self.cosmos.add_score(10 * combo as u64);
            }
        }
    }

    /// Slow particles touching a body are absorbed into it
    pub(crate) fn absorb_into_bodies(&mut self) {
        let idle_speed = self.tuning.idle_speed;
        let mut absorbed: Vec<EntityId> = Vec::new();
        for body in &mut self.bodies {
            for p in &self.particles {
                if p.speed < idle_speed
                    && !absorbed.contains(&p.id)
                    && body.contains_point(p.pos, 0.0)
                {
                    body.absorb(p.energy);
                    absorbed.push(p.id);
                }
            }
        }
        if !absorbed.is_empty() {
            self.take_particles(&absorbed);
        }
    }

    /// Remove particles by id (entanglement released), returning them
    pub fn take_particles(&mut self, ids: &[EntityId]) -> Vec<Particle> {
        let mut taken = Vec::with_capacity(ids.len());
        let mut kept = Vec::with_capacity(self.particles.len());
        for p in self.particles.drain(..) {
            if ids.contains(&p.id) {
                taken.push(p);
            } else {
                kept.push(p);
            }
        }
        self.particles = kept;
        for id in ids {
            self.entanglements.release(*id);
        }
        taken
    }

    /// Entangled partners share their quantum phase; dead pairs are dropped
    pub(crate) fn sync_entanglements(&mut self) {
        for (a, b) in self.entanglements.pairs() {
            let phase = self.particle(a).map(|p| p.phase);
            if let (Some(phase), Some(pb)) = (phase, self.particles.iter_mut().find(|p| p.id == b)) {
                pb.phase = phase;
            }
        }
    }

    /// Drop dead particles and any entanglement they held
    pub(crate) fn cull_dead_particles(&mut self) {
        self.particles.retain(|p| p.is_alive());
        let particles = &self.particles;
        self.entanglements
            .retain_alive(|id| particles.iter().any(|p| p.id == id));
    }

    /// Pay for and enter the body under `pos` at the current exploration level
    pub fn try_explore(&mut self, pos: Vec2) -> Option<EntityId> {
        let candidates: &[Body] = match self.explorer.focused(&self.bodies) {
            Some(focus) => focus.interior.as_deref().unwrap_or(&[]),
            None => &self.bodies,
        };
        let phase = self.cosmos.current_phase();
        let target = candidates
            .iter()
            .find(|b| b.contains_point(pos, EXPLORE_PICK_MARGIN))
            .filter(|b| b.kind.explorable_from_phase().is_some_and(|p| phase >= p))
            .map(|b| b.id)?;

        if !self.cosmos.use_energy(self.tuning.explore_cost) {
            return None;
        }
        self.enter_body(target).then_some(target)
    }

    /// Focus a body (interior generated on first entry)
    pub fn enter_body(&mut self, id: EntityId) -> bool {
        let entered = self
            .explorer
            .enter_body(&mut self.bodies, id, &mut self.ids, &mut self.rng);
        if entered {
            self.cosmos.record(Stat::BodiesExplored, 1);
            self.cosmos.push_event(CosmosEvent::BodyEntered { id });
        }
        entered
    }

    /// Leave the focused body
    pub fn exit_current_body(&mut self) -> Option<EntityId> {
        let exited = self.explorer.exit_current_body();
        if let Some(id) = exited {
            self.cosmos.push_event(CosmosEvent::BodyExited { id });
        }
        exited
    }

    pub fn focused_body(&self) -> Option<&Body> {
        self.explorer.focused(&self.bodies)
    }

    /// Discover a random element already reachable in this phase
    pub fn discover_random_element(&mut self) -> Option<&'static str> {
        let candidates = self.cosmos.discoverable();
        if candidates.is_empty() {
            return None;
        }
        let id = candidates[self.rng.index(candidates.len())];
        self.cosmos.discover_element(id).then_some(id)
    }
}

/// Particles lost to an unstable fusion: most, never all
pub fn unstable_consumption(n: usize, fraction: f32) -> usize {
    if n < 2 {
        return n;
    }
    let lost = (n as f32 * fraction).floor() as usize;
    lost.clamp(n / 2 + 1, n - 1)
}
