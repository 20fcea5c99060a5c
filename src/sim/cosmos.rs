//! Cosmic progression state
//!
//! Score, energy, combo and level bookkeeping plus the phase state machine.
//! Phases only ever move forward one step at a time; `unlocked` flags and
//! discoveries never revert until `reset()`.

use std::collections::HashMap;

use serde::Serialize;

use super::catalog::{self, Achievement, Challenge, CosmicElement, Stat, UniversePhase};
use super::entity::{BodyKind, EntityId};
use crate::tuning::Tuning;

/// Notifications raised by the simulation, drained once per tick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CosmosEvent {
    PhaseChanged { from: usize, to: usize, name: &'static str },
    BigBang,
    ElementDiscovered { id: &'static str },
    AchievementUnlocked { id: &'static str, reward: u64 },
    ChallengeOffered { id: &'static str },
    ChallengeCompleted { id: &'static str, reward: u64 },
    ChallengeExpired { id: &'static str },
    BodyFormed { id: EntityId, kind: BodyKind },
    FusionStarted { id: EntityId, participants: usize },
    FusionCompleted { participants: usize, emitted: usize, body: Option<EntityId> },
    FusionFailed { consumed: usize },
    BodyEntered { id: EntityId },
    BodyExited { id: EntityId },
}

/// Score/energy/phase bookkeeping
#[derive(Debug, Clone)]
pub struct CosmosState {
    tuning: Tuning,
    score: u64,
    energy: f32,
    combo: u32,
    /// Seconds since the last growth event while a combo is live
    since_growth: Option<f32>,
    current_phase: usize,
    phases: Vec<UniversePhase>,
    elements: Vec<CosmicElement>,
    achievements: Vec<Achievement>,
    active_challenges: Vec<Challenge>,
    completed_challenges: Vec<&'static str>,
    stats: HashMap<Stat, u64>,
    /// Cumulative simulated seconds
    elapsed: f32,
    /// Scheduled advance: target phase and seconds left
    pending_advance: Option<(usize, f32)>,
    events: Vec<CosmosEvent>,
}

impl CosmosState {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            score: 0,
            energy: tuning.max_energy,
            combo: 1,
            since_growth: None,
            current_phase: 0,
            phases: catalog::phases(),
            elements: catalog::elements(),
            achievements: catalog::achievements(),
            active_challenges: Vec::new(),
            completed_challenges: Vec::new(),
            stats: HashMap::new(),
            elapsed: 0.0,
            pending_advance: None,
            events: Vec::new(),
            tuning,
        }
    }

    /// Back to a fresh universe (tuning is kept)
    pub fn reset(&mut self) {
        *self = Self::new(self.tuning.clone());
    }

    // === Accessors ===

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn max_energy(&self) -> f32 {
        self.tuning.max_energy
    }

    pub fn level(&self) -> u32 {
        let level = self.score.checked_div(self.tuning.level_threshold).unwrap_or(0);
        u32::try_from(level).unwrap_or(u32::MAX).saturating_add(1)
    }

    pub fn combo_multiplier(&self) -> u32 {
        self.combo
    }

    pub fn current_phase(&self) -> usize {
        self.current_phase
    }

    pub fn phase(&self) -> &UniversePhase {
        &self.phases[self.current_phase]
    }

    pub fn phases(&self) -> &[UniversePhase] {
        &self.phases
    }

    pub fn elements(&self) -> &[CosmicElement] {
        &self.elements
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn active_challenges(&self) -> &[Challenge] {
        &self.active_challenges
    }

    pub fn completed_challenges(&self) -> &[&'static str] {
        &self.completed_challenges
    }

    pub fn stat(&self, stat: Stat) -> u64 {
        self.stats.get(&stat).copied().unwrap_or(0)
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds until the scheduled phase advance, if one is pending
    pub fn pending_advance(&self) -> Option<f32> {
        self.pending_advance.map(|(_, left)| left)
    }

    pub fn discovered_count(&self) -> usize {
        self.elements.iter().filter(|e| e.discovered).count()
    }

    pub fn is_discovered(&self, id: &str) -> bool {
        self.elements.iter().any(|e| e.id == id && e.discovered)
    }

    /// Undiscovered elements a bonus roll may reveal: anything gated up to
    /// the next phase (the current phase's own elements arrive on entry)
    pub fn discoverable(&self) -> Vec<&'static str> {
        self.elements
            .iter()
            .filter(|e| !e.discovered && e.required_phase <= self.current_phase + 1)
            .map(|e| e.id)
            .collect()
    }

    // === Resources ===

    /// Spend energy. Fails without side effects if there is not enough.
    pub fn use_energy(&mut self, amount: f32) -> bool {
        if !(amount >= 0.0) || amount > self.energy {
            return false;
        }
        self.energy -= amount;
        true
    }

    pub fn add_energy(&mut self, amount: f32) {
        self.energy = (self.energy + amount).clamp(0.0, self.tuning.max_energy);
    }

    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    /// Count a growth event toward the combo; returns the multiplier to apply
    pub fn register_growth(&mut self) -> u32 {
        if matches!(self.since_growth, Some(t) if t < self.tuning.combo_timeout) {
            self.combo = (self.combo + 1).min(self.tuning.combo_max);
        }
        self.since_growth = Some(0.0);
        self.combo
    }

    // === Progression ===

    /// Step to the next phase if the score requirement is met
    pub fn advance_phase(&mut self) -> bool {
        let next = self.current_phase + 1;
        let Some(phase) = self.phases.get(next) else {
            return false;
        };
        if self.score < phase.required_energy {
            return false;
        }
        self.enter_phase(next, true);
        true
    }

    /// Ignite the universe. Only valid in the first two phases.
    ///
    /// From the void this jumps to phase 1 at once and schedules the
    /// follow-up advance; from phase 1 it advances directly.
    pub fn attempt_big_bang(&mut self) -> bool {
        if self.current_phase > 1 {
            return false;
        }
        if !self.use_energy(self.tuning.big_bang_cost) {
            return false;
        }
        self.add_score(self.tuning.big_bang_score);
        self.events.push(CosmosEvent::BigBang);
        log::info!("Big Bang at t={:.1}s", self.elapsed);

        if self.current_phase == 1 {
            self.advance_phase();
        } else {
            self.enter_phase(1, false);
            self.pending_advance = Some((2, self.tuning.big_bang_followup));
        }
        true
    }

    fn enter_phase(&mut self, to: usize, refill: bool) {
        let from = self.current_phase;
        self.current_phase = to;
        self.phases[to].unlocked = true;
        if matches!(self.pending_advance, Some((target, _)) if to >= target) {
            self.pending_advance = None;
        }
        if refill {
            self.energy = self.tuning.max_energy;
        }
        let name = self.phases[to].name;
        log::info!("Phase {} -> {} ({})", from, to, name);
        self.events.push(CosmosEvent::PhaseChanged { from, to, name });

        let unlocked: Vec<&'static str> = self
            .elements
            .iter()
            .filter(|e| e.required_phase == to)
            .map(|e| e.id)
            .collect();
        for id in unlocked {
            self.discover_element(id);
        }

        self.record(Stat::PhasesReached, 1);

        if let Some(challenge) = catalog::challenge_for_phase(to) {
            self.events.push(CosmosEvent::ChallengeOffered { id: challenge.id });
            self.active_challenges.push(challenge);
        }
    }

    /// Mark an element discovered. Repeat discoveries are no-ops.
    pub fn discover_element(&mut self, id: &str) -> bool {
        let Some(element) = self.elements.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        if element.discovered {
            return false;
        }
        element.discovered = true;
        let id = element.id;
        log::debug!("Discovered {}", id);
        self.events.push(CosmosEvent::ElementDiscovered { id });
        self.add_score(self.tuning.discovery_score);
        self.record(Stat::ElementsDiscovered, 1);
        true
    }

    /// Bump a counter and settle achievements/challenges that track it
    pub fn record(&mut self, stat: Stat, amount: u64) {
        if amount == 0 {
            return;
        }
        let total = {
            let entry = self.stats.entry(stat).or_insert(0);
            *entry += amount;
            *entry
        };

        let mut reward = 0;
        for achievement in self.achievements.iter_mut().filter(|a| a.stat == stat) {
            achievement.progress = achievement.progress.max(total.min(achievement.target));
            if !achievement.unlocked && achievement.progress >= achievement.target {
                achievement.unlocked = true;
                reward += achievement.reward;
                log::info!("Achievement unlocked: {}", achievement.name);
                self.events.push(CosmosEvent::AchievementUnlocked {
                    id: achievement.id,
                    reward: achievement.reward,
                });
            }
        }

        for challenge in self.active_challenges.iter_mut().filter(|c| c.stat == stat) {
            challenge.progress = (challenge.progress + amount).min(challenge.target);
            if !challenge.completed && challenge.progress >= challenge.target {
                challenge.completed = true;
                reward += challenge.reward;
                self.completed_challenges.push(challenge.id);
                self.events.push(CosmosEvent::ChallengeCompleted {
                    id: challenge.id,
                    reward: challenge.reward,
                });
            }
        }
        self.active_challenges.retain(|c| !c.completed);

        self.add_score(reward);
    }

    /// Per-tick bookkeeping: regen, combo decay, timers, auto-advance
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.elapsed += dt;
        self.add_energy(self.tuning.energy_regen * dt);

        if let Some(t) = self.since_growth.as_mut() {
            *t += dt;
            if *t >= self.tuning.combo_timeout {
                self.combo = 1;
                self.since_growth = None;
            }
        }

        let mut expired = Vec::new();
        for challenge in &mut self.active_challenges {
            if let Some(left) = challenge.time_left.as_mut() {
                *left -= dt;
                if *left <= 0.0 {
                    expired.push(challenge.id);
                }
            }
        }
        if !expired.is_empty() {
            self.active_challenges.retain(|c| !expired.contains(&c.id));
            self.events
                .extend(expired.into_iter().map(|id| CosmosEvent::ChallengeExpired { id }));
        }

        if let Some((target, left)) = self.pending_advance {
            let left = left - dt;
            if left > 0.0 {
                self.pending_advance = Some((target, left));
                return;
            }
            self.pending_advance = None;
            if self.current_phase + 1 == target {
                self.advance_phase();
                return;
            }
        }

        // Time never bypasses the score gate; the void is left only by a Big Bang
        if self.current_phase >= 1 {
            if let Some(next) = self.phases.get(self.current_phase + 1) {
                let time_ok = next.time_threshold.is_some_and(|t| self.elapsed >= t);
                if time_ok && self.score >= next.required_energy {
                    self.advance_phase();
                }
            }
        }
    }

    pub(crate) fn push_event(&mut self, event: CosmosEvent) {
        self.events.push(event);
    }

    /// Take every event raised since the last drain
    pub fn drain_events(&mut self) -> Vec<CosmosEvent> {
        std::mem::take(&mut self.events)
    }
}
