//! Engine facade
//!
//! `CosmosEngine` owns the world and the mode controller, turns frame
//! timestamps into clamped deltas, routes input and publishes a snapshot
//! plus any raised events to observers after every update.

use glam::Vec2;
use serde::Serialize;

use crate::consts::MAX_FRAME_DT;
use crate::sim::{
    Achievement, Body, Challenge, CosmosEvent, EntityId, FusionOutcome, InteractionMode,
    ModeController, SimRng, World, tick,
};
use crate::tuning::Tuning;

/// Read-only view of the engine published after every update
#[derive(Debug, Clone, Serialize)]
pub struct CosmosSnapshot {
    pub score: u64,
    pub energy: f32,
    pub max_energy: f32,
    pub level: u32,
    pub combo_multiplier: u32,
    pub phase: usize,
    pub phase_name: &'static str,
    pub elapsed: f32,
    pub particle_count: usize,
    pub body_count: usize,
    pub well_count: usize,
    pub stream_count: usize,
    pub fusion_count: usize,
    pub entangled_pairs: usize,
    pub field_average: f32,
    pub discovered_elements: Vec<&'static str>,
    pub achievements: Vec<Achievement>,
    pub active_challenges: Vec<Challenge>,
    pub mode: InteractionMode,
    pub selection: Vec<EntityId>,
    pub focused_body: Option<EntityId>,
    pub paused: bool,
}

/// Receives engine output. Observers never mutate the simulation.
pub trait Observer {
    fn on_tick(&mut self, snapshot: &CosmosSnapshot);

    fn on_event(&mut self, _event: &CosmosEvent) {}
}

impl<F> Observer for F
where
    F: FnMut(&CosmosSnapshot),
{
    fn on_tick(&mut self, snapshot: &CosmosSnapshot) {
        self(snapshot)
    }
}

/// Top-level engine
pub struct CosmosEngine {
    world: World,
    controller: ModeController,
    observers: Vec<Box<dyn Observer>>,
    initialized: bool,
    running: bool,
    /// Timestamp (ms) of the previous frame; None right after start/resume
    last_timestamp: Option<f64>,
    frames: u64,
}

impl CosmosEngine {
    /// Engine with a seeded generator
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self::with_rng(tuning, SimRng::seeded(seed))
    }

    /// Engine with an injected random source
    pub fn with_rng(tuning: Tuning, rng: SimRng) -> Self {
        Self {
            world: World::new(tuning, 0.0, 0.0, rng),
            controller: ModeController::new(),
            observers: Vec::new(),
            initialized: false,
            running: false,
            last_timestamp: None,
            frames: 0,
        }
    }

    // === Lifecycle ===

    pub fn initialize(&mut self, width: f32, height: f32) {
        self.world.resize(width, height);
        self.initialized = true;
        self.running = true;
        self.last_timestamp = None;
        log::info!(
            "Cosmos initialized at {}x{} (seed {:?})",
            width,
            height,
            self.world.rng.seed()
        );
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.world.resize(width, height);
        log::info!("Resized to {}x{}", width, height);
    }

    pub fn pause(&mut self) {
        if self.running {
            self.running = false;
            log::info!("Paused");
        }
    }

    pub fn resume(&mut self) {
        if !self.running && self.initialized {
            self.running = true;
            self.last_timestamp = None;
            log::info!("Resumed");
        }
    }

    pub fn reset(&mut self) {
        self.world.reset();
        self.controller = ModeController::new();
        self.last_timestamp = None;
        log::info!("Universe reset");
        self.publish();
    }

    /// Stop for good: observers are dropped and input is ignored
    pub fn destroy(&mut self) {
        self.observers.clear();
        self.world.reset();
        self.initialized = false;
        self.running = false;
        self.last_timestamp = None;
        log::info!("Engine destroyed after {} frames", self.frames);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_paused(&self) -> bool {
        !self.running
    }

    // === Frame loop ===

    /// Drive one animation frame; returns the delta that was simulated
    pub fn frame(&mut self, timestamp_ms: f64) -> f32 {
        if !self.initialized || !self.running {
            return 0.0;
        }
        let dt = match self.last_timestamp {
            Some(last) => ((timestamp_ms - last) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);
        let dt = dt.min(MAX_FRAME_DT);
        self.frames += 1;
        self.step(dt);
        dt
    }

    /// Advance by an explicit delta (clamped) and publish
    pub fn step(&mut self, dt: f32) {
        if !self.initialized || !self.running {
            return;
        }
        tick(&mut self.world, dt.clamp(0.0, MAX_FRAME_DT));
        self.controller.prune_selection(&self.world);
        self.publish();
    }

    fn publish(&mut self) {
        let events = self.world.cosmos.drain_events();
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            for event in &events {
                observer.on_event(event);
            }
            observer.on_tick(&snapshot);
        }
    }

    // === Input ===

    pub fn handle_pointer_down(&mut self, x: f32, y: f32) {
        if self.initialized {
            self.controller.pointer_down(&mut self.world, Vec2::new(x, y));
        }
    }

    pub fn handle_pointer_move(&mut self, x: f32, y: f32) {
        if self.initialized {
            self.controller.pointer_move(&mut self.world, Vec2::new(x, y));
        }
    }

    pub fn handle_pointer_up(&mut self, x: f32, y: f32) {
        if self.initialized {
            self.controller.pointer_up(&mut self.world, Vec2::new(x, y));
        }
    }

    /// Keyboard shortcut by `KeyboardEvent.code`; returns false if unbound
    pub fn handle_key(&mut self, code: &str) -> bool {
        if !self.initialized {
            return false;
        }
        if let Some(mode) = InteractionMode::from_key(code) {
            self.set_interaction_mode(mode);
            return true;
        }
        match code {
            "Space" => {
                if self.running {
                    self.pause();
                } else {
                    self.resume();
                }
            }
            "KeyB" => {
                self.attempt_big_bang();
            }
            "KeyF" => {
                self.fuse_selection();
            }
            "Escape" => {
                if self.world.explorer.focused_body().is_some() {
                    self.exit_current_body();
                } else {
                    self.controller.clear_selection();
                }
            }
            "KeyR" => self.reset(),
            _ => return false,
        }
        true
    }

    pub fn set_interaction_mode(&mut self, mode: InteractionMode) {
        self.controller.set_mode(mode);
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.controller.mode()
    }

    pub fn attempt_big_bang(&mut self) -> bool {
        self.world.cosmos.attempt_big_bang()
    }

    pub fn fuse_selection(&mut self) -> FusionOutcome {
        self.controller.fuse_selection(&mut self.world)
    }

    // === Exploration ===

    pub fn enter_body(&mut self, id: EntityId) -> bool {
        self.world.enter_body(id)
    }

    pub fn exit_current_body(&mut self) -> Option<EntityId> {
        self.world.exit_current_body()
    }

    pub fn focused_body(&self) -> Option<&Body> {
        self.world.focused_body()
    }

    // === Observation ===

    pub fn add_observer(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn selection(&self) -> &[EntityId] {
        self.controller.selection()
    }

    pub fn drag_span(&self) -> Option<(Vec2, Vec2)> {
        self.controller.drag_span()
    }

    pub fn snapshot(&self) -> CosmosSnapshot {
        let cosmos = &self.world.cosmos;
        CosmosSnapshot {
            score: cosmos.score(),
            energy: cosmos.energy(),
            max_energy: cosmos.max_energy(),
            level: cosmos.level(),
            combo_multiplier: cosmos.combo_multiplier(),
            phase: cosmos.current_phase(),
            phase_name: cosmos.phase().name,
            elapsed: cosmos.elapsed(),
            particle_count: self.world.particles.len(),
            body_count: self.world.bodies.len(),
            well_count: self.world.wells.len(),
            stream_count: self.world.streams.len(),
            fusion_count: self.world.fusions.len(),
            entangled_pairs: self.world.entanglements.pair_count(),
            field_average: self.world.field.average(),
            discovered_elements: cosmos
                .elements()
                .iter()
                .filter(|e| e.discovered)
                .map(|e| e.id)
                .collect(),
            achievements: cosmos.achievements().to_vec(),
            active_challenges: cosmos.active_challenges().to_vec(),
            mode: self.controller.mode(),
            selection: self.controller.selection().to_vec(),
            focused_body: self.world.explorer.focused_body(),
            paused: !self.running,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::BodyKind;

    fn engine() -> CosmosEngine {
        let mut engine = CosmosEngine::new(Tuning::default(), 12345);
        engine.initialize(800.0, 600.0);
        engine
    }

    #[derive(Default)]
    struct Recorder {
        ticks: usize,
        last_score: u64,
        events: Vec<CosmosEvent>,
    }

    struct SharedRecorder(Rc<RefCell<Recorder>>);

    impl Observer for SharedRecorder {
        fn on_tick(&mut self, snapshot: &CosmosSnapshot) {
            let mut r = self.0.borrow_mut();
            r.ticks += 1;
            r.last_score = snapshot.score;
        }

        fn on_event(&mut self, event: &CosmosEvent) {
            self.0.borrow_mut().events.push(event.clone());
        }
    }

    #[test]
    fn test_frame_clamps_delta() {
        let mut e = engine();
        assert_eq!(e.frame(1000.0), 0.0);
        let dt = e.frame(1016.0);
        assert!((dt - 0.016).abs() < 1e-4);
        // Long stall
        assert_eq!(e.frame(6000.0), MAX_FRAME_DT);
        // Clock going backwards
        assert_eq!(e.frame(5000.0), 0.0);
    }

    #[test]
    fn test_pause_and_resume_reset_anchor() {
        let mut e = engine();
        e.frame(0.0);
        e.frame(16.0);
        e.pause();
        assert!(e.is_paused());
        assert_eq!(e.frame(32.0), 0.0);
        let elapsed = e.world().cosmos.elapsed();
        e.step(0.05);
        assert_eq!(e.world().cosmos.elapsed(), elapsed);

        e.resume();
        // First frame after resume has no delta even after a long gap
        assert_eq!(e.frame(10_000.0), 0.0);
        assert!(e.frame(10_016.0) > 0.0);
    }

    #[test]
    fn test_uninitialized_engine_ignores_input() {
        let mut e = CosmosEngine::new(Tuning::default(), 1);
        e.handle_pointer_down(10.0, 10.0);
        assert!(!e.handle_key("KeyB"));
        assert_eq!(e.frame(100.0), 0.0);
        assert_eq!(e.world().particles.len(), 0);
    }

    #[test]
    fn test_big_bang_via_key() {
        let mut e = engine();
        assert!(e.handle_key("KeyB"));
        let s = e.snapshot();
        assert_eq!(s.phase, 1);
        assert_eq!(s.score, 300);
        assert_eq!(s.energy, 50.0);

        for _ in 0..40 {
            e.step(0.1);
        }
        let s = e.snapshot();
        assert_eq!(s.phase, 2);
        assert_eq!(s.phase_name, "Particle Era");
        assert!(e.world().cosmos.phases()[1].unlocked);
        assert!(e.world().cosmos.phases()[2].unlocked);
    }

    #[test]
    fn test_mode_keys_and_escape() {
        let mut e = engine();
        assert!(e.handle_key("Digit2"));
        assert_eq!(e.interaction_mode(), InteractionMode::Gravity);
        assert!(e.handle_key("Digit4"));
        assert_eq!(e.interaction_mode(), InteractionMode::Fusion);
        assert!(!e.handle_key("KeyQ"));

        e.world.spawn_particle(Vec2::new(100.0, 100.0), 0.0, 0.0, 5.0);
        e.handle_pointer_down(100.0, 100.0);
        e.handle_pointer_up(100.0, 100.0);
        assert_eq!(e.selection().len(), 1);
        assert!(e.handle_key("Escape"));
        assert!(e.selection().is_empty());
    }

    #[test]
    fn test_space_toggles_pause() {
        let mut e = engine();
        e.handle_key("Space");
        assert!(e.is_paused());
        e.handle_key("Space");
        assert!(!e.is_paused());
    }

    #[test]
    fn test_gravity_scenario() {
        let mut e = engine();
        e.set_interaction_mode(InteractionMode::Gravity);
        e.handle_pointer_down(400.0, 300.0);
        e.handle_pointer_move(500.0, 300.0);
        e.handle_pointer_up(600.0, 300.0);
        let s = e.snapshot();
        assert_eq!(s.well_count, 1);
        assert_eq!(s.energy, 70.0);
        assert_eq!(e.world().wells[0].life, 25.0);
    }

    #[test]
    fn test_fusion_scenario() {
        let mut e = engine();
        e.set_interaction_mode(InteractionMode::Fusion);
        let points = [(200.0, 200.0), (215.0, 200.0), (230.0, 200.0)];
        for (x, y) in points {
            e.world.spawn_particle(Vec2::new(x, y), 0.0, 0.0, 10.0);
        }
        let score = e.snapshot().score;
        for (x, y) in points {
            e.handle_pointer_down(x, y);
            e.handle_pointer_up(x, y);
        }
        assert_eq!(e.snapshot().fusion_count, 1);
        for _ in 0..30 {
            e.step(0.1);
        }
        let s = e.snapshot();
        assert_eq!(s.fusion_count, 0);
        assert!(s.particle_count >= 8);
        assert!(s.score >= score + 150);
    }

    #[test]
    fn test_observers_receive_ticks_and_events() {
        let mut e = engine();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        e.add_observer(Box::new(SharedRecorder(recorder.clone())));

        e.attempt_big_bang();
        e.step(0.05);
        {
            let r = recorder.borrow();
            assert_eq!(r.ticks, 1);
            assert_eq!(r.last_score, 300);
            assert!(r.events.contains(&CosmosEvent::BigBang));
            assert!(r
                .events
                .iter()
                .any(|ev| matches!(ev, CosmosEvent::PhaseChanged { to: 1, .. })));
        }

        // Events are delivered once
        e.step(0.05);
        assert!(!recorder.borrow().events.is_empty());
        let count = recorder.borrow().events.len();
        e.step(0.05);
        assert_eq!(recorder.borrow().events.len(), count);
    }

    #[test]
    fn test_closure_observer() {
        let mut e = engine();
        let seen = Rc::new(RefCell::new(0usize));
        let counter = seen.clone();
        e.add_observer(Box::new(move |_: &CosmosSnapshot| *counter.borrow_mut() += 1));
        e.step(0.016);
        e.step(0.016);
        assert_eq!(*seen.borrow(), 2);
    }

    #[test]
    fn test_reset_after_play() {
        let mut e = engine();
        e.attempt_big_bang();
        e.handle_pointer_down(300.0, 300.0);
        e.handle_pointer_up(300.0, 300.0);
        for _ in 0..50 {
            e.step(0.1);
        }
        e.handle_key("Digit4");
        e.handle_key("KeyR");

        let s = e.snapshot();
        assert_eq!(s.score, 0);
        assert_eq!(s.energy, s.max_energy);
        assert_eq!(s.level, 1);
        assert_eq!(s.combo_multiplier, 1);
        assert_eq!(s.phase, 0);
        assert_eq!(s.particle_count, 0);
        assert!(s.achievements.iter().all(|a| a.progress == 0 && !a.unlocked));
        assert!(s.active_challenges.is_empty());
        assert_eq!(s.mode, InteractionMode::Create);
    }

    #[test]
    fn test_explore_body() {
        let mut e = engine();
        let id = e.world.next_entity_id();
        e.world
            .bodies
            .push(Body::new(id, Vec2::new(300.0, 300.0), 200.0, BodyKind::Star, 4));
        assert!(e.enter_body(id));
        assert_eq!(e.focused_body().map(|b| b.id), Some(id));
        assert_eq!(e.snapshot().focused_body, Some(id));

        assert!(e.handle_key("Escape"));
        assert!(e.focused_body().is_none());
        assert_eq!(e.exit_current_body(), None);
    }

    #[test]
    fn test_snapshot_serializes() {
        let e = engine();
        let json = serde_json::to_string(&e.snapshot()).unwrap();
        assert!(json.contains("\"phase_name\":\"The Void\""));
        assert!(json.contains("\"mode\":\"create\""));
    }

    #[test]
    fn test_destroy() {
        let mut e = engine();
        e.handle_pointer_down(100.0, 100.0);
        e.destroy();
        assert!(!e.is_initialized());
        assert_eq!(e.world().particles.len(), 0);
        assert_eq!(e.frame(100.0), 0.0);
    }
}
