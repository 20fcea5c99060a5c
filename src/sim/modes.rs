//! Pointer interaction modes
//!
//! Translates pointer gestures into world actions for the active mode.
//! Switching modes drops any drag or selection in progress.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::world::{FusionOutcome, World};
use crate::consts::*;

/// Minimum selection size that triggers an automatic fusion
const AUTO_FUSE_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    #[default]
    Create,
    Gravity,
    Stream,
    Fusion,
    Explore,
}

impl InteractionMode {
    pub const ALL: [InteractionMode; 5] = [
        InteractionMode::Create,
        InteractionMode::Gravity,
        InteractionMode::Stream,
        InteractionMode::Fusion,
        InteractionMode::Explore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionMode::Create => "create",
            InteractionMode::Gravity => "gravity",
            InteractionMode::Stream => "stream",
            InteractionMode::Fusion => "fusion",
            InteractionMode::Explore => "explore",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// Mode bound to a number key (`Digit1`..`Digit5`)
    pub fn from_key(code: &str) -> Option<Self> {
        let digit = code.strip_prefix("Digit")?.parse::<usize>().ok()?;
        Self::ALL.get(digit.checked_sub(1)?).copied()
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    start: Vec2,
    last: Vec2,
    /// Distance covered since the last trail particle
    trail: f32,
    /// Moved past the click threshold
    moved: bool,
}

/// Active mode plus in-progress gesture state
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    mode: InteractionMode,
    drag: Option<Drag>,
    selection: Vec<EntityId>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        if mode != self.mode {
            log::debug!("Mode {} -> {}", self.mode.as_str(), mode.as_str());
        }
        self.mode = mode;
        self.drag = None;
        self.selection.clear();
    }

    pub fn selection(&self) -> &[EntityId] {
        &self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some_and(|d| d.moved)
    }

    /// Start and current point of an active drag (for previews)
    pub fn drag_span(&self) -> Option<(Vec2, Vec2)> {
        self.drag.map(|d| (d.start, d.last))
    }

    pub fn pointer_down(&mut self, world: &mut World, pos: Vec2) {
        self.drag = Some(Drag {
            start: pos,
            last: pos,
            trail: 0.0,
            moved: false,
        });
        if self.mode == InteractionMode::Create {
            world.create_burst(pos);
        }
    }

    pub fn pointer_move(&mut self, world: &mut World, pos: Vec2) {
        let mode = self.mode;
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        if pos.distance(drag.start) > DRAG_THRESHOLD {
            drag.moved = true;
        }
        if mode == InteractionMode::Create {
            drag.trail += pos.distance(drag.last);
            while drag.trail >= CREATE_TRAIL_SPACING {
                drag.trail -= CREATE_TRAIL_SPACING;
                if world.create_trail_particle(pos).is_none() {
                    drag.trail = 0.0;
                    break;
                }
            }
        }
        drag.last = pos;
    }

    pub fn pointer_up(&mut self, world: &mut World, pos: Vec2) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let moved = drag.moved || pos.distance(drag.start) > DRAG_THRESHOLD;

        match self.mode {
            InteractionMode::Create => {}
            InteractionMode::Gravity => {
                world.create_gravity_well(drag.start, drag.start.distance(pos));
            }
            InteractionMode::Stream => {
                world.create_stream(drag.start, pos);
            }
            InteractionMode::Fusion => {
                if moved {
                    let radius = drag.start.distance(pos);
                    for id in world.particles_within(drag.start, radius) {
                        if !self.selection.contains(&id) {
                            self.selection.push(id);
                        }
                    }
                    self.fuse_selection(world);
                } else {
                    self.toggle_nearest(world, pos);
                    if self.selection.len() >= AUTO_FUSE_COUNT {
                        self.fuse_selection(world);
                    }
                }
            }
            InteractionMode::Explore => {
                if !moved {
                    world.try_explore(pos);
                }
            }
        }
    }

    fn toggle_nearest(&mut self, world: &World, pos: Vec2) {
        let Some(id) = world.particle_at(pos, SELECT_RADIUS) else {
            return;
        };
        if let Some(i) = self.selection.iter().position(|s| *s == id) {
            self.selection.remove(i);
        } else {
            self.selection.push(id);
        }
    }

    /// Fuse the current selection; the selection is kept only when the
    /// attempt did nothing
    pub fn fuse_selection(&mut self, world: &mut World) -> FusionOutcome {
        let outcome = world.attempt_fusion(&self.selection);
        if matches!(outcome, FusionOutcome::Started { .. } | FusionOutcome::Unstable { .. }) {
            self.selection.clear();
        }
        outcome
    }

    /// Forget selected particles that no longer exist
    pub fn prune_selection(&mut self, world: &World) {
        self.selection.retain(|id| world.particle(*id).is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::SimRng;
    use crate::tuning::Tuning;

    fn world() -> World {
        World::new(Tuning::default(), 800.0, 600.0, SimRng::seeded(11))
    }

    fn controller(mode: InteractionMode) -> ModeController {
        let mut c = ModeController::new();
        c.set_mode(mode);
        c
    }

    #[test]
    fn test_mode_keys() {
        assert_eq!(InteractionMode::from_key("Digit1"), Some(InteractionMode::Create));
        assert_eq!(InteractionMode::from_key("Digit5"), Some(InteractionMode::Explore));
        assert_eq!(InteractionMode::from_key("Digit0"), None);
        assert_eq!(InteractionMode::from_key("Digit6"), None);
        assert_eq!(InteractionMode::from_key("KeyA"), None);
        assert_eq!(InteractionMode::from_name("stream"), Some(InteractionMode::Stream));
    }

    #[test]
    fn test_create_click_and_trail() {
        let mut w = world();
        let mut c = controller(InteractionMode::Create);
        c.pointer_down(&mut w, Vec2::new(100.0, 100.0));
        assert_eq!(w.particles.len(), 5);
        assert_eq!(w.cosmos.energy(), 95.0);

        // 60 units of travel: two trail particles
        c.pointer_move(&mut w, Vec2::new(130.0, 100.0));
        c.pointer_move(&mut w, Vec2::new(160.0, 100.0));
        c.pointer_up(&mut w, Vec2::new(160.0, 100.0));
        assert_eq!(w.particles.len(), 7);
        assert_eq!(w.cosmos.energy(), 93.0);
    }

    #[test]
    fn test_gravity_drag_sets_radius() {
        let mut w = world();
        let mut c = controller(InteractionMode::Gravity);
        c.pointer_down(&mut w, Vec2::new(400.0, 300.0));
        c.pointer_move(&mut w, Vec2::new(500.0, 300.0));
        c.pointer_up(&mut w, Vec2::new(600.0, 300.0));
        assert_eq!(w.wells.len(), 1);
        assert_eq!(w.wells[0].pos, Vec2::new(400.0, 300.0));
        assert_eq!(w.wells[0].tier.as_str(), "black_hole");
    }

    #[test]
    fn test_stream_drag() {
        let mut w = world();
        let mut c = controller(InteractionMode::Stream);
        c.pointer_down(&mut w, Vec2::new(100.0, 100.0));
        c.pointer_up(&mut w, Vec2::new(105.0, 100.0));
        assert!(w.streams.is_empty());

        c.pointer_down(&mut w, Vec2::new(100.0, 100.0));
        c.pointer_up(&mut w, Vec2::new(300.0, 100.0));
        assert_eq!(w.streams.len(), 1);
    }

    #[test]
    fn test_fusion_clicks_auto_fuse_at_three() {
        let mut w = world();
        let points = [Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0), Vec2::new(300.0, 100.0)];
        for p in points {
            w.spawn_particle(p, 0.0, 0.0, 10.0);
        }
        let mut c = controller(InteractionMode::Fusion);

        c.pointer_down(&mut w, points[0]);
        c.pointer_up(&mut w, points[0]);
        assert_eq!(c.selection().len(), 1);
        // Clicking again deselects
        c.pointer_down(&mut w, points[0]);
        c.pointer_up(&mut w, points[0]);
        assert!(c.selection().is_empty());

        for p in points {
            c.pointer_down(&mut w, p + Vec2::new(3.0, 0.0));
            c.pointer_up(&mut w, p + Vec2::new(3.0, 0.0));
        }
        assert!(c.selection().is_empty());
        assert_eq!(w.fusions.len(), 1);
        assert!(w.particles.is_empty());
    }

    #[test]
    fn test_fusion_drag_selects_circle() {
        let mut w = world();
        for i in 0..4 {
            w.spawn_particle(Vec2::new(400.0 + i as f32 * 10.0, 300.0), 0.0, 0.0, 10.0);
        }
        let far = w.spawn_particle(Vec2::new(700.0, 500.0), 0.0, 0.0, 10.0).unwrap();
        let mut c = controller(InteractionMode::Fusion);
        c.pointer_down(&mut w, Vec2::new(410.0, 300.0));
        c.pointer_move(&mut w, Vec2::new(450.0, 300.0));
        c.pointer_up(&mut w, Vec2::new(450.0, 300.0));
        assert_eq!(w.fusions.len(), 1);
        assert_eq!(w.fusions[0].participant_count, 4);
        assert_eq!(w.particles.len(), 1);
        assert!(w.particle(far).is_some());
    }

    #[test]
    fn test_switching_mode_clears_state() {
        let mut w = world();
        let id = w.spawn_particle(Vec2::new(100.0, 100.0), 0.0, 0.0, 10.0).unwrap();
        let mut c = controller(InteractionMode::Fusion);
        c.pointer_down(&mut w, Vec2::new(100.0, 100.0));
        c.pointer_up(&mut w, Vec2::new(100.0, 100.0));
        assert_eq!(c.selection(), &[id]);

        c.pointer_down(&mut w, Vec2::new(200.0, 200.0));
        c.set_mode(InteractionMode::Gravity);
        assert!(c.selection().is_empty());
        assert!(c.drag_span().is_none());
        // The dangling pointer-up does nothing
        c.pointer_up(&mut w, Vec2::new(400.0, 200.0));
        assert!(w.wells.is_empty());
    }

    #[test]
    fn test_prune_selection() {
        let mut w = world();
        let id = w.spawn_particle(Vec2::new(100.0, 100.0), 0.0, 0.0, 10.0).unwrap();
        let mut c = controller(InteractionMode::Fusion);
        c.pointer_down(&mut w, Vec2::new(100.0, 100.0));
        c.pointer_up(&mut w, Vec2::new(100.0, 100.0));
        w.take_particles(&[id]);
        c.prune_selection(&w);
        assert!(c.selection().is_empty());
    }
}
