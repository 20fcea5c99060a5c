//! Per-frame simulation step
//!
//! Advances the world by one variable timestep in a fixed order:
//! field, effects, particles, bodies, growth, then progression.

use super::world::World;

/// Advance the world by `dt` seconds
pub fn tick(world: &mut World, dt: f32) {
    if !(dt > 0.0) {
        return;
    }

    world.field.diffuse(dt);

    // Effects
    let max_speed = world.tuning.max_particle_speed;
    for well in &mut world.wells {
        well.update(dt, &mut world.field, &mut world.particles, max_speed);
    }
    world.wells.retain(|w| !w.is_expired());

    let mut emissions = Vec::new();
    for stream in &mut world.streams {
        if let Some(emission) = stream.update(dt, &mut world.field, &mut world.particles, max_speed) {
            emissions.push(emission);
        }
    }
    world.streams.retain(|s| !s.is_expired());
    for e in emissions {
        world.spawn_particle(e.pos, e.direction, e.speed, e.energy);
    }

    for fusion in &mut world.fusions {
        fusion.update(dt, &mut world.field, &mut world.particles);
    }
    let (finished, active): (Vec<_>, Vec<_>) =
        world.fusions.drain(..).partition(|f| f.is_complete());
    world.fusions = active;
    for fusion in finished {
        world.complete_fusion(fusion);
    }

    // Particles
    for p in &mut world.particles {
        p.update(dt, &world.field, &world.tuning, &mut world.rng);
    }
    world.sync_entanglements();
    world.cull_dead_particles();

    // Bodies
    for body in &mut world.bodies {
        body.update(dt, &mut world.field);
    }
    world.absorb_into_bodies();
    world.grow_idle_particles();

    world.cosmos.update(dt);
    world.explorer.revalidate(&world.bodies);
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::sim::catalog::Stat;
    use crate::sim::rng::SimRng;
    use crate::sim::world::FusionOutcome;
    use crate::tuning::Tuning;

    const DT: f32 = 1.0 / 60.0;

    fn world(seed: u64) -> World {
        World::new(Tuning::default(), 800.0, 600.0, SimRng::seeded(seed))
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut w = world(1);
        w.create_burst(Vec2::new(400.0, 300.0));
        let before: Vec<Vec2> = w.particles.iter().map(|p| p.pos).collect();
        tick(&mut w, 0.0);
        tick(&mut w, -1.0);
        let after: Vec<Vec2> = w.particles.iter().map(|p| p.pos).collect();
        assert_eq!(before, after);
        assert_eq!(w.cosmos.elapsed(), 0.0);
    }

    #[test]
    fn test_effects_expire() {
        let mut w = world(2);
        w.create_gravity_well(Vec2::new(400.0, 300.0), 40.0);
        w.create_stream(Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0));
        assert_eq!(w.wells.len(), 1);
        assert_eq!(w.streams.len(), 1);

        // Micro well lives 8 s, trickle stream 6 s
        for _ in 0..(7.0 / DT) as usize {
            tick(&mut w, DT);
        }
        assert_eq!(w.wells.len(), 1);
        assert!(w.streams.is_empty());
        assert!(w.cosmos.stat(Stat::StreamsCreated) == 1);

        for _ in 0..(2.0 / DT) as usize {
            tick(&mut w, DT);
        }
        assert!(w.wells.is_empty());
    }

    #[test]
    fn test_streams_emit_particles() {
        let mut w = world(3);
        w.create_stream(Vec2::new(100.0, 100.0), Vec2::new(500.0, 100.0));
        for _ in 0..60 {
            tick(&mut w, DT);
        }
        assert!(!w.particles.is_empty());
    }

    #[test]
    fn test_three_particle_fusion_completes() {
        let mut w = world(4);
        let ids: Vec<_> = (0..3)
            .map(|i| {
                w.spawn_particle(Vec2::new(400.0 + i as f32 * 10.0, 300.0), 0.0, 20.0, 10.0)
                    .unwrap()
            })
            .collect();
        assert!(matches!(w.attempt_fusion(&ids), FusionOutcome::Started { .. }));
        let score = w.cosmos.score();

        // max_progress = 2.6 s
        for _ in 0..(3.0 / DT) as usize {
            tick(&mut w, DT);
        }
        assert!(w.fusions.is_empty());
        assert!(w.particles.len() >= 8);
        assert!(w.cosmos.score() >= score + 150);
        assert_eq!(w.cosmos.stat(Stat::FusionsCompleted), 1);
    }

    #[test]
    fn test_fusion_at_population_cap_emits_full_ring() {
        let tuning = Tuning {
            max_particles: 20,
            growth_chance: 0.0,
            fusion_body_chance: 0.0,
            ..Tuning::default()
        };
        let mut w = World::new(tuning, 800.0, 600.0, SimRng::seeded(8));
        let ids: Vec<_> = (0..3)
            .map(|i| {
                w.spawn_particle(Vec2::new(400.0 + i as f32 * 10.0, 300.0), 0.0, 20.0, 10.0)
                    .unwrap()
            })
            .collect();
        assert!(matches!(w.attempt_fusion(&ids), FusionOutcome::Started { .. }));
        for i in 0..20 {
            w.spawn_particle(Vec2::new(50.0 + i as f32 * 30.0, 100.0), 0.0, 20.0, 10.0)
                .unwrap();
        }
        assert_eq!(w.particles.len(), 20);

        for _ in 0..(3.0 / DT) as usize {
            tick(&mut w, DT);
        }
        assert!(w.fusions.is_empty());
        assert!(w.particles.len() >= 20 + 8);
    }

    #[test]
    fn test_dead_particles_are_culled_with_entanglement() {
        let mut w = world(5);
        let a = w.spawn_particle(Vec2::new(100.0, 100.0), 0.0, 0.0, 5.0).unwrap();
        let b = w.spawn_particle(Vec2::new(300.0, 300.0), 0.0, 0.0, 5.0).unwrap();
        assert!(w.entanglements.entangle(a, b));
        w.particles[0].lifespan = 0.01;

        tick(&mut w, DT);
        assert!(w.particle(a).is_none());
        assert!(w.entanglements.partner(b).is_none());
    }

    #[test]
    fn test_entangled_partners_share_phase() {
        let mut w = world(6);
        let a = w.spawn_particle(Vec2::new(100.0, 100.0), 0.0, 50.0, 5.0).unwrap();
        let b = w.spawn_particle(Vec2::new(500.0, 300.0), 1.0, 50.0, 5.0).unwrap();
        w.entanglements.entangle(a, b);
        tick(&mut w, DT);
        assert_eq!(w.particle(a).unwrap().phase, w.particle(b).unwrap().phase);
    }

    #[test]
    fn test_energy_regenerates() {
        let mut w = world(7);
        assert!(w.cosmos.use_energy(50.0));
        for _ in 0..60 {
            tick(&mut w, DT);
        }
        assert!((w.cosmos.energy() - 55.0).abs() < 0.01);
    }

    #[test]
    fn test_determinism() {
        let mut w1 = world(99);
        let mut w2 = world(99);
        for w in [&mut w1, &mut w2] {
            w.create_burst(Vec2::new(300.0, 300.0));
            w.create_gravity_well(Vec2::new(350.0, 300.0), 120.0);
        }
        for _ in 0..300 {
            tick(&mut w1, DT);
            tick(&mut w2, DT);
        }
        assert_eq!(w1.particles.len(), w2.particles.len());
        for (a, b) in w1.particles.iter().zip(&w2.particles) {
            assert_eq!(a.pos, b.pos);
        }
        assert_eq!(w1.field.total(), w2.field.total());
    }
}
