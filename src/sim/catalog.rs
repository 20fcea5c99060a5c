//! Fixed progression tables: phases, elements, achievements, challenges
//!
//! Runtime records are built from these tables by `CosmosState` and reset
//! back to them on `reset()`.

use serde::{Deserialize, Serialize};

/// Counters that drive achievements and challenges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    ParticlesCreated,
    WellsCreated,
    StreamsCreated,
    FusionsCompleted,
    BodiesFormed,
    ElementsDiscovered,
    PhasesReached,
    BodiesExplored,
    EntanglementsFormed,
}

/// One step of the cosmological progression
#[derive(Debug, Clone, Serialize)]
pub struct UniversePhase {
    pub index: usize,
    pub id: &'static str,
    pub name: &'static str,
    /// Score needed to enter this phase
    pub required_energy: u64,
    /// Cumulative simulated seconds before the phase can auto-advance in
    pub time_threshold: Option<f32>,
    pub unlocked: bool,
}

/// A discoverable element
#[derive(Debug, Clone, Serialize)]
pub struct CosmicElement {
    pub id: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub required_phase: usize,
    pub discovered: bool,
}

/// A one-time progress goal
#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub stat: Stat,
    pub target: u64,
    pub reward: u64,
    pub progress: u64,
    pub unlocked: bool,
}

/// A goal offered on entering a phase
#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    pub id: &'static str,
    pub name: &'static str,
    pub stat: Stat,
    pub target: u64,
    pub reward: u64,
    pub progress: u64,
    /// Seconds left, if timed
    pub time_left: Option<f32>,
    pub completed: bool,
}

// (id, name, required score, time threshold)
const PHASES: &[(&str, &str, u64, Option<f32>)] = &[
    ("void", "The Void", 0, None),
    ("big_bang", "Big Bang", 0, Some(0.0)),
    ("particle_era", "Particle Era", 100, Some(20.0)),
    ("atomic_era", "Atomic Era", 1_000, Some(60.0)),
    ("stellar_era", "Stellar Era", 3_000, Some(120.0)),
    ("galactic_era", "Galactic Era", 8_000, Some(200.0)),
    ("life_era", "Life Era", 20_000, Some(300.0)),
    ("conscious_cosmos", "Conscious Cosmos", 50_000, Some(420.0)),
];

// (id, name, symbol, required phase)
const ELEMENTS: &[(&str, &str, &str, usize)] = &[
    ("hydrogen", "Hydrogen", "H", 2),
    ("helium", "Helium", "He", 2),
    ("lithium", "Lithium", "Li", 3),
    ("beryllium", "Beryllium", "Be", 3),
    ("carbon", "Carbon", "C", 4),
    ("nitrogen", "Nitrogen", "N", 4),
    ("oxygen", "Oxygen", "O", 4),
    ("iron", "Iron", "Fe", 4),
    ("silicon", "Silicon", "Si", 5),
    ("gold", "Gold", "Au", 5),
    ("uranium", "Uranium", "U", 5),
    ("dark_matter", "Dark Matter", "DM", 5),
    ("water", "Water", "H2O", 6),
    ("amino_acids", "Amino Acids", "AA", 6),
    ("dna", "DNA", "DNA", 6),
    ("consciousness", "Consciousness", "Ψ", 7),
];

/// Id of the achievement tracking element discovery
pub const COLLECTOR_ID: &str = "collector";
/// Id of the achievement tracking phase progression
pub const ASCENSION_ID: &str = "cosmic_ascension";

// (id, name, stat, target, reward); collector/ascension targets are derived
const ACHIEVEMENTS: &[(&str, &str, Stat, u64, u64)] = &[
    ("first_light", "First Light", Stat::ParticlesCreated, 1, 10),
    ("particle_swarm", "Particle Swarm", Stat::ParticlesCreated, 100, 100),
    ("gravity_novice", "Bend Spacetime", Stat::WellsCreated, 1, 20),
    ("gravity_master", "Gravity Master", Stat::WellsCreated, 10, 150),
    ("stream_weaver", "Stream Weaver", Stat::StreamsCreated, 10, 150),
    ("first_fusion", "First Fusion", Stat::FusionsCompleted, 1, 50),
    ("fusion_adept", "Fusion Adept", Stat::FusionsCompleted, 5, 250),
    ("world_builder", "World Builder", Stat::BodiesFormed, 10, 200),
    ("spooky_action", "Spooky Action", Stat::EntanglementsFormed, 1, 50),
    ("explorer", "Explorer", Stat::BodiesExplored, 3, 150),
    (COLLECTOR_ID, "Collector", Stat::ElementsDiscovered, 0, 1_000),
    (ASCENSION_ID, "Cosmic Ascension", Stat::PhasesReached, 0, 2_000),
];

// (phase, id, name, stat, target, reward, time limit)
const CHALLENGES: &[(usize, &str, &str, Stat, u64, u64, Option<f32>)] = &[
    (2, "spark_of_matter", "Spark of Matter", Stat::ParticlesCreated, 30, 150, Some(60.0)),
    (3, "gravity_lens", "Gravity Lens", Stat::WellsCreated, 3, 300, Some(90.0)),
    (4, "stellar_forge", "Stellar Forge", Stat::FusionsCompleted, 2, 500, Some(120.0)),
    (5, "cosmic_rivers", "Cosmic Rivers", Stat::StreamsCreated, 4, 800, None),
    (6, "seeds_of_life", "Seeds of Life", Stat::BodiesFormed, 8, 1_200, None),
    (7, "witness", "Witness", Stat::BodiesExplored, 3, 2_500, None),
];

/// Fresh phase list (only the first phase unlocked)
pub fn phases() -> Vec<UniversePhase> {
    PHASES
        .iter()
        .enumerate()
        .map(|(index, &(id, name, required_energy, time_threshold))| UniversePhase {
            index,
            id,
            name,
            required_energy,
            time_threshold,
            unlocked: index == 0,
        })
        .collect()
}

/// Fresh element list (nothing discovered)
pub fn elements() -> Vec<CosmicElement> {
    ELEMENTS
        .iter()
        .map(|&(id, name, symbol, required_phase)| CosmicElement {
            id,
            name,
            symbol,
            required_phase,
            discovered: false,
        })
        .collect()
}

/// Fresh achievement list with derived targets filled in
pub fn achievements() -> Vec<Achievement> {
    ACHIEVEMENTS
        .iter()
        .map(|&(id, name, stat, target, reward)| {
            let target = match id {
                COLLECTOR_ID => ELEMENTS.len() as u64,
                ASCENSION_ID => (PHASES.len() - 1) as u64,
                _ => target,
            };
            Achievement {
                id,
                name,
                stat,
                target,
                reward,
                progress: 0,
                unlocked: false,
            }
        })
        .collect()
}

/// Challenge offered on entering `phase`, if any
pub fn challenge_for_phase(phase: usize) -> Option<Challenge> {
    CHALLENGES
        .iter()
        .find(|c| c.0 == phase)
        .map(|&(_, id, name, stat, target, reward, time_left)| Challenge {
            id,
            name,
            stat,
            target,
            reward,
            progress: 0,
            time_left,
            completed: false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_table_is_ordered() {
        let phases = phases();
        assert_eq!(phases.len(), 8);
        assert!(phases[0].unlocked);
        assert!(phases.iter().skip(1).all(|p| !p.unlocked));
        for pair in phases.windows(2) {
            assert!(pair[0].required_energy <= pair[1].required_energy);
        }
    }

    #[test]
    fn test_no_elements_gate_on_first_two_phases() {
        // Big Bang score accounting relies on this
        assert!(elements().iter().all(|e| e.required_phase >= 2));
    }

    #[test]
    fn test_collector_target_matches_element_count() {
        let collector = achievements()
            .into_iter()
            .find(|a| a.id == COLLECTOR_ID)
            .unwrap();
        assert_eq!(collector.target, elements().len() as u64);
    }

    #[test]
    fn test_challenges_start_fresh() {
        let c = challenge_for_phase(3).unwrap();
        assert_eq!(c.progress, 0);
        assert!(!c.completed);
        assert!(challenge_for_phase(0).is_none());
    }
}
