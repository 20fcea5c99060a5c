//! Simulation module
//!
//! All cosmos logic lives here. This module must stay free of platform and
//! rendering concerns:
//! - Randomness only through `SimRng`
//! - Stable iteration order (by entity ID)
//! - Time only through the `dt` passed to `tick`

pub mod catalog;
pub mod cosmos;
pub mod effects;
pub mod entity;
pub mod explore;
pub mod field;
pub mod modes;
pub mod rng;
pub mod tick;
pub mod world;

pub use catalog::{Achievement, Challenge, CosmicElement, Stat, UniversePhase};
pub use cosmos::{CosmosEvent, CosmosState};
pub use effects::{Emission, FusionEvent, GravityWell, ParticleStream, StreamTier, WellTier};
pub use entity::{Body, BodyKind, Entanglements, EntityId, IdAllocator, Particle};
pub use explore::Explorer;
pub use field::ScalarField;
pub use modes::{InteractionMode, ModeController};
pub use rng::SimRng;
pub use tick::tick;
pub use world::{FusionOutcome, World};
