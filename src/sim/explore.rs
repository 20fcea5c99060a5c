//! Drill-down exploration of bodies
//!
//! Bodies own their interior children. The explorer only keeps the id path
//! from a top-level body down to the focused one, so "exit to parent" is a
//! lookup rather than a back-pointer.

use glam::Vec2;

use super::entity::{Body, BodyKind, EntityId, IdAllocator};
use super::rng::SimRng;
use crate::heading_vector;

/// Focus path through the body tree
#[derive(Debug, Clone, Default)]
pub struct Explorer {
    path: Vec<EntityId>,
}

impl Explorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focus a body anywhere in the tree, generating its interior on first
    /// entry. Entering the same body again never regenerates children.
    pub fn enter_body(
        &mut self,
        bodies: &mut [Body],
        id: EntityId,
        ids: &mut IdAllocator,
        rng: &mut SimRng,
    ) -> bool {
        let Some(path) = path_to(bodies, id) else {
            return false;
        };
        let Some(body) = resolve_mut(bodies, &path) else {
            return false;
        };
        if body.interior.is_none() {
            let children = generate_interior(body, ids, rng);
            log::debug!(
                "Generated {} interior bodies for {} {}",
                children.len(),
                body.kind.as_str(),
                body.id
            );
            body.interior = Some(children);
        }
        self.path = path;
        true
    }

    /// Step back out to the parent. Returns the id that was left.
    pub fn exit_current_body(&mut self) -> Option<EntityId> {
        self.path.pop()
    }

    /// Id of the focused body, if exploring
    pub fn focused_body(&self) -> Option<EntityId> {
        self.path.last().copied()
    }

    /// Id of the focused body's parent (None at the top level)
    pub fn parent_of_focus(&self) -> Option<EntityId> {
        self.path.len().checked_sub(2).map(|i| self.path[i])
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn path(&self) -> &[EntityId] {
        &self.path
    }

    /// Resolve the focused body
    pub fn focused<'a>(&self, bodies: &'a [Body]) -> Option<&'a Body> {
        resolve(bodies, &self.path)
    }

    /// Drop the focus if the path no longer resolves (e.g. the root was removed)
    pub fn revalidate(&mut self, bodies: &[Body]) {
        if !self.path.is_empty() && resolve(bodies, &self.path).is_none() {
            self.path.clear();
        }
    }

    pub fn clear(&mut self) {
        self.path.clear();
    }
}

/// Ids from a top-level body down to `id`
fn path_to(bodies: &[Body], id: EntityId) -> Option<Vec<EntityId>> {
    for body in bodies {
        if body.id == id {
            return Some(vec![id]);
        }
        if let Some(children) = &body.interior {
            if let Some(mut rest) = path_to(children, id) {
                rest.insert(0, body.id);
                return Some(rest);
            }
        }
    }
    None
}

fn resolve<'a>(bodies: &'a [Body], path: &[EntityId]) -> Option<&'a Body> {
    let (first, rest) = path.split_first()?;
    let body = bodies.iter().find(|b| b.id == *first)?;
    if rest.is_empty() {
        Some(body)
    } else {
        resolve(body.interior.as_deref()?, rest)
    }
}

fn resolve_mut<'a>(bodies: &'a mut [Body], path: &[EntityId]) -> Option<&'a mut Body> {
    let (first, rest) = path.split_first()?;
    let body = bodies.iter_mut().find(|b| b.id == *first)?;
    if rest.is_empty() {
        Some(body)
    } else {
        resolve_mut(body.interior.as_deref_mut()?, rest)
    }
}

/// Children appropriate to the parent's kind
fn generate_interior(parent: &Body, ids: &mut IdAllocator, rng: &mut SimRng) -> Vec<Body> {
    let (kind, count) = match parent.kind {
        BodyKind::Galaxy => (BodyKind::Star, rng.between(5, 9)),
        BodyKind::Nebula => (BodyKind::Star, rng.between(2, 4)),
        BodyKind::Star => (BodyKind::Planet, rng.between(2, 6)),
        BodyKind::Planet => (BodyKind::Life, rng.between(1, 4)),
        BodyKind::Life | BodyKind::BlackHole => (BodyKind::Life, 0),
    };

    let share = parent.energy.max(1.0) / count.max(1) as f32;
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU + rng.range(-0.2, 0.2);
            let orbit = 40.0 + i as f32 * 25.0;
            let pos: Vec2 = parent.pos + heading_vector(angle) * orbit;
            let energy = share * rng.range(0.5, 1.0);
            let mut child = Body::new(ids.next_id(), pos, energy, kind, parent.formed_in_phase);
            child.parent = Some(parent.id);
            child
        })
        .collect()
}
