//! Bullets for both factions

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::EntityId;
use crate::platform::EntityHandle;

/// Who fired a bullet; bullets never hurt their own side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
}

/// A moving projectile
#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: EntityId,
    pub faction: Faction,
    pub position: Vec3,
    pub velocity: Vec3,
    pub remaining_lifetime: f32,
    pub damage: f32,
    /// Consumed by a hit
    pub spent: bool,
    pub handle: Option<EntityHandle>,
}

impl Bullet {
    pub fn new(
        id: EntityId,
        faction: Faction,
        origin: Vec3,
        direction: Vec3,
        speed: f32,
        lifetime: f32,
        damage: f32,
    ) -> Self {
        Self {
            id,
            faction,
            position: origin,
            velocity: direction.normalize_or_zero() * speed,
            remaining_lifetime: lifetime,
            damage,
            spent: false,
            handle: None,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.remaining_lifetime -= dt;
    }

    pub fn is_live(&self) -> bool {
        !self.spent && self.remaining_lifetime > 0.0
    }

    /// Whether this bullet can hurt something on `target`'s side
    #[inline]
    pub fn hurts(&self, target: Faction) -> bool {
        self.faction != target
    }

    /// Rotation (radians about z) that points the proxy along the velocity
    pub fn rotation(&self) -> f32 {
        -self.velocity.x.atan2(self.velocity.y)
    }
}
