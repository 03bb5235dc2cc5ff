//! Power-up kinds, effects and falling pickups

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::EntityId;
use crate::platform::EntityHandle;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    SpeedBoost,
    TripleShot,
    FullAuto,
    Health,
    Shield,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::SpeedBoost,
        PowerUpKind::TripleShot,
        PowerUpKind::FullAuto,
        PowerUpKind::Health,
        PowerUpKind::Shield,
    ];

    /// Instantiator archetype of the pickup
    pub fn archetype(&self) -> &'static str {
        match self {
            PowerUpKind::SpeedBoost => "powerup.speed_boost",
            PowerUpKind::TripleShot => "powerup.triple_shot",
            PowerUpKind::FullAuto => "powerup.full_auto",
            PowerUpKind::Health => "powerup.health",
            PowerUpKind::Shield => "powerup.shield",
        }
    }
}

/// What a collected pickup does to the player.
///
/// Timed variants revert after `duration`; Health applies immediately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerUpEffect {
    /// Multiplies the movement rates
    SpeedBoost { duration: f32, max_speed: f32, acceleration: f32, deceleration: f32 },
    TripleShot { duration: f32 },
    /// Full-auto fire at `fire_rate × fire_rate_multiplier`
    FullAuto { duration: f32, fire_rate_multiplier: f32 },
    Health { hearts: u32 },
    /// Invincible for the duration
    Shield { duration: f32 },
}

impl PowerUpEffect {
    pub fn kind(&self) -> PowerUpKind {
        match self {
            PowerUpEffect::SpeedBoost { .. } => PowerUpKind::SpeedBoost,
            PowerUpEffect::TripleShot { .. } => PowerUpKind::TripleShot,
            PowerUpEffect::FullAuto { .. } => PowerUpKind::FullAuto,
            PowerUpEffect::Health { .. } => PowerUpKind::Health,
            PowerUpEffect::Shield { .. } => PowerUpKind::Shield,
        }
    }

    /// `None` for immediate effects
    pub fn duration(&self) -> Option<f32> {
        match *self {
            PowerUpEffect::SpeedBoost { duration, .. }
            | PowerUpEffect::TripleShot { duration }
            | PowerUpEffect::FullAuto { duration, .. }
            | PowerUpEffect::Shield { duration } => Some(duration),
            PowerUpEffect::Health { .. } => None,
        }
    }
}

/// A pickup falling toward the player
#[derive(Debug, Clone)]
pub struct PowerUp {
    pub id: EntityId,
    pub kind: PowerUpKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub remaining_lifetime: f32,
    pub collected: bool,
    pub handle: Option<EntityHandle>,
}

impl PowerUp {
    pub fn new(
        id: EntityId,
        kind: PowerUpKind,
        position: Vec3,
        fall_speed: f32,
        lifetime: f32,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            velocity: Vec3::new(0.0, -fall_speed, 0.0),
            remaining_lifetime: lifetime,
            collected: false,
            handle: None,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.remaining_lifetime -= dt;
    }

    /// Still on stage and collectable
    pub fn is_live(&self) -> bool {
        !self.collected && self.remaining_lifetime > 0.0
    }
}
