//! Events entities report to the stage
//!
//! Entities never reach into the stage directly. They push `StageEvent`s into
//! the session queue and the stage controller applies them after the entity
//! pass, which is the only place the score and the collaborators are touched.

use glam::Vec3;

use super::powerup::PowerUpKind;
use super::projectile::Faction;
use crate::audio::SoundCue;

#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    /// Award points (only applied by the stage controller)
    AddScore(u32),
    /// Fire-and-forget sound
    Cue(SoundCue),
    /// Fire-and-forget visual (particles)
    Effect { archetype: String, position: Vec3 },
    /// A dead enemy dropped a pickup
    DropPowerUp { kind: PowerUpKind, position: Vec3 },
    /// Spawn a bullet travelling along `direction`
    Fire { faction: Faction, origin: Vec3, direction: Vec3 },
    /// Player lost a life; `lives` is the new count
    PlayerDamaged { lives: u32 },
    /// Player gained lives from a health pickup
    PlayerHealed { lives: u32 },
    /// Player lost the last life
    PlayerDied { position: Vec3 },
    /// A timed power-up began (not sent when an active one restarts)
    PowerUpStarted(PowerUpKind),
    /// A timed power-up ran out or was cut short by death
    PowerUpEnded(PowerUpKind),
}
