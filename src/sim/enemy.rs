//! Enemies: lifecycle state machine and movement strategies
//!
//! An enemy is `Alive` until exactly one death path fires (killed by the
//! player, lifetime expired, or rammed the player). That transition emits the
//! score award, the death cue and the drop roll; the stage then removes the
//! enemy on the same tick.

use glam::Vec3;
use rand::Rng;

use super::collision::EntityId;
use super::events::StageEvent;
use super::powerup::PowerUpKind;
use super::projectile::Faction;
use crate::audio::SoundCue;
use crate::platform::EntityHandle;
use crate::settings::{EnemyArchetype, MovementConfig};
use crate::{direction_to, move_towards, uniform};

/// Enemy lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    Alive,
    Dying(DeathCause),
    Destroyed,
}

/// Why an enemy left `Alive`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// Health reached zero from player fire; awards score
    KilledByPlayer,
    /// Lifetime ran out
    Expired,
    /// Crashed into the player
    Collided,
}

/// Phase of the shooter's evasive routine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvadePhase {
    /// Initial delay before the first maneuver
    Waiting,
    Maneuvering,
    Resting,
}

/// Shooter behaviour: drift, dodge sideways, fire aimed shots
#[derive(Debug, Clone)]
pub struct ShooterBrain {
    speed: f32,
    shoot_interval: f32,
    shoot_timer: f32,
    dodge: f32,
    smoothing: f32,
    maneuver_time: (f32, f32),
    maneuver_wait: (f32, f32),
    target_maneuver: f32,
    phase: EvadePhase,
    phase_remaining: f32,
}

impl ShooterBrain {
    pub fn phase(&self) -> EvadePhase {
        self.phase
    }

    pub fn target_maneuver(&self) -> f32 {
        self.target_maneuver
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn advance_evasion<R: Rng + ?Sized>(&mut self, dt: f32, x: f32, rng: &mut R) {
        self.phase_remaining -= dt;
        if self.phase_remaining > 0.0 {
            return;
        }
        match self.phase {
            EvadePhase::Waiting | EvadePhase::Resting => {
                // Dodge toward the middle of the stage
                let side = if x < 0.0 { 1.0 } else { -1.0 };
                self.target_maneuver = uniform(rng, 1.0, self.dodge) * side;
                self.phase = EvadePhase::Maneuvering;
                self.phase_remaining = uniform(rng, self.maneuver_time.0, self.maneuver_time.1);
            }
            EvadePhase::Maneuvering => {
                self.target_maneuver = 0.0;
                self.phase = EvadePhase::Resting;
                self.phase_remaining = uniform(rng, self.maneuver_wait.0, self.maneuver_wait.1);
            }
        }
    }
}

/// Movement strategy, chosen per archetype
#[derive(Debug, Clone)]
pub enum Movement {
    Straight { speed: f32 },
    /// Velocity fixed at spawn, aimed at where the player was
    Kamikaze { velocity: Vec3 },
    Shooter(ShooterBrain),
}

impl Movement {
    fn from_config<R: Rng + ?Sized>(
        config: &MovementConfig,
        position: Vec3,
        player: Option<Vec3>,
        rng: &mut R,
    ) -> Self {
        match *config {
            MovementConfig::Straight { speed } => Movement::Straight { speed },
            MovementConfig::Kamikaze { speed } => {
                let direction = player
                    .and_then(|target| direction_to(position, target))
                    .unwrap_or(Vec3::NEG_Y);
                Movement::Kamikaze { velocity: direction * speed }
            }
            MovementConfig::Shooter {
                speed,
                shoot_interval,
                dodge,
                smoothing,
                start_wait,
                maneuver_time,
                maneuver_wait,
            } => Movement::Shooter(ShooterBrain {
                speed: uniform(rng, speed * 0.8, speed * 1.2),
                shoot_interval,
                shoot_timer: shoot_interval,
                dodge,
                smoothing,
                maneuver_time,
                maneuver_wait,
                target_maneuver: 0.0,
                phase: EvadePhase::Waiting,
                phase_remaining: uniform(rng, start_wait.0, start_wait.1),
            }),
        }
    }
}

/// A live enemy
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    pub archetype: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub health: f32,
    pub remaining_lifetime: f32,
    pub score_value: u32,
    pub drop_chance: u32,
    pub drop_table: Vec<PowerUpKind>,
    pub movement: Movement,
    pub handle: Option<EntityHandle>,
    hit_effect: Option<String>,
    death_effect: Option<String>,
    state: LifeState,
}

impl Enemy {
    /// Build an enemy from its archetype; `player` is the player position at spawn time
    pub fn spawn<R: Rng + ?Sized>(
        id: EntityId,
        archetype: &EnemyArchetype,
        position: Vec3,
        player: Option<Vec3>,
        rng: &mut R,
    ) -> Self {
        let movement = Movement::from_config(&archetype.movement, position, player, rng);
        let velocity = match &movement {
            Movement::Straight { speed } => Vec3::new(0.0, -speed, 0.0),
            Movement::Kamikaze { velocity } => *velocity,
            Movement::Shooter(brain) => Vec3::new(0.0, -brain.speed, 0.0),
        };

        Self {
            id,
            archetype: archetype.id.clone(),
            position,
            velocity,
            health: archetype.health,
            remaining_lifetime: archetype.lifetime,
            score_value: archetype.score_value,
            drop_chance: archetype.drop_chance,
            drop_table: archetype.drop_table.clone(),
            movement,
            handle: None,
            hit_effect: archetype.hit_effect.clone(),
            death_effect: archetype.death_effect.clone(),
            state: LifeState::Alive,
        }
    }

    pub fn state(&self) -> LifeState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state == LifeState::Alive
    }

    /// Per-frame behaviour: move, shoot, count down the lifetime
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        player: Option<Vec3>,
        rng: &mut R,
        events: &mut Vec<StageEvent>,
    ) {
        if !self.is_alive() {
            return;
        }

        match &mut self.movement {
            Movement::Straight { speed } => {
                self.velocity = Vec3::new(0.0, -*speed, 0.0);
            }
            Movement::Kamikaze { velocity } => {
                self.velocity = *velocity;
            }
            Movement::Shooter(brain) => {
                brain.advance_evasion(dt, self.position.x, rng);
                self.velocity.y = -brain.speed;
                self.velocity.x =
                    move_towards(self.velocity.x, brain.target_maneuver, brain.smoothing * dt);

                brain.shoot_timer -= dt;
                if brain.shoot_timer <= 0.0 {
                    brain.shoot_timer = brain.shoot_interval;
                    if let Some(direction) = player.and_then(|p| direction_to(self.position, p)) {
                        events.push(StageEvent::Fire {
                            faction: Faction::Enemy,
                            origin: self.position,
                            direction,
                        });
                        events.push(StageEvent::Cue(SoundCue::EnemyShot));
                    }
                }
            }
        }

        self.position += self.velocity * dt;

        self.remaining_lifetime -= dt;
        if self.remaining_lifetime <= 0.0 {
            self.die(DeathCause::Expired, rng, events);
        }
    }

    /// Apply player damage. Returns true if this hit killed the enemy.
    pub fn take_damage<R: Rng + ?Sized>(
        &mut self,
        amount: f32,
        rng: &mut R,
        events: &mut Vec<StageEvent>,
    ) -> bool {
        if !self.is_alive() {
            return false;
        }

        self.health -= amount;
        if self.health <= 0.0 {
            self.die(DeathCause::KilledByPlayer, rng, events);
            return true;
        }

        if let Some(effect) = &self.hit_effect {
            events.push(StageEvent::Effect { archetype: effect.clone(), position: self.position });
        }
        events.push(StageEvent::Cue(SoundCue::EnemyHit));
        false
    }

    /// Crash into the player: self-destruct without awarding score
    pub fn ram<R: Rng + ?Sized>(&mut self, rng: &mut R, events: &mut Vec<StageEvent>) {
        self.die(DeathCause::Collided, rng, events);
    }

    /// Alive → Dying. Only the first call has any effect.
    fn die<R: Rng + ?Sized>(
        &mut self,
        cause: DeathCause,
        rng: &mut R,
        events: &mut Vec<StageEvent>,
    ) {
        if !self.is_alive() {
            return;
        }
        self.state = LifeState::Dying(cause);

        if cause == DeathCause::KilledByPlayer {
            events.push(StageEvent::AddScore(self.score_value));
        }
        if cause != DeathCause::Expired {
            if let Some(effect) = &self.death_effect {
                events.push(StageEvent::Effect {
                    archetype: effect.clone(),
                    position: self.position,
                });
            }
        }
        events.push(StageEvent::Cue(SoundCue::EnemyDeath));

        if !self.drop_table.is_empty() && rng.random_range(0..100) < self.drop_chance {
            let kind = self.drop_table[rng.random_range(0..self.drop_table.len())];
            events.push(StageEvent::DropPowerUp { kind, position: self.position });
        }
    }

    /// Dying → Destroyed; returns the presentation handle to release
    pub fn finish(&mut self) -> Option<EntityHandle> {
        if matches!(self.state, LifeState::Dying(_)) {
            self.state = LifeState::Destroyed;
        }
        self.handle.take()
    }
}
