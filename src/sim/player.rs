//! Player ship: movement, shooting, health and bullet time
//!
//! Timed state (invincibility window, power-up reverts) is kept as scheduled
//! task records and polled from `update`. Bullet time compensates the movement
//! rates by the inverse time scale through a separate factor, so turning it
//! off always lands back on the exact pre-activation rates.

use glam::{Vec2, Vec3};

use super::clock::{Clock, FrameTime};
use super::collision::EntityId;
use super::events::StageEvent;
use super::feedback::SaturationFade;
use super::powerup::{PowerUpEffect, PowerUpKind};
use super::projectile::Faction;
use super::tasks::{Scheduler, TimeDomain};
use crate::audio::SoundCue;
use crate::consts::{
    BULLET_TIME_SATURATION, MUZZLE_OFFSET, TRIPLE_SHOT_LEFT, TRIPLE_SHOT_RIGHT,
};
use crate::platform::EntityHandle;
use crate::settings::{Boundary, PlayerTuning};
use crate::{move_towards, wrap_horizontal};

/// How the trigger behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiringMode {
    /// One shot per press
    Single,
    /// Keeps firing while held
    FullAuto,
}

/// Movement rates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementStats {
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
}

impl MovementStats {
    const ONE: Self = Self { max_speed: 1.0, acceleration: 1.0, deceleration: 1.0 };

    fn scaled(self, factors: MovementStats, uniform: f32) -> Self {
        Self {
            max_speed: self.max_speed * factors.max_speed * uniform,
            acceleration: self.acceleration * factors.acceleration * uniform,
            deceleration: self.deceleration * factors.deceleration * uniform,
        }
    }
}

/// Scheduled player task keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerTask {
    Invincibility,
    PowerUp(PowerUpKind),
}

/// Result of `Player::take_damage`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Invincible or already dead
    Ignored,
    Damaged { lives: u32 },
    Died,
}

/// Movement limits derived once from the boundary boxes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl PlayerBounds {
    pub fn from_boundary(boundary: &Boundary, offset: f32) -> Self {
        Self {
            min_x: boundary.left.min.x + offset,
            max_x: boundary.right.max.x - offset,
            min_y: boundary.bottom.max.y + offset,
            max_y: boundary.top.min.y - offset,
        }
    }
}

/// The player ship
#[derive(Debug, Clone)]
pub struct Player {
    pub id: EntityId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub handle: Option<EntityHandle>,
    tuning: PlayerTuning,
    bounds: PlayerBounds,

    base: MovementStats,
    /// Speed-boost multipliers (1 when no boost)
    boost: MovementStats,
    /// Inverse time scale while bullet time is on, else 1
    time_compensation: f32,
    input: Vec2,

    lives: u32,
    alive: bool,
    damage_invincible: bool,
    shielded: bool,

    firing_mode: FiringMode,
    fire_rate_multiplier: f32,
    triple_shot: bool,
    shoot_held: bool,
    last_shot: Option<f64>,

    meter: f32,
    bullet_time_active: bool,
    saturation: SaturationFade,

    tasks: Scheduler<PlayerTask>,
}

impl Player {
    pub fn new(id: EntityId, tuning: &PlayerTuning, bounds: PlayerBounds, position: Vec3) -> Self {
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            handle: None,
            tuning: tuning.clone(),
            bounds,
            base: MovementStats {
                max_speed: tuning.max_speed,
                acceleration: tuning.acceleration,
                deceleration: tuning.deceleration,
            },
            boost: MovementStats::ONE,
            time_compensation: 1.0,
            input: Vec2::ZERO,
            lives: tuning.max_lives,
            alive: true,
            damage_invincible: false,
            shielded: false,
            firing_mode: FiringMode::Single,
            fire_rate_multiplier: 1.0,
            triple_shot: false,
            shoot_held: false,
            last_shot: None,
            meter: tuning.bullet_time_duration,
            bullet_time_active: false,
            saturation: SaturationFade::default(),
            tasks: Scheduler::new(),
        }
    }

    // === Getters ===

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn max_lives(&self) -> u32 {
        self.tuning.max_lives
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_invincible(&self) -> bool {
        self.damage_invincible || self.shielded
    }

    pub fn is_shielded(&self) -> bool {
        self.shielded
    }

    pub fn firing_mode(&self) -> FiringMode {
        self.firing_mode
    }

    pub fn has_triple_shot(&self) -> bool {
        self.triple_shot
    }

    pub fn bullet_time_active(&self) -> bool {
        self.bullet_time_active
    }

    /// Remaining bullet time in real seconds
    pub fn bullet_time_meter(&self) -> f32 {
        self.meter
    }

    /// Meter as a fraction of its capacity
    pub fn meter_fraction(&self) -> f32 {
        (self.meter / self.tuning.bullet_time_duration).clamp(0.0, 1.0)
    }

    pub fn saturation(&self) -> f32 {
        self.saturation.value()
    }

    pub fn bounds(&self) -> PlayerBounds {
        self.bounds
    }

    /// Current effective movement rates
    pub fn movement(&self) -> MovementStats {
        self.base.scaled(self.boost, self.time_compensation)
    }

    /// Timed power-ups currently running
    pub fn active_power_ups(&self) -> Vec<PowerUpKind> {
        PowerUpKind::ALL
            .into_iter()
            .filter(|kind| self.tasks.is_running(PlayerTask::PowerUp(*kind)))
            .collect()
    }

    /// Whether the ship is drawn in its flash colour this frame
    pub fn flash_on(&self, clock: &Clock) -> bool {
        if !self.damage_invincible || self.tuning.flash_duration <= 0.0 {
            return false;
        }
        let elapsed = self.tasks.elapsed(PlayerTask::Invincibility, clock).unwrap_or(0.0);
        (elapsed / self.tuning.flash_duration) as u32 % 2 == 0
    }

    // === Movement ===

    /// Latest movement input; longer vectors are clamped to length 1
    pub fn set_movement_input(&mut self, input: Vec2) {
        self.input = input.clamp_length_max(1.0);
    }

    /// One fixed movement step: `dt` scaled seconds of travel, with the
    /// velocity easing over `unscaled_dt` real seconds
    pub fn fixed_update(&mut self, dt: f32, unscaled_dt: f32) {
        if !self.alive {
            return;
        }

        let stats = self.movement();
        let target = self.input * stats.max_speed;

        let axis = |current: f32, target: f32| {
            let rate = if target.abs() > current.abs() {
                stats.acceleration
            } else {
                stats.deceleration
            };
            move_towards(current, target, rate * unscaled_dt)
        };
        self.velocity.x = axis(self.velocity.x, target.x);
        self.velocity.y = axis(self.velocity.y, target.y);

        self.position += self.velocity * dt;
        self.position.x = wrap_horizontal(self.position.x, self.bounds.min_x, self.bounds.max_x);
        self.position.y = self.position.y.clamp(self.bounds.min_y, self.bounds.max_y);
    }

    // === Shooting ===

    pub fn shoot_pressed(&mut self, clock: &Clock, events: &mut Vec<StageEvent>) {
        if self.shoot_held {
            return;
        }
        self.shoot_held = true;
        self.try_fire(clock, events);
    }

    pub fn shoot_released(&mut self) {
        self.shoot_held = false;
    }

    fn fire_interval(&self) -> f32 {
        match self.firing_mode {
            FiringMode::Single => self.tuning.fire_rate,
            FiringMode::FullAuto => self.tuning.fire_rate * self.fire_rate_multiplier,
        }
    }

    fn try_fire(&mut self, clock: &Clock, events: &mut Vec<StageEvent>) -> bool {
        if !self.alive {
            return false;
        }
        let now = clock.time();
        if let Some(last) = self.last_shot {
            if now - last < self.fire_interval() as f64 {
                return false;
            }
        }
        self.last_shot = Some(now);

        let muzzle = self.position + MUZZLE_OFFSET;
        let mut fire = |origin: Vec3| {
            events.push(StageEvent::Fire {
                faction: Faction::Player,
                origin,
                direction: Vec3::Y,
            });
        };
        fire(muzzle);
        if self.triple_shot {
            fire(muzzle + TRIPLE_SHOT_LEFT);
            fire(muzzle + TRIPLE_SHOT_RIGHT);
            events.push(StageEvent::Cue(SoundCue::TripleShot));
        } else {
            events.push(StageEvent::Cue(SoundCue::SingleShot));
        }
        true
    }

    // === Per-frame ===

    /// Frame update: full-auto fire, meter, saturation and timed tasks
    pub fn update(&mut self, frame: FrameTime, clock: &mut Clock, events: &mut Vec<StageEvent>) {
        if !self.alive {
            return;
        }

        if self.shoot_held && self.firing_mode == FiringMode::FullAuto {
            self.try_fire(clock, events);
        }

        if self.bullet_time_active {
            self.meter -= frame.unscaled_dt;
            if self.meter <= 0.0 {
                self.meter = 0.0;
                log::debug!("Bullet time meter exhausted");
                self.deactivate_bullet_time(clock);
            }
        } else {
            let regen = self.tuning.bullet_time_duration / self.tuning.bullet_time_cooldown;
            let refilled = self.meter + regen * frame.unscaled_dt;
            self.meter = refilled.min(self.tuning.bullet_time_duration);
        }

        self.saturation.tick(frame.unscaled_dt);

        for task in self.tasks.poll(clock) {
            match task {
                PlayerTask::Invincibility => self.damage_invincible = false,
                PlayerTask::PowerUp(kind) => self.revert_power_up(kind, events),
            }
        }
    }

    // === Health ===

    /// Lose a life unless invincible. Reaching zero kills the player.
    pub fn take_damage(
        &mut self,
        clock: &mut Clock,
        events: &mut Vec<StageEvent>,
    ) -> DamageOutcome {
        if !self.alive || self.is_invincible() {
            return DamageOutcome::Ignored;
        }

        self.lives = self.lives.saturating_sub(1);
        events.push(StageEvent::PlayerDamaged { lives: self.lives });

        if self.lives == 0 {
            self.die(clock, events);
            return DamageOutcome::Died;
        }

        events.push(StageEvent::Cue(SoundCue::PlayerDamage));
        self.damage_invincible = true;
        self.tasks.schedule(
            PlayerTask::Invincibility,
            self.tuning.invincibility_duration,
            TimeDomain::Scaled,
            clock,
        );
        DamageOutcome::Damaged { lives: self.lives }
    }

    fn die(&mut self, clock: &mut Clock, events: &mut Vec<StageEvent>) {
        if let Some(archetype) = &self.tuning.death_effect {
            events.push(StageEvent::Effect {
                archetype: archetype.clone(),
                position: self.position,
            });
        }
        for kind in self.active_power_ups() {
            events.push(StageEvent::PowerUpEnded(kind));
        }
        self.deactivate_bullet_time(clock);
        self.alive = false;
        self.shoot_held = false;
        self.tasks.clear();
        log::info!("Player destroyed");
        events.push(StageEvent::PlayerDied { position: self.position });
        events.push(StageEvent::Cue(SoundCue::PlayerDeath));
    }

    pub fn heal(&mut self, hearts: u32, events: &mut Vec<StageEvent>) {
        if !self.alive {
            return;
        }
        self.lives = self.lives.saturating_add(hearts).min(self.tuning.max_lives);
        events.push(StageEvent::PlayerHealed { lives: self.lives });
    }

    // === Power-ups ===

    /// Apply an effect; timed effects restart if already running
    pub fn apply_power_up(
        &mut self,
        effect: PowerUpEffect,
        clock: &Clock,
        events: &mut Vec<StageEvent>,
    ) {
        if !self.alive {
            return;
        }

        match effect {
            PowerUpEffect::SpeedBoost { max_speed, acceleration, deceleration, .. } => {
                self.boost = MovementStats { max_speed, acceleration, deceleration };
            }
            PowerUpEffect::TripleShot { .. } => self.triple_shot = true,
            PowerUpEffect::FullAuto { fire_rate_multiplier, .. } => {
                self.firing_mode = FiringMode::FullAuto;
                self.fire_rate_multiplier = fire_rate_multiplier;
            }
            PowerUpEffect::Health { hearts } => self.heal(hearts, events),
            PowerUpEffect::Shield { .. } => self.shielded = true,
        }

        if let Some(duration) = effect.duration() {
            let kind = effect.kind();
            let task = PlayerTask::PowerUp(kind);
            let restarted = self.tasks.schedule(task, duration, TimeDomain::Scaled, clock);
            if !restarted {
                events.push(StageEvent::PowerUpStarted(kind));
            }
            log::debug!("Power-up {:?} active for {}s (restarted: {})", kind, duration, restarted);
        }
    }

    fn revert_power_up(&mut self, kind: PowerUpKind, events: &mut Vec<StageEvent>) {
        log::debug!("Power-up {:?} expired", kind);
        events.push(StageEvent::PowerUpEnded(kind));
        match kind {
            PowerUpKind::SpeedBoost => self.boost = MovementStats::ONE,
            PowerUpKind::TripleShot => self.triple_shot = false,
            PowerUpKind::FullAuto => {
                self.firing_mode = FiringMode::Single;
                self.fire_rate_multiplier = 1.0;
            }
            PowerUpKind::Health => {}
            PowerUpKind::Shield => self.shielded = false,
        }
    }

    // === Bullet time ===

    /// Slow the world down. Needs a non-empty meter; a no-op while active.
    pub fn activate_bullet_time(&mut self, clock: &mut Clock) -> bool {
        if !self.alive || self.bullet_time_active || self.meter <= 0.0 {
            return false;
        }
        let scale = self.tuning.bullet_time_scale;
        self.bullet_time_active = true;
        clock.set_time_scale(scale);
        self.time_compensation = 1.0 / scale;
        self.saturation.start(BULLET_TIME_SATURATION, self.tuning.saturation_transition);
        log::debug!("Bullet time on (scale {})", scale);
        true
    }

    /// Back to normal speed; a no-op while inactive
    pub fn deactivate_bullet_time(&mut self, clock: &mut Clock) -> bool {
        if !self.bullet_time_active {
            return false;
        }
        self.bullet_time_active = false;
        clock.reset_time_scale();
        self.time_compensation = 1.0;
        self.saturation.start(0.0, self.tuning.saturation_transition);
        log::debug!("Bullet time off");
        true
    }
}
