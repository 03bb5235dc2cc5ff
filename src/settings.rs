//! Game configuration
//!
//! Every tunable the simulation reads lives here. Loaded from JSON, with
//! defaults for anything the file leaves out. `validate` is run before a
//! stage can start; soft problems are only logged.

use std::collections::HashSet;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::{PLAYER_SPAWN, SPAWNER_POSITION};
use crate::error::ConfigError;
use crate::sim::powerup::{PowerUpEffect, PowerUpKind};

/// Complete game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerTuning,
    pub bullets: BulletTuning,
    pub spawner: SpawnerConfig,
    pub archetypes: Vec<EnemyArchetype>,
    pub power_ups: PowerUpTuning,
    pub stage: StageLayout,
    pub audio: AudioClips,
}

/// Player ship tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Instantiator archetype for the ship
    pub archetype: String,

    // === Movement ===
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    /// Distance kept from the boundary boxes
    pub boundary_offset: f32,

    // === Shooting ===
    /// Minimum seconds between shots
    pub fire_rate: f32,

    // === Health ===
    pub max_lives: u32,
    pub invincibility_duration: f32,
    /// Time per flash colour while invincible
    pub flash_duration: f32,

    // === Bullet time ===
    /// Meter capacity in real seconds
    pub bullet_time_duration: f32,
    /// Real seconds to refill an empty meter
    pub bullet_time_cooldown: f32,
    /// Global time scale while active
    pub bullet_time_scale: f32,
    /// Length of the saturation fade (real seconds)
    pub saturation_transition: f32,

    /// Effect archetype spawned where the ship is destroyed
    pub death_effect: Option<String>,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            archetype: "player".to_string(),

            max_speed: 10.0,
            acceleration: 15.0,
            deceleration: 20.0,
            boundary_offset: 0.5,

            fire_rate: 0.5,

            max_lives: 5,
            invincibility_duration: 1.5,
            flash_duration: 0.1,

            bullet_time_duration: 5.0,
            bullet_time_cooldown: 10.0,
            bullet_time_scale: 0.5,
            saturation_transition: 0.5,

            death_effect: Some("fx.player_explosion".to_string()),
        }
    }
}

/// Projectile tuning (shared by both factions)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletTuning {
    pub speed: f32,
    pub lifetime: f32,
    pub player_archetype: String,
    pub enemy_archetype: String,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            speed: 10.0,
            lifetime: 2.0,
            player_archetype: "bullet.player".to_string(),
            enemy_archetype: "bullet.enemy".to_string(),
        }
    }
}

/// One weighted spawn entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntryConfig {
    pub archetype: String,
    pub weight: u32,
}

/// Enemy spawner parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub archetype: String,
    pub entries: Vec<SpawnEntryConfig>,
    pub min_interval: f32,
    pub max_interval: f32,
    pub spawn_range_min: f32,
    pub spawn_range_max: f32,
    pub max_active_enemies: usize,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            archetype: "spawner".to_string(),
            entries: vec![
                SpawnEntryConfig { archetype: "enemy.straight".to_string(), weight: 60 },
                SpawnEntryConfig { archetype: "enemy.kamikaze".to_string(), weight: 25 },
                SpawnEntryConfig { archetype: "enemy.shooter".to_string(), weight: 15 },
            ],
            min_interval: 2.0,
            max_interval: 5.0,
            spawn_range_min: -7.0,
            spawn_range_max: 7.0,
            max_active_enemies: 10,
        }
    }
}

/// Movement strategy of an enemy archetype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MovementConfig {
    /// Constant downward motion
    Straight { speed: f32 },
    /// Aims at the player once at spawn
    Kamikaze { speed: f32 },
    /// Drifts down, dodges sideways and fires aimed shots
    Shooter {
        speed: f32,
        shoot_interval: f32,
        /// Largest sideways maneuver speed
        dodge: f32,
        /// Sideways velocity change per second
        smoothing: f32,
        start_wait: (f32, f32),
        maneuver_time: (f32, f32),
        maneuver_wait: (f32, f32),
    },
}

/// Named enemy template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyArchetype {
    pub id: String,
    pub health: f32,
    #[serde(default = "default_enemy_lifetime")]
    pub lifetime: f32,
    pub score_value: u32,
    /// Percent chance (0-100) of dropping a power-up on death
    #[serde(default = "default_drop_chance")]
    pub drop_chance: u32,
    #[serde(default)]
    pub drop_table: Vec<PowerUpKind>,
    pub movement: MovementConfig,
    #[serde(default)]
    pub hit_effect: Option<String>,
    #[serde(default)]
    pub death_effect: Option<String>,
}

fn default_enemy_lifetime() -> f32 {
    20.0
}

fn default_drop_chance() -> u32 {
    20
}

impl EnemyArchetype {
    fn with_movement(id: &str, health: f32, score_value: u32, movement: MovementConfig) -> Self {
        Self {
            id: id.to_string(),
            health,
            lifetime: default_enemy_lifetime(),
            score_value,
            drop_chance: default_drop_chance(),
            drop_table: PowerUpKind::ALL.to_vec(),
            movement,
            hit_effect: Some("fx.hit".to_string()),
            death_effect: Some("fx.explosion".to_string()),
        }
    }
}

/// Default roster: a drifter, a kamikaze and a shooter
pub fn default_archetypes() -> Vec<EnemyArchetype> {
    vec![
        EnemyArchetype::with_movement(
            "enemy.straight",
            1.0,
            100,
            MovementConfig::Straight { speed: 3.0 },
        ),
        EnemyArchetype::with_movement(
            "enemy.kamikaze",
            1.0,
            150,
            MovementConfig::Kamikaze { speed: 6.0 },
        ),
        EnemyArchetype::with_movement(
            "enemy.shooter",
            3.0,
            300,
            MovementConfig::Shooter {
                speed: 1.5,
                shoot_interval: 1.5,
                dodge: 5.0,
                smoothing: 2.0,
                start_wait: (0.5, 1.0),
                maneuver_time: (1.0, 2.0),
                maneuver_wait: (1.0, 2.0),
            },
        ),
    ]
}

/// Power-up tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpTuning {
    /// Seconds a timed power-up stays active
    pub duration: f32,
    /// Fall speed of a pickup
    pub move_speed: f32,
    /// Seconds before an uncollected pickup disappears
    pub lifetime: f32,
    pub speed_multiplier: f32,
    pub acceleration_multiplier: f32,
    pub deceleration_multiplier: f32,
    /// Applied to the fire rate while full-auto is active
    pub fire_rate_multiplier: f32,
    pub hearts_recovered: u32,
}

impl Default for PowerUpTuning {
    fn default() -> Self {
        Self {
            duration: 5.0,
            move_speed: 5.0,
            lifetime: 10.0,
            speed_multiplier: 1.5,
            acceleration_multiplier: 1.5,
            deceleration_multiplier: 1.5,
            fire_rate_multiplier: 0.5,
            hearts_recovered: 1,
        }
    }
}

impl PowerUpTuning {
    /// Effect applied when a pickup of `kind` is collected
    pub fn effect(&self, kind: PowerUpKind) -> PowerUpEffect {
        match kind {
            PowerUpKind::SpeedBoost => PowerUpEffect::SpeedBoost {
                duration: self.duration,
                max_speed: self.speed_multiplier,
                acceleration: self.acceleration_multiplier,
                deceleration: self.deceleration_multiplier,
            },
            PowerUpKind::TripleShot => PowerUpEffect::TripleShot { duration: self.duration },
            PowerUpKind::FullAuto => PowerUpEffect::FullAuto {
                duration: self.duration,
                fire_rate_multiplier: self.fire_rate_multiplier,
            },
            PowerUpKind::Health => PowerUpEffect::Health { hearts: self.hearts_recovered },
            PowerUpKind::Shield => PowerUpEffect::Shield { duration: self.duration },
        }
    }
}

/// Axis-aligned box on the stage plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }
}

/// The four boundary colliders framing the play field
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Boundary {
    pub top: Aabb,
    pub bottom: Aabb,
    pub left: Aabb,
    pub right: Aabb,
}

impl Default for Boundary {
    fn default() -> Self {
        Self {
            top: Aabb::new(Vec2::new(-10.0, 6.0), Vec2::new(10.0, 7.0)),
            bottom: Aabb::new(Vec2::new(-10.0, -7.0), Vec2::new(10.0, -6.0)),
            left: Aabb::new(Vec2::new(-10.0, -7.0), Vec2::new(-9.0, 7.0)),
            right: Aabb::new(Vec2::new(9.0, -7.0), Vec2::new(10.0, 7.0)),
        }
    }
}

/// Background scroll parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PannerConfig {
    pub pan_speed: f32,
    /// Speed lost per second once stopped
    pub deceleration: f32,
    /// Offset wraps at this length
    pub tile_size: f32,
}

impl Default for PannerConfig {
    fn default() -> Self {
        Self { pan_speed: 2.0, deceleration: 0.5, tile_size: 20.0 }
    }
}

/// Camera shake on player damage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeConfig {
    pub duration: f32,
    pub magnitude: f32,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self { duration: 0.2, magnitude: 0.3 }
    }
}

/// Stage layout and presentation glue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageLayout {
    pub boundary: Boundary,
    pub player_spawn: Vec3,
    pub spawner_position: Vec3,
    /// Distance past the boundary at which bullets and enemies are cleaned up
    pub cleaner_margin: f32,
    /// Lifetime of fire-and-forget effects
    pub effect_lifetime: f32,
    pub panner: PannerConfig,
    pub shake: ShakeConfig,
}

impl Default for StageLayout {
    fn default() -> Self {
        Self {
            boundary: Boundary::default(),
            player_spawn: PLAYER_SPAWN,
            spawner_position: SPAWNER_POSITION,
            cleaner_margin: 2.0,
            effect_lifetime: 1.0,
            panner: PannerConfig::default(),
            shake: ShakeConfig::default(),
        }
    }
}

/// Clip ids handed to the audio collaborator; `None` disables the cue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioClips {
    pub title_music: Option<String>,
    pub stage_music: Option<String>,
    pub game_over: Option<String>,
    pub single_shot: Option<String>,
    pub triple_shot: Option<String>,
    pub enemy_shot: Option<String>,
    pub enemy_hit: Option<String>,
    pub enemy_death: Option<String>,
    pub player_damage: Option<String>,
    pub player_death: Option<String>,
    pub power_up: Option<String>,
}

impl Default for AudioClips {
    fn default() -> Self {
        let clip = |name: &str| Some(name.to_string());
        Self {
            title_music: clip("music/title"),
            stage_music: clip("music/stage"),
            game_over: clip("music/game_over"),
            single_shot: clip("sfx/shot_single"),
            triple_shot: clip("sfx/shot_auto"),
            enemy_shot: clip("sfx/enemy_shot"),
            enemy_hit: clip("sfx/enemy_hit"),
            enemy_death: clip("sfx/enemy_death"),
            player_damage: clip("sfx/player_damage"),
            player_death: clip("sfx/player_death"),
            power_up: clip("sfx/power_up"),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            bullets: BulletTuning::default(),
            spawner: SpawnerConfig::default(),
            archetypes: default_archetypes(),
            power_ups: PowerUpTuning::default(),
            stage: StageLayout::default(),
            audio: AudioClips::default(),
        }
    }
}

impl GameConfig {
    /// Parse a JSON config; missing sections fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Look up an archetype by id
    pub fn archetype(&self, id: &str) -> Option<&EnemyArchetype> {
        self.archetypes.iter().find(|a| a.id == id)
    }

    /// Check the configuration before any stage starts.
    ///
    /// A spawn weight total other than 100 is only warned about; spawning
    /// normalizes by the actual total.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.archetypes.is_empty() {
            return Err(ConfigError::EmptyArchetypes);
        }

        let known: HashSet<&str> = self.archetypes.iter().map(|a| a.id.as_str()).collect();
        for entry in &self.spawner.entries {
            if !known.contains(entry.archetype.as_str()) {
                return Err(ConfigError::UnknownArchetype(entry.archetype.clone()));
            }
            if entry.weight > 100 {
                return Err(ConfigError::WeightOutOfRange {
                    archetype: entry.archetype.clone(),
                    weight: entry.weight,
                });
            }
        }

        let total: u32 = self.spawner.entries.iter().map(|e| e.weight).sum();
        if total != 100 {
            log::warn!("Total spawn weight is {} (expected 100); normalizing", total);
        }

        check_range("spawner.interval", self.spawner.min_interval, self.spawner.max_interval)?;
        check_range(
            "spawner.spawn_range",
            self.spawner.spawn_range_min,
            self.spawner.spawn_range_max,
        )?;

        let p = &self.player;
        check_positive("player.flash_duration", p.flash_duration)?;
        check_positive("player.bullet_time_duration", p.bullet_time_duration)?;
        check_positive("player.bullet_time_cooldown", p.bullet_time_cooldown)?;
        check_positive("player.bullet_time_scale", p.bullet_time_scale)?;
        check_positive("player.max_lives", p.max_lives as f32)?;
        if self.power_ups.hearts_recovered > p.max_lives {
            return Err(ConfigError::HeartsExceedLives {
                hearts: self.power_ups.hearts_recovered,
                max_lives: p.max_lives,
            });
        }
        check_positive("power_ups.duration", self.power_ups.duration)?;
        check_positive("bullets.lifetime", self.bullets.lifetime)?;

        for archetype in &self.archetypes {
            if archetype.drop_chance > 100 {
                log::warn!(
                    "Drop chance {} for '{}' exceeds 100; every death drops",
                    archetype.drop_chance,
                    archetype.id
                );
            }
            if let MovementConfig::Shooter {
                shoot_interval,
                start_wait,
                maneuver_time,
                maneuver_wait,
                ..
            } = &archetype.movement
            {
                check_positive("shooter.shoot_interval", *shoot_interval)?;
                check_range("shooter.start_wait", start_wait.0, start_wait.1)?;
                check_range("shooter.maneuver_time", maneuver_time.0, maneuver_time.1)?;
                check_range("shooter.maneuver_wait", maneuver_wait.0, maneuver_wait.1)?;
            }
        }

        Ok(())
    }
}

fn check_range(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvalidRange { field, min, max });
    }
    Ok(())
}

fn check_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(value > 0.0) {
        return Err(ConfigError::NonPositive { field, value });
    }
    Ok(())
}
