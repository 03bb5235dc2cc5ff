//! Error types for configuration loading and validation.

use thiserror::Error;

/// Errors that stop a stage from starting.
///
/// Everything else in the simulation (missing clips, absent collaborators,
/// invalid transitions) is logged and skipped instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config '{path}': {details}")]
    Io { path: String, details: String },

    /// JSON parsing failed.
    #[error("Config parse error: {0}")]
    Parse(String),

    /// No enemy archetypes were defined.
    #[error("No enemy archetypes configured")]
    EmptyArchetypes,

    /// A spawn entry references an archetype that does not exist.
    #[error("Spawn entry references unknown archetype '{0}'")]
    UnknownArchetype(String),

    /// A spawn weight is outside [0, 100].
    #[error("Spawn weight {weight} for '{archetype}' is outside [0, 100]")]
    WeightOutOfRange { archetype: String, weight: u32 },

    /// A min/max pair is inverted.
    #[error("Invalid range for {field}: min {min} > max {max}")]
    InvalidRange { field: &'static str, min: f32, max: f32 },

    /// A health pickup restores more hearts than the player can hold.
    #[error("power_ups.hearts_recovered ({hearts}) exceeds player.max_lives ({max_lives})")]
    HeartsExceedLives { hearts: u32, max_lives: u32 },

    /// A duration or rate that must be positive is not.
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
}
