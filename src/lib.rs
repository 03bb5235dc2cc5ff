//! Stage Shooter - game-flow and gameplay core for a vertical arcade shooter
//!
//! Core modules:
//! - `sim`: Simulation (clock, scheduler, spawning, entities, player, stage, flow)
//! - `platform`: Collaborator interfaces (instantiation, audio, UI, input)
//! - `audio`: Sound cue table on top of the audio collaborator
//! - `settings`: Data-driven game configuration
//! - `error`: Configuration errors surfaced before a stage starts

pub mod audio;
pub mod error;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::GameConfig;

use glam::Vec3;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    use glam::Vec3;

    /// Fixed movement timestep in real seconds (scaled by the clock's time scale)
    pub const FIXED_DT: f32 = 0.02;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest real frame delta accepted by the flow loop
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Where the player ship appears on stage setup
    pub const PLAYER_SPAWN: Vec3 = Vec3::new(0.0, -4.0, 0.0);
    /// Where the enemy spawner sits (enemies enter from its y/z)
    pub const SPAWNER_POSITION: Vec3 = Vec3::new(0.0, 5.5, 0.0);
    /// Muzzle offset from the player position
    pub const MUZZLE_OFFSET: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    /// Lateral bullet offsets used by triple shot
    pub const TRIPLE_SHOT_LEFT: Vec3 = Vec3::new(0.7, -1.5, 0.0);
    pub const TRIPLE_SHOT_RIGHT: Vec3 = Vec3::new(-0.7, -1.5, 0.0);

    /// Damage dealt by a single bullet
    pub const BULLET_DAMAGE: f32 = 1.0;

    /// Collision radii for the overlap detector
    pub const PLAYER_RADIUS: f32 = 0.5;
    pub const ENEMY_RADIUS: f32 = 0.6;
    pub const BULLET_RADIUS: f32 = 0.15;
    pub const PICKUP_RADIUS: f32 = 0.4;

    /// Saturation reached while bullet time is active
    pub const BULLET_TIME_SATURATION: f32 = -100.0;
}

/// Uniform float in `[lo, hi]`; tolerates `lo == hi` and swapped bounds
#[inline]
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if lo == hi {
        return lo;
    }
    rng.random_range(lo..=hi)
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

/// Wrap `x` to the opposite edge once it leaves `[min, max]`
#[inline]
pub fn wrap_horizontal(x: f32, min: f32, max: f32) -> f32 {
    if x < min {
        max
    } else if x > max {
        min
    } else {
        x
    }
}

/// Unit direction from `from` to `to`, or `None` when they coincide
#[inline]
pub fn direction_to(from: Vec3, to: Vec3) -> Option<Vec3> {
    let d = to - from;
    (d.length_squared() > f32::EPSILON).then(|| d.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_wrap_horizontal() {
        assert_eq!(wrap_horizontal(-9.0, -8.0, 8.0), 8.0);
        assert_eq!(wrap_horizontal(9.0, -8.0, 8.0), -8.0);
        assert_eq!(wrap_horizontal(3.0, -8.0, 8.0), 3.0);
    }

    #[test]
    fn test_move_towards_clamps() {
        assert_eq!(move_towards(0.0, 10.0, 2.0), 2.0);
        assert_eq!(move_towards(0.0, -10.0, 2.0), -2.0);
        assert_eq!(move_towards(9.5, 10.0, 2.0), 10.0);
    }

    #[test]
    fn test_uniform_degenerate_range() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(uniform(&mut rng, 2.0, 2.0), 2.0);
        let v = uniform(&mut rng, 5.0, 1.0);
        assert!((1.0..=5.0).contains(&v));
    }
}
