//! Presentation-facing state the stage drives: background scroll, camera
//! shake and the bullet-time saturation fade.
//!
//! None of this affects gameplay. The renderer reads the values.

use glam::Vec2;
use rand::Rng;

use crate::settings::{PannerConfig, ShakeConfig};

/// Scrolling background offset
#[derive(Debug, Clone)]
pub struct BackgroundPanner {
    pan_speed: f32,
    deceleration: f32,
    tile_size: f32,
    current_speed: f32,
    offset: f32,
    active: bool,
}

impl BackgroundPanner {
    pub fn new(config: &PannerConfig) -> Self {
        Self {
            pan_speed: config.pan_speed,
            deceleration: config.deceleration,
            tile_size: config.tile_size,
            current_speed: config.pan_speed,
            offset: 0.0,
            active: true,
        }
    }

    /// Reactivating restores full speed; deactivating lets it coast to a stop
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if active {
            self.current_speed = self.pan_speed;
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if !self.active && self.current_speed > 0.0 {
            self.current_speed = (self.current_speed - self.deceleration * dt).max(0.0);
        }
        self.offset += self.current_speed * dt;
    }

    pub fn speed(&self) -> f32 {
        self.current_speed
    }

    /// Offset wrapped into `[0, tile_size)`
    pub fn offset(&self) -> f32 {
        if self.tile_size > 0.0 {
            self.offset.rem_euclid(self.tile_size)
        } else {
            self.offset
        }
    }
}

/// Random camera jitter after the player is hit
#[derive(Debug, Clone, Default)]
pub struct CameraShake {
    remaining: f32,
    magnitude: f32,
    offset: Vec2,
}

impl CameraShake {
    pub fn trigger(&mut self, config: &ShakeConfig) {
        self.remaining = config.duration;
        self.magnitude = config.magnitude;
    }

    /// Offset returns to zero once the shake ends
    pub fn tick<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) {
        if self.remaining <= 0.0 {
            self.offset = Vec2::ZERO;
            return;
        }
        self.remaining -= dt;
        self.offset = if self.remaining > 0.0 {
            Vec2::new(
                rng.random_range(-1.0..=1.0) * self.magnitude,
                rng.random_range(-1.0..=1.0) * self.magnitude,
            )
        } else {
            Vec2::ZERO
        };
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }
}

/// Linear fade of the post-process saturation, advanced in real time
#[derive(Debug, Clone, Default)]
pub struct SaturationFade {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
    value: f32,
}

impl SaturationFade {
    /// Start fading from the current value toward `target`
    pub fn start(&mut self, target: f32, duration: f32) {
        self.from = self.value;
        self.to = target;
        self.elapsed = 0.0;
        self.duration = duration;
        if duration <= 0.0 {
            self.value = target;
        }
    }

    pub fn tick(&mut self, unscaled_dt: f32) {
        if self.value == self.to {
            return;
        }
        self.elapsed += unscaled_dt;
        let blend = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.value = if blend >= 1.0 { self.to } else { self.from + (self.to - self.from) * blend };
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}
