//! Simulation clock with a global time scale
//!
//! Real (unscaled) time always advances at wall-clock rate. Scaled time is
//! real time multiplied by the time scale, which bullet time lowers. Only the
//! bullet-time path changes the scale, and stage teardown resets it.

use crate::consts::FIXED_DT;

/// Elapsed time for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Scaled seconds
    pub dt: f32,
    /// Real seconds
    pub unscaled_dt: f32,
}

/// Scaled/unscaled clock
#[derive(Debug, Clone)]
pub struct Clock {
    time_scale: f32,
    scaled_time: f64,
    unscaled_time: f64,
    frame: FrameTime,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self {
            time_scale: 1.0,
            scaled_time: 0.0,
            unscaled_time: 0.0,
            frame: FrameTime { dt: 0.0, unscaled_dt: 0.0 },
        }
    }

    /// Advance by `real_dt` real seconds
    pub fn advance(&mut self, real_dt: f32) -> FrameTime {
        let real_dt = real_dt.max(0.0);
        let dt = real_dt * self.time_scale;
        self.scaled_time += dt as f64;
        self.unscaled_time += real_dt as f64;
        self.frame = FrameTime { dt, unscaled_dt: real_dt };
        self.frame
    }

    /// Time of the last `advance`
    pub fn frame(&self) -> FrameTime {
        self.frame
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Scaled seconds since creation
    pub fn time(&self) -> f64 {
        self.scaled_time
    }

    /// Real seconds since creation
    pub fn unscaled_time(&self) -> f64 {
        self.unscaled_time
    }

    /// Scaled length of one fixed movement step.
    ///
    /// Fixed steps happen at a constant real rate, so their scaled length
    /// shrinks with the time scale.
    pub fn fixed_dt(&self) -> f32 {
        FIXED_DT * self.time_scale
    }

    pub(crate) fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale;
    }

    /// Restore normal speed
    pub(crate) fn reset_time_scale(&mut self) {
        if self.time_scale != 1.0 {
            log::info!("Time scale restored from {}", self.time_scale);
        }
        self.time_scale = 1.0;
    }
}
