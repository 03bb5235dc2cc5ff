//! Scheduled task records
//!
//! Timed behaviours (invincibility windows, power-up reverts) are stored as
//! `{key, start, duration}` records and polled every tick. Scheduling a key
//! that is already pending restarts it; cancelling a key that is not pending
//! does nothing.

use super::clock::Clock;

/// Which clock a task measures against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeDomain {
    /// Slowed down by bullet time
    Scaled,
    /// Real time
    Unscaled,
}

impl TimeDomain {
    fn now(self, clock: &Clock) -> f64 {
        match self {
            TimeDomain::Scaled => clock.time(),
            TimeDomain::Unscaled => clock.unscaled_time(),
        }
    }
}

/// One pending task
#[derive(Debug, Clone)]
pub struct ScheduledTask<K> {
    pub key: K,
    pub start: f64,
    pub duration: f32,
    pub domain: TimeDomain,
}

impl<K> ScheduledTask<K> {
    pub fn elapsed(&self, clock: &Clock) -> f32 {
        (self.domain.now(clock) - self.start).max(0.0) as f32
    }

    fn is_due(&self, clock: &Clock) -> bool {
        self.domain.now(clock) - self.start >= self.duration as f64
    }
}

/// Keyed task list
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    tasks: Vec<ScheduledTask<K>>,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self { tasks: Vec::new() }
    }
}

impl<K: Copy + PartialEq + std::fmt::Debug> Scheduler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to complete after `duration`.
    ///
    /// Returns true if a pending task with the same key was replaced.
    pub fn schedule(&mut self, key: K, duration: f32, domain: TimeDomain, clock: &Clock) -> bool {
        let replaced = self.cancel(key);
        if replaced {
            log::debug!("Restarting task {:?}", key);
        }
        self.tasks.push(ScheduledTask { key, start: domain.now(clock), duration, domain });
        replaced
    }

    /// Remove a pending task; returns false if nothing was pending
    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.key != key);
        self.tasks.len() != before
    }

    pub fn is_running(&self, key: K) -> bool {
        self.tasks.iter().any(|t| t.key == key)
    }

    /// Seconds since `key` was (re)scheduled
    pub fn elapsed(&self, key: K, clock: &Clock) -> Option<f32> {
        self.tasks.iter().find(|t| t.key == key).map(|t| t.elapsed(clock))
    }

    /// Seconds until `key` completes
    pub fn remaining(&self, key: K, clock: &Clock) -> Option<f32> {
        self.tasks
            .iter()
            .find(|t| t.key == key)
            .map(|t| (t.duration - t.elapsed(clock)).max(0.0))
    }

    /// Remove and return every task that has completed, oldest first
    pub fn poll(&mut self, clock: &Clock) -> Vec<K> {
        let mut due = Vec::new();
        self.tasks.retain(|t| {
            if t.is_due(clock) {
                due.push(t.key);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
