//! Weighted-random enemy spawner
//!
//! Weights are normalized by their actual total, so a roster that doesn't sum
//! to 100 still works (it only earns a warning).

use glam::Vec3;
use rand::Rng;

use crate::settings::SpawnerConfig;
use crate::uniform;

/// One weighted archetype
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnEntry {
    pub archetype: String,
    pub weight: u32,
}

/// A spawn the stage should perform
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub archetype: String,
    pub position: Vec3,
}

/// Countdown + weighted pick + population cap
#[derive(Debug, Clone)]
pub struct SpawnPolicy {
    entries: Vec<SpawnEntry>,
    min_interval: f32,
    max_interval: f32,
    spawn_range_min: f32,
    spawn_range_max: f32,
    max_active_enemies: usize,
    /// The spawner's own position; spawns take its y/z
    origin: Vec3,
    countdown: f32,
}

impl SpawnPolicy {
    pub fn new<R: Rng + ?Sized>(config: &SpawnerConfig, origin: Vec3, rng: &mut R) -> Self {
        let entries: Vec<SpawnEntry> = config
            .entries
            .iter()
            .map(|e| SpawnEntry { archetype: e.archetype.clone(), weight: e.weight })
            .collect();

        let mut policy = Self {
            entries,
            min_interval: config.min_interval,
            max_interval: config.max_interval,
            spawn_range_min: config.spawn_range_min,
            spawn_range_max: config.spawn_range_max,
            max_active_enemies: config.max_active_enemies,
            origin,
            countdown: 0.0,
        };

        let total = policy.total_weight();
        if policy.entries.is_empty() {
            log::warn!("Spawner has no entries; it will never spawn");
        } else if total != 100 {
            log::warn!("Total spawn weight is {} (expected 100)", total);
        }

        policy.reset_countdown(rng);
        policy
    }

    /// Sum of all entry weights, recomputed on every call
    pub fn total_weight(&self) -> u32 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    pub fn entries(&self) -> &[SpawnEntry] {
        &self.entries
    }

    pub fn countdown(&self) -> f32 {
        self.countdown
    }

    pub fn max_active_enemies(&self) -> usize {
        self.max_active_enemies
    }

    fn reset_countdown<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.countdown = uniform(rng, self.min_interval, self.max_interval);
    }

    /// Weighted pick: the first entry whose cumulative weight exceeds the draw
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&SpawnEntry> {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }
        let draw = rng.random_range(0..total);
        let mut cumulative = 0;
        self.entries.iter().find(|entry| {
            cumulative += entry.weight;
            draw < cumulative
        })
    }

    /// Advance the countdown; returns a spawn when one is due and the cap allows.
    ///
    /// While capped the countdown stays expired, so the spawn happens as soon
    /// as the population drops.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        live_enemies: usize,
        rng: &mut R,
    ) -> Option<SpawnRequest> {
        self.countdown -= dt;
        if self.countdown > 0.0 || live_enemies >= self.max_active_enemies {
            return None;
        }

        let request = self.choose(rng).map(|entry| SpawnRequest {
            archetype: entry.archetype.clone(),
            position: Vec3::new(
                uniform(rng, self.spawn_range_min, self.spawn_range_max),
                self.origin.y,
                self.origin.z,
            ),
        });
        self.reset_countdown(rng);
        request
    }
}
