//! Logging collaborators for running without a presentation layer

use std::collections::HashMap;

use glam::Vec3;

use super::services::{AudioService, EntityHandle, Instantiator, Panel, Parent, UiService};

/// Hands out handles and remembers what is alive
#[derive(Debug, Default)]
pub struct HeadlessInstantiator {
    next: u64,
    live: HashMap<EntityHandle, (String, Parent)>,
    spawned: usize,
}

impl HeadlessInstantiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entities attached under `parent`
    pub fn children(&self, parent: Parent) -> usize {
        self.live.values().filter(|(_, p)| *p == parent).count()
    }

    /// Total spawns since creation
    pub fn spawned(&self) -> usize {
        self.spawned
    }
}

impl Instantiator for HeadlessInstantiator {
    fn spawn(
        &mut self,
        archetype: &str,
        position: Vec3,
        _rotation: f32,
        parent: Parent,
    ) -> Option<EntityHandle> {
        self.next += 1;
        self.spawned += 1;
        let handle = EntityHandle(self.next);
        log::trace!("spawn {} {:?} at {}", archetype, handle, position);
        self.live.insert(handle, (archetype.to_string(), parent));
        Some(handle)
    }

    fn destroy(&mut self, handle: EntityHandle) {
        if self.live.remove(&handle).is_none() {
            log::warn!("Destroying unknown handle {:?}", handle);
        }
    }
}

/// Logs every clip request
#[derive(Debug, Default)]
pub struct HeadlessAudio;

impl AudioService for HeadlessAudio {
    fn play_one_shot(&mut self, clip: &str) {
        log::trace!("audio: one-shot {}", clip);
    }

    fn play_loop(&mut self, clip: &str) {
        log::debug!("audio: loop {}", clip);
    }

    fn stop(&mut self) {
        log::debug!("audio: stop");
    }
}

/// Logs HUD changes (the meter is only traced; it changes every frame)
#[derive(Debug, Default)]
pub struct HeadlessUi {
    hearts: u32,
}

impl UiService for HeadlessUi {
    fn set_score_text(&mut self, text: &str) {
        log::info!("{}", text);
    }

    fn set_heart_fill_count(&mut self, filled: u32) {
        if filled != self.hearts {
            log::info!("Hearts: {}", filled);
        }
        self.hearts = filled;
    }

    fn set_meter_value(&mut self, value: f32) {
        log::trace!("Bullet time meter: {:.2}", value);
    }

    fn show_panel(&mut self, panel: Panel, visible: bool) {
        log::debug!("Panel {:?} visible={}", panel, visible);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiator_tracks_children() {
        let mut inst = HeadlessInstantiator::new();
        let a = inst.spawn("player", Vec3::ZERO, 0.0, Parent::Stage).unwrap();
        inst.spawn("title", Vec3::ZERO, 0.0, Parent::Root);
        assert_eq!(inst.children(Parent::Stage), 1);

        inst.destroy(a);
        inst.destroy(a);
        assert_eq!(inst.children(Parent::Stage), 0);
        assert_eq!(inst.spawned(), 2);
    }
}
