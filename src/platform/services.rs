//! Collaborator traits and the `Services` bundle the simulation calls through.
//!
//! Every collaborator is optional. A missing service turns the call into a
//! no-op, so a stage can run headless or with only part of a presentation layer.

use glam::Vec3;

use crate::sim::PowerUpKind;

/// Opaque handle to something the instantiator created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle(pub u64);

/// Where a spawned entity is attached in the presentation hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent {
    /// The stage container; everything under it is destroyed on teardown
    Stage,
    /// Top level (not owned by a stage session)
    Root,
}

/// HUD panels the flow shows and hides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Title,
    MainMenu,
    RestartMenu,
    Health,
    PowerUp,
    /// Per-kind icon shown while a timed power-up runs
    PowerUpIndicator(PowerUpKind),
}

/// Creates and destroys presentation entities (prefab instantiation)
pub trait Instantiator {
    /// Returns `None` when the archetype has no presentation
    fn spawn(
        &mut self,
        archetype: &str,
        position: Vec3,
        rotation: f32,
        parent: Parent,
    ) -> Option<EntityHandle>;

    fn destroy(&mut self, handle: EntityHandle);
}

/// Plays clips by id
pub trait AudioService {
    fn play_one_shot(&mut self, clip: &str);
    fn play_loop(&mut self, clip: &str);
    fn stop(&mut self);
}

/// HUD surface
pub trait UiService {
    fn set_score_text(&mut self, text: &str);
    fn set_heart_fill_count(&mut self, filled: u32);
    fn set_meter_value(&mut self, value: f32);
    fn show_panel(&mut self, panel: Panel, visible: bool);
    /// Post-process saturation (bullet-time desaturation)
    fn set_saturation(&mut self, _value: f32) {}
}

/// Injected collaborators
#[derive(Default)]
pub struct Services {
    pub instantiator: Option<Box<dyn Instantiator>>,
    pub audio: Option<Box<dyn AudioService>>,
    pub ui: Option<Box<dyn UiService>>,
}

impl Services {
    /// No collaborators at all (pure simulation)
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_instantiator(mut self, instantiator: impl Instantiator + 'static) -> Self {
        self.instantiator = Some(Box::new(instantiator));
        self
    }

    pub fn with_audio(mut self, audio: impl AudioService + 'static) -> Self {
        self.audio = Some(Box::new(audio));
        self
    }

    pub fn with_ui(mut self, ui: impl UiService + 'static) -> Self {
        self.ui = Some(Box::new(ui));
        self
    }

    /// Spawn a presentation entity, if an instantiator is present
    pub fn spawn(
        &mut self,
        archetype: &str,
        position: Vec3,
        rotation: f32,
        parent: Parent,
    ) -> Option<EntityHandle> {
        let instantiator = self.instantiator.as_mut()?;
        let handle = instantiator.spawn(archetype, position, rotation, parent);
        if handle.is_none() {
            log::warn!("Instantiator has no archetype '{}'", archetype);
        }
        handle
    }

    /// Destroy a presentation entity; `None` handles are ignored
    pub fn destroy(&mut self, handle: Option<EntityHandle>) {
        if let (Some(instantiator), Some(handle)) = (self.instantiator.as_mut(), handle) {
            instantiator.destroy(handle);
        }
    }

    /// Run `f` against the UI collaborator, if present
    pub fn ui(&mut self, f: impl FnOnce(&mut dyn UiService)) {
        if let Some(ui) = self.ui.as_deref_mut() {
            f(ui);
        }
    }
}
