//! Audio cues
//!
//! Maps gameplay sound cues to clip ids and forwards them to the audio
//! collaborator. A missing collaborator or an unassigned clip silently skips
//! the cue.

use crate::platform::AudioService;
use crate::settings::AudioClips;

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Title screen loop
    TitleMusic,
    /// Stage loop
    StageMusic,
    /// Played once when the player dies
    GameOver,
    /// Player shot (single bullet)
    SingleShot,
    /// Player shot while triple shot is active
    TripleShot,
    /// Shooter enemy fires
    EnemyShot,
    /// Enemy takes non-lethal damage
    EnemyHit,
    /// Enemy dies (any death path)
    EnemyDeath,
    /// Player loses a life
    PlayerDamage,
    /// Player loses the last life
    PlayerDeath,
    /// Power-up collected
    PowerUp,
}

/// Audio manager for the game
pub struct AudioManager {
    service: Option<Box<dyn AudioService>>,
    clips: AudioClips,
    /// Loop currently playing, so repeated setup doesn't restart it
    music: Option<SoundCue>,
}

impl AudioManager {
    pub fn new(service: Option<Box<dyn AudioService>>, clips: AudioClips) -> Self {
        if service.is_none() {
            log::warn!("No audio service - audio disabled");
        }
        Self { service, clips, music: None }
    }

    /// Loop currently playing
    pub fn music(&self) -> Option<SoundCue> {
        self.music
    }

    fn clip(&self, cue: SoundCue) -> Option<&str> {
        let clip = match cue {
            SoundCue::TitleMusic => &self.clips.title_music,
            SoundCue::StageMusic => &self.clips.stage_music,
            SoundCue::GameOver => &self.clips.game_over,
            SoundCue::SingleShot => &self.clips.single_shot,
            SoundCue::TripleShot => &self.clips.triple_shot,
            SoundCue::EnemyShot => &self.clips.enemy_shot,
            SoundCue::EnemyHit => &self.clips.enemy_hit,
            SoundCue::EnemyDeath => &self.clips.enemy_death,
            SoundCue::PlayerDamage => &self.clips.player_damage,
            SoundCue::PlayerDeath => &self.clips.player_death,
            SoundCue::PowerUp => &self.clips.power_up,
        };
        clip.as_deref()
    }

    /// Play a one-shot cue
    pub fn play(&mut self, cue: SoundCue) {
        let Some(clip) = self.clip(cue).map(str::to_owned) else {
            log::debug!("No clip assigned for {:?}", cue);
            return;
        };
        if let Some(service) = self.service.as_mut() {
            service.play_one_shot(&clip);
        }
    }

    /// Start a music loop; a no-op if that loop is already playing
    pub fn play_music(&mut self, cue: SoundCue) {
        if self.music == Some(cue) {
            return;
        }
        self.stop();
        let Some(clip) = self.clip(cue).map(str::to_owned) else {
            log::debug!("No clip assigned for {:?}", cue);
            return;
        };
        if let Some(service) = self.service.as_mut() {
            service.play_loop(&clip);
        }
        self.music = Some(cue);
    }

    /// Stop everything that is playing
    pub fn stop(&mut self) {
        self.music = None;
        if let Some(service) = self.service.as_mut() {
            service.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl AudioService for Recorder {
        fn play_one_shot(&mut self, clip: &str) {
            self.0.borrow_mut().push(format!("once:{clip}"));
        }
        fn play_loop(&mut self, clip: &str) {
            self.0.borrow_mut().push(format!("loop:{clip}"));
        }
        fn stop(&mut self) {
            self.0.borrow_mut().push("stop".to_string());
        }
    }

    #[test]
    fn test_music_is_idempotent() {
        let rec = Recorder::default();
        let mut audio = AudioManager::new(Some(Box::new(rec.clone())), AudioClips::default());

        audio.play_music(SoundCue::StageMusic);
        audio.play_music(SoundCue::StageMusic);

        let loops = rec.0.borrow().iter().filter(|c| c.starts_with("loop:")).count();
        assert_eq!(loops, 1);
        assert_eq!(audio.music(), Some(SoundCue::StageMusic));
    }

    #[test]
    fn test_missing_clip_is_skipped() {
        let rec = Recorder::default();
        let clips = AudioClips { enemy_hit: None, ..AudioClips::default() };
        let mut audio = AudioManager::new(Some(Box::new(rec.clone())), clips);

        audio.play(SoundCue::EnemyHit);
        audio.play(SoundCue::EnemyDeath);

        assert_eq!(*rec.0.borrow(), vec!["once:sfx/enemy_death".to_string()]);
    }

    #[test]
    fn test_no_service_is_silent() {
        let mut audio = AudioManager::new(None, AudioClips::default());
        audio.play(SoundCue::PowerUp);
        audio.play_music(SoundCue::TitleMusic);
        audio.stop();
        assert_eq!(audio.music(), None);
    }
}
