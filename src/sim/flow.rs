//! Title ↔ stage screen flow and the frame loop
//!
//! `GameFlow` is the root object a host drives: it owns the clock and the
//! collaborators, routes input, and runs the fixed-step accumulator.

use std::sync::Arc;

use super::clock::Clock;
use super::collision::CollisionEvent;
use super::stage::{StageContext, StageController};
use crate::audio::{AudioManager, SoundCue};
use crate::consts::{FIXED_DT, MAX_FRAME_DT, MAX_SUBSTEPS};
use crate::error::ConfigError;
use crate::platform::{InputEvent, InputService, MenuChoice, Panel, Services};
use crate::settings::GameConfig;

/// Which screen is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Title,
    Stage,
}

/// A transition `handle_event` performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowTransition {
    TitleToStage,
    StageToTitle,
    /// Stage torn down and set up again without visiting the title
    Restart,
}

/// Title screen presentation
#[derive(Debug, Default)]
pub struct TitleScreen {
    active: bool,
}

impl TitleScreen {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn setup(&mut self, services: &mut Services, audio: &mut AudioManager) {
        if self.active {
            return;
        }
        self.active = true;
        services.ui(|ui| {
            ui.show_panel(Panel::Title, true);
            ui.show_panel(Panel::MainMenu, true);
        });
        audio.play_music(SoundCue::TitleMusic);
    }

    pub fn cleanup(&mut self, services: &mut Services, audio: &mut AudioManager) {
        if !self.active {
            return;
        }
        self.active = false;
        services.ui(|ui| {
            ui.show_panel(Panel::Title, false);
            ui.show_panel(Panel::MainMenu, false);
        });
        audio.stop();
    }
}

/// Root state machine
pub struct GameFlow {
    state: FlowState,
    clock: Clock,
    services: Services,
    audio: AudioManager,
    title: TitleScreen,
    stage: StageController,
    accumulator: f32,
    quit_requested: bool,
}

impl GameFlow {
    /// Validate the configuration and open on the title screen
    pub fn new(config: GameConfig, mut services: Services, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let audio = AudioManager::new(services.audio.take(), config.audio.clone());
        let mut flow = Self {
            state: FlowState::Title,
            clock: Clock::new(),
            services,
            audio,
            title: TitleScreen::default(),
            stage: StageController::new(Arc::new(config), seed),
            accumulator: 0.0,
            quit_requested: false,
        };
        flow.title.setup(&mut flow.services, &mut flow.audio);
        log::info!("Game flow initialized with seed {}", seed);
        Ok(flow)
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn stage(&self) -> &StageController {
        &self.stage
    }

    pub fn title(&self) -> &TitleScreen {
        &self.title
    }

    pub fn audio(&self) -> &AudioManager {
        &self.audio
    }

    /// Set by `Quit` on the title screen; the host should exit its loop
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    fn split(&mut self) -> (&mut StageController, StageContext<'_>) {
        let ctx = StageContext {
            clock: &mut self.clock,
            services: &mut self.services,
            audio: &mut self.audio,
        };
        (&mut self.stage, ctx)
    }

    fn enter_stage(&mut self) -> FlowTransition {
        log::info!("Title -> Stage");
        self.title.cleanup(&mut self.services, &mut self.audio);
        let (stage, mut ctx) = self.split();
        stage.setup(&mut ctx);
        self.state = FlowState::Stage;
        self.accumulator = 0.0;
        FlowTransition::TitleToStage
    }

    fn exit_to_title(&mut self) -> FlowTransition {
        log::info!("Stage -> Title");
        let (stage, mut ctx) = self.split();
        stage.cleanup(&mut ctx);
        self.title.setup(&mut self.services, &mut self.audio);
        self.state = FlowState::Title;
        FlowTransition::StageToTitle
    }

    fn restart_stage(&mut self) -> FlowTransition {
        log::info!("Stage -> Stage (restart)");
        let (stage, mut ctx) = self.split();
        stage.restart(&mut ctx);
        self.accumulator = 0.0;
        FlowTransition::Restart
    }

    /// Route one input event. Returns the transition it caused, if any.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<FlowTransition> {
        match (self.state, event) {
            (FlowState::Title, InputEvent::Begin) => Some(self.enter_stage()),
            (FlowState::Title, InputEvent::Menu(MenuChoice::Quit)) => {
                log::info!("Quit requested");
                self.quit_requested = true;
                None
            }
            (FlowState::Title, _) => None,

            (FlowState::Stage, InputEvent::PausePressed) => Some(self.exit_to_title()),
            (FlowState::Stage, InputEvent::Menu(choice)) => {
                if !self.stage.awaiting_choice() {
                    log::debug!("Ignoring {:?} while the stage is running", choice);
                    return None;
                }
                match choice {
                    MenuChoice::Restart => Some(self.restart_stage()),
                    MenuChoice::MainMenu => Some(self.exit_to_title()),
                    MenuChoice::Quit => None,
                }
            }
            (FlowState::Stage, InputEvent::Begin) => None,
            (FlowState::Stage, event) => {
                let (stage, mut ctx) = self.split();
                stage.handle_input(event, &mut ctx);
                None
            }
        }
    }

    /// Advance by `real_dt` real seconds: one frame tick, then fixed steps
    pub fn update(&mut self, real_dt: f32) {
        let real_dt = real_dt.clamp(0.0, MAX_FRAME_DT);
        let frame = self.clock.advance(real_dt);

        if self.state != FlowState::Stage {
            return;
        }

        let (stage, mut ctx) = self.split();
        stage.update(frame, &mut ctx);

        self.accumulator += real_dt;
        let mut substeps = 0;
        while self.accumulator >= FIXED_DT && substeps < MAX_SUBSTEPS {
            let (stage, mut ctx) = self.split();
            stage.fixed_update(&mut ctx);
            self.accumulator -= FIXED_DT;
            substeps += 1;
        }
    }

    /// Poll input, then advance the simulation
    pub fn run_frame(&mut self, real_dt: f32, input: &mut dyn InputService) {
        for event in input.poll_events() {
            self.handle_event(event);
        }
        self.update(real_dt);
    }

    /// Feed a contact detected by a host physics engine
    pub fn report_collision(&mut self, contact: CollisionEvent) {
        if self.state == FlowState::Stage {
            let (stage, mut ctx) = self.split();
            stage.handle_collision(contact, &mut ctx);
        }
    }
}
