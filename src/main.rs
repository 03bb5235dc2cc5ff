//! Stage Shooter - headless runner
//!
//! Plays a scripted session against logging collaborators.
//!
//! Usage: `stage-shooter [config.json] [seed]`

use glam::Vec2;

use stage_shooter::GameConfig;
use stage_shooter::platform::{
    HeadlessAudio, HeadlessInstantiator, HeadlessUi, InputEvent, MenuChoice, ScriptedInput,
    Services,
};
use stage_shooter::sim::{FlowState, GameFlow};

/// Simulated frame length (60 fps)
const FRAME_DT: f32 = 1.0 / 60.0;
/// Hard stop for the scripted session, in real seconds
const SESSION_LENGTH: f32 = 40.0;

/// Begin, weave while tapping fire, use bullet time once, then leave
fn demo_script() -> ScriptedInput {
    let mut timeline = vec![(0.5, InputEvent::Begin)];

    let mut t = 1.0;
    let mut direction = 1.0;
    while t < 30.0 {
        timeline.push((t, InputEvent::Move(Vec2::new(direction, 0.0))));
        for i in 0..6 {
            let at = t + i as f32 * 0.5;
            timeline.push((at, InputEvent::ShootPressed));
            timeline.push((at + 0.1, InputEvent::ShootReleased));
        }
        direction = -direction;
        t += 3.0;
    }

    timeline.push((8.0, InputEvent::BulletTimePressed));
    timeline.push((10.0, InputEvent::BulletTimeReleased));
    // Only honoured if the player is dead by now
    timeline.push((30.0, InputEvent::Menu(MenuChoice::Restart)));
    timeline.push((34.0, InputEvent::PausePressed));
    timeline.push((35.0, InputEvent::Menu(MenuChoice::Quit)));

    ScriptedInput::new(timeline)
}

fn seed_from_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Stage Shooter (headless) starting...");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match GameConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or_else(seed_from_time);

    let services = Services::none()
        .with_instantiator(HeadlessInstantiator::new())
        .with_audio(HeadlessAudio)
        .with_ui(HeadlessUi::default());

    let mut flow = match GameFlow::new(config, services, seed) {
        Ok(flow) => flow,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut input = demo_script();
    let mut elapsed = 0.0;
    let mut best = 0;
    while elapsed < SESSION_LENGTH && !flow.quit_requested() {
        input.advance(FRAME_DT);
        flow.run_frame(FRAME_DT, &mut input);
        elapsed += FRAME_DT;

        if flow.state() == FlowState::Stage {
            best = best.max(flow.stage().score());
        }
    }

    log::info!(
        "Session over after {:.1}s (best score {}, state {:?})",
        elapsed,
        best,
        flow.state()
    );
}
