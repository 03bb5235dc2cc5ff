//! Screen-flow tests driving `GameFlow` with recording collaborators

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, Vec3};

use stage_shooter::GameConfig;
use stage_shooter::platform::{
    AudioService, EntityHandle, InputEvent, Instantiator, MenuChoice, Panel, Parent,
    ScriptedInput, Services, UiService,
};
use stage_shooter::settings::SpawnEntryConfig;
use stage_shooter::sim::{FlowState, FlowTransition, GameFlow};

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Spawn { archetype: String, stage_children_before: usize },
    Destroy,
}

#[derive(Default)]
struct Recorder {
    next: u64,
    live: Vec<(EntityHandle, Parent)>,
    ops: Vec<Op>,
    audio: Vec<String>,
    panels: Vec<(Panel, bool)>,
    scores: Vec<String>,
}

impl Recorder {
    fn stage_children(&self) -> usize {
        self.live.iter().filter(|(_, p)| *p == Parent::Stage).count()
    }
}

#[derive(Clone, Default)]
struct Shared(Rc<RefCell<Recorder>>);

impl Instantiator for Shared {
    fn spawn(&mut self, archetype: &str, _: Vec3, _: f32, parent: Parent) -> Option<EntityHandle> {
        let mut rec = self.0.borrow_mut();
        let stage_children_before = rec.stage_children();
        rec.ops.push(Op::Spawn { archetype: archetype.to_string(), stage_children_before });
        rec.next += 1;
        let handle = EntityHandle(rec.next);
        rec.live.push((handle, parent));
        Some(handle)
    }

    fn destroy(&mut self, handle: EntityHandle) {
        let mut rec = self.0.borrow_mut();
        rec.ops.push(Op::Destroy);
        rec.live.retain(|(h, _)| *h != handle);
    }
}

impl AudioService for Shared {
    fn play_one_shot(&mut self, clip: &str) {
        self.0.borrow_mut().audio.push(format!("shot:{clip}"));
    }
    fn play_loop(&mut self, clip: &str) {
        self.0.borrow_mut().audio.push(format!("loop:{clip}"));
    }
    fn stop(&mut self) {
        self.0.borrow_mut().audio.push("stop".to_string());
    }
}

impl UiService for Shared {
    fn set_score_text(&mut self, text: &str) {
        self.0.borrow_mut().scores.push(text.to_string());
    }
    fn set_heart_fill_count(&mut self, _: u32) {}
    fn set_meter_value(&mut self, _: f32) {}
    fn show_panel(&mut self, panel: Panel, visible: bool) {
        self.0.borrow_mut().panels.push((panel, visible));
    }
}

fn start(config: GameConfig) -> (GameFlow, Shared) {
    let shared = Shared::default();
    let services = Services::none()
        .with_instantiator(shared.clone())
        .with_audio(shared.clone())
        .with_ui(shared.clone());
    let flow = GameFlow::new(config, services, 1234).expect("valid config");
    (flow, shared)
}

/// One-life player facing a steady stream of kamikazes
fn deadly_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.player.max_lives = 1;
    config.spawner.entries =
        vec![SpawnEntryConfig { archetype: "enemy.kamikaze".to_string(), weight: 100 }];
    config.spawner.min_interval = 0.2;
    config.spawner.max_interval = 0.4;
    config
}

fn run_until_dead(flow: &mut GameFlow) {
    for _ in 0..2000 {
        flow.update(1.0 / 60.0);
        if flow.stage().awaiting_choice() {
            return;
        }
    }
    panic!("player survived the kamikaze stream");
}

fn count(log: &[String], entry: &str) -> usize {
    log.iter().filter(|e| *e == entry).count()
}

#[test]
fn test_title_to_stage_and_back() {
    let (mut flow, shared) = start(GameConfig::default());
    assert_eq!(shared.0.borrow().audio.last().map(String::as_str), Some("loop:music/title"));

    assert_eq!(flow.handle_event(InputEvent::Begin), Some(FlowTransition::TitleToStage));
    {
        let rec = shared.0.borrow();
        assert!(rec.panels.contains(&(Panel::Title, false)));
        assert!(rec.panels.contains(&(Panel::MainMenu, false)));
        assert_eq!(rec.audio.last().map(String::as_str), Some("loop:music/stage"));
        assert_eq!(rec.stage_children(), 2);
    }

    for _ in 0..30 {
        flow.update(1.0 / 60.0);
    }
    assert_eq!(flow.handle_event(InputEvent::PausePressed), Some(FlowTransition::StageToTitle));
    assert_eq!(flow.state(), FlowState::Title);

    let rec = shared.0.borrow();
    assert_eq!(rec.stage_children(), 0);
    assert_eq!(rec.panels.last(), Some(&(Panel::MainMenu, true)));
    assert_eq!(rec.audio.last().map(String::as_str), Some("loop:music/title"));
}

#[test]
fn test_repeated_begin_starts_one_stage() {
    let (mut flow, shared) = start(GameConfig::default());
    flow.handle_event(InputEvent::Begin);
    flow.handle_event(InputEvent::Begin);

    let rec = shared.0.borrow();
    assert_eq!(count(&rec.audio, "loop:music/stage"), 1);
    let players = rec
        .ops
        .iter()
        .filter(|op| matches!(op, Op::Spawn { archetype, .. } if archetype == "player"))
        .count();
    assert_eq!(players, 1);
}

#[test]
fn test_player_death_then_restart() {
    let (mut flow, shared) = start(deadly_config());
    flow.handle_event(InputEvent::Begin);
    run_until_dead(&mut flow);

    {
        let rec = shared.0.borrow();
        assert!(rec.panels.contains(&(Panel::RestartMenu, true)));
        assert_eq!(count(&rec.audio, "shot:music/game_over"), 1);
    }
    assert!(flow.stage().player().is_none());

    let checkpoint = shared.0.borrow().ops.len();
    assert_eq!(
        flow.handle_event(InputEvent::Menu(MenuChoice::Restart)),
        Some(FlowTransition::Restart)
    );
    assert_eq!(flow.state(), FlowState::Stage);
    assert!(!flow.stage().awaiting_choice());
    assert_eq!(flow.stage().score(), 0);

    let rec = shared.0.borrow();
    let after = &rec.ops[checkpoint..];
    let first_spawn = after
        .iter()
        .position(|op| matches!(op, Op::Spawn { .. }))
        .expect("stage set up again");
    // Teardown finished before the new setup began
    assert!(after[first_spawn..].iter().all(|op| matches!(op, Op::Spawn { .. })));
    assert!(matches!(&after[first_spawn], Op::Spawn { stage_children_before: 0, .. }));
    assert_eq!(rec.stage_children(), 2);
    assert_eq!(rec.scores.last().map(String::as_str), Some("Score 00000"));
    assert!(!flow.title().is_active());
}

#[test]
fn test_player_death_then_main_menu() {
    let (mut flow, shared) = start(deadly_config());
    flow.handle_event(InputEvent::Begin);
    run_until_dead(&mut flow);

    assert_eq!(
        flow.handle_event(InputEvent::Menu(MenuChoice::MainMenu)),
        Some(FlowTransition::StageToTitle)
    );
    assert_eq!(flow.state(), FlowState::Title);
    assert!(!flow.stage().is_active());
    assert_eq!(shared.0.borrow().stage_children(), 0);
}

#[test]
fn test_abort_during_bullet_time_restores_scale() {
    let (mut flow, _shared) = start(GameConfig::default());
    flow.handle_event(InputEvent::Begin);
    flow.handle_event(InputEvent::BulletTimePressed);
    flow.update(1.0 / 60.0);
    assert_eq!(flow.clock().time_scale(), 0.5);

    flow.handle_event(InputEvent::PausePressed);
    assert_eq!(flow.clock().time_scale(), 1.0);
}

#[test]
fn test_movement_input_moves_player() {
    let (mut flow, _shared) = start(GameConfig::default());
    flow.handle_event(InputEvent::Begin);
    let start_x = flow.stage().player().unwrap().position.x;

    flow.handle_event(InputEvent::Move(Vec2::new(1.0, 0.0)));
    for _ in 0..30 {
        flow.update(1.0 / 60.0);
    }
    let player = flow.stage().player().unwrap();
    assert!(player.position.x > start_x);
    assert!(player.velocity.x > 0.0);
}

#[test]
fn test_scripted_session_runs_to_quit() {
    let (mut flow, shared) = start(GameConfig::default());
    let mut input = ScriptedInput::new(vec![
        (0.0, InputEvent::Begin),
        (0.5, InputEvent::Move(Vec2::new(-1.0, 0.5))),
        (0.5, InputEvent::ShootPressed),
        (0.6, InputEvent::ShootReleased),
        (1.5, InputEvent::ShootPressed),
        (1.6, InputEvent::ShootReleased),
        (2.0, InputEvent::BulletTimePressed),
        (3.0, InputEvent::BulletTimeReleased),
        (10.0, InputEvent::PausePressed),
        (10.5, InputEvent::Menu(MenuChoice::Quit)),
    ]);

    let dt = 1.0 / 60.0;
    for _ in 0..(12 * 60) {
        input.advance(dt);
        flow.run_frame(dt, &mut input);
        if flow.quit_requested() {
            break;
        }
    }

    assert!(flow.quit_requested());
    assert!(input.finished());
    let rec = shared.0.borrow();
    assert_eq!(rec.stage_children(), 0);
    assert!(count(&rec.audio, "shot:sfx/shot_single") >= 2);
}
