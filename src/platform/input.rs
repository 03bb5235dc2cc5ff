//! Input events delivered to the flow
//!
//! Device binding is the host's job; the simulation only sees these events.

use glam::Vec2;

/// Restart-menu / title-menu buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Restart,
    MainMenu,
    Quit,
}

/// Discrete input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// New movement vector (held until the next `Move`)
    Move(Vec2),
    ShootPressed,
    ShootReleased,
    BulletTimePressed,
    BulletTimeReleased,
    /// Escape key; aborts the stage back to the title
    PausePressed,
    /// Start button on the title screen
    Begin,
    Menu(MenuChoice),
}

/// Source of input events, polled once per frame
pub trait InputService {
    fn poll_events(&mut self) -> Vec<InputEvent>;
}

/// Replays a fixed timeline of events; used by the headless binary and tests
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    /// (time in real seconds, event), sorted by time
    timeline: Vec<(f32, InputEvent)>,
    cursor: usize,
    now: f32,
}

impl ScriptedInput {
    pub fn new(mut timeline: Vec<(f32, InputEvent)>) -> Self {
        timeline.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { timeline, cursor: 0, now: 0.0 }
    }

    /// Advance the script clock by real seconds
    pub fn advance(&mut self, dt: f32) {
        self.now += dt;
    }

    /// True once every scripted event has been delivered
    pub fn finished(&self) -> bool {
        self.cursor >= self.timeline.len()
    }
}

impl InputService for ScriptedInput {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        while let Some(&(at, event)) = self.timeline.get(self.cursor) {
            if at > self.now {
                break;
            }
            events.push(event);
            self.cursor += 1;
        }
        events
    }
}
