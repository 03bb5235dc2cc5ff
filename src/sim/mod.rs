//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module touches an engine:
//! - Seeded RNG only
//! - Time comes from the flow-owned `Clock`
//! - Collaborators are reached through `platform::Services`
//! - Stable iteration order (entities kept in spawn order)

pub mod clock;
pub mod collision;
pub mod enemy;
pub mod events;
pub mod feedback;
pub mod flow;
pub mod player;
pub mod powerup;
pub mod projectile;
pub mod spawn;
pub mod stage;
pub mod tasks;

pub use clock::{Clock, FrameTime};
pub use collision::{
    Collider, CollisionEvent, EntityId, EntityKind, EntityRef, Interaction, classify,
    detect_overlaps,
};
pub use enemy::{DeathCause, Enemy, LifeState, Movement};
pub use events::StageEvent;
pub use feedback::{BackgroundPanner, CameraShake, SaturationFade};
pub use flow::{FlowState, FlowTransition, GameFlow, TitleScreen};
pub use player::{DamageOutcome, FiringMode, MovementStats, Player, PlayerBounds};
pub use powerup::{PowerUp, PowerUpEffect, PowerUpKind};
pub use projectile::{Bullet, Faction};
pub use spawn::{SpawnEntry, SpawnPolicy, SpawnRequest};
pub use stage::{StageContext, StageController, StageSession, score_text};
pub use tasks::{Scheduler, TimeDomain};
