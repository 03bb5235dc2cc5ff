//! Stage controller and the per-stage session
//!
//! A `StageSession` exists from stage setup to teardown and owns every stage
//! entity. Entities report through the session's `StageEvent` queue; the
//! session applies those events after each pass, which is the only place the
//! score changes and the collaborators are called.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::clock::{Clock, FrameTime};
use super::collision::{
    Collider, CollisionEvent, EntityId, EntityKind, EntityRef, Interaction, classify,
    detect_overlaps,
};
use super::enemy::Enemy;
use super::events::StageEvent;
use super::feedback::{BackgroundPanner, CameraShake};
use super::player::{Player, PlayerBounds};
use super::powerup::PowerUp;
use super::projectile::{Bullet, Faction};
use super::spawn::{SpawnPolicy, SpawnRequest};
use crate::audio::{AudioManager, SoundCue};
use crate::consts::{
    BULLET_DAMAGE, BULLET_RADIUS, ENEMY_RADIUS, FIXED_DT, PICKUP_RADIUS, PLAYER_RADIUS,
};
use crate::platform::{EntityHandle, InputEvent, Panel, Parent, Services};
use crate::settings::GameConfig;

/// Borrowed flow-owned state a stage operation needs
pub struct StageContext<'a> {
    pub clock: &'a mut Clock,
    pub services: &'a mut Services,
    pub audio: &'a mut AudioManager,
}

/// Score as shown on the HUD
pub fn score_text(score: u32) -> String {
    format!("Score {:05}", score)
}

/// An enemy spawner placed on the stage
#[derive(Debug, Clone)]
pub struct Spawner {
    pub policy: SpawnPolicy,
    pub handle: Option<EntityHandle>,
}

/// Fire-and-forget visual effect
#[derive(Debug, Clone)]
pub struct Effect {
    pub archetype: String,
    pub position: Vec3,
    pub remaining: f32,
    pub handle: Option<EntityHandle>,
}

/// Region outside of which bullets, enemies and pickups are removed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanerBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl CleanerBounds {
    fn from_config(config: &GameConfig) -> Self {
        let b = &config.stage.boundary;
        let margin = config.stage.cleaner_margin;
        Self {
            min: Vec2::new(b.left.min.x, b.bottom.min.y) - Vec2::splat(margin),
            max: Vec2::new(b.right.max.x, b.top.max.y) + Vec2::splat(margin),
        }
    }

    pub fn contains(&self, position: Vec3) -> bool {
        let p = position.truncate();
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Everything that lives for one stage run
pub struct StageSession {
    config: Arc<GameConfig>,
    rng: Pcg32,
    next_id: EntityId,

    pub score: u32,
    pub spawners: Vec<Spawner>,
    pub player: Option<Player>,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub power_ups: Vec<PowerUp>,
    pub effects: Vec<Effect>,
    /// False once the player is dead and the restart menu is up
    pub is_running: bool,

    events: Vec<StageEvent>,
    cleaner: CleanerBounds,
    panner: BackgroundPanner,
    shake: CameraShake,
}

impl StageSession {
    fn new(config: Arc<GameConfig>, seed: u64) -> Self {
        let cleaner = CleanerBounds::from_config(&config);
        let panner = BackgroundPanner::new(&config.stage.panner);
        Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            score: 0,
            spawners: Vec::new(),
            player: None,
            enemies: Vec::new(),
            bullets: Vec::new(),
            power_ups: Vec::new(),
            effects: Vec::new(),
            is_running: true,
            events: Vec::new(),
            cleaner,
            panner,
            shake: CameraShake::default(),
        }
    }

    fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn panner(&self) -> &BackgroundPanner {
        &self.panner
    }

    pub fn camera_offset(&self) -> Vec2 {
        self.shake.offset()
    }

    pub fn live_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_alive()).count()
    }

    fn player_position(&self) -> Option<Vec3> {
        self.player.as_ref().filter(|p| p.is_alive()).map(|p| p.position)
    }

    fn populate(&mut self, ctx: &mut StageContext) {
        let config = Arc::clone(&self.config);

        let tuning = &config.player;
        let bounds = PlayerBounds::from_boundary(&config.stage.boundary, tuning.boundary_offset);
        let id = self.next_entity_id();
        let mut player = Player::new(id, tuning, bounds, config.stage.player_spawn);
        player.handle =
            ctx.services.spawn(&tuning.archetype, player.position, 0.0, Parent::Stage);
        self.player = Some(player);

        let origin = config.stage.spawner_position;
        let policy = SpawnPolicy::new(&config.spawner, origin, &mut self.rng);
        let handle = ctx.services.spawn(&config.spawner.archetype, origin, 0.0, Parent::Stage);
        self.spawners.push(Spawner { policy, handle });
    }

    /// Release every presentation handle the session holds
    fn release(&mut self, services: &mut Services) -> usize {
        let mut handles: Vec<Option<EntityHandle>> = Vec::new();
        handles.extend(self.player.as_mut().map(|p| p.handle.take()));
        handles.extend(self.spawners.drain(..).map(|s| s.handle));
        handles.extend(self.enemies.drain(..).map(|mut e| e.handle.take()));
        handles.extend(self.bullets.drain(..).map(|b| b.handle));
        handles.extend(self.power_ups.drain(..).map(|p| p.handle));
        handles.extend(self.effects.drain(..).map(|e| e.handle));
        self.player = None;

        let released = handles.iter().flatten().count();
        for handle in handles {
            services.destroy(handle);
        }
        released
    }

    // === Per-frame ===

    fn update(&mut self, frame: FrameTime, ctx: &mut StageContext) {
        let dt = frame.dt;

        if let Some(player) = self.player.as_mut() {
            player.update(frame, ctx.clock, &mut self.events);
        }

        let live = self.live_enemies();
        let mut requests: Vec<SpawnRequest> = Vec::new();
        for spawner in &mut self.spawners {
            requests.extend(spawner.policy.tick(dt, live + requests.len(), &mut self.rng));
        }
        for request in requests {
            self.spawn_enemy(request, ctx.services);
        }

        let player_position = self.player_position();
        for enemy in &mut self.enemies {
            enemy.tick(dt, player_position, &mut self.rng, &mut self.events);
        }
        for bullet in &mut self.bullets {
            bullet.tick(dt);
        }
        for pickup in &mut self.power_ups {
            pickup.tick(dt);
        }
        for effect in &mut self.effects {
            effect.remaining -= dt;
        }

        self.process_events(ctx);
        self.remove_finished(ctx.services);

        self.panner.tick(dt);
        self.shake.tick(dt, &mut self.rng);

        let (meter, saturation) = self
            .player
            .as_ref()
            .map(|p| (p.meter_fraction(), p.saturation()))
            .unwrap_or((0.0, 0.0));
        ctx.services.ui(|ui| {
            ui.set_meter_value(meter);
            ui.set_saturation(saturation);
        });
    }

    fn fixed_update(&mut self, ctx: &mut StageContext) {
        let dt = ctx.clock.fixed_dt();
        if let Some(player) = self.player.as_mut() {
            player.fixed_update(dt, FIXED_DT);
        }

        for contact in detect_overlaps(&self.colliders()) {
            self.handle_collision(contact, ctx);
        }
        self.process_events(ctx);
        self.remove_finished(ctx.services);
    }

    fn colliders(&self) -> Vec<Collider> {
        let mut colliders = Vec::new();
        if let Some(player) = self.player.as_ref().filter(|p| p.is_alive()) {
            colliders.push(Collider {
                entity: EntityRef { id: player.id, kind: EntityKind::Player },
                position: player.position,
                radius: PLAYER_RADIUS,
            });
        }
        colliders.extend(self.enemies.iter().filter(|e| e.is_alive()).map(|e| Collider {
            entity: EntityRef { id: e.id, kind: EntityKind::Enemy },
            position: e.position,
            radius: ENEMY_RADIUS,
        }));
        colliders.extend(self.bullets.iter().filter(|b| b.is_live()).map(|b| Collider {
            entity: EntityRef { id: b.id, kind: EntityKind::Bullet(b.faction) },
            position: b.position,
            radius: BULLET_RADIUS,
        }));
        colliders.extend(self.power_ups.iter().filter(|p| p.is_live()).map(|p| Collider {
            entity: EntityRef { id: p.id, kind: EntityKind::PowerUp },
            position: p.position,
            radius: PICKUP_RADIUS,
        }));
        colliders
    }

    /// Apply the gameplay meaning of one contact
    fn handle_collision(&mut self, contact: CollisionEvent, ctx: &mut StageContext) {
        let Some(interaction) = classify(&contact) else {
            return;
        };

        match interaction {
            Interaction::BulletHitsEnemy { bullet, enemy } => {
                let Some(bullet) = self.bullets.iter_mut().find(|b| b.id == bullet && b.is_live())
                else {
                    return;
                };
                let Some(enemy) = self.enemies.iter_mut().find(|e| e.id == enemy && e.is_alive())
                else {
                    return;
                };
                if !bullet.hurts(Faction::Enemy) {
                    return;
                }
                bullet.spent = true;
                enemy.take_damage(bullet.damage, &mut self.rng, &mut self.events);
            }
            Interaction::BulletHitsPlayer { bullet } => {
                let Some(player) = self.player.as_mut().filter(|p| p.is_alive()) else {
                    return;
                };
                let Some(bullet) = self.bullets.iter_mut().find(|b| b.id == bullet && b.is_live())
                else {
                    return;
                };
                if !bullet.hurts(Faction::Player) {
                    return;
                }
                bullet.spent = true;
                player.take_damage(ctx.clock, &mut self.events);
            }
            Interaction::EnemyRamsPlayer { enemy } => {
                let Some(player) = self.player.as_mut().filter(|p| p.is_alive()) else {
                    return;
                };
                let Some(enemy) = self.enemies.iter_mut().find(|e| e.id == enemy && e.is_alive())
                else {
                    return;
                };
                player.take_damage(ctx.clock, &mut self.events);
                enemy.ram(&mut self.rng, &mut self.events);
            }
            Interaction::PickupCollected { pickup } => {
                let Some(player) = self.player.as_mut().filter(|p| p.is_alive()) else {
                    return;
                };
                let Some(pickup) =
                    self.power_ups.iter_mut().find(|p| p.id == pickup && p.is_live())
                else {
                    return;
                };
                pickup.collected = true;
                let effect = self.config.power_ups.effect(pickup.kind);
                player.apply_power_up(effect, ctx.clock, &mut self.events);
                self.events.push(StageEvent::Cue(SoundCue::PowerUp));
            }
        }
    }

    // === Event application ===

    fn process_events(&mut self, ctx: &mut StageContext) {
        let events = std::mem::take(&mut self.events);
        for event in events {
            match event {
                StageEvent::AddScore(points) => self.add_score(points, ctx.services),
                StageEvent::Cue(cue) => ctx.audio.play(cue),
                StageEvent::Effect { archetype, position } => {
                    self.spawn_effect(archetype, position, ctx.services);
                }
                StageEvent::DropPowerUp { kind, position } => {
                    let id = self.next_entity_id();
                    let tuning = &self.config.power_ups;
                    let mut pickup =
                        PowerUp::new(id, kind, position, tuning.move_speed, tuning.lifetime);
                    pickup.handle =
                        ctx.services.spawn(kind.archetype(), position, 0.0, Parent::Stage);
                    log::debug!("Dropped {:?} at {}", kind, position);
                    self.power_ups.push(pickup);
                }
                StageEvent::Fire { faction, origin, direction } => {
                    self.spawn_bullet(faction, origin, direction, ctx.services);
                }
                StageEvent::PlayerDamaged { lives } => {
                    ctx.services.ui(|ui| ui.set_heart_fill_count(lives));
                    self.shake.trigger(&self.config.stage.shake);
                }
                StageEvent::PlayerHealed { lives } => {
                    ctx.services.ui(|ui| ui.set_heart_fill_count(lives));
                }
                StageEvent::PlayerDied { position } => self.on_player_death(position, ctx),
                StageEvent::PowerUpStarted(kind) => {
                    ctx.services.ui(|ui| ui.show_panel(Panel::PowerUpIndicator(kind), true));
                }
                StageEvent::PowerUpEnded(kind) => {
                    ctx.services.ui(|ui| ui.show_panel(Panel::PowerUpIndicator(kind), false));
                }
            }
        }
    }

    fn add_score(&mut self, points: u32, services: &mut Services) {
        self.score = self.score.saturating_add(points);
        let text = score_text(self.score);
        services.ui(|ui| ui.set_score_text(&text));
    }

    fn on_player_death(&mut self, position: Vec3, ctx: &mut StageContext) {
        log::info!("Player died at {} with score {}", position, self.score);
        self.is_running = false;

        if let Some(mut player) = self.player.take() {
            ctx.services.destroy(player.handle.take());
        }
        for spawner in self.spawners.drain(..) {
            ctx.services.destroy(spawner.handle);
        }

        ctx.audio.stop();
        ctx.audio.play(SoundCue::GameOver);
        self.panner.set_active(false);
        ctx.services.ui(|ui| ui.show_panel(Panel::RestartMenu, true));
    }

    fn spawn_enemy(&mut self, request: SpawnRequest, services: &mut Services) {
        let config = Arc::clone(&self.config);
        let Some(archetype) = config.archetype(&request.archetype) else {
            log::warn!("Spawner requested unknown archetype '{}'", request.archetype);
            return;
        };
        let id = self.next_entity_id();
        let player_position = self.player_position();
        let mut enemy =
            Enemy::spawn(id, archetype, request.position, player_position, &mut self.rng);
        enemy.handle = services.spawn(&archetype.id, enemy.position, 0.0, Parent::Stage);
        log::debug!("Spawned {} #{} at {}", archetype.id, id, enemy.position);
        self.enemies.push(enemy);
    }

    fn spawn_bullet(
        &mut self,
        faction: Faction,
        origin: Vec3,
        direction: Vec3,
        services: &mut Services,
    ) {
        let id = self.next_entity_id();
        let tuning = &self.config.bullets;
        let mut bullet = Bullet::new(
            id,
            faction,
            origin,
            direction,
            tuning.speed,
            tuning.lifetime,
            BULLET_DAMAGE,
        );
        let archetype = match faction {
            Faction::Player => &tuning.player_archetype,
            Faction::Enemy => &tuning.enemy_archetype,
        };
        bullet.handle = services.spawn(archetype, origin, bullet.rotation(), Parent::Stage);
        self.bullets.push(bullet);
    }

    fn spawn_effect(&mut self, archetype: String, position: Vec3, services: &mut Services) {
        let handle = services.spawn(&archetype, position, 0.0, Parent::Stage);
        self.effects.push(Effect {
            archetype,
            position,
            remaining: self.config.stage.effect_lifetime,
            handle,
        });
    }

    /// Drop dead, spent, expired and out-of-bounds entities
    fn remove_finished(&mut self, services: &mut Services) {
        let cleaner = self.cleaner;

        self.enemies.retain_mut(|enemy| {
            if enemy.is_alive() && cleaner.contains(enemy.position) {
                return true;
            }
            if enemy.is_alive() {
                log::debug!("Cleaned up {} #{}", enemy.archetype, enemy.id);
            }
            services.destroy(enemy.finish());
            false
        });
        self.bullets.retain_mut(|bullet| {
            let keep = bullet.is_live() && cleaner.contains(bullet.position);
            if !keep {
                services.destroy(bullet.handle.take());
            }
            keep
        });
        self.power_ups.retain_mut(|pickup| {
            let keep = pickup.is_live() && cleaner.contains(pickup.position);
            if !keep {
                services.destroy(pickup.handle.take());
            }
            keep
        });
        self.effects.retain_mut(|effect| {
            let keep = effect.remaining > 0.0;
            if !keep {
                services.destroy(effect.handle.take());
            }
            keep
        });
    }
}

/// Owns the active stage session and runs stage setup/teardown
pub struct StageController {
    config: Arc<GameConfig>,
    rng: Pcg32,
    session: Option<StageSession>,
}

impl StageController {
    pub fn new(config: Arc<GameConfig>, seed: u64) -> Self {
        Self { config, rng: Pcg32::seed_from_u64(seed), session: None }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&StageSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut StageSession> {
        self.session.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn score(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.score)
    }

    pub fn player(&self) -> Option<&Player> {
        self.session.as_ref().and_then(|s| s.player.as_ref())
    }

    /// Player is dead and the restart menu is waiting for a choice
    pub fn awaiting_choice(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_running)
    }

    /// Start a session. A no-op when one is already running.
    pub fn setup(&mut self, ctx: &mut StageContext) {
        if self.session.is_some() {
            log::debug!("Stage already set up");
            return;
        }

        let mut session = StageSession::new(Arc::clone(&self.config), self.rng.random());
        let max_lives = self.config.player.max_lives;
        let text = score_text(0);
        ctx.services.ui(|ui| {
            ui.set_score_text(&text);
            ui.show_panel(Panel::RestartMenu, false);
            ui.show_panel(Panel::Health, true);
            ui.show_panel(Panel::PowerUp, true);
            ui.set_heart_fill_count(max_lives);
            ui.set_meter_value(1.0);
            ui.set_saturation(0.0);
        });

        session.populate(ctx);
        ctx.audio.play_music(SoundCue::StageMusic);

        log::info!("Stage started");
        self.session = Some(session);
    }

    /// Tear the session down. A no-op when no session exists.
    pub fn cleanup(&mut self, ctx: &mut StageContext) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if let Some(player) = session.player.as_mut() {
            player.deactivate_bullet_time(ctx.clock);
            for kind in player.active_power_ups() {
                ctx.services.ui(|ui| ui.show_panel(Panel::PowerUpIndicator(kind), false));
            }
        }
        let released = session.release(ctx.services);
        ctx.clock.reset_time_scale();
        ctx.audio.stop();
        ctx.services.ui(|ui| {
            ui.show_panel(Panel::RestartMenu, false);
            ui.show_panel(Panel::Health, false);
            ui.show_panel(Panel::PowerUp, false);
            ui.set_saturation(0.0);
        });

        log::info!(
            "Stage torn down (score {}, {} entities released)",
            session.score,
            released
        );
    }

    /// Teardown followed by a fresh setup
    pub fn restart(&mut self, ctx: &mut StageContext) {
        self.cleanup(ctx);
        self.setup(ctx);
    }

    /// Gameplay input; flow-level events are handled by the caller
    pub fn handle_input(&mut self, event: InputEvent, ctx: &mut StageContext) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(player) = session.player.as_mut() else {
            return;
        };

        match event {
            InputEvent::Move(direction) => player.set_movement_input(direction),
            InputEvent::ShootPressed => player.shoot_pressed(ctx.clock, &mut session.events),
            InputEvent::ShootReleased => player.shoot_released(),
            InputEvent::BulletTimePressed => {
                player.activate_bullet_time(ctx.clock);
            }
            InputEvent::BulletTimeReleased => {
                player.deactivate_bullet_time(ctx.clock);
            }
            InputEvent::PausePressed | InputEvent::Begin | InputEvent::Menu(_) => {}
        }
    }

    /// Variable-rate frame tick
    pub fn update(&mut self, frame: FrameTime, ctx: &mut StageContext) {
        if let Some(session) = self.session.as_mut() {
            session.update(frame, ctx);
        }
    }

    /// Fixed-rate movement and collision tick
    pub fn fixed_update(&mut self, ctx: &mut StageContext) {
        if let Some(session) = self.session.as_mut() {
            session.fixed_update(ctx);
        }
    }

    /// Feed an externally detected contact (e.g. from a host physics engine)
    pub fn handle_collision(&mut self, contact: CollisionEvent, ctx: &mut StageContext) {
        if let Some(session) = self.session.as_mut() {
            session.handle_collision(contact, ctx);
            session.process_events(ctx);
            session.remove_finished(ctx.services);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Instantiator, UiService};
    use crate::settings::{EnemyArchetype, MovementConfig, SpawnEntryConfig};
    use crate::sim::powerup::PowerUpEffect;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct World {
        next: u64,
        live: Vec<(EntityHandle, String, Parent)>,
        score_texts: Vec<String>,
        hearts: Vec<u32>,
        panels: Vec<(Panel, bool)>,
    }

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<World>>);

    impl Instantiator for Shared {
        fn spawn(
            &mut self,
            archetype: &str,
            _: Vec3,
            _: f32,
            parent: Parent,
        ) -> Option<EntityHandle> {
            let mut world = self.0.borrow_mut();
            world.next += 1;
            let handle = EntityHandle(world.next);
            world.live.push((handle, archetype.to_string(), parent));
            Some(handle)
        }

        fn destroy(&mut self, handle: EntityHandle) {
            self.0.borrow_mut().live.retain(|(h, _, _)| *h != handle);
        }
    }

    impl UiService for Shared {
        fn set_score_text(&mut self, text: &str) {
            self.0.borrow_mut().score_texts.push(text.to_string());
        }
        fn set_heart_fill_count(&mut self, filled: u32) {
            self.0.borrow_mut().hearts.push(filled);
        }
        fn set_meter_value(&mut self, _: f32) {}
        fn show_panel(&mut self, panel: Panel, visible: bool) {
            self.0.borrow_mut().panels.push((panel, visible));
        }
    }

    struct Harness {
        clock: Clock,
        services: Services,
        audio: AudioManager,
        world: Shared,
        stage: StageController,
    }

    impl Harness {
        fn new(config: GameConfig) -> Self {
            let world = Shared::default();
            let services = Services::none().with_instantiator(world.clone()).with_ui(world.clone());
            let audio = AudioManager::new(None, config.audio.clone());
            Self {
                clock: Clock::new(),
                services,
                audio,
                world,
                stage: StageController::new(Arc::new(config), 42),
            }
        }

        fn with<T>(&mut self, f: impl FnOnce(&mut StageController, &mut StageContext) -> T) -> T {
            let mut ctx = StageContext {
                clock: &mut self.clock,
                services: &mut self.services,
                audio: &mut self.audio,
            };
            f(&mut self.stage, &mut ctx)
        }

        fn stage_children(&self) -> usize {
            self.world.0.borrow().live.iter().filter(|(_, _, p)| *p == Parent::Stage).count()
        }
    }

    fn quiet_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.spawner.entries.clear();
        config
    }

    fn tough_enemy() -> EnemyArchetype {
        EnemyArchetype {
            id: "enemy.block".to_string(),
            health: 3.0,
            lifetime: 100.0,
            score_value: 250,
            drop_chance: 0,
            drop_table: Vec::new(),
            movement: MovementConfig::Straight { speed: 0.0 },
            hit_effect: None,
            death_effect: Some("fx.explosion".to_string()),
        }
    }

    fn contact(a: EntityRef, b: EntityRef) -> CollisionEvent {
        CollisionEvent { a, b }
    }

    #[test]
    fn test_setup_is_idempotent() {
        let mut h = Harness::new(quiet_config());
        h.with(|stage, ctx| stage.setup(ctx));
        let children = h.stage_children();
        h.with(|stage, ctx| stage.setup(ctx));

        // Player + spawner
        assert_eq!(children, 2);
        assert_eq!(h.stage_children(), 2);
        assert_eq!(h.world.0.borrow().score_texts.first().map(String::as_str), Some("Score 00000"));
    }

    #[test]
    fn test_restart_releases_every_child() {
        let mut config = quiet_config();
        config.archetypes.push(tough_enemy());
        let mut h = Harness::new(config);
        h.with(|stage, ctx| {
            stage.setup(ctx);
            stage.handle_input(InputEvent::ShootPressed, ctx);

            let session = stage.session_mut().unwrap();
            session.spawn_enemy(
                SpawnRequest {
                    archetype: "enemy.block".to_string(),
                    position: Vec3::new(5.0, 3.0, 0.0),
                },
                ctx.services,
            );
            session.events.push(StageEvent::DropPowerUp {
                kind: crate::sim::powerup::PowerUpKind::Shield,
                position: Vec3::new(-5.0, 3.0, 0.0),
            });
            session.events.push(StageEvent::Effect {
                archetype: "fx.hit".to_string(),
                position: Vec3::new(5.0, 3.0, 0.0),
            });
        });
        h.clock.advance(0.05);
        let frame = h.clock.frame();
        h.with(|stage, ctx| {
            stage.update(frame, ctx);
            stage.fixed_update(ctx);
        });
        // Player, spawner, bullet, enemy, pickup, effect
        assert_eq!(h.stage_children(), 6);

        h.with(|stage, ctx| stage.cleanup(ctx));
        assert_eq!(h.stage_children(), 0);
        assert_eq!(h.stage.score(), 0);

        h.with(|stage, ctx| stage.setup(ctx));
        assert_eq!(h.stage_children(), 2);
    }

    #[test]
    fn test_cleanup_without_session_is_noop() {
        let mut h = Harness::new(quiet_config());
        h.with(|stage, ctx| stage.cleanup(ctx));
        assert!(h.world.0.borrow().panels.is_empty());
    }

    #[test]
    fn test_kill_awards_score_once() {
        let mut config = quiet_config();
        config.archetypes.push(tough_enemy());
        let mut h = Harness::new(config);
        h.with(|stage, ctx| stage.setup(ctx));

        let archetype = tough_enemy();
        h.with(|stage, ctx| {
            let session = stage.session_mut().unwrap();
            session.spawn_enemy(
                SpawnRequest {
                    archetype: archetype.id.clone(),
                    position: Vec3::new(0.0, 3.0, 0.0),
                },
                ctx.services,
            );
        });
        let enemy = h.stage.session().unwrap().enemies[0].id;

        for _ in 0..3 {
            h.with(|stage, ctx| {
                let session = stage.session_mut().unwrap();
                let origin = Vec3::new(0.0, 2.0, 0.0);
                session.spawn_bullet(Faction::Player, origin, Vec3::Y, ctx.services);
                let bullet = session.bullets.last().unwrap().id;
                stage.handle_collision(
                    contact(
                        EntityRef { id: enemy, kind: EntityKind::Enemy },
                        EntityRef { id: bullet, kind: EntityKind::Bullet(Faction::Player) },
                    ),
                    ctx,
                );
            });
        }

        let session = h.stage.session().unwrap();
        assert_eq!(session.score, 250);
        assert!(session.enemies.is_empty());
        assert!(session.bullets.is_empty());
        // Death effect spawned
        assert_eq!(session.effects.len(), 1);
        assert_eq!(h.world.0.borrow().score_texts.last().map(String::as_str), Some("Score 00250"));
    }

    #[test]
    fn test_enemy_bullet_does_not_hurt_enemies() {
        let mut config = quiet_config();
        config.archetypes.push(tough_enemy());
        let mut h = Harness::new(config);
        h.with(|stage, ctx| stage.setup(ctx));

        h.with(|stage, ctx| {
            let session = stage.session_mut().unwrap();
            session.spawn_enemy(
                SpawnRequest { archetype: "enemy.block".to_string(), position: Vec3::ZERO },
                ctx.services,
            );
            session.spawn_bullet(Faction::Enemy, Vec3::ZERO, Vec3::NEG_Y, ctx.services);
            let enemy = session.enemies[0].id;
            let bullet = session.bullets[0].id;
            stage.handle_collision(
                contact(
                    EntityRef { id: bullet, kind: EntityKind::Bullet(Faction::Enemy) },
                    EntityRef { id: enemy, kind: EntityKind::Enemy },
                ),
                ctx,
            );
        });

        let session = h.stage.session().unwrap();
        assert_eq!(session.enemies[0].health, 3.0);
        assert_eq!(session.bullets.len(), 1);
    }

    #[test]
    fn test_player_death_awaits_choice() {
        let mut config = quiet_config();
        config.player.max_lives = 1;
        let mut h = Harness::new(config);
        h.with(|stage, ctx| stage.setup(ctx));

        h.with(|stage, ctx| {
            let session = stage.session_mut().unwrap();
            session.spawn_bullet(Faction::Enemy, Vec3::ZERO, Vec3::NEG_Y, ctx.services);
            let bullet = session.bullets[0].id;
            let player = session.player.as_ref().unwrap().id;
            stage.handle_collision(
                contact(
                    EntityRef { id: player, kind: EntityKind::Player },
                    EntityRef { id: bullet, kind: EntityKind::Bullet(Faction::Enemy) },
                ),
                ctx,
            );
        });

        assert!(h.stage.awaiting_choice());
        let session = h.stage.session().unwrap();
        assert!(session.player.is_none());
        assert!(session.spawners.is_empty());
        // Only the ship's death effect is left on the stage
        assert_eq!(session.effects.len(), 1);
        assert_eq!(session.effects[0].archetype, "fx.player_explosion");
        assert_eq!(h.stage_children(), 1);
        let world = h.world.0.borrow();
        assert_eq!(world.hearts.last(), Some(&0));
        assert_eq!(world.panels.last(), Some(&(Panel::RestartMenu, true)));
    }

    #[test]
    fn test_pickup_applies_effect() {
        let mut h = Harness::new(quiet_config());
        h.with(|stage, ctx| stage.setup(ctx));

        h.with(|stage, ctx| {
            let session = stage.session_mut().unwrap();
            session.events.push(StageEvent::DropPowerUp {
                kind: crate::sim::powerup::PowerUpKind::TripleShot,
                position: Vec3::ZERO,
            });
            session.process_events(ctx);
            let pickup = session.power_ups[0].id;
            let player = session.player.as_ref().unwrap().id;
            stage.handle_collision(
                contact(
                    EntityRef { id: pickup, kind: EntityKind::PowerUp },
                    EntityRef { id: player, kind: EntityKind::Player },
                ),
                ctx,
            );
        });

        let session = h.stage.session().unwrap();
        assert!(session.player.as_ref().unwrap().has_triple_shot());
        assert!(session.power_ups.is_empty());
    }

    #[test]
    fn test_power_up_indicator_follows_effect() {
        use crate::sim::powerup::PowerUpKind;

        let mut h = Harness::new(quiet_config());
        h.with(|stage, ctx| stage.setup(ctx));
        let collect = |h: &mut Harness, kind: PowerUpKind| {
            h.with(|stage, ctx| {
                let session = stage.session_mut().unwrap();
                let position = session.player.as_ref().unwrap().position;
                session.events.push(StageEvent::DropPowerUp { kind, position });
                session.process_events(ctx);
                let pickup = session.power_ups.last().unwrap().id;
                let player = session.player.as_ref().unwrap().id;
                stage.handle_collision(
                    contact(
                        EntityRef { id: pickup, kind: EntityKind::PowerUp },
                        EntityRef { id: player, kind: EntityKind::Player },
                    ),
                    ctx,
                );
            });
        };
        let indicator = Panel::PowerUpIndicator(PowerUpKind::FullAuto);
        let toggles = |h: &Harness| -> Vec<bool> {
            let world = h.world.0.borrow();
            world.panels.iter().filter(|(p, _)| *p == indicator).map(|(_, v)| *v).collect()
        };

        collect(&mut h, PowerUpKind::FullAuto);
        assert_eq!(toggles(&h), vec![true]);

        // Picking it up again mid-effect leaves the indicator on
        h.clock.advance(2.0);
        let frame = h.clock.frame();
        h.with(|stage, ctx| stage.update(frame, ctx));
        collect(&mut h, PowerUpKind::FullAuto);
        assert_eq!(toggles(&h), vec![true]);

        // Default duration is 5s from the second pickup
        h.clock.advance(4.0);
        let frame = h.clock.frame();
        h.with(|stage, ctx| stage.update(frame, ctx));
        assert_eq!(toggles(&h), vec![true]);

        h.clock.advance(1.5);
        let frame = h.clock.frame();
        h.with(|stage, ctx| stage.update(frame, ctx));
        assert_eq!(toggles(&h), vec![true, false]);
    }

    #[test]
    fn test_cleanup_hides_running_indicators() {
        use crate::sim::powerup::PowerUpKind;

        let mut h = Harness::new(quiet_config());
        h.with(|stage, ctx| {
            stage.setup(ctx);
            let session = stage.session_mut().unwrap();
            let player = session.player.as_mut().unwrap();
            let effect = PowerUpEffect::Shield { duration: 5.0 };
            player.apply_power_up(effect, ctx.clock, &mut session.events);
            session.process_events(ctx);
            stage.cleanup(ctx);
        });

        let world = h.world.0.borrow();
        let indicator = Panel::PowerUpIndicator(PowerUpKind::Shield);
        let toggles: Vec<bool> =
            world.panels.iter().filter(|(p, _)| *p == indicator).map(|(_, v)| *v).collect();
        assert_eq!(toggles, vec![true, false]);
    }

    #[test]
    fn test_spawner_respects_cap() {
        let mut config = GameConfig::default();
        config.spawner.entries =
            vec![SpawnEntryConfig { archetype: "enemy.block".to_string(), weight: 100 }];
        config.spawner.min_interval = 0.1;
        config.spawner.max_interval = 0.1;
        config.spawner.max_active_enemies = 3;
        config.archetypes.push(tough_enemy());
        let mut h = Harness::new(config);
        h.with(|stage, ctx| stage.setup(ctx));

        for _ in 0..50 {
            h.clock.advance(0.1);
            let frame = h.clock.frame();
            h.with(|stage, ctx| stage.update(frame, ctx));
            assert!(h.stage.session().unwrap().live_enemies() <= 3);
        }
        assert_eq!(h.stage.session().unwrap().live_enemies(), 3);
    }

    #[test]
    fn test_cleaner_bounds() {
        let bounds = CleanerBounds::from_config(&GameConfig::default());
        assert!(bounds.contains(Vec3::new(0.0, 8.9, 0.0)));
        assert!(!bounds.contains(Vec3::new(0.0, -9.5, 0.0)));
        assert!(!bounds.contains(Vec3::new(12.5, 0.0, 0.0)));
    }

    #[test]
    fn test_cleanup_restores_time_scale() {
        let mut h = Harness::new(quiet_config());
        h.with(|stage, ctx| {
            stage.setup(ctx);
            stage.handle_input(InputEvent::BulletTimePressed, ctx);
        });
        assert_eq!(h.clock.time_scale(), 0.5);
        h.with(|stage, ctx| stage.cleanup(ctx));
        assert_eq!(h.clock.time_scale(), 1.0);
    }
}
