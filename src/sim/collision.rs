//! Collision detection and dispatch
//!
//! Contacts carry an explicit `EntityKind` on both sides. `classify` turns a
//! contact into the one gameplay interaction it means (if any), regardless of
//! which side was reported first. A host with real physics can skip the
//! circle-overlap detector and feed its own contacts instead.

use glam::Vec3;

use super::projectile::Faction;

/// Stage-local entity id
pub type EntityId = u32;

/// What a collider belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Enemy,
    Bullet(Faction),
    PowerUp,
}

/// One side of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub id: EntityId,
    pub kind: EntityKind,
}

/// Two overlapping entities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub a: EntityRef,
    pub b: EntityRef,
}

/// Gameplay meaning of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Player bullet hits an enemy
    BulletHitsEnemy { bullet: EntityId, enemy: EntityId },
    /// Enemy bullet hits the player
    BulletHitsPlayer { bullet: EntityId },
    /// Enemy body touches the player
    EnemyRamsPlayer { enemy: EntityId },
    /// Player touches a pickup
    PickupCollected { pickup: EntityId },
}

/// Map a contact to its interaction; own-faction and inert pairs give `None`
pub fn classify(event: &CollisionEvent) -> Option<Interaction> {
    classify_ordered(event.a, event.b).or_else(|| classify_ordered(event.b, event.a))
}

fn classify_ordered(a: EntityRef, b: EntityRef) -> Option<Interaction> {
    match (a.kind, b.kind) {
        (EntityKind::Bullet(Faction::Player), EntityKind::Enemy) => {
            Some(Interaction::BulletHitsEnemy { bullet: a.id, enemy: b.id })
        }
        (EntityKind::Bullet(Faction::Enemy), EntityKind::Player) => {
            Some(Interaction::BulletHitsPlayer { bullet: a.id })
        }
        (EntityKind::Enemy, EntityKind::Player) => {
            Some(Interaction::EnemyRamsPlayer { enemy: a.id })
        }
        (EntityKind::PowerUp, EntityKind::Player) => {
            Some(Interaction::PickupCollected { pickup: a.id })
        }
        _ => None,
    }
}

/// Circle collider on the stage plane
#[derive(Debug, Clone, Copy)]
pub struct Collider {
    pub entity: EntityRef,
    pub position: Vec3,
    pub radius: f32,
}

/// Check whether two circles overlap (z ignored)
#[inline]
pub fn overlaps(a: &Collider, b: &Collider) -> bool {
    let d = a.position.truncate() - b.position.truncate();
    let r = a.radius + b.radius;
    d.length_squared() <= r * r
}

/// All overlapping pairs that mean something, in collider order
pub fn detect_overlaps(colliders: &[Collider]) -> Vec<CollisionEvent> {
    let mut events = Vec::new();
    for (i, a) in colliders.iter().enumerate() {
        for b in &colliders[i + 1..] {
            let event = CollisionEvent { a: a.entity, b: b.entity };
            if classify(&event).is_some() && overlaps(a, b) {
                events.push(event);
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: EntityId, kind: EntityKind) -> EntityRef {
        EntityRef { id, kind }
    }

    fn collider(id: EntityId, kind: EntityKind, x: f32, y: f32) -> Collider {
        Collider { entity: entity(id, kind), position: Vec3::new(x, y, 0.0), radius: 0.5 }
    }

    #[test]
    fn test_classify_is_order_independent() {
        let bullet = entity(1, EntityKind::Bullet(Faction::Player));
        let enemy = entity(2, EntityKind::Enemy);

        let expected = Some(Interaction::BulletHitsEnemy { bullet: 1, enemy: 2 });
        assert_eq!(classify(&CollisionEvent { a: bullet, b: enemy }), expected);
        assert_eq!(classify(&CollisionEvent { a: enemy, b: bullet }), expected);
    }

    #[test]
    fn test_own_faction_bullets_are_inert() {
        let player_bullet = entity(1, EntityKind::Bullet(Faction::Player));
        let enemy_bullet = entity(2, EntityKind::Bullet(Faction::Enemy));
        let player = entity(3, EntityKind::Player);
        let enemy = entity(4, EntityKind::Enemy);

        assert_eq!(classify(&CollisionEvent { a: player_bullet, b: player }), None);
        assert_eq!(classify(&CollisionEvent { a: enemy_bullet, b: enemy }), None);
        assert_eq!(classify(&CollisionEvent { a: enemy, b: enemy }), None);
    }

    #[test]
    fn test_detect_overlaps_filters_inert_pairs() {
        let colliders = [
            collider(1, EntityKind::Player, 0.0, 0.0),
            collider(2, EntityKind::Enemy, 0.5, 0.0),
            collider(3, EntityKind::Enemy, 0.6, 0.0),
            collider(4, EntityKind::PowerUp, 5.0, 0.0),
        ];

        let events = detect_overlaps(&colliders);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.a.kind == EntityKind::Player));
    }
}
