//! Entity records and keyed storage.
//!
//! Units, towers, catapults and castles are plain records stored by id.
//! Storage iterates in ascending id order so every system processes
//! entities deterministically.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{
    Battalion, Cooldown, EntityId, Health, Lane, TargetRef, Team, UnitType,
};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Anything stored in an [`EntityStore`].
pub trait Identified {
    /// The entity's id.
    fn id(&self) -> EntityId;
}

/// A battalion of up to 100 soldiers of one type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Unique id.
    pub id: EntityId,
    /// Catalog type.
    pub unit_type: UnitType,
    /// Owning team.
    pub team: Team,
    /// Lane the battalion marches on.
    pub lane: Lane,
    /// World position.
    pub position: Vec2Fixed,
    /// Soldier count.
    pub battalion: Battalion,
    /// Flat damage per attack.
    pub damage: u32,
    /// Speed in world units per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Engagement range.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Attack cadence; `last_tick` is the last-attack tick.
    pub attack: Cooldown,
    /// Current target, resolved by lookup each tick.
    pub target: Option<TargetRef>,
    /// Whether the target was in range at the last movement step.
    pub engaged: bool,
}

impl Identified for Unit {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// A stationary defensive tower.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tower {
    /// Unique id.
    pub id: EntityId,
    /// Owning team.
    pub team: Team,
    /// Lane the tower guards.
    pub lane: Lane,
    /// World position (never changes).
    pub position: Vec2Fixed,
    /// Structure health.
    pub health: Health,
    /// Upper bound on casualties per battalion per volley.
    pub max_casualties: u8,
    /// Engagement radius.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Volley cadence.
    pub volley: Cooldown,
}

impl Tower {
    /// True iff health is zero.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.health.is_destroyed()
    }
}

impl Identified for Tower {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Whether a catapult is advancing or holding to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatapultState {
    /// Advancing along its lane toward a structure.
    Moving,
    /// A structure is in range; holding position.
    Stationary,
}

/// A mobile siege engine that only attacks structures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Catapult {
    /// Unique id.
    pub id: EntityId,
    /// Owning team.
    pub team: Team,
    /// Lane the catapult advances on.
    pub lane: Lane,
    /// World position.
    pub position: Vec2Fixed,
    /// Health.
    pub health: Health,
    /// Flat damage per shot.
    pub damage: u32,
    /// Area-effect range.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Speed in world units per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Reload cadence; `last_tick` is the last-shot tick.
    pub reload: Cooldown,
    /// Movement state.
    pub state: CatapultState,
    /// Current structure target.
    pub target: Option<TargetRef>,
}

impl Catapult {
    /// True iff health is zero.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.health.is_destroyed()
    }
}

impl Identified for Catapult {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// A team's castle. Its destruction ends the battle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Castle {
    /// Unique id.
    pub id: EntityId,
    /// Owning team.
    pub team: Team,
    /// World position.
    pub position: Vec2Fixed,
    /// Health.
    pub health: Health,
}

impl Castle {
    /// True iff health is zero.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.health.is_destroyed()
    }
}

/// Entities of one kind keyed by id, iterated in ascending id order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityStore<T> {
    entities: BTreeMap<EntityId, T>,
}

impl<T: Identified> EntityStore<T> {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
        }
    }

    /// Insert an entity under its own id.
    pub fn insert(&mut self, entity: T) {
        self.entities.insert(entity.id(), entity);
    }

    /// Remove an entity by id.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        self.entities.remove(&id)
    }

    /// Get an entity by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities.get_mut(&id)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Iterate in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entities.values()
    }

    /// Iterate mutably in ascending id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entities.values_mut()
    }

    /// Remove every entity matching `predicate`, returning them in id order.
    pub fn drain_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        let doomed: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, entity)| predicate(entity))
            .map(|(id, _)| *id)
            .collect();
        doomed
            .into_iter()
            .filter_map(|id| self.entities.remove(&id))
            .collect()
    }
}

impl<T: Identified> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn castle_like_tower(id: EntityId, health: u32) -> Tower {
        Tower {
            id,
            team: Team::Enemy,
            lane: Lane::Center,
            position: Vec2Fixed::ZERO,
            health: Health::new(health),
            max_casualties: 5,
            range: Fixed::from_num(10),
            volley: Cooldown::new(1),
        }
    }

    #[test]
    fn test_store_iterates_in_id_order() {
        let mut store = EntityStore::new();
        store.insert(castle_like_tower(9, 10));
        store.insert(castle_like_tower(2, 10));
        store.insert(castle_like_tower(5, 10));
        let ids: Vec<_> = store.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        assert_eq!(store.ids(), ids);
    }

    #[test]
    fn test_drain_where_removes_only_matches() {
        let mut store = EntityStore::new();
        store.insert(castle_like_tower(1, 10));
        store.insert(castle_like_tower(2, 10));
        if let Some(tower) = store.get_mut(2) {
            tower.health.apply_damage(10);
        }
        let removed = store.drain_where(Tower::is_destroyed);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, 2);
        assert!(store.contains(1));
        assert!(!store.contains(2));
    }
}
