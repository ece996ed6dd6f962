//! Battle state aggregate.
//!
//! [`BattleState`] owns every entity collection, both castles, the
//! resource gate and the terminal outcome. Create/remove operations live
//! here; systems read it through shared references and write through the
//! narrow mutators below.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::components::{
    Battalion, Cooldown, EntityId, Health, Lane, TargetKind, TargetRef, Team, UnitType,
};
use crate::data::BattleConfig;
use crate::entities::{Castle, Catapult, CatapultState, EntityStore, Tower, Unit};
use crate::math::{Fixed, Vec2Fixed};
use crate::resources::{ArmyRoster, ManaGate};

/// Terminal state of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Outcome {
    /// Still being fought.
    #[default]
    Ongoing,
    /// A castle fell; this team won.
    Victory(Team),
    /// Ended externally without a winner.
    Aborted,
}

impl Outcome {
    /// Whether the battle has ended.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Ongoing)
    }

    /// The winning team, if any.
    #[must_use]
    pub const fn winner(&self) -> Option<Team> {
        match self {
            Self::Victory(team) => Some(*team),
            _ => None,
        }
    }
}

/// Running totals reported when the battle ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BattleStats {
    /// Soldiers lost, indexed by [`Team::index`].
    pub casualties: [u32; 2],
    /// Towers lost, indexed by owning team.
    pub towers_lost: [u32; 2],
    /// Catapults lost, indexed by owning team.
    pub catapults_lost: [u32; 2],
    /// Battalions deployed, indexed by owning team.
    pub battalions_deployed: [u32; 2],
}

/// The aggregate root of one battle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleState {
    tick: u64,
    next_id: EntityId,
    units: EntityStore<Unit>,
    towers: EntityStore<Tower>,
    catapults: EntityStore<Catapult>,
    castles: [Castle; 2],
    mana: ManaGate,
    rosters: [ArmyRoster; 2],
    outcome: Outcome,
    stats: BattleStats,
}

impl BattleState {
    /// Build the starting state: both castles and every tower from the layout.
    #[must_use]
    pub fn new(config: &BattleConfig, rosters: [ArmyRoster; 2], initial_mana: u32) -> Self {
        let layout = &config.layout;
        let castles = [Team::Player, Team::Enemy].map(|team| Castle {
            id: team.index() as EntityId + 1,
            team,
            position: layout.castle_position(team),
            health: Health::new(config.castle.health),
        });

        let mut state = Self {
            tick: 0,
            next_id: 3,
            units: EntityStore::new(),
            towers: EntityStore::new(),
            catapults: EntityStore::new(),
            castles,
            mana: ManaGate::new(initial_mana, &config.mana),
            rosters,
            outcome: Outcome::Ongoing,
            stats: BattleStats::default(),
        };

        for placement in &layout.towers {
            let id = state.allocate_id();
            state.towers.insert(Tower {
                id,
                team: placement.team,
                lane: placement.lane,
                position: layout.lane_point(placement.team, placement.lane, placement.distance),
                health: Health::new(config.tower.health),
                max_casualties: config.tower.max_casualties,
                range: Fixed::from_num(config.tower.range),
                volley: Cooldown::new(config.tower.cooldown),
            });
        }

        state
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Current tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// All live battalions.
    #[must_use]
    pub fn units(&self) -> &EntityStore<Unit> {
        &self.units
    }

    /// All standing towers.
    #[must_use]
    pub fn towers(&self) -> &EntityStore<Tower> {
        &self.towers
    }

    /// All live catapults.
    #[must_use]
    pub fn catapults(&self) -> &EntityStore<Catapult> {
        &self.catapults
    }

    /// A team's castle.
    #[must_use]
    pub fn castle(&self, team: Team) -> &Castle {
        &self.castles[team.index()]
    }

    /// Both castles.
    #[must_use]
    pub fn castles(&self) -> &[Castle; 2] {
        &self.castles
    }

    /// The player's resource gate.
    #[must_use]
    pub const fn mana(&self) -> &ManaGate {
        &self.mana
    }

    pub(crate) fn mana_mut(&mut self) -> &mut ManaGate {
        &mut self.mana
    }

    /// A team's remaining army.
    #[must_use]
    pub fn roster(&self, team: Team) -> &ArmyRoster {
        &self.rosters[team.index()]
    }

    pub(crate) fn roster_mut(&mut self, team: Team) -> &mut ArmyRoster {
        &mut self.rosters[team.index()]
    }

    /// Terminal outcome.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub(crate) fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = outcome;
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> &BattleStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut BattleStats {
        &mut self.stats
    }

    /// Create a full-strength battalion at its lane's spawn point.
    pub(crate) fn spawn_unit(
        &mut self,
        config: &BattleConfig,
        team: Team,
        unit_type: UnitType,
        lane: Lane,
    ) -> EntityId {
        let id = self.allocate_id();
        let stats = config.catalog.get(unit_type);
        self.units.insert(Unit {
            id,
            unit_type,
            team,
            lane,
            position: config.layout.spawn_point(team, lane, id),
            battalion: Battalion::full(),
            damage: stats.damage,
            speed: stats.speed_fixed(),
            range: stats.range_fixed(),
            attack: Cooldown::new(stats.attack_interval),
            target: None,
            engaged: false,
        });
        self.stats.battalions_deployed[team.index()] += 1;
        id
    }

    /// Create a catapult at its lane's spawn point.
    pub(crate) fn spawn_catapult(&mut self, config: &BattleConfig, team: Team, lane: Lane) -> EntityId {
        let id = self.allocate_id();
        let data = &config.catapult;
        self.catapults.insert(Catapult {
            id,
            team,
            lane,
            position: config.layout.lane_point(team, lane, config.layout.spawn_offset),
            health: Health::new(data.health),
            damage: data.damage,
            range: Fixed::from_num(data.range),
            speed: Fixed::from_num(data.speed),
            reload: Cooldown::new(data.reload),
            state: CatapultState::Moving,
            target: None,
        });
        id
    }

    pub(crate) fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    pub(crate) fn units_mut(&mut self) -> &mut EntityStore<Unit> {
        &mut self.units
    }

    pub(crate) fn towers_mut(&mut self) -> &mut EntityStore<Tower> {
        &mut self.towers
    }

    pub(crate) fn catapults_mut(&mut self) -> &mut EntityStore<Catapult> {
        &mut self.catapults
    }

    pub(crate) fn castle_mut(&mut self, team: Team) -> &mut Castle {
        &mut self.castles[team.index()]
    }

    /// Find the castle with this id.
    #[must_use]
    pub fn castle_by_id(&self, id: EntityId) -> Option<&Castle> {
        self.castles.iter().find(|castle| castle.id == id)
    }

    /// Position of a live target, or `None` if it is gone or destroyed.
    #[must_use]
    pub fn target_position(&self, target: TargetRef) -> Option<Vec2Fixed> {
        match target.kind {
            TargetKind::Catapult => self
                .catapults
                .get(target.id)
                .filter(|c| !c.is_destroyed())
                .map(|c| c.position),
            TargetKind::Tower => self
                .towers
                .get(target.id)
                .filter(|t| !t.is_destroyed())
                .map(|t| t.position),
            TargetKind::Castle => self
                .castle_by_id(target.id)
                .filter(|c| !c.is_destroyed())
                .map(|c| c.position),
        }
    }

    /// Team owning a target, if it still exists.
    #[must_use]
    pub fn target_team(&self, target: TargetRef) -> Option<Team> {
        match target.kind {
            TargetKind::Catapult => self.catapults.get(target.id).map(|c| c.team),
            TargetKind::Tower => self.towers.get(target.id).map(|t| t.team),
            TargetKind::Castle => self.castle_by_id(target.id).map(|c| c.team),
        }
    }

    /// Standing towers of `team` on `lane`, in id order.
    pub fn standing_towers(&self, team: Team, lane: Lane) -> impl Iterator<Item = &Tower> {
        self.towers
            .iter()
            .filter(move |t| t.team == team && t.lane == lane && !t.is_destroyed())
    }

    /// Live catapults of `team` on `lane`, in id order.
    pub fn live_catapults(&self, team: Team, lane: Lane) -> impl Iterator<Item = &Catapult> {
        self.catapults
            .iter()
            .filter(move |c| c.team == team && c.lane == lane && !c.is_destroyed())
    }

    /// Hash of the complete state, stable across runs and platforms.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
