//! Read-only views of battle state for presentation.
//!
//! A snapshot is an owned copy. Taking one never touches the battle, so
//! taking two in a row without a tick yields equal snapshots.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Lane, TargetRef, Team, UnitType};
use crate::entities::CatapultState;
use crate::math::Vec2Fixed;
use crate::state::{BattleState, Outcome};

/// One battalion as seen by presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    /// Unit id.
    pub id: EntityId,
    /// Owning team.
    pub team: Team,
    /// Catalog type.
    pub unit_type: UnitType,
    /// Lane.
    pub lane: Lane,
    /// World position.
    pub position: Vec2Fixed,
    /// Soldiers left.
    pub battalion: u8,
    /// Current target.
    pub target: Option<TargetRef>,
    /// Holding position in range of its target.
    pub engaged: bool,
}

/// A tower or castle as seen by presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureView {
    /// Structure id.
    pub id: EntityId,
    /// Owning team.
    pub team: Team,
    /// Lane guarded; `None` for castles.
    pub lane: Option<Lane>,
    /// World position.
    pub position: Vec2Fixed,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// True iff health is zero.
    pub destroyed: bool,
}

/// A catapult as seen by presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatapultView {
    /// Catapult id.
    pub id: EntityId,
    /// Owning team.
    pub team: Team,
    /// Lane.
    pub lane: Lane,
    /// World position.
    pub position: Vec2Fixed,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Moving or holding.
    pub state: CatapultState,
    /// Structure being attacked.
    pub target: Option<TargetRef>,
    /// True iff health is zero.
    pub destroyed: bool,
}

/// Everything presentation needs to draw one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    /// Ticks completed.
    pub tick: u64,
    /// Battalions in id order.
    pub units: Vec<UnitView>,
    /// Towers in id order.
    pub towers: Vec<StructureView>,
    /// Catapults in id order.
    pub catapults: Vec<CatapultView>,
    /// Player castle then enemy castle.
    pub castles: [StructureView; 2],
    /// Player mana.
    pub mana: u32,
    /// Player mana cap.
    pub mana_cap: u32,
    /// Battle outcome so far.
    pub outcome: Outcome,
}

impl BattleSnapshot {
    /// Capture the current state.
    #[must_use]
    pub fn capture(state: &BattleState) -> Self {
        let units = state
            .units()
            .iter()
            .map(|unit| UnitView {
                id: unit.id,
                team: unit.team,
                unit_type: unit.unit_type,
                lane: unit.lane,
                position: unit.position,
                battalion: unit.battalion.size(),
                target: unit.target,
                engaged: unit.engaged,
            })
            .collect();

        let towers = state
            .towers()
            .iter()
            .map(|tower| StructureView {
                id: tower.id,
                team: tower.team,
                lane: Some(tower.lane),
                position: tower.position,
                health: tower.health.current,
                max_health: tower.health.max,
                destroyed: tower.is_destroyed(),
            })
            .collect();

        let catapults = state
            .catapults()
            .iter()
            .map(|catapult| CatapultView {
                id: catapult.id,
                team: catapult.team,
                lane: catapult.lane,
                position: catapult.position,
                health: catapult.health.current,
                max_health: catapult.health.max,
                state: catapult.state,
                target: catapult.target,
                destroyed: catapult.is_destroyed(),
            })
            .collect();

        let castles = state.castles().clone().map(|castle| StructureView {
            id: castle.id,
            team: castle.team,
            lane: None,
            position: castle.position,
            health: castle.health.current,
            max_health: castle.health.max,
            destroyed: castle.is_destroyed(),
        });

        Self {
            tick: state.tick(),
            units,
            towers,
            catapults,
            castles,
            mana: state.mana().current(),
            mana_cap: state.mana().cap(),
            outcome: state.outcome(),
        }
    }

    /// A team's castle view.
    #[must_use]
    pub fn castle(&self, team: Team) -> &StructureView {
        &self.castles[team.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BattleConfig;

    #[test]
    fn test_snapshot_reflects_state() {
        let config = BattleConfig::default();
        let mut state = BattleState::new(&config, Default::default(), 80);
        state.spawn_unit(&config, Team::Player, UnitType::IceMage, Lane::Left);
        let snapshot = BattleSnapshot::capture(&state);
        assert_eq!(snapshot.units.len(), 1);
        assert_eq!(snapshot.units[0].battalion, 100);
        assert_eq!(snapshot.towers.len(), 6);
        assert_eq!(snapshot.castle(Team::Enemy).health, 5000);
        assert_eq!(snapshot.mana, 80);
    }

    #[test]
    fn test_capture_is_repeatable() {
        let state = BattleState::new(&BattleConfig::default(), Default::default(), 0);
        assert_eq!(BattleSnapshot::capture(&state), BattleSnapshot::capture(&state));
    }
}
