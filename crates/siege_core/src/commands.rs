//! Command gateway for player commands.
//!
//! Commands are validated when submitted and queued for the next tick
//! boundary, where they are applied before movement. Validation at submit
//! time accounts for mana, battalions and catapult shots already reserved
//! by queued commands, so two commands can never both spend the same
//! balance. Each command is validated again when applied; a failure there
//! becomes a [`BattleEvent::CommandRejected`] and changes nothing.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::combat::strike;
use crate::components::{EntityId, Lane, TargetKind, TargetRef, Team, UnitType};
use crate::data::BattleConfig;
use crate::events::BattleEvent;
use crate::error::CommandError;
use crate::spatial::nearest;
use crate::state::BattleState;
use crate::targeting::unit_target;

/// A command issued by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerCommand {
    /// Send a full battalion down a lane.
    DeployBattalion {
        /// Catalog type to deploy.
        unit_type: UnitType,
        /// Lane to deploy on.
        lane: Lane,
    },
    /// Fire a friendly catapult at a lane, ignoring range.
    ManualFire {
        /// Catapult to fire.
        catapult: EntityId,
        /// Lane whose nearest enemy structure is struck.
        target_lane: Lane,
    },
}

/// Resources held by queued commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct Reservations {
    mana: u32,
    army: BTreeMap<UnitType, u32>,
    catapults: BTreeSet<EntityId>,
}

impl Reservations {
    fn hold(&mut self, command: &PlayerCommand, config: &BattleConfig) {
        match *command {
            PlayerCommand::DeployBattalion { unit_type, .. } => {
                self.mana += config.catalog.get(unit_type).cost;
                *self.army.entry(unit_type).or_insert(0) += 1;
            }
            PlayerCommand::ManualFire { catapult, .. } => {
                self.mana += config.mana.manual_fire_cost;
                self.catapults.insert(catapult);
            }
        }
    }
}

/// Validates player commands and applies them at tick boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandGateway {
    queue: Vec<PlayerCommand>,
    reserved: Reservations,
}

impl CommandGateway {
    /// Team whose commands the gateway accepts.
    pub const TEAM: Team = Team::Player;

    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands waiting for the next tick boundary.
    #[must_use]
    pub fn pending(&self) -> &[PlayerCommand] {
        &self.queue
    }

    /// Validate a command and queue it.
    ///
    /// # Errors
    ///
    /// Returns the [`CommandError`] describing why the command cannot be
    /// carried out. Nothing is queued or reserved on rejection.
    pub fn submit(
        &mut self,
        state: &BattleState,
        config: &BattleConfig,
        command: PlayerCommand,
    ) -> Result<(), CommandError> {
        validate(state, config, &command, &self.reserved)?;
        self.reserved.hold(&command, config);
        self.queue.push(command);
        Ok(())
    }

    /// Apply every queued command in submission order.
    ///
    /// Returns the events produced, including rejections of commands that
    /// no longer validate.
    pub fn apply_queued(&mut self, state: &mut BattleState, config: &BattleConfig) -> Vec<BattleEvent> {
        self.reserved = Reservations::default();
        let queue = std::mem::take(&mut self.queue);
        let mut events = Vec::with_capacity(queue.len());

        for command in queue {
            if let Err(reason) = validate(state, config, &command, &Reservations::default()) {
                tracing::debug!(tick = state.tick(), ?command, %reason, "Queued command rejected");
                events.push(BattleEvent::CommandRejected { reason });
                continue;
            }
            events.push(execute(state, config, command));
        }
        events
    }

    /// Drop every queued command and release its reservations.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.reserved = Reservations::default();
    }
}

fn validate(
    state: &BattleState,
    config: &BattleConfig,
    command: &PlayerCommand,
    reserved: &Reservations,
) -> Result<(), CommandError> {
    if state.outcome().is_terminal() {
        return Err(CommandError::BattleOver);
    }
    let available_mana = state.mana().current().saturating_sub(reserved.mana);

    match *command {
        PlayerCommand::DeployBattalion { unit_type, lane } => {
            if !config.layout.has_lane(lane) {
                return Err(CommandError::InvalidLane { lane });
            }
            let cost = config.catalog.get(unit_type).cost;
            if available_mana < cost {
                return Err(CommandError::InsufficientResource {
                    required: cost,
                    available: available_mana,
                });
            }
            let held = reserved.army.get(&unit_type).copied().unwrap_or(0);
            if state.roster(CommandGateway::TEAM).available(unit_type) <= held {
                return Err(CommandError::InsufficientArmy { unit_type });
            }
        }
        PlayerCommand::ManualFire {
            catapult,
            target_lane,
        } => {
            let Some(engine) = state
                .catapults()
                .get(catapult)
                .filter(|c| c.team == CommandGateway::TEAM && !c.is_destroyed())
            else {
                return Err(CommandError::UnknownEntity {
                    entity: catapult,
                    team: CommandGateway::TEAM,
                });
            };
            if reserved.catapults.contains(&catapult) {
                return Err(CommandError::NotReady {
                    entity: catapult,
                    ticks_remaining: engine.reload.interval,
                });
            }
            let ticks_remaining = engine.reload.remaining(state.tick());
            if ticks_remaining > 0 {
                return Err(CommandError::NotReady {
                    entity: catapult,
                    ticks_remaining,
                });
            }
            if !config.layout.has_lane(target_lane) {
                return Err(CommandError::InvalidLane { lane: target_lane });
            }
            let cost = config.mana.manual_fire_cost;
            if available_mana < cost {
                return Err(CommandError::InsufficientResource {
                    required: cost,
                    available: available_mana,
                });
            }
        }
    }
    Ok(())
}

fn execute(state: &mut BattleState, config: &BattleConfig, command: PlayerCommand) -> BattleEvent {
    match command {
        PlayerCommand::DeployBattalion { unit_type, lane } => {
            state.mana_mut().spend(config.catalog.get(unit_type).cost);
            state.roster_mut(CommandGateway::TEAM).take(unit_type);
            deploy_unit(state, config, CommandGateway::TEAM, unit_type, lane)
        }
        PlayerCommand::ManualFire {
            catapult,
            target_lane,
        } => {
            let target = manual_fire_target(state, catapult, target_lane);
            state.mana_mut().spend(config.mana.manual_fire_cost);
            let now = state.tick();
            if let Some(engine) = state.catapults_mut().get_mut(catapult) {
                engine.reload.trigger(now);
            }
            let damage = target.map_or(0, |t| {
                let amount = state.catapults().get(catapult).map_or(0, |c| c.damage);
                strike(state, t, amount)
            });
            tracing::debug!(tick = now, catapult, ?target, damage, "Manual catapult shot");
            BattleEvent::ManualShot {
                catapult,
                target: target.map(|t| t.id),
                damage,
            }
        }
    }
}

/// Nearest standing enemy tower on `lane`, else the enemy castle.
fn manual_fire_target(state: &BattleState, catapult: EntityId, lane: Lane) -> Option<TargetRef> {
    let engine = state.catapults().get(catapult)?;
    let enemy = engine.team.opponent();
    if let Some((tower, _)) = nearest(engine, state.standing_towers(enemy, lane)) {
        return Some(TargetRef::new(TargetKind::Tower, tower.id));
    }
    let castle = state.castle(enemy);
    (!castle.is_destroyed()).then(|| TargetRef::new(TargetKind::Castle, castle.id))
}

/// Spawn a battalion and give it a target straight away.
pub(crate) fn deploy_unit(
    state: &mut BattleState,
    config: &BattleConfig,
    team: Team,
    unit_type: UnitType,
    lane: Lane,
) -> BattleEvent {
    let id = state.spawn_unit(config, team, unit_type, lane);
    let target = state.units().get(id).and_then(|unit| unit_target(state, unit));
    if let Some(unit) = state.unit_mut(id) {
        unit.target = target;
    }
    tracing::debug!(tick = state.tick(), id, ?team, ?unit_type, ?lane, "Battalion deployed");
    BattleEvent::UnitSpawned {
        id,
        team,
        unit_type,
        lane,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ArmyRoster;

    fn setup(mana: u32) -> (BattleConfig, BattleState) {
        let config = BattleConfig::default();
        let roster = ArmyRoster::new()
            .with(UnitType::Swordsman, 2)
            .with(UnitType::Archer, 1);
        let state = BattleState::new(&config, [roster, ArmyRoster::new()], mana);
        (config, state)
    }

    fn deploy(unit_type: UnitType) -> PlayerCommand {
        PlayerCommand::DeployBattalion {
            unit_type,
            lane: Lane::Center,
        }
    }

    #[test]
    fn test_deploy_below_cost_rejected() {
        let (config, state) = setup(10);
        let mut gateway = CommandGateway::new();
        let err = gateway
            .submit(&state, &config, deploy(UnitType::Swordsman))
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::InsufficientResource {
                required: 30,
                available: 10
            }
        );
        assert!(gateway.pending().is_empty());
    }

    #[test]
    fn test_reservations_prevent_double_spend() {
        let (config, state) = setup(50);
        let mut gateway = CommandGateway::new();
        gateway
            .submit(&state, &config, deploy(UnitType::Swordsman))
            .unwrap();
        assert!(matches!(
            gateway.submit(&state, &config, deploy(UnitType::Swordsman)),
            Err(CommandError::InsufficientResource { available: 20, .. })
        ));
    }

    #[test]
    fn test_army_reservation_counts_queued_deploys() {
        let (config, state) = setup(200);
        let mut gateway = CommandGateway::new();
        gateway.submit(&state, &config, deploy(UnitType::Archer)).unwrap();
        assert_eq!(
            gateway.submit(&state, &config, deploy(UnitType::Archer)),
            Err(CommandError::InsufficientArmy {
                unit_type: UnitType::Archer
            })
        );
    }

    #[test]
    fn test_apply_spends_and_spawns() {
        let (config, mut state) = setup(100);
        let mut gateway = CommandGateway::new();
        gateway
            .submit(&state, &config, deploy(UnitType::Swordsman))
            .unwrap();
        let events = gateway.apply_queued(&mut state, &config);
        assert!(matches!(events[0], BattleEvent::UnitSpawned { .. }));
        assert_eq!(state.mana().current(), 70);
        assert_eq!(state.roster(Team::Player).available(UnitType::Swordsman), 1);
        assert!(state.units().iter().all(|u| u.target.is_some()));
    }

    #[test]
    fn test_requeued_command_rejected_when_state_changed() {
        let (config, mut state) = setup(100);
        let catapult = state.spawn_catapult(&config, Team::Player, Lane::Center);
        let mut gateway = CommandGateway::new();
        gateway
            .submit(
                &state,
                &config,
                PlayerCommand::ManualFire {
                    catapult,
                    target_lane: Lane::Center,
                },
            )
            .unwrap();
        state.catapults_mut().remove(catapult);

        let events = gateway.apply_queued(&mut state, &config);
        assert!(matches!(
            events[0],
            BattleEvent::CommandRejected {
                reason: CommandError::UnknownEntity { .. }
            }
        ));
        assert_eq!(state.mana().current(), 100);
    }

    #[test]
    fn test_manual_fire_ignores_range() {
        let (config, mut state) = setup(100);
        let catapult = state.spawn_catapult(&config, Team::Player, Lane::Center);
        let mut gateway = CommandGateway::new();
        gateway
            .submit(
                &state,
                &config,
                PlayerCommand::ManualFire {
                    catapult,
                    target_lane: Lane::Left,
                },
            )
            .unwrap();
        let events = gateway.apply_queued(&mut state, &config);
        let BattleEvent::ManualShot { target, damage, .. } = &events[0] else {
            panic!("expected a manual shot, got {:?}", events[0]);
        };
        assert_eq!(*damage, 120);
        let tower = state.towers().get(target.unwrap()).unwrap();
        assert_eq!((tower.team, tower.lane), (Team::Enemy, Lane::Left));
        assert_eq!(state.mana().current(), 60);
    }

    #[test]
    fn test_manual_shot_without_target_reports_none() {
        let (config, mut state) = setup(100);
        let catapult = state.spawn_catapult(&config, Team::Player, Lane::Left);
        let towers: Vec<EntityId> = state
            .standing_towers(Team::Enemy, Lane::Left)
            .map(|tower| tower.id)
            .collect();
        for id in towers {
            state.towers_mut().remove(id);
        }
        state.castle_mut(Team::Enemy).health.apply_damage(u32::MAX);

        let event = execute(
            &mut state,
            &config,
            PlayerCommand::ManualFire {
                catapult,
                target_lane: Lane::Left,
            },
        );
        assert_eq!(
            event,
            BattleEvent::ManualShot {
                catapult,
                target: None,
                damage: 0
            }
        );
    }

    #[test]
    fn test_foreign_catapult_is_unknown() {
        let (config, mut state) = setup(100);
        let catapult = state.spawn_catapult(&config, Team::Enemy, Lane::Center);
        let mut gateway = CommandGateway::new();
        assert_eq!(
            gateway.submit(
                &state,
                &config,
                PlayerCommand::ManualFire {
                    catapult,
                    target_lane: Lane::Center
                }
            ),
            Err(CommandError::UnknownEntity {
                entity: catapult,
                team: Team::Player
            })
        );
    }
}
