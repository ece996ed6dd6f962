//! End-to-end battle scenarios driven through the public API.

use proptest::prelude::*;
use siege_core::components::MAX_BATTALION;
use siege_core::prelude::*;
use siege_test_utils::fixtures::{
    full_rosters, lone_tower_config, lone_tower_config_with_volleys, quiet_config, run_script,
};
use siege_test_utils::strategies;

fn enemy_tower_health(battle: &Battle) -> Option<u32> {
    battle
        .state()
        .towers()
        .iter()
        .find(|tower| tower.team == Team::Enemy)
        .map(|tower| tower.health.current)
}

#[test]
fn test_lone_swordsman_fells_tower_in_ten_attacks() {
    let rosters = [ArmyRoster::new().with(UnitType::Swordsman, 1), ArmyRoster::new()];
    let mut battle = Battle::start(lone_tower_config(), rosters, 100, 3).unwrap();
    battle.deploy_battalion(UnitType::Swordsman, Lane::Center).unwrap();

    let mut health = enemy_tower_health(&battle).unwrap();
    assert_eq!(health, 1000);

    let mut attacks = 0;
    let mut destroyed = false;
    for _ in 0..2000 {
        let events = battle.tick();
        let now = enemy_tower_health(&battle).unwrap_or(0);
        if now < health {
            assert_eq!(health - now, 100);
            attacks += 1;
            health = now;
        }
        if events
            .events
            .iter()
            .any(|e| matches!(e, BattleEvent::TowerDestroyed { team: Team::Enemy, .. }))
        {
            destroyed = true;
            break;
        }
    }

    assert!(destroyed);
    assert_eq!(attacks, 10);
    let unit = battle.state().units().iter().next().unwrap();
    assert_eq!(unit.battalion.size(), MAX_BATTALION);
}

#[test]
fn test_firing_tower_still_falls_in_ten_attacks() {
    let rosters = [ArmyRoster::new().with(UnitType::Swordsman, 1), ArmyRoster::new()];
    let mut battle = Battle::start(lone_tower_config_with_volleys(), rosters, 100, 3).unwrap();
    battle.deploy_battalion(UnitType::Swordsman, Lane::Center).unwrap();

    let mut health = enemy_tower_health(&battle).unwrap();
    let mut attacks = 0;
    for _ in 0..2000 {
        battle.tick();
        let now = enemy_tower_health(&battle).unwrap_or(0);
        if now < health {
            assert_eq!(health - now, 100);
            attacks += 1;
            health = now;
        }
        if now == 0 {
            break;
        }
    }

    assert_eq!(health, 0);
    assert_eq!(attacks, 10);
    let unit = battle.state().units().iter().next().unwrap();
    assert!(unit.battalion.size() < MAX_BATTALION);
    assert!(!unit.battalion.is_wiped());
}

#[test]
fn test_longest_accepted_field_runs_without_overflow() {
    let mut config = quiet_config();
    config.layout.field_length = siege_core::data::MAX_FIELD_LENGTH;
    config.layout.lane_spacing =
        siege_core::data::MAX_LANE_SPACING - config.layout.formation_spread;
    config.catapult.range = config.layout.lane_spacing + 1;
    config.catapult.spawn_interval = 30;
    assert!(config.validate().is_ok());

    let mut battle = Battle::start(config, full_rosters(1), 200, 4).unwrap();
    battle.deploy_battalion(UnitType::Cavalry, Lane::Left).unwrap();
    for _ in 0..120 {
        battle.tick();
    }
    assert!(!battle.is_over());
    assert!(battle.state().units().iter().all(|u| u.target.is_some()));
}

#[test]
fn test_oversized_field_is_rejected_at_start() {
    let mut config = quiet_config();
    config.layout.field_length = 60_000;
    assert!(matches!(
        Battle::start(config, full_rosters(1), 200, 4),
        Err(SiegeError::InvalidConfig(_))
    ));
}

#[test]
fn test_deploy_below_cost_changes_nothing() {
    let mut battle = Battle::start(quiet_config(), full_rosters(2), 10, 1).unwrap();
    let hash = battle.state_hash();

    let err = battle
        .deploy_battalion(UnitType::Swordsman, Lane::Left)
        .unwrap_err();

    assert_eq!(
        err,
        CommandError::InsufficientResource {
            required: 30,
            available: 10
        }
    );
    assert_eq!(battle.state_hash(), hash);
    assert!(battle.pending_commands().is_empty());
    assert_eq!(battle.state().mana().current(), 10);
    assert_eq!(battle.state().roster(Team::Player).available(UnitType::Swordsman), 2);
}

#[test]
fn test_catapult_second_shot_within_reload_rejected() {
    let mut config = quiet_config();
    config.catapult.spawn_interval = 10_000;
    config.catapult.reload = 3;
    config.catapult.damage = 100;
    let mut battle = Battle::start(config, full_rosters(1), 200, 5).unwrap();
    battle.tick();

    let catapult = battle
        .state()
        .catapults()
        .iter()
        .find(|c| c.team == Team::Player && c.lane == Lane::Center)
        .map(|c| c.id)
        .unwrap();

    battle.manual_fire(catapult, Lane::Center).unwrap();
    let events = battle.tick();
    assert!(events
        .events
        .iter()
        .any(|e| matches!(e, BattleEvent::ManualShot { damage: 100, .. })));

    let err = battle.manual_fire(catapult, Lane::Center).unwrap_err();
    assert_eq!(
        err,
        CommandError::NotReady {
            entity: catapult,
            ticks_remaining: 2
        }
    );

    battle.tick();
    battle.tick();
    assert!(battle.manual_fire(catapult, Lane::Center).is_ok());
}

#[test]
fn test_units_only_target_their_own_lane() {
    let mut config = quiet_config();
    config.catapult.spawn_interval = 150;
    let mut battle = Battle::start(config, full_rosters(3), 200, 9).unwrap();
    for lane in Lane::ALL {
        battle.deploy_battalion(UnitType::Archer, lane).unwrap();
    }

    for _ in 0..600 {
        battle.tick();
        let snapshot = battle.snapshot();
        for unit in &snapshot.units {
            let Some(target) = unit.target else { continue };
            let target_lane = match target.kind {
                TargetKind::Catapult => snapshot
                    .catapults
                    .iter()
                    .find(|c| c.id == target.id)
                    .map(|c| c.lane),
                TargetKind::Tower => snapshot
                    .towers
                    .iter()
                    .find(|t| t.id == target.id)
                    .and_then(|t| t.lane),
                TargetKind::Castle => continue,
            };
            assert_eq!(target_lane, Some(unit.lane), "unit {} crossed lanes", unit.id);
        }
        if battle.is_over() {
            break;
        }
    }
}

#[test]
fn test_simultaneous_castle_fall_goes_to_defender() {
    let mut config = BattleConfig::single_lane();
    config.layout.towers.clear();
    config.layout.formation_spread = 0;
    config.catapult.spawn_interval = 0;
    config.castle.health = 1;
    config.enemy.first_spawn = 0;
    config.enemy.spawn_interval = 10_000;
    let mut swordsman = *config.catalog.get(UnitType::Swordsman);
    swordsman.attack_interval = 1;
    config.catalog.set(UnitType::Swordsman, swordsman);

    let rosters = [
        ArmyRoster::new().with(UnitType::Swordsman, 1),
        ArmyRoster::new().with(UnitType::Swordsman, 1),
    ];
    let mut battle = Battle::start(config, rosters, 100, 0).unwrap();
    battle.deploy_battalion(UnitType::Swordsman, Lane::Center).unwrap();

    let mut log: Vec<BattleEvent> = Vec::new();
    let outcome = battle.run(2000, &mut log);

    assert_eq!(outcome, Outcome::Victory(Team::Enemy));
    let snapshot = battle.snapshot();
    assert!(snapshot.castle(Team::Player).destroyed);
    assert!(snapshot.castle(Team::Enemy).destroyed);

    let ended: Vec<_> = log
        .iter()
        .filter(|e| matches!(e, BattleEvent::BattleEnded { .. }))
        .collect();
    assert_eq!(ended.len(), 1);
    assert!(matches!(ended[0], BattleEvent::BattleEnded { winner: Team::Enemy, .. }));

    // The clock has stopped.
    assert!(battle.tick().is_empty());
    assert_eq!(
        battle.deploy_battalion(UnitType::Swordsman, Lane::Center),
        Err(CommandError::BattleOver)
    );
}

#[test]
fn test_result_taken_once_with_rewards() {
    let rosters = [ArmyRoster::new().with(UnitType::Swordsman, 2), ArmyRoster::new()];
    let mut battle = Battle::start(lone_tower_config(), rosters, 100, 3).unwrap();
    battle.deploy_battalion(UnitType::Swordsman, Lane::Center).unwrap();

    assert!(battle.take_result().is_none());
    let mut log: Vec<BattleEvent> = Vec::new();
    assert_eq!(battle.run(5000, &mut log), Outcome::Victory(Team::Player));

    let result = battle.take_result().unwrap();
    assert_eq!(result.winner, Some(Team::Player));
    assert_eq!(result.towers_destroyed, 1);
    assert_eq!(result.rewards, 500 + 100);
    assert_eq!(result.army_returned.available(UnitType::Swordsman), 1);
    assert_eq!(result.elapsed_ticks, battle.current_tick());
    assert!(battle.take_result().is_none());
}

#[test]
fn test_abort_has_no_winner() {
    let mut battle = Battle::start(quiet_config(), full_rosters(1), 100, 2).unwrap();
    battle.deploy_battalion(UnitType::Cavalry, Lane::Right).unwrap();
    for _ in 0..10 {
        battle.tick();
    }

    let events = battle.abort().unwrap();
    assert_eq!(events.events, vec![BattleEvent::BattleAborted { duration: 10 }]);
    assert_eq!(battle.outcome(), Outcome::Aborted);
    assert!(battle.abort().is_none());

    let result = battle.take_result().unwrap();
    assert_eq!(result.winner, None);
    assert_eq!(result.rewards, 0);
}

#[test]
fn test_snapshot_is_idempotent() {
    let mut battle = Battle::start(BattleConfig::default(), full_rosters(2), 200, 4).unwrap();
    battle.deploy_battalion(UnitType::FireMage, Lane::Center).unwrap();
    for _ in 0..120 {
        battle.tick();
    }

    let hash = battle.state_hash();
    let first = battle.snapshot();
    let second = battle.snapshot();
    assert_eq!(first, second);
    assert_eq!(battle.state_hash(), hash);
}

#[test]
fn test_scripted_run_is_repeatable() {
    let script = siege_test_utils::fixtures::parse_script(
        "[
            (tick: 0, command: DeployBattalion(unit_type: Swordsman, lane: Left)),
            (tick: 40, command: DeployBattalion(unit_type: Archer, lane: Center)),
            (tick: 90, command: DeployBattalion(unit_type: Cavalry, lane: Right)),
        ]",
    )
    .unwrap();

    let run = || {
        let mut battle = Battle::start(BattleConfig::default(), full_rosters(2), 200, 77).unwrap();
        let events = run_script(&mut battle, &script, 900);
        (battle.state_hash(), events)
    };
    assert_eq!(run(), run());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Health and battalion sizes stay within bounds, and dead entities
    /// never survive into the next tick.
    #[test]
    fn prop_values_stay_clamped(
        script in strategies::arb_script(10, 150),
        roster in strategies::arb_roster(),
        seed in strategies::arb_seed(),
    ) {
        let mut battle = Battle::start(
            BattleConfig::default(),
            [roster.clone(), roster],
            200,
            seed,
        ).unwrap();

        for _ in 0..400 {
            let now = battle.current_tick();
            for scripted in script.iter().filter(|s| s.tick == now) {
                let _ = battle.submit(scripted.command);
            }
            battle.tick();

            let state = battle.state();
            for unit in state.units().iter() {
                prop_assert!(unit.battalion.size() > 0);
                prop_assert!(unit.battalion.size() <= MAX_BATTALION);
            }
            for tower in state.towers().iter() {
                prop_assert!(tower.health.current > 0);
                prop_assert!(tower.health.current <= tower.health.max);
            }
            for catapult in state.catapults().iter() {
                prop_assert!(catapult.health.current > 0);
                prop_assert!(catapult.health.current <= catapult.health.max);
            }
            for castle in state.castles() {
                prop_assert!(castle.health.current <= castle.health.max);
            }
            prop_assert!(state.mana().current() <= state.mana().cap());

            if battle.is_over() {
                break;
            }
        }
    }
}
