//! Movement of battalions and catapults.
//!
//! Each mobile entity moves toward the target it holds from the previous
//! resolution. A target that no longer resolves means the entity holds
//! position this tick.

use crate::components::TargetKind;
use crate::data::BattleConfig;
use crate::entities::CatapultState;
use crate::math::{approach, Fixed};
use crate::simulation::TICK_RATE;
use crate::spatial::within;
use crate::state::BattleState;
use crate::targeting::catapult_has_structure_in_range;

/// Fraction of the per-tick step spent correcting lateral drift.
const DRIFT_DIVISOR: i32 = 2;

/// Distance covered in one tick at `speed` units per second.
#[must_use]
pub fn step_length(speed: Fixed) -> Fixed {
    speed / Fixed::from_num(TICK_RATE)
}

/// Advance every unit toward its target.
///
/// Units already within range are marked engaged and stay put. Units
/// chasing a lane-bound target also drift back toward their lane's
/// centerline.
pub fn move_units(state: &mut BattleState, config: &BattleConfig) {
    let spacing = config.layout.lane_spacing_fixed();
    let ids = state.units().ids();
    for id in ids {
        let Some(unit) = state.units().get(id) else {
            continue;
        };
        let destination = unit.target.and_then(|target| {
            state
                .target_position(target)
                .map(|position| (target.kind, position))
        });

        let Some(unit) = state.unit_mut(id) else {
            continue;
        };
        let Some((kind, destination)) = destination else {
            unit.engaged = false;
            continue;
        };

        if within(unit.position, unit.range, destination) {
            unit.engaged = true;
            continue;
        }
        unit.engaged = false;

        let step = step_length(unit.speed);
        let mut next = unit.position.step_toward(destination, step);
        if kind != TargetKind::Castle {
            let centerline = unit.lane.centerline_x(spacing);
            next.x = approach(next.x, centerline, step / Fixed::from_num(DRIFT_DIVISOR));
        }
        unit.position = next;
    }
}

/// Advance every catapult along its lane.
///
/// Catapults only move on the Y axis and hold as soon as any enemy
/// structure is in range.
pub fn move_catapults(state: &mut BattleState) {
    let ids = state.catapults().ids();
    for id in ids {
        let Some(catapult) = state.catapults().get(id) else {
            continue;
        };
        let destination = catapult.target.and_then(|target| state.target_position(target));
        let holding = catapult_has_structure_in_range(state, catapult);

        let Some(catapult) = state.catapults_mut().get_mut(id) else {
            continue;
        };
        let Some(destination) = destination else {
            continue;
        };
        if holding {
            catapult.state = CatapultState::Stationary;
            continue;
        }

        catapult.state = CatapultState::Moving;
        let step = step_length(catapult.speed);
        catapult.position.y = approach(catapult.position.y, destination.y, step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Lane, TargetRef, Team, UnitType};
    use crate::math::Vec2Fixed;
    use crate::targeting::resolve_targets;

    fn setup() -> (BattleConfig, BattleState) {
        let config = BattleConfig::default();
        let state = BattleState::new(&config, Default::default(), 0);
        (config, state)
    }

    #[test]
    fn test_step_length_uses_tick_rate() {
        assert_eq!(step_length(Fixed::from_num(20)), Fixed::ONE);
    }

    #[test]
    fn test_unit_advances_toward_target() {
        let (config, mut state) = setup();
        let id = state.spawn_unit(&config, Team::Player, UnitType::Cavalry, Lane::Center);
        resolve_targets(&state).apply(&mut state);
        let before = state.units().get(id).unwrap().position;
        move_units(&mut state, &config);
        let after = state.units().get(id).unwrap().position;
        assert_eq!(after.y - before.y, Fixed::from_num(2));
        assert!(!state.units().get(id).unwrap().engaged);
    }

    #[test]
    fn test_unit_in_range_holds_and_engages() {
        let (config, mut state) = setup();
        let id = state.spawn_unit(&config, Team::Player, UnitType::Archer, Lane::Center);
        if let Some(unit) = state.unit_mut(id) {
            unit.position = Vec2Fixed::from_ints(0, 400);
        }
        resolve_targets(&state).apply(&mut state);
        move_units(&mut state, &config);
        let unit = state.units().get(id).unwrap();
        assert!(unit.engaged);
        assert_eq!(unit.position, Vec2Fixed::from_ints(0, 400));
    }

    #[test]
    fn test_stale_target_holds_position() {
        let (config, mut state) = setup();
        let id = state.spawn_unit(&config, Team::Player, UnitType::Swordsman, Lane::Left);
        if let Some(unit) = state.unit_mut(id) {
            unit.target = Some(TargetRef::new(TargetKind::Catapult, 999));
        }
        let before = state.units().get(id).unwrap().position;
        move_units(&mut state, &config);
        assert_eq!(state.units().get(id).unwrap().position, before);
    }

    #[test]
    fn test_unit_drifts_back_to_centerline() {
        let (config, mut state) = setup();
        let id = state.spawn_unit(&config, Team::Player, UnitType::Swordsman, Lane::Left);
        if let Some(unit) = state.unit_mut(id) {
            unit.position = Vec2Fixed::from_ints(-121, 100);
        }
        resolve_targets(&state).apply(&mut state);
        let centerline = Fixed::from_num(-120);

        move_units(&mut state, &config);
        let x = state.units().get(id).unwrap().position.x;
        assert!(x > Fixed::from_num(-121) && x <= centerline, "x = {x}");

        for _ in 0..3 {
            move_units(&mut state, &config);
        }
        assert_eq!(state.units().get(id).unwrap().position.x, centerline);
    }

    #[test]
    fn test_catapult_moves_on_y_only_and_stops_in_range() {
        let (config, mut state) = setup();
        let id = state.spawn_catapult(&config, Team::Player, Lane::Right);
        resolve_targets(&state).apply(&mut state);
        let start = state.catapults().get(id).unwrap().position;
        move_catapults(&mut state);
        let moved = state.catapults().get(id).unwrap();
        assert_eq!(moved.position.x, start.x);
        assert!(moved.position.y > start.y);
        assert_eq!(moved.state, CatapultState::Moving);

        if let Some(catapult) = state.catapults_mut().get_mut(id) {
            catapult.position.y = Fixed::from_num(350);
        }
        move_catapults(&mut state);
        let held = state.catapults().get(id).unwrap();
        assert_eq!(held.state, CatapultState::Stationary);
        assert_eq!(held.position.y, Fixed::from_num(350));
    }
}
