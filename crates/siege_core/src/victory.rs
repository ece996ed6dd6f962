//! Win condition evaluation.

use crate::components::Team;
use crate::state::{BattleState, Outcome};

/// Decide the outcome after combat.
///
/// One fallen castle hands victory to the other side. If both fall in the
/// same tick, `defender` wins. Returns `Outcome::Ongoing` while both stand.
#[must_use]
pub fn evaluate(state: &BattleState, defender: Team) -> Outcome {
    let player_down = state.castle(Team::Player).is_destroyed();
    let enemy_down = state.castle(Team::Enemy).is_destroyed();
    match (player_down, enemy_down) {
        (false, false) => Outcome::Ongoing,
        (true, true) => Outcome::Victory(defender),
        (true, false) => Outcome::Victory(Team::Enemy),
        (false, true) => Outcome::Victory(Team::Player),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BattleConfig;

    fn state() -> BattleState {
        BattleState::new(&BattleConfig::default(), Default::default(), 0)
    }

    #[test]
    fn test_standing_castles_keep_battle_going() {
        assert_eq!(evaluate(&state(), Team::Enemy), Outcome::Ongoing);
    }

    #[test]
    fn test_single_fallen_castle_decides() {
        let mut state = state();
        state.castle_mut(Team::Enemy).health.apply_damage(u32::MAX);
        assert_eq!(evaluate(&state, Team::Enemy), Outcome::Victory(Team::Player));
    }

    #[test]
    fn test_simultaneous_fall_goes_to_defender() {
        let mut state = state();
        state.castle_mut(Team::Enemy).health.apply_damage(u32::MAX);
        state.castle_mut(Team::Player).health.apply_damage(u32::MAX);
        assert_eq!(evaluate(&state, Team::Enemy), Outcome::Victory(Team::Enemy));
        assert_eq!(evaluate(&state, Team::Player), Outcome::Victory(Team::Player));
    }
}
