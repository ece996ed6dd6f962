//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a battle produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Battles must be fully reproducible so that saved battles resume
//! exactly and batch statistics are stable. Sources of non-determinism
//! include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`siege_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Entity stores are ordered maps and every
//!   system walks them in ascending id order.
//!
//! - **System randomness**: Tower casualties come from an injected
//!   [`CasualtyRoll`](siege_core::combat::CasualtyRoll) seeded per battle.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system determinism (movement, combat, etc.)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full battles are reproducible
//! 4. **Parallel tests**: Running N battles in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use siege_core::combat::SeededCasualties;
use siege_core::simulation::Battle;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance by one tick
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a battle twice from the same setup and compare final hashes.
pub fn verify_battle_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Battle,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |battle| {
            battle.tick();
        },
        |battle| battle.state_hash(),
    )
    .is_deterministic
}

/// Run N battles on scoped threads and collect their final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling
/// or memory layout differences.
pub fn run_parallel_battles<F>(setup_fn: F, num_battles: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Battle + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_battles)
            .map(|_| {
                s.spawn(|| {
                    let mut battle = setup_fn();
                    for _ in 0..num_ticks {
                        battle.tick();
                    }
                    battle.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("battle thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two battle runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs match throughout, `Some(tick)` for the first tick
/// after which their hashes differ.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Battle,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        first.tick();
        second.tick();

        if first.state_hash() != second.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a save/restore round trip mid-battle changes nothing,
/// including the rest of the battle.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Battle,
{
    let mut battle = setup_fn();
    for _ in 0..num_ticks {
        battle.tick();
    }

    let Ok(bytes) = battle.serialize() else {
        return false;
    };
    let Ok(mut restored) = Battle::<SeededCasualties>::deserialize(&bytes) else {
        return false;
    };
    if battle.state_hash() != restored.state_hash() {
        return false;
    }

    for _ in 0..num_ticks {
        battle.tick();
        restored.tick();
    }
    battle.state_hash() == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for battle testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use proptest::prelude::*;
    use siege_core::commands::PlayerCommand;
    use siege_core::components::{Lane, UnitType};
    use siege_core::resources::ArmyRoster;

    use crate::fixtures::ScriptedCommand;

    /// Any unit type.
    pub fn arb_unit_type() -> impl Strategy<Value = UnitType> {
        proptest::sample::select(UnitType::ALL.to_vec())
    }

    /// Any lane.
    pub fn arb_lane() -> impl Strategy<Value = Lane> {
        proptest::sample::select(Lane::ALL.to_vec())
    }

    /// A deploy command.
    pub fn arb_deploy_command() -> impl Strategy<Value = PlayerCommand> {
        (arb_unit_type(), arb_lane())
            .prop_map(|(unit_type, lane)| PlayerCommand::DeployBattalion { unit_type, lane })
    }

    /// A manual fire command against a plausible catapult id.
    pub fn arb_manual_fire_command() -> impl Strategy<Value = PlayerCommand> {
        (1u64..40, arb_lane()).prop_map(|(catapult, target_lane)| PlayerCommand::ManualFire {
            catapult,
            target_lane,
        })
    }

    /// Any player command, mostly deploys.
    pub fn arb_command() -> impl Strategy<Value = PlayerCommand> {
        prop_oneof![
            4 => arb_deploy_command(),
            1 => arb_manual_fire_command(),
        ]
    }

    /// A command script spread over the first `max_tick` ticks.
    pub fn arb_script(max_len: usize, max_tick: u64) -> impl Strategy<Value = Vec<ScriptedCommand>> {
        proptest::collection::vec(
            (0..max_tick, arb_command()).prop_map(|(tick, command)| ScriptedCommand { tick, command }),
            0..max_len,
        )
    }

    /// A roster with 0-5 battalions of each type.
    pub fn arb_roster() -> impl Strategy<Value = ArmyRoster> {
        proptest::collection::vec(0u32..=5, UnitType::ALL.len()).prop_map(|counts| {
            let mut roster = ArmyRoster::new();
            for (unit_type, count) in UnitType::ALL.into_iter().zip(counts) {
                roster.set(unit_type, count);
            }
            roster
        })
    }

    /// Initial mana balance.
    pub fn arb_mana() -> impl Strategy<Value = u32> {
        0u32..=200
    }

    /// Battle seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}
