//! End-to-end tests for the headless runner and its bundled data files.

use std::path::PathBuf;

use siege_core::prelude::*;
use siege_headless::{
    batch::{run_batch, BatchConfig, BatchResults},
    game_runner::{run_game, run_game_observed, GameConfig},
    ledger::JsonLedger,
    protocol::Response,
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::Scenario,
    strategies::{LanePolicy, Strategy},
};

fn data_file(dir: &str, name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(dir).join(name)
}

fn session(input: &str, config: HeadlessConfig) -> Vec<Response> {
    let mut out = Vec::new();
    HeadlessRunner::with_config(config)
        .run_with_io(input.as_bytes(), &mut out)
        .unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_bundled_scenarios_load() {
    for name in ["skirmish.ron", "arena.ron", "siege.ron"] {
        let scenario = Scenario::load(data_file("scenarios", name)).unwrap();
        assert!(scenario.start_battle(scenario.seed).is_ok(), "{name}");
    }
}

#[test]
fn test_bundled_arena_matches_builtin_rules() {
    let file = Scenario::load(data_file("scenarios", "arena.ron")).unwrap();
    let builtin = Scenario::arena();
    assert_eq!(file.config, builtin.config);
    assert_eq!(file.player_army, builtin.player_army);
}

#[test]
fn test_bundled_strategy_loads() {
    let path = data_file("strategies", "flank.ron");
    let strategy = Strategy::resolve(path.to_str().unwrap()).unwrap();
    assert_eq!(strategy.name, "flank");
    assert_eq!(strategy.lanes, LanePolicy::Focus(Lane::Left));
    assert!(strategy.manual_fire);
}

#[test]
fn test_siege_script_deploys_opening() {
    let scenario = Scenario::load(data_file("scenarios", "siege.ron")).unwrap();
    let mut config = GameConfig::new(scenario, Strategy::idle());
    config.max_ticks = 1;
    let mut log: Vec<BattleEvent> = Vec::new();
    let record = run_game_observed(&config, &mut log).unwrap();

    let player_spawns = log
        .iter()
        .filter(|e| {
            matches!(
                e,
                BattleEvent::UnitSpawned {
                    team: Team::Player,
                    ..
                }
            )
        })
        .count();
    assert_eq!(player_spawns, 2);
    assert_eq!(record.metrics.commands_accepted, 2);
}

#[test]
fn test_protocol_session_runs_to_completion() {
    let config = HeadlessConfig {
        scenario_path: Some("arena".to_string()),
        seed: Some(5),
        ..HeadlessConfig::default()
    };
    let input = concat!(
        r#"{"cmd":"deploy","unit_type":"Swordsman","lane":"Center"}"#,
        "\n",
        r#"{"cmd":"tick","count":6000}"#,
        "\n",
        r#"{"cmd":"query"}"#,
        "\n",
        r#"{"cmd":"quit"}"#,
        "\n",
    );
    let out = session(input, config);

    assert!(matches!(out.first(), Some(Response::Ready { .. })));
    assert_eq!(out.last(), Some(&Response::Bye));
    let over: Vec<&BattleResult> = out
        .iter()
        .filter_map(|r| match r {
            Response::BattleOver { result } => Some(result),
            _ => None,
        })
        .collect();
    assert!(over.len() <= 1);

    let state = out.iter().find_map(|r| match r {
        Response::State(state) => Some(state),
        _ => None,
    });
    let state = state.unwrap();
    assert_eq!(state.outcome.is_terminal(), over.len() == 1);
}

#[test]
fn test_play_then_persist() {
    let config = GameConfig::new(Scenario::arena(), Strategy::rush()).with_seed(21);
    let record = run_game(&config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.jsonl");
    let mut ledger = JsonLedger::new(&path, "arena", 21);
    deliver_with_retry(&mut ledger, &record.result, 3).unwrap();

    let entries = JsonLedger::read_all(&path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].result, record.result);
}

#[test]
fn test_batch_round_trips_through_disk() {
    let mut config = BatchConfig::new(Scenario::arena(), Strategy::balanced(), 4).with_seed(9);
    config.max_ticks = 900;
    let results = run_batch(config);

    let dir = tempfile::tempdir().unwrap();
    let path = BatchResults::default_path(&dir.path().join("out"));
    results.save(&path).unwrap();
    let loaded = BatchResults::load(&path).unwrap();

    assert_eq!(loaded.games, results.games);
    assert_eq!(loaded.summary.total_games, 4);
    assert_eq!(loaded.summary.player_wins, results.summary.player_wins);
}
