//! Headless battle runner implementation.

use std::io::{self, BufRead, Write};

use tracing::{debug, info, warn};

use siege_core::prelude::*;

use crate::protocol::{Command, Response, StateOutput};
use crate::scenario::Scenario;

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output state after every tick (vs only on query).
    pub auto_state_output: bool,
    /// Scenario name or file to load on startup (default: skirmish).
    pub scenario_path: Option<String>,
    /// Seed override; the scenario seed is used otherwise.
    pub seed: Option<u64>,
}

/// Headless runner for controller-driven battles.
pub struct HeadlessRunner {
    config: HeadlessConfig,
}

impl HeadlessRunner {
    /// Create a new headless runner with default config.
    pub fn new() -> Self {
        Self {
            config: HeadlessConfig::default(),
        }
    }

    /// Create a runner with custom configuration.
    pub fn with_config(config: HeadlessConfig) -> Self {
        Self { config }
    }

    /// Run the session on stdin/stdout.
    pub fn run(self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with_io(stdin.lock(), stdout.lock())
    }

    /// Run the session: read JSON commands from `input`, write responses to
    /// `output`. Returns at end of input or after `quit`.
    pub fn run_with_io<R: BufRead, W: Write>(self, input: R, mut output: W) -> io::Result<()> {
        let scenario = match self.load_scenario() {
            Ok(scenario) => scenario,
            Err(message) => {
                return send(&mut output, &Response::error(message, None));
            }
        };
        let seed = self.config.seed.unwrap_or(scenario.seed);
        let battle = match scenario.start_battle(seed) {
            Ok(battle) => battle,
            Err(e) => {
                return send(
                    &mut output,
                    &Response::error(format!("Failed to start battle: {e}"), None),
                );
            }
        };
        info!(scenario = %scenario.name, seed, "Headless session started");

        let mut session = Session {
            battle,
            scenario,
            auto_state: self.config.auto_state_output,
            reported: false,
        };
        send(&mut output, &Response::ready(session.battle.current_tick()))?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let cmd = match Command::from_json(line) {
                Ok(cmd) => cmd,
                Err(e) => {
                    send(
                        &mut output,
                        &Response::error(format!("Parse error: {e}"), None),
                    )?;
                    continue;
                }
            };

            debug!(cmd = cmd.name(), "Processing command");
            let quit = matches!(cmd, Command::Quit);
            for response in session.handle(cmd) {
                send(&mut output, &response)?;
            }
            if quit {
                info!("Quit requested");
                return Ok(());
            }
        }

        info!("Input closed");
        Ok(())
    }

    fn load_scenario(&self) -> Result<Scenario, String> {
        match &self.config.scenario_path {
            Some(name) => {
                Scenario::resolve(name).map_err(|e| format!("Failed to load scenario: {e}"))
            }
            None => Ok(Scenario::skirmish()),
        }
    }
}

impl Default for HeadlessRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn send<W: Write>(output: &mut W, response: &Response) -> io::Result<()> {
    output.write_all(response.to_json_line().as_bytes())?;
    output.flush()
}

/// One battle under external control.
struct Session {
    battle: Battle,
    scenario: Scenario,
    auto_state: bool,
    reported: bool,
}

impl Session {
    fn handle(&mut self, cmd: Command) -> Vec<Response> {
        let name = cmd.name();
        match cmd {
            Command::Tick { count } => self.advance(count),
            Command::Query => vec![self.state()],
            Command::Deploy { .. } | Command::Fire { .. } => {
                let Some(command) = cmd.player_command() else {
                    return vec![Response::error("Not a battle command", Some(name))];
                };
                match self.battle.submit(command) {
                    Ok(()) => vec![Response::ack(name)],
                    Err(reason) => vec![Response::Rejected {
                        cmd: name.to_string(),
                        reason,
                    }],
                }
            }
            Command::Hash => vec![Response::StateHash {
                tick: self.battle.current_tick(),
                hash: self.battle.state_hash(),
            }],
            Command::Abort => match self.battle.abort() {
                Some(events) => {
                    let mut out = vec![Response::Events {
                        tick: events.tick,
                        events: events.events,
                    }];
                    out.extend(self.report_result());
                    out
                }
                None => vec![Response::error("Battle is already over", Some(name))],
            },
            Command::Quit => vec![Response::Bye],
        }
    }

    fn advance(&mut self, count: u32) -> Vec<Response> {
        if self.battle.is_over() {
            return vec![Response::error("Battle is over", Some("tick"))];
        }

        let mut out = Vec::new();
        for _ in 0..count {
            if self.battle.is_over() {
                break;
            }
            let now = self.battle.current_tick();
            let scripted: Vec<PlayerCommand> = self.scenario.commands_at(now).collect();
            for command in scripted {
                if let Err(reason) = self.battle.submit(command) {
                    warn!(tick = now, ?command, %reason, "Scripted command rejected");
                }
            }

            let events = self.battle.tick();
            if !events.is_empty() {
                out.push(Response::Events {
                    tick: events.tick,
                    events: events.events,
                });
            }
            if self.auto_state {
                out.push(self.state());
            }
        }
        out.extend(self.report_result());
        out
    }

    fn state(&self) -> Response {
        Response::State(StateOutput::from_snapshot(
            &self.battle.snapshot(),
            self.battle.state_hash(),
        ))
    }

    /// The result is reported once, on the first call after the battle ends.
    fn report_result(&mut self) -> Option<Response> {
        if self.reported || !self.battle.is_over() {
            return None;
        }
        self.reported = true;
        self.battle
            .take_result()
            .map(|result| Response::BattleOver { result })
    }
}
