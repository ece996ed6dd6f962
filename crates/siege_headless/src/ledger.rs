//! Best-effort persistence of battle results.
//!
//! The ledger appends one JSON line per finished battle. It is a
//! [`ResultSink`]: a failed write is reported to the caller, which retries
//! through [`deliver_with_retry`], and never changes the battle outcome.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use siege_core::prelude::*;

/// One persisted battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Scenario name.
    pub scenario: String,
    /// Seed the battle ran with.
    pub seed: u64,
    /// The result record.
    pub result: BattleResult,
}

/// Appends results to a JSON-lines file.
#[derive(Debug, Clone)]
pub struct JsonLedger {
    path: PathBuf,
    scenario: String,
    seed: u64,
}

impl JsonLedger {
    /// Ledger at `path`, tagging entries with the scenario and seed.
    pub fn new(path: impl Into<PathBuf>, scenario: impl Into<String>, seed: u64) -> Self {
        Self {
            path: path.into(),
            scenario: scenario.into(),
            seed,
        }
    }

    /// File this ledger writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry in a ledger file.
    pub fn read_all(path: &Path) -> std::io::Result<Vec<LedgerEntry>> {
        let file = std::fs::File::open(path)?;
        BufReader::new(file)
            .lines()
            .filter(|line| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
            .map(|line| {
                let line = line?;
                serde_json::from_str(&line).map_err(std::io::Error::other)
            })
            .collect()
    }
}

impl ResultSink for JsonLedger {
    fn deliver(&mut self, result: &BattleResult) -> Result<(), SinkError> {
        let entry = LedgerEntry {
            scenario: self.scenario.clone(),
            seed: self.seed,
            result: result.clone(),
        };
        let mut line =
            serde_json::to_string(&entry).map_err(|e| SinkError::Rejected(e.to_string()))?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        tracing::debug!(path = %self.path.display(), winner = ?result.winner, "Result persisted");
        Ok(())
    }
}
