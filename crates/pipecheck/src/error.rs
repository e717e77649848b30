use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Harness programming defects. Never recovered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("sequence `{name}` is already running; bodies are not reentrant")]
    ReentrantSequence { name: String },
    #[error("sequence `{name}`: count {count} is illogical, it must be at least 1")]
    InvalidCount { name: String, count: u32 },
    #[error("transaction value read before it was sampled")]
    NotGood,
    #[error("get_next_item called while item #{serial} is still outstanding")]
    ItemOutstanding { serial: u64 },
    #[error("item_done called with no outstanding item")]
    NoItemOutstanding,
    #[error("sample {bits:#x} does not fit in {width} control bits")]
    InvalidSample { bits: usize, width: usize },
    #[error("activity indicator: {0}")]
    Activity(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no configuration value `{field}` visible from scope `{scope}`")]
    MissingKey { scope: String, field: String },
    #[error("configuration value `{field}` in scope `{scope}` is a {found}, expected a {expected}")]
    TypeMismatch {
        scope: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("bus binding `{requested}` does not name the simulated bus `{available}`")]
    UnknownBus { requested: String, available: String },
    #[error("invalid run configuration: {0}")]
    Invalid(String),
    #[error("cannot parse run configuration: {0}")]
    Parse(String),
    #[error("cannot read run configuration {}: {message}", path.display())]
    Io {
        path: PathBuf,
        kind: io::ErrorKind,
        message: String,
    },
}

/// Structural contract violations by the module under test.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("{stage}: single-cycle stage observed a stall at t={time}ps")]
    StallAsserted { stage: String, time: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("bus did not settle after {limit} delta cycles at t={time}ps")]
    CombinationalLoop { limit: usize, time: u64 },
    #[error("run timed out at t={time}ps with {objections} objection(s) raised")]
    Timeout { time: u64, objections: usize },
    #[error("no clock is armed; nothing left to simulate")]
    NoClock,
}

/// Every fatal condition the harness can hit. Verification mismatches are
/// scoreboard tallies, never errors.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("USAGE: {0}")]
    Usage(#[from] UsageError),
    #[error("CONFIG: {0}")]
    Config(#[from] ConfigError),
    #[error("PROTOCOL: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
