//! Layered verification harness for clocked pipeline stages.
//!
//! A [`Test`] drives [`sequence`]s of requests into a [`dut`] through an
//! [`agent`], reconstructs transactions with a [`monitor`] and scores them
//! against the [`predictor`].

pub mod activity;
pub mod agent;
pub mod analysis;
pub mod bus;
pub mod config;
pub mod counters;
pub mod driver;
pub mod dut;
pub mod error;
mod format;
pub mod lockstep;
pub mod monitor;
pub mod phase;
pub mod predictor;
pub mod request;
mod scheduler;
pub mod scoreboard;
pub mod sequence;
pub mod sequence_item;
pub mod sequencer;
pub mod signal;
pub mod simulation;
mod testbench;
pub mod transaction;
mod vcd;

pub(crate) use fxhash::FxHashMap as HashMap;

pub use config::{ConfigDb, RunConfig};
pub use error::HarnessError;
pub use format::binary;
pub use lockstep::{LockstepConfig, LockstepReport, run_lockstep};
pub use sequence::{SequenceKind, SequenceSpec};
pub use simulation::{DELTA_LIMIT, Process, Simulation};
pub use testbench::{
    Environment, ReturnCode, RunSummary, TEST_BENCH_SCOPE, Test, TestBench, TestBuilder,
};
