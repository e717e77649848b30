//! Test flow for the single-cycle stage: environment construction, the run
//! phase over the configured sequences, and the final verdict.

use crate::activity::ActivityIndicator;
use crate::agent::Agent;
use crate::bus::SingleCycleBus;
use crate::config::{BusBinding, ConfigDb, RunConfig};
use crate::driver::SingleCycleDriver;
use crate::dut::SingleCycle;
use crate::error::{ConfigError, HarnessError, SimulationError};
use crate::monitor::{SingleCycleMonitor, SingleCycleSampler};
use crate::phase::Phase;
use crate::scoreboard::{ControlBitPairs, ControlBits, DataValues, Scoreboard, ScoreboardSummary};
use crate::sequence::SequenceSpec;
use crate::sequence_item::SequenceItem;
use crate::sequencer::Sequencer;
use crate::signal::Bus;
use crate::simulation::{Process, Simulation};
use crate::transaction::Transaction;
use log::{error, info};
use serde::Serialize;
use std::cell::{Ref, RefCell};
use std::io::Stderr;
use std::path::PathBuf;
use std::rc::Rc;

/// Process exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnCode {
    Success = 0,
    Fatal = 1,
    TestFail = 2,
    /// No verdict was reached.
    NotSet = 3,
}

impl ReturnCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

const PROGRESS_CYCLES_PER_TIC: u32 = 1_000;

/// Agent and monitor for one stage.
#[derive(Debug)]
pub struct Environment {
    pub agent: Agent<SingleCycleDriver>,
    pub monitor: SingleCycleMonitor,
}

impl Environment {
    pub fn build(
        scope: &str,
        db: &ConfigDb,
        bus: &SingleCycleBus,
        seed: u64,
    ) -> Result<Self, HarnessError> {
        let agent_scope = format!("{scope}.agent");
        let agent = Agent::build(&agent_scope, db, bus, seed, || {
            SingleCycleDriver::new(format!("{agent_scope}.driver"))
        })?;
        let monitor = SingleCycleMonitor::build(
            &format!("{scope}.monitor"),
            db,
            bus,
            SingleCycleSampler,
        )?;
        Ok(Self { agent, monitor })
    }
}

type SharedScoreboard = Rc<RefCell<dyn Scoreboard<Transaction>>>;

type Stage = Box<dyn Process<SingleCycleBus>>;

/// The simulated stage, its environment and the scoreboards listening to
/// the monitor.
pub struct TestBench {
    sim: Simulation<SingleCycleBus>,
    dut: Stage,
    env: Environment,
    scoreboards: Vec<SharedScoreboard>,
}

impl std::fmt::Debug for TestBench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestBench")
            .field("sim", &self.sim)
            .field("dut", &self.dut.name())
            .field("env", &self.env)
            .field("scoreboards", &self.scoreboards.len())
            .finish()
    }
}

pub const TEST_BENCH_SCOPE: &str = "test_bench";

impl TestBench {
    /// The configuration every test bench publishes for its components.
    pub fn default_db(bus: &SingleCycleBus) -> ConfigDb {
        let mut db = ConfigDb::new();
        db.set(&format!("{TEST_BENCH_SCOPE}.*"), "vif", BusBinding::new(bus.name()));
        db.set(&format!("{TEST_BENCH_SCOPE}.*"), "is_active", true);
        db
    }

    pub fn build(config: &RunConfig) -> Result<Self, HarnessError> {
        let bus = SingleCycleBus::default();
        let db = Self::default_db(&bus);
        Self::build_with(config, bus, &db)
    }

    pub fn build_with(
        config: &RunConfig,
        bus: SingleCycleBus,
        db: &ConfigDb,
    ) -> Result<Self, HarnessError> {
        config.validate()?;
        let mut sim = Simulation::new(bus);
        sim.add_clock(config.clock_period_ps, config.initial_delay_ps);
        if let Some(path) = &config.vcd {
            sim.trace_to(path)?;
        }
        let mut env = Environment::build(
            &format!("{TEST_BENCH_SCOPE}.environment"),
            db,
            sim.bus(),
            config.seed,
        )?;
        let scoreboards: Vec<SharedScoreboard> = vec![
            Rc::new(RefCell::new(ControlBits::new())),
            Rc::new(RefCell::new(DataValues::new())),
            Rc::new(RefCell::new(ControlBitPairs::new())),
        ];
        for scoreboard in &scoreboards {
            env.monitor.connect(scoreboard.clone());
        }
        Ok(Self {
            sim,
            dut: Box::new(SingleCycle::default()),
            env,
            scoreboards,
        })
    }

    /// Replaces the reference stage with another implementation of the same
    /// bus.
    pub fn with_stage(mut self, stage: impl Process<SingleCycleBus> + 'static) -> Self {
        self.dut = Box::new(stage);
        self
    }

    /// Runs until the next rising edge has been processed.
    pub fn cycle(&mut self) -> Result<u64, HarnessError> {
        let Self { sim, dut, env, .. } = self;
        let mut processes: [&mut dyn Process<SingleCycleBus>; 3] =
            [dut.as_mut(), &mut env.agent, &mut env.monitor];
        sim.cycle(&mut processes)
    }

    pub fn simulation(&self) -> &Simulation<SingleCycleBus> {
        &self.sim
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn scoreboards(&self) -> impl Iterator<Item = Ref<'_, dyn Scoreboard<Transaction>>> {
        self.scoreboards.iter().map(|s| s.borrow())
    }

    /// Every scoreboard passes.
    pub fn is_pass(&self) -> bool {
        self.scoreboards().all(|s| s.is_pass())
    }

    pub fn finish(&mut self) -> Result<(), HarnessError> {
        self.sim.finish()
    }
}

/// Machine-readable outcome of [`Test::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub cycles: u64,
    pub time_ps: u64,
    pub sequences: Vec<String>,
    pub items: u64,
    pub transactions: u64,
    pub scoreboards: Vec<ScoreboardSummary>,
    pub passed: bool,
    pub return_code: ReturnCode,
}

impl RunSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub struct Test {
    config: RunConfig,
    bench: TestBench,
    phase: Phase,
    return_code: ReturnCode,
}

impl std::fmt::Debug for Test {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Test")
            .field("bench", &self.bench)
            .field("return_code", &self.return_code)
            .finish()
    }
}

type Progress = Option<ActivityIndicator<Stderr>>;

fn active_sequencer(bench: &mut TestBench) -> Result<&mut Sequencer<SequenceItem>, ConfigError> {
    bench
        .env
        .agent
        .sequencer_mut()
        .ok_or_else(|| ConfigError::Invalid("the agent is passive".to_string()))
}

impl Test {
    pub fn builder() -> TestBuilder {
        TestBuilder::default()
    }

    pub fn new(config: RunConfig) -> Result<Self, HarnessError> {
        let bench = TestBench::build(&config)?;
        Ok(Self::with_bench(config, bench))
    }

    /// Runs on an already built bench, e.g. one with a custom configuration
    /// table.
    pub fn with_bench(config: RunConfig, bench: TestBench) -> Self {
        Self {
            config,
            bench,
            phase: Phase::new("run"),
            return_code: ReturnCode::NotSet,
        }
    }

    pub fn bench(&self) -> &TestBench {
        &self.bench
    }

    pub fn return_code(&self) -> ReturnCode {
        self.return_code
    }

    fn step(&mut self, progress: &mut Progress) -> Result<(), HarnessError> {
        let time = self.bench.cycle()?;
        if time > self.config.timeout_ps {
            return Err(SimulationError::Timeout {
                time,
                objections: self.phase.objection_count(),
            }
            .into());
        }
        if let Some(indicator) = progress.as_mut() {
            indicator.tic()?;
        }
        Ok(())
    }

    /// Runs every configured sequence to completion, in order. Any error is
    /// fatal and leaves [`ReturnCode::Fatal`] behind.
    pub fn run(&mut self) -> Result<(), HarnessError> {
        let result = self.run_phase();
        if let Err(e) = &result {
            error!("run aborted at {}ps: {e}", self.bench.sim.time());
            self.return_code = ReturnCode::Fatal;
        }
        result
    }

    fn run_phase(&mut self) -> Result<(), HarnessError> {
        let objection = self.phase.raise_objection("test");
        let mut progress: Progress = self
            .config
            .progress
            .then(|| ActivityIndicator::stderr(PROGRESS_CYCLES_PER_TIC));
        let specs: Vec<SequenceSpec> = self.config.sequences.clone();

        for spec in &specs {
            let sequence = spec.build()?;
            // the previous sequence hands over once its last item is out
            while !active_sequencer(&mut self.bench)?.accepts_sequence() {
                self.step(&mut progress)?;
            }
            info!("SEQUENCE_START: {}", sequence.name());
            active_sequencer(&mut self.bench)?.start(sequence.as_ref(), &self.phase)?;
        }
        // the test's own objection stays raised
        while self.phase.objection_count() > 1 {
            self.step(&mut progress)?;
        }

        // the monitor publishes the last item's transaction one edge later
        self.step(&mut progress)?;
        drop(objection);
        if let Some(indicator) = progress.as_mut() {
            indicator.complete()?;
        }
        info!(
            "run stopped at {}ps after {} cycles",
            self.bench.sim.time(),
            self.bench.sim.cycles()
        );
        self.bench.finish()
    }

    /// Logs every scoreboard's tally and the verdict, and sets the return
    /// code.
    pub fn report(&mut self) -> RunSummary {
        for scoreboard in self.bench.scoreboards() {
            info!("SCORE_BOARD: {}", scoreboard.report());
        }
        let passed = self.bench.is_pass();
        if passed {
            info!("PASS/FAIL: ** UVM TEST PASSED **");
            self.return_code = ReturnCode::Success;
        } else {
            error!("PASS/FAIL: ** UVM TEST FAIL **");
            self.return_code = ReturnCode::TestFail;
        }
        self.summary()
    }

    pub fn summary(&self) -> RunSummary {
        let sim = self.bench.simulation();
        let env = self.bench.environment();
        RunSummary {
            seed: self.config.seed,
            cycles: sim.cycles(),
            time_ps: sim.time(),
            sequences: env
                .agent
                .sequencer()
                .map_or_else(Vec::new, |s| s.completed().to_vec()),
            items: env.agent.sequencer().map_or(0, |s| s.issued()),
            transactions: env.monitor.published(),
            scoreboards: self.bench.scoreboards().map(|s| s.summary()).collect(),
            passed: self.bench.is_pass(),
            return_code: self.return_code,
        }
    }
}

/// Fluent construction of a [`Test`] on top of [`RunConfig`].
#[derive(Debug, Default)]
pub struct TestBuilder {
    config: RunConfig,
    sequences: Option<Vec<SequenceSpec>>,
}

impl TestBuilder {
    /// Start from `config` instead of the defaults.
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn clock_period_ps(mut self, period: u64) -> Self {
        self.config.clock_period_ps = period;
        self
    }

    pub fn timeout_ps(mut self, timeout: u64) -> Self {
        self.config.timeout_ps = timeout;
        self
    }

    /// Enable VCD dumping to the specified file.
    pub fn vcd<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.vcd = Some(path.into());
        self
    }

    pub fn progress(mut self, enable: bool) -> Self {
        self.config.progress = enable;
        self
    }

    /// Appends a sequence. The first call replaces the configured list.
    pub fn sequence(mut self, spec: SequenceSpec) -> Self {
        self.sequences.get_or_insert_with(Vec::new).push(spec);
        self
    }

    pub fn config(&self) -> RunConfig {
        let mut config = self.config.clone();
        if let Some(sequences) = &self.sequences {
            config.sequences = sequences.clone();
        }
        config
    }

    pub fn build(self) -> Result<Test, HarnessError> {
        Test::new(self.config())
    }
}
