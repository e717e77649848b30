//! Randomised control stress of the reference stage, checked against the
//! predictor every cycle without any sequencing machinery in between.

use crate::activity::ActivityIndicator;
use crate::bus::{RESET_ASSERTED, RESET_RELEASED, SingleCycleBus};
use crate::counters::PassFailCount;
use crate::dut::SingleCycle;
use crate::error::HarnessError;
use crate::monitor::{MonitorState, Sampler, SingleCycleSampler};
use crate::predictor::predict;
use crate::request::ControlBits;
use crate::simulation::{Process, Simulation};
use crate::transaction::{OutputState, Stimuli, Transaction};
use log::{error, info, trace};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCKSTEP_SEED: u64 = 0xe255_da1f_4156_6654;
pub const DEFAULT_LOCKSTEP_CYCLES: u64 = 100_000;
const RESET_CYCLES: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockstepConfig {
    pub seed: u64,
    pub cycles: u64,
    pub clock_period_ps: u64,
    /// Cycles per progress tic; no progress output when `None`.
    pub progress: Option<u32>,
}

impl Default for LockstepConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_LOCKSTEP_SEED,
            cycles: DEFAULT_LOCKSTEP_CYCLES,
            clock_period_ps: crate::config::DEFAULT_CLOCK_PERIOD_PS,
            progress: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockstepReport {
    pub seed: u64,
    pub cycles: u64,
    pub count: PassFailCount,
}

impl LockstepReport {
    pub fn is_pass(&self) -> bool {
        self.count.is_pass()
    }
}

/// One 64-bit draw split into independent control bits: reset released
/// 63/64, is_advance 1/4, is_error 1/64, is_flush 1/16, is_valid 1/2.
pub fn stress_controls(r: u64) -> ControlBits {
    ControlBits {
        reset: if r & 0x3f != 0 {
            RESET_RELEASED
        } else {
            RESET_ASSERTED
        },
        is_advance: (r >> 8) & 0x3 == 0,
        is_error: (r >> 16) & 0x3f == 0,
        is_flush: (r >> 24) & 0xf == 0,
        is_valid: (r >> 32) & 0x1 == 0,
    }
}

/// Drives random controls and checks the stage's control outputs.
struct Stressor {
    rng: ChaCha8Rng,
    sampler: SingleCycleSampler,
    state: MonitorState<OutputState, Stimuli>,
    driven: u64,
    count: PassFailCount,
}

impl Stressor {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            sampler: SingleCycleSampler,
            state: MonitorState::Start,
            driven: 0,
            count: PassFailCount::default(),
        }
    }

    fn check(&mut self, time: u64, transaction: &Transaction) {
        let expected = predict(&transaction.state_0, &transaction.stimuli).ctl;
        let observed = transaction.state_1.ctl;
        self.count.record(observed == expected);
        if observed != expected {
            error!(
                "lockstep@{time}: CONTROL OUTPUT VALUE TEST FAILED: \
                 Observed [A/E/S/V]: {observed}, Expected [A/E/S/V]: {expected}; \
                 from {:?} with {:?}",
                transaction.state_0.ctl, transaction.stimuli.ctl
            );
        }
    }

    fn drive(&mut self, bus: &mut SingleCycleBus) {
        let (ctl, label) = if self.driven < RESET_CYCLES {
            (ControlBits::default(), format!("LOCKSTEP RESET: #{}", self.driven + 1))
        } else {
            let cycle = self.driven - RESET_CYCLES;
            (stress_controls(self.rng.next_u64()), format!("LOCKSTEP cycle {cycle}"))
        };
        let i_binary: u32 = self.rng.r#gen();
        bus.set_control_inputs(ctl.reset, ctl.is_advance, ctl.is_flush, ctl.is_valid);
        bus.set_data_inputs(!i_binary);
        bus.set_debug_inputs(i_binary, self.driven as u32, ctl.is_error, &label);
        self.driven += 1;
    }
}

impl Process<SingleCycleBus> for Stressor {
    fn name(&self) -> &str {
        "lockstep"
    }

    fn posedge(&mut self, time: u64, bus: &mut SingleCycleBus) -> Result<(), HarnessError> {
        let state_1 = self.sampler.sample_state(bus);
        let stimuli = self.sampler.sample_stimuli(bus);
        let (next, completed) = self.state.advance(state_1, stimuli);
        self.state = next;
        if let Some(transaction) = completed {
            trace!("lockstep@{time}: {transaction:?}");
            self.check(time, &transaction);
        }
        self.drive(bus);
        Ok(())
    }
}

/// Runs two reset cycles and then `config.cycles` random ones.
pub fn run_lockstep(config: &LockstepConfig) -> Result<LockstepReport, HarnessError> {
    let mut sim = Simulation::new(SingleCycleBus::default());
    sim.add_clock(config.clock_period_ps, 0);
    let mut dut = SingleCycle::default();
    let mut stressor = Stressor::new(config.seed);
    let mut progress = config.progress.map(ActivityIndicator::stderr);

    // one more edge than items driven, so the last one is checked too
    let edges = RESET_CYCLES + config.cycles + 1;
    info!(
        "LOCKSTEP: seed {:#x}, {} cycles",
        config.seed, config.cycles
    );
    for _ in 0..edges {
        let mut processes: [&mut dyn Process<SingleCycleBus>; 2] = [&mut dut, &mut stressor];
        sim.cycle(&mut processes)?;
        if let Some(indicator) = progress.as_mut() {
            indicator.tic()?;
        }
    }
    if let Some(indicator) = progress.as_mut() {
        indicator.complete()?;
    }
    sim.finish()?;

    let report = LockstepReport {
        seed: config.seed,
        cycles: config.cycles,
        count: stressor.count,
    };
    info!(
        "LOCKSTEP: {} passed, {} failed",
        report.count.pass(),
        report.count.fail()
    );
    Ok(report)
}
