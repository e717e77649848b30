//! Passive per-cycle sampling of a bus into transactions.

use crate::analysis::{AnalysisPort, Subscriber};
use crate::bus::SingleCycleBus;
use crate::config::ConfigDb;
use crate::error::{HarnessError, UsageError};
use crate::signal::Bus;
use crate::simulation::Process;
use crate::transaction::{
    Controls, OutputState, Record, StateDebug, StimulusControls, StimulusDebug, Stimuli,
    Transaction,
};
use log::{debug, trace};
use std::marker::PhantomData;

/// Reads one bus into the two halves of a transaction.
pub trait Sampler<B> {
    type State: Copy + std::fmt::Debug;
    type Stimuli: Copy + std::fmt::Debug;

    fn sample_state(&self, bus: &B) -> Self::State;
    fn sample_stimuli(&self, bus: &B) -> Self::Stimuli;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SingleCycleSampler;

impl Sampler<SingleCycleBus> for SingleCycleSampler {
    type State = OutputState;
    type Stimuli = Stimuli;

    fn sample_state(&self, bus: &SingleCycleBus) -> OutputState {
        let out = &bus.output;
        OutputState {
            ctl: Controls {
                // the registered advance, i.e. what the stage acted on
                is_advance: out.debug.is_advance.read(),
                is_error: out.ctl.is_error.read(),
                is_stall: out.ctl.is_stall.read(),
                is_valid: out.ctl.is_valid.read(),
            },
            value: out.value.read(),
            debug: StateDebug {
                i_binary: out.debug.i_binary.read(),
                i_number: out.debug.i_number.read(),
                is_advance: out.debug.is_advance.read(),
            },
        }
    }

    fn sample_stimuli(&self, bus: &SingleCycleBus) -> Stimuli {
        let input = &bus.input;
        Stimuli {
            ctl: StimulusControls {
                reset: input.ctl.reset.read(),
                is_advance: input.ctl.is_advance.read(),
                is_flush: input.ctl.is_flush.read(),
                is_valid: input.ctl.is_valid.read(),
            },
            value: input.value.read(),
            debug: StimulusDebug {
                i_binary: input.debug.i_binary.read(),
                i_number: input.debug.i_number.read(),
                is_error: input.debug.is_error.read(),
            },
        }
    }
}

/// Where the monitor is in its sampling cycle.
///
/// `Sampling` carries the first half of the transaction in flight across
/// the clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState<S, I> {
    /// No edge seen yet.
    Start,
    Sampling { state_0: S, stimuli: I },
}

impl<S: Copy, I: Copy> MonitorState<S, I> {
    /// One clock edge: completes the transaction in flight, if any, and
    /// opens the next one with `state_1` as its starting state.
    pub fn advance(self, state_1: S, stimuli: I) -> (Self, Option<Transaction<S, I>>) {
        let completed = match self {
            // nothing preceded the first edge; only seed the state
            MonitorState::Start => None,
            MonitorState::Sampling { state_0, stimuli } => Some(Transaction {
                state_0,
                stimuli,
                state_1,
            }),
        };
        let next = MonitorState::Sampling {
            state_0: state_1,
            stimuli,
        };
        (next, completed)
    }
}

pub struct Monitor<B, P: Sampler<B>> {
    name: String,
    sampler: P,
    state: MonitorState<P::State, P::Stimuli>,
    port: AnalysisPort<Transaction<P::State, P::Stimuli>>,
    last: Record<Transaction<P::State, P::Stimuli>>,
    _bus: PhantomData<fn(&B)>,
}

pub type SingleCycleMonitor = Monitor<SingleCycleBus, SingleCycleSampler>;

impl<B, P: Sampler<B>> std::fmt::Debug for Monitor<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("port", &self.port)
            .finish()
    }
}

impl<B: Bus, P: Sampler<B>> Monitor<B, P> {
    pub fn new(name: impl Into<String>, sampler: P) -> Self {
        let name = name.into();
        Self {
            port: AnalysisPort::new(format!("{name}.output")),
            name,
            sampler,
            state: MonitorState::Start,
            last: Record::default(),
            _bus: PhantomData,
        }
    }

    /// Builds the monitor at `scope`, which must see a `vif` binding naming
    /// `bus`.
    pub fn build(scope: &str, db: &ConfigDb, bus: &B, sampler: P) -> Result<Self, HarnessError> {
        db.get_bus(scope, "vif")?.check(bus.name())?;
        Ok(Self::new(scope, sampler))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connect(&mut self, subscriber: impl Subscriber<Transaction<P::State, P::Stimuli>> + 'static) {
        self.port.connect(subscriber);
    }

    pub fn state(&self) -> &MonitorState<P::State, P::Stimuli> {
        &self.state
    }

    /// The most recently published transaction.
    pub fn last_transaction(&self) -> Result<&Transaction<P::State, P::Stimuli>, UsageError> {
        self.last.value()
    }

    pub fn published(&self) -> u64 {
        self.port.written()
    }
}

impl<B: Bus, P: Sampler<B>> Process<B> for Monitor<B, P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn posedge(&mut self, time: u64, bus: &mut B) -> Result<(), HarnessError> {
        let state_1 = self.sampler.sample_state(bus);
        let stimuli = self.sampler.sample_stimuli(bus);
        let (next, completed) = self.state.advance(state_1, stimuli);
        self.state = next;
        match completed {
            Some(transaction) => {
                trace!("{}@{time}: {transaction:?}", self.name);
                self.port.write(&transaction);
                self.last.set(transaction);
            }
            None => debug!("{}@{time}: initial state sampled", self.name),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_edge_publishes_nothing() {
        let state: MonitorState<u8, char> = MonitorState::Start;
        let (state, completed) = state.advance(1, 'a');
        assert_eq!(completed, None);
        assert_eq!(
            state,
            MonitorState::Sampling {
                state_0: 1,
                stimuli: 'a'
            }
        );
    }

    #[test]
    fn each_transaction_starts_where_the_last_ended() {
        let mut state: MonitorState<u8, char> = MonitorState::Start;
        let mut published = Vec::new();
        for (output, input) in [(1, 'a'), (2, 'b'), (3, 'c')] {
            let (next, completed) = state.advance(output, input);
            state = next;
            published.extend(completed);
        }
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].state_1, published[1].state_0);
        assert_eq!(
            published[1],
            Transaction {
                state_0: 2,
                stimuli: 'b',
                state_1: 3
            }
        );
    }

    #[test]
    fn monitor_needs_a_bus_binding() {
        let db = ConfigDb::new();
        let bus = SingleCycleBus::default();
        let err = SingleCycleMonitor::build("env.monitor", &db, &bus, SingleCycleSampler)
            .unwrap_err();
        assert!(err.to_string().starts_with("CONFIG:"));
    }

    #[test]
    fn last_transaction_is_unset_before_two_edges() {
        let mut bus = SingleCycleBus::default();
        let mut monitor = SingleCycleMonitor::new("monitor", SingleCycleSampler);
        assert_eq!(monitor.last_transaction().err(), Some(UsageError::NotGood));
        monitor.posedge(0, &mut bus).unwrap();
        assert!(monitor.last_transaction().is_err());
        monitor.posedge(1, &mut bus).unwrap();
        assert!(monitor.last_transaction().is_ok());
        assert_eq!(monitor.published(), 1);
    }
}
