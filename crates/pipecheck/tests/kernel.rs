use pipecheck::bus::SingleCycleBus;
use pipecheck::dut::SingleCycle;
use pipecheck::error::SimulationError;
use pipecheck::phase::Phase;
use pipecheck::sequence::RandomWeightedSequence;
use pipecheck::signal::{Bus, Probe, Signal};
use pipecheck::transaction::Transaction;
use pipecheck::{
    DELTA_LIMIT, Environment, HarnessError, Process, Simulation, TEST_BENCH_SCOPE, TestBench,
};
use std::cell::RefCell;
use std::rc::Rc;

fn random_run(reversed: bool) -> Vec<Transaction> {
    let bus = SingleCycleBus::default();
    let db = TestBench::default_db(&bus);
    let mut sim = Simulation::new(bus);
    sim.add_clock(1_000, 0);
    let scope = format!("{TEST_BENCH_SCOPE}.environment");
    let mut env = Environment::build(&scope, &db, sim.bus(), 42).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    env.monitor.connect(seen.clone());

    let phase = Phase::new("run");
    let sequence = RandomWeightedSequence::with_count(200).unwrap();
    env.agent
        .sequencer_mut()
        .unwrap()
        .start(&sequence, &phase)
        .unwrap();

    let mut dut = SingleCycle::default();
    let Environment { agent, monitor } = &mut env;
    while !phase.is_clear() {
        let mut processes: [&mut dyn Process<SingleCycleBus>; 3] =
            [&mut dut, &mut *agent, &mut *monitor];
        if reversed {
            processes.reverse();
        }
        sim.cycle(&mut processes).unwrap();
    }
    seen.take()
}

#[test]
fn process_order_does_not_change_the_outcome() {
    let forward = random_run(false);
    assert!(forward.len() > 200);
    assert_eq!(forward, random_run(true));
}

#[test]
fn rising_edges_follow_the_clock_period() {
    let mut sim = Simulation::new(SingleCycleBus::default());
    sim.add_clock(1_000, 250);
    let mut dut = SingleCycle::default();
    let mut processes: [&mut dyn Process<SingleCycleBus>; 1] = [&mut dut];
    let edges: Vec<u64> = (0..3).map(|_| sim.cycle(&mut processes).unwrap()).collect();
    assert_eq!(edges, [250, 1_250, 2_250]);
    assert_eq!(sim.cycles(), 3);
    assert!(sim.clock_level());
    assert_eq!(sim.next_event_time(), Some(2_750));
}

#[test]
fn without_a_clock_nothing_happens() {
    let mut sim = Simulation::new(SingleCycleBus::default());
    let mut processes: [&mut dyn Process<SingleCycleBus>; 0] = [];
    let err = sim.cycle(&mut processes).unwrap_err();
    assert!(matches!(err, HarnessError::Simulation(SimulationError::NoClock)));
}

#[derive(Default)]
struct Ring {
    a: Signal<bool>,
}

impl Bus for Ring {
    fn name(&self) -> &str {
        "ring"
    }

    fn commit(&mut self) -> bool {
        self.a.commit()
    }

    fn probes(&self) -> Vec<Probe> {
        vec![self.a.probe("ring.a")]
    }
}

/// An inverter feeding itself.
struct Oscillator;

impl Process<Ring> for Oscillator {
    fn name(&self) -> &str {
        "oscillator"
    }

    fn posedge(&mut self, _time: u64, _bus: &mut Ring) -> Result<(), HarnessError> {
        Ok(())
    }

    fn settle(&mut self, bus: &mut Ring) -> Result<(), HarnessError> {
        bus.a.write(!bus.a.read());
        Ok(())
    }
}

#[test]
fn combinational_loop_is_detected() {
    let mut sim = Simulation::new(Ring::default());
    sim.add_clock(10, 0);
    let mut osc = Oscillator;
    let mut processes: [&mut dyn Process<Ring>; 1] = [&mut osc];
    let err = sim.cycle(&mut processes).unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Simulation(SimulationError::CombinationalLoop {
            limit: DELTA_LIMIT,
            time: 0
        })
    ));
}
