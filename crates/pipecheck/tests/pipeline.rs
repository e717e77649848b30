use pipecheck::analysis::Subscriber;
use pipecheck::bus::{RESET_ASSERTED, RESET_RELEASED, Reset, SingleCycleBus};
use pipecheck::dut::SingleCycle;
use pipecheck::phase::Phase;
use pipecheck::request::{FixedValue, Request};
use pipecheck::scoreboard::{ControlBitPairs, ControlBits, DataValues, Scoreboard};
use pipecheck::sequence::{AllControlPairs, ItemStream, Sequence};
use pipecheck::sequence_item::SequenceItem;
use pipecheck::transaction::{Controls, Transaction};
use pipecheck::{Environment, Process, Simulation, TEST_BENCH_SCOPE, TestBench};
use std::cell::RefCell;
use std::rc::Rc;

struct Script(Vec<SequenceItem>);

impl Sequence<SequenceItem> for Script {
    fn name(&self) -> &str {
        "script"
    }

    fn count(&self) -> u32 {
        1
    }

    fn body(&self) -> ItemStream<SequenceItem> {
        Box::new(self.0.clone().into_iter())
    }
}

/// Runs `sequence` to completion and returns every published transaction.
/// Entry `k` holds the stimulus of the `k`-th item; entry 0 is the bus
/// before anything was driven.
fn transactions(sequence: &dyn Sequence<SequenceItem>) -> Vec<Transaction> {
    let bus = SingleCycleBus::default();
    let db = TestBench::default_db(&bus);
    let mut sim = Simulation::new(bus);
    sim.add_clock(1_000, 0);
    let scope = format!("{TEST_BENCH_SCOPE}.environment");
    let mut env = Environment::build(&scope, &db, sim.bus(), 1).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    env.monitor.connect(seen.clone());

    let phase = Phase::new("run");
    env.agent
        .sequencer_mut()
        .unwrap()
        .start(sequence, &phase)
        .unwrap();
    let mut dut = SingleCycle::default();
    let Environment { agent, monitor } = &mut env;
    let mut edge = |sim: &mut Simulation<SingleCycleBus>| {
        let mut processes: [&mut dyn Process<SingleCycleBus>; 3] =
            [&mut dut, &mut *agent, &mut *monitor];
        sim.cycle(&mut processes).unwrap();
    };
    while !phase.is_clear() {
        edge(&mut sim);
    }
    edge(&mut sim);
    seen.take()
}

fn item(
    reset: Reset,
    is_advance: bool,
    is_error: bool,
    is_flush: bool,
    is_valid: bool,
    value: u32,
) -> SequenceItem {
    let mut fixed = FixedValue::default();
    fixed
        .set_control(reset, is_advance, is_error, is_flush, is_valid)
        // the driver applies the complement of the tag as the data word
        .set_instruction(!value, 0)
        .set_prefix("directed");
    SequenceItem::new(fixed)
}

fn reset() -> SequenceItem {
    SequenceItem::new(Request::Reset)
}

fn hold() -> SequenceItem {
    SequenceItem::new(Request::Hold)
}

fn assert_scored_clean(transactions: &[Transaction]) {
    let mut control = ControlBits::new();
    let mut data = DataValues::new();
    for tr in transactions {
        control.write(tr);
        data.write(tr);
    }
    assert!(control.is_pass(), "{}", control.report());
    assert_eq!(data.count().fail(), 0, "{}", data.report());
}

#[test]
fn one_transaction_per_item_plus_the_initial_state() {
    let seen = transactions(&Script(vec![reset(), reset(), hold()]));
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0].stimuli.ctl.reset, RESET_ASSERTED);
    assert_eq!(seen[3].stimuli.ctl.reset, RESET_RELEASED);
    // consecutive transactions chain their states
    for pair in seen.windows(2) {
        assert_eq!(pair[0].state_1, pair[1].state_0);
    }
}

#[test]
fn basic_inversion() {
    let seen = transactions(&Script(vec![
        reset(),
        reset(),
        item(RESET_RELEASED, true, false, false, true, 0x1234_5678),
        hold(),
    ]));
    let tr = &seen[3];
    assert_eq!(tr.stimuli.value, 0x1234_5678);
    assert_eq!(tr.state_1.value, 0xEDCB_A987);
    assert!(tr.state_1.ctl.is_valid);
    assert_scored_clean(&seen);
}

#[test]
fn reset_recovery() {
    let seen = transactions(&Script(vec![
        item(RESET_ASSERTED, false, false, false, false, 0),
        item(RESET_ASSERTED, false, false, false, false, 0),
        item(RESET_RELEASED, true, false, false, false, 0),
    ]));
    let idle = Controls::new(true, false, false, false);
    assert_eq!(seen[2].state_1.ctl, idle);
    assert_eq!(seen[3].state_1.ctl, idle);
    assert_scored_clean(&seen);
}

#[test]
fn flush_discards_a_held_valid_word() {
    let mut script = vec![
        reset(),
        reset(),
        item(RESET_RELEASED, true, false, false, true, 0x0000_00ff),
    ];
    // valid and never advanced: the stage holds its word
    script.extend((0..4).map(|n| item(RESET_RELEASED, false, false, false, true, n)));
    script.push(item(RESET_RELEASED, true, false, true, false, 0xdead_beef));
    script.push(hold());
    let seen = transactions(&Script(script));

    for tr in &seen[3..8] {
        assert!(tr.state_1.ctl.is_valid);
        assert_eq!(tr.state_1.value, 0xffff_ff00);
    }
    let flushed = &seen[8];
    assert!(flushed.stimuli.ctl.is_flush);
    assert!(!flushed.state_1.ctl.is_valid);
    assert_eq!(flushed.state_1.value, 0xffff_ff00);
    assert_scored_clean(&seen);
}

#[test]
fn forced_error_persists_until_reset() {
    let seen = transactions(&Script(vec![
        reset(),
        reset(),
        item(RESET_RELEASED, true, true, false, true, 7),
        hold(),
        hold(),
        item(RESET_RELEASED, true, false, true, false, 0),
        reset(),
        hold(),
    ]));
    for tr in &seen[3..=6] {
        assert!(tr.state_1.ctl.is_error, "{tr:?}");
    }
    assert!(!seen[7].state_1.ctl.is_error);
    assert!(!seen[8].state_1.ctl.is_error);
    assert_scored_clean(&seen);
}

#[test]
fn stage_never_stalls() {
    let seen = transactions(&pipecheck::sequence::RandomWeightedSequence::with_count(500).unwrap());
    assert!(seen.iter().all(|tr| !tr.state_1.ctl.is_stall));
    assert_scored_clean(&seen);
}

#[test]
fn all_control_pairs_completes_coverage() {
    let seen = transactions(&AllControlPairs::with_count(1).unwrap());
    let mut pairs = ControlBitPairs::new();
    for tr in &seen {
        pairs.write(tr);
    }
    assert!(pairs.is_pass(), "{}", pairs.report());
    assert_eq!(pairs.count().missing().count(), 0);
    assert_scored_clean(&seen);
}
