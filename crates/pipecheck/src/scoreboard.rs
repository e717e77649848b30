//! Scoreboards for the single-cycle stage.
//!
//! Each one checks a single property of the monitored transactions against
//! the predictor. Mismatches are logged and tallied; they never abort a run.

use crate::analysis::Subscriber;
use crate::counters::{ControlBitPairCount, PassFailCount};
use crate::predictor::{predict_controls, predict_state};
use crate::transaction::Transaction;
use log::error;
use serde::Serialize;
use std::fmt;

/// A transaction subscriber with a pass criterion and a printable tally.
pub trait Scoreboard<T>: Subscriber<T> {
    fn name(&self) -> &str;

    fn is_pass(&self) -> bool;

    /// Human-readable summary, one statistic per line.
    fn report(&self) -> String;

    fn summary(&self) -> ScoreboardSummary;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Tally {
    PassFail(PassFailCount),
    Coverage {
        observed: usize,
        pairs: usize,
        minimum: u64,
        maximum: u64,
    },
}

/// Machine-readable verdict of one scoreboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreboardSummary {
    pub name: String,
    pub passed: bool,
    pub tally: Tally,
}

/// Pass/fail tally laid out one statistic per line.
struct PassFailReport<'a> {
    title: &'a str,
    count: &'a PassFailCount,
}

impl fmt::Display for PassFailReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.count.total_observations();
        let percent = |n: u64| {
            if total == 0 {
                0.0
            } else {
                100.0 * n as f64 / total as f64
            }
        };
        writeln!(f, "{}:", self.title)?;
        for (label, n) in [
            ("Passed:", self.count.pass()),
            ("Failed:", self.count.fail()),
            ("Moot:", self.count.moot()),
        ] {
            writeln!(f, "    {label:<7} {n:>6}  ({:>6.2}%).", percent(n))?;
        }
        write!(f, "    {:<7} {total:>6}.", "TOTAL:")
    }
}

fn pass_fail_report(title: &str, count: &PassFailCount) -> String {
    PassFailReport { title, count }.to_string()
}

fn pair_report<const N: usize>(title: &str, count: &ControlBitPairCount<N>) -> String {
    let completion = if count.is_coverage_complete() {
        "complete"
    } else {
        "INCOMPLETE"
    };
    format!(
        "{title}:\n    Pair coverage is {completion}.\n    \
         Observations:        {:>6}  ({:.2}%).\n    \
         Minimum observation: {:>6}.\n    \
         Maximum observation: {:>6}.\n    \
         TOTAL PAIRS:         {:>6}.",
        count.coverage_observations(),
        100.0 * count.coverage_fraction(),
        count.minimum_observation(),
        count.maximum_observation(),
        ControlBitPairCount::<N>::PAIRS,
    )
}

/// Checks the four output control bits. Never moot.
#[derive(Debug, Default)]
pub struct ControlBits {
    count: PassFailCount,
}

impl ControlBits {
    pub const NAME: &'static str = "control_bits";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> &PassFailCount {
        &self.count
    }
}

impl Subscriber<Transaction> for ControlBits {
    fn write(&mut self, item: &Transaction) {
        let expected = predict_controls(item);
        let observed = item.state_1.ctl;
        self.count.record(observed == expected);
        if observed != expected {
            error!(
                "SCORE_BOARD: CONTROL OUTPUT VALUE TEST FAILED: \
                 Observed [A/E/S/V]: {observed}, Expected [A/E/S/V]: {expected}"
            );
        }
    }
}

impl Scoreboard<Transaction> for ControlBits {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_pass(&self) -> bool {
        self.count.is_pass()
    }

    fn report(&self) -> String {
        pass_fail_report("CONTROL BIT PASS/FAIL COUNT", &self.count)
    }

    fn summary(&self) -> ScoreboardSummary {
        ScoreboardSummary {
            name: Self::NAME.to_string(),
            passed: self.is_pass(),
            tally: Tally::PassFail(self.count),
        }
    }
}

/// Checks the output word; moot whenever the output is not valid.
#[derive(Debug, Default)]
pub struct DataValues {
    count: PassFailCount,
}

impl DataValues {
    pub const NAME: &'static str = "data_values";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> &PassFailCount {
        &self.count
    }
}

impl Subscriber<Transaction> for DataValues {
    fn write(&mut self, item: &Transaction) {
        if !item.state_1.ctl.is_valid {
            self.count.record_moot();
            return;
        }
        let observed = item.state_1.value;
        let expected = predict_state(item).value;
        self.count.record(observed == expected);
        if observed != expected {
            error!(
                "SCORE_BOARD: DATA VALUE OUTPUT TEST FAILED: \
                 Observed: {observed:#x}, Expected: {expected:#x}"
            );
        }
    }
}

impl Scoreboard<Transaction> for DataValues {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_pass(&self) -> bool {
        self.count.is_pass()
    }

    fn report(&self) -> String {
        pass_fail_report("DATA VALUE PASS/FAIL COUNT", &self.count)
    }

    fn summary(&self) -> ScoreboardSummary {
        ScoreboardSummary {
            name: Self::NAME.to_string(),
            passed: self.is_pass(),
            tally: Tally::PassFail(self.count),
        }
    }
}

pub use crate::transaction::INPUT_CONTROL_BITS;

/// Passes once every ordered pair of input control combinations has been
/// applied on consecutive cycles.
#[derive(Debug, Default)]
pub struct ControlBitPairs {
    count: ControlBitPairCount<INPUT_CONTROL_BITS>,
}

impl ControlBitPairs {
    pub const NAME: &'static str = "control_bit_pairs";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> &ControlBitPairCount<INPUT_CONTROL_BITS> {
        &self.count
    }
}

impl Subscriber<Transaction> for ControlBitPairs {
    fn write(&mut self, item: &Transaction) {
        self.count.observe(item.stimuli.control_code());
    }
}

impl Scoreboard<Transaction> for ControlBitPairs {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_pass(&self) -> bool {
        self.count.is_coverage_complete()
    }

    fn report(&self) -> String {
        pair_report("CONTROL INPUT PAIR COVERAGE", &self.count)
    }

    fn summary(&self) -> ScoreboardSummary {
        ScoreboardSummary {
            name: Self::NAME.to_string(),
            passed: self.is_pass(),
            tally: Tally::Coverage {
                observed: self.count.coverage_observations(),
                pairs: ControlBitPairCount::<INPUT_CONTROL_BITS>::PAIRS,
                minimum: self.count.minimum_observation(),
                maximum: self.count.maximum_observation(),
            },
        }
    }
}
