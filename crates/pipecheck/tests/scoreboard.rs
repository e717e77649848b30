use insta::assert_snapshot;
use pipecheck::analysis::Subscriber;
use pipecheck::bus::RESET_RELEASED;
use pipecheck::scoreboard::{ControlBitPairs, ControlBits, DataValues, Scoreboard, Tally};
use pipecheck::transaction::Transaction;

/// A valid word accepted by an empty stage, observed correctly.
fn accepted(value: u32) -> Transaction {
    let mut tr: Transaction = Transaction::default();
    tr.stimuli.ctl.reset = RESET_RELEASED;
    tr.stimuli.ctl.is_advance = true;
    tr.stimuli.ctl.is_valid = true;
    tr.stimuli.value = value;
    tr.state_1.ctl.is_advance = true;
    tr.state_1.ctl.is_valid = true;
    tr.state_1.value = !value;
    tr
}

#[test]
fn control_bit_report() {
    let mut board = ControlBits::new();
    for value in 0..3 {
        board.write(&accepted(value));
    }
    let mut stalled = accepted(3);
    stalled.state_1.ctl.is_stall = true;
    board.write(&stalled);

    assert!(!board.is_pass());
    assert_snapshot!(board.report(), @r"
    CONTROL BIT PASS/FAIL COUNT:
        Passed:      3  ( 75.00%).
        Failed:      1  ( 25.00%).
        Moot:        0  (  0.00%).
        TOTAL:       4.
    ");
}

#[test]
fn data_value_report_counts_moot_words() {
    let mut board = DataValues::new();
    board.write(&accepted(0x1234_5678));
    for _ in 0..2 {
        // reset leaves nothing valid to compare
        board.write(&Transaction::default());
    }

    assert!(board.is_pass());
    assert_snapshot!(board.report(), @r"
    DATA VALUE PASS/FAIL COUNT:
        Passed:      1  ( 33.33%).
        Failed:      0  (  0.00%).
        Moot:        2  ( 66.67%).
        TOTAL:       3.
    ");
}

#[test]
fn empty_board_reports_zero_percent() {
    let board = DataValues::new();
    assert!(!board.is_pass());
    assert_snapshot!(board.report(), @r"
    DATA VALUE PASS/FAIL COUNT:
        Passed:      0  (  0.00%).
        Failed:      0  (  0.00%).
        Moot:        0  (  0.00%).
        TOTAL:       0.
    ");
}

#[test]
fn pair_coverage_report() {
    let mut board = ControlBitPairs::new();
    board.write(&accepted(0));
    board.write(&Transaction::default());
    board.write(&accepted(1));

    assert!(!board.is_pass());
    assert_snapshot!(board.report(), @r"
    CONTROL INPUT PAIR COVERAGE:
        Pair coverage is INCOMPLETE.
        Observations:             2  (0.20%).
        Minimum observation:      0.
        Maximum observation:      1.
        TOTAL PAIRS:           1024.
    ");
}

#[test]
fn summaries_serialize_with_their_tally_kind() {
    let mut control = ControlBits::new();
    control.write(&accepted(9));
    let summary = control.summary();
    assert_eq!(summary.name, "control_bits");
    assert!(matches!(summary.tally, Tally::PassFail(count) if count.pass() == 1));

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["tally"]["kind"], "pass_fail");
    assert_eq!(json["tally"]["pass"], 1);
    assert_eq!(json["passed"], true);

    let json = serde_json::to_value(ControlBitPairs::new().summary()).unwrap();
    assert_eq!(json["tally"]["kind"], "coverage");
    assert_eq!(json["tally"]["pairs"], 1024);
}
