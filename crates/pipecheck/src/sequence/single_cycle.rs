//! Sequences for the single-cycle stage.

use super::{ItemStream, Sequence, SequenceBase};
use crate::{
    bus::{RESET_ASSERTED, RESET_RELEASED, Reset},
    error::UsageError,
    format::binary,
    request::{ControlBits, FixedValue, Request, RequestKind},
    sequence_item::SequenceItem,
};
use itertools::iproduct;
use std::iter::repeat_n;

macro_rules! counted_sequence {
    ($(#[$meta:meta])* $ty:ident, $name:literal, $default:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $ty {
            base: SequenceBase,
        }

        impl $ty {
            pub const DEFAULT_COUNT: u32 = $default;

            pub fn new() -> Self {
                Self {
                    base: SequenceBase {
                        name: $name.to_string(),
                        count: Self::DEFAULT_COUNT,
                    },
                }
            }

            pub fn with_count(count: u32) -> Result<Self, UsageError> {
                Ok(Self {
                    base: SequenceBase::new($name, count)?,
                })
            }

            pub fn set_count(&mut self, count: u32) -> Result<&mut Self, UsageError> {
                self.base.set_count(count)?;
                Ok(self)
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

fn reset() -> SequenceItem {
    SequenceItem::new(Request::Reset)
}

fn holds(n: usize) -> impl Iterator<Item = SequenceItem> {
    repeat_n(SequenceItem::new(Request::Hold), n)
}

fn fixed(
    reset: Reset,
    is_advance: bool,
    is_error: bool,
    is_flush: bool,
    is_valid: bool,
    (i_binary, i_number): (u32, u32),
    prefix: &str,
) -> SequenceItem {
    let mut request = FixedValue::default();
    request
        .set_control(reset, is_advance, is_error, is_flush, is_valid)
        .set_instruction(i_binary, i_number)
        .set_prefix(prefix);
    SequenceItem::new(request)
}

const R0: Reset = RESET_ASSERTED;
const R1: Reset = RESET_RELEASED;

const CONTROL_BITS: u32 = 5;
const PAIR_CYCLES: u32 = 2;
const PAIR_BITS: u32 = CONTROL_BITS * PAIR_CYCLES;
const PAIR_SEQUENCES: u32 = 1 << PAIR_BITS;
const CONTROL_MASK: u32 = (1 << CONTROL_BITS) - 1;

counted_sequence!(
    /// Every two-cycle combination of the five control bits, `count` times
    /// over, then two holds.
    AllControlPairs,
    "all_control_pairs",
    10
);

impl AllControlPairs {
    /// The item for one cycle of one combination; high-order bits go first.
    pub fn pair_item(sequence: u32, cycle: u32) -> SequenceItem {
        let shift = (PAIR_CYCLES - cycle - 1) * CONTROL_BITS;
        let bits = (sequence >> shift) & CONTROL_MASK;
        let mut request = FixedValue {
            control: ControlBits::from_code(bits),
            ..FixedValue::default()
        };
        request.set_prefix(format!(
            "SEQUENCE {}: cycle ({}/{PAIR_CYCLES}), bits({})",
            binary(sequence.into(), PAIR_BITS as usize),
            cycle + 1,
            binary(bits.into(), CONTROL_BITS as usize),
        ));
        SequenceItem::new(request)
    }
}

impl Sequence<SequenceItem> for AllControlPairs {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn count(&self) -> u32 {
        self.base.count()
    }

    fn body(&self) -> ItemStream<SequenceItem> {
        let pairs = iproduct!(0..self.count(), 0..PAIR_SEQUENCES, 0..PAIR_CYCLES)
            .map(|(_, sequence, cycle)| Self::pair_item(sequence, cycle));
        Box::new(pairs.chain(holds(2)))
    }
}

fn reset_random_hold(count: u32) -> ItemStream<SequenceItem> {
    let random = SequenceItem::new(Request::of_kind(RequestKind::RandomWeighted));
    Box::new(
        repeat_n(reset(), 2)
            .chain(repeat_n(random, count as usize))
            .chain(holds(2)),
    )
}

counted_sequence!(
    /// Two resets, `count` weighted-random items, two holds.
    RandomWeightedSequence,
    "random_weighted",
    20_000
);

impl Sequence<SequenceItem> for RandomWeightedSequence {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn count(&self) -> u32 {
        self.base.count()
    }

    fn body(&self) -> ItemStream<SequenceItem> {
        reset_random_hold(self.count())
    }
}

counted_sequence!(
    /// Same stream as [`RandomWeightedSequence`], kept as a separate entry of
    /// the test list.
    RandomLoop,
    "random_loop",
    20_000
);

impl Sequence<SequenceItem> for RandomLoop {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn count(&self) -> u32 {
        self.base.count()
    }

    fn body(&self) -> ItemStream<SequenceItem> {
        reset_random_hold(self.count())
    }
}

counted_sequence!(
    /// Loads a valid word that is never advanced, holds `count` cycles, then
    /// flushes it.
    FlushWithAdvanceNeverAdvances,
    "flush_w_advance_never_advances",
    10
);

impl Sequence<SequenceItem> for FlushWithAdvanceNeverAdvances {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn count(&self) -> u32 {
        self.base.count()
    }

    fn body(&self) -> ItemStream<SequenceItem> {
        let head = [
            reset(),
            reset(),
            fixed(
                R1,
                false,
                false,
                false,
                true,
                (0xE100_0000, 0xE800_0000),
                "IS_VALID(1) with IS_ADVANCE(0)",
            ),
        ];
        let flush = fixed(
            R1,
            true,
            false,
            true,
            false,
            (0xE200_0000, 0xEA00_0000),
            "Flush IS_VALID(0) with IS_ADVANCE(1)",
        );
        Box::new(
            head.into_iter()
                .chain(holds(self.count() as usize))
                .chain(std::iter::once(flush))
                .chain(holds(2)),
        )
    }
}

counted_sequence!(
    /// A valid advancing word followed by one carrying a forced error.
    ErrorWithAdvanceValid,
    "error_w_advance_valid",
    1
);

impl Sequence<SequenceItem> for ErrorWithAdvanceValid {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn count(&self) -> u32 {
        self.base.count()
    }

    fn body(&self) -> ItemStream<SequenceItem> {
        let items = vec![
            reset(),
            reset(),
            fixed(
                R1,
                true,
                false,
                false,
                true,
                (0xE100_0000, 0xE800_0000),
                "IS_VALID(1) with IS_ADVANCE(1)",
            ),
            fixed(
                R1,
                true,
                true,
                false,
                true,
                (0xE200_0000, 0xEA00_0000),
                "ERROR: IS_VALID(1) with IS_ADVANCE(1)",
            ),
        ];
        Box::new(items.into_iter().chain(holds(2)))
    }
}

counted_sequence!(
    /// Resets interleaved with advances that carry no valid data.
    ResetAdvanceWithoutValid,
    "reset_advance_with_out_valid",
    1
);

impl Sequence<SequenceItem> for ResetAdvanceWithoutValid {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn count(&self) -> u32 {
        self.base.count()
    }

    fn body(&self) -> ItemStream<SequenceItem> {
        let test_1 = [
            fixed(R0, false, false, false, false, (0xE100_0000, 0xE800_0000), "RESET TEST-1 #0)"),
            fixed(R0, false, false, false, false, (0xE100_0000, 0xE800_0000), "RESET TEST-1 #1)"),
            fixed(
                R1,
                true,
                false,
                false,
                false,
                (0xE300_0000, 0xEC00_0000),
                "Data and IS_VALID(0) with IS_ADVANCE(1)",
            ),
        ];
        let reset_advance = fixed(
            R0,
            true,
            false,
            false,
            false,
            (0xE600_0000, 0xEA00_0000),
            "Data and IS_VALID(0) with IS_ADVANCE(1)",
        );
        let test_2 = [
            fixed(R0, false, false, false, false, (0xE400_0000, 0xEE00_0000), "RESET TEST-2 #0)"),
            fixed(R0, false, false, false, false, (0xE400_0000, 0xEE00_0000), "RESET test-2 #1)"),
            fixed(
                R1,
                false,
                false,
                false,
                true,
                (0xE200_0000, 0xEA00_0000),
                "Data with IS_VALID(1)/IS_ADVANCE(0)",
            ),
            fixed(
                R0,
                true,
                false,
                false,
                false,
                (0xE200_0000, 0xEA00_0000),
                "RESET with IS_VALID(0)/IS_ADVANCE(1)",
            ),
        ];
        Box::new(
            test_1
                .into_iter()
                .chain(holds(self.count() as usize))
                .chain(std::iter::once(reset_advance))
                .chain(holds(2))
                .chain(test_2)
                .chain(holds(2)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestKind;

    fn kinds(seq: &dyn Sequence<SequenceItem>) -> Vec<RequestKind> {
        seq.body().map(|item| item.kind()).collect()
    }

    #[test]
    fn pair_prefix_names_the_combination() {
        let item = AllControlPairs::pair_item(0b10001_00110, 0);
        let fixed = item.fixed_value().unwrap();
        assert_eq!(fixed.prefix, "SEQUENCE 1000100110: cycle (1/2), bits(10001)");
        assert_eq!(fixed.control.code(), 0b10001);

        let item = AllControlPairs::pair_item(0b10001_00110, 1);
        let fixed = item.fixed_value().unwrap();
        assert_eq!(fixed.prefix, "SEQUENCE 1000100110: cycle (2/2), bits(00110)");
        assert_eq!(fixed.control.code(), 0b00110);
        assert_eq!(fixed.instruction.i_binary, 0);
    }

    #[test]
    fn all_control_pairs_length() {
        let seq = AllControlPairs::with_count(1).unwrap();
        assert_eq!(seq.body().count(), 2048 + 2);
        assert_eq!(AllControlPairs::new().body().count(), 10 * 2048 + 2);
    }

    #[test]
    fn random_sequences_bracket_with_resets_and_holds() {
        let seq = RandomLoop::with_count(3).unwrap();
        use RequestKind::*;
        assert_eq!(
            kinds(&seq),
            [Reset, Reset, RandomWeighted, RandomWeighted, RandomWeighted, Hold, Hold]
        );
        assert_eq!(
            kinds(&RandomWeightedSequence::with_count(3).unwrap()),
            kinds(&seq)
        );
    }

    #[test]
    fn flush_sequence_holds_count_cycles() {
        let seq = FlushWithAdvanceNeverAdvances::with_count(3).unwrap();
        let items: Vec<_> = seq.body().collect();
        assert_eq!(items.len(), 2 + 1 + 3 + 1 + 2);
        let flush = items[6].fixed_value().unwrap();
        assert!(flush.control.is_flush && flush.control.is_advance);
        assert_eq!(flush.instruction.i_binary, 0xE200_0000);
    }

    #[test]
    fn error_sequence_forces_error_on_second_word() {
        let items: Vec<_> = ErrorWithAdvanceValid::new().body().collect();
        assert_eq!(items.len(), 6);
        assert!(!items[2].fixed_value().unwrap().control.is_error);
        assert!(items[3].fixed_value().unwrap().control.is_error);
    }

    #[test]
    fn reset_advance_sequence_layout() {
        let items: Vec<_> = ResetAdvanceWithoutValid::new().body().collect();
        let prefixes: Vec<_> = items
            .iter()
            .map(|i| i.fixed_value().map_or("<hold>", |f| f.prefix.as_str()))
            .collect();
        assert_eq!(
            prefixes,
            [
                "RESET TEST-1 #0)",
                "RESET TEST-1 #1)",
                "Data and IS_VALID(0) with IS_ADVANCE(1)",
                "<hold>",
                "Data and IS_VALID(0) with IS_ADVANCE(1)",
                "<hold>",
                "<hold>",
                "RESET TEST-2 #0)",
                "RESET test-2 #1)",
                "Data with IS_VALID(1)/IS_ADVANCE(0)",
                "RESET with IS_VALID(0)/IS_ADVANCE(1)",
                "<hold>",
                "<hold>",
            ]
        );
    }
}
