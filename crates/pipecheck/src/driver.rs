//! Translation of sequence items into bus writes.

use crate::bus::{RESET_ASSERTED, RESET_RELEASED, SingleCycleBus};
use crate::format::binary;
use crate::request::{ControlBits, Instruction, Request};
use crate::sequence_item::SequenceItem;
use log::debug;

/// Writes one item's stimulus onto a bus. The writes become visible at the
/// next evaluation round.
pub trait Driver {
    type Item;
    type Bus;

    fn name(&self) -> &str;

    fn drive(&mut self, item: &Self::Item, bus: &mut Self::Bus);
}

/// The bus pattern one request maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stimulus<'a> {
    pub control: ControlBits,
    pub instruction: Instruction,
    pub label: &'a str,
}

impl<'a> Stimulus<'a> {
    const fn fixed(
        reset: u8,
        is_advance: bool,
        is_error: bool,
        is_flush: bool,
        is_valid: bool,
        i_binary: u32,
        i_number: u32,
        label: &'a str,
    ) -> Self {
        Self {
            control: ControlBits {
                reset,
                is_advance,
                is_error,
                is_flush,
                is_valid,
            },
            instruction: Instruction { i_binary, i_number },
            label,
        }
    }

    /// The input word is always the complement of the instruction tag.
    pub fn value(&self) -> u32 {
        !self.instruction.i_binary
    }

    pub fn of(request: &'a Request) -> Self {
        match request {
            Request::Reset => Self::fixed(
                RESET_ASSERTED,
                false,
                false,
                false,
                false,
                0xD100_0000,
                0xD800_0000,
                "RESET",
            ),
            Request::Error => Self::fixed(
                RESET_RELEASED,
                true,
                true,
                false,
                true,
                0xE100_0000,
                0xE800_0000,
                "ERROR",
            ),
            Request::Flush => Self::fixed(
                RESET_RELEASED,
                true,
                false,
                true,
                true,
                0xE200_0000,
                0xEA00_0000,
                "FLUSH",
            ),
            Request::Hold => Self::fixed(
                RESET_RELEASED,
                true,
                false,
                false,
                false,
                0xE400_0000,
                0xEC00_0000,
                "HOLD",
            ),
            Request::RandomWeighted(random) => Self {
                control: random.control,
                instruction: random.instruction,
                label: "RANDOM_WEIGHTED",
            },
            Request::FixedValue(fixed) => Self {
                control: fixed.control,
                instruction: fixed.instruction,
                label: &fixed.prefix,
            },
        }
    }
}

#[derive(Debug)]
pub struct SingleCycleDriver {
    name: String,
    driven: u64,
}

impl Default for SingleCycleDriver {
    fn default() -> Self {
        Self::new("driver")
    }
}

impl SingleCycleDriver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driven: 0,
        }
    }

    /// Items driven so far.
    pub fn driven(&self) -> u64 {
        self.driven
    }
}

impl Driver for SingleCycleDriver {
    type Item = SequenceItem;
    type Bus = SingleCycleBus;

    fn name(&self) -> &str {
        &self.name
    }

    fn drive(&mut self, item: &SequenceItem, bus: &mut SingleCycleBus) {
        let stimulus = Stimulus::of(item.request());
        let ctl = stimulus.control;
        debug!(
            "{}: {:?} {} {}",
            self.name,
            item.kind(),
            binary(ctl.code().into(), 5),
            stimulus.label
        );
        bus.set_control_inputs(ctl.reset, ctl.is_advance, ctl.is_flush, ctl.is_valid);
        bus.set_data_inputs(stimulus.value());
        bus.set_debug_inputs(
            stimulus.instruction.i_binary,
            stimulus.instruction.i_number,
            ctl.is_error,
            stimulus.label,
        );
        self.driven += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FixedValue;
    use crate::signal::Bus;

    #[test]
    fn fixed_value_drives_its_prefix() {
        let mut fixed = FixedValue::default();
        fixed
            .set_control(RESET_RELEASED, false, true, false, true)
            .set_instruction(0xE100_0000, 0xE800_0000)
            .set_prefix("IS_VALID(1) with IS_ADVANCE(0)");
        let mut bus = SingleCycleBus::default();
        let mut driver = SingleCycleDriver::default();
        driver.drive(&SequenceItem::new(fixed), &mut bus);
        bus.commit();
        assert_eq!(bus.input.ctl.reset.read(), RESET_RELEASED);
        assert!(!bus.input.ctl.is_advance.read());
        assert!(bus.input.ctl.is_valid.read());
        assert!(bus.input.debug.is_error.read());
        assert_eq!(bus.input.value.read(), 0x1EFF_FFFF);
        assert_eq!(bus.input.debug.string.get(), "IS_VALID(1) with IS_ADVANCE(0)");
        assert_eq!(driver.driven(), 1);
    }

    #[test]
    fn writes_wait_for_commit() {
        let mut bus = SingleCycleBus::default();
        SingleCycleDriver::default().drive(&SequenceItem::new(Request::Hold), &mut bus);
        assert_eq!(bus.input.ctl.reset.read(), RESET_ASSERTED);
        bus.commit();
        assert_eq!(bus.input.ctl.reset.read(), RESET_RELEASED);
    }
}
