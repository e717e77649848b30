//! Per-cycle records produced by the monitor.

use crate::bus::{RESET_ASSERTED, Reset};
use crate::counters::Sample;
use crate::error::UsageError;
use serde::Serialize;

/// The four control outputs of a pipeline stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub is_advance: bool,
    pub is_error: bool,
    pub is_stall: bool,
    pub is_valid: bool,
}

impl Controls {
    pub fn new(is_advance: bool, is_error: bool, is_stall: bool, is_valid: bool) -> Self {
        Self {
            is_advance,
            is_error,
            is_stall,
            is_valid,
        }
    }
}

impl std::fmt::Display for Controls {
    /// `a/e/s/v` as `0`/`1` digits.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            u8::from(self.is_advance),
            u8::from(self.is_error),
            u8::from(self.is_stall),
            u8::from(self.is_valid)
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateDebug {
    pub i_binary: u32,
    pub i_number: u32,
    pub is_advance: bool,
}

/// Everything a stage drives, minus the diagnostic string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutputState {
    pub ctl: Controls,
    pub value: u32,
    pub debug: StateDebug,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StimulusControls {
    pub reset: Reset,
    pub is_advance: bool,
    pub is_flush: bool,
    pub is_valid: bool,
}

impl StimulusControls {
    pub fn in_reset(&self) -> bool {
        self.reset == RESET_ASSERTED
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StimulusDebug {
    pub i_binary: u32,
    pub i_number: u32,
    pub is_error: bool,
}

/// Everything fed into a stage, minus the diagnostic string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stimuli {
    pub ctl: StimulusControls,
    pub value: u32,
    pub debug: StimulusDebug,
}

/// Input control bits of a stage: reset, is_advance, is_error, is_flush and
/// is_valid.
pub const INPUT_CONTROL_BITS: usize = 5;

impl Stimuli {
    /// Input control bits folded into one code, most significant first:
    /// reset, is_advance, is_error, is_flush, is_valid.
    pub fn control_code(&self) -> Sample<INPUT_CONTROL_BITS> {
        Sample::from_flags([
            self.ctl.reset != RESET_ASSERTED,
            self.ctl.is_advance,
            self.debug.is_error,
            self.ctl.is_flush,
            self.ctl.is_valid,
        ])
    }
}

/// One cycle: the state before it, what was applied during it, and the state
/// it left behind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Transaction<S = OutputState, I = Stimuli> {
    pub state_0: S,
    pub stimuli: I,
    pub state_1: S,
}

/// A value that may only be read once it has been completely sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<T> {
    value: Option<T>,
}

impl<T> Default for Record<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> Record<T> {
    pub fn is_good(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Result<&T, UsageError> {
        self.value.as_ref().ok_or(UsageError::NotGood)
    }

    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    pub fn invalidate(&mut self) -> Option<T> {
        self.value.take()
    }
}
