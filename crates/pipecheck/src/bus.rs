//! Signal set of a single-cycle pipeline stage.
//!
//! `input` is written by the driver and read by the stage; `output` is written
//! by the stage. The monitor reads both.

use crate::signal::{Bus, Probe, Signal};

/// Low-active reset level: 0 holds the stage in reset.
pub type Reset = u8;

pub const RESET_ASSERTED: Reset = 0;
pub const RESET_RELEASED: Reset = 1;

#[derive(Debug, Clone, Default)]
pub struct InputControl {
    pub reset: Signal<Reset>,
    pub is_advance: Signal<bool>,
    pub is_flush: Signal<bool>,
    pub is_valid: Signal<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct InputDebug {
    pub i_binary: Signal<u32>,
    pub i_number: Signal<u32>,
    pub is_error: Signal<bool>,
    pub string: Signal<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub ctl: InputControl,
    pub value: Signal<u32>,
    pub debug: InputDebug,
}

#[derive(Debug, Clone, Default)]
pub struct OutputControl {
    pub is_advance: Signal<bool>,
    pub is_error: Signal<bool>,
    pub is_stall: Signal<bool>,
    pub is_valid: Signal<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct OutputDebug {
    pub i_binary: Signal<u32>,
    pub i_number: Signal<u32>,
    pub is_advance: Signal<bool>,
    pub string: Signal<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Outputs {
    pub ctl: OutputControl,
    pub value: Signal<u32>,
    pub debug: OutputDebug,
}

#[derive(Debug, Clone)]
pub struct SingleCycleBus {
    name: String,
    pub input: Inputs,
    pub output: Outputs,
}

impl Default for SingleCycleBus {
    fn default() -> Self {
        Self::new("vif")
    }
}

impl SingleCycleBus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: Inputs::default(),
            output: Outputs::default(),
        }
    }

    pub fn set_control_inputs(
        &mut self,
        reset: Reset,
        is_advance: bool,
        is_flush: bool,
        is_valid: bool,
    ) {
        let ctl = &mut self.input.ctl;
        ctl.reset.write(reset);
        ctl.is_advance.write(is_advance);
        ctl.is_flush.write(is_flush);
        ctl.is_valid.write(is_valid);
    }

    pub fn set_data_inputs(&mut self, value: u32) {
        self.input.value.write(value);
    }

    pub fn set_debug_inputs(&mut self, i_binary: u32, i_number: u32, is_error: bool, string: &str) {
        let debug = &mut self.input.debug;
        debug.i_binary.write(i_binary);
        debug.i_number.write(i_number);
        debug.is_error.write(is_error);
        debug.string.write(string.to_string());
    }
}

impl Bus for SingleCycleBus {
    fn name(&self) -> &str {
        &self.name
    }

    fn commit(&mut self) -> bool {
        let Self { input, output, .. } = self;
        // Every signal must be committed, so no short-circuiting here.
        let changed = [
            input.ctl.reset.commit(),
            input.ctl.is_advance.commit(),
            input.ctl.is_flush.commit(),
            input.ctl.is_valid.commit(),
            input.value.commit(),
            input.debug.i_binary.commit(),
            input.debug.i_number.commit(),
            input.debug.is_error.commit(),
            input.debug.string.commit(),
            output.ctl.is_advance.commit(),
            output.ctl.is_error.commit(),
            output.ctl.is_stall.commit(),
            output.ctl.is_valid.commit(),
            output.value.commit(),
            output.debug.i_binary.commit(),
            output.debug.i_number.commit(),
            output.debug.is_advance.commit(),
            output.debug.string.commit(),
        ];
        changed.contains(&true)
    }

    fn probes(&self) -> Vec<Probe> {
        let (input, output) = (&self.input, &self.output);
        vec![
            input.ctl.reset.probe("vif.in.ctl.reset"),
            input.ctl.is_advance.probe("vif.in.ctl.is_advance"),
            input.ctl.is_flush.probe("vif.in.ctl.is_flush"),
            input.ctl.is_valid.probe("vif.in.ctl.is_valid"),
            output.ctl.is_advance.probe("vif.out.ctl.is_advance"),
            output.ctl.is_error.probe("vif.out.ctl.is_error"),
            output.ctl.is_stall.probe("vif.out.ctl.is_stall"),
            output.ctl.is_valid.probe("vif.out.ctl.is_valid"),
            input.value.probe("vif.in.data.value"),
            output.value.probe("vif.out.data.value"),
            input.debug.i_binary.probe("vif.in.debug.i_binary"),
            input.debug.i_number.probe("vif.in.debug.i_number"),
            input.debug.is_error.probe("vif.in.debug.is_error"),
            output.debug.i_binary.probe("vif.out.debug.i_binary"),
            output.debug.i_number.probe("vif.out.debug.i_number"),
            output.debug.is_advance.probe("vif.out.debug.is_advance"),
        ]
    }
}
