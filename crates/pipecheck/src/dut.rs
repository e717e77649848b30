//! Reference single-cycle stage: inverts the incoming word in one clock.

use crate::{
    bus::{RESET_ASSERTED, SingleCycleBus},
    error::{HarnessError, ProtocolError},
    simulation::Process,
};
use log::{error, trace};

/// Registered state of the stage, mirrored onto its output signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StageState {
    is_error: bool,
    is_stall: bool,
    is_valid: bool,
    value: u32,
    i_binary: u32,
    i_number: u32,
}

#[derive(Debug)]
pub struct SingleCycle {
    name: String,
    state: StageState,
}

impl Default for SingleCycle {
    fn default() -> Self {
        Self::new("single_cycle")
    }
}

impl SingleCycle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: StageState::default(),
        }
    }

    fn drive_outputs(&self, bus: &mut SingleCycleBus) {
        let out = &mut bus.output;
        out.ctl.is_error.write(self.state.is_error);
        out.ctl.is_stall.write(self.state.is_stall);
        out.ctl.is_valid.write(self.state.is_valid);
        out.value.write(self.state.value);
        out.debug.i_binary.write(self.state.i_binary);
        out.debug.i_number.write(self.state.i_number);
    }
}

impl Process<SingleCycleBus> for SingleCycle {
    fn name(&self) -> &str {
        &self.name
    }

    fn posedge(&mut self, time: u64, bus: &mut SingleCycleBus) -> Result<(), HarnessError> {
        // the advance the predecessor saw during the cycle that just ended
        let advance = bus.output.ctl.is_advance.read();
        let ctl = &bus.input.ctl;
        let forced_error = bus.input.debug.is_error.read();
        let state = &mut self.state;

        let prefix = if ctl.reset.read() == RESET_ASSERTED {
            state.is_error = false;
            state.is_stall = false;
            state.is_valid = false;
            "RESET: "
        } else if ctl.is_flush.read() {
            state.is_error |= forced_error;
            state.is_stall = false;
            state.is_valid = false;
            "FLUSH: "
        } else if state.is_stall {
            state.is_error = true;
            self.drive_outputs(bus);
            error!("{}: STALL: single-cycle stage cannot stall", self.name);
            return Err(ProtocolError::StallAsserted {
                stage: self.name.clone(),
                time,
            }
            .into());
        } else if advance {
            state.is_error |= forced_error;
            state.is_valid = ctl.is_valid.read();
            state.value = !bus.input.value.read();
            state.i_binary = bus.input.debug.i_binary.read();
            state.i_number = bus.input.debug.i_number.read();
            "ADVANCE: "
        } else {
            state.is_error |= forced_error;
            "NOP: "
        };

        let text = format!("{prefix}{}", bus.input.debug.string.get());
        trace!("{}@{time}: {text}", self.name);
        self.drive_outputs(bus);
        bus.output.debug.is_advance.write(advance);
        bus.output.debug.string.write(text);
        Ok(())
    }

    fn settle(&mut self, bus: &mut SingleCycleBus) -> Result<(), HarnessError> {
        let out = &bus.output.ctl;
        let advance =
            !out.is_stall.read() && (!out.is_valid.read() || bus.input.ctl.is_advance.read());
        if advance != out.is_advance.read() {
            bus.output.ctl.is_advance.write(advance);
        }
        Ok(())
    }
}
