//! Reference model of the single-cycle stage.
//!
//! Everything here is a pure function of the state before a cycle and the
//! stimulus applied during it. Any disagreement with the simulated stage is a
//! stage defect.

use crate::transaction::{Controls, OutputState, Stimuli, Transaction};

/// Predicted outputs. Debug outputs are not modelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictedState {
    pub ctl: Controls,
    pub value: u32,
}

/// Whether the stage accepts new input this cycle.
pub fn advance(state_0: &OutputState, stimuli: &Stimuli) -> bool {
    !state_0.ctl.is_stall && (!state_0.ctl.is_valid || stimuli.ctl.is_advance)
}

pub fn predict(state_0: &OutputState, stimuli: &Stimuli) -> PredictedState {
    let reset = stimuli.ctl.in_reset();
    let reset_or_flush = reset || stimuli.ctl.is_flush;

    let advance = advance(state_0, stimuli);
    let error = !reset && (state_0.ctl.is_error || stimuli.debug.is_error);
    // a single-cycle stage never stalls
    let stall = false;
    let valid = !reset_or_flush
        && ((advance && stimuli.ctl.is_valid) || (!advance && state_0.ctl.is_valid));
    let value = if advance { !stimuli.value } else { state_0.value };

    PredictedState {
        ctl: Controls::new(advance, error, stall, valid),
        value,
    }
}

pub fn predict_state(transaction: &Transaction) -> PredictedState {
    predict(&transaction.state_0, &transaction.stimuli)
}

pub fn predict_controls(transaction: &Transaction) -> Controls {
    predict_state(transaction).ctl
}
