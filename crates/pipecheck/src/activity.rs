//! Console progress for long runs: a row of tics, then the cycle total.

use crate::error::{HarnessError, UsageError};
use std::io::Write;

pub const DEFAULT_LINE_WIDTH: u32 = 72;

#[derive(Debug)]
pub struct ActivityIndicator<W: Write = std::io::Stderr> {
    out: W,
    cycles_per_tic: u32,
    tics_per_line: u32,
    cycle_iteration: u32,
    line_tics: u32,
    cycles: u64,
    tic: char,
    complete: bool,
}

impl ActivityIndicator {
    pub fn stderr(cycles_per_tic: u32) -> Self {
        Self::new(std::io::stderr(), cycles_per_tic, DEFAULT_LINE_WIDTH)
    }
}

impl<W: Write> ActivityIndicator<W> {
    /// Zero rates are treated as one.
    pub fn new(out: W, cycles_per_tic: u32, tics_per_line: u32) -> Self {
        Self {
            out,
            cycles_per_tic: cycles_per_tic.max(1),
            tics_per_line: tics_per_line.max(1),
            cycle_iteration: 0,
            line_tics: 0,
            cycles: 0,
            tic: '.',
            complete: false,
        }
    }

    pub fn with_tic(mut self, tic: char) -> Self {
        self.tic = tic;
        self
    }

    /// Counts one cycle, printing a tic at the first cycle of every group.
    pub fn tic(&mut self) -> Result<&mut Self, HarnessError> {
        if self.complete {
            return Err(UsageError::Activity("tic after complete").into());
        }
        if self.line_tics == self.tics_per_line {
            self.line_tics = 0;
            writeln!(self.out)?;
        }
        if self.cycle_iteration == 0 {
            write!(self.out, "{}", self.tic)?;
        }
        self.cycle_iteration += 1;
        if self.cycle_iteration == self.cycles_per_tic {
            self.cycle_iteration = 0;
            self.line_tics += 1;
        }
        self.cycles += 1;
        Ok(self)
    }

    pub fn complete(&mut self) -> Result<&mut Self, HarnessError> {
        if self.complete {
            return Err(UsageError::Activity("complete called twice").into());
        }
        if self.line_tics >= 2 {
            write!(self.out, "{}", self.tic)?;
        }
        writeln!(self.out, " Total Cycles: {}", self.cycles)?;
        self.out.flush()?;
        self.complete = true;
        Ok(self)
    }

    /// Starts a new row. The cycle total keeps accumulating.
    pub fn reset(&mut self) -> Result<&mut Self, HarnessError> {
        if !self.complete {
            return Err(UsageError::Activity("reset before complete").into());
        }
        self.complete = false;
        self.cycle_iteration = 0;
        self.line_tics = 0;
        Ok(self)
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
