use crate::{
    error::{HarnessError, SimulationError},
    scheduler::{Edge, Scheduler},
    signal::Bus,
    vcd::VcdWriter,
};
use std::path::Path;

/// Delta cycles allowed per edge before the bus is declared unstable.
pub const DELTA_LIMIT: usize = 64;

/// A cooperative process attached to the simulated bus.
///
/// Every process sees the values committed before the edge; its writes
/// become visible only once the kernel commits the bus. The order in which
/// processes are handed to [`Simulation::step`] therefore does not matter.
pub trait Process<B> {
    fn name(&self) -> &str;

    /// Runs on every rising edge of the system clock.
    fn posedge(&mut self, time: u64, bus: &mut B) -> Result<(), HarnessError>;

    /// Combinational evaluation, run after every commit that changed the bus.
    fn settle(&mut self, _bus: &mut B) -> Result<(), HarnessError> {
        Ok(())
    }
}

/// A timed simulation of one bus driven by one system clock.
pub struct Simulation<B: Bus> {
    pub(crate) bus: B,
    pub(crate) scheduler: Scheduler,
    pub(crate) clock: bool,
    pub(crate) cycles: u64,
    pub(crate) elaborated: bool,
    pub(crate) vcd: Option<VcdWriter>,
}

impl<B: Bus> std::fmt::Debug for Simulation<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("bus", &self.bus.name())
            .field("time", &self.scheduler.time)
            .field("cycles", &self.cycles)
            .finish()
    }
}

impl<B: Bus> Simulation<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            scheduler: Scheduler::new(),
            clock: false,
            cycles: 0,
            elaborated: false,
            vcd: None,
        }
    }

    /// Register the system clock and its period, enqueuing the first edge.
    /// `initial_delay` specifies when the first rising edge occurs.
    pub fn add_clock(&mut self, period: u64, initial_delay: u64) {
        self.scheduler.add_clock(period, initial_delay);
    }

    /// Starts tracing every probe of the bus to a VCD file.
    pub fn trace_to<P: AsRef<Path>>(&mut self, path: P) -> Result<(), HarnessError> {
        let probes = self.bus.probes();
        self.vcd = Some(VcdWriter::create(path, self.bus.name(), &probes)?);
        Ok(())
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Settles the bus before the first edge so that combinational outputs
    /// reflect the initial register state.
    pub fn elaborate(&mut self, processes: &mut [&mut dyn Process<B>]) -> Result<(), HarnessError> {
        if self.elaborated {
            return Ok(());
        }
        for process in processes.iter_mut() {
            process.settle(&mut self.bus)?;
        }
        self.settle(processes)?;
        self.elaborated = true;
        self.dump()
    }

    /// Advance time to the next clock edge and process it.
    /// Returns the edge, or `None` if nothing is scheduled.
    pub fn step(
        &mut self,
        processes: &mut [&mut dyn Process<B>],
    ) -> Result<Option<Edge>, HarnessError> {
        self.elaborate(processes)?;
        let (current_time, events) = match self.scheduler.pop_all_at_next_time() {
            Some(res) => res,
            None => return Ok(None),
        };
        self.scheduler.time = current_time;

        let mut last_edge = None;
        for ev in &events {
            let rising = ev.edge == Edge::Rising && !self.clock;
            self.clock = ev.edge.level();
            if rising {
                self.cycles += 1;
                for process in processes.iter_mut() {
                    process.posedge(current_time, &mut self.bus)?;
                }
            }
            self.settle(processes)?;
            self.scheduler.reschedule(ev);
            last_edge = Some(ev.edge);
        }

        self.dump()?;
        Ok(last_edge)
    }

    /// Steps until the next rising edge has been processed.
    pub fn cycle(&mut self, processes: &mut [&mut dyn Process<B>]) -> Result<u64, HarnessError> {
        loop {
            match self.step(processes)? {
                Some(Edge::Rising) => return Ok(self.scheduler.time),
                Some(Edge::Falling) => continue,
                None => return Err(SimulationError::NoClock.into()),
            }
        }
    }

    /// Advance time and run until `end_time` (inclusive).
    pub fn run_until(
        &mut self,
        end_time: u64,
        processes: &mut [&mut dyn Process<B>],
    ) -> Result<(), HarnessError> {
        while let Some(next_time) = self.scheduler.next_event_time() {
            if next_time > end_time {
                break;
            }
            self.step(processes)?;
        }
        self.scheduler.time = end_time;
        Ok(())
    }

    // Delta cycles: commit, re-evaluate combinational logic, repeat until quiet.
    fn settle(&mut self, processes: &mut [&mut dyn Process<B>]) -> Result<(), HarnessError> {
        for _ in 0..DELTA_LIMIT {
            if !self.bus.commit() {
                return Ok(());
            }
            for process in processes.iter_mut() {
                process.settle(&mut self.bus)?;
            }
        }
        Err(SimulationError::CombinationalLoop {
            limit: DELTA_LIMIT,
            time: self.scheduler.time,
        }
        .into())
    }

    fn dump(&mut self) -> Result<(), HarnessError> {
        if let Some(vcd) = self.vcd.as_mut() {
            vcd.dump(self.scheduler.time, &self.bus.probes())?;
        }
        Ok(())
    }

    /// Flushes the waveform, if any.
    pub fn finish(&mut self) -> Result<(), HarnessError> {
        if let Some(vcd) = self.vcd.as_mut() {
            vcd.flush()?;
        }
        Ok(())
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> u64 {
        self.scheduler.time
    }

    /// Returns the time of the next scheduled event, if any.
    pub fn next_event_time(&self) -> Option<u64> {
        self.scheduler.next_event_time()
    }

    /// Number of rising edges processed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn clock_level(&self) -> bool {
        self.clock
    }
}
