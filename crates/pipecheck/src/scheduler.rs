use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDef {
    pub period: u64,
}

impl ClockDef {
    /// Time between a rising and the following falling edge (50 % duty).
    pub fn half_period(&self) -> u64 {
        (self.period / 2).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    pub fn level(self) -> bool {
        matches!(self, Edge::Rising)
    }

    pub fn toggled(self) -> Self {
        match self {
            Edge::Rising => Edge::Falling,
            Edge::Falling => Edge::Rising,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimEvent {
    pub time: u64,
    pub edge: Edge,
}

impl PartialEq for SimEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.edge == other.edge
    }
}

impl Eq for SimEvent {}

impl PartialOrd for SimEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Earlier time has higher priority (BinaryHeap is a Max-Heap)
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.edge.level().cmp(&self.edge.level()))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    pub(crate) time: u64,
    pub(crate) clock: Option<ClockDef>,
    pub(crate) event_queue: BinaryHeap<SimEvent>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the system clock; its first rising edge happens at `initial_delay`.
    pub fn add_clock(&mut self, period: u64, initial_delay: u64) {
        self.clock = Some(ClockDef { period });
        self.push(SimEvent {
            time: initial_delay,
            edge: Edge::Rising,
        });
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.event_queue.peek().map(|e| e.time)
    }

    pub fn push(&mut self, event: SimEvent) {
        self.event_queue.push(event);
    }

    pub fn pop_all_at_next_time(&mut self) -> Option<(u64, Vec<SimEvent>)> {
        let next_time = self.next_event_time()?;
        let mut events = Vec::new();
        while let Some(ev) = self.event_queue.peek() {
            if ev.time != next_time {
                break;
            }
            if let Some(ev) = self.event_queue.pop() {
                events.push(ev);
            }
        }
        Some((next_time, events))
    }

    /// Re-arms the clock for the edge following `event`.
    pub fn reschedule(&mut self, event: &SimEvent) {
        if let Some(def) = self.clock {
            self.push(SimEvent {
                time: event.time + def.half_period(),
                edge: event.edge.toggled(),
            });
        }
    }
}
