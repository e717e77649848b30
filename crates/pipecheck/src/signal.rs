/// A single-writer, multi-reader wire with register-like visibility.
///
/// `write` only stores a pending value; readers keep seeing the committed
/// value until the owning [`Bus`] is committed at the end of the evaluation
/// round.
#[derive(Debug, Clone, Default)]
pub struct Signal<T> {
    current: T,
    pending: Option<T>,
}

impl<T: Clone + PartialEq> Signal<T> {
    pub fn new(initial: T) -> Self {
        Self {
            current: initial,
            pending: None,
        }
    }

    /// The value visible in the current evaluation round.
    pub fn read(&self) -> T {
        self.current.clone()
    }

    /// Borrowing variant of [`Signal::read`] for non-`Copy` payloads.
    pub fn get(&self) -> &T {
        &self.current
    }

    /// Schedules `value` for the next evaluation round. A later write in the
    /// same round replaces an earlier one.
    pub fn write(&mut self, value: T) {
        self.pending = Some(value);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Publishes the pending value. Returns true when the visible value changed.
    pub fn commit(&mut self) -> bool {
        match self.pending.take() {
            Some(value) if value != self.current => {
                self.current = value;
                true
            }
            _ => false,
        }
    }
}

/// Values that can be dumped to a waveform.
pub trait Level: Copy {
    const WIDTH: usize;
    fn bits(self) -> u64;
}

impl Level for bool {
    const WIDTH: usize = 1;
    fn bits(self) -> u64 {
        u64::from(self)
    }
}

impl Level for u8 {
    const WIDTH: usize = 1;
    fn bits(self) -> u64 {
        u64::from(self & 1)
    }
}

impl Level for u32 {
    const WIDTH: usize = 32;
    fn bits(self) -> u64 {
        u64::from(self)
    }
}

impl<T: Level + PartialEq> Signal<T> {
    pub fn probe(&self, name: &'static str) -> Probe {
        Probe {
            name,
            width: T::WIDTH,
            value: self.current.bits(),
        }
    }
}

/// Snapshot of one traced signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub name: &'static str,
    pub width: usize,
    pub value: u64,
}

/// A bundle of signals advanced together by the simulation kernel.
pub trait Bus {
    /// Name used for configuration binding and as the waveform scope.
    fn name(&self) -> &str;

    /// Applies every pending write. Returns true when any visible value changed.
    fn commit(&mut self) -> bool;

    /// Every traced signal in declaration order.
    fn probes(&self) -> Vec<Probe>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_is_invisible_until_commit() {
        let mut sig = Signal::new(0u32);
        sig.write(7);
        assert_eq!(sig.read(), 0);
        assert!(sig.is_pending());
        assert!(sig.commit());
        assert_eq!(sig.read(), 7);
        assert!(!sig.is_pending());
    }

    #[test]
    fn commit_of_same_value_reports_no_change() {
        let mut sig = Signal::new(true);
        sig.write(true);
        assert!(!sig.commit());
        assert!(!sig.commit());
    }

    #[test]
    fn last_write_in_a_round_wins() {
        let mut sig = Signal::new(String::new());
        sig.write("first".to_string());
        sig.write("second".to_string());
        sig.commit();
        assert_eq!(sig.get(), "second");
    }

    #[test]
    fn probe_reports_width_and_bits() {
        let sig = Signal::new(0xdead_beefu32);
        let probe = sig.probe("data");
        assert_eq!(probe.width, 32);
        assert_eq!(probe.value, 0xdead_beef);
        assert_eq!(Signal::new(1u8).probe("rst").width, 1);
    }
}
