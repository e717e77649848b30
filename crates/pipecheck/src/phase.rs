use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct PhaseState {
    raised: Vec<String>,
    total_raised: u64,
}

/// Objection-counted phase completion. Cloning yields another handle to the
/// same phase.
#[derive(Debug, Clone, Default)]
pub struct Phase {
    name: Rc<str>,
    state: Rc<RefCell<PhaseState>>,
}

impl Phase {
    pub fn new(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            state: Rc::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raises an objection on behalf of `who`; it is dropped together with the
    /// returned guard.
    #[must_use = "the objection is dropped as soon as the guard is"]
    pub fn raise_objection(&self, who: &str) -> Objection {
        let mut state = self.state.borrow_mut();
        state.raised.push(who.to_string());
        state.total_raised += 1;
        debug!("{}: objection raised by {who} ({} open)", self.name, state.raised.len());
        Objection {
            phase: self.clone(),
            who: who.to_string(),
        }
    }

    pub fn objection_count(&self) -> usize {
        self.state.borrow().raised.len()
    }

    /// True once every raised objection has been dropped.
    pub fn is_clear(&self) -> bool {
        self.objection_count() == 0
    }

    /// Objections raised over the life of the phase.
    pub fn total_raised(&self) -> u64 {
        self.state.borrow().total_raised
    }

    fn drop_objection(&self, who: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(pos) = state.raised.iter().rposition(|name| name == who) {
            state.raised.remove(pos);
        }
        debug!("{}: objection dropped by {who} ({} open)", self.name, state.raised.len());
    }
}

/// Guard for one raised objection.
#[derive(Debug)]
pub struct Objection {
    phase: Phase,
    who: String,
}

impl Objection {
    pub fn who(&self) -> &str {
        &self.who
    }
}

impl Drop for Objection {
    fn drop(&mut self) {
        self.phase.drop_objection(&self.who);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objections_clear_when_guards_drop() {
        let phase = Phase::new("run");
        assert!(phase.is_clear());
        let first = phase.raise_objection("seq_a");
        let second = phase.raise_objection("seq_b");
        assert_eq!(phase.objection_count(), 2);
        drop(first);
        assert_eq!(phase.objection_count(), 1);
        assert_eq!(second.who(), "seq_b");
        drop(second);
        assert!(phase.is_clear());
        assert_eq!(phase.total_raised(), 2);
    }

    #[test]
    fn clones_share_the_same_count() {
        let phase = Phase::new("run");
        let handle = phase.clone();
        let _guard = handle.raise_objection("test");
        assert!(!phase.is_clear());
    }
}
