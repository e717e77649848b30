use crate::{
    error::UsageError,
    phase::{Objection, Phase},
    request::Randomise,
    sequence::{ItemStream, Sequence},
};
use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::iter::Peekable;

/// Driver-side view of a sequencer: an item source that waits for every item
/// to be acknowledged before issuing the next.
pub trait ItemPort<I> {
    /// The next item, or `None` while no sequence has one to offer.
    fn get_next_item(&mut self) -> Result<Option<I>, UsageError>;

    /// Acknowledges the item returned by the last `get_next_item`.
    fn item_done(&mut self) -> Result<(), UsageError>;

    fn has_outstanding(&self) -> bool;
}

struct Running<I> {
    name: String,
    items: Peekable<ItemStream<I>>,
    sent: u64,
    /// The last item has been handed out.
    drained: bool,
    _objection: Objection,
}

/// Hands the items of one sequence at a time to a driver.
///
/// Items are randomised with the sequencer's own generator as they are
/// handed out, so a run is reproducible from its seed. Once the running
/// sequence has handed out its last item, one more sequence may be started;
/// it takes over as soon as that item is acknowledged, so consecutive
/// sequences occupy consecutive edges.
pub struct Sequencer<I> {
    name: String,
    rng: ChaCha8Rng,
    running: Option<Running<I>>,
    next: Option<Running<I>>,
    outstanding: Option<u64>,
    issued: u64,
    completed: Vec<String>,
}

impl<I> std::fmt::Debug for Sequencer<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("name", &self.name)
            .field("running", &self.running.as_ref().map(|r| r.name.as_str()))
            .field("next", &self.next.as_ref().map(|r| r.name.as_str()))
            .field("outstanding", &self.outstanding)
            .field("issued", &self.issued)
            .finish()
    }
}

impl<I: Randomise> Sequencer<I> {
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            running: None,
            next: None,
            outstanding: None,
            issued: 0,
            completed: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether [`start`](Self::start) would accept another sequence now.
    pub fn accepts_sequence(&self) -> bool {
        match &self.running {
            None => true,
            Some(running) => running.drained && self.next.is_none(),
        }
    }

    /// Starts `sequence`, raising an objection on `phase` until its last item
    /// has been acknowledged. Starting while the running sequence still has
    /// items to hand out is rejected.
    pub fn start(&mut self, sequence: &dyn Sequence<I>, phase: &Phase) -> Result<(), UsageError> {
        if !self.accepts_sequence() {
            let busy = self.next.as_ref().or(self.running.as_ref());
            return Err(UsageError::ReentrantSequence {
                name: busy.map_or_else(String::new, |r| r.name.clone()),
            });
        }
        let objection = phase.raise_objection(sequence.name());
        let mut started = Running {
            name: sequence.name().to_string(),
            items: sequence.body().peekable(),
            sent: 0,
            drained: false,
            _objection: objection,
        };
        if started.items.peek().is_none() {
            debug!("{}: {} produced no items", self.name, started.name);
            self.completed.push(started.name);
        } else if self.running.is_some() {
            debug!("{}: {} queued", self.name, started.name);
            self.next = Some(started);
        } else {
            self.running = Some(started);
        }
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        self.running.is_some()
    }

    pub fn current_sequence(&self) -> Option<&str> {
        self.running.as_ref().map(|r| r.name.as_str())
    }

    /// Items handed out over the sequencer's life.
    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Names of the sequences whose last item has been acknowledged, in
    /// order.
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn sequences_completed(&self) -> u64 {
        self.completed.len() as u64
    }

    fn finish_if_drained(&mut self) {
        if !self.running.as_ref().is_some_and(|r| r.drained) {
            return;
        }
        if let Some(running) = self.running.take() {
            info!("{}: SEQUENCE_END: {} ({} items)", self.name, running.name, running.sent);
            self.completed.push(running.name);
        }
        self.running = self.next.take();
    }
}

impl<I: Randomise> ItemPort<I> for Sequencer<I> {
    fn get_next_item(&mut self) -> Result<Option<I>, UsageError> {
        if let Some(serial) = self.outstanding {
            return Err(UsageError::ItemOutstanding { serial });
        }
        let Some(running) = self.running.as_mut() else {
            return Ok(None);
        };
        let Some(mut item) = running.items.next() else {
            return Ok(None);
        };
        // send_item: start, randomise, finish
        item.randomise(&mut self.rng);
        running.sent += 1;
        running.drained = running.items.peek().is_none();
        self.issued += 1;
        self.outstanding = Some(self.issued);
        Ok(Some(item))
    }

    fn item_done(&mut self) -> Result<(), UsageError> {
        self.outstanding
            .take()
            .ok_or(UsageError::NoItemOutstanding)?;
        self.finish_if_drained();
        Ok(())
    }

    fn has_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }
}
