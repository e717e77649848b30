use std::cell::RefCell;
use std::rc::Rc;

/// Receives every item published on an [`AnalysisPort`].
pub trait Subscriber<T> {
    fn write(&mut self, item: &T);
}

/// Shared subscribers stay readable by whoever else holds the handle.
impl<T, S: Subscriber<T> + ?Sized> Subscriber<T> for Rc<RefCell<S>> {
    fn write(&mut self, item: &T) {
        self.borrow_mut().write(item);
    }
}

/// Collects everything it is sent.
impl<T: Clone> Subscriber<T> for Vec<T> {
    fn write(&mut self, item: &T) {
        self.push(item.clone());
    }
}

/// Synchronous one-to-many broadcast. Every subscriber has seen an item
/// before `write` returns.
pub struct AnalysisPort<T> {
    name: String,
    subscribers: Vec<Box<dyn Subscriber<T>>>,
    written: u64,
}

impl<T> std::fmt::Debug for AnalysisPort<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPort")
            .field("name", &self.name)
            .field("subscribers", &self.subscribers.len())
            .field("written", &self.written)
            .finish()
    }
}

impl<T> AnalysisPort<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: Vec::new(),
            written: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connect(&mut self, subscriber: impl Subscriber<T> + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn write(&mut self, item: &T) {
        for subscriber in &mut self.subscribers {
            subscriber.write(item);
        }
        self.written += 1;
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Items published so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_sees_every_item() {
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        let mut port = AnalysisPort::new("out");
        port.connect(first.clone());
        port.connect(second.clone());
        port.write(&1u32);
        port.write(&2u32);
        assert_eq!(*first.borrow(), [1, 2]);
        assert_eq!(*second.borrow(), [1, 2]);
        assert_eq!(port.written(), 2);
    }

    #[test]
    fn unconnected_port_drops_items() {
        let mut port = AnalysisPort::<u8>::new("out");
        port.write(&0);
        assert_eq!(port.subscriber_count(), 0);
        assert_eq!(port.written(), 1);
    }
}
