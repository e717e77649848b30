use crate::request::{FixedValue, RandomWeighted, Randomise, Request, RequestKind};
use rand::Rng;

/// The unit handed from a sequencer to a driver: exactly one active
/// [`Request`]. A fresh item holds a reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceItem {
    request: Request,
}

impl SequenceItem {
    pub fn new(request: impl Into<Request>) -> Self {
        Self {
            request: request.into(),
        }
    }

    pub fn holds(&self, kind: RequestKind) -> bool {
        self.request.kind() == kind
    }

    pub fn kind(&self) -> RequestKind {
        self.request.kind()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn fixed_value(&self) -> Option<&FixedValue> {
        match &self.request {
            Request::FixedValue(fixed) => Some(fixed),
            _ => None,
        }
    }

    pub fn random_weighted(&self) -> Option<&RandomWeighted> {
        match &self.request {
            Request::RandomWeighted(random) => Some(random),
            _ => None,
        }
    }

    /// Switches to a default-constructed request of `kind`.
    pub fn select(&mut self, kind: RequestKind) -> &mut Self {
        self.request = Request::of_kind(kind);
        self
    }

    pub fn set(&mut self, request: impl Into<Request>) -> &mut Self {
        self.request = request.into();
        self
    }

    pub fn into_request(self) -> Request {
        self.request
    }
}

impl From<Request> for SequenceItem {
    fn from(request: Request) -> Self {
        Self { request }
    }
}

impl From<FixedValue> for SequenceItem {
    fn from(fixed: FixedValue) -> Self {
        Self::new(fixed)
    }
}

impl Randomise for SequenceItem {
    fn randomise<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.request.randomise(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn default_item_is_a_reset() {
        let item = SequenceItem::default();
        assert!(item.holds(RequestKind::Reset));
        assert!(item.fixed_value().is_none());
    }

    #[test]
    fn select_replaces_the_active_request() {
        let mut fixed = FixedValue::default();
        fixed.set_prefix("stale");
        let mut item = SequenceItem::new(fixed);
        item.select(RequestKind::FixedValue);
        assert_eq!(item.fixed_value().map(|f| f.prefix.as_str()), Some(""));
        item.select(RequestKind::Hold);
        assert!(item.holds(RequestKind::Hold));
        assert!(!item.holds(RequestKind::FixedValue));
    }

    #[test]
    fn randomise_dispatches_to_the_active_request() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut item = SequenceItem::new(Request::Hold);
        item.randomise(&mut rng);
        assert_eq!(item.request(), &Request::Hold);

        item.select(RequestKind::RandomWeighted);
        item.randomise(&mut rng);
        let drawn = item.random_weighted().copied().unwrap();
        assert_ne!(drawn, RandomWeighted::default());
    }
}
