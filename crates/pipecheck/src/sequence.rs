use crate::{error::UsageError, sequence_item::SequenceItem};
use serde::{Deserialize, Serialize};

mod single_cycle;

pub use single_cycle::{
    AllControlPairs, ErrorWithAdvanceValid, FlushWithAdvanceNeverAdvances, RandomLoop,
    RandomWeightedSequence, ResetAdvanceWithoutValid,
};

/// Lazily produced items. Nothing is generated before the driver asks.
pub type ItemStream<I> = Box<dyn Iterator<Item = I>>;

/// A scripted or randomised ordering of items.
pub trait Sequence<I> {
    fn name(&self) -> &str;

    /// Repeat count; its meaning is specific to each sequence.
    fn count(&self) -> u32;

    fn body(&self) -> ItemStream<I>;
}

/// Name and repeat count shared by every sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceBase {
    name: String,
    count: u32,
}

impl SequenceBase {
    pub fn new(name: impl Into<String>, count: u32) -> Result<Self, UsageError> {
        let mut base = Self {
            name: name.into(),
            count: 1,
        };
        base.set_count(count)?;
        Ok(base)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn set_count(&mut self, count: u32) -> Result<&mut Self, UsageError> {
        if count < 1 {
            return Err(UsageError::InvalidCount {
                name: self.name.clone(),
                count,
            });
        }
        self.count = count;
        Ok(self)
    }
}

/// Sends the same item `count` times.
#[derive(Debug, Clone)]
pub struct Repeat<I> {
    base: SequenceBase,
    item: I,
}

impl<I: Clone + 'static> Repeat<I> {
    pub const DEFAULT_COUNT: u32 = 10;

    pub fn new(name: impl Into<String>, item: I, count: u32) -> Result<Self, UsageError> {
        Ok(Self {
            base: SequenceBase::new(name, count)?,
            item,
        })
    }

    pub fn set_count(&mut self, count: u32) -> Result<&mut Self, UsageError> {
        self.base.set_count(count)?;
        Ok(self)
    }
}

impl<I: Clone + 'static> Sequence<I> for Repeat<I> {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn count(&self) -> u32 {
        self.base.count()
    }

    fn body(&self) -> ItemStream<I> {
        Box::new(std::iter::repeat_n(self.item.clone(), self.base.count() as usize))
    }
}

/// Every sequence the single-cycle test can run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SequenceKind {
    Repeat,
    AllControlPairs,
    RandomWeighted,
    RandomLoop,
    #[serde(rename = "flush_w_advance_never_advances")]
    #[value(name = "flush_w_advance_never_advances")]
    FlushWithAdvanceNeverAdvances,
    #[serde(rename = "error_w_advance_valid")]
    #[value(name = "error_w_advance_valid")]
    ErrorWithAdvanceValid,
    #[serde(rename = "reset_advance_with_out_valid")]
    #[value(name = "reset_advance_with_out_valid")]
    ResetAdvanceWithoutValid,
}

impl SequenceKind {
    pub fn default_count(self) -> u32 {
        match self {
            SequenceKind::Repeat => Repeat::<SequenceItem>::DEFAULT_COUNT,
            SequenceKind::AllControlPairs => AllControlPairs::DEFAULT_COUNT,
            SequenceKind::RandomWeighted => RandomWeightedSequence::DEFAULT_COUNT,
            SequenceKind::RandomLoop => RandomLoop::DEFAULT_COUNT,
            SequenceKind::FlushWithAdvanceNeverAdvances => {
                FlushWithAdvanceNeverAdvances::DEFAULT_COUNT
            }
            SequenceKind::ErrorWithAdvanceValid => ErrorWithAdvanceValid::DEFAULT_COUNT,
            SequenceKind::ResetAdvanceWithoutValid => ResetAdvanceWithoutValid::DEFAULT_COUNT,
        }
    }

    pub fn build(self, count: Option<u32>) -> Result<Box<dyn Sequence<SequenceItem>>, UsageError> {
        let count = count.unwrap_or_else(|| self.default_count());
        Ok(match self {
            SequenceKind::Repeat => {
                Box::new(Repeat::new("repeat", SequenceItem::default(), count)?)
            }
            SequenceKind::AllControlPairs => Box::new(AllControlPairs::with_count(count)?),
            SequenceKind::RandomWeighted => Box::new(RandomWeightedSequence::with_count(count)?),
            SequenceKind::RandomLoop => Box::new(RandomLoop::with_count(count)?),
            SequenceKind::FlushWithAdvanceNeverAdvances => {
                Box::new(FlushWithAdvanceNeverAdvances::with_count(count)?)
            }
            SequenceKind::ErrorWithAdvanceValid => {
                Box::new(ErrorWithAdvanceValid::with_count(count)?)
            }
            SequenceKind::ResetAdvanceWithoutValid => {
                Box::new(ResetAdvanceWithoutValid::with_count(count)?)
            }
        })
    }
}

/// One entry of a test's sequence list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSpec {
    pub kind: SequenceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl SequenceSpec {
    pub fn new(kind: SequenceKind) -> Self {
        Self { kind, count: None }
    }

    pub fn with_count(kind: SequenceKind, count: u32) -> Self {
        Self {
            kind,
            count: Some(count),
        }
    }

    pub fn build(&self) -> Result<Box<dyn Sequence<SequenceItem>>, UsageError> {
        self.kind.build(self.count)
    }

    /// The full single-cycle test, in order.
    pub fn default_list() -> Vec<SequenceSpec> {
        vec![
            SequenceSpec::new(SequenceKind::Repeat),
            SequenceSpec::with_count(SequenceKind::Repeat, 1),
            SequenceSpec::with_count(SequenceKind::Repeat, 5),
            SequenceSpec::new(SequenceKind::AllControlPairs),
            SequenceSpec::new(SequenceKind::RandomWeighted),
            SequenceSpec::new(SequenceKind::RandomLoop),
            SequenceSpec::new(SequenceKind::FlushWithAdvanceNeverAdvances),
            SequenceSpec::new(SequenceKind::ErrorWithAdvanceValid),
            SequenceSpec::new(SequenceKind::ResetAdvanceWithoutValid),
        ]
    }
}

impl std::str::FromStr for SequenceSpec {
    type Err = String;

    /// `kind` or `kind:count`, e.g. `random_loop:500`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use clap::ValueEnum;
        let (kind, count) = match s.split_once(':') {
            Some((kind, count)) => {
                let count = count
                    .parse::<u32>()
                    .map_err(|e| format!("invalid count `{count}`: {e}"))?;
                (kind, Some(count))
            }
            None => (s, None),
        };
        let kind = SequenceKind::from_str(kind, true)?;
        Ok(Self { kind, count })
    }
}
