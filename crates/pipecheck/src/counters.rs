//! Verdict and coverage tallies kept by the scoreboards.

use crate::error::UsageError;
use bit_set::BitSet;
use serde::Serialize;

/// Passed, failed and moot observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassFailCount {
    pass: u64,
    fail: u64,
    moot: u64,
}

impl PassFailCount {
    pub fn record_pass(&mut self) {
        self.pass += 1;
    }

    pub fn record_fail(&mut self) {
        self.fail += 1;
    }

    /// An observation with nothing to check. Never affects [`is_pass`](Self::is_pass).
    pub fn record_moot(&mut self) {
        self.moot += 1;
    }

    /// Records a pass or a failure.
    pub fn record(&mut self, passed: bool) {
        if passed {
            self.record_pass();
        } else {
            self.record_fail();
        }
    }

    pub fn pass(&self) -> u64 {
        self.pass
    }

    pub fn fail(&self) -> u64 {
        self.fail
    }

    pub fn moot(&self) -> u64 {
        self.moot
    }

    /// At least one pass and no failures.
    pub fn is_pass(&self) -> bool {
        self.pass > 0 && self.fail == 0
    }

    pub fn total_observations(&self) -> u64 {
        self.pass + self.fail + self.moot
    }
}

/// One `N`-bit sample. Its value always fits the width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample<const N: usize>(usize);

impl<const N: usize> Sample<N> {
    pub fn new(bits: usize) -> Result<Self, UsageError> {
        if bits >= 1 << N {
            return Err(UsageError::InvalidSample { bits, width: N });
        }
        Ok(Self(bits))
    }

    /// Packs `flags`, most significant first.
    pub fn from_flags(flags: [bool; N]) -> Self {
        Self(
            flags
                .into_iter()
                .fold(0, |bits, flag| (bits << 1) | usize::from(flag)),
        )
    }

    pub fn bits(self) -> usize {
        self.0
    }
}

/// Occurrences of every ordered pair of consecutive `N`-bit samples.
///
/// The first sample only seeds the history, so `k` samples yield `k - 1`
/// pairs.
#[derive(Debug, Clone)]
pub struct ControlBitPairCount<const N: usize> {
    counts: Vec<u64>,
    observed: BitSet,
    prior: Option<usize>,
}

impl<const N: usize> Default for ControlBitPairCount<N> {
    fn default() -> Self {
        Self {
            counts: vec![0; Self::PAIRS],
            observed: BitSet::with_capacity(Self::PAIRS),
            prior: None,
        }
    }
}

impl<const N: usize> ControlBitPairCount<N> {
    /// Distinct values of one sample.
    pub const COMBINATIONS: usize = 1 << N;
    pub const PAIRS: usize = Self::COMBINATIONS * Self::COMBINATIONS;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, sample: Sample<N>) {
        let bits = sample.bits();
        if let Some(prior) = self.prior {
            let index = prior * Self::COMBINATIONS + bits;
            self.counts[index] += 1;
            self.observed.insert(index);
        }
        self.prior = Some(bits);
    }

    /// Occurrences of `prior` followed by `bits`.
    pub fn pair_count(&self, prior: usize, bits: usize) -> u64 {
        if prior >= Self::COMBINATIONS || bits >= Self::COMBINATIONS {
            return 0;
        }
        self.counts[prior * Self::COMBINATIONS + bits]
    }

    /// Number of distinct pairs seen at least once.
    pub fn coverage_observations(&self) -> usize {
        self.observed.len()
    }

    /// In `[0.0, 1.0]`.
    pub fn coverage_fraction(&self) -> f64 {
        self.coverage_observations() as f64 / Self::PAIRS as f64
    }

    pub fn is_coverage_complete(&self) -> bool {
        self.coverage_observations() == Self::PAIRS
    }

    pub fn minimum_observation(&self) -> u64 {
        self.counts.iter().copied().min().unwrap_or(0)
    }

    pub fn maximum_observation(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Pairs never seen, as `(prior, bits)`.
    pub fn missing(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..Self::PAIRS)
            .filter(|index| !self.observed.contains(*index))
            .map(|index| (index / Self::COMBINATIONS, index % Self::COMBINATIONS))
    }
}
