//! Stimulus payloads carried by sequence items.

use crate::bus::{RESET_ASSERTED, RESET_RELEASED, Reset};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Types that draw fresh field values from a caller-owned generator.
pub trait Randomise {
    fn randomise<R: Rng + ?Sized>(&mut self, rng: &mut R);
}

/// The five input control bits, reset being low-active. The default holds
/// the stage in reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlBits {
    pub reset: Reset,
    pub is_advance: bool,
    pub is_error: bool,
    pub is_flush: bool,
    pub is_valid: bool,
}

impl ControlBits {
    pub fn new(reset: Reset, is_advance: bool, is_error: bool, is_flush: bool, is_valid: bool) -> Self {
        Self {
            reset,
            is_advance,
            is_error,
            is_flush,
            is_valid,
        }
    }

    /// Builds the bits from a 5-bit code, most significant bit first:
    /// reset, is_advance, is_error, is_flush, is_valid.
    pub fn from_code(code: u32) -> Self {
        let bit = |n: u32| (code >> n) & 1 == 1;
        Self {
            reset: if bit(4) { RESET_RELEASED } else { RESET_ASSERTED },
            is_advance: bit(3),
            is_error: bit(2),
            is_flush: bit(1),
            is_valid: bit(0),
        }
    }

    /// Inverse of [`ControlBits::from_code`].
    pub fn code(&self) -> u32 {
        (u32::from(self.reset & 1) << 4)
            | (u32::from(self.is_advance) << 3)
            | (u32::from(self.is_error) << 2)
            | (u32::from(self.is_flush) << 1)
            | u32::from(self.is_valid)
    }
}

/// Instruction tag travelling with the data word for debugging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub i_binary: u32,
    pub i_number: u32,
}

impl Instruction {
    pub fn new(i_binary: u32, i_number: u32) -> Self {
        Self { i_binary, i_number }
    }
}

/// Control bits and instruction drawn independently on every randomisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RandomWeighted {
    pub control: ControlBits,
    pub instruction: Instruction,
}

// Disjoint windows of one 64-bit draw.
const RESET_WINDOW: u64 = 0x0000_0000_00FF; // released 255/256
const ADVANCE_WINDOW: u64 = 0x0000_0000_0300; // 3/4
const ERROR_WINDOW: u64 = 0x0000_03FF_0000; // 1/1024
const FLUSH_WINDOW: u64 = 0x003F_0000_0000; // 1/64
const VALID_WINDOW: u64 = 0x0300_0000_0000; // 3/4

impl RandomWeighted {
    /// Decodes the control bits from one 64-bit draw.
    pub fn control_from_bits(bits: u64) -> ControlBits {
        ControlBits {
            reset: if bits & RESET_WINDOW != 0 {
                RESET_RELEASED
            } else {
                RESET_ASSERTED
            },
            is_advance: bits & ADVANCE_WINDOW != 0,
            is_error: bits & ERROR_WINDOW == 0,
            is_flush: bits & FLUSH_WINDOW == 0,
            is_valid: bits & VALID_WINDOW != 0,
        }
    }
}

impl Randomise for RandomWeighted {
    fn randomise<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.control = Self::control_from_bits(rng.r#gen::<u64>());
        self.instruction = Instruction {
            i_binary: rng.r#gen::<u32>(),
            i_number: rng.r#gen::<u32>(),
        };
    }
}

/// Explicitly set stimulus with a diagnostic label. Never randomised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedValue {
    pub control: ControlBits,
    pub instruction: Instruction,
    pub prefix: String,
}

impl FixedValue {
    pub fn set_control(
        &mut self,
        reset: Reset,
        is_advance: bool,
        is_error: bool,
        is_flush: bool,
        is_valid: bool,
    ) -> &mut Self {
        self.control = ControlBits::new(reset, is_advance, is_error, is_flush, is_valid);
        self
    }

    pub fn set_instruction(&mut self, i_binary: u32, i_number: u32) -> &mut Self {
        self.instruction = Instruction::new(i_binary, i_number);
        self
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.prefix = prefix.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Reset,
    Hold,
    Flush,
    Error,
    RandomWeighted,
    FixedValue,
}

/// Exactly one stimulus kind. The empty kinds carry no data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Request {
    #[default]
    Reset,
    Hold,
    Flush,
    Error,
    RandomWeighted(RandomWeighted),
    FixedValue(FixedValue),
}

impl Request {
    /// A default-constructed request of the given kind.
    pub fn of_kind(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Reset => Request::Reset,
            RequestKind::Hold => Request::Hold,
            RequestKind::Flush => Request::Flush,
            RequestKind::Error => Request::Error,
            RequestKind::RandomWeighted => Request::RandomWeighted(RandomWeighted::default()),
            RequestKind::FixedValue => Request::FixedValue(FixedValue::default()),
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Reset => RequestKind::Reset,
            Request::Hold => RequestKind::Hold,
            Request::Flush => RequestKind::Flush,
            Request::Error => RequestKind::Error,
            Request::RandomWeighted(_) => RequestKind::RandomWeighted,
            Request::FixedValue(_) => RequestKind::FixedValue,
        }
    }
}

impl Randomise for Request {
    fn randomise<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self {
            Request::RandomWeighted(request) => request.randomise(rng),
            Request::Reset
            | Request::Hold
            | Request::Flush
            | Request::Error
            | Request::FixedValue(_) => {}
        }
    }
}

impl From<FixedValue> for Request {
    fn from(value: FixedValue) -> Self {
        Request::FixedValue(value)
    }
}

impl From<RandomWeighted> for Request {
    fn from(value: RandomWeighted) -> Self {
        Request::RandomWeighted(value)
    }
}
