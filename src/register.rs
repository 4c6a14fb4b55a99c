//! Stochastic shift register — the looping heart of the sequencer.
//!
//! A 16-bit register is shifted left once per step. The bit fed back in is
//! read from position `length - 1`, and is either kept (lock) or inverted
//! (flip) depending on a single probability control:
//!
//! - `probability = 1.0` → the loop repeats verbatim with period `length`
//! - `probability = 0.0` → the fed-back bit is always inverted
//! - anything between → the loop slowly drifts

use rand::Rng;
use serde::Serialize;

// ── Sequence Length ─────────────────────────────────────────

/// Lengths selectable from the X knob, in knob order.
pub const VALID_LENGTHS: [u8; 8] = [2, 3, 4, 5, 6, 8, 12, 16];

/// Length used whenever the knob index falls outside [`VALID_LENGTHS`].
pub const DEFAULT_LENGTH: u8 = 16;

/// Loop length of the register, always one of [`VALID_LENGTHS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub struct SequenceLength(u8);

impl SequenceLength {
    /// Look up a length by position in [`VALID_LENGTHS`], falling back to 16.
    pub fn from_index(index: usize) -> Self {
        match VALID_LENGTHS.get(index) {
            Some(&len) => SequenceLength(len),
            None => {
                log::debug!("length index {index} out of range, using {DEFAULT_LENGTH}");
                SequenceLength(DEFAULT_LENGTH)
            }
        }
    }

    /// Discretize a knob position in [0, 1].
    pub fn from_knob(value: f64) -> Self {
        Self::from_index(discretize(value, VALID_LENGTHS.len()))
    }

    /// Number of steps in the loop.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Bit position read back for mutation feedback.
    pub fn feedback_bit(self) -> u8 {
        self.0 - 1
    }

    /// Fixed 6-bit LED pattern shown briefly after the length changes.
    /// Bit 5 maps to the first LED.
    pub fn display_pattern(self) -> u8 {
        match self.0 {
            2 => 0b110000,
            3 => 0b111000,
            4 => 0b111100,
            5 => 0b111110,
            6 => 0b111111,
            8 => 0b001111,
            12 => 0b000011,
            16 => 0b110011,
            _ => 0,
        }
    }
}

impl Default for SequenceLength {
    fn default() -> Self {
        SequenceLength(DEFAULT_LENGTH)
    }
}

impl TryFrom<u8> for SequenceLength {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if VALID_LENGTHS.contains(&value) {
            Ok(SequenceLength(value))
        } else {
            Err(format!("invalid sequence length {value}, expected one of {VALID_LENGTHS:?}"))
        }
    }
}

impl From<SequenceLength> for u8 {
    fn from(len: SequenceLength) -> u8 {
        len.0
    }
}

/// Map a continuous control in [0, 1] onto `count` discrete slots.
///
/// The `- 0.01` keeps a fully clockwise knob inside the last slot.
pub(crate) fn discretize(value: f64, count: usize) -> usize {
    let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    (v * (count as f64 - 0.01)).floor() as usize
}

// ── Register Step ───────────────────────────────────────────

/// Advance a register by one step.
///
/// Draws a single `r ~ U[0, 1)` from `rng`. If `r >= probability` the bit at
/// `length - 1` is inverted before being shifted back in; otherwise it is
/// repeated unchanged.
pub fn step<R: Rng + ?Sized>(
    register: u16,
    length: SequenceLength,
    probability: f64,
    rng: &mut R,
) -> u16 {
    let probability = if probability.is_nan() { 0.0 } else { probability.clamp(0.0, 1.0) };
    let bit = (register >> length.feedback_bit()) & 1;
    let r: f64 = rng.gen_range(0.0..1.0);
    let new_bit = if r >= probability { bit ^ 1 } else { bit };
    // u16 shift drops bit 15, which is the 16-bit mask.
    (register << 1) | new_bit
}

/// One channel's register state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftRegister {
    value: u16,
}

impl ShiftRegister {
    pub fn new(seed: u16) -> Self {
        ShiftRegister { value: seed }
    }

    /// Seed a register from a random source.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        ShiftRegister {
            value: rng.gen_range(0..=u16::MAX),
        }
    }

    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        length: SequenceLength,
        probability: f64,
        rng: &mut R,
    ) -> u16 {
        self.value = step(self.value, length, probability, rng);
        log::trace!("register -> {:#06x}", self.value);
        self.value
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    /// The low byte drives both pitch and modulation outputs.
    pub fn low_byte(&self) -> u8 {
        (self.value & 0xFF) as u8
    }
}
