//! Clock divider for the second channel.
//!
//! Channel 2 advances on every Nth channel-1 trigger. N is picked from the
//! Y knob plus the CV 1 input, which are summed before clamping.

use serde::Serialize;

use crate::register::discretize;

/// Divisors selectable from the Y knob + CV, in knob order.
pub const DIVISORS: [u8; 8] = [1, 2, 3, 4, 6, 8, 12, 16];

/// Ratio of channel-1 to channel-2 steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Divisor(u8);

impl Divisor {
    /// Look up a divisor by position, falling back to 1.
    pub fn from_index(index: usize) -> Self {
        match DIVISORS.get(index) {
            Some(&d) => Divisor(d),
            None => {
                log::debug!("divisor index {index} out of range, using 1");
                Divisor(1)
            }
        }
    }

    /// Discretize a combined control value in [0, 1].
    pub fn from_input(value: f64) -> Self {
        Self::from_index(discretize(value, DIVISORS.len()))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Divisor {
    fn default() -> Self {
        Divisor(1)
    }
}

/// Combine the Y knob with a raw CV sample (0–255, 128 = 0V).
///
/// The CV is scaled to roughly ±1 and added to the knob, then the sum is
/// clamped. A large CV saturates the result at either end.
pub fn divider_input(knob: f64, modulation_sample: u8) -> f64 {
    let cv = (f64::from(modulation_sample) - 128.0) / 128.0;
    let knob = if knob.is_nan() { 0.0 } else { knob };
    (knob + cv).clamp(0.0, 1.0)
}

/// Counts channel-1 triggers and reports when channel 2 should advance.
#[derive(Debug, Clone, Default)]
pub struct DividerCounter {
    divisor: Divisor,
    counter: u32,
}

impl DividerCounter {
    pub fn new(divisor: Divisor) -> Self {
        DividerCounter {
            divisor,
            counter: 0,
        }
    }

    /// Change the divisor. The running count is kept, so shrinking the
    /// divisor below the count advances on the next tick.
    pub fn set_divisor(&mut self, divisor: Divisor) {
        if divisor != self.divisor {
            log::debug!("divisor {} -> {}", self.divisor.get(), divisor.get());
            self.divisor = divisor;
        }
    }

    pub fn divisor(&self) -> Divisor {
        self.divisor
    }

    /// Register one channel-1 trigger. Returns true every Nth call.
    pub fn tick(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= u32::from(self.divisor.get()) {
            self.counter = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_every_nth_tick() {
        for d in DIVISORS {
            let mut counter = DividerCounter::new(Divisor(d));
            let fired: Vec<usize> = (1..=64).filter(|_| counter.tick()).collect();
            let expected: Vec<usize> = (1..=64).filter(|i| i % usize::from(d) == 0).collect();
            assert_eq!(fired, expected, "divisor {d}");
        }
    }

    #[test]
    fn divide_by_four_fires_on_fourth() {
        let mut counter = DividerCounter::new(Divisor::from_index(3));
        assert_eq!(counter.divisor().get(), 4);
        assert!(!counter.tick());
        assert!(!counter.tick());
        assert!(!counter.tick());
        assert!(counter.tick());
    }

    #[test]
    fn shrinking_divisor_fires_next_tick() {
        let mut counter = DividerCounter::new(Divisor(16));
        for _ in 0..5 {
            assert!(!counter.tick());
        }
        counter.set_divisor(Divisor(2));
        assert!(counter.tick());
        assert!(!counter.tick());
        assert!(counter.tick());
    }

    #[test]
    fn index_falls_back_to_one() {
        assert_eq!(Divisor::from_index(8).get(), 1);
        assert_eq!(Divisor::from_input(0.0).get(), 1);
        assert_eq!(Divisor::from_input(1.0).get(), 16);
    }

    #[test]
    fn cv_adds_to_knob_and_saturates() {
        assert_eq!(divider_input(0.25, 128), 0.25);
        assert_eq!(divider_input(0.25, 192), 0.75);
        assert_eq!(divider_input(0.5, 255), 1.0);
        assert_eq!(divider_input(0.5, 0), 0.0);
        assert_eq!(divider_input(2.0, 128), 1.0);
        assert_eq!(divider_input(f64::NAN, 128), 0.0);
    }
}
