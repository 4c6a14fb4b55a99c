//! LED feedback — a pure mapping from sequencer state to six brightness
//! values. The host renders them however it likes.

use serde::Serialize;

use crate::register::SequenceLength;

pub const LED_COUNT: usize = 6;

/// Brightness below this is drawn as an unlit LED.
pub const LIT_THRESHOLD: f64 = 0.1;

/// Six LED brightness values in [0, 1], left column top to bottom then
/// right column.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct LedFrame(pub [f64; LED_COUNT]);

impl LedFrame {
    /// Show a length's 6-bit pattern, bit 5 on LED 0.
    pub fn length_pattern(length: SequenceLength) -> Self {
        let pattern = length.display_pattern();
        let mut leds = [0.0; LED_COUNT];
        for (i, led) in leds.iter_mut().enumerate() {
            if (pattern >> (LED_COUNT - 1 - i)) & 1 == 1 {
                *led = 1.0;
            }
        }
        LedFrame(leds)
    }

    /// Steady-state view: register bytes on LEDs 0–3, pulse activity on 4–5.
    pub fn running(reg1_byte: u8, reg2_byte: u8, pulse1_active: bool, pulse2_active: bool) -> Self {
        let r1 = f64::from(reg1_byte) / 255.0;
        let r2 = f64::from(reg2_byte) / 255.0;
        let on = |active: bool| if active { 1.0 } else { 0.0 };
        LedFrame([r1, r2, r1, r2, on(pulse1_active), on(pulse2_active)])
    }

    pub fn brightness(&self, index: usize) -> f64 {
        self.0.get(index).copied().unwrap_or(0.0)
    }

    pub fn is_lit(&self, index: usize) -> bool {
        self.brightness(index) > LIT_THRESHOLD
    }
}

/// Chooses between the length pattern and the running view.
#[derive(Debug, Clone)]
pub struct Display {
    window: f64,
    length_changed_at: Option<f64>,
}

impl Display {
    pub fn new(window: f64) -> Self {
        Display {
            window,
            length_changed_at: None,
        }
    }

    pub fn length_changed(&mut self, now: f64) {
        self.length_changed_at = Some(now);
    }

    /// True while the length pattern should be shown.
    pub fn showing_length(&self, now: f64) -> bool {
        self.length_changed_at
            .is_some_and(|changed| now - changed < self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_sixteen_pattern() {
        let frame = LedFrame::length_pattern(SequenceLength::default());
        assert_eq!(frame.0, [1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn length_eight_pattern() {
        let frame = LedFrame::length_pattern(SequenceLength::try_from(8).unwrap());
        assert_eq!(frame.0, [0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn running_view() {
        let frame = LedFrame::running(255, 0, true, false);
        assert_eq!(frame.0, [1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        assert!(frame.is_lit(0));
        assert!(!frame.is_lit(1));
        assert!(!frame.is_lit(99));
    }

    #[test]
    fn length_window_expires() {
        let mut display = Display::new(1.5);
        assert!(!display.showing_length(0.0));
        display.length_changed(10.0);
        assert!(display.showing_length(10.0));
        assert!(display.showing_length(11.49));
        assert!(!display.showing_length(11.5));
    }
}
