//! DSP — the audio-rate side of the card.
//!
//! The control tick in [`crate::sequencer`] only decides *what* the outputs
//! should be. Everything here turns those targets into per-sample signals:
//! gate pulses, smoothed CVs and the monitor oscillator.

pub mod oscillator;
pub mod pulse;
pub mod ramp;
pub mod signal;
