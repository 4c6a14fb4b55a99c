//! Signal stage — renders the sequencer's control targets at audio rate.
//!
//! The control tick publishes scalar targets (pitch CV, modulation, monitor
//! frequency, pulse trigger times). This stage reads the latest ones and
//! produces smooth per-sample outputs: ramped CVs and modulation, decaying
//! gate pulses, and an optional monitor tone. The producer and consumer only
//! share values by copy, so there is nothing to lock.

use crate::sequencer::{CHANNELS, ControlOutput};

use super::oscillator::MonitorOscillator;
use super::pulse::{PulseConfig, PulseGenerator};
use super::ramp::ParamRamp;

/// Interleaved channel order of [`SignalStage::render_block`]:
/// cv1, cv2, pulse1, pulse2, mod1, mod2, monitor.
pub const SIGNAL_CHANNELS: usize = 7;

/// One sample of every output.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalFrame {
    pub cv: [f64; CHANNELS],
    pub pulse: [f64; CHANNELS],
    pub modulation: [f64; CHANNELS],
    pub monitor: f64,
}

impl SignalFrame {
    fn channels(&self) -> [f64; SIGNAL_CHANNELS] {
        [
            self.cv[0],
            self.cv[1],
            self.pulse[0],
            self.pulse[1],
            self.modulation[0],
            self.modulation[1],
            self.monitor,
        ]
    }
}

pub struct SignalStage {
    sample_rate: f64,
    /// Stage time in seconds, on the same clock as the control ticks.
    time: f64,
    cv: [ParamRamp; CHANNELS],
    modulation: [ParamRamp; CHANNELS],
    monitor_frequency: ParamRamp,
    pulses: [PulseGenerator; CHANNELS],
    monitor: MonitorOscillator,
    monitor_gain: f64,
}

impl SignalStage {
    pub fn new(
        sample_rate: f64,
        ramp_time_constant: f64,
        pulse: PulseConfig,
        monitor_gain: f64,
    ) -> Self {
        let ramp = |initial| ParamRamp::new(initial, ramp_time_constant, sample_rate);
        let monitor = MonitorOscillator::new(sample_rate);
        SignalStage {
            sample_rate,
            time: 0.0,
            cv: [ramp(0.0), ramp(0.0)],
            modulation: [ramp(0.0), ramp(0.0)],
            monitor_frequency: ramp(monitor.frequency),
            pulses: [PulseGenerator::new(pulse), PulseGenerator::new(pulse)],
            monitor,
            monitor_gain,
        }
    }

    /// Take the newest targets from a control tick.
    pub fn publish(&mut self, output: &ControlOutput) {
        for ch in 0..CHANNELS {
            self.cv[ch].set_target(output.cv[ch]);
            self.modulation[ch].set_target(output.modulation[ch]);
            if let Some(at) = output.pulse_triggers[ch] {
                self.pulses[ch].trigger(at);
            }
        }
        self.monitor_frequency.set_target(output.monitor_frequency);
    }

    /// Move the stage clock, e.g. to realign with the host's audio time.
    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Render one sample.
    pub fn next_frame(&mut self) -> SignalFrame {
        let t = self.time;
        let frame = SignalFrame {
            cv: [self.cv[0].next_sample(), self.cv[1].next_sample()],
            pulse: [self.pulses[0].level_at(t), self.pulses[1].level_at(t)],
            modulation: [
                self.modulation[0].next_sample(),
                self.modulation[1].next_sample(),
            ],
            monitor: {
                self.monitor.frequency = self.monitor_frequency.next_sample();
                let tone = self.monitor.next_sample();
                if self.monitor_gain > 0.0 { tone * self.monitor_gain } else { 0.0 }
            },
        };
        self.time += 1.0 / self.sample_rate;
        frame
    }

    /// Render `frames` samples, interleaved as [`SIGNAL_CHANNELS`] f32s.
    pub fn render_block(&mut self, frames: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(frames * SIGNAL_CHANNELS);
        for _ in 0..frames {
            let frame = self.next_frame();
            out.extend(frame.channels().iter().map(|&s| s as f32));
        }
        out
    }
}
