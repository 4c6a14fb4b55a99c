//! Sequencer — one control tick of the dual-channel Turing Machine.
//!
//! The host hands in a [`ControlInput`] snapshot together with the current
//! time and gets a [`ControlOutput`] back. Nothing here touches audio nodes
//! or UI widgets; the signal stage and LED renderer consume the output.
//!
//! Per tick:
//! 1. resolve length, divisor and scale from the controls
//! 2. run clock recovery, or tap tempo when no cable is present
//! 3. on a trigger, step channel 1, then channel 2 if the divider allows
//! 4. map the state onto the six LEDs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::clock::{ClockEvent, ClockRecovery, ClockState, SwitchPosition, TapTempo};
use crate::config::SequencerConfig;
use crate::display::{Display, LedFrame};
use crate::divider::{DividerCounter, Divisor, divider_input};
use crate::dsp::pulse::PulseGenerator;
use crate::error::ConfigError;
use crate::register::{SequenceLength, ShiftRegister};
use crate::scale::{Scale, quantize};

pub const CHANNELS: usize = 2;

// ── Snapshots ───────────────────────────────────────────────

/// Raw controls for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlInput {
    /// Pulse 1 input, 0–255 with 128 at rest.
    pub clock: u8,
    /// CV 1 input, 0–255 with 128 at 0V. Modulates the divider.
    pub modulation: u8,
    /// Knob X: sequence length.
    pub x: f64,
    /// Knob Y: channel-2 divider.
    pub y: f64,
    /// Main knob: lock/random/flip probability.
    pub main: f64,
    /// Three-way switch, 0 = up, 1 = middle, 2 = down (momentary).
    pub switch: u8,
}

impl Default for ControlInput {
    fn default() -> Self {
        ControlInput {
            clock: 128,
            modulation: 128,
            x: 1.0,
            y: 0.0,
            main: 1.0,
            switch: 1,
        }
    }
}

/// Everything the downstream layers need after one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlOutput {
    /// Pitch CVs, held between steps.
    pub cv: [f64; CHANNELS],
    /// Bipolar register bytes for the audio outputs, held between steps.
    pub modulation: [f64; CHANNELS],
    /// Pulse levels at the tick time.
    pub gates: [f64; CHANNELS],
    /// Trigger time of each pulse fired during this tick.
    pub pulse_triggers: [Option<f64>; CHANNELS],
    /// Channel-1 pitch as a monitor oscillator frequency.
    pub monitor_frequency: f64,
    pub leds: LedFrame,
    /// True if the sequencer stepped this tick.
    pub triggered: bool,
    pub channel2_advanced: bool,
    pub registers: [u16; CHANNELS],
    pub length: SequenceLength,
    pub divisor: Divisor,
    pub scale: Scale,
    pub clock_state: ClockState,
    /// Current tap-tempo period in seconds.
    pub tap_interval: f64,
}

// ── Sequencer ───────────────────────────────────────────────

/// Output values held per channel between steps.
#[derive(Debug, Clone, Copy, Default)]
struct ChannelOutput {
    cv: f64,
    modulation: f64,
}

pub struct Sequencer<R: Rng = StdRng> {
    config: SequencerConfig,
    rng: R,
    registers: [ShiftRegister; CHANNELS],
    outputs: [ChannelOutput; CHANNELS],
    pulses: [PulseGenerator; CHANNELS],
    clock: ClockRecovery,
    tap: TapTempo,
    divider: DividerCounter,
    display: Display,
    length: SequenceLength,
    scale: Scale,
    monitor_frequency: f64,
}

impl Sequencer<StdRng> {
    /// Build a sequencer with a seeded standard generator.
    pub fn with_seed(config: SequencerConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Sequencer<R> {
    /// Build a sequencer drawing all randomness from `rng`. Both registers
    /// are seeded from it.
    pub fn new(config: SequencerConfig, mut rng: R) -> Result<Self, ConfigError> {
        config.validate()?;

        let registers = [ShiftRegister::random(&mut rng), ShiftRegister::random(&mut rng)];
        log::info!(
            "sequencer created, registers {:#06x} / {:#06x}",
            registers[0].value(),
            registers[1].value()
        );

        Ok(Sequencer {
            clock: ClockRecovery::new(config.clock),
            tap: TapTempo::new(config.tap),
            pulses: [
                PulseGenerator::new(config.pulse),
                PulseGenerator::new(config.pulse),
            ],
            display: Display::new(config.length_display_window),
            divider: DividerCounter::default(),
            registers,
            outputs: [ChannelOutput::default(); CHANNELS],
            length: SequenceLength::default(),
            scale: Scale::default(),
            monitor_frequency: crate::scale::monitor_frequency(0.0),
            config,
            rng,
        })
    }

    /// Overwrite both registers, e.g. to replay a known loop.
    pub fn seed_registers(&mut self, channel1: u16, channel2: u16) {
        self.registers = [ShiftRegister::new(channel1), ShiftRegister::new(channel2)];
    }

    pub fn registers(&self) -> [u16; CHANNELS] {
        [self.registers[0].value(), self.registers[1].value()]
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Run one control tick at time `now` (seconds).
    pub fn update(&mut self, input: &ControlInput, now: f64) -> ControlOutput {
        let position = SwitchPosition::from_selector(input.switch);
        self.resolve_controls(input, position, now);

        let triggered = match self.clock.process(input.clock) {
            ClockEvent::Trigger => {
                self.tap.observe(position);
                true
            }
            ClockEvent::Idle => {
                self.tap.observe(position);
                false
            }
            ClockEvent::Unplugged => self.tap.process(position, now),
        };

        let mut pulse_triggers = [None; CHANNELS];
        let mut channel2_advanced = false;
        if triggered {
            let probability = sanitize_unit(input.main);
            log::trace!("trigger at {now:.4}s, probability {probability:.3}");

            self.step_channel(0, probability, now);
            pulse_triggers[0] = Some(now);

            if self.divider.tick() {
                self.step_channel(1, probability, now);
                pulse_triggers[1] = Some(now);
                channel2_advanced = true;
            }
        }

        ControlOutput {
            cv: [self.outputs[0].cv, self.outputs[1].cv],
            modulation: [self.outputs[0].modulation, self.outputs[1].modulation],
            gates: [self.pulses[0].level_at(now), self.pulses[1].level_at(now)],
            pulse_triggers,
            monitor_frequency: self.monitor_frequency,
            leds: self.leds(now),
            triggered,
            channel2_advanced,
            registers: self.registers(),
            length: self.length,
            divisor: self.divider.divisor(),
            scale: self.scale,
            clock_state: self.clock.state(),
            tap_interval: self.tap.interval(),
        }
    }

    /// Brightness values for the current state at `now`.
    pub fn leds(&self, now: f64) -> LedFrame {
        if self.display.showing_length(now) {
            LedFrame::length_pattern(self.length)
        } else {
            LedFrame::running(
                self.registers[0].low_byte(),
                self.registers[1].low_byte(),
                self.pulses[0].is_active(now),
                self.pulses[1].is_active(now),
            )
        }
    }

    fn resolve_controls(&mut self, input: &ControlInput, position: SwitchPosition, now: f64) {
        let length = SequenceLength::from_knob(input.x);
        if length != self.length {
            log::debug!("length {} -> {}", self.length.get(), length.get());
            self.length = length;
            self.display.length_changed(now);
        }

        let divisor = Divisor::from_input(divider_input(input.y, input.modulation));
        self.divider.set_divisor(divisor);

        let scale = self.config.switch_scales.select(position);
        if scale != self.scale {
            log::debug!("scale {} -> {}", self.scale.name(), scale.name());
            self.scale = scale;
        }
    }

    fn step_channel(&mut self, channel: usize, probability: f64, now: f64) {
        let register = &mut self.registers[channel];
        register.advance(self.length, probability, &mut self.rng);

        let q = quantize(register.low_byte(), self.scale);
        self.outputs[channel] = ChannelOutput {
            cv: q.cv,
            modulation: q.bipolar,
        };
        if channel == 0 {
            self.monitor_frequency = q.monitor_frequency();
        }
        self.pulses[channel].trigger(now);
    }
}

fn sanitize_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
