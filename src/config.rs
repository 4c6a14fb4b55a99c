//! Sequencer configuration.
//!
//! Every field has a default matching the card's built-in behaviour, so an
//! empty JSON object (or `SequencerConfig::default()`) is a valid config.

use serde::{Deserialize, Serialize};

use crate::clock::{ClockThresholds, TapConfig};
use crate::dsp::pulse::PulseConfig;
use crate::error::ConfigError;
use crate::scale::SwitchScales;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SequencerConfig {
    pub clock: ClockThresholds,
    pub tap: TapConfig,
    pub pulse: PulseConfig,
    /// Seconds the length pattern stays on the LEDs after a change.
    pub length_display_window: f64,
    /// Time constant (seconds) of the signal stage's parameter ramps.
    pub ramp_time_constant: f64,
    /// Level of the internal monitor oscillator, 0 = muted.
    pub monitor_gain: f64,
    pub switch_scales: SwitchScales,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        SequencerConfig {
            clock: ClockThresholds::default(),
            tap: TapConfig::default(),
            pulse: PulseConfig::default(),
            length_display_window: 1.5,
            ramp_time_constant: 0.01,
            monitor_gain: 0.0,
            switch_scales: SwitchScales::default(),
        }
    }
}

impl SequencerConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let config: SequencerConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let clock = &self.clock;
        if clock.trigger_high <= clock.trigger_low {
            return Err(ConfigError::InvalidHysteresis {
                high: clock.trigger_high,
                low: clock.trigger_low,
            });
        }
        if clock.idle_low > clock.idle_high {
            return Err(ConfigError::InvalidIdleBand {
                low: clock.idle_low,
                high: clock.idle_high,
            });
        }

        let tap = &self.tap;
        let tap_ok = tap.min_interval > 0.0
            && tap.min_interval < tap.max_interval
            && (tap.min_interval..=tap.max_interval).contains(&tap.initial_interval);
        if !tap_ok {
            return Err(ConfigError::InvalidTapRange {
                min: tap.min_interval,
                max: tap.max_interval,
                initial: tap.initial_interval,
            });
        }

        positive("pulse.hold", self.pulse.hold)?;
        positive("pulse.decay", self.pulse.decay)?;
        positive("pulse.displayWindow", self.pulse.display_window)?;
        positive("lengthDisplayWindow", self.length_display_window)?;
        positive("rampTimeConstant", self.ramp_time_constant)?;

        if !(0.0..=1.0).contains(&self.monitor_gain) {
            return Err(ConfigError::OutOfRange {
                field: "monitorGain",
                value: self.monitor_gain,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    // `!(x > 0)` also rejects NaN
    if !(value > 0.0) {
        return Err(ConfigError::NonPositive { field, value });
    }
    Ok(())
}
