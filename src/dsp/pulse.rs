//! Gate pulse generator — instant rise, short hold, exponential decay.

use serde::{Deserialize, Serialize};

/// Pulse timing in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PulseConfig {
    /// Time held at full level before the decay starts.
    pub hold: f64,
    /// Exponential decay time constant.
    pub decay: f64,
    /// How long after a trigger the pulse counts as active for the LEDs.
    pub display_window: f64,
}

impl Default for PulseConfig {
    fn default() -> Self {
        PulseConfig {
            hold: 0.01,
            decay: 0.01,
            display_window: 0.1,
        }
    }
}

/// A pulse shaped like an analog gate: full level at the trigger instant,
/// then `exp(-(t - t0 - hold) / decay)` after the hold.
///
/// No off event is scheduled. The level only approaches zero, and the next
/// trigger restarts it from full.
#[derive(Debug, Clone)]
pub struct PulseGenerator {
    config: PulseConfig,
    last_trigger: Option<f64>,
}

impl PulseGenerator {
    pub fn new(config: PulseConfig) -> Self {
        PulseGenerator {
            config,
            last_trigger: None,
        }
    }

    /// Fire the pulse at `now`.
    pub fn trigger(&mut self, now: f64) {
        self.last_trigger = Some(now);
    }

    pub fn last_trigger(&self) -> Option<f64> {
        self.last_trigger
    }

    /// Output level at time `t`, in [0, 1].
    pub fn level_at(&self, t: f64) -> f64 {
        let Some(start) = self.last_trigger else {
            return 0.0;
        };
        let elapsed = t - start;
        if elapsed < 0.0 {
            0.0
        } else if elapsed < self.config.hold {
            1.0
        } else {
            (-(elapsed - self.config.hold) / self.config.decay).exp()
        }
    }

    /// True within the display window after the last trigger.
    pub fn is_active(&self, now: f64) -> bool {
        self.last_trigger
            .is_some_and(|start| now - start < self.config.display_window)
    }

    pub fn reset(&mut self) {
        self.last_trigger = None;
    }
}
