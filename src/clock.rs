//! Clock recovery — external clock edge detection with a tap-tempo fallback.
//!
//! The pulse input arrives as a byte (0–255) representing a biased bipolar
//! signal, with 128 at rest. Samples inside the idle band mean nothing is
//! patched; anything outside it means a cable is present and the signal is
//! run through a two-threshold comparator. With no cable the switch's
//! momentary position acts as a tap-tempo button.

use serde::{Deserialize, Serialize};

// ── Clock Recovery ──────────────────────────────────────────

/// Comparator state of the external clock input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockState {
    #[default]
    Unplugged,
    Low,
    High,
}

/// Thresholds for cable detection and the hysteresis comparator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClockThresholds {
    /// Samples below this are treated as a patched cable.
    pub idle_low: u8,
    /// Samples above this are treated as a patched cable.
    pub idle_high: u8,
    /// A high clock falling below this re-arms the comparator.
    pub trigger_low: u8,
    /// A rising sample above this fires a trigger.
    pub trigger_high: u8,
}

impl Default for ClockThresholds {
    fn default() -> Self {
        ClockThresholds {
            idle_low: 115,
            idle_high: 140,
            trigger_low: 180,
            trigger_high: 220,
        }
    }
}

impl ClockThresholds {
    /// True when the sample lies outside the no-connection band.
    pub fn is_cable_present(&self, sample: u8) -> bool {
        sample > self.idle_high || sample < self.idle_low
    }
}

/// Result of feeding one sample to [`ClockRecovery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// No cable: the caller should fall back to tap tempo.
    Unplugged,
    /// Cable present, no rising edge this tick.
    Idle,
    /// Cable present and a rising edge crossed the high threshold.
    Trigger,
}

#[derive(Debug, Clone)]
pub struct ClockRecovery {
    thresholds: ClockThresholds,
    state: ClockState,
    last_sample: u8,
}

impl ClockRecovery {
    pub fn new(thresholds: ClockThresholds) -> Self {
        ClockRecovery {
            thresholds,
            state: ClockState::Unplugged,
            last_sample: 128,
        }
    }

    /// Classify one raw sample and update the comparator.
    pub fn process(&mut self, sample: u8) -> ClockEvent {
        self.last_sample = sample;

        if !self.thresholds.is_cable_present(sample) {
            if self.state != ClockState::Unplugged {
                log::debug!("clock cable removed (sample {sample})");
                self.state = ClockState::Unplugged;
            }
            return ClockEvent::Unplugged;
        }

        if self.state == ClockState::Unplugged {
            log::debug!("clock cable detected (sample {sample})");
            self.state = ClockState::Low;
        }

        match self.state {
            ClockState::High if sample < self.thresholds.trigger_low => {
                self.state = ClockState::Low;
                ClockEvent::Idle
            }
            ClockState::High => ClockEvent::Idle,
            _ if sample > self.thresholds.trigger_high => {
                self.state = ClockState::High;
                ClockEvent::Trigger
            }
            _ => ClockEvent::Idle,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn last_sample(&self) -> u8 {
        self.last_sample
    }
}

// ── Switch ──────────────────────────────────────────────────

/// Physical position of the three-way switch.
///
/// The host reports the switch as 0, 1 or 2 with 0 at the top; the bottom
/// position is momentary and doubles as the tap button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchPosition {
    Down,
    Middle,
    Up,
}

impl SwitchPosition {
    /// Map a raw selector value. Anything past 2 is clamped to the bottom.
    pub fn from_selector(raw: u8) -> Self {
        match raw {
            0 => SwitchPosition::Up,
            1 => SwitchPosition::Middle,
            _ => SwitchPosition::Down,
        }
    }
}

// ── Tap Tempo ───────────────────────────────────────────────

/// Tap tempo limits, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TapConfig {
    pub min_interval: f64,
    pub max_interval: f64,
    /// Free-running period before any tap has been accepted.
    pub initial_interval: f64,
}

impl Default for TapConfig {
    fn default() -> Self {
        TapConfig {
            min_interval: 0.1,
            max_interval: 2.0,
            initial_interval: 0.5,
        }
    }
}

/// Free-running internal clock, retuned by taps on the switch.
#[derive(Debug, Clone)]
pub struct TapTempo {
    config: TapConfig,
    last_tap: f64,
    last_trigger: f64,
    interval: f64,
    previous_position: Option<SwitchPosition>,
}

impl TapTempo {
    pub fn new(config: TapConfig) -> Self {
        TapTempo {
            config,
            last_tap: 0.0,
            last_trigger: 0.0,
            interval: config
                .initial_interval
                .max(config.min_interval)
                .min(config.max_interval),
            previous_position: None,
        }
    }

    /// Run one tick. Returns true if the internal clock fires.
    pub fn process(&mut self, position: SwitchPosition, now: f64) -> bool {
        let mut triggered = false;

        if self.is_tap_edge(position) {
            let diff = now - self.last_tap;
            if diff >= self.config.min_interval && diff <= self.config.max_interval {
                self.interval = diff;
                self.last_trigger = now;
                triggered = true;
                log::info!("tap tempo interval {:.3}s ({:.1} bpm)", diff, 60.0 / diff);
            }
            self.last_tap = now;
        }

        if now - self.last_trigger > self.interval {
            self.last_trigger = now;
            triggered = true;
        }

        self.previous_position = Some(position);
        triggered
    }

    /// Track the switch without running the clock, so an edge is not
    /// invented when control passes back from an external clock.
    pub fn observe(&mut self, position: SwitchPosition) {
        self.previous_position = Some(position);
    }

    /// Current free-running period in seconds.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    fn is_tap_edge(&self, position: SwitchPosition) -> bool {
        position == SwitchPosition::Down && self.previous_position != Some(SwitchPosition::Down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recovery() -> ClockRecovery {
        ClockRecovery::new(ClockThresholds::default())
    }

    #[test]
    fn idle_band_is_unplugged() {
        let mut clock = recovery();
        for sample in 115..=140 {
            assert_eq!(clock.process(sample), ClockEvent::Unplugged);
        }
        assert_eq!(clock.state(), ClockState::Unplugged);
    }

    #[test]
    fn rising_edge_fires_once() {
        let mut clock = recovery();
        assert_eq!(clock.process(0), ClockEvent::Idle);
        assert_eq!(clock.state(), ClockState::Low);
        assert_eq!(clock.process(255), ClockEvent::Trigger);
        assert_eq!(clock.state(), ClockState::High);
        // Holding high does not retrigger
        for _ in 0..10 {
            assert_eq!(clock.process(250), ClockEvent::Idle);
        }
        assert_eq!(clock.process(0), ClockEvent::Idle);
        assert_eq!(clock.state(), ClockState::Low);
        assert_eq!(clock.process(255), ClockEvent::Trigger);
    }

    #[test]
    fn hysteresis_band_never_triggers() {
        let mut clock = recovery();
        // Arm high first, then chatter between the thresholds.
        assert_eq!(clock.process(230), ClockEvent::Trigger);
        let mut triggers = 0;
        for i in 0..1000 {
            let sample = if i % 2 == 0 { 181 } else { 219 };
            if clock.process(sample) == ClockEvent::Trigger {
                triggers += 1;
            }
        }
        assert_eq!(triggers, 0, "chatter inside the hysteresis band must not trigger");
        assert_eq!(clock.state(), ClockState::High);
    }

    #[test]
    fn hysteresis_band_from_low_never_triggers() {
        let mut clock = recovery();
        let mut triggers = 0;
        for i in 0..1000 {
            let sample = if i % 3 == 0 { 180 } else { 220 };
            if clock.process(sample) == ClockEvent::Trigger {
                triggers += 1;
            }
        }
        assert_eq!(triggers, 0);
        assert_eq!(clock.state(), ClockState::Low);
    }

    #[test]
    fn replugging_high_triggers() {
        let mut clock = recovery();
        assert_eq!(clock.process(255), ClockEvent::Trigger);
        assert_eq!(clock.process(128), ClockEvent::Unplugged);
        assert_eq!(clock.process(255), ClockEvent::Trigger);
        assert_eq!(clock.last_sample(), 255);
    }

    #[test]
    fn switch_mapping() {
        assert_eq!(SwitchPosition::from_selector(0), SwitchPosition::Up);
        assert_eq!(SwitchPosition::from_selector(1), SwitchPosition::Middle);
        assert_eq!(SwitchPosition::from_selector(2), SwitchPosition::Down);
        assert_eq!(SwitchPosition::from_selector(9), SwitchPosition::Down);
    }

    /// Run the tap clock at a fixed tick rate, pressing the switch at the
    /// given times (held for one tick). Returns trigger times.
    fn run_taps(tap: &mut TapTempo, taps: &[f64], until: f64, dt: f64) -> Vec<f64> {
        let mut fired = Vec::new();
        let mut t = 0.0;
        let mut k = 0usize;
        while t <= until {
            let pressed = taps.iter().any(|&tt| (t - tt).abs() < dt / 2.0);
            let pos = if pressed { SwitchPosition::Down } else { SwitchPosition::Up };
            if tap.process(pos, t) {
                fired.push(t);
            }
            k += 1;
            t = k as f64 * dt;
        }
        fired
    }

    #[test]
    fn two_taps_set_interval() {
        let mut tap = TapTempo::new(TapConfig::default());
        let dt = 0.01;
        let fired = run_taps(&mut tap, &[3.0, 3.5], 6.0, dt);
        assert!((tap.interval() - 0.5).abs() < 1e-9, "interval {}", tap.interval());

        // Second tap fires immediately
        assert!(fired.iter().any(|&t| (t - 3.5).abs() < dt / 2.0));

        // After the tap the clock runs at ~0.5s (first tick past the interval)
        let after: Vec<f64> = fired.into_iter().filter(|&t| t >= 3.5 - 1e-9).collect();
        assert!(after.len() >= 4);
        for pair in after.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(
                gap > 0.5 - 1e-9 && gap <= 0.5 + dt + 1e-9,
                "gap should be one interval, got {gap}"
            );
        }
    }

    #[test]
    fn out_of_range_gap_is_ignored_but_resets_last_tap() {
        let mut tap = TapTempo::new(TapConfig::default());
        // First tap at 5.0: gap from 0.0 is too long
        tap.process(SwitchPosition::Up, 4.99);
        tap.process(SwitchPosition::Down, 5.0);
        assert!((tap.interval() - 0.5).abs() < 1e-9);
        tap.process(SwitchPosition::Up, 5.01);
        // 0.05s later: too short, ignored
        tap.process(SwitchPosition::Down, 5.05);
        assert!((tap.interval() - 0.5).abs() < 1e-9);
        tap.process(SwitchPosition::Up, 5.06);
        // Measured from the ignored tap, not the first one
        tap.process(SwitchPosition::Down, 5.35);
        assert!((tap.interval() - 0.3).abs() < 1e-9, "interval {}", tap.interval());
    }

    #[test]
    fn gap_at_max_interval_is_accepted() {
        let mut tap = TapTempo::new(TapConfig::default());
        tap.process(SwitchPosition::Up, 0.5);
        tap.process(SwitchPosition::Down, 1.0);
        tap.process(SwitchPosition::Up, 1.5);
        assert!(tap.process(SwitchPosition::Down, 3.0));
        assert_eq!(tap.interval(), 2.0);
    }

    #[test]
    fn gap_past_max_interval_is_rejected() {
        let mut tap = TapTempo::new(TapConfig::default());
        tap.process(SwitchPosition::Up, 0.5);
        tap.process(SwitchPosition::Down, 1.0);
        assert_eq!(tap.interval(), 1.0);
        tap.process(SwitchPosition::Up, 1.5);
        tap.process(SwitchPosition::Down, 3.01);
        assert_eq!(tap.interval(), 1.0);
    }

    #[test]
    fn holding_tap_is_a_single_edge() {
        let mut tap = TapTempo::new(TapConfig::default());
        tap.process(SwitchPosition::Up, 1.0);
        tap.process(SwitchPosition::Down, 1.2);
        tap.process(SwitchPosition::Down, 1.4);
        tap.process(SwitchPosition::Down, 1.6);
        // Only the edge at 1.2 counted; its gap of 1.2s from start was accepted
        assert!((tap.interval() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn free_runs_without_taps() {
        let mut tap = TapTempo::new(TapConfig::default());
        // Binary-exact tick so the strict comparison is unambiguous
        let fired = run_taps(&mut tap, &[], 2.05, 0.125);
        assert_eq!(fired, vec![0.625, 1.25, 1.875]);
    }

    #[test]
    fn observe_tracks_position() {
        let mut tap = TapTempo::new(TapConfig::default());
        tap.observe(SwitchPosition::Down);
        tap.process(SwitchPosition::Down, 1.0);
        // No edge: still held from observation
        assert!((tap.interval() - 0.5).abs() < 1e-9);
    }
}
