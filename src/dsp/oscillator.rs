//! Monitor oscillator — a band-limited square wave that follows channel 1.

/// PolyBLEP square oscillator used to audition the channel-1 pitch.
#[derive(Debug, Clone)]
pub struct MonitorOscillator {
    pub frequency: f64,
    phase: f64,
    sample_rate: f64,
}

impl MonitorOscillator {
    pub fn new(sample_rate: f64) -> Self {
        MonitorOscillator {
            frequency: 261.63,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Generate the next sample in [-1, 1] (plus PolyBLEP ripple).
    pub fn next_sample(&mut self) -> f64 {
        let inc = self.frequency / self.sample_rate;

        let mut value = if self.phase < 0.5 { 1.0 } else { -1.0 };
        value += poly_blep(self.phase, inc);
        value -= poly_blep((self.phase + 0.5) % 1.0, inc);

        self.phase += inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        value
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// PolyBLEP (Polynomial Band-Limited Step) correction around a
/// discontinuity at phase 0. `t` is the phase [0, 1), `dt` the increment.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}
