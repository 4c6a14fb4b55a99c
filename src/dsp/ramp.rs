//! Parameter ramp — smooths stepped control targets at audio rate.
//!
//! The control tick writes a new target whenever the sequencer steps; the
//! signal stage reads the latest target every sample and approaches it with
//! a one-pole exponential curve, so a jump in pitch or modulation never
//! reaches the output as a hard discontinuity.

/// One-pole exponential smoother with a time constant in seconds.
///
/// `y[n] = y[n-1] + a * (target - y[n-1])`, `a = 1 - e^(-1 / (tau * sr))`.
#[derive(Debug, Clone)]
pub struct ParamRamp {
    current: f64,
    target: f64,
    coefficient: f64,
}

impl ParamRamp {
    pub fn new(initial: f64, time_constant: f64, sample_rate: f64) -> Self {
        ParamRamp {
            current: initial,
            target: initial,
            coefficient: coefficient(time_constant, sample_rate),
        }
    }

    /// Publish a new target. The last write wins.
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Advance one sample and return the smoothed value.
    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        self.current += self.coefficient * (self.target - self.current);
        // Flush denormals once settled
        if (self.target - self.current).abs() < 1e-15 {
            self.current = self.target;
        }
        self.current
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Jump straight to a value without smoothing.
    pub fn reset(&mut self, value: f64) {
        self.current = value;
        self.target = value;
    }
}

fn coefficient(time_constant: f64, sample_rate: f64) -> f64 {
    let samples = time_constant * sample_rate;
    if samples <= 0.0 || !samples.is_finite() {
        1.0
    } else {
        1.0 - (-1.0 / samples).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_to_target() {
        let mut ramp = ParamRamp::new(0.0, 0.01, 44100.0);
        ramp.set_target(1.0);
        let mut value = 0.0;
        for _ in 0..4410 {
            value = ramp.next_sample();
        }
        assert!((value - 1.0).abs() < 1e-3, "got {value}");
    }

    #[test]
    fn one_time_constant_reaches_63_percent() {
        let sr = 48000.0;
        let mut ramp = ParamRamp::new(0.0, 0.01, sr);
        ramp.set_target(1.0);
        let mut value = 0.0;
        for _ in 0..480 {
            value = ramp.next_sample();
        }
        assert!((value - (1.0 - (-1.0_f64).exp())).abs() < 1e-3, "got {value}");
    }

    #[test]
    fn never_overshoots() {
        let mut ramp = ParamRamp::new(1.0, 0.005, 44100.0);
        ramp.set_target(-0.5);
        for _ in 0..2000 {
            let v = ramp.next_sample();
            assert!(v >= -0.5 && v <= 1.0, "overshoot {v}");
        }
    }

    #[test]
    fn last_write_wins() {
        let mut ramp = ParamRamp::new(0.0, 0.01, 44100.0);
        ramp.set_target(1.0);
        ramp.set_target(-1.0);
        assert_eq!(ramp.target(), -1.0);
        assert!(ramp.next_sample() < 0.0);
    }

    #[test]
    fn zero_time_constant_jumps() {
        let mut ramp = ParamRamp::new(0.0, 0.0, 44100.0);
        ramp.set_target(0.7);
        assert_eq!(ramp.next_sample(), 0.7);
        ramp.reset(0.2);
        assert_eq!(ramp.current(), 0.2);
    }
}
