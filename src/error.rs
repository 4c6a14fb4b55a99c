use thiserror::Error;

/// Errors raised while building a sequencer configuration.
///
/// Tick processing never fails; only configuration is validated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("clock trigger threshold high ({high}) must exceed low ({low})")]
    InvalidHysteresis { high: u8, low: u8 },

    #[error("clock idle band is inverted: low {low} > high {high}")]
    InvalidIdleBand { low: u8, high: u8 },

    #[error("tap tempo range invalid: min {min}s, max {max}s, initial {initial}s")]
    InvalidTapRange { min: f64, max: f64, initial: f64 },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_field() {
        let e = ConfigError::NonPositive {
            field: "pulse.decay",
            value: -1.0,
        };
        assert_eq!(e.to_string(), "pulse.decay must be positive, got -1");
    }

    #[test]
    fn json_errors_convert() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: ConfigError = err.into();
        assert!(matches!(e, ConfigError::Json(_)));
        assert!(e.to_string().starts_with("Config parse error"));
    }
}
