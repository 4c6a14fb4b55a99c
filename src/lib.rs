pub mod clock;
pub mod config;
pub mod display;
pub mod divider;
pub mod dsp;
pub mod error;
pub mod register;
pub mod scale;
pub mod sequencer;

use crate::config::SequencerConfig;
use crate::dsp::signal::SignalStage;
use crate::sequencer::{ControlInput, ControlOutput, Sequencer};
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the turing-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: the sequencer plus its signal stage, owned by the host
/// for as long as the card is mounted.
#[wasm_bindgen]
pub struct TuringMachine {
    sequencer: Sequencer,
    signal: SignalStage,
    sample_rate: f64,
    /// Whether the signal stage clock follows the host's time yet.
    aligned: bool,
}

#[wasm_bindgen]
impl TuringMachine {
    /// Create a machine. `config` may be `undefined`/`null` for defaults;
    /// `seed` seeds the registers and the mutation draws.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, seed: f64, sample_rate: f64) -> Result<TuringMachine, JsValue> {
        let config: SequencerConfig = if config.is_undefined() || config.is_null() {
            SequencerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&format!("{e}")))?
        };
        Self::build(config, seed, sample_rate).map_err(|e| JsValue::from_str(&e))
    }

    /// Run one control tick and return the output snapshot as a JS object.
    pub fn update(&mut self, input: JsValue, time: f64) -> Result<JsValue, JsValue> {
        let input: ControlInput =
            serde_wasm_bindgen::from_value(input).map_err(|e| JsValue::from_str(&format!("{e}")))?;
        let output = self.tick(&input, time);
        serde_wasm_bindgen::to_value(&output).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    /// Render interleaved audio-rate outputs for an AudioWorklet block.
    pub fn render_block(&mut self, frames: usize) -> Vec<f32> {
        self.signal.render_block(frames)
    }

    /// Align the signal stage with the host's audio clock.
    pub fn set_time(&mut self, time: f64) {
        self.signal.set_time(time);
        self.aligned = true;
    }

    /// Rebuild with the same config and a new seed. The signal stage keeps
    /// its place on the host clock.
    pub fn reset(&mut self, seed: f64) -> Result<(), JsValue> {
        let config = self.sequencer.config().clone();
        let mut machine =
            Self::build(config, seed, self.sample_rate).map_err(|e| JsValue::from_str(&e))?;
        machine.signal.set_time(self.signal.time());
        machine.aligned = self.aligned;
        *self = machine;
        Ok(())
    }

    /// Current register values.
    pub fn registers(&self) -> Vec<u16> {
        self.sequencer.registers().to_vec()
    }
}

impl TuringMachine {
    fn build(config: SequencerConfig, seed: f64, sample_rate: f64) -> Result<TuringMachine, String> {
        if !(sample_rate > 0.0) {
            return Err(format!("sample rate must be positive, got {sample_rate}"));
        }
        let signal = SignalStage::new(
            sample_rate,
            config.ramp_time_constant,
            config.pulse,
            config.monitor_gain,
        );
        let sequencer = Sequencer::with_seed(config, seed_bits(seed)).map_err(|e| e.to_string())?;
        Ok(TuringMachine {
            sequencer,
            signal,
            sample_rate,
            aligned: false,
        })
    }

    /// Run one control tick and hand the targets to the signal stage.
    /// Until the host calls `set_time`, the stage clock starts at the
    /// first tick's time so pulses land in the next rendered block.
    fn tick(&mut self, input: &ControlInput, time: f64) -> ControlOutput {
        if !self.aligned {
            self.signal.set_time(time);
            self.aligned = true;
        }
        let output = self.sequencer.update(input, time);
        self.signal.publish(&output);
        output
    }
}

/// JS numbers are f64; use their bits so fractional seeds from
/// `Math.random()` stay distinct.
fn seed_bits(seed: f64) -> u64 {
    seed.to_bits()
}

/// Parse a JSON config and report whether it is valid. Returns the
/// normalised config (with defaults filled in) as JSON.
#[wasm_bindgen]
pub fn validate_config(source: &str) -> Result<String, JsValue> {
    let config = SequencerConfig::from_json(source).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&config).map_err(|e| JsValue::from_str(&format!("{e}")))
}
