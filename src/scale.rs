//! Scale quantizer — maps a register byte onto a pitch within a scale.
//!
//! The byte is spread over a 60-step note index range, folded into octaves
//! of the scale's length, and rebuilt as an absolute MIDI note. Pitch CV is
//! expressed at 0.1 units per octave (a 10-octave span maps to 1.0).

use serde::{Deserialize, Serialize};

use crate::clock::SwitchPosition;

/// Number of scale steps the full byte range is spread across.
pub const NOTE_SPAN: u32 = 60;
/// MIDI note of note index 0.
pub const BASE_NOTE: i32 = 36;
/// MIDI note that maps to 0 CV.
pub const REFERENCE_NOTE: i32 = 60;
/// Semitones covered by a CV swing of 1.0.
pub const CV_SPAN_SEMITONES: f64 = 120.0;

/// Frequency of the reference note, used for the monitor oscillator.
pub const MONITOR_REFERENCE_HZ: f64 = 261.63;
pub const MONITOR_MIN_HZ: f64 = 20.0;
pub const MONITOR_MAX_HZ: f64 = 20_000.0;

// ── Scales ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scale {
    #[default]
    Chromatic,
    Major,
    Minor,
    MinorPentatonic,
    Dorian,
    Pelog,
    WholeTone,
}

impl Scale {
    /// All scales in table order.
    pub const ALL: [Scale; 7] = [
        Scale::Chromatic,
        Scale::Major,
        Scale::Minor,
        Scale::MinorPentatonic,
        Scale::Dorian,
        Scale::Pelog,
        Scale::WholeTone,
    ];

    /// Look up a scale by table index, falling back to chromatic.
    pub fn from_index(index: usize) -> Self {
        match Self::ALL.get(index) {
            Some(&scale) => scale,
            None => {
                log::debug!("scale index {index} out of range, using chromatic");
                Scale::Chromatic
            }
        }
    }

    /// Pitch classes (semitones above the root), ascending.
    pub fn pitch_classes(self) -> &'static [u8] {
        match self {
            Scale::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::MinorPentatonic => &[0, 3, 5, 7, 10],
            Scale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Scale::Pelog => &[0, 1, 3, 7, 10],
            Scale::WholeTone => &[0, 2, 4, 6, 8, 10],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Scale::Chromatic => "chromatic",
            Scale::Major => "major",
            Scale::Minor => "minor",
            Scale::MinorPentatonic => "minor pentatonic",
            Scale::Dorian => "dorian",
            Scale::Pelog => "pelog",
            Scale::WholeTone => "wholetone",
        }
    }
}

/// Which scale each switch position selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchScales {
    pub up: Scale,
    pub middle: Scale,
    pub down: Scale,
}

impl Default for SwitchScales {
    fn default() -> Self {
        SwitchScales {
            up: Scale::Major,
            middle: Scale::Minor,
            down: Scale::WholeTone,
        }
    }
}

impl SwitchScales {
    pub fn select(&self, position: SwitchPosition) -> Scale {
        match position {
            SwitchPosition::Up => self.up,
            SwitchPosition::Middle => self.middle,
            SwitchPosition::Down => self.down,
        }
    }
}

// ── Quantization ────────────────────────────────────────────

/// A quantized register byte.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quantized {
    /// Semitone offset within the octave, always a member of the scale.
    pub pitch_class: u8,
    pub octave: u32,
    /// Absolute MIDI note.
    pub note: i32,
    /// Pitch CV, 0.1 per octave, 0 at middle C.
    pub cv: f64,
    /// Unquantized byte as a bipolar value in [-0.5, 0.5].
    pub bipolar: f64,
}

impl Quantized {
    /// Frequency of the internal monitor oscillator for this pitch.
    pub fn monitor_frequency(&self) -> f64 {
        monitor_frequency(self.cv)
    }
}

/// Quantize a register byte into `scale`.
pub fn quantize(byte: u8, scale: Scale) -> Quantized {
    let classes = scale.pitch_classes();
    let len = classes.len() as u32;

    let note_index = (f64::from(byte) / 255.0 * f64::from(NOTE_SPAN)).floor() as u32;
    let octave = note_index / len;
    let pitch_class = classes[(note_index % len) as usize];

    let note = BASE_NOTE + (octave as i32) * 12 + i32::from(pitch_class);
    let cv = f64::from(note - REFERENCE_NOTE) / CV_SPAN_SEMITONES;

    Quantized {
        pitch_class,
        octave,
        note,
        cv,
        bipolar: bipolar(byte),
    }
}

/// Map a byte to [-0.5, 0.5] for the audio-rate modulation outputs.
pub fn bipolar(byte: u8) -> f64 {
    f64::from(byte) / 255.0 - 0.5
}

/// Convert a pitch CV to the monitor oscillator frequency, clamped to the
/// audible range.
pub fn monitor_frequency(cv: f64) -> f64 {
    (MONITOR_REFERENCE_HZ * 2.0_f64.powf(cv * 10.0)).clamp(MONITOR_MIN_HZ, MONITOR_MAX_HZ)
}
