use std::fmt;

use serde::{Deserialize, Serialize};

/// Frequency entry units, one per keypad unit button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyUnit {
    Hz,
    Khz,
    Mhz,
    Ghz,
}

impl FrequencyUnit {
    /// Exact power-of-ten multiplier to Hz.
    pub fn multiplier(self) -> f64 {
        match self {
            FrequencyUnit::Hz => 1.0,
            FrequencyUnit::Khz => 1.0e3,
            FrequencyUnit::Mhz => 1.0e6,
            FrequencyUnit::Ghz => 1.0e9,
        }
    }

    pub fn to_hz(self, value: f64) -> f64 {
        value * self.multiplier()
    }

    pub fn from_hz(self, hz: f64) -> f64 {
        hz / self.multiplier()
    }

    pub fn label(self) -> &'static str {
        match self {
            FrequencyUnit::Hz => "Hz",
            FrequencyUnit::Khz => "kHz",
            FrequencyUnit::Mhz => "MHz",
            FrequencyUnit::Ghz => "GHz",
        }
    }
}

impl fmt::Display for FrequencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// What a keypad unit button commits in: a multiple of Hz for frequency
/// fields, or dBm for amplitude fields (multiplier 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryUnit {
    Frequency(FrequencyUnit),
    Dbm,
}

impl EntryUnit {
    pub fn multiplier(self) -> f64 {
        match self {
            EntryUnit::Frequency(unit) => unit.multiplier(),
            EntryUnit::Dbm => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntryUnit::Frequency(unit) => unit.label(),
            EntryUnit::Dbm => "dBm",
        }
    }
}

impl fmt::Display for EntryUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Pick the natural display unit for a frequency, returning the scaled value
/// and its label. Used by the CLI lineup printout and the HTML report.
pub fn scale_frequency(hz: f64) -> (f64, &'static str) {
    if hz >= 1.0e9 {
        (hz / 1.0e9, "GHz")
    } else if hz >= 1.0e6 {
        (hz / 1.0e6, "MHz")
    } else if hz >= 1.0e3 {
        (hz / 1.0e3, "kHz")
    } else {
        (hz, "Hz")
    }
}
