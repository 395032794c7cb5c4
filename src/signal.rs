use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a signal sits in the conversion chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    If,
    Rf,
}

/// Whether energy was generated by station electronics or received over the
/// air at the antenna.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalOrigin {
    Internal,
    External,
}

/// One carrier observable at a tap point.
///
/// Signals are produced fresh each time a tap is resolved and are never
/// mutated afterwards; converters and amplifiers return shifted copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub frequency_hz: f64,
    pub level_dbm: f64,
    pub kind: SignalKind,
    pub origin: SignalOrigin,
}

impl Signal {
    pub fn new(frequency_hz: f64, level_dbm: f64, kind: SignalKind, origin: SignalOrigin) -> Self {
        Self {
            frequency_hz,
            level_dbm,
            kind,
            origin,
        }
    }

    /// Copy of this signal after a gain (or loss, negative) stage.
    pub fn amplified(&self, gain_db: f64) -> Signal {
        Signal {
            level_dbm: self.level_dbm + gain_db,
            ..self.clone()
        }
    }

    /// Copy of this signal translated to a new frequency by a mixer stage.
    pub fn mixed_to(&self, frequency_hz: f64, kind: SignalKind) -> Signal {
        Signal {
            frequency_hz,
            kind,
            ..self.clone()
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Signal {{ frequency: {} Hz, level: {} dBm, kind: {:?}, origin: {:?} }}",
            self.frequency_hz, self.level_dbm, self.kind, self.origin
        )
    }
}
