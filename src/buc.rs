use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::alarm::Alarm;
use crate::bus::{EventPublisher, StationEvent};
use crate::module::{clamp_setpoint, compress_output, ease_temperature, ModuleId, RfModule};
use crate::signal::{Signal, SignalKind};

pub const BUC_GAIN_MIN_DB: f64 = 20.0;
pub const BUC_GAIN_MAX_DB: f64 = 40.0;
pub const BUC_LO_MIN_HZ: f64 = 5.0e9;
pub const BUC_LO_MAX_HZ: f64 = 15.0e9;

const AMBIENT_C: f64 = 25.0;
const POWERED_C: f64 = 46.0;
const OVER_TEMPERATURE_C: f64 = 65.0;

/// Observable state of the block upconverter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucState {
    pub is_powered: bool,
    pub gain_db: f64,
    pub lo_frequency_hz: f64,
    pub noise_figure_db: f64,
    pub output_p1db_dbm: f64,
    pub is_ext_ref_locked: bool,
    pub temperature_c: f64,
}

impl Default for BucState {
    fn default() -> Self {
        Self {
            is_powered: true,
            gain_db: 30.0,
            lo_frequency_hz: 12.8e9,
            noise_figure_db: 8.0,
            output_p1db_dbm: 37.0,
            is_ext_ref_locked: true,
            temperature_c: AMBIENT_C,
        }
    }
}

/// Block upconverter: L-band transmit IF in, Ku-band RF out.
///
/// The BUC owns the transmit carriers presented on its IF cable, so the
/// `TxIf` tap reads them here. Output is squelched whenever the unit is
/// unpowered or has lost the external 10 MHz reference.
pub struct Buc {
    state: BucState,
    input_signals: Vec<Signal>,
    publisher: EventPublisher,
}

impl Buc {
    /// Setpoints clamp on the way in, so a hand-edited station file with an
    /// out-of-range or non-finite number still builds a usable module.
    pub fn new(mut state: BucState, input_signals: Vec<Signal>, publisher: EventPublisher) -> Self {
        state.gain_db = clamp_setpoint(state.gain_db, BUC_GAIN_MIN_DB, BUC_GAIN_MAX_DB);
        state.lo_frequency_hz = clamp_setpoint(state.lo_frequency_hz, BUC_LO_MIN_HZ, BUC_LO_MAX_HZ);
        Self {
            state,
            input_signals,
            publisher,
        }
    }

    pub fn state(&self) -> &BucState {
        &self.state
    }

    /// Transmit carriers on the IF cable from the modem.
    pub fn input_signals(&self) -> &[Signal] {
        &self.input_signals
    }

    pub fn set_input_signals(&mut self, signals: Vec<Signal>) {
        if self.input_signals != signals {
            self.input_signals = signals;
            self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Buc));
        }
    }

    /// Powered and disciplined by the external reference.
    pub fn is_active(&self) -> bool {
        self.state.is_powered && self.state.is_ext_ref_locked
    }

    /// Reference-lock input from the GPSDO distribution.
    pub fn set_ext_ref_locked(&mut self, locked: bool) {
        if self.state.is_ext_ref_locked == locked {
            return;
        }
        if !locked {
            warn!("BUC lost external 10 MHz reference, output squelched");
        }
        self.state.is_ext_ref_locked = locked;
        self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Buc));
    }

    /// Upconverted carriers on the RF flange, compressed at P1dB.
    /// Empty while squelched.
    pub fn output_signals(&self) -> Vec<Signal> {
        if !self.is_active() {
            return Vec::new();
        }
        self.input_signals
            .iter()
            .map(|carrier| {
                let mut out = carrier
                    .amplified(self.state.gain_db)
                    .mixed_to(carrier.frequency_hz + self.state.lo_frequency_hz, SignalKind::Rf);
                out.level_dbm = compress_output(out.level_dbm, self.state.output_p1db_dbm);
                out
            })
            .collect()
    }

    /// Noise figure and gain as a cascade stage, or `None` while squelched.
    pub fn stage(&self) -> Option<(f64, f64)> {
        self.is_active()
            .then_some((self.state.noise_figure_db, self.state.gain_db))
    }

    fn notify_if_changed(&self, before: &BucState) {
        if self.state != *before {
            self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Buc));
        }
    }
}

impl RfModule for Buc {
    fn id(&self) -> ModuleId {
        ModuleId::Buc
    }

    fn handle_power_toggle(&mut self, on: bool) {
        if self.state.is_powered == on {
            return;
        }
        debug!(on, "BUC power toggle");
        self.state.is_powered = on;
        self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Buc));
    }

    fn is_powered(&self) -> bool {
        self.state.is_powered
    }

    fn handle_gain_change(&mut self, gain_db: f64) {
        let before = self.state.clone();
        self.state.gain_db = clamp_setpoint(gain_db, BUC_GAIN_MIN_DB, BUC_GAIN_MAX_DB);
        debug!(gain_db = self.state.gain_db, "BUC gain set");
        self.notify_if_changed(&before);
    }

    fn handle_lo_frequency_change(&mut self, lo_hz: f64) {
        let before = self.state.clone();
        self.state.lo_frequency_hz = clamp_setpoint(lo_hz, BUC_LO_MIN_HZ, BUC_LO_MAX_HZ);
        debug!(lo_frequency_hz = self.state.lo_frequency_hz, "BUC LO set");
        self.notify_if_changed(&before);
    }

    fn alarms(&self) -> Vec<Alarm> {
        let mut alarms = Vec::new();
        if !self.state.is_powered {
            return alarms;
        }
        if !self.state.is_ext_ref_locked {
            alarms.push(Alarm::warning("BUC external reference unlocked"));
        }
        if self.state.temperature_c > OVER_TEMPERATURE_C {
            alarms.push(Alarm::warning(format!(
                "BUC over temperature ({:.1} C)",
                self.state.temperature_c
            )));
        }
        alarms
    }

    fn tick(&mut self) {
        let target = if self.state.is_powered { POWERED_C } else { AMBIENT_C };
        let before = self.state.clone();
        self.state.temperature_c = ease_temperature(self.state.temperature_c, target);
        self.notify_if_changed(&before);
    }
}
