use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alarm::Alarm;

/// Identifies one equipment module in events, keypad bindings, and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleId {
    Buc,
    Hpa,
    Lnb,
    Omt,
    IfFilter,
    Gpsdo,
}

impl ModuleId {
    pub fn label(self) -> &'static str {
        match self {
            ModuleId::Buc => "BUC",
            ModuleId::Hpa => "HPA",
            ModuleId::Lnb => "LNB",
            ModuleId::Omt => "OMT",
            ModuleId::IfFilter => "IF FILTER",
            ModuleId::Gpsdo => "GPSDO",
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Behavior every equipment module exposes to the panel layer.
///
/// Control handlers clamp out-of-range requests into the module's valid
/// range rather than erroring; modules without a given control inherit the
/// no-op default. Handlers are idempotent, so repeating one with the same
/// value leaves state untouched and publishes nothing.
pub trait RfModule {
    fn id(&self) -> ModuleId;

    /// Powering off silences the module's output but keeps its setpoints.
    fn handle_power_toggle(&mut self, on: bool);

    fn is_powered(&self) -> bool;

    fn handle_gain_change(&mut self, _gain_db: f64) {}

    fn handle_lo_frequency_change(&mut self, _lo_hz: f64) {}

    fn handle_back_off_change(&mut self, _back_off_db: f64) {}

    /// Severity-tagged messages derived from the current state.
    fn alarms(&self) -> Vec<Alarm>;

    /// Advance per-tick behavior such as temperature easing or warm-up.
    fn tick(&mut self) {}
}

/// Clamp a requested setpoint into a module's valid range. Non-finite
/// requests fall to the range minimum so module state stays finite.
pub(crate) fn clamp_setpoint(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.clamp(min, max)
}

/// One easing step of a thermal reading toward its target, 10% per tick.
/// Snaps onto the target once within 0.05 C so settled modules stop
/// reporting spurious changes.
pub(crate) fn ease_temperature(current_c: f64, target_c: f64) -> f64 {
    let next = current_c + 0.1 * (target_c - current_c);
    if (target_c - next).abs() < 0.05 {
        target_c
    } else {
        next
    }
}

/// Soft 1 dB compression: output tracks input plus gain until it reaches
/// 1 dB over the compression point, then holds there.
pub(crate) fn compress_output(output_dbm: f64, output_p1db_dbm: f64) -> f64 {
    if output_dbm > output_p1db_dbm + 1.0 {
        output_p1db_dbm + 1.0
    } else {
        output_dbm
    }
}
