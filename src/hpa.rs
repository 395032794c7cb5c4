use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alarm::Alarm;
use crate::bus::{EventPublisher, StationEvent};
use crate::module::{clamp_setpoint, compress_output, ease_temperature, ModuleId, RfModule};
use crate::signal::Signal;

pub const HPA_GAIN_MIN_DB: f64 = 40.0;
pub const HPA_GAIN_MAX_DB: f64 = 75.0;
pub const HPA_BACK_OFF_MIN_DB: f64 = 0.0;
pub const HPA_BACK_OFF_MAX_DB: f64 = 20.0;

/// Drive within this many dB of P1dB raises the saturation alarm.
pub const SATURATION_MARGIN_DB: f64 = 3.0;

const AMBIENT_C: f64 = 25.0;
const POWERED_C: f64 = 52.0;
const SATURATED_C: f64 = 78.0;
const OVER_TEMPERATURE_C: f64 = 70.0;
const QUIET_DRIVE_DBM: f64 = -120.0;

/// Observable state of the high-power amplifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HpaState {
    pub is_powered: bool,
    pub gain_db: f64,
    pub back_off_db: f64,
    pub noise_figure_db: f64,
    pub output_p1db_dbm: f64,
    /// Peak composite level on the input flange, written by the station
    /// each tick from the upstream tap.
    pub drive_level_dbm: f64,
    pub temperature_c: f64,
}

impl Default for HpaState {
    fn default() -> Self {
        Self {
            is_powered: true,
            gain_db: 60.0,
            back_off_db: 6.0,
            noise_figure_db: 10.0,
            output_p1db_dbm: 65.0,
            drive_level_dbm: QUIET_DRIVE_DBM,
            temperature_c: AMBIENT_C,
        }
    }
}

/// High-power amplifier feeding the OMT transmit port.
///
/// Back-off subtracts from the drive ahead of the gain stage, the knob
/// operators reach for to keep a saturating uplink linear. Sustained
/// operation inside the saturation margin also drags the thermal target up,
/// so an over-driven amplifier eventually trips the over-temperature alarm
/// as well.
pub struct Hpa {
    state: HpaState,
    publisher: EventPublisher,
}

impl Hpa {
    /// Setpoints clamp on the way in, so a hand-edited station file with an
    /// out-of-range or non-finite number still builds a usable module.
    pub fn new(mut state: HpaState, publisher: EventPublisher) -> Self {
        state.gain_db = clamp_setpoint(state.gain_db, HPA_GAIN_MIN_DB, HPA_GAIN_MAX_DB);
        state.back_off_db =
            clamp_setpoint(state.back_off_db, HPA_BACK_OFF_MIN_DB, HPA_BACK_OFF_MAX_DB);
        Self { state, publisher }
    }

    pub fn state(&self) -> &HpaState {
        &self.state
    }

    /// Called by the station after resolving the upstream tap.
    pub fn set_drive_level(&mut self, peak_dbm: Option<f64>) {
        let level = peak_dbm.unwrap_or(QUIET_DRIVE_DBM);
        if self.state.drive_level_dbm != level {
            self.state.drive_level_dbm = level;
            self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Hpa));
        }
    }

    /// Amplified copies of the input carriers, compressed at P1dB.
    /// Empty while unpowered.
    pub fn amplify(&self, inputs: &[Signal]) -> Vec<Signal> {
        if !self.state.is_powered {
            return Vec::new();
        }
        let net_gain = self.state.gain_db - self.state.back_off_db;
        inputs
            .iter()
            .map(|carrier| {
                let mut out = carrier.amplified(net_gain);
                out.level_dbm = compress_output(out.level_dbm, self.state.output_p1db_dbm);
                out
            })
            .collect()
    }

    /// Noise figure and net gain as a cascade stage, or `None` when off.
    pub fn stage(&self) -> Option<(f64, f64)> {
        self.state.is_powered.then_some((
            self.state.noise_figure_db,
            self.state.gain_db - self.state.back_off_db,
        ))
    }

    /// Drive is within [`SATURATION_MARGIN_DB`] of the compression point.
    pub fn is_saturated(&self) -> bool {
        if !self.state.is_powered {
            return false;
        }
        let output = self.state.drive_level_dbm + self.state.gain_db - self.state.back_off_db;
        output >= self.state.output_p1db_dbm - SATURATION_MARGIN_DB
    }

    fn notify_if_changed(&self, before: &HpaState) {
        if self.state != *before {
            self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Hpa));
        }
    }
}

impl RfModule for Hpa {
    fn id(&self) -> ModuleId {
        ModuleId::Hpa
    }

    fn handle_power_toggle(&mut self, on: bool) {
        if self.state.is_powered == on {
            return;
        }
        debug!(on, "HPA power toggle");
        self.state.is_powered = on;
        self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Hpa));
    }

    fn is_powered(&self) -> bool {
        self.state.is_powered
    }

    fn handle_gain_change(&mut self, gain_db: f64) {
        let before = self.state.clone();
        self.state.gain_db = clamp_setpoint(gain_db, HPA_GAIN_MIN_DB, HPA_GAIN_MAX_DB);
        debug!(gain_db = self.state.gain_db, "HPA gain set");
        self.notify_if_changed(&before);
    }

    fn handle_back_off_change(&mut self, back_off_db: f64) {
        let before = self.state.clone();
        self.state.back_off_db =
            clamp_setpoint(back_off_db, HPA_BACK_OFF_MIN_DB, HPA_BACK_OFF_MAX_DB);
        debug!(back_off_db = self.state.back_off_db, "HPA back-off set");
        self.notify_if_changed(&before);
    }

    fn alarms(&self) -> Vec<Alarm> {
        let mut alarms = Vec::new();
        if !self.state.is_powered {
            return alarms;
        }
        if self.is_saturated() {
            let margin = self.state.output_p1db_dbm
                - (self.state.drive_level_dbm + self.state.gain_db - self.state.back_off_db);
            alarms.push(Alarm::warning(format!(
                "HPA within {:.1} dB of P1dB",
                margin.max(0.0)
            )));
        }
        if self.state.temperature_c > OVER_TEMPERATURE_C {
            alarms.push(Alarm::warning(format!(
                "HPA over temperature ({:.1} C)",
                self.state.temperature_c
            )));
        }
        alarms
    }

    fn tick(&mut self) {
        let target = if !self.state.is_powered {
            AMBIENT_C
        } else if self.is_saturated() {
            SATURATED_C
        } else {
            POWERED_C
        };
        let before = self.state.clone();
        self.state.temperature_c = ease_temperature(self.state.temperature_c, target);
        self.notify_if_changed(&before);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmSeverity;
    use crate::bus::EventBus;
    use crate::signal::{SignalKind, SignalOrigin};

    fn test_hpa() -> Hpa {
        Hpa::new(HpaState::default(), EventBus::new().publisher())
    }

    fn rf_carrier(level_dbm: f64) -> Signal {
        Signal::new(14.0e9, level_dbm, SignalKind::Rf, SignalOrigin::Internal)
    }

    #[test]
    fn back_off_subtracts_from_drive() {
        let hpa = test_hpa();
        // -20 dBm + 60 dB gain - 6 dB back-off = 34 dBm
        let out = hpa.amplify(&[rf_carrier(-20.0)]);
        assert_eq!(out[0].level_dbm, 34.0);
    }

    #[test]
    fn output_never_exceeds_p1db_plus_one() {
        let hpa = test_hpa();
        let out = hpa.amplify(&[rf_carrier(30.0)]);
        assert_eq!(out[0].level_dbm, 66.0);
    }

    #[test]
    fn unpowered_amplifier_is_dark() {
        let mut hpa = test_hpa();
        hpa.handle_power_toggle(false);
        assert!(hpa.amplify(&[rf_carrier(-20.0)]).is_empty());
        assert!(hpa.stage().is_none());
    }

    #[test]
    fn saturation_alarm_inside_margin() {
        let mut hpa = test_hpa();
        // 13 dBm drive + 54 dB net gain = 67 dBm, past the 65 dBm P1dB
        hpa.set_drive_level(Some(13.0));
        assert!(hpa.is_saturated());
        let alarms = hpa.alarms();
        assert_eq!(alarms[0].severity, AlarmSeverity::Warning);
        assert!(alarms[0].message.contains("P1dB"));
    }

    #[test]
    fn back_off_restores_saturation_margin() {
        let mut hpa = test_hpa();
        // 9 dBm drive + 54 dB net gain = 63 dBm, inside the 3 dB margin
        hpa.set_drive_level(Some(9.0));
        assert!(hpa.is_saturated());
        hpa.handle_back_off_change(12.0);
        assert!(!hpa.is_saturated());
        assert!(hpa.alarms().is_empty());
    }

    #[test]
    fn sustained_saturation_reaches_over_temperature() {
        let mut hpa = test_hpa();
        hpa.set_drive_level(Some(13.0));
        for _ in 0..60 {
            hpa.tick();
        }
        let alarms = hpa.alarms();
        assert!(alarms.iter().any(|a| a.message.contains("temperature")));
    }

    #[test]
    fn setpoints_clamp_to_range() {
        let mut hpa = test_hpa();
        hpa.handle_gain_change(100.0);
        assert_eq!(hpa.state().gain_db, HPA_GAIN_MAX_DB);
        hpa.handle_back_off_change(-4.0);
        assert_eq!(hpa.state().back_off_db, HPA_BACK_OFF_MIN_DB);
        hpa.handle_back_off_change(f64::NAN);
        assert_eq!(hpa.state().back_off_db, HPA_BACK_OFF_MIN_DB);
    }

    #[test]
    fn repeated_setpoint_publishes_nothing() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let mut hpa = Hpa::new(HpaState::default(), bus.publisher());

        hpa.handle_back_off_change(6.0); // default already
        assert_eq!(rx.drain().count(), 0);
        hpa.handle_back_off_change(8.0);
        assert_eq!(rx.drain().count(), 1);
    }
}
