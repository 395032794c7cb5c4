use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::alarm::Alarm;
use crate::bus::{EventPublisher, StationEvent};
use crate::module::{clamp_setpoint, ease_temperature, ModuleId, RfModule};
use crate::signal::{Signal, SignalKind};

pub const LNB_GAIN_MIN_DB: f64 = 40.0;
pub const LNB_GAIN_MAX_DB: f64 = 65.0;
pub const LNB_LO_MIN_HZ: f64 = 9.0e9;
pub const LNB_LO_MAX_HZ: f64 = 11.3e9;
pub const LNB_NOISE_TEMP_MIN_K: f64 = 15.0;
pub const LNB_NOISE_TEMP_MAX_K: f64 = 300.0;

const AMBIENT_C: f64 = 25.0;
const POWERED_C: f64 = 38.0;
const OVER_TEMPERATURE_C: f64 = 55.0;

/// Observable state of the low-noise block downconverter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LnbState {
    pub is_powered: bool,
    pub gain_db: f64,
    pub lo_frequency_hz: f64,
    pub noise_temperature_k: f64,
    pub is_ext_ref_locked: bool,
    pub temperature_c: f64,
}

impl Default for LnbState {
    fn default() -> Self {
        Self {
            is_powered: true,
            gain_db: 55.0,
            lo_frequency_hz: 10.75e9,
            noise_temperature_k: 45.0,
            is_ext_ref_locked: true,
            temperature_c: AMBIENT_C,
        }
    }
}

/// Low-noise block downconverter: Ku-band RF from the OMT in, L-band IF out.
///
/// The receive chain's noise performance is set almost entirely here, so the
/// unit is specified by noise temperature rather than noise figure; the
/// figure is derived on demand for the cascade.
pub struct Lnb {
    state: LnbState,
    publisher: EventPublisher,
}

impl Lnb {
    /// Setpoints clamp on the way in, so a hand-edited station file with an
    /// out-of-range or non-finite number still builds a usable module.
    pub fn new(mut state: LnbState, publisher: EventPublisher) -> Self {
        state.gain_db = clamp_setpoint(state.gain_db, LNB_GAIN_MIN_DB, LNB_GAIN_MAX_DB);
        state.lo_frequency_hz = clamp_setpoint(state.lo_frequency_hz, LNB_LO_MIN_HZ, LNB_LO_MAX_HZ);
        state.noise_temperature_k = clamp_setpoint(
            state.noise_temperature_k,
            LNB_NOISE_TEMP_MIN_K,
            LNB_NOISE_TEMP_MAX_K,
        );
        Self { state, publisher }
    }

    pub fn state(&self) -> &LnbState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_powered && self.state.is_ext_ref_locked
    }

    /// Reference-lock input from the GPSDO distribution.
    pub fn set_ext_ref_locked(&mut self, locked: bool) {
        if self.state.is_ext_ref_locked == locked {
            return;
        }
        if !locked {
            warn!("LNB lost external 10 MHz reference, output squelched");
        }
        self.state.is_ext_ref_locked = locked;
        self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Lnb));
    }

    pub fn set_noise_temperature_k(&mut self, noise_temperature_k: f64) {
        let before = self.state.clone();
        self.state.noise_temperature_k =
            clamp_setpoint(noise_temperature_k, LNB_NOISE_TEMP_MIN_K, LNB_NOISE_TEMP_MAX_K);
        self.notify_if_changed(&before);
    }

    /// Noise figure in dB derived from the unit's noise temperature.
    pub fn noise_figure_db(&self) -> f64 {
        rfconversions::noise::noise_figure_from_noise_temperature(self.state.noise_temperature_k)
    }

    /// Downconverted copies of the RF carriers on the IF output. Carriers at
    /// or below the LO have no representable IF image and are dropped.
    /// Empty while squelched.
    pub fn downconvert(&self, inputs: &[Signal]) -> Vec<Signal> {
        if !self.is_active() {
            return Vec::new();
        }
        inputs
            .iter()
            .filter(|carrier| carrier.frequency_hz > self.state.lo_frequency_hz)
            .map(|carrier| {
                carrier
                    .amplified(self.state.gain_db)
                    .mixed_to(carrier.frequency_hz - self.state.lo_frequency_hz, SignalKind::If)
            })
            .collect()
    }

    /// Noise figure and gain as a cascade stage, or `None` while squelched.
    pub fn stage(&self) -> Option<(f64, f64)> {
        self.is_active()
            .then(|| (self.noise_figure_db(), self.state.gain_db))
    }

    fn notify_if_changed(&self, before: &LnbState) {
        if self.state != *before {
            self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Lnb));
        }
    }
}

impl RfModule for Lnb {
    fn id(&self) -> ModuleId {
        ModuleId::Lnb
    }

    fn handle_power_toggle(&mut self, on: bool) {
        if self.state.is_powered == on {
            return;
        }
        debug!(on, "LNB power toggle");
        self.state.is_powered = on;
        self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Lnb));
    }

    fn is_powered(&self) -> bool {
        self.state.is_powered
    }

    fn handle_gain_change(&mut self, gain_db: f64) {
        let before = self.state.clone();
        self.state.gain_db = clamp_setpoint(gain_db, LNB_GAIN_MIN_DB, LNB_GAIN_MAX_DB);
        debug!(gain_db = self.state.gain_db, "LNB gain set");
        self.notify_if_changed(&before);
    }

    fn handle_lo_frequency_change(&mut self, lo_hz: f64) {
        let before = self.state.clone();
        self.state.lo_frequency_hz = clamp_setpoint(lo_hz, LNB_LO_MIN_HZ, LNB_LO_MAX_HZ);
        debug!(lo_frequency_hz = self.state.lo_frequency_hz, "LNB LO set");
        self.notify_if_changed(&before);
    }

    fn alarms(&self) -> Vec<Alarm> {
        let mut alarms = Vec::new();
        if !self.state.is_powered {
            return alarms;
        }
        if !self.state.is_ext_ref_locked {
            alarms.push(Alarm::warning("LNB external reference unlocked"));
        }
        if self.state.temperature_c > OVER_TEMPERATURE_C {
            alarms.push(Alarm::warning(format!(
                "LNB over temperature ({:.1} C)",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::signal::SignalOrigin;

    fn test_lnb() -> Lnb {
        Lnb::new(LnbState::default(), EventBus::new().publisher())
    }

    fn rf_carrier(frequency_hz: f64, level_dbm: f64) -> Signal {
        Signal::new(frequency_hz, level_dbm, SignalKind::Rf, SignalOrigin::External)
    }

    #[test]
    fn downconverts_rf_to_l_band_if() {
        let lnb = test_lnb();
        let out = lnb.downconvert(&[rf_carrier(11.95e9, -100.0)]);
        assert_eq!(out.len(), 1);
        assert!((out[0].frequency_hz - 1.2e9).abs() < 1.0);
        assert_eq!(out[0].level_dbm, -45.0);
        assert_eq!(out[0].kind, SignalKind::If);
        assert_eq!(out[0].origin, SignalOrigin::External);
    }

    #[test]
    fn carriers_below_lo_are_dropped() {
        let lnb = test_lnb();
        let out = lnb.downconvert(&[rf_carrier(9.0e9, -100.0)]);
        assert!(out.is_empty());
    }

    #[test]
    fn squelched_when_unlocked() {
        let mut lnb = test_lnb();
        lnb.set_ext_ref_locked(false);
        assert!(lnb.downconvert(&[rf_carrier(11.95e9, -100.0)]).is_empty());
        assert!(lnb.stage().is_none());
        assert_eq!(lnb.alarms().len(), 1);
    }

    #[test]
    fn noise_figure_tracks_noise_temperature() {
        let mut lnb = test_lnb();
        lnb.set_noise_temperature_k(290.0);
        // T = T0 must come out as NF = 3.01 dB
        assert!((lnb.noise_figure_db() - 3.0103).abs() < 0.01);
        lnb.set_noise_temperature_k(45.0);
        assert!(lnb.noise_figure_db() < 1.0);
    }

    #[test]
    fn setpoints_clamp_to_range() {
        let mut lnb = test_lnb();
        lnb.handle_gain_change(80.0);
        assert_eq!(lnb.state().gain_db, LNB_GAIN_MAX_DB);
        lnb.handle_lo_frequency_change(20.0e9);
        assert_eq!(lnb.state().lo_frequency_hz, LNB_LO_MAX_HZ);
        lnb.set_noise_temperature_k(5.0);
        assert_eq!(lnb.state().noise_temperature_k, LNB_NOISE_TEMP_MIN_K);
    }

    #[test]
    fn relock_publishes_once() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let mut lnb = Lnb::new(LnbState::default(), bus.publisher());

        lnb.set_ext_ref_locked(true); // already locked
        assert_eq!(rx.drain().count(), 0);
        lnb.set_ext_ref_locked(false);
        lnb.set_ext_ref_locked(false);
        assert_eq!(rx.drain().count(), 1);
    }
}
