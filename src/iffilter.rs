use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alarm::Alarm;
use crate::bus::{EventPublisher, StationEvent};
use crate::module::{clamp_setpoint, ModuleId, RfModule};
use crate::signal::Signal;

pub const FILTER_CENTER_MIN_HZ: f64 = 950.0e6;
pub const FILTER_CENTER_MAX_HZ: f64 = 2150.0e6;
pub const FILTER_BANDWIDTH_MIN_HZ: f64 = 1.0e6;
pub const FILTER_BANDWIDTH_MAX_HZ: f64 = 500.0e6;

/// Observable state of the receive IF band-pass filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IfFilterState {
    /// Passive; unpowered models the filter pulled from the IF run, which
    /// leaves the downstream cable open.
    pub is_powered: bool,
    pub center_frequency_hz: f64,
    pub bandwidth_hz: f64,
    pub insertion_loss_db: f64,
    pub stopband_rejection_db: f64,
}

impl Default for IfFilterState {
    fn default() -> Self {
        Self {
            is_powered: true,
            center_frequency_hz: 1.2e9,
            bandwidth_hz: 36.0e6,
            insertion_loss_db: 1.2,
            stopband_rejection_db: 60.0,
        }
    }
}

/// Band-pass filter ahead of the receive IF output.
///
/// In-band carriers lose the insertion loss; everything else additionally
/// loses the stopband rejection, which is what knocks OMT transmit leakage
/// down to the floor on a correctly tuned station.
pub struct IfFilter {
    state: IfFilterState,
    publisher: EventPublisher,
}

impl IfFilter {
    /// Setpoints clamp on the way in, so a hand-edited station file with an
    /// out-of-range or non-finite number still builds a usable module.
    pub fn new(mut state: IfFilterState, publisher: EventPublisher) -> Self {
        state.center_frequency_hz = clamp_setpoint(
            state.center_frequency_hz,
            FILTER_CENTER_MIN_HZ,
            FILTER_CENTER_MAX_HZ,
        );
        state.bandwidth_hz = clamp_setpoint(
            state.bandwidth_hz,
            FILTER_BANDWIDTH_MIN_HZ,
            FILTER_BANDWIDTH_MAX_HZ,
        );
        Self { state, publisher }
    }

    pub fn state(&self) -> &IfFilterState {
        &self.state
    }

    pub fn is_installed(&self) -> bool {
        self.state.is_powered
    }

    pub fn is_in_band(&self, frequency_hz: f64) -> bool {
        (frequency_hz - self.state.center_frequency_hz).abs() <= self.state.bandwidth_hz / 2.0
    }

    /// Filtered copies of the IF carriers. Empty when the filter is pulled.
    pub fn filter(&self, inputs: &[Signal]) -> Vec<Signal> {
        if !self.is_installed() {
            return Vec::new();
        }
        inputs
            .iter()
            .map(|carrier| {
                let loss = if self.is_in_band(carrier.frequency_hz) {
                    self.state.insertion_loss_db
                } else {
                    self.state.insertion_loss_db + self.state.stopband_rejection_db
                };
                carrier.amplified(-loss)
            })
            .collect()
    }

    pub fn set_center_frequency(&mut self, center_hz: f64) {
        let before = self.state.clone();
        self.state.center_frequency_hz =
            clamp_setpoint(center_hz, FILTER_CENTER_MIN_HZ, FILTER_CENTER_MAX_HZ);
        debug!(
            center_frequency_hz = self.state.center_frequency_hz,
            "IF filter retuned"
        );
        self.notify_if_changed(&before);
    }

    pub fn set_bandwidth(&mut self, bandwidth_hz: f64) {
        let before = self.state.clone();
        self.state.bandwidth_hz =
            clamp_setpoint(bandwidth_hz, FILTER_BANDWIDTH_MIN_HZ, FILTER_BANDWIDTH_MAX_HZ);
        self.notify_if_changed(&before);
    }

    /// Passive passband stage: noise figure equals the insertion loss.
    pub fn stage(&self) -> Option<(f64, f64)> {
        self.is_installed()
            .then_some((self.state.insertion_loss_db, -self.state.insertion_loss_db))
    }

    fn notify_if_changed(&self, before: &IfFilterState) {
        if self.state != *before {
            self.publisher
                .publish(StationEvent::ModuleChanged(ModuleId::IfFilter));
        }
    }
}

impl RfModule for IfFilter {
    fn id(&self) -> ModuleId {
        ModuleId::IfFilter
    }

    fn handle_power_toggle(&mut self, on: bool) {
        if self.state.is_powered == on {
            return;
        }
        debug!(installed = on, "IF filter install toggle");
        self.state.is_powered = on;
        self.publisher
            .publish(StationEvent::ModuleChanged(ModuleId::IfFilter));
    }

    fn is_powered(&self) -> bool {
        self.state.is_powered
    }

    fn alarms(&self) -> Vec<Alarm> {
        if self.is_installed() {
            Vec::new()
        } else {
            vec![Alarm::info("IF filter not installed")]
        }
    }
}
