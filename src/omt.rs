use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alarm::Alarm;
use crate::bus::{EventPublisher, StationEvent};
use crate::module::{ModuleId, RfModule};
use crate::signal::Signal;

/// Observable state of the orthomode transducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OmtState {
    /// The OMT is passive; power here models the unit being bolted into the
    /// waveguide run. Removed, it forwards nothing on either path.
    pub is_powered: bool,
    pub insertion_loss_db: f64,
    pub tx_rx_isolation_db: f64,
}

impl Default for OmtState {
    fn default() -> Self {
        Self {
            is_powered: true,
            insertion_loss_db: 0.5,
            tx_rx_isolation_db: 60.0,
        }
    }
}

/// Orthomode transducer joining the transmit and receive polarizations on
/// the feed.
///
/// Finite isolation leaks an attenuated copy of each transmit carrier into
/// the receive port, where it rides down the whole receive chain and shows
/// up on the analyzer as an internally generated spur.
pub struct Omt {
    state: OmtState,
    publisher: EventPublisher,
}

impl Omt {
    pub fn new(state: OmtState, publisher: EventPublisher) -> Self {
        Self { state, publisher }
    }

    pub fn state(&self) -> &OmtState {
        &self.state
    }

    pub fn is_installed(&self) -> bool {
        self.state.is_powered
    }

    /// Transmit carriers toward the antenna, less insertion loss.
    pub fn forward_tx(&self, inputs: &[Signal]) -> Vec<Signal> {
        if !self.is_installed() {
            return Vec::new();
        }
        inputs
            .iter()
            .map(|carrier| carrier.amplified(-self.state.insertion_loss_db))
            .collect()
    }

    /// Antenna carriers toward the LNB, plus transmit leakage across the
    /// finite isolation.
    pub fn forward_rx(&self, from_antenna: &[Signal], tx_at_omt: &[Signal]) -> Vec<Signal> {
        if !self.is_installed() {
            return Vec::new();
        }
        let mut out: Vec<Signal> = from_antenna
            .iter()
            .map(|carrier| carrier.amplified(-self.state.insertion_loss_db))
            .collect();
        out.extend(
            tx_at_omt
                .iter()
                .map(|carrier| carrier.amplified(-self.state.tx_rx_isolation_db)),
        );
        out
    }

    /// Passive stage: noise figure equals the insertion loss.
    pub fn stage(&self) -> Option<(f64, f64)> {
        self.is_installed()
            .then_some((self.state.insertion_loss_db, -self.state.insertion_loss_db))
    }
}

impl RfModule for Omt {
    fn id(&self) -> ModuleId {
        ModuleId::Omt
    }

    fn handle_power_toggle(&mut self, on: bool) {
        if self.state.is_powered == on {
            return;
        }
        debug!(installed = on, "OMT install toggle");
        self.state.is_powered = on;
        self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Omt));
    }

    fn is_powered(&self) -> bool {
        self.state.is_powered
    }

    fn alarms(&self) -> Vec<Alarm> {
        if self.is_installed() {
            Vec::new()
        } else {
            vec![Alarm::info("OMT not installed")]
        }
    }
}
