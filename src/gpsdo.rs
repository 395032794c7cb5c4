use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::alarm::Alarm;
use crate::bus::{EventPublisher, StationEvent};
use crate::module::{ModuleId, RfModule};

/// Ticks from cold power-on until the oscillator is usable.
pub const WARM_UP_TICKS: u64 = 30;

/// Ticks of holdover after which the reference is considered degraded and
/// the distribution drops lock.
pub const HOLDOVER_LIMIT_TICKS: u64 = 120;

/// Observable state of the GPS-disciplined oscillator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsdoState {
    pub is_powered: bool,
    pub has_gps_fix: bool,
    /// Ticks spent warming, saturating at [`WARM_UP_TICKS`]. Resets on
    /// power-off; the oven does not hold heat.
    pub warm_up_ticks: u64,
    /// Ticks spent coasting without a GPS fix since the last discipline.
    pub holdover_ticks: u64,
}

impl Default for GpsdoState {
    fn default() -> Self {
        Self {
            is_powered: true,
            has_gps_fix: true,
            warm_up_ticks: WARM_UP_TICKS,
            holdover_ticks: 0,
        }
    }
}

/// GPS-disciplined 10 MHz reference feeding the BUC and LNB synthesizers.
///
/// Both counters advance at most once per tick and never move backwards
/// within a phase; there are no wall-clock timers anywhere in the model.
pub struct Gpsdo {
    state: GpsdoState,
    publisher: EventPublisher,
}

impl Gpsdo {
    pub fn new(state: GpsdoState, publisher: EventPublisher) -> Self {
        Self { state, publisher }
    }

    pub fn state(&self) -> &GpsdoState {
        &self.state
    }

    pub fn is_warmed_up(&self) -> bool {
        self.state.warm_up_ticks >= WARM_UP_TICKS
    }

    pub fn in_holdover(&self) -> bool {
        self.state.is_powered && self.is_warmed_up() && !self.state.has_gps_fix
    }

    /// Whether the distribution presents a usable disciplined reference.
    /// True through early holdover; false once the oscillator has coasted
    /// past [`HOLDOVER_LIMIT_TICKS`].
    pub fn reference_available(&self) -> bool {
        self.state.is_powered
            && self.is_warmed_up()
            && (self.state.has_gps_fix || self.state.holdover_ticks <= HOLDOVER_LIMIT_TICKS)
    }

    /// Antenna-fix input from the receiver.
    pub fn set_gps_fix(&mut self, fix: bool) {
        if self.state.has_gps_fix == fix {
            return;
        }
        if fix {
            info!("GPSDO reacquired GPS fix");
            self.state.holdover_ticks = 0;
        } else {
            warn!("GPSDO lost GPS fix, entering holdover");
        }
        self.state.has_gps_fix = fix;
        self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Gpsdo));
    }
}

impl RfModule for Gpsdo {
    fn id(&self) -> ModuleId {
        ModuleId::Gpsdo
    }

    fn handle_power_toggle(&mut self, on: bool) {
        if self.state.is_powered == on {
            return;
        }
        debug!(on, "GPSDO power toggle");
        self.state.is_powered = on;
        if !on {
            self.state.warm_up_ticks = 0;
            self.state.holdover_ticks = 0;
        }
        self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Gpsdo));
    }

    fn is_powered(&self) -> bool {
        self.state.is_powered
    }

    fn alarms(&self) -> Vec<Alarm> {
        let mut alarms = Vec::new();
        if !self.state.is_powered {
            return alarms;
        }
        if !self.is_warmed_up() {
            alarms.push(Alarm::info(format!(
                "GPSDO warming up ({}/{} ticks)",
                self.state.warm_up_ticks, WARM_UP_TICKS
            )));
        } else if self.in_holdover() {
            if self.state.holdover_ticks > HOLDOVER_LIMIT_TICKS {
                alarms.push(Alarm::fault("GPSDO reference degraded beyond the holdover limit"));
            } else {
                alarms.push(Alarm::warning(format!(
                    "GPSDO in holdover ({} ticks)",
                    self.state.holdover_ticks
                )));
            }
        }
        alarms
    }

    fn tick(&mut self) {
        if !self.state.is_powered {
            return;
        }
        let before = self.state.clone();
        if self.state.warm_up_ticks < WARM_UP_TICKS {
            self.state.warm_up_ticks += 1;
            if self.state.warm_up_ticks == WARM_UP_TICKS {
                info!("GPSDO oven warm, reference usable");
            }
        } else if !self.state.has_gps_fix {
            self.state.holdover_ticks += 1;
            if self.state.holdover_ticks == HOLDOVER_LIMIT_TICKS + 1 {
                warn!("GPSDO holdover limit exceeded, reference degraded");
            }
        }
        if self.state != before {
            self.publisher.publish(StationEvent::ModuleChanged(ModuleId::Gpsdo));
        }
    }
}
