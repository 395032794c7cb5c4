use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::buc::BucState;
use crate::chain::TapPoint;
use crate::error::{ConfigError, ConfigResult};
use crate::gpsdo::GpsdoState;
use crate::hpa::HpaState;
use crate::iffilter::IfFilterState;
use crate::keypad::EntryTarget;
use crate::lnb::LnbState;
use crate::omt::OmtState;

/// L-band window the modem may place transmit carriers in.
pub const TX_CARRIER_MIN_HZ: f64 = 950.0e6;
pub const TX_CARRIER_MAX_HZ: f64 = 2150.0e6;

/// Ku-band window for received downlink carriers.
pub const RX_CARRIER_MIN_HZ: f64 = 10.7e9;
pub const RX_CARRIER_MAX_HZ: f64 = 12.75e9;

/// One carrier listed in a station file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarrierConfig {
    pub frequency_hz: f64,
    pub level_dbm: f64,
}

/// Environment seen at the feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntennaConfig {
    pub noise_floor_dbm: f64,
}

impl Default for AntennaConfig {
    fn default() -> Self {
        Self {
            noise_floor_dbm: crate::constants::THERMAL_FLOOR_DBM,
        }
    }
}

/// What the modem presents on the transmit IF cable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    pub tx_if_noise_floor_dbm: f64,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            tx_if_noise_floor_dbm: -130.0,
        }
    }
}

/// Initial analyzer setup; everything funnels through the control handlers
/// at build time, so out-of-range numbers clamp the same way panel entries
/// do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub center_frequency_hz: f64,
    pub span_hz: f64,
    pub reference_level_dbm: f64,
    pub tx_tap: TapPoint,
    pub rx_tap: TapPoint,
    pub locked_control: Option<EntryTarget>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            center_frequency_hz: 1.2e9,
            span_hz: 100.0e6,
            reference_level_dbm: 0.0,
            tx_tap: TapPoint::TxIf,
            rx_tap: TapPoint::RxIf,
            locked_control: None,
        }
    }
}

/// A whole training station as loaded from TOML.
///
/// Every table is optional; an empty file builds the default Ku-band
/// station with no carriers on either side.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub title: String,
    pub display_seed: u64,
    pub buc: BucState,
    pub hpa: HpaState,
    pub omt: OmtState,
    pub lnb: LnbState,
    pub if_filter: IfFilterState,
    pub gpsdo: GpsdoState,
    pub antenna: AntennaConfig,
    pub modem: ModemConfig,
    pub analyzer: AnalyzerConfig,
    pub tx_carriers: Vec<CarrierConfig>,
    pub rx_carriers: Vec<CarrierConfig>,
}

impl StationConfig {
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading station config");
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: StationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Wiring checks that should fail fast rather than clamp: taps on the
    /// wrong sides and carriers no module could ever carry.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.analyzer.tx_tap.is_tx_side() || self.analyzer.rx_tap.is_tx_side() {
            return Err(ConfigError::TapSideConflict {
                tx: self.analyzer.tx_tap,
                rx: self.analyzer.rx_tap,
            });
        }
        for carrier in &self.tx_carriers {
            if carrier.frequency_hz < TX_CARRIER_MIN_HZ || carrier.frequency_hz > TX_CARRIER_MAX_HZ
            {
                return Err(ConfigError::CarrierOutOfBand {
                    frequency_hz: carrier.frequency_hz,
                    band: "L-band transmit IF",
                });
            }
        }
        for carrier in &self.rx_carriers {
            if carrier.frequency_hz < RX_CARRIER_MIN_HZ || carrier.frequency_hz > RX_CARRIER_MAX_HZ
            {
                return Err(ConfigError::CarrierOutOfBand {
                    frequency_hz: carrier.frequency_hz,
                    band: "Ku-band downlink",
                });
            }
        }
        Ok(())
    }
}
