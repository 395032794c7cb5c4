use crate::chain::TapPoint;

/// Wiring and configuration failures.
///
/// These indicate a developer or config-file bug and fail fast. Operator
/// input never produces one: malformed keypad entries default to zero and
/// out-of-range setpoints clamp, per the forgiving-instrument contract.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("trace slot {0} does not exist (traces are numbered 1-3)")]
    UnmappedTrace(u8),

    #[error("monitored taps {tx} and {rx} must sit on opposite RF sides")]
    TapSideConflict { tx: TapPoint, rx: TapPoint },

    #[error("carrier at {frequency_hz} Hz falls outside the {band} band")]
    CarrierOutOfBand { frequency_hz: f64, band: &'static str },

    #[error("station config io: {0}")]
    Io(#[from] std::io::Error),

    #[error("station config parse: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
