//! Signal-chain and spectrum-analyzer simulation core for satellite
//! ground-station operator training.
//!
//! A [`GroundStation`] owns six equipment modules, the analyzer, and the
//! keypad, and advances them together one tick at a time; nothing in the
//! model reads the wall clock. Subscribe to the station's event bus to
//! learn when observable state changed.

pub mod alarm;
pub mod analyzer;
pub mod buc;
pub mod bus;
pub mod chain;
#[cfg(feature = "cli")]
pub mod cli;
pub mod configfile;
pub mod constants;
pub mod error;
pub mod gpsdo;
pub mod hpa;
pub mod iffilter;
pub mod keypad;
pub mod lnb;
pub mod marker;
pub mod module;
pub mod noisefloor;
pub mod omt;
pub mod render;
#[cfg(feature = "report")]
pub mod report;
pub mod signal;
pub mod station;
pub mod trace;
pub mod units;

pub use alarm::{Alarm, AlarmSeverity};
pub use analyzer::{AnalyzerState, ResolutionBandwidth, ScreenMode, SpectrumAnalyzer};
pub use buc::{Buc, BucState};
pub use bus::{EventBus, EventPublisher, StationEvent};
pub use chain::{SignalChain, TapPoint};
pub use configfile::{CarrierConfig, StationConfig};
pub use error::{ConfigError, ConfigResult};
pub use gpsdo::{Gpsdo, GpsdoState};
pub use hpa::{Hpa, HpaState};
pub use iffilter::{IfFilter, IfFilterState};
pub use keypad::{EntryCommit, EntryTarget, Keypad};
pub use lnb::{Lnb, LnbState};
pub use marker::Marker;
pub use module::{ModuleId, RfModule};
pub use noisefloor::{aggregate_noise_floor, cascade_floor_dbm, NoiseFloorReading, TapNoise};
pub use omt::{Omt, OmtState};
pub use render::{NullRenderTarget, RenderTarget, SweepFrame};
pub use signal::{Signal, SignalKind, SignalOrigin};
pub use station::{GroundStation, StationSnapshot};
pub use trace::{Trace, TraceMode};
pub use units::{EntryUnit, FrequencyUnit};
