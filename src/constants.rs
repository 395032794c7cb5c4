/// Boltzmann constant in J/K (SI units).
pub const BOLTZMANN: f64 = 1.380649e-23;

/// IEEE reference noise temperature in K.
pub const T0_KELVIN: f64 = 290.0;

/// Thermal noise floor at the reference temperature, dBm, as a bench
/// instrument quotes it. Floors default to this when no module reports one.
pub const THERMAL_FLOOR_DBM: f64 = -174.0;

/// Amplitude bins per analyzer sweep.
pub const SWEEP_BINS: usize = 401;

/// Most peaks the marker table will hold after a sweep.
pub const MAX_TOP_MARKERS: usize = 8;
