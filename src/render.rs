/// One refreshed sweep handed to a display surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepFrame {
    pub start_frequency_hz: f64,
    pub stop_frequency_hz: f64,
    pub rbw_hz: f64,
    pub reference_level_dbm: f64,
    pub scale_db_per_div: f64,
    pub noise_floor_dbm: f64,
    /// Live sweep, one amplitude per bin across the span.
    pub amplitudes_dbm: Vec<f64>,
    /// Whether the surface should keep folding its own cumulative
    /// max/min-hold overlays for this frame.
    pub is_max_hold: bool,
    pub is_min_hold: bool,
}

/// Display surface the analyzer drives.
///
/// Implemented outside the simulation core by whatever draws pixels; the
/// analyzer only promises the call order `set_frequency_range` on a range
/// change, then `update` and `draw` once per advanced tick. Hold overlays
/// accumulate inside the target; disabling a hold resets them through this
/// trait rather than in analyzer state.
pub trait RenderTarget {
    fn set_frequency_range(&mut self, min_hz: f64, max_hz: f64);
    fn update(&mut self, frame: &SweepFrame);
    fn draw(&mut self);
    fn reset_max_hold(&mut self);
    fn reset_min_hold(&mut self);
}

/// Discards everything. Headless runs and the CLI use this.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderTarget;

impl RenderTarget for NullRenderTarget {
    fn set_frequency_range(&mut self, _min_hz: f64, _max_hz: f64) {}
    fn update(&mut self, _frame: &SweepFrame) {}
    fn draw(&mut self) {}
    fn reset_max_hold(&mut self) {}
    fn reset_min_hold(&mut self) {}
}
