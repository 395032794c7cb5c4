use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bus::{EventPublisher, StationEvent};
use crate::chain::{SignalChain, TapPoint};
use crate::constants::{MAX_TOP_MARKERS, SWEEP_BINS, THERMAL_FLOOR_DBM};
use crate::error::{ConfigError, ConfigResult};
use crate::keypad::EntryTarget;
use crate::marker::{find_peaks, Marker};
use crate::module::clamp_setpoint;
use crate::noisefloor::aggregate_noise_floor;
use crate::render::{RenderTarget, SweepFrame};
use crate::trace::{Trace, TraceMode};
use crate::units::EntryUnit;

pub const MIN_SPAN_HZ: f64 = 100.0;
pub const MAX_FREQUENCY_HZ: f64 = 40.0e9;
pub const MIN_RBW_HZ: f64 = 1.0;
pub const MAX_RBW_HZ: f64 = 10.0e6;

const MIN_AMPLITUDE_GAP_DB: f64 = 1.0;
const DISPLAY_JITTER_SIGMA_DB: f64 = 0.8;

/// Which display surfaces the analyzer is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenMode {
    Spectral,
    Waterfall,
    Both,
}

/// Resolution bandwidth setting. Auto follows the span at one percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionBandwidth {
    Auto,
    Manual(f64),
}

/// Control-panel state of the spectrum analyzer.
///
/// Everything here moves only through the control handlers or `tick`, and a
/// handler publishes on the notification channel only when the struct's
/// value actually changed. Invariants the handlers maintain: the displayed
/// span never reaches below 0 Hz, `max_amplitude_dbm` stays above
/// `min_amplitude_dbm`, and `marker_index` stays inside the peak table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerState {
    pub center_frequency_hz: f64,
    pub span_hz: f64,
    pub rbw: ResolutionBandwidth,
    pub reference_level_dbm: f64,
    pub scale_db_per_div: f64,
    pub min_amplitude_dbm: f64,
    pub max_amplitude_dbm: f64,
    pub screen_mode: ScreenMode,
    pub is_paused: bool,
    pub is_max_hold: bool,
    pub is_min_hold: bool,
    /// 1-based, matching the trace buttons on the panel.
    pub selected_trace: u8,
    pub is_marker_on: bool,
    pub marker_index: Option<usize>,
    pub noise_floor_dbm: f64,
    pub is_internal_noise_floor: bool,
    /// Keypad echo for the panel readout.
    pub input_unit: Option<EntryUnit>,
    pub input_value: String,
    /// Control the trainer has frozen for a guided exercise, if any.
    pub locked_control: Option<EntryTarget>,
    pub monitored_tx_tap: TapPoint,
    pub monitored_rx_tap: TapPoint,
}

impl Default for AnalyzerState {
    fn default() -> Self {
        Self {
            center_frequency_hz: 1.2e9,
            span_hz: 100.0e6,
            rbw: ResolutionBandwidth::Auto,
            reference_level_dbm: 0.0,
            scale_db_per_div: 10.0,
            min_amplitude_dbm: -130.0,
            max_amplitude_dbm: 20.0,
            screen_mode: ScreenMode::Spectral,
            is_paused: false,
            is_max_hold: false,
            is_min_hold: false,
            selected_trace: 1,
            is_marker_on: false,
            marker_index: None,
            noise_floor_dbm: THERMAL_FLOOR_DBM,
            is_internal_noise_floor: true,
            input_unit: None,
            input_value: String::new(),
            locked_control: None,
            monitored_tx_tap: TapPoint::TxIf,
            monitored_rx_tap: TapPoint::RxIf,
        }
    }
}

impl AnalyzerState {
    pub fn start_frequency_hz(&self) -> f64 {
        self.center_frequency_hz - self.span_hz / 2.0
    }

    pub fn stop_frequency_hz(&self) -> f64 {
        self.center_frequency_hz + self.span_hz / 2.0
    }

    pub fn resolved_rbw_hz(&self) -> f64 {
        match self.rbw {
            ResolutionBandwidth::Auto => (self.span_hz / 100.0).clamp(MIN_RBW_HZ, MAX_RBW_HZ),
            ResolutionBandwidth::Manual(hz) => hz,
        }
    }
}

/// The bench spectrum analyzer patched into the station's tap points.
///
/// Owns two render targets so the `Both` screen mode can drive a spectral
/// display and a waterfall at once. The targets are distinct objects with
/// their own hold buffers; a range change reaches only whichever targets
/// the current screen mode addresses, so an idle surface keeps the range it
/// last showed.
pub struct SpectrumAnalyzer {
    state: AnalyzerState,
    traces: [Trace; 3],
    top_markers: Vec<Marker>,
    live_sweep: Vec<f64>,
    rng: StdRng,
    primary: Box<dyn RenderTarget>,
    secondary: Box<dyn RenderTarget>,
    publisher: EventPublisher,
}

impl SpectrumAnalyzer {
    pub fn new(
        state: AnalyzerState,
        primary: Box<dyn RenderTarget>,
        secondary: Box<dyn RenderTarget>,
        display_seed: u64,
        publisher: EventPublisher,
    ) -> Self {
        let mut analyzer = Self {
            state,
            traces: [
                Trace::default(),
                Trace::new(TraceMode::ClearWrite, false, false),
                Trace::new(TraceMode::ClearWrite, false, false),
            ],
            top_markers: Vec::new(),
            live_sweep: Vec::new(),
            rng: StdRng::seed_from_u64(display_seed),
            primary,
            secondary,
            publisher,
        };
        let (start, stop) = (
            analyzer.state.start_frequency_hz(),
            analyzer.state.stop_frequency_hz(),
        );
        analyzer.primary.set_frequency_range(start, stop);
        analyzer.secondary.set_frequency_range(start, stop);
        analyzer
    }

    pub fn state(&self) -> &AnalyzerState {
        &self.state
    }

    pub fn traces(&self) -> &[Trace; 3] {
        &self.traces
    }

    pub fn top_markers(&self) -> &[Marker] {
        &self.top_markers
    }

    /// The marker the knob currently sits on.
    pub fn marker(&self) -> Option<&Marker> {
        self.state.marker_index.and_then(|i| self.top_markers.get(i))
    }

    pub fn live_sweep(&self) -> &[f64] {
        &self.live_sweep
    }

    // --- frequency axis ---

    pub fn set_center_frequency(&mut self, center_hz: f64) {
        let before = self.state.clone();
        self.state.center_frequency_hz =
            clamp_setpoint(center_hz, self.state.span_hz / 2.0, MAX_FREQUENCY_HZ);
        debug!(
            center_frequency_hz = self.state.center_frequency_hz,
            "analyzer center set"
        );
        self.after_range_change(&before);
    }

    pub fn set_span(&mut self, span_hz: f64) {
        let before = self.state.clone();
        let widest = (2.0 * self.state.center_frequency_hz).min(MAX_FREQUENCY_HZ);
        self.state.span_hz = clamp_setpoint(span_hz, MIN_SPAN_HZ, widest);
        debug!(span_hz = self.state.span_hz, "analyzer span set");
        self.after_range_change(&before);
    }

    /// Move the left edge; the right edge stays put.
    pub fn set_start_frequency(&mut self, start_hz: f64) {
        let before = self.state.clone();
        let stop = self.state.stop_frequency_hz();
        let start = clamp_setpoint(start_hz, 0.0, stop - MIN_SPAN_HZ);
        self.state.center_frequency_hz = (start + stop) / 2.0;
        self.state.span_hz = stop - start;
        self.after_range_change(&before);
    }

    /// Move the right edge; the left edge stays put.
    pub fn set_stop_frequency(&mut self, stop_hz: f64) {
        let before = self.state.clone();
        let start = self.state.start_frequency_hz();
        let stop = clamp_setpoint(stop_hz, start + MIN_SPAN_HZ, MAX_FREQUENCY_HZ);
        self.state.center_frequency_hz = (start + stop) / 2.0;
        self.state.span_hz = stop - start;
        self.after_range_change(&before);
    }

    fn after_range_change(&mut self, before: &AnalyzerState) {
        if self.state == *before {
            return;
        }
        let (start, stop) = (
            self.state.start_frequency_hz(),
            self.state.stop_frequency_hz(),
        );
        self.for_active_targets(|target| target.set_frequency_range(start, stop));
        self.publisher.publish(StationEvent::AnalyzerChanged);
    }

    // --- amplitude axis ---

    pub fn set_rbw(&mut self, rbw: ResolutionBandwidth) {
        let before = self.state.clone();
        self.state.rbw = match rbw {
            ResolutionBandwidth::Auto => ResolutionBandwidth::Auto,
            ResolutionBandwidth::Manual(hz) => {
                ResolutionBandwidth::Manual(clamp_setpoint(hz, MIN_RBW_HZ, MAX_RBW_HZ))
            }
        };
        self.finish_control(&before);
    }

    pub fn set_reference_level(&mut self, dbm: f64) {
        let before = self.state.clone();
        self.state.reference_level_dbm = clamp_setpoint(dbm, -150.0, 30.0);
        self.finish_control(&before);
    }

    pub fn set_scale(&mut self, db_per_div: f64) {
        let before = self.state.clone();
        self.state.scale_db_per_div = clamp_setpoint(db_per_div, 1.0, 20.0);
        self.finish_control(&before);
    }

    pub fn set_min_amplitude(&mut self, dbm: f64) {
        let before = self.state.clone();
        self.state.min_amplitude_dbm = clamp_setpoint(
            dbm,
            -200.0,
            self.state.max_amplitude_dbm - MIN_AMPLITUDE_GAP_DB,
        );
        self.finish_control(&before);
    }

    pub fn set_max_amplitude(&mut self, dbm: f64) {
        let before = self.state.clone();
        self.state.max_amplitude_dbm = clamp_setpoint(
            dbm,
            self.state.min_amplitude_dbm + MIN_AMPLITUDE_GAP_DB,
            50.0,
        );
        self.finish_control(&before);
    }

    // --- screens and holds ---

    pub fn set_screen_mode(&mut self, mode: ScreenMode) {
        if self.state.screen_mode == mode {
            return;
        }
        debug!(?mode, "analyzer screen mode set");
        self.state.screen_mode = mode;
        self.publisher.publish(StationEvent::AnalyzerChanged);
    }

    pub fn toggle_pause(&mut self) {
        self.state.is_paused = !self.state.is_paused;
        self.publisher.publish(StationEvent::AnalyzerChanged);
    }

    /// Disabling clears the cumulative buffer on every active surface,
    /// once per enabled-to-disabled transition.
    pub fn set_max_hold(&mut self, enabled: bool) {
        if self.state.is_max_hold == enabled {
            return;
        }
        self.state.is_max_hold = enabled;
        if !enabled {
            self.for_active_targets(|target| target.reset_max_hold());
        }
        self.publisher.publish(StationEvent::AnalyzerChanged);
    }

    pub fn set_min_hold(&mut self, enabled: bool) {
        if self.state.is_min_hold == enabled {
            return;
        }
        self.state.is_min_hold = enabled;
        if !enabled {
            self.for_active_targets(|target| target.reset_min_hold());
        }
        self.publisher.publish(StationEvent::AnalyzerChanged);
    }

    // --- traces ---

    pub fn select_trace(&mut self, slot: u8) -> ConfigResult<()> {
        if !(1..=3).contains(&slot) {
            return Err(ConfigError::UnmappedTrace(slot));
        }
        let before = self.state.clone();
        self.state.selected_trace = slot;
        self.finish_control(&before);
        Ok(())
    }

    pub fn set_trace_mode(&mut self, mode: TraceMode) {
        let trace = self.selected_trace_mut();
        let before = trace.clone();
        trace.set_mode(mode);
        if *self.selected_trace_ref() != before {
            self.publisher.publish(StationEvent::AnalyzerChanged);
        }
    }

    pub fn set_trace_visible(&mut self, visible: bool) {
        let trace = self.selected_trace_mut();
        if trace.is_visible != visible {
            trace.is_visible = visible;
            self.publisher.publish(StationEvent::AnalyzerChanged);
        }
    }

    pub fn set_trace_updating(&mut self, updating: bool) {
        let trace = self.selected_trace_mut();
        if trace.is_updating != updating {
            trace.is_updating = updating;
            self.publisher.publish(StationEvent::AnalyzerChanged);
        }
    }

    fn selected_trace_mut(&mut self) -> &mut Trace {
        &mut self.traces[(self.state.selected_trace - 1) as usize]
    }

    fn selected_trace_ref(&self) -> &Trace {
        &self.traces[(self.state.selected_trace - 1) as usize]
    }

    // --- markers ---

    pub fn set_marker_enabled(&mut self, on: bool) {
        let before = self.state.clone();
        self.state.is_marker_on = on;
        self.state.marker_index = if on && !self.top_markers.is_empty() {
            Some(0)
        } else {
            None
        };
        self.finish_control(&before);
    }

    /// Clamped into the current peak table; inert while the marker is off.
    pub fn set_marker_index(&mut self, index: usize) {
        if !self.state.is_marker_on {
            return;
        }
        let before = self.state.clone();
        self.state.marker_index = if self.top_markers.is_empty() {
            None
        } else {
            Some(index.min(self.top_markers.len() - 1))
        };
        self.finish_control(&before);
    }

    // --- station wiring ---

    /// Patch the analyzer onto one tap per RF side.
    pub fn set_monitored_taps(&mut self, tx: TapPoint, rx: TapPoint) -> ConfigResult<()> {
        if !tx.is_tx_side() || rx.is_tx_side() {
            return Err(ConfigError::TapSideConflict { tx, rx });
        }
        let before = self.state.clone();
        self.state.monitored_tx_tap = tx;
        self.state.monitored_rx_tap = rx;
        self.finish_control(&before);
        Ok(())
    }

    /// Mirror of the keypad readout for the panel display.
    pub fn set_entry_echo(&mut self, unit: Option<EntryUnit>, value: &str) {
        let before = self.state.clone();
        self.state.input_unit = unit;
        self.state.input_value.clear();
        self.state.input_value.push_str(value);
        self.finish_control(&before);
    }

    /// Trainer hook: freeze one numeric control during a guided exercise.
    pub fn set_locked_control(&mut self, control: Option<EntryTarget>) {
        let before = self.state.clone();
        self.state.locked_control = control;
        self.finish_control(&before);
    }

    // --- per-tick refresh ---

    /// Refresh the display from the chain: aggregate the monitored noise
    /// floors, rebuild the live sweep, fold traces, rebuild the peak table,
    /// and advance the active surfaces. A paused analyzer does none of it.
    pub fn tick(&mut self, chain: &SignalChain) {
        if self.state.is_paused {
            return;
        }
        let before = self.state.clone();

        let reading = aggregate_noise_floor(
            chain,
            self.state.monitored_tx_tap,
            self.state.monitored_rx_tap,
        );
        self.state.noise_floor_dbm = reading.floor_dbm;
        self.state.is_internal_noise_floor = reading.is_internal;

        self.rebuild_sweep(chain);
        for trace in &mut self.traces {
            trace.fold(&self.live_sweep);
        }
        self.refresh_markers();
        self.render();

        if self.state != before {
            self.publisher.publish(StationEvent::AnalyzerChanged);
        }
    }

    fn rebuild_sweep(&mut self, chain: &SignalChain) {
        let start = self.state.start_frequency_hz();
        let stop = self.state.stop_frequency_hz();
        let bin_hz = self.state.span_hz / (SWEEP_BINS - 1) as f64;

        self.live_sweep.clear();
        for _ in 0..SWEEP_BINS {
            let z: f64 = self.rng.sample(StandardNormal);
            self.live_sweep
                .push(self.state.noise_floor_dbm + z * DISPLAY_JITTER_SIGMA_DB);
        }

        let mut carriers = chain.signals_at(self.state.monitored_tx_tap);
        carriers.extend(chain.signals_at(self.state.monitored_rx_tap));
        for carrier in carriers {
            if carrier.frequency_hz < start || carrier.frequency_hz > stop {
                continue;
            }
            let bin = (((carrier.frequency_hz - start) / bin_hz).round() as usize)
                .min(SWEEP_BINS - 1);
            if carrier.level_dbm > self.live_sweep[bin] {
                self.live_sweep[bin] = carrier.level_dbm;
            }
        }
    }

    fn refresh_markers(&mut self) {
        let start = self.state.start_frequency_hz();
        let bin_hz = self.state.span_hz / (SWEEP_BINS - 1) as f64;
        let selected = self.selected_trace_ref();
        let source: &[f64] = if selected.is_visible && !selected.is_empty() {
            &selected.amplitudes_dbm
        } else {
            &self.live_sweep
        };
        self.top_markers = find_peaks(start, bin_hz, source, MAX_TOP_MARKERS);
        self.state.marker_index = if !self.state.is_marker_on || self.top_markers.is_empty() {
            None
        } else {
            let current = self.state.marker_index.unwrap_or(0);
            Some(current.min(self.top_markers.len() - 1))
        };
    }

    fn render(&mut self) {
        let frame = SweepFrame {
            start_frequency_hz: self.state.start_frequency_hz(),
            stop_frequency_hz: self.state.stop_frequency_hz(),
            rbw_hz: self.state.resolved_rbw_hz(),
            reference_level_dbm: self.state.reference_level_dbm,
            scale_db_per_div: self.state.scale_db_per_div,
            noise_floor_dbm: self.state.noise_floor_dbm,
            amplitudes_dbm: self.live_sweep.clone(),
            is_max_hold: self.state.is_max_hold,
            is_min_hold: self.state.is_min_hold,
        };
        self.for_active_targets(|target| {
            target.update(&frame);
            target.draw();
        });
    }

    fn for_active_targets(&mut self, mut apply: impl FnMut(&mut dyn RenderTarget)) {
        match self.state.screen_mode {
            ScreenMode::Spectral => apply(self.primary.as_mut()),
            ScreenMode::Waterfall => apply(self.secondary.as_mut()),
            ScreenMode::Both => {
                apply(self.primary.as_mut());
                apply(self.secondary.as_mut());
            }
        }
    }

    fn finish_control(&mut self, before: &AnalyzerState) {
        if self.state != *before {
            self.publisher.publish(StationEvent::AnalyzerChanged);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::buc::{Buc, BucState};
    use crate::bus::EventBus;
    use crate::hpa::{Hpa, HpaState};
    use crate::iffilter::{IfFilter, IfFilterState};
    use crate::lnb::{Lnb, LnbState};
    use crate::omt::{Omt, OmtState};
    use crate::signal::{Signal, SignalKind, SignalOrigin};

    #[derive(Default)]
    struct Recorded {
        ranges: Vec<(f64, f64)>,
        updates: usize,
        draws: usize,
        max_hold_resets: usize,
        min_hold_resets: usize,
        last_frame: Option<SweepFrame>,
    }

    struct RecordingTarget(Rc<RefCell<Recorded>>);

    impl RecordingTarget {
        fn new() -> (Self, Rc<RefCell<Recorded>>) {
            let shared = Rc::new(RefCell::new(Recorded::default()));
            (Self(shared.clone()), shared)
        }
    }

    impl RenderTarget for RecordingTarget {
        fn set_frequency_range(&mut self, min_hz: f64, max_hz: f64) {
            self.0.borrow_mut().ranges.push((min_hz, max_hz));
        }
        fn update(&mut self, frame: &SweepFrame) {
            let mut recorded = self.0.borrow_mut();
            recorded.updates += 1;
            recorded.last_frame = Some(frame.clone());
        }
        fn draw(&mut self) {
            self.0.borrow_mut().draws += 1;
        }
        fn reset_max_hold(&mut self) {
            self.0.borrow_mut().max_hold_resets += 1;
        }
        fn reset_min_hold(&mut self) {
            self.0.borrow_mut().min_hold_resets += 1;
        }
    }

    struct FrontEnd {
        buc: Buc,
        hpa: Hpa,
        omt: Omt,
        lnb: Lnb,
        if_filter: IfFilter,
        antenna_signals: Vec<Signal>,
    }

    fn front_end() -> FrontEnd {
        let bus = EventBus::new();
        let tx_carrier = Signal::new(1.2e9, -20.0, SignalKind::If, SignalOrigin::Internal);
        let rx_carrier = Signal::new(11.95e9, -100.0, SignalKind::Rf, SignalOrigin::External);
        FrontEnd {
            buc: Buc::new(BucState::default(), vec![tx_carrier], bus.publisher()),
            hpa: Hpa::new(HpaState::default(), bus.publisher()),
            omt: Omt::new(OmtState::default(), bus.publisher()),
            lnb: Lnb::new(LnbState::default(), bus.publisher()),
            if_filter: IfFilter::new(IfFilterState::default(), bus.publisher()),
            antenna_signals: vec![rx_carrier],
        }
    }

    fn chain(fe: &FrontEnd) -> SignalChain {
        SignalChain {
            buc: &fe.buc,
            hpa: &fe.hpa,
            omt: &fe.omt,
            lnb: &fe.lnb,
            if_filter: &fe.if_filter,
            antenna_signals: &fe.antenna_signals,
            antenna_noise_floor_dbm: THERMAL_FLOOR_DBM,
            tx_if_noise_floor_dbm: -130.0,
        }
    }

    fn analyzer_with_targets() -> (SpectrumAnalyzer, Rc<RefCell<Recorded>>, Rc<RefCell<Recorded>>) {
        let (primary, primary_log) = RecordingTarget::new();
        let (secondary, secondary_log) = RecordingTarget::new();
        let analyzer = SpectrumAnalyzer::new(
            AnalyzerState::default(),
            Box::new(primary),
            Box::new(secondary),
            7,
            EventBus::new().publisher(),
        );
        (analyzer, primary_log, secondary_log)
    }

    #[test]
    fn center_clamps_so_start_stays_non_negative() {
        let (mut analyzer, _, _) = analyzer_with_targets();
        analyzer.set_center_frequency(10.0);
        assert_eq!(analyzer.state().center_frequency_hz, 50.0e6);
        assert_eq!(analyzer.state().start_frequency_hz(), 0.0);
    }

    #[test]
    fn span_clamps_against_center_and_floor() {
        let (mut analyzer, _, _) = analyzer_with_targets();
        analyzer.set_span(10.0e9);
        assert_eq!(analyzer.state().span_hz, 2.4e9);
        analyzer.set_span(0.0);
        assert_eq!(analyzer.state().span_hz, MIN_SPAN_HZ);
    }

    #[test]
    fn start_entry_holds_the_stop_edge() {
        let (mut analyzer, _, _) = analyzer_with_targets();
        let stop = analyzer.state().stop_frequency_hz();
        analyzer.set_start_frequency(1.0e9);
        assert_eq!(analyzer.state().stop_frequency_hz(), stop);
        assert_eq!(analyzer.state().start_frequency_hz(), 1.0e9);
    }

    #[test]
    fn stop_entry_holds_the_start_edge() {
        let (mut analyzer, _, _) = analyzer_with_targets();
        let start = analyzer.state().start_frequency_hz();
        analyzer.set_stop_frequency(2.0e9);
        assert_eq!(analyzer.state().start_frequency_hz(), start);
        assert_eq!(analyzer.state().stop_frequency_hz(), 2.0e9);
    }

    #[test]
    fn crossing_entries_leave_the_minimum_span() {
        let (mut analyzer, _, _) = analyzer_with_targets();
        let stop = analyzer.state().stop_frequency_hz();
        analyzer.set_start_frequency(stop + 5.0e9);
        assert_eq!(analyzer.state().span_hz, MIN_SPAN_HZ);
        assert_eq!(analyzer.state().stop_frequency_hz(), stop);
    }

    #[test]
    fn amplitude_window_keeps_max_above_min() {
        let (mut analyzer, _, _) = analyzer_with_targets();
        analyzer.set_max_amplitude(-200.0);
        assert_eq!(analyzer.state().max_amplitude_dbm, -129.0);
        analyzer.set_min_amplitude(40.0);
        assert_eq!(analyzer.state().min_amplitude_dbm, -130.0);
    }

    #[test]
    fn auto_rbw_follows_span() {
        let (mut analyzer, _, _) = analyzer_with_targets();
        assert_eq!(analyzer.state().resolved_rbw_hz(), 1.0e6);
        analyzer.set_rbw(ResolutionBandwidth::Manual(30.0e3));
        assert_eq!(analyzer.state().resolved_rbw_hz(), 30.0e3);
    }

    #[test]
    fn tick_paints_carriers_over_the_floor() {
        let fe = front_end();
        let (mut analyzer, primary, _) = analyzer_with_targets();
        analyzer.tick(&chain(&fe));

        // RX IF carrier at 1.2 GHz sits mid-span at -46.7 dBm
        let peak = analyzer
            .live_sweep()
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((peak - (-20.0)).abs() < 1e-9); // TX IF carrier tops the sweep
        assert_eq!(primary.borrow().updates, 1);
        assert_eq!(primary.borrow().draws, 1);
        let frame = primary.borrow().last_frame.clone().unwrap();
        assert_eq!(frame.amplitudes_dbm.len(), SWEEP_BINS);
        // the lit receive chain's floor beats the -130 dBm modem floor
        assert!(frame.noise_floor_dbm > -121.0 && frame.noise_floor_dbm < -118.0);
    }

    #[test]
    fn paused_analyzer_does_not_advance() {
        let fe = front_end();
        let (mut analyzer, primary, _) = analyzer_with_targets();
        analyzer.toggle_pause();
        analyzer.tick(&chain(&fe));
        assert_eq!(primary.borrow().updates, 0);
        // controls still work while paused
        analyzer.set_center_frequency(2.0e9);
        assert_eq!(analyzer.state().center_frequency_hz, 2.0e9);
    }

    #[test]
    fn disabling_max_hold_resets_active_targets_once() {
        let (mut analyzer, primary, secondary) = analyzer_with_targets();
        analyzer.set_max_hold(true);
        analyzer.set_max_hold(false);
        assert_eq!(primary.borrow().max_hold_resets, 1);
        assert_eq!(secondary.borrow().max_hold_resets, 0);

        analyzer.set_max_hold(false); // already off
        assert_eq!(primary.borrow().max_hold_resets, 1);

        analyzer.set_screen_mode(ScreenMode::Both);
        analyzer.set_max_hold(true);
        analyzer.set_max_hold(false);
        assert_eq!(primary.borrow().max_hold_resets, 2);
        assert_eq!(secondary.borrow().max_hold_resets, 1);
    }

    #[test]
    fn disabling_min_hold_resets_exactly_once() {
        let (mut analyzer, primary, _) = analyzer_with_targets();
        analyzer.set_min_hold(true);
        analyzer.set_min_hold(false);
        analyzer.set_min_hold(false);
        assert_eq!(primary.borrow().min_hold_resets, 1);
        assert_eq!(primary.borrow().max_hold_resets, 0);
    }

    #[test]
    fn screen_targets_hold_ranges_independently() {
        let (mut analyzer, primary, secondary) = analyzer_with_targets();
        // spectral mode: only the primary follows the retune
        analyzer.set_center_frequency(2.0e9);
        // waterfall mode: only the secondary follows this one
        analyzer.set_screen_mode(ScreenMode::Waterfall);
        analyzer.set_center_frequency(3.0e9);

        let primary_last = *primary.borrow().ranges.last().unwrap();
        let secondary_last = *secondary.borrow().ranges.last().unwrap();
        assert!((primary_last.0 - (2.0e9 - 50.0e6)).abs() < 1.0);
        assert!((secondary_last.0 - (3.0e9 - 50.0e6)).abs() < 1.0);
        assert_ne!(primary_last, secondary_last);
    }

    #[test]
    fn both_mode_drives_both_surfaces() {
        let fe = front_end();
        let (mut analyzer, primary, secondary) = analyzer_with_targets();
        analyzer.set_screen_mode(ScreenMode::Both);
        analyzer.tick(&chain(&fe));
        assert_eq!(primary.borrow().updates, 1);
        assert_eq!(secondary.borrow().updates, 1);

        analyzer.set_screen_mode(ScreenMode::Spectral);
        analyzer.tick(&chain(&fe));
        assert_eq!(primary.borrow().updates, 2);
        assert_eq!(secondary.borrow().updates, 1);
    }

    #[test]
    fn out_of_range_trace_slot_is_an_error() {
        let (mut analyzer, _, _) = analyzer_with_targets();
        assert!(matches!(
            analyzer.select_trace(0),
            Err(ConfigError::UnmappedTrace(0))
        ));
        assert!(matches!(
            analyzer.select_trace(4),
            Err(ConfigError::UnmappedTrace(4))
        ));
        analyzer.select_trace(2).unwrap();
        assert_eq!(analyzer.state().selected_trace, 2);
    }

    #[test]
    fn trace_controls_reach_only_the_selected_slot() {
        let (mut analyzer, _, _) = analyzer_with_targets();
        analyzer.select_trace(2).unwrap();
        analyzer.set_trace_mode(TraceMode::MaxHold);
        analyzer.set_trace_visible(true);
        analyzer.set_trace_updating(true);
        assert_eq!(analyzer.traces()[1].mode, TraceMode::MaxHold);
        assert_eq!(analyzer.traces()[0].mode, TraceMode::ClearWrite);
    }

    #[test]
    fn marker_index_clamps_into_the_peak_table() {
        let fe = front_end();
        let (mut analyzer, _, _) = analyzer_with_targets();
        analyzer.set_marker_enabled(true);
        analyzer.tick(&chain(&fe));
        let peaks = analyzer.top_markers().len();
        assert!(peaks > 0);

        analyzer.set_marker_index(usize::MAX);
        assert_eq!(analyzer.state().marker_index, Some(peaks - 1));
        assert!(analyzer.marker().is_some());
    }

    #[test]
    fn marker_survives_table_shrink() {
        let fe = front_end();
        let (mut analyzer, _, _) = analyzer_with_targets();
        analyzer.set_marker_enabled(true);
        analyzer.tick(&chain(&fe));
        analyzer.set_marker_index(usize::MAX);
        // next sweep rebuilds the table; the index must stay in range
        analyzer.tick(&chain(&fe));
        let index = analyzer.state().marker_index.unwrap();
        assert!(index < analyzer.top_markers().len());
    }

    #[test]
    fn tap_sides_are_validated() {
        let (mut analyzer, _, _) = analyzer_with_targets();
        assert!(analyzer
            .set_monitored_taps(TapPoint::RxIf, TapPoint::TxIf)
            .is_err());
        analyzer
            .set_monitored_taps(TapPoint::PostHpaPreOmtTxRf, TapPoint::PostLnaRxRf)
            .unwrap();
        assert_eq!(
            analyzer.state().monitored_tx_tap,
            TapPoint::PostHpaPreOmtTxRf
        );
    }

    #[test]
    fn control_publishes_only_on_value_change() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let (primary, _) = RecordingTarget::new();
        let (secondary, _) = RecordingTarget::new();
        let mut analyzer = SpectrumAnalyzer::new(
            AnalyzerState::default(),
            Box::new(primary),
            Box::new(secondary),
            7,
            bus.publisher(),
        );

        analyzer.set_reference_level(0.0); // default already
        assert_eq!(rx.drain().count(), 0);
        analyzer.set_reference_level(-10.0);
        assert_eq!(rx.drain().count(), 1);
        analyzer.set_reference_level(-10.0);
        assert_eq!(rx.drain().count(), 0);
    }

    #[test]
    fn frozen_selected_trace_serves_stale_markers() {
        let fe = front_end();
        let (mut analyzer, _, _) = analyzer_with_targets();
        analyzer.tick(&chain(&fe));
        analyzer.set_trace_updating(false);
        let held = analyzer.traces()[0].amplitudes_dbm.clone();
        analyzer.tick(&chain(&fe));
        assert_eq!(analyzer.traces()[0].amplitudes_dbm, held);
    }
}
