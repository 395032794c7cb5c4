use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::alarm::Alarm;
use crate::analyzer::{AnalyzerState, SpectrumAnalyzer};
use crate::buc::{Buc, BucState};
use crate::bus::{EventBus, StationEvent};
use crate::chain::{SignalChain, TapPoint};
use crate::configfile::{CarrierConfig, StationConfig};
use crate::error::ConfigResult;
use crate::gpsdo::{Gpsdo, GpsdoState};
use crate::hpa::{Hpa, HpaState};
use crate::iffilter::{IfFilter, IfFilterState};
use crate::keypad::{EntryCommit, EntryTarget, Keypad};
use crate::lnb::{Lnb, LnbState};
use crate::module::{ModuleId, RfModule};
use crate::noisefloor::{aggregate_noise_floor, NoiseFloorReading, TapNoise};
use crate::omt::{Omt, OmtState};
use crate::render::{NullRenderTarget, RenderTarget};
use crate::signal::{Signal, SignalKind, SignalOrigin};
use crate::trace::Trace;
use crate::units::EntryUnit;

/// The whole training station: six equipment modules, the analyzer, the
/// keypad, and the feed environment, advanced one tick at a time.
///
/// Module fields are public so exercises can poke individual boxes
/// directly (pull the GPS fix, power-cycle the HPA); everything routed
/// through the keypad goes through [`GroundStation::commit_entry`] so the
/// locked-control check cannot be bypassed from the panel.
pub struct GroundStation {
    pub buc: Buc,
    pub hpa: Hpa,
    pub omt: Omt,
    pub lnb: Lnb,
    pub if_filter: IfFilter,
    pub gpsdo: Gpsdo,
    pub analyzer: SpectrumAnalyzer,
    keypad: Keypad,
    antenna_signals: Vec<Signal>,
    antenna_noise_floor_dbm: f64,
    tx_if_noise_floor_dbm: f64,
    tick_count: u64,
    bus: EventBus,
}

/// Serializable snapshot of everything the panel shows, for saving an
/// exercise mid-run or asserting on it from a harness. Alarms are not
/// included; they derive from module state and would go stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSnapshot {
    pub tick: u64,
    pub buc: BucState,
    pub hpa: HpaState,
    pub omt: OmtState,
    pub lnb: LnbState,
    pub if_filter: IfFilterState,
    pub gpsdo: GpsdoState,
    pub analyzer: AnalyzerState,
    pub traces: [Trace; 3],
}

fn carrier_signals(carriers: &[CarrierConfig], kind: SignalKind, origin: SignalOrigin) -> Vec<Signal> {
    carriers
        .iter()
        .map(|carrier| Signal::new(carrier.frequency_hz, carrier.level_dbm, kind, origin))
        .collect()
}

impl GroundStation {
    /// Builds a station from a validated config, with the two supplied
    /// render targets wired to the analyzer.
    pub fn new(
        config: StationConfig,
        primary: Box<dyn RenderTarget>,
        secondary: Box<dyn RenderTarget>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        info!(title = %config.title, "building ground station");

        let bus = EventBus::new();
        let tx_signals =
            carrier_signals(&config.tx_carriers, SignalKind::If, SignalOrigin::Internal);
        let antenna_signals =
            carrier_signals(&config.rx_carriers, SignalKind::Rf, SignalOrigin::External);

        let gpsdo = Gpsdo::new(config.gpsdo, bus.publisher());
        let mut buc = Buc::new(config.buc, tx_signals, bus.publisher());
        let hpa = Hpa::new(config.hpa, bus.publisher());
        let omt = Omt::new(config.omt, bus.publisher());
        let mut lnb = Lnb::new(config.lnb, bus.publisher());
        let if_filter = IfFilter::new(config.if_filter, bus.publisher());

        // Bring the synthesizer locks in line with the reference before the
        // first tick, so a pre-tick chain read is already consistent.
        let reference = gpsdo.reference_available();
        buc.set_ext_ref_locked(reference);
        lnb.set_ext_ref_locked(reference);

        let mut analyzer = SpectrumAnalyzer::new(
            AnalyzerState::default(),
            primary,
            secondary,
            config.display_seed,
            bus.publisher(),
        );
        // Route the configured setup through the control handlers so file
        // values clamp exactly like panel entries. Span first: the center
        // clamp depends on it.
        analyzer.set_span(config.analyzer.span_hz);
        analyzer.set_center_frequency(config.analyzer.center_frequency_hz);
        analyzer.set_reference_level(config.analyzer.reference_level_dbm);
        analyzer.set_monitored_taps(config.analyzer.tx_tap, config.analyzer.rx_tap)?;
        analyzer.set_locked_control(config.analyzer.locked_control);

        Ok(Self {
            buc,
            hpa,
            omt,
            lnb,
            if_filter,
            gpsdo,
            analyzer,
            keypad: Keypad::new(),
            antenna_signals,
            antenna_noise_floor_dbm: config.antenna.noise_floor_dbm,
            tx_if_noise_floor_dbm: config.modem.tx_if_noise_floor_dbm,
            tick_count: 0,
            bus,
        })
    }

    /// Builds a station with no display attached, for harnesses and batch
    /// runs.
    pub fn headless(config: StationConfig) -> ConfigResult<Self> {
        Self::new(
            config,
            Box::new(NullRenderTarget),
            Box::new(NullRenderTarget),
        )
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Advances the whole station by one tick: reference distribution,
    /// module thermals, HPA drive sampling, then the analyzer sweep.
    pub fn tick(&mut self) {
        self.gpsdo.tick();
        let reference = self.gpsdo.reference_available();
        self.buc.set_ext_ref_locked(reference);
        self.lnb.set_ext_ref_locked(reference);

        self.buc.tick();
        self.hpa.tick();
        self.omt.tick();
        self.lnb.tick();
        self.if_filter.tick();

        let drive = self
            .buc
            .output_signals()
            .iter()
            .map(|signal| signal.level_dbm)
            .reduce(f64::max);
        self.hpa.set_drive_level(drive);

        let chain = SignalChain {
            buc: &self.buc,
            hpa: &self.hpa,
            omt: &self.omt,
            lnb: &self.lnb,
            if_filter: &self.if_filter,
            antenna_signals: &self.antenna_signals,
            antenna_noise_floor_dbm: self.antenna_noise_floor_dbm,
            tx_if_noise_floor_dbm: self.tx_if_noise_floor_dbm,
        };
        self.analyzer.tick(&chain);

        self.tick_count += 1;
        self.bus.publish(StationEvent::TickCompleted {
            tick: self.tick_count,
        });
    }

    /// Borrowed view over the RF path for ad-hoc reads between ticks.
    pub fn chain(&self) -> SignalChain<'_> {
        SignalChain {
            buc: &self.buc,
            hpa: &self.hpa,
            omt: &self.omt,
            lnb: &self.lnb,
            if_filter: &self.if_filter,
            antenna_signals: &self.antenna_signals,
            antenna_noise_floor_dbm: self.antenna_noise_floor_dbm,
            tx_if_noise_floor_dbm: self.tx_if_noise_floor_dbm,
        }
    }

    pub fn signals_at(&self, tap: TapPoint) -> Vec<Signal> {
        self.chain().signals_at(tap)
    }

    pub fn noise_at(&self, tap: TapPoint) -> TapNoise {
        self.chain().noise_at(tap)
    }

    /// Aggregate floor over the two monitored taps, as the panel shows it.
    pub fn noise_floor(&self) -> NoiseFloorReading {
        let state = self.analyzer.state();
        aggregate_noise_floor(
            &self.chain(),
            state.monitored_tx_tap,
            state.monitored_rx_tap,
        )
    }

    pub fn module(&self, id: ModuleId) -> &dyn RfModule {
        match id {
            ModuleId::Buc => &self.buc,
            ModuleId::Hpa => &self.hpa,
            ModuleId::Lnb => &self.lnb,
            ModuleId::Omt => &self.omt,
            ModuleId::IfFilter => &self.if_filter,
            ModuleId::Gpsdo => &self.gpsdo,
        }
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut dyn RfModule {
        match id {
            ModuleId::Buc => &mut self.buc,
            ModuleId::Hpa => &mut self.hpa,
            ModuleId::Lnb => &mut self.lnb,
            ModuleId::Omt => &mut self.omt,
            ModuleId::IfFilter => &mut self.if_filter,
            ModuleId::Gpsdo => &mut self.gpsdo,
        }
    }

    pub fn set_power(&mut self, id: ModuleId, on: bool) {
        self.module_mut(id).handle_power_toggle(on);
    }

    /// Scenario control: change what the sky looks like at the feed.
    pub fn set_antenna_noise_floor(&mut self, noise_floor_dbm: f64) {
        debug!(noise_floor_dbm, "antenna noise floor changed");
        self.antenna_noise_floor_dbm = noise_floor_dbm;
    }

    /// Scenario control: replace the carriers arriving over the air, e.g.
    /// to inject an interferer mid-exercise.
    pub fn set_antenna_carriers(&mut self, carriers: &[CarrierConfig]) {
        debug!(count = carriers.len(), "antenna carriers replaced");
        self.antenna_signals =
            carrier_signals(carriers, SignalKind::Rf, SignalOrigin::External);
    }

    /// All module alarms in wiring order, reference first.
    pub fn alarms(&self) -> Vec<Alarm> {
        let mut alarms = self.gpsdo.alarms();
        alarms.extend(self.buc.alarms());
        alarms.extend(self.hpa.alarms());
        alarms.extend(self.omt.alarms());
        alarms.extend(self.lnb.alarms());
        alarms.extend(self.if_filter.alarms());
        alarms
    }

    pub fn subscribe(&self) -> flume::Receiver<StationEvent> {
        self.bus.subscribe()
    }

    pub fn snapshot(&self) -> StationSnapshot {
        StationSnapshot {
            tick: self.tick_count,
            buc: self.buc.state().clone(),
            hpa: self.hpa.state().clone(),
            omt: self.omt.state().clone(),
            lnb: self.lnb.state().clone(),
            if_filter: self.if_filter.state().clone(),
            gpsdo: self.gpsdo.state().clone(),
            analyzer: self.analyzer.state().clone(),
            traces: self.analyzer.traces().clone(),
        }
    }

    // Keypad surface. Every press re-echoes the accumulator onto the
    // analyzer readout.

    pub fn bind_entry_target(&mut self, target: EntryTarget) {
        self.keypad.bind_target(target);
        self.sync_entry_echo();
    }

    pub fn press_digit(&mut self, digit: u8) {
        self.keypad.press_digit(digit);
        self.sync_entry_echo();
    }

    pub fn press_decimal(&mut self) {
        self.keypad.press_decimal();
        self.sync_entry_echo();
    }

    pub fn press_backspace(&mut self) {
        self.keypad.press_backspace();
        self.sync_entry_echo();
    }

    pub fn press_clear(&mut self) {
        self.keypad.press_clear();
        self.sync_entry_echo();
    }

    pub fn select_unit(&mut self, unit: EntryUnit) {
        self.keypad.select_unit(unit);
        self.sync_entry_echo();
    }

    /// Applies the pending entry, unless the trainer has locked that
    /// control for the current exercise.
    pub fn commit_entry(&mut self) {
        let commit = self.keypad.commit();
        self.sync_entry_echo();
        let Some(commit) = commit else {
            return;
        };
        if self.analyzer.state().locked_control == Some(commit.target) {
            debug!(target = ?commit.target, "entry refused, control is locked");
            return;
        }
        self.apply_entry(commit);
    }

    fn sync_entry_echo(&mut self) {
        let unit = self.keypad.unit();
        let value = self.keypad.display().to_string();
        self.analyzer.set_entry_echo(unit, &value);
    }

    fn apply_entry(&mut self, commit: EntryCommit) {
        info!(target = ?commit.target, value = commit.value, "applying keypad entry");
        match commit.target {
            EntryTarget::CenterFrequency => self.analyzer.set_center_frequency(commit.value),
            EntryTarget::StartFrequency => self.analyzer.set_start_frequency(commit.value),
            EntryTarget::StopFrequency => self.analyzer.set_stop_frequency(commit.value),
            EntryTarget::Span => self.analyzer.set_span(commit.value),
            EntryTarget::ReferenceLevel => self.analyzer.set_reference_level(commit.value),
            EntryTarget::MinAmplitude => self.analyzer.set_min_amplitude(commit.value),
            EntryTarget::MaxAmplitude => self.analyzer.set_max_amplitude(commit.value),
            EntryTarget::ModuleGain(id) => self.module_mut(id).handle_gain_change(commit.value),
            EntryTarget::ModuleLoFrequency(id) => {
                self.module_mut(id).handle_lo_frequency_change(commit.value)
            }
            EntryTarget::ModuleBackOff(id) => {
                self.module_mut(id).handle_back_off_change(commit.value)
            }
        }
    }
}
