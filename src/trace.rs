use serde::{Deserialize, Serialize};

/// How a trace folds each fresh sweep into its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    ClearWrite,
    MaxHold,
    MinHold,
    Average,
}

/// One of the analyzer's three trace slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub mode: TraceMode,
    pub is_visible: bool,
    pub is_updating: bool,
    pub amplitudes_dbm: Vec<f64>,
    /// Sweeps folded since the mode was last set, used by the running mean.
    samples: u32,
}

impl Trace {
    pub fn new(mode: TraceMode, is_visible: bool, is_updating: bool) -> Self {
        Self {
            mode,
            is_visible,
            is_updating,
            amplitudes_dbm: Vec::new(),
            samples: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes_dbm.is_empty()
    }

    /// Switching mode starts the new regime from scratch.
    pub fn set_mode(&mut self, mode: TraceMode) {
        if self.mode != mode {
            self.mode = mode;
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.amplitudes_dbm.clear();
        self.samples = 0;
    }

    /// Fold one sweep into the buffer per the trace mode. Non-updating
    /// traces hold whatever they last captured. A sweep of a different
    /// length (span change) restarts the buffer.
    pub fn fold(&mut self, sweep: &[f64]) {
        if !self.is_updating {
            return;
        }
        if self.amplitudes_dbm.len() != sweep.len() {
            self.amplitudes_dbm = sweep.to_vec();
            self.samples = 1;
            return;
        }
        match self.mode {
            TraceMode::ClearWrite => {
                self.amplitudes_dbm.copy_from_slice(sweep);
                self.samples = 1;
            }
            TraceMode::MaxHold => {
                for (held, fresh) in self.amplitudes_dbm.iter_mut().zip(sweep) {
                    if *fresh > *held {
                        *held = *fresh;
                    }
                }
                self.samples = self.samples.saturating_add(1);
            }
            TraceMode::MinHold => {
                for (held, fresh) in self.amplitudes_dbm.iter_mut().zip(sweep) {
                    if *fresh < *held {
                        *held = *fresh;
                    }
                }
                self.samples = self.samples.saturating_add(1);
            }
            TraceMode::Average => {
                let n = f64::from(self.samples);
                for (held, fresh) in self.amplitudes_dbm.iter_mut().zip(sweep) {
                    *held = (*held * n + *fresh) / (n + 1.0);
                }
                self.samples = self.samples.saturating_add(1);
            }
        }
    }
}

impl Default for Trace {
    fn default() -> Self {
        Self::new(TraceMode::ClearWrite, true, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_write_replaces_every_sweep() {
        let mut trace = Trace::default();
        trace.fold(&[-100.0, -90.0]);
        trace.fold(&[-110.0, -95.0]);
        assert_eq!(trace.amplitudes_dbm, vec![-110.0, -95.0]);
    }

    #[test]
    fn max_hold_keeps_the_loudest_bins() {
        let mut trace = Trace::new(TraceMode::MaxHold, true, true);
        trace.fold(&[-100.0, -90.0]);
        trace.fold(&[-95.0, -99.0]);
        assert_eq!(trace.amplitudes_dbm, vec![-95.0, -90.0]);
    }

    #[test]
    fn min_hold_keeps_the_quietest_bins() {
        let mut trace = Trace::new(TraceMode::MinHold, true, true);
        trace.fold(&[-100.0, -90.0]);
        trace.fold(&[-95.0, -99.0]);
        assert_eq!(trace.amplitudes_dbm, vec![-100.0, -99.0]);
    }

    #[test]
    fn average_converges_on_the_mean() {
        let mut trace = Trace::new(TraceMode::Average, true, true);
        trace.fold(&[-100.0]);
        trace.fold(&[-90.0]);
        assert_eq!(trace.amplitudes_dbm, vec![-95.0]);
        trace.fold(&[-95.0]);
        assert_eq!(trace.amplitudes_dbm, vec![-95.0]);
    }

    #[test]
    fn mode_change_restarts_accumulation() {
        let mut trace = Trace::new(TraceMode::MaxHold, true, true);
        trace.fold(&[-50.0]);
        trace.set_mode(TraceMode::Average);
        assert!(trace.is_empty());
        trace.fold(&[-90.0]);
        assert_eq!(trace.amplitudes_dbm, vec![-90.0]);
    }

    #[test]
    fn setting_the_same_mode_keeps_the_buffer() {
        let mut trace = Trace::new(TraceMode::MaxHold, true, true);
        trace.fold(&[-50.0]);
        trace.set_mode(TraceMode::MaxHold);
        assert_eq!(trace.amplitudes_dbm, vec![-50.0]);
    }

    #[test]
    fn frozen_trace_ignores_sweeps() {
        let mut trace = Trace::default();
        trace.fold(&[-100.0]);
        trace.is_updating = false;
        trace.fold(&[-40.0]);
        assert_eq!(trace.amplitudes_dbm, vec![-100.0]);
    }

    #[test]
    fn span_change_restarts_the_buffer() {
        let mut trace = Trace::new(TraceMode::MaxHold, true, true);
        trace.fold(&[-100.0, -90.0]);
        trace.fold(&[-80.0, -80.0, -80.0]);
        assert_eq!(trace.amplitudes_dbm, vec![-80.0, -80.0, -80.0]);
    }
}
