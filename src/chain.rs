use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buc::Buc;
use crate::hpa::Hpa;
use crate::iffilter::IfFilter;
use crate::lnb::Lnb;
use crate::noisefloor::{path_floor_dbm, TapNoise};
use crate::omt::Omt;
use crate::signal::Signal;

/// The eight places an analyzer can be patched into the station.
///
/// The set is closed on purpose: resolver dispatch is an exhaustive match,
/// so adding a tap without wiring it is a compile error rather than a
/// runtime "unknown tap" branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapPoint {
    TxIf,
    PostBucPreHpaTxRf,
    PostHpaPreOmtTxRf,
    PostOmtPreAntTxRf,
    PreOmtPostAntRxRf,
    PostOmtPreLnaRxRf,
    PostLnaRxRf,
    RxIf,
}

impl TapPoint {
    pub const ALL: [TapPoint; 8] = [
        TapPoint::TxIf,
        TapPoint::PostBucPreHpaTxRf,
        TapPoint::PostHpaPreOmtTxRf,
        TapPoint::PostOmtPreAntTxRf,
        TapPoint::PreOmtPostAntRxRf,
        TapPoint::PostOmtPreLnaRxRf,
        TapPoint::PostLnaRxRf,
        TapPoint::RxIf,
    ];

    /// True for taps on the transmit leg of the chain.
    pub fn is_tx_side(self) -> bool {
        matches!(
            self,
            TapPoint::TxIf
                | TapPoint::PostBucPreHpaTxRf
                | TapPoint::PostHpaPreOmtTxRf
                | TapPoint::PostOmtPreAntTxRf
        )
    }

    /// Front-panel label for the patch selector.
    pub fn label(self) -> &'static str {
        match self {
            TapPoint::TxIf => "TX IF",
            TapPoint::PostBucPreHpaTxRf => "POST-BUC TX RF",
            TapPoint::PostHpaPreOmtTxRf => "POST-HPA TX RF",
            TapPoint::PostOmtPreAntTxRf => "POST-OMT TX RF",
            TapPoint::PreOmtPostAntRxRf => "PRE-OMT RX RF",
            TapPoint::PostOmtPreLnaRxRf => "POST-OMT RX RF",
            TapPoint::PostLnaRxRf => "POST-LNA RX RF",
            TapPoint::RxIf => "RX IF",
        }
    }
}

impl fmt::Display for TapPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Borrowed view over the wired front end for one resolution pass.
///
/// The chain never stores per-tap results; every query walks the modules
/// again, so a reading can never be stale with respect to module state.
/// Each tap delegates to the module that owns that flange.
pub struct SignalChain<'a> {
    pub buc: &'a Buc,
    pub hpa: &'a Hpa,
    pub omt: &'a Omt,
    pub lnb: &'a Lnb,
    pub if_filter: &'a IfFilter,
    /// Carriers arriving over the air at the feed.
    pub antenna_signals: &'a [Signal],
    /// Sky plus antenna noise at the feed, as the panel displays it.
    pub antenna_noise_floor_dbm: f64,
    /// Modem noise on the transmit IF cable.
    pub tx_if_noise_floor_dbm: f64,
}

impl SignalChain<'_> {
    /// Carriers observable at a tap.
    pub fn signals_at(&self, tap: TapPoint) -> Vec<Signal> {
        match tap {
            TapPoint::TxIf => self.buc.input_signals().to_vec(),
            TapPoint::PostBucPreHpaTxRf => self.buc.output_signals(),
            TapPoint::PostHpaPreOmtTxRf => self.hpa.amplify(&self.buc.output_signals()),
            TapPoint::PostOmtPreAntTxRf => {
                self.omt.forward_tx(&self.signals_at(TapPoint::PostHpaPreOmtTxRf))
            }
            TapPoint::PreOmtPostAntRxRf => self.antenna_signals.to_vec(),
            TapPoint::PostOmtPreLnaRxRf => self
                .omt
                .forward_rx(self.antenna_signals, &self.signals_at(TapPoint::PostHpaPreOmtTxRf)),
            TapPoint::PostLnaRxRf => {
                self.lnb.downconvert(&self.signals_at(TapPoint::PostOmtPreLnaRxRf))
            }
            TapPoint::RxIf => self.if_filter.filter(&self.signals_at(TapPoint::PostLnaRxRf)),
        }
    }

    /// Noise floor observable at a tap, with its origin.
    ///
    /// Every tap reports the floor of whichever module owns it, falling back
    /// to the thermal floor on a dark path. Only `RxIf` weighs the antenna's
    /// externally received noise against the receive electronics; everywhere
    /// else the floor is internal by definition.
    pub fn noise_at(&self, tap: TapPoint) -> TapNoise {
        match tap {
            TapPoint::TxIf => TapNoise::internal(self.tx_if_noise_floor_dbm),
            TapPoint::PostBucPreHpaTxRf => TapNoise::internal(path_floor_dbm(&[self.buc.stage()])),
            TapPoint::PostHpaPreOmtTxRf => {
                TapNoise::internal(path_floor_dbm(&[self.buc.stage(), self.hpa.stage()]))
            }
            TapPoint::PostOmtPreAntTxRf => TapNoise::internal(path_floor_dbm(&[
                self.buc.stage(),
                self.hpa.stage(),
                self.omt.stage(),
            ])),
            TapPoint::PreOmtPostAntRxRf => TapNoise::internal(self.antenna_noise_floor_dbm),
            TapPoint::PostOmtPreLnaRxRf => {
                let floor = match self.omt.stage() {
                    Some((_, gain_db)) => self.antenna_noise_floor_dbm + gain_db,
                    None => crate::constants::THERMAL_FLOOR_DBM,
                };
                TapNoise::internal(floor)
            }
            TapPoint::PostLnaRxRf => {
                TapNoise::internal(path_floor_dbm(&[self.omt.stage(), self.lnb.stage()]))
            }
            TapPoint::RxIf => {
                let internal = path_floor_dbm(&[
                    self.omt.stage(),
                    self.lnb.stage(),
                    self.if_filter.stage(),
                ]);
                match self.rx_external_floor_dbm() {
                    Some(external) if external > internal => TapNoise::external(external),
                    _ => TapNoise::internal(internal),
                }
            }
        }
    }

    /// Antenna noise carried through to the receive IF output, or `None`
    /// when any stage on the way is dark.
    fn rx_external_floor_dbm(&self) -> Option<f64> {
        let (_, omt_gain) = self.omt.stage()?;
        let (_, lnb_gain) = self.lnb.stage()?;
        let (_, filter_gain) = self.if_filter.stage()?;
        Some(self.antenna_noise_floor_dbm + omt_gain + lnb_gain + filter_gain)
    }
}
