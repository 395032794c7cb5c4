use serde::{Deserialize, Serialize};

use crate::chain::{SignalChain, TapPoint};
use crate::constants::THERMAL_FLOOR_DBM;
use crate::signal::SignalOrigin;

/// Noise floor reported at one tap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapNoise {
    pub floor_dbm: f64,
    pub origin: SignalOrigin,
}

impl TapNoise {
    pub fn internal(floor_dbm: f64) -> Self {
        Self {
            floor_dbm,
            origin: SignalOrigin::Internal,
        }
    }

    pub fn external(floor_dbm: f64) -> Self {
        Self {
            floor_dbm,
            origin: SignalOrigin::External,
        }
    }
}

/// Aggregated floor the analyzer displays for its two monitored taps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseFloorReading {
    pub floor_dbm: f64,
    pub is_internal: bool,
    /// Which of the two taps supplied the maximum.
    pub dominant_tap: TapPoint,
}

/// Friis cascade noise figure in dB over `(noise_figure_db, gain_db)` stages:
/// each stage's excess noise factor is divided down by the linear gain ahead
/// of it, so the front of the chain dominates.
fn cascade_noise_figure_db(stages: &[(f64, f64)]) -> f64 {
    let mut cascade_factor = 1.0;
    let mut upstream_gain_linear = 1.0;
    for &(noise_figure_db, gain_db) in stages {
        let stage_factor = rfconversions::noise::noise_factor_from_noise_figure(noise_figure_db);
        cascade_factor += (stage_factor - 1.0) / upstream_gain_linear;
        upstream_gain_linear *= rfconversions::power::db_to_linear(gain_db);
    }
    rfconversions::noise::noise_figure_from_noise_factor(cascade_factor)
}

/// Displayed floor of a lit cascade: thermal plus Friis noise figure plus
/// net gain, all in dB terms.
pub fn cascade_floor_dbm(stages: &[(f64, f64)]) -> f64 {
    if stages.is_empty() {
        return THERMAL_FLOOR_DBM;
    }
    let gain_db: f64 = stages.iter().map(|(_, gain)| gain).sum();
    THERMAL_FLOOR_DBM + cascade_noise_figure_db(stages) + gain_db
}

/// Floor at the end of a module path where some modules may be dark.
///
/// A dark module passes nothing, so stages ahead of it contribute nothing
/// downstream; only the run of lit stages after the last dark one amplifies
/// the thermal floor. An entirely dark (or empty) path sits at thermal.
pub(crate) fn path_floor_dbm(stage_opts: &[Option<(f64, f64)>]) -> f64 {
    let mut lit: Vec<(f64, f64)> = Vec::new();
    for stage in stage_opts {
        match stage {
            Some(stage) => lit.push(*stage),
            None => lit.clear(),
        }
    }
    cascade_floor_dbm(&lit)
}

/// Resolve both monitored taps and keep the louder floor, tagged with the
/// origin of whichever tap supplied it. Ties keep the first tap's origin.
pub fn aggregate_noise_floor(
    chain: &SignalChain,
    tap_a: TapPoint,
    tap_b: TapPoint,
) -> NoiseFloorReading {
    let a = chain.noise_at(tap_a);
    let b = chain.noise_at(tap_b);
    let (winner, tap) = if a.floor_dbm >= b.floor_dbm {
        (a, tap_a)
    } else {
        (b, tap_b)
    };
    NoiseFloorReading {
        floor_dbm: winner.floor_dbm,
        is_internal: winner.origin == SignalOrigin::Internal,
        dominant_tap: tap,
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;
    use crate::buc::{Buc, BucState};
    use crate::bus::EventBus;
    use crate::hpa::{Hpa, HpaState};
    use crate::iffilter::{IfFilter, IfFilterState};
    use crate::lnb::{Lnb, LnbState};
    use crate::omt::{Omt, OmtState};

    #[test]
    fn empty_path_sits_at_thermal() {
        assert_eq!(cascade_floor_dbm(&[]), THERMAL_FLOOR_DBM);
        assert_eq!(path_floor_dbm(&[None, None]), THERMAL_FLOOR_DBM);
    }

    #[test]
    fn single_stage_floor_adds_nf_and_gain() {
        let floor = cascade_floor_dbm(&[(8.0, 30.0)]);
        assert!((floor - (-136.0)).abs() < 1e-6);
    }

    #[test]
    fn dark_stage_discards_everything_upstream() {
        let lit = path_floor_dbm(&[None, Some((10.0, 54.0))]);
        assert!((lit - (THERMAL_FLOOR_DBM + 10.0 + 54.0)).abs() < 1e-6);

        let dark_tail = path_floor_dbm(&[Some((8.0, 30.0)), None]);
        assert_eq!(dark_tail, THERMAL_FLOOR_DBM);
    }

    #[test]
    fn first_stage_dominates_cascade_noise() {
        // low-noise first stage with gain shields the lossy tail
        let quiet_front = cascade_noise_figure_db(&[(0.7, 55.0), (10.0, 20.0)]);
        let noisy_front = cascade_noise_figure_db(&[(10.0, 20.0), (0.7, 55.0)]);
        assert!(quiet_front < noisy_front);
        assert!(quiet_front < 1.0);
    }

    #[test]
    fn aggregate_keeps_the_louder_tap() {
        let bus = EventBus::new();
        let buc = Buc::new(BucState::default(), Vec::new(), bus.publisher());
        let hpa = Hpa::new(HpaState::default(), bus.publisher());
        let omt = Omt::new(OmtState::default(), bus.publisher());
        let lnb = Lnb::new(LnbState::default(), bus.publisher());
        let if_filter = IfFilter::new(IfFilterState::default(), bus.publisher());
        let chain = SignalChain {
            buc: &buc,
            hpa: &hpa,
            omt: &omt,
            lnb: &lnb,
            if_filter: &if_filter,
            antenna_signals: &[],
            antenna_noise_floor_dbm: THERMAL_FLOOR_DBM,
            tx_if_noise_floor_dbm: -90.0,
        };

        // modem floor of -90 dBm at TX IF vs thermal at the feed
        let reading =
            aggregate_noise_floor(&chain, TapPoint::TxIf, TapPoint::PreOmtPostAntRxRf);
        assert_eq!(reading.floor_dbm, -90.0);
        assert!(reading.is_internal);
        assert_eq!(reading.dominant_tap, TapPoint::TxIf);
    }

    #[test]
    fn aggregate_matches_max_for_arbitrary_floors() {
        let bus = EventBus::new();
        let buc = Buc::new(BucState::default(), Vec::new(), bus.publisher());
        let hpa = Hpa::new(HpaState::default(), bus.publisher());
        let omt = Omt::new(OmtState::default(), bus.publisher());
        let lnb = Lnb::new(LnbState::default(), bus.publisher());
        let if_filter = IfFilter::new(IfFilterState::default(), bus.publisher());

        // the modem cable and the sky pass straight through to these two
        // taps, so random floors there exercise the aggregator directly
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let modem = rng.gen_range(-174.0..-60.0);
            let sky = rng.gen_range(-174.0..-60.0);
            let chain = SignalChain {
                buc: &buc,
                hpa: &hpa,
                omt: &omt,
                lnb: &lnb,
                if_filter: &if_filter,
                antenna_signals: &[],
                antenna_noise_floor_dbm: sky,
                tx_if_noise_floor_dbm: modem,
            };
            let reading =
                aggregate_noise_floor(&chain, TapPoint::TxIf, TapPoint::PreOmtPostAntRxRf);
            assert_eq!(reading.floor_dbm, modem.max(sky));
            let expected = if modem >= sky {
                TapPoint::TxIf
            } else {
                TapPoint::PreOmtPostAntRxRf
            };
            assert_eq!(reading.dominant_tap, expected);
        }
    }
}
