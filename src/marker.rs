use serde::{Deserialize, Serialize};

/// One entry in the analyzer's peak table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub frequency_hz: f64,
    pub level_dbm: f64,
    pub bin: usize,
}

/// Find the peaks of a sweep, loudest first, at most `limit` entries.
///
/// A peak is a bin strictly above its left neighbor and at least as high as
/// its right neighbor, so a flat-topped carrier yields one marker. Edge bins
/// count; their missing neighbor never outranks them.
pub fn find_peaks(start_hz: f64, bin_hz: f64, amplitudes: &[f64], limit: usize) -> Vec<Marker> {
    let mut peaks: Vec<Marker> = Vec::new();
    for (bin, &level) in amplitudes.iter().enumerate() {
        let left = if bin == 0 {
            f64::NEG_INFINITY
        } else {
            amplitudes[bin - 1]
        };
        let right = if bin + 1 == amplitudes.len() {
            f64::NEG_INFINITY
        } else {
            amplitudes[bin + 1]
        };
        if level > left && level >= right {
            peaks.push(Marker {
                frequency_hz: start_hz + bin as f64 * bin_hz,
                level_dbm: level,
                bin,
            });
        }
    }
    peaks.sort_by(|a, b| b.level_dbm.total_cmp(&a.level_dbm));
    peaks.truncate(limit);
    peaks
}
