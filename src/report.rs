use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::chain::TapPoint;
use crate::signal::SignalOrigin;
use crate::station::GroundStation;
use crate::units::scale_frequency;

/// Writes the tap-point lineup, displayed floor, and alarm summary as a
/// static HTML page next to the station file.
pub fn generate_html_report(
    station: &GroundStation,
    title: &str,
    output_path_str: &str,
) -> Result<(), std::io::Error> {
    let path = Path::new(output_path_str);
    let mut file = File::create(path)?;

    writeln!(file, "<!DOCTYPE html>")?;
    writeln!(file, "<html>")?;
    writeln!(file, "<head>")?;
    writeln!(file, "<title>Ground Station Lineup</title>")?;
    writeln!(file, "<style>")?;
    writeln!(file, "table {{ border-collapse: collapse; }}")?;
    writeln!(file, ".lineup {{ width: 100%; }}")?;
    writeln!(file, ".parameters {{ width: auto; }}")?;
    writeln!(file, ".parameters td:nth-child(2) {{ text-align: right; }}")?;
    writeln!(
        file,
        "th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}"
    )?;
    writeln!(file, "th {{ background-color: #f2f2f2; }}")?;
    writeln!(file, "tr:nth-child(even) {{ background-color: #f9f9f9; }}")?;
    writeln!(file, "</style>")?;
    writeln!(file, "</head>")?;
    writeln!(file, "<body>")?;
    writeln!(file, "<h1>Ground Station Lineup</h1>")?;

    writeln!(file, "<h2>Station</h2>")?;
    writeln!(file, "<table class=\"parameters\">")?;
    writeln!(file, "<tr>")?;
    writeln!(file, "<th>Parameter</th>")?;
    writeln!(file, "<th>Value</th>")?;
    writeln!(file, "<th>Unit</th>")?;
    writeln!(file, "</tr>")?;
    writeln!(file, "<tr>")?;
    writeln!(file, "<td>Title</td>")?;
    writeln!(file, "<td>{}</td>", title)?;
    writeln!(file, "<td>-</td>")?;
    writeln!(file, "</tr>")?;
    writeln!(file, "<tr>")?;
    writeln!(file, "<td>Ticks</td>")?;
    writeln!(file, "<td>{}</td>", station.tick_count())?;
    writeln!(file, "<td>-</td>")?;
    writeln!(file, "</tr>")?;

    let reading = station.noise_floor();
    writeln!(file, "<tr>")?;
    writeln!(file, "<td>Displayed Floor</td>")?;
    writeln!(file, "<td>{:.2}</td>", reading.floor_dbm)?;
    writeln!(file, "<td>dBm</td>")?;
    writeln!(file, "</tr>")?;
    writeln!(file, "<tr>")?;
    writeln!(file, "<td>Floor Origin</td>")?;
    writeln!(
        file,
        "<td>{}</td>",
        if reading.is_internal {
            "internal"
        } else {
            "external"
        }
    )?;
    writeln!(file, "<td>-</td>")?;
    writeln!(file, "</tr>")?;
    writeln!(file, "<tr>")?;
    writeln!(file, "<td>Dominant Tap</td>")?;
    writeln!(file, "<td>{}</td>", reading.dominant_tap.label())?;
    writeln!(file, "<td>-</td>")?;
    writeln!(file, "</tr>")?;
    writeln!(file, "</table>")?;
    writeln!(file, "<br>")?;

    writeln!(file, "<h2>Tap Points</h2>")?;
    writeln!(file, "<table class=\"lineup\">")?;
    writeln!(file, "<tr>")?;
    writeln!(file, "<th>Tap</th>")?;
    writeln!(file, "<th>Side</th>")?;
    writeln!(file, "<th>Carriers</th>")?;
    writeln!(file, "<th>Strongest Carrier (dBm)</th>")?;
    writeln!(file, "<th>At Frequency</th>")?;
    writeln!(file, "<th>Noise Floor (dBm)</th>")?;
    writeln!(file, "<th>Floor Origin</th>")?;
    writeln!(file, "</tr>")?;

    for tap in TapPoint::ALL {
        let signals = station.signals_at(tap);
        let noise = station.noise_at(tap);
        let strongest = signals
            .iter()
            .max_by(|a, b| a.level_dbm.total_cmp(&b.level_dbm));

        writeln!(file, "<tr>")?;
        writeln!(file, "<td>{}</td>", tap.label())?;
        writeln!(
            file,
            "<td>{}</td>",
            if tap.is_tx_side() { "TX" } else { "RX" }
        )?;
        writeln!(file, "<td>{}</td>", signals.len())?;
        if let Some(signal) = strongest {
            let (value, unit) = scale_frequency(signal.frequency_hz);
            writeln!(file, "<td>{:.2}</td>", signal.level_dbm)?;
            writeln!(file, "<td>{:.4} {}</td>", value, unit)?;
        } else {
            writeln!(file, "<td>-</td>")?;
            writeln!(file, "<td>-</td>")?;
        }
        writeln!(file, "<td>{:.2}</td>", noise.floor_dbm)?;
        writeln!(
            file,
            "<td>{}</td>",
            match noise.origin {
                SignalOrigin::Internal => "internal",
                SignalOrigin::External => "external",
            }
        )?;
        writeln!(file, "</tr>")?;
    }

    writeln!(file, "</table>")?;
    writeln!(file, "<br>")?;

    writeln!(file, "<h2>Alarms</h2>")?;
    let alarms = station.alarms();
    if alarms.is_empty() {
        writeln!(file, "<p>No active alarms</p>")?;
    } else {
        writeln!(file, "<table class=\"parameters\">")?;
        writeln!(file, "<tr>")?;
        writeln!(file, "<th>Severity</th>")?;
        writeln!(file, "<th>Message</th>")?;
        writeln!(file, "</tr>")?;
        for alarm in &alarms {
            writeln!(file, "<tr>")?;
            writeln!(file, "<td>{:?}</td>", alarm.severity)?;
            writeln!(file, "<td>{}</td>", alarm.message)?;
            writeln!(file, "</tr>")?;
        }
        writeln!(file, "</table>")?;
    }

    writeln!(file, "</body>")?;
    writeln!(file, "</html>")?;

    Ok(())
}
