use std::process;

use crate::chain::TapPoint;
use crate::configfile::StationConfig;
use crate::signal::SignalOrigin;
use crate::station::GroundStation;
use crate::units::scale_frequency;

/// Default run length: long enough for a cold GPSDO to warm up and the
/// amplifier thermals to settle.
pub const DEFAULT_TICKS: u64 = 120;

pub struct Cli {
    pub config_path: String,
    pub ticks: u64,
}

impl Cli {
    pub fn run(args: &[String]) -> Result<Cli, Box<dyn std::error::Error>> {
        if args.len() < 2 {
            return Err("not enough arguments".into());
        }

        // Check for special flags
        match args[1].as_str() {
            "--version" | "-v" => {
                print_version();
                process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            _ => {
                if args.len() > 3 {
                    return Err(
                        "too many arguments, expecting `earthstation <FILE_PATH> [TICKS]`".into(),
                    );
                }
            }
        }

        let config_path = args[1].clone();
        let ticks: u64 = match args.get(2) {
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("TICKS must be a whole number, got `{raw}`"))?,
            None => DEFAULT_TICKS,
        };

        println!("Station Config: {}", config_path);
        let config = StationConfig::load(&config_path)?;
        let title = if config.title.is_empty() {
            config_path.clone()
        } else {
            config.title.clone()
        };

        let mut station = GroundStation::headless(config)?;
        for _ in 0..ticks {
            station.tick();
        }

        print_station(&station);

        #[cfg(feature = "report")]
        {
            let output_html_path = report_path(&config_path);
            println!("Generating HTML report at: {}", output_html_path);
            if let Err(e) = crate::report::generate_html_report(&station, &title, &output_html_path)
            {
                eprintln!("Error generating HTML report: {}", e);
            }
        }
        #[cfg(not(feature = "report"))]
        let _ = title;

        Ok(Cli { config_path, ticks })
    }
}

/// `station.toml` reports to `station.html`; anything else just gets
/// `.html` appended.
#[cfg(feature = "report")]
fn report_path(config_path: &str) -> String {
    match config_path.strip_suffix(".toml") {
        Some(stem) => format!("{}.html", stem),
        None => format!("{}.html", config_path),
    }
}

pub fn print_version() {
    println!("earthstation {}", env!("CARGO_PKG_VERSION"));
}

pub fn print_error(error: &str) {
    const RED: &str = "\x1b[31m";
    const RESET: &str = "\x1b[0m";
    println!("{}Problem parsing arguments: {error}{}", RED, RESET);
}

pub fn print_help() {
    // ANSI color codes
    const BOLD: &str = "\x1b[1m";
    const CYAN: &str = "\x1b[36m";
    const GREEN: &str = "\x1b[32m";
    const YELLOW: &str = "\x1b[33m";
    const RESET: &str = "\x1b[0m";

    println!("📡 Earthstation ground-station RF trainer{}", RESET);
    println!();
    println!("{}{}VERSION:{}", BOLD, YELLOW, RESET);
    println!("    {}{}{}", GREEN, env!("CARGO_PKG_VERSION"), RESET);
    println!();
    println!("{}{}USAGE:{}", BOLD, YELLOW, RESET);
    println!("    {} earthstation <FILE_PATH> [TICKS]{}", GREEN, RESET);
    println!();
    println!("     FILE_PATH: path to a toml station file");
    println!("     TICKS:     how many ticks to advance the station (default {})", DEFAULT_TICKS);
    println!();
    println!("     The station file is parsed, the simulation is advanced, and the");
    println!("     tap-point lineup with alarms is printed. An HTML report is written");
    println!("     next to the station file.");
    println!();
    println!("{}{}OPTIONS:{}", BOLD, YELLOW, RESET);
    println!(
        "    {}  -v, --version{}{}    Print version information",
        GREEN, RESET, RESET
    );
    println!(
        "    {}  -h, --help{}{}       Print help information",
        GREEN, RESET, RESET
    );
    println!();
    println!("{}{}EXAMPLES:{}", BOLD, YELLOW, RESET);
    println!("    {} # Run a station file for the default tick count{}", CYAN, RESET);
    println!("    {} earthstation files/ku_station.toml{}", GREEN, RESET);
    println!();
    println!("    {} # Watch the GPSDO warm up tick by tick{}", CYAN, RESET);
    println!("    {} earthstation files/cold_start.toml 10{}", GREEN, RESET);
    println!();
}

fn origin_label(origin: SignalOrigin) -> &'static str {
    match origin {
        SignalOrigin::Internal => "internal",
        SignalOrigin::External => "external",
    }
}

pub fn print_station(station: &GroundStation) {
    println!();
    println!("Lineup after {} ticks:", station.tick_count());
    for tap in TapPoint::ALL {
        let noise = station.noise_at(tap);
        let signals = station.signals_at(tap);

        println!("\n{}", tap.label());
        // the formatting `{:>8.2}` aligns positive and negative numbers on
        // the decimal, with two digits after the decimal
        println!(
            "Noise Floor:\t{:>8.2} dBm  ({})",
            noise.floor_dbm,
            origin_label(noise.origin)
        );
        if signals.is_empty() {
            println!("Carriers:\tnone");
        }
        for signal in &signals {
            let (value, unit) = scale_frequency(signal.frequency_hz);
            println!(
                "Carrier:\t{:>8.2} dBm at {:.4} {}",
                signal.level_dbm, value, unit
            );
        }
    }

    println!();
    println!("Displayed Floor Summary:");
    println!("------------------------");
    let reading = station.noise_floor();
    let origin = if reading.is_internal {
        "internal"
    } else {
        "external"
    };
    println!(
        "Floor:\t{:>8.2} dBm ({}, dominated by {})",
        reading.floor_dbm,
        origin,
        reading.dominant_tap.label()
    );

    println!();
    println!("Alarm Summary:");
    println!("--------------");
    let alarms = station.alarms();
    if alarms.is_empty() {
        println!("No active alarms");
    }
    for alarm in &alarms {
        println!("{}", alarm);
    }
    println!();
}
