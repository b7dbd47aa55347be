//! AVR Tuner CLI Application
//!
//! Replays captured receiver output through the avr-tuner-decoder library.
//! On top of the decoder it adds:
//! - Property change tracking (old→new values) per zone
//! - System parameter bookkeeping (AM step calibration results)
//! - Text and JSON reports of records and queued follow-up commands

use anyhow::{Context, Result};
use avr_tuner_decoder::{TunerDecoder, Zone};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

mod config;
mod report;
mod state;

use config::{AppConfig, OutputFormat};
use report::Reporter;
use state::PropertyTracker;

/// AVR Tuner Decoder - Decode captured receiver tuner notifications
#[derive(Parser, Debug)]
#[command(name = "avr-tuner-cli")]
#[command(about = "Decode AV receiver tuner notifications (FR, PR, SUQ)", long_about = None)]
#[command(version)]
struct Args {
    /// Captured response lines, one per line (default: stdin)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Zone to tag tuner records with (1, 2, 3, z, all)
    #[arg(short, long, value_parser = parse_zone)]
    zone: Option<Zone>,

    /// Output format (overrides the config file)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Also report records that changed nothing
    #[arg(long)]
    show_unchanged: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("AVR Tuner CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", avr_tuner_decoder::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    if let Some(zone) = args.zone {
        config.decoder.default_zone = zone;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    config.output.show_unchanged |= args.show_unchanged;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {:?}", path))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let summary = replay(reader, config, io::stdout().lock())?;
    log::info!(
        "Decoded {} lines into {} records ({} skipped)",
        summary.lines,
        summary.records,
        summary.skipped
    );

    Ok(())
}

/// Decode every line from `reader`, tracking state and reporting to `out`
fn replay<R: BufRead, W: io::Write>(reader: R, config: AppConfig, out: W) -> Result<report::Summary> {
    let mut decoder = TunerDecoder::with_config(config.decoder);
    let mut tracker = PropertyTracker::new(config.params);
    let mut reporter = Reporter::new(out, config.output.format, config.output.show_unchanged);

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        reporter.line_read();

        let records = match decoder.decode_line(&line, tracker.params()) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Line {}: skipping notification: {}", index + 1, e);
                reporter.skipped();
                continue;
            }
        };

        for record in &records {
            let change = tracker.apply(record);
            reporter.record(record, change.as_ref())?;
        }
    }

    reporter.finish()
}

fn parse_zone(s: &str) -> std::result::Result<Zone, String> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "main" => Ok(Zone::Main),
        "2" | "zone2" => Ok(Zone::Zone2),
        "3" | "zone3" => Ok(Zone::Zone3),
        "z" | "hdzone" => Ok(Zone::HdZone),
        "all" => Ok(Zone::All),
        other => Err(format!("unknown zone: {}", other)),
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use avr_tuner_decoder::PARAM_TUNER_AM_FREQ_STEP;

    fn json_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.output.format = OutputFormat::Json;
        config.output.show_unchanged = true;
        config
    }

    #[test]
    fn test_replay_counts_and_skips() {
        let input = "FRF08750\nPRA05\nFRF10110\nPRAxx\nVOL121\n";
        let mut out = Vec::new();

        let summary = replay(input.as_bytes(), json_config(), &mut out).unwrap();

        assert_eq!(summary.lines, 5);
        assert_eq!(summary.skipped, 1);
        // 4 + 1 + 4 records, VOL ignored
        assert_eq!(summary.records, 9);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 9);
    }

    #[test]
    fn test_calibration_result_stops_further_requests() {
        let input = "FRA00531\nSUQ1\nFRA00540\n";
        let mut out = Vec::new();

        let summary = replay(input.as_bytes(), json_config(), &mut out).unwrap();
        assert_eq!(summary.queued_commands, 1);
    }

    #[test]
    fn test_configured_step_suppresses_calibration() {
        let mut config = json_config();
        config.params.set(PARAM_TUNER_AM_FREQ_STEP, 9);
        let mut out = Vec::new();

        let summary = replay("FRA00531\n".as_bytes(), config, &mut out).unwrap();
        assert_eq!(summary.queued_commands, 0);
    }

    #[test]
    fn test_calibration_reports_preloaded_step_as_old_value() {
        let mut config = AppConfig::default();
        config.params.set(PARAM_TUNER_AM_FREQ_STEP, 9);
        let mut out = Vec::new();

        let summary = replay("SUQ1\n".as_bytes(), config, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[ALL] _system_params.tuner_am_frequency_step 9 -> 10 (SUQ \"1\")"));
        assert_eq!(summary.changes, 1);
    }

    #[test]
    fn test_parse_zone() {
        assert_eq!(parse_zone("1"), Ok(Zone::Main));
        assert_eq!(parse_zone("Z"), Ok(Zone::HdZone));
        assert_eq!(parse_zone("ALL"), Ok(Zone::All));
        assert!(parse_zone("4").is_err());
    }
}
