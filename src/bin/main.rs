//! CLI binary for Live Tracker
//!
//! Replays recorded widget sessions through the library and exports the
//! resulting trails.

use anyhow::{Context, Result};
use clap::{Arg, Command};
use glob::glob;
use live_tracker::{
    export_trails, read_event_log, replay, ExportOptions, NumericPolicy, OverlayContent,
    ReplayOptions, TrackerConfig,
};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let long_version = format!(
        "{} ({} {}, built {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
        option_env!("VERGEN_GIT_COMMIT_DATE").unwrap_or("unknown"),
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown"),
    );

    let matches = Command::new("Live Tracker")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .about("Replay recorded tracker widget sessions. Output trails to GPX/GeoJSON.")
        .arg(
            Arg::new("files")
                .help("Event logs to replay (JSON lines, .jsonl/.ndjson/.log, supports globbing)")
                .required(true)
                .num_args(1..)
                .index(1),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug output and detailed event handling information")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("gpx")
                .long("gpx")
                .help("Export recorded trail segments and history trail to GPX")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("geojson")
                .long("geojson")
                .help("Export recorded trail segments and history trail to GeoJSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .help("Directory for exported files (default: same as input file)")
                .value_name("DIR"),
        )
        .arg(
            Arg::new("permissive")
                .long("permissive")
                .help("Store NaN for non-numeric telemetry values instead of rejecting them")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("auto-tick")
                .long("auto-tick")
                .help("Run the presentation tick after every values event")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let debug = matches.get_flag("debug");
    init_tracing(debug);

    let mut config = TrackerConfig::from_env();
    if matches.get_flag("permissive") {
        config.numeric_policy = NumericPolicy::Permissive;
    }
    config.validate().context("invalid configuration")?;

    let export_options = ExportOptions {
        gpx: matches.get_flag("gpx"),
        geojson: matches.get_flag("geojson"),
        output_dir: matches.get_one::<String>("output-dir").cloned(),
    };
    let replay_options = ReplayOptions {
        auto_tick: matches.get_flag("auto-tick"),
    };

    let file_patterns: Vec<String> = matches
        .get_many::<String>("files")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    debug!("Input patterns: {file_patterns:?}");

    let valid_paths = collect_paths(&file_patterns);
    if valid_paths.is_empty() {
        eprintln!("Error: No valid files found to process.");
        eprintln!("Supported extensions: .jsonl, .ndjson, .log, .json (case-insensitive)");
        eprintln!("Input patterns were: {file_patterns:?}");
        std::process::exit(1);
    }

    let mut processed_files = 0;
    for (index, path) in valid_paths.iter().enumerate() {
        if index > 0 {
            println!();
        }
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        println!("Processing: {filename}");

        match process_file(path, &config, replay_options, &export_options) {
            Ok(()) => processed_files += 1,
            Err(e) => {
                error!("Error processing {filename}: {e:#}");
                eprintln!("Continuing with next file...");
            }
        }
    }

    if processed_files == 0 {
        eprintln!(
            "Error: No files were successfully processed out of {} files found.",
            valid_paths.len()
        );
        eprintln!("Use --debug flag for more detailed error information.");
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Expand globs and keep existing files with a supported extension
fn collect_paths(patterns: &[String]) -> Vec<PathBuf> {
    let mut valid_paths = Vec::new();

    for pattern in patterns {
        let paths: Vec<PathBuf> = if pattern.contains('*') || pattern.contains('?') {
            match glob(pattern) {
                Ok(glob_iter) => match glob_iter.collect::<Result<Vec<_>, _>>() {
                    Ok(paths) => {
                        debug!("Glob pattern '{pattern}' matched {} files", paths.len());
                        paths
                    }
                    Err(e) => {
                        warn!("Error expanding glob pattern '{pattern}': {e}");
                        continue;
                    }
                },
                Err(e) => {
                    warn!("Invalid glob pattern '{pattern}': {e}");
                    continue;
                }
            }
        } else {
            vec![PathBuf::from(pattern)]
        };

        for path in paths {
            if !path.exists() {
                warn!("File does not exist: {path:?}");
                continue;
            }
            if !has_supported_extension(&path) {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("none");
                warn!("Skipping file with unsupported extension '{ext}': {path:?}");
                continue;
            }
            valid_paths.push(path);
        }
    }

    debug!("Found {} valid files to process", valid_paths.len());
    valid_paths
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = ext.to_ascii_lowercase();
            matches!(ext_lower.as_str(), "jsonl" | "ndjson" | "log" | "json")
        })
        .unwrap_or(false)
}

fn process_file(
    path: &Path,
    config: &TrackerConfig,
    replay_options: ReplayOptions,
    export_options: &ExportOptions,
) -> Result<()> {
    let log = read_event_log(path).with_context(|| format!("reading {}", path.display()))?;
    if log.records.is_empty() {
        anyhow::bail!("no usable records ({} lines skipped)", log.skipped_lines.len());
    }
    if !log.skipped_lines.is_empty() {
        warn!("Skipped malformed lines: {:?}", log.skipped_lines);
    }

    let outcome = replay(&log.records, config, replay_options);

    println!(
        "  Events: {} configuration, {} values, {} histories ({} failed)",
        outcome.stats.configurations,
        outcome.stats.values,
        outcome.stats.histories,
        outcome.stats.failed_events
    );
    println!("  Ticks: {}, map commands: {}", outcome.ticks, outcome.map_commands);
    if outcome.telemetry.has_no_fix() {
        println!("  No position fix received");
    } else {
        for line in OverlayContent::from_telemetry(&outcome.telemetry).lines() {
            println!("  {line}");
        }
    }
    println!(
        "  Trail segments: {}, history points: {}",
        outcome.segments.len(),
        outcome.history.len()
    );

    let report = export_trails(path, &outcome.segments, &outcome.history, export_options)
        .context("exporting trails")?;
    for written in [report.gpx_path, report.geojson_path].into_iter().flatten() {
        info!("Wrote {}", written.display());
    }

    Ok(())
}
