//! Replay Demo
//!
//! Replays a recorded widget session (JSON lines) and exports the trails to
//! GPX and GeoJSON. Without arguments it replays `demos/sample_session.jsonl`.

use live_tracker::{
    export_trails, read_event_log, replay, ExportOptions, OverlayContent, ReplayOptions,
    TrackerConfig,
};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    // Get input file from command line or fall back to the bundled sample
    let input_file = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/sample_session.jsonl")));

    // Get optional output directory from command line
    let output_dir = std::env::args().nth(2);

    let export_opts = ExportOptions {
        gpx: true,
        geojson: true,
        output_dir,
    };

    println!("Replaying: {}", input_file.display());
    let log = read_event_log(&input_file)?;
    if !log.skipped_lines.is_empty() {
        println!("  Skipped lines: {:?}", log.skipped_lines);
    }

    let config = TrackerConfig::from_env();
    let outcome = replay(&log.records, &config, ReplayOptions::default());

    println!("\nSession:");
    println!("  Ticks: {}", outcome.ticks);
    println!("  History points: {}", outcome.history.len());
    for line in OverlayContent::from_telemetry(&outcome.telemetry).lines() {
        println!("  {line}");
    }

    println!("\nTrail segments:");
    for (index, segment) in outcome.segments.iter().enumerate() {
        println!("  #{index}: {} points in {}", segment.len(), segment.color);
    }

    let report = export_trails(&input_file, &outcome.segments, &outcome.history, &export_opts)?;
    match (report.gpx_path, report.geojson_path) {
        (None, None) => println!("\n⊘ Nothing to export"),
        (gpx, geojson) => {
            for path in [gpx, geojson].into_iter().flatten() {
                println!("✓ Wrote {}", path.display());
            }
        }
    }

    Ok(())
}
