//! Export functionality for trails
//!
//! Writes the recorded trail segments and the history trail of a replayed
//! session to GPX or GeoJSON files next to the input (or into `output_dir`).

use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::TrackerError;
use crate::surface::PolylineStyle;
use crate::types::{GeoPoint, HistoryTrail, TrailSegment};
use crate::Result;

/// Export options for controlling output formats
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub gpx: bool,
    pub geojson: bool,
    pub output_dir: Option<String>,
}

/// Paths written by [`export_trails`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub gpx_path: Option<PathBuf>,
    pub geojson_path: Option<PathBuf>,
}

/// `<output_dir>/<input stem><suffix>`, creating the output directory if needed
pub fn compute_export_path(
    input_path: &Path,
    export_options: &ExportOptions,
    suffix: &str,
) -> Result<PathBuf> {
    let base_name = input_path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("session");

    let output_dir = match export_options.output_dir.as_deref() {
        Some(dir) => PathBuf::from(dir),
        None => input_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&output_dir)?;

    Ok(output_dir.join(format!("{base_name}{suffix}")))
}

/// Export trails in every format enabled in `export_options`
pub fn export_trails(
    input_path: &Path,
    segments: &[TrailSegment],
    history: &HistoryTrail,
    export_options: &ExportOptions,
) -> Result<ExportReport> {
    let mut report = ExportReport::default();
    if export_options.gpx {
        report.gpx_path = export_to_gpx(input_path, segments, history, export_options)?;
    }
    if export_options.geojson {
        report.geojson_path = export_to_geojson(input_path, segments, history, export_options)?;
    }
    Ok(report)
}

/// Export trails to GPX: one `<trkseg>` per recorded segment, plus a history track
///
/// Returns `None` without touching the filesystem when there is nothing to write.
pub fn export_to_gpx(
    input_path: &Path,
    segments: &[TrailSegment],
    history: &HistoryTrail,
    export_options: &ExportOptions,
) -> Result<Option<PathBuf>> {
    if segments.iter().all(TrailSegment::is_empty) && history.is_empty() {
        return Ok(None);
    }

    let gpx_path = compute_export_path(input_path, export_options, ".trail.gpx")?;
    let mut gpx = BufWriter::new(File::create(&gpx_path)?);

    writeln!(gpx, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        gpx,
        r#"<gpx creator="live_tracker" version="1.1" xmlns="http://www.topografix.com/GPX/1/1" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd">"#
    )?;
    writeln!(gpx, "<metadata><name>Tracked device</name></metadata>")?;

    if !history.is_empty() {
        writeln!(gpx, "<trk><name>History</name><trkseg>")?;
        write_trkpts(&mut gpx, &history.points)?;
        writeln!(gpx, "</trkseg></trk>")?;
    }

    let recorded: Vec<&TrailSegment> = segments.iter().filter(|s| !s.is_empty()).collect();
    if !recorded.is_empty() {
        writeln!(gpx, "<trk><name>Recorded trail</name>")?;
        for segment in recorded {
            writeln!(
                gpx,
                "<trkseg><extensions><color>{}</color></extensions>",
                segment.color.to_hex()
            )?;
            write_trkpts(&mut gpx, &segment.points)?;
            writeln!(gpx, "</trkseg>")?;
        }
        writeln!(gpx, "</trk>")?;
    }

    writeln!(gpx, "</gpx>")?;
    gpx.flush()?;

    info!("Exported trail to: {}", gpx_path.display());
    Ok(Some(gpx_path))
}

fn write_trkpts<W: Write>(out: &mut W, points: &[GeoPoint]) -> Result<()> {
    for p in points {
        if !(p.lat.is_finite() && p.lon.is_finite()) {
            continue;
        }
        writeln!(out, r#"  <trkpt lat="{:.7}" lon="{:.7}"></trkpt>"#, p.lat, p.lon)?;
    }
    Ok(())
}

/// Export trails to a GeoJSON FeatureCollection of LineStrings
pub fn export_to_geojson(
    input_path: &Path,
    segments: &[TrailSegment],
    history: &HistoryTrail,
    export_options: &ExportOptions,
) -> Result<Option<PathBuf>> {
    let collection = trails_to_geojson(segments, history);
    let features = collection["features"].as_array().map(Vec::len).unwrap_or(0);
    if features == 0 {
        return Ok(None);
    }

    let path = compute_export_path(input_path, export_options, ".trail.geojson")?;
    let file = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(file, &collection)
        .map_err(|e| TrackerError::Export(format!("{}: {e}", path.display())))?;

    info!("Exported trail to: {}", path.display());
    Ok(Some(path))
}

/// Build the FeatureCollection; lines with fewer than two points are left out
pub fn trails_to_geojson(segments: &[TrailSegment], history: &HistoryTrail) -> Value {
    let mut features = Vec::new();

    if history.len() >= 2 {
        let style = PolylineStyle::history();
        features.push(line_feature(
            &history.points,
            json!({
                "kind": "history",
                "stroke": style.color.to_hex(),
                "stroke-width": style.weight,
            }),
        ));
    }

    for (index, segment) in segments.iter().enumerate() {
        if segment.len() < 2 {
            continue;
        }
        features.push(line_feature(
            &segment.points,
            json!({
                "kind": "trail",
                "segment": index,
                "stroke": segment.color.to_hex(),
                "stroke-width": PolylineStyle::trail(segment.color).weight,
            }),
        ));
    }

    json!({ "type": "FeatureCollection", "features": features })
}

fn line_feature(points: &[GeoPoint], properties: Value) -> Value {
    // GeoJSON positions are [lon, lat]
    let coordinates: Vec<[f64; 2]> = points.iter().map(|p| [p.lon, p.lat]).collect();
    json!({
        "type": "Feature",
        "geometry": { "type": "LineString", "coordinates": coordinates },
        "properties": properties,
    })
}
