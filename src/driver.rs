//! Map presentation driver
//!
//! Runs once per tick against the current telemetry snapshot: moves the
//! marker, recenters, rebinds the popup and maintains the live trail.
//!
//! While recording (`button == 1`) every tick appends the current position to
//! the active segment. A segment has one color; when the gradient color of
//! the current speed differs, the segment is finished and a new one starts
//! from the previous point so the drawn trail stays continuous. When
//! recording stops the trail of that recording is removed from the map and
//! dropped, unless the driver was built with
//! [`PresentationDriver::keeping_finished`].

use tracing::{debug, trace};

use crate::gradient::gradient_color;
use crate::render::PopupContent;
use crate::surface::{MapSurface, PolylineId, PolylineStyle};
use crate::types::{CanonicalTelemetry, GeoPoint, TrailSegment};

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No position yet, nothing was touched
    NoFix,
    /// Marker and popup were updated
    Updated {
        recording: bool,
        /// A new trail segment was started on this tick
        new_segment: bool,
    },
}

#[derive(Debug, Clone)]
struct DrawnSegment {
    id: PolylineId,
    segment: TrailSegment,
}

#[derive(Debug, Default)]
pub struct PresentationDriver {
    /// Segments of the current recording, the last one is active
    current: Vec<DrawnSegment>,
    /// Continuity anchor: last point appended while recording
    anchor: Option<GeoPoint>,
    /// Segments of recordings that have ended, only filled when `keep_finished`
    archived: Vec<TrailSegment>,
    keep_finished: bool,
    ticks: u64,
}

impl PresentationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver that keeps the segments of ended recordings for [`all_segments`](Self::all_segments)
    pub fn keeping_finished() -> Self {
        Self {
            keep_finished: true,
            ..Self::default()
        }
    }

    pub fn tick<S: MapSurface + ?Sized>(
        &mut self,
        telemetry: &CanonicalTelemetry,
        surface: &mut S,
    ) -> TickOutcome {
        self.ticks += 1;

        if telemetry.has_no_fix() {
            trace!("tick {}: no fix yet", self.ticks);
            return TickOutcome::NoFix;
        }

        let point = telemetry.position();
        surface.move_marker(point);
        surface.pan_to(point);
        surface.bind_popup(&PopupContent::from_telemetry(telemetry));

        if !telemetry.is_recording() {
            self.end_recording(surface);
            return TickOutcome::Updated {
                recording: false,
                new_segment: false,
            };
        }

        let color = gradient_color(telemetry.spd);
        let new_segment = match self.current.last_mut() {
            Some(active) if active.segment.color == color => {
                active.segment.push(point);
                surface.extend_polyline(active.id, point);
                false
            }
            _ => {
                let mut segment = TrailSegment::new(color, self.anchor);
                segment.push(point);
                let id = surface.draw_polyline(&segment.points, PolylineStyle::trail(color));
                debug!(
                    "tick {}: trail segment {} started in {color} with {} points",
                    self.ticks,
                    self.current.len() + 1,
                    segment.len()
                );
                self.current.push(DrawnSegment { id, segment });
                true
            }
        };
        self.anchor = Some(point);

        TickOutcome::Updated {
            recording: true,
            new_segment,
        }
    }

    /// Remove the live trail from the map and clear the continuity anchor
    pub fn end_recording<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        if !self.current.is_empty() {
            debug!("recording stopped, removing {} trail segments", self.current.len());
        }
        for drawn in self.current.drain(..) {
            surface.remove_polyline(drawn.id);
            if self.keep_finished {
                self.archived.push(drawn.segment);
            }
        }
        self.anchor = None;
    }

    pub fn is_recording(&self) -> bool {
        !self.current.is_empty()
    }

    /// Segments of the ongoing recording, oldest first
    pub fn segments(&self) -> Vec<&TrailSegment> {
        self.current.iter().map(|d| &d.segment).collect()
    }

    pub fn active_segment(&self) -> Option<&TrailSegment> {
        self.current.last().map(|d| &d.segment)
    }

    pub fn anchor(&self) -> Option<GeoPoint> {
        self.anchor
    }

    /// Segments of ended recordings (when kept) followed by the ongoing one
    pub fn all_segments(&self) -> Vec<TrailSegment> {
        self.archived
            .iter()
            .cloned()
            .chain(self.current.iter().map(|d| d.segment.clone()))
            .collect()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}
