//! Map surface abstraction
//!
//! The map library (tiles, pan/zoom, marker and polyline primitives, the
//! overlay control) lives outside this crate. Session and driver talk to it
//! through [`MapSurface`]; [`RecordingSurface`] keeps every command in memory
//! for tests and offline replay.

use serde::Serialize;

use crate::gradient::Rgb;
use crate::render::{OverlayContent, PopupContent};
use crate::types::GeoPoint;

/// Handle of a polyline drawn on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PolylineId(pub u64);

/// Stroke settings for a polyline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PolylineStyle {
    pub color: Rgb,
    pub weight: u8,
    pub opacity: f32,
}

impl PolylineStyle {
    /// Live trail segment in its gradient color
    pub fn trail(color: Rgb) -> Self {
        Self {
            color,
            weight: 5,
            opacity: 0.9,
        }
    }

    /// Static trail reconstructed from history
    pub fn history() -> Self {
        Self {
            color: Rgb::new(51, 136, 255),
            weight: 3,
            opacity: 0.6,
        }
    }
}

/// Map primitives the presentation layer needs
pub trait MapSurface {
    fn move_marker(&mut self, at: GeoPoint);
    fn pan_to(&mut self, at: GeoPoint);
    fn bind_popup(&mut self, popup: &PopupContent);
    fn update_overlay(&mut self, overlay: &OverlayContent);
    fn draw_polyline(&mut self, points: &[GeoPoint], style: PolylineStyle) -> PolylineId;
    fn extend_polyline(&mut self, id: PolylineId, point: GeoPoint);
    fn remove_polyline(&mut self, id: PolylineId);
}

/// Command issued to a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MapCommand {
    MoveMarker { at: GeoPoint },
    PanTo { at: GeoPoint },
    BindPopup { popup: PopupContent },
    UpdateOverlay { overlay: OverlayContent },
    DrawPolyline { id: PolylineId, points: Vec<GeoPoint>, style: PolylineStyle },
    ExtendPolyline { id: PolylineId, point: GeoPoint },
    RemovePolyline { id: PolylineId },
}

/// Polyline currently present on a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPolyline {
    pub id: PolylineId,
    pub points: Vec<GeoPoint>,
    pub style: PolylineStyle,
}

/// In-memory surface recording every command and the resulting polylines
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<MapCommand>,
    pub marker: Option<GeoPoint>,
    pub center: Option<GeoPoint>,
    pub popup: Option<PopupContent>,
    pub overlay: Option<OverlayContent>,
    polylines: Vec<RecordedPolyline>,
    next_id: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Polylines still on the map, in drawing order
    pub fn polylines(&self) -> &[RecordedPolyline] {
        &self.polylines
    }

    pub fn polyline(&self, id: PolylineId) -> Option<&RecordedPolyline> {
        self.polylines.iter().find(|p| p.id == id)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

impl MapSurface for RecordingSurface {
    fn move_marker(&mut self, at: GeoPoint) {
        self.marker = Some(at);
        self.commands.push(MapCommand::MoveMarker { at });
    }

    fn pan_to(&mut self, at: GeoPoint) {
        self.center = Some(at);
        self.commands.push(MapCommand::PanTo { at });
    }

    fn bind_popup(&mut self, popup: &PopupContent) {
        self.popup = Some(popup.clone());
        self.commands.push(MapCommand::BindPopup {
            popup: popup.clone(),
        });
    }

    fn update_overlay(&mut self, overlay: &OverlayContent) {
        self.overlay = Some(overlay.clone());
        self.commands.push(MapCommand::UpdateOverlay {
            overlay: overlay.clone(),
        });
    }

    fn draw_polyline(&mut self, points: &[GeoPoint], style: PolylineStyle) -> PolylineId {
        let id = PolylineId(self.next_id);
        self.next_id += 1;
        self.polylines.push(RecordedPolyline {
            id,
            points: points.to_vec(),
            style,
        });
        self.commands.push(MapCommand::DrawPolyline {
            id,
            points: points.to_vec(),
            style,
        });
        id
    }

    fn extend_polyline(&mut self, id: PolylineId, point: GeoPoint) {
        if let Some(line) = self.polylines.iter_mut().find(|p| p.id == id) {
            line.points.push(point);
        }
        self.commands.push(MapCommand::ExtendPolyline { id, point });
    }

    fn remove_polyline(&mut self, id: PolylineId) {
        self.polylines.retain(|p| p.id != id);
        self.commands.push(MapCommand::RemovePolyline { id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyline_lifecycle() {
        let mut surface = RecordingSurface::new();
        let a = surface.draw_polyline(&[GeoPoint::new(1.0, 1.0)], PolylineStyle::history());
        let b = surface.draw_polyline(&[], PolylineStyle::trail(Rgb::new(0, 0, 255)));
        assert_ne!(a, b);

        surface.extend_polyline(b, GeoPoint::new(2.0, 2.0));
        assert_eq!(surface.polyline(b).unwrap().points, vec![GeoPoint::new(2.0, 2.0)]);

        surface.remove_polyline(a);
        assert_eq!(surface.polylines().len(), 1);
        assert_eq!(surface.commands.len(), 4);
    }
}
